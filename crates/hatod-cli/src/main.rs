mod commands;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "hatod-cli")]
#[command(about = "Hatod merchant discovery command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Find merchants within a radius of a coordinate.
    Nearby {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Search radius in meters (defaults to the configured radius).
        #[arg(long)]
        radius_m: Option<f64>,
        /// Distance strategy: routed or spatial.
        #[arg(long, default_value = "routed")]
        strategy: String,
        #[arg(long, default_value_t = 20)]
        limit: i64,
        /// Restrict to a zone type (e.g. priority_zone).
        #[arg(long)]
        zone: Option<String>,
    },
    /// Resolve orderable merchants for a customer's active address.
    Checkout { customer_id: Uuid },
    /// Aggregate categories across a merchant set.
    Categories {
        #[arg(required = true)]
        merchant_ids: Vec<Uuid>,
        /// Sort key: name, product_count, merchant_count or display_order.
        #[arg(long, default_value = "name")]
        sort_by: String,
    },
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Nearby {
            lat,
            lng,
            radius_m,
            strategy,
            limit,
            zone,
        } => commands::run_nearby(lat, lng, radius_m, &strategy, limit, zone.as_deref()).await,
        Commands::Checkout { customer_id } => commands::run_checkout(customer_id).await,
        Commands::Categories {
            merchant_ids,
            sort_by,
        } => commands::run_categories(&merchant_ids, &sort_by).await,
        Commands::Migrate => commands::run_migrate().await,
    }
}
