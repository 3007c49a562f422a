//! Command handlers for the discovery CLI.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use hatod_core::AppConfig;
use hatod_discovery::{
    CategoryAggregator, CategoryQuery, CategorySort, CheckoutConfig, CheckoutResolver, PgSources,
    RadiusQuery, RadiusSearch, RoutedProvider, SearchConfig, SearchStrategy, ZoneType,
};
use hatod_routing::RoutingClient;

async fn connect() -> anyhow::Result<(Arc<AppConfig>, PgPool)> {
    let config = Arc::new(hatod_core::load_app_config()?);
    let pool_config = hatod_db::PoolConfig::from_app_config(&config);
    let pool = hatod_db::connect_pool(&config.database_url, pool_config).await?;
    Ok((config, pool))
}

fn routed_provider(config: &AppConfig) -> anyhow::Result<RoutedProvider> {
    let client = RoutingClient::with_base_url(
        config.routing_api_key.as_deref(),
        config.routing_request_timeout_secs,
        &config.routing_base_url,
    )?
    .retry_policy(
        config.routing_max_retries,
        config.routing_retry_backoff_base_ms,
    );
    Ok(RoutedProvider::new(
        Arc::new(client),
        config.routing_selftest_timeout_secs,
        config.routing_max_concurrent_batches,
    ))
}

fn parse_strategy(raw: &str) -> anyhow::Result<SearchStrategy> {
    match raw {
        "routed" => Ok(SearchStrategy::Routed),
        "spatial" => Ok(SearchStrategy::Spatial),
        other => anyhow::bail!("unknown strategy '{other}'; expected routed or spatial"),
    }
}

/// # Errors
///
/// Returns an error on invalid input, a failed provider pre-flight, or a
/// database failure.
pub(crate) async fn run_nearby(
    lat: f64,
    lng: f64,
    radius_m: Option<f64>,
    strategy: &str,
    limit: i64,
    zone: Option<&str>,
) -> anyhow::Result<()> {
    let (config, pool) = connect().await?;
    let zone = zone
        .map(str::parse::<ZoneType>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;

    let sources = PgSources::new(pool);
    let search = RadiusSearch::new(
        routed_provider(&config)?,
        sources.clone(),
        sources,
        SearchConfig::from_app_config(&config),
    );

    let mut query = RadiusQuery::new(lat, lng);
    query.radius_meters = radius_m;
    query.strategy = parse_strategy(strategy)?;
    query.limit = limit;
    query.zone = zone;

    let result = search.find_within_radius(&query).await?;

    if result.merchants.is_empty() {
        println!("no merchants found within the requested radius");
        return Ok(());
    }

    println!("{:<30}{:<12}{:<10}ETA_MIN", "MERCHANT", "DISTANCE_KM", "COVERED");
    for m in &result.merchants {
        println!(
            "{:<30}{:<12.2}{:<10}{}",
            m.merchant.name,
            m.distance_km,
            if m.is_within_delivery_radius {
                "yes"
            } else {
                "no"
            },
            m.estimated_delivery_time_minutes
                .map_or_else(|| "-".to_owned(), |v| v.to_string()),
        );
    }
    println!(
        "\n{} of {} match(es) via {} in {}ms",
        result.merchants.len(),
        result.total_count,
        result.metrics.strategy,
        result.metrics.query_time_ms
    );

    Ok(())
}

/// # Errors
///
/// Returns an error when the customer or address cannot be resolved or a
/// database query fails.
pub(crate) async fn run_checkout(customer_id: Uuid) -> anyhow::Result<()> {
    let (config, pool) = connect().await?;
    let sources = PgSources::new(pool);
    let resolver = CheckoutResolver::new(
        routed_provider(&config)?,
        sources.clone(),
        sources,
        CheckoutConfig::from_app_config(&config),
    );

    let result = resolver.resolve(customer_id).await?;
    println!(
        "customer {} ({}), address: {}",
        result.customer.name, result.customer.id, result.address.line1
    );

    if result.merchants.is_empty() {
        println!("no merchants currently deliverable to this address");
        return Ok(());
    }

    println!("{:<30}{:<12}COVERED", "MERCHANT", "DISTANCE_KM");
    for m in &result.merchants {
        println!(
            "{:<30}{:<12.2}{}",
            m.merchant.name,
            m.distance_km,
            if m.is_within_delivery_radius {
                "yes"
            } else {
                "no"
            },
        );
    }
    println!(
        "\n{} merchant(s) via {} in {}ms",
        result.total_count, result.metrics.strategy, result.metrics.query_time_ms
    );

    Ok(())
}

fn parse_sort(raw: &str) -> anyhow::Result<CategorySort> {
    match raw {
        "name" => Ok(CategorySort::Name),
        "product_count" => Ok(CategorySort::ProductCount),
        "merchant_count" => Ok(CategorySort::MerchantCount),
        "display_order" => Ok(CategorySort::DisplayOrder),
        other => anyhow::bail!(
            "unknown sort key '{other}'; expected name, product_count, merchant_count or display_order"
        ),
    }
}

/// # Errors
///
/// Returns an error if the catalog queries fail.
pub(crate) async fn run_categories(merchant_ids: &[Uuid], sort_by: &str) -> anyhow::Result<()> {
    let sort_by = parse_sort(sort_by)?;
    let (_config, pool) = connect().await?;
    let aggregator = CategoryAggregator::new(PgSources::new(pool));

    let result = aggregator
        .aggregate(
            merchant_ids,
            &CategoryQuery {
                sort_by,
                ..CategoryQuery::default()
            },
        )
        .await?;

    if result.categories.is_empty() {
        println!("no categories found for the given merchants");
        return Ok(());
    }

    println!("{:<30}{:<10}{:<10}ORDER", "CATEGORY", "PRODUCTS", "MERCHANTS");
    for c in &result.categories {
        println!(
            "{:<30}{:<10}{:<10}{}",
            c.name,
            c.product_count,
            c.merchant_count,
            c.display_order
                .map_or_else(|| "-".to_owned(), |v| v.to_string()),
        );
    }

    Ok(())
}

/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub(crate) async fn run_migrate() -> anyhow::Result<()> {
    let (_config, pool) = connect().await?;
    hatod_db::run_migrations(&pool).await?;
    println!("migrations applied");
    Ok(())
}
