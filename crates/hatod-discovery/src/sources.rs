//! Data-source seams for the discovery engines.
//!
//! Engines depend on these traits rather than on the database directly so
//! tests can drive them with in-memory fakes. [`PgSources`] is the
//! production implementation over a `sqlx` pool.

use std::future::Future;

use sqlx::PgPool;
use uuid::Uuid;

use hatod_core::{Address, Coordinate, Customer, Merchant};
use hatod_db::CandidateQuery;

use crate::error::DiscoveryError;
use crate::zones::ZoneType;

/// Coarse filters for the candidate superset fetch.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFilter {
    pub require_currently_delivering: bool,
    pub fetch_limit: i64,
}

/// Coarse-filtered merchant fetch, independent of distance.
pub trait MerchantCandidates: Send + Sync {
    fn candidates(
        &self,
        filter: CandidateFilter,
    ) -> impl Future<Output = Result<Vec<Merchant>, DiscoveryError>> + Send;
}

/// Customer and address lookups (the discovery entry point).
pub trait CustomerDirectory: Send + Sync {
    fn customer(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Customer>, DiscoveryError>> + Send;

    fn address(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Address>, DiscoveryError>> + Send;
}

/// An active, available merchant↔product junction edge.
#[derive(Debug, Clone, Copy)]
pub struct MerchantProductLink {
    pub merchant_id: Uuid,
    pub product_id: Uuid,
}

/// One (product, category) edge for an active product.
#[derive(Debug, Clone)]
pub struct ProductCategoryLink {
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_is_active: bool,
    pub display_order: Option<i32>,
}

/// Product/category relationship reads for the aggregator.
pub trait CatalogSource: Send + Sync {
    fn merchant_products(
        &self,
        merchant_ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<MerchantProductLink>, DiscoveryError>> + Send;

    fn product_categories(
        &self,
        product_ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<ProductCategoryLink>, DiscoveryError>> + Send;
}

/// One page of a store-computed radius query.
#[derive(Debug, Clone)]
pub struct SpatialPage {
    /// Merchants with their store-computed distance in meters, ascending.
    pub merchants: Vec<(Merchant, f64)>,
    /// Total rows matching the radius predicate, ignoring pagination.
    pub total_count: i64,
}

/// Optional narrowing predicates for the spatial path. The store applies
/// them inside the radius query itself, so the returned page and
/// `total_count` always describe the same filtered set.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialFilter {
    pub only_within_delivery_radius: bool,
    pub zone: Option<ZoneType>,
}

/// Store-side radius search (distance, filter, ordering and pagination all
/// computed in the persistent store).
pub trait SpatialIndex: Send + Sync {
    fn within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filter: SpatialFilter,
        limit: i64,
        offset: i64,
    ) -> impl Future<Output = Result<SpatialPage, DiscoveryError>> + Send;
}

/// Postgres-backed implementation of all source traits.
#[derive(Clone)]
pub struct PgSources {
    pool: PgPool,
}

impl PgSources {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MerchantCandidates for PgSources {
    async fn candidates(&self, filter: CandidateFilter) -> Result<Vec<Merchant>, DiscoveryError> {
        let rows = hatod_db::list_candidates(
            &self.pool,
            CandidateQuery {
                require_currently_delivering: filter.require_currently_delivering,
                limit: filter.fetch_limit,
            },
        )
        .await?;
        Ok(rows
            .into_iter()
            .map(hatod_db::MerchantRow::into_merchant)
            .collect())
    }
}

impl CustomerDirectory for PgSources {
    async fn customer(&self, id: Uuid) -> Result<Option<Customer>, DiscoveryError> {
        let row = hatod_db::get_customer(&self.pool, id).await?;
        Ok(row.map(hatod_db::CustomerRow::into_customer))
    }

    async fn address(&self, id: Uuid) -> Result<Option<Address>, DiscoveryError> {
        let row = hatod_db::get_address(&self.pool, id).await?;
        Ok(row.map(hatod_db::AddressRow::into_address))
    }
}

impl CatalogSource for PgSources {
    async fn merchant_products(
        &self,
        merchant_ids: &[Uuid],
    ) -> Result<Vec<MerchantProductLink>, DiscoveryError> {
        let rows = hatod_db::list_active_merchant_products(&self.pool, merchant_ids).await?;
        Ok(rows
            .into_iter()
            .map(|r| MerchantProductLink {
                merchant_id: r.merchant_id,
                product_id: r.product_id,
            })
            .collect())
    }

    async fn product_categories(
        &self,
        product_ids: &[Uuid],
    ) -> Result<Vec<ProductCategoryLink>, DiscoveryError> {
        let rows = hatod_db::list_product_categories(&self.pool, product_ids).await?;
        Ok(rows
            .into_iter()
            .map(|r| ProductCategoryLink {
                product_id: r.product_id,
                category_id: r.category_id,
                category_name: r.category_name,
                category_is_active: r.category_is_active,
                display_order: r.display_order,
            })
            .collect())
    }
}

impl SpatialIndex for PgSources {
    async fn within_radius(
        &self,
        origin: Coordinate,
        radius_meters: f64,
        filter: SpatialFilter,
        limit: i64,
        offset: i64,
    ) -> Result<SpatialPage, DiscoveryError> {
        let db_filter = hatod_db::SpatialFilter {
            require_within_delivery_radius: filter.only_within_delivery_radius,
            zone_column: filter.zone.map(ZoneType::geometry_column),
        };
        let rows = hatod_db::find_within_radius_spatial(
            &self.pool,
            origin.latitude,
            origin.longitude,
            radius_meters,
            db_filter,
            limit,
            offset,
        )
        .await?;
        let total_count = hatod_db::count_within_radius_spatial(
            &self.pool,
            origin.latitude,
            origin.longitude,
            radius_meters,
            db_filter,
        )
        .await?;
        Ok(SpatialPage {
            merchants: rows
                .into_iter()
                .map(|r| (r.merchant.into_merchant(), r.distance_meters))
                .collect(),
            total_count,
        })
    }
}
