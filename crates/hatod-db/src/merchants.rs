//! Database operations for the `merchants` table.
//!
//! Two read paths: a coarse candidate fetch (attribute filters only,
//! distance-agnostic) used by the routed search, and a spatial radius query
//! that pushes the distance predicate, ordering, and pagination into
//! Postgres for the throughput-first display path.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use hatod_core::{Coordinate, Merchant, ZoneGeometries};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `merchants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchantRow {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub delivery_radius_meters: Option<f64>,
    pub is_active: bool,
    pub is_accepting_orders: bool,
    pub is_currently_delivering: bool,
    pub avg_delivery_time_minutes: Option<i32>,
    pub service_area: Option<serde_json::Value>,
    pub priority_zones: Option<serde_json::Value>,
    pub restricted_areas: Option<serde_json::Value>,
    pub delivery_zones: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MerchantRow {
    /// Converts the row into the domain type.
    ///
    /// A stored lat/lng pair that fails coordinate validation is treated as
    /// not-yet-geocoded (`location = None`) so it can never enter a
    /// distance-ranked result set.
    #[must_use]
    pub fn into_merchant(self) -> Merchant {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        };
        Merchant {
            id: self.id,
            vendor_id: self.vendor_id,
            name: self.name,
            location,
            delivery_radius_meters: self.delivery_radius_meters,
            is_active: self.is_active,
            is_accepting_orders: self.is_accepting_orders,
            is_currently_delivering: self.is_currently_delivering,
            avg_delivery_time_minutes: self.avg_delivery_time_minutes,
            zones: ZoneGeometries {
                service_area: self.service_area,
                priority_zones: self.priority_zones,
                restricted_areas: self.restricted_areas,
                delivery_zones: self.delivery_zones,
            },
        }
    }
}

/// A merchant row plus the store-computed distance to the query origin.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SpatialMerchantRow {
    #[sqlx(flatten)]
    pub merchant: MerchantRow,
    pub distance_meters: f64,
}

/// Filters for the coarse candidate fetch.
#[derive(Debug, Clone, Copy)]
pub struct CandidateQuery {
    pub require_currently_delivering: bool,
    pub limit: i64,
}

/// Additional predicates for the spatial radius query. Applied inside the
/// store so the page and the pagination count always agree.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialFilter {
    /// Keep only merchants whose own `delivery_radius_meters` covers the
    /// query origin.
    pub require_within_delivery_radius: bool,
    /// Keep only merchants with a non-null geometry in this column. The
    /// value comes from a fixed enum mapping upstream, never user input.
    pub zone_column: Option<&'static str>,
}

const MERCHANT_COLUMNS: &str = "id, vendor_id, name, latitude, longitude, \
     delivery_radius_meters, is_active, is_accepting_orders, \
     is_currently_delivering, avg_delivery_time_minutes, \
     service_area, priority_zones, restricted_areas, delivery_zones, \
     created_at, updated_at";

// Eligibility predicate for the spatial path: the stored GeoJSON payload
// must be a Point whose coordinates array has exactly two components.
// Malformed rows are excluded here, never coerced.
const WELL_FORMED_POINT: &str = "location IS NOT NULL \
     AND location->>'type' = 'Point' \
     AND jsonb_typeof(location->'coordinates') = 'array' \
     AND jsonb_array_length(location->'coordinates') = 2";

const MERCHANT_POINT: &str = "ST_SetSRID(ST_MakePoint( \
     (location->'coordinates'->>0)::float8, \
     (location->'coordinates'->>1)::float8), 4326)::geography";

const ORIGIN_POINT: &str = "ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography";

// Shared WHERE clause for the spatial page and count queries. Binds:
// $1 origin lng, $2 origin lat, $3 radius meters, $4 delivery-radius flag.
fn spatial_predicate(filter: SpatialFilter) -> String {
    let mut sql = format!(
        "is_active = TRUE \
         AND is_accepting_orders = TRUE \
         AND {WELL_FORMED_POINT} \
         AND ST_DWithin({MERCHANT_POINT}, {ORIGIN_POINT}, $3) \
         AND ($4 = FALSE OR (delivery_radius_meters IS NOT NULL \
              AND ST_DWithin({MERCHANT_POINT}, {ORIGIN_POINT}, delivery_radius_meters)))"
    );
    if let Some(col) = filter.zone_column {
        sql.push_str(&format!(
            " AND {col} IS NOT NULL AND jsonb_typeof({col}) <> 'null'"
        ));
    }
    sql
}

// ---------------------------------------------------------------------------
// Candidate fetch (routed path)
// ---------------------------------------------------------------------------

/// Fetch active, order-accepting merchants with populated coordinates.
///
/// Distance-agnostic by design: the caller computes distances through a
/// provider strategy and narrows the set afterwards. Ordered by
/// `updated_at DESC` so recently-synced merchants surface first in the
/// over-fetched superset.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_candidates(
    pool: &PgPool,
    query: CandidateQuery,
) -> Result<Vec<MerchantRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {MERCHANT_COLUMNS} \
         FROM merchants \
         WHERE is_active = TRUE \
           AND is_accepting_orders = TRUE \
           AND latitude IS NOT NULL \
           AND longitude IS NOT NULL \
           AND ($1 = FALSE OR is_currently_delivering = TRUE) \
         ORDER BY updated_at DESC \
         LIMIT $2"
    );
    sqlx::query_as::<_, MerchantRow>(&sql)
        .bind(query.require_currently_delivering)
        .bind(query.limit)
        .fetch_all(pool)
        .await
}

// ---------------------------------------------------------------------------
// Spatial radius query (store-computed distance)
// ---------------------------------------------------------------------------

/// Radius search computed entirely in the store.
///
/// Distance is `ST_Distance` over `geography` (meters on the spheroid), the
/// radius filter is `ST_DWithin`, and ordering plus `LIMIT`/`OFFSET` are
/// applied server-side. Only rows passing the well-formed-Point predicate
/// are eligible. The optional [`SpatialFilter`] predicates run in the same
/// WHERE clause as the radius check.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_within_radius_spatial(
    pool: &PgPool,
    origin_lat: f64,
    origin_lng: f64,
    radius_meters: f64,
    filter: SpatialFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<SpatialMerchantRow>, sqlx::Error> {
    let predicate = spatial_predicate(filter);
    let sql = format!(
        "SELECT {MERCHANT_COLUMNS}, \
                ST_Distance({MERCHANT_POINT}, {ORIGIN_POINT}) AS distance_meters \
         FROM merchants \
         WHERE {predicate} \
         ORDER BY distance_meters ASC \
         LIMIT $5 OFFSET $6"
    );
    sqlx::query_as::<_, SpatialMerchantRow>(&sql)
        .bind(origin_lng)
        .bind(origin_lat)
        .bind(radius_meters)
        .bind(filter.require_within_delivery_radius)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Count of merchants matching the spatial radius predicate (for pagination).
/// Uses the same WHERE clause as [`find_within_radius_spatial`] so the count
/// can never drift from the page contents.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn count_within_radius_spatial(
    pool: &PgPool,
    origin_lat: f64,
    origin_lng: f64,
    radius_meters: f64,
    filter: SpatialFilter,
) -> Result<i64, sqlx::Error> {
    let predicate = spatial_predicate(filter);
    let sql = format!("SELECT COUNT(*) FROM merchants WHERE {predicate}");
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(origin_lng)
        .bind(origin_lat)
        .bind(radius_meters)
        .bind(filter.require_within_delivery_radius)
        .fetch_one(pool)
        .await
}
