//! Domain entities for merchant discovery.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::geo::Coordinate;

/// Merchant-defined service geometries, stored as optional GeoJSON payloads.
///
/// Presence of a payload is currently the membership proxy used by the
/// zone classifier; the polygons themselves are not yet evaluated.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneGeometries {
    pub service_area: Option<Value>,
    pub priority_zones: Option<Value>,
    pub restricted_areas: Option<Value>,
    pub delivery_zones: Option<Value>,
}

/// A delivery merchant as seen by the discovery engines.
///
/// `location` is `None` until the linked address has been geocoded; such
/// merchants never enter a distance-ranked result set.
#[derive(Debug, Clone, Serialize)]
pub struct Merchant {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub location: Option<Coordinate>,
    /// The merchant's own claimed service radius, in meters.
    pub delivery_radius_meters: Option<f64>,
    pub is_active: bool,
    pub is_accepting_orders: bool,
    pub is_currently_delivering: bool,
    pub avg_delivery_time_minutes: Option<i32>,
    #[serde(flatten)]
    pub zones: ZoneGeometries,
}

/// A merchant paired with a resolved customer distance.
///
/// Only ever constructed for merchants with a populated coordinate and a
/// successful distance resolution; a merchant that fails resolution is
/// excluded (or, at checkout, re-resolved via haversine), never defaulted
/// to zero distance.
#[derive(Debug, Clone, Serialize)]
pub struct MerchantWithDistance {
    #[serde(flatten)]
    pub merchant: Merchant,
    pub distance_meters: f64,
    pub distance_km: f64,
    pub is_within_delivery_radius: bool,
    pub estimated_delivery_time_minutes: Option<i32>,
}

impl MerchantWithDistance {
    #[must_use]
    pub fn new(merchant: Merchant, distance_meters: f64) -> Self {
        let is_within_delivery_radius = merchant
            .delivery_radius_meters
            .is_some_and(|r| distance_meters <= r);
        let estimated_delivery_time_minutes = merchant.avg_delivery_time_minutes;
        Self {
            merchant,
            distance_meters,
            distance_km: distance_meters / 1000.0,
            is_within_delivery_radius,
            estimated_delivery_time_minutes,
        }
    }
}

/// Entry point for all discovery queries: a customer and their active address.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub active_address_id: Option<Uuid>,
}

/// A customer address holding the authoritative coordinate once geocoded.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub line1: String,
    pub city: Option<String>,
    pub location: Option<Coordinate>,
    pub is_verified: bool,
}
