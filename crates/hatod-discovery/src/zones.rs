//! Service-zone classification.
//!
//! Reports which of a merchant's configured zones a customer point falls
//! under. Membership is currently derived from geometry *presence* on the
//! merchant record; the stored polygons are not yet evaluated against the
//! point, matching the accepted product behavior. The `point` parameter is
//! part of the contract so a true containment test can slot in without a
//! signature change.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use hatod_core::{Coordinate, Merchant, MerchantWithDistance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    ServiceArea,
    PriorityZone,
    DeliveryZone,
    RestrictedArea,
}

impl ZoneType {
    /// Merchant column holding this zone's geometry payload.
    #[must_use]
    pub fn geometry_column(self) -> &'static str {
        match self {
            Self::ServiceArea => "service_area",
            Self::PriorityZone => "priority_zones",
            Self::DeliveryZone => "delivery_zones",
            Self::RestrictedArea => "restricted_areas",
        }
    }
}

impl FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service_area" => Ok(Self::ServiceArea),
            "priority_zone" => Ok(Self::PriorityZone),
            "delivery_zone" => Ok(Self::DeliveryZone),
            "restricted_area" => Ok(Self::RestrictedArea),
            other => Err(format!("unknown zone type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZonePriority {
    High,
    Medium,
    Standard,
}

/// Zone membership flags for one (merchant, point) pair.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ZoneMembership {
    pub in_service_area: bool,
    pub in_priority_zone: bool,
    pub in_delivery_zone: bool,
    pub in_restricted_area: bool,
    pub zone_priority: ZonePriority,
}

impl ZoneMembership {
    #[must_use]
    pub fn includes(&self, zone: ZoneType) -> bool {
        match zone {
            ZoneType::ServiceArea => self.in_service_area,
            ZoneType::PriorityZone => self.in_priority_zone,
            ZoneType::DeliveryZone => self.in_delivery_zone,
            ZoneType::RestrictedArea => self.in_restricted_area,
        }
    }
}

fn has_geometry(payload: &Option<Value>) -> bool {
    payload.as_ref().is_some_and(|v| !v.is_null())
}

/// Classifies a customer point against a merchant's configured zones.
#[must_use]
pub fn classify(merchant: &Merchant, _point: Coordinate) -> ZoneMembership {
    let in_service_area = has_geometry(&merchant.zones.service_area);
    let in_priority_zone = has_geometry(&merchant.zones.priority_zones);
    let in_delivery_zone = has_geometry(&merchant.zones.delivery_zones);
    let in_restricted_area = has_geometry(&merchant.zones.restricted_areas);

    let zone_priority = if in_priority_zone {
        ZonePriority::High
    } else if in_delivery_zone {
        ZonePriority::Medium
    } else {
        ZonePriority::Standard
    };

    ZoneMembership {
        in_service_area,
        in_priority_zone,
        in_delivery_zone,
        in_restricted_area,
        zone_priority,
    }
}

/// Narrows a resolved merchant set to those whose membership includes the
/// requested zone type.
#[must_use]
pub fn filter_by_zone(
    merchants: Vec<MerchantWithDistance>,
    point: Coordinate,
    zone: ZoneType,
) -> Vec<MerchantWithDistance> {
    merchants
        .into_iter()
        .filter(|m| classify(&m.merchant, point).includes(zone))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hatod_core::ZoneGeometries;
    use serde_json::json;
    use uuid::Uuid;

    fn merchant_with_zones(zones: ZoneGeometries) -> Merchant {
        Merchant {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            name: "Zone Test".to_owned(),
            location: Some(Coordinate::new(14.6, 121.0).unwrap()),
            delivery_radius_meters: Some(5_000.0),
            is_active: true,
            is_accepting_orders: true,
            is_currently_delivering: true,
            avg_delivery_time_minutes: None,
            zones,
        }
    }

    fn point() -> Coordinate {
        Coordinate::new(14.5995, 120.9842).unwrap()
    }

    fn polygon() -> Value {
        json!({ "type": "Polygon", "coordinates": [[[120.9, 14.5], [121.1, 14.5], [121.0, 14.7], [120.9, 14.5]]] })
    }

    #[test]
    fn priority_zone_presence_yields_high_priority() {
        let m = merchant_with_zones(ZoneGeometries {
            priority_zones: Some(polygon()),
            delivery_zones: Some(polygon()),
            ..ZoneGeometries::default()
        });
        let membership = classify(&m, point());
        assert!(membership.in_priority_zone);
        assert_eq!(membership.zone_priority, ZonePriority::High);
    }

    #[test]
    fn delivery_zone_without_priority_yields_medium() {
        let m = merchant_with_zones(ZoneGeometries {
            delivery_zones: Some(polygon()),
            ..ZoneGeometries::default()
        });
        assert_eq!(classify(&m, point()).zone_priority, ZonePriority::Medium);
    }

    #[test]
    fn no_zones_yields_standard() {
        let m = merchant_with_zones(ZoneGeometries::default());
        let membership = classify(&m, point());
        assert_eq!(membership.zone_priority, ZonePriority::Standard);
        assert!(!membership.in_service_area);
        assert!(!membership.in_restricted_area);
    }

    #[test]
    fn json_null_payload_is_absence() {
        let m = merchant_with_zones(ZoneGeometries {
            service_area: Some(Value::Null),
            ..ZoneGeometries::default()
        });
        assert!(!classify(&m, point()).in_service_area);
    }

    #[test]
    fn filter_by_zone_keeps_only_members() {
        let in_zone = merchant_with_zones(ZoneGeometries {
            service_area: Some(polygon()),
            ..ZoneGeometries::default()
        });
        let out_of_zone = merchant_with_zones(ZoneGeometries::default());

        let filtered = filter_by_zone(
            vec![
                MerchantWithDistance::new(in_zone.clone(), 1_000.0),
                MerchantWithDistance::new(out_of_zone, 500.0),
            ],
            point(),
            ZoneType::ServiceArea,
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].merchant.id, in_zone.id);
    }

    #[test]
    fn geometry_columns_match_merchant_schema() {
        assert_eq!(ZoneType::ServiceArea.geometry_column(), "service_area");
        assert_eq!(ZoneType::PriorityZone.geometry_column(), "priority_zones");
        assert_eq!(ZoneType::DeliveryZone.geometry_column(), "delivery_zones");
        assert_eq!(
            ZoneType::RestrictedArea.geometry_column(),
            "restricted_areas"
        );
    }

    #[test]
    fn zone_type_parses_from_query_strings() {
        assert_eq!(
            "priority_zone".parse::<ZoneType>().unwrap(),
            ZoneType::PriorityZone
        );
        assert!("priority".parse::<ZoneType>().is_err());
    }
}
