//! Lookups over the `customers` and `addresses` tables.

use sqlx::PgPool;
use uuid::Uuid;

use hatod_core::{Address, Coordinate, Customer};

/// A row from the `customers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub active_address_id: Option<Uuid>,
}

/// A row from the `addresses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddressRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub line1: String,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
}

impl CustomerRow {
    #[must_use]
    pub fn into_customer(self) -> Customer {
        Customer {
            id: self.id,
            name: self.name,
            active_address_id: self.active_address_id,
        }
    }
}

impl AddressRow {
    /// An address whose stored coordinate fails validation is treated as
    /// not-yet-geocoded, which surfaces upstream as
    /// `ADDRESS_MISSING_COORDINATES` rather than a bogus distance.
    #[must_use]
    pub fn into_address(self) -> Address {
        let location = match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        };
        Address {
            id: self.id,
            customer_id: self.customer_id,
            line1: self.line1,
            city: self.city,
            location,
            is_verified: self.is_verified,
        }
    }
}

/// Fetch a customer by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_customer(pool: &PgPool, id: Uuid) -> Result<Option<CustomerRow>, sqlx::Error> {
    sqlx::query_as::<_, CustomerRow>(
        "SELECT id, name, active_address_id FROM customers WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetch an address by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_address(pool: &PgPool, id: Uuid) -> Result<Option<AddressRow>, sqlx::Error> {
    sqlx::query_as::<_, AddressRow>(
        "SELECT id, customer_id, line1, city, latitude, longitude, is_verified \
         FROM addresses WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_with_invalid_stored_coordinate_has_no_location() {
        let row = AddressRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            line1: "123 Mabini St".to_owned(),
            city: Some("Manila".to_owned()),
            latitude: Some(f64::NAN),
            longitude: Some(120.98),
            is_verified: true,
        };
        assert!(row.into_address().location.is_none());
    }

    #[test]
    fn address_with_valid_coordinate_round_trips() {
        let row = AddressRow {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            line1: "123 Mabini St".to_owned(),
            city: Some("Manila".to_owned()),
            latitude: Some(14.5995),
            longitude: Some(120.9842),
            is_verified: true,
        };
        let address = row.into_address();
        let loc = address.location.expect("location");
        assert!((loc.latitude - 14.5995).abs() < 1e-9);
    }
}
