use thiserror::Error;
use uuid::Uuid;

use hatod_core::InvalidCoordinates;

/// Errors surfaced by the discovery engines.
///
/// Each variant carries a stable machine-readable code (see
/// [`DiscoveryError::code`]) used by the HTTP layer and by clients to
/// branch on failure class. Validation and provider-availability errors
/// abort a whole query; per-merchant distance failures never appear here,
/// the engines handle them locally (exclusion on display paths, haversine
/// fallback at checkout).
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid coordinates: lat={latitude}, lng={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("requested radius {requested_meters}m exceeds the {max_meters}m cap")]
    RadiusTooLarge {
        requested_meters: f64,
        max_meters: f64,
    },

    /// The routed provider failed its pre-flight self-test.
    #[error("distance provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("customer {0} not found")]
    CustomerNotFound(Uuid),

    #[error("no active address for customer {0}")]
    AddressNotFound(Uuid),

    #[error("address {0} has no geocoded coordinates")]
    AddressMissingCoordinates(Uuid),

    #[error(transparent)]
    Db(#[from] hatod_db::DbError),
}

impl DiscoveryError {
    /// Stable error code for API consumers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCoordinates { .. } => "INVALID_COORDINATES",
            Self::RadiusTooLarge { .. } => "RADIUS_TOO_LARGE",
            Self::ProviderUnavailable(_) => "DISTANCE_PROVIDER_UNAVAILABLE",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::AddressNotFound(_) => "ADDRESS_NOT_FOUND",
            Self::AddressMissingCoordinates(_) => "ADDRESS_MISSING_COORDINATES",
            Self::Db(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<InvalidCoordinates> for DiscoveryError {
    fn from(err: InvalidCoordinates) -> Self {
        Self::InvalidCoordinates {
            latitude: err.latitude,
            longitude: err.longitude,
        }
    }
}

impl From<sqlx::Error> for DiscoveryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(hatod_db::DbError::from(err))
    }
}
