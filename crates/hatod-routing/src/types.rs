//! Routing matrix API response types.
//!
//! The API wraps every response in a `{"status": "OK", ...}` envelope with
//! one row per origin and one element per destination. Element statuses
//! other than `OK` mean no traversable route; they are surfaced to the
//! caller, never zeroed.

use serde::Deserialize;

/// Top-level matrix response envelope.
#[derive(Debug, Deserialize)]
pub struct MatrixResponse {
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixRow {
    pub elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
pub struct MatrixElement {
    pub status: String,
    #[serde(default)]
    pub distance: Option<ValueField>,
    #[serde(default)]
    pub duration: Option<ValueField>,
}

#[derive(Debug, Deserialize)]
pub struct ValueField {
    pub value: f64,
}

/// A successfully routed leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteLeg {
    pub meters: f64,
    pub seconds: f64,
}

/// Per-element outcome of a matrix request, in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixOutcome {
    /// The provider found a traversable route.
    Ok(RouteLeg),
    /// `NOT_FOUND` / `ZERO_RESULTS`: no route between the pair.
    NoRoute,
    /// Any other element status, with the raw status for diagnostics.
    Failed(String),
}

impl MatrixElement {
    pub(crate) fn into_outcome(self) -> MatrixOutcome {
        match self.status.as_str() {
            "OK" => match (self.distance, self.duration) {
                (Some(distance), Some(duration)) => MatrixOutcome::Ok(RouteLeg {
                    meters: distance.value,
                    seconds: duration.value,
                }),
                // OK without payload is a provider contract violation.
                _ => MatrixOutcome::Failed("OK element missing distance/duration".to_owned()),
            },
            "NOT_FOUND" | "ZERO_RESULTS" => MatrixOutcome::NoRoute,
            other => MatrixOutcome::Failed(other.to_owned()),
        }
    }
}
