//! HTTP client for the distance-matrix routing API.
//!
//! Computes routed (road-network) travel distance and duration between
//! coordinate pairs using the two-wheeler profile with traffic-aware
//! departure. One request carries at most [`MAX_MATRIX_ELEMENTS`] elements;
//! callers batching larger origin sets chunk above this client.

mod client;
mod error;
mod retry;
mod types;

pub use client::{RoutingClient, MAX_MATRIX_ELEMENTS};
pub use error::RoutingError;
pub use types::{MatrixOutcome, RouteLeg};
