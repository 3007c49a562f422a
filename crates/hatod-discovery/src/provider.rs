//! Distance-provider strategy seam.
//!
//! The reference design duplicated its radius-search control flow once per
//! distance source; here a single engine is parameterized by an injected
//! [`DistanceProvider`]. The routed implementation batches origins into
//! matrix requests under the provider's element cap and issues the batches
//! with bounded, order-preserving concurrency.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::{stream, StreamExt};

use hatod_core::Coordinate;
use hatod_routing::{MatrixOutcome, RoutingClient, MAX_MATRIX_ELEMENTS};

use crate::error::DiscoveryError;

/// Per-origin result of a distance resolution, in input order.
///
/// A failed or route-less origin is reported as such, never defaulted to
/// zero. The engines decide locally whether that means exclusion (display)
/// or a haversine fallback (checkout).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceOutcome {
    Resolved { meters: f64, seconds: f64 },
    /// The provider reported no traversable route between the pair.
    NoRoute,
    /// The request carrying this origin failed (network, quota, timeout).
    Failed,
}

/// Point-to-point travel-distance strategy.
///
/// `distances` measures *from* each origin (merchant) *to* the destination
/// (customer), the direction the rider travels.
pub trait DistanceProvider: Send + Sync {
    /// Identifier reported in the metrics block.
    fn strategy(&self) -> &'static str;

    /// Pre-flight availability check; failure aborts the whole query with
    /// `DISTANCE_PROVIDER_UNAVAILABLE` instead of degrading per merchant.
    fn ensure_available(
        &self,
        probe: Coordinate,
    ) -> impl Future<Output = Result<(), DiscoveryError>> + Send;

    fn distances(
        &self,
        origins: Vec<Coordinate>,
        destination: Coordinate,
    ) -> impl Future<Output = Vec<DistanceOutcome>> + Send;
}

impl From<MatrixOutcome> for DistanceOutcome {
    fn from(outcome: MatrixOutcome) -> Self {
        match outcome {
            MatrixOutcome::Ok(leg) => Self::Resolved {
                meters: leg.meters,
                seconds: leg.seconds,
            },
            MatrixOutcome::NoRoute => Self::NoRoute,
            MatrixOutcome::Failed(_) => Self::Failed,
        }
    }
}

/// Routed strategy backed by the matrix API client.
#[derive(Clone)]
pub struct RoutedProvider {
    client: Arc<RoutingClient>,
    selftest_timeout: Duration,
    max_concurrent_batches: usize,
}

impl RoutedProvider {
    #[must_use]
    pub fn new(
        client: Arc<RoutingClient>,
        selftest_timeout_secs: u64,
        max_concurrent_batches: usize,
    ) -> Self {
        Self {
            client,
            selftest_timeout: Duration::from_secs(selftest_timeout_secs),
            max_concurrent_batches: max_concurrent_batches.max(1),
        }
    }
}

impl DistanceProvider for RoutedProvider {
    fn strategy(&self) -> &'static str {
        "routed"
    }

    async fn ensure_available(&self, probe: Coordinate) -> Result<(), DiscoveryError> {
        self.client
            .self_test(probe, self.selftest_timeout)
            .await
            .map_err(|e| DiscoveryError::ProviderUnavailable(e.to_string()))
    }

    async fn distances(
        &self,
        origins: Vec<Coordinate>,
        destination: Coordinate,
    ) -> Vec<DistanceOutcome> {
        let batches: Vec<Vec<Coordinate>> = origins
            .chunks(MAX_MATRIX_ELEMENTS)
            .map(<[Coordinate]>::to_vec)
            .collect();

        // `buffered` (not `buffer_unordered`) keeps batch results in input
        // order so the zip against the candidate list stays aligned.
        let per_batch: Vec<Vec<DistanceOutcome>> = stream::iter(batches)
            .map(|batch| {
                let client = Arc::clone(&self.client);
                async move {
                    let size = batch.len();
                    match client.distance_matrix(&batch, destination).await {
                        Ok(outcomes) => outcomes.into_iter().map(DistanceOutcome::from).collect(),
                        Err(e) => {
                            tracing::warn!(
                                batch_size = size,
                                error = %e,
                                "matrix batch failed; marking batch unresolved"
                            );
                            vec![DistanceOutcome::Failed; size]
                        }
                    }
                }
            })
            .buffered(self.max_concurrent_batches)
            .collect()
            .await;

        per_batch.into_iter().flatten().collect()
    }
}
