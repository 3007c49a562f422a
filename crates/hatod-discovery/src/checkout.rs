//! Checkout-time merchant resolution.
//!
//! Resolves the customer's active address, then distances to every merchant
//! that is currently delivering. Checkout inverts the display-path policy
//! on resolution failure: a merchant whose routed distance cannot be
//! resolved gets a haversine estimate instead of being dropped, because
//! hiding a merchant at checkout loses an order while an approximate
//! distance only risks a slightly off fee.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use hatod_core::{haversine_meters, Address, AppConfig, Coordinate, Customer, Merchant, MerchantWithDistance};

use crate::error::DiscoveryError;
use crate::metrics::SearchMetrics;
use crate::provider::{DistanceOutcome, DistanceProvider};
use crate::sources::{CandidateFilter, CustomerDirectory, MerchantCandidates};

#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    /// Wide net relative to display search; the fee schedule decides
    /// serviceability downstream.
    pub radius_meters: f64,
    pub fetch_limit: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            radius_meters: 100_000.0,
            fetch_limit: 200,
        }
    }
}

impl CheckoutConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            radius_meters: config.checkout_radius_meters,
            fetch_limit: config.candidate_fetch_cap,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutResult {
    pub customer: Customer,
    pub address: Address,
    pub merchants: Vec<MerchantWithDistance>,
    pub total_count: usize,
    pub metrics: SearchMetrics,
}

pub struct CheckoutResolver<P, C, D> {
    provider: P,
    candidates: C,
    directory: D,
    config: CheckoutConfig,
}

impl<P, C, D> CheckoutResolver<P, C, D>
where
    P: DistanceProvider,
    C: MerchantCandidates,
    D: CustomerDirectory,
{
    pub fn new(provider: P, candidates: C, directory: D, config: CheckoutConfig) -> Self {
        Self {
            provider,
            candidates,
            directory,
            config,
        }
    }

    /// Merchants orderable by this customer right now, nearest first with
    /// in-delivery-radius merchants ahead of out-of-radius ones.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::CustomerNotFound`] when the id is unknown.
    /// - [`DiscoveryError::AddressNotFound`] when the customer has no
    ///   active address or it cannot be loaded.
    /// - [`DiscoveryError::AddressMissingCoordinates`] when the active
    ///   address was never geocoded.
    /// - [`DiscoveryError::Db`] on store failures.
    ///
    /// Provider unavailability is deliberately not an error here, unlike the
    /// display search, where a failed pre-flight aborts the whole query with
    /// `DISTANCE_PROVIDER_UNAVAILABLE`. Checkout must always present some
    /// ranking, so a failed pre-flight degrades the entire set to haversine
    /// estimates and the metrics block reports the `haversine` strategy.
    pub async fn resolve(&self, customer_id: Uuid) -> Result<CheckoutResult, DiscoveryError> {
        let started = Instant::now();

        let customer = self
            .directory
            .customer(customer_id)
            .await?
            .ok_or(DiscoveryError::CustomerNotFound(customer_id))?;
        let address_id = customer
            .active_address_id
            .ok_or(DiscoveryError::AddressNotFound(customer_id))?;
        let address = self
            .directory
            .address(address_id)
            .await?
            .ok_or(DiscoveryError::AddressNotFound(customer_id))?;
        let origin = address
            .location
            .ok_or(DiscoveryError::AddressMissingCoordinates(address.id))?;

        let fetched = self
            .candidates
            .candidates(CandidateFilter {
                require_currently_delivering: true,
                fetch_limit: self.config.fetch_limit,
            })
            .await?;
        let scanned = fetched.len();

        let located: Vec<(Merchant, Coordinate)> = fetched
            .into_iter()
            .filter_map(|m| m.location.map(|loc| (m, loc)))
            .collect();
        if located.is_empty() {
            return Ok(CheckoutResult {
                customer,
                address,
                merchants: Vec::new(),
                total_count: 0,
                metrics: SearchMetrics::since(started, scanned, 0, self.provider.strategy()),
            });
        }

        let (outcomes, strategy) = self.resolve_distances(&located, origin).await;

        let mut merchants: Vec<MerchantWithDistance> = located
            .into_iter()
            .zip(outcomes)
            .filter_map(|((merchant, merchant_loc), outcome)| {
                let meters = match outcome {
                    DistanceOutcome::Resolved { meters, .. } => meters,
                    DistanceOutcome::NoRoute | DistanceOutcome::Failed => {
                        // Per-merchant fallback; checkout never drops a
                        // merchant for an unresolved route.
                        tracing::debug!(
                            merchant_id = %merchant.id,
                            "routed distance unresolved; using haversine estimate"
                        );
                        haversine_meters(merchant_loc, origin)
                    }
                };
                (meters <= self.config.radius_meters)
                    .then(|| MerchantWithDistance::new(merchant, meters))
            })
            .collect();

        merchants.sort_by(|a, b| {
            (!a.is_within_delivery_radius)
                .cmp(&!b.is_within_delivery_radius)
                .then_with(|| a.distance_meters.total_cmp(&b.distance_meters))
        });

        let total_count = merchants.len();
        Ok(CheckoutResult {
            customer,
            address,
            merchants,
            total_count,
            metrics: SearchMetrics::since(started, scanned, total_count, strategy),
        })
    }

    async fn resolve_distances(
        &self,
        located: &[(Merchant, Coordinate)],
        origin: Coordinate,
    ) -> (Vec<DistanceOutcome>, &'static str) {
        if let Err(e) = self.provider.ensure_available(origin).await {
            // Whole-set degradation instead of a failed checkout.
            tracing::warn!(error = %e, "distance provider unavailable; degrading to haversine");
            let estimates = located
                .iter()
                .map(|(_, loc)| DistanceOutcome::Resolved {
                    meters: haversine_meters(*loc, origin),
                    seconds: 0.0,
                })
                .collect();
            return (estimates, "haversine");
        }

        let origins: Vec<Coordinate> = located.iter().map(|(_, loc)| *loc).collect();
        let outcomes = self.provider.distances(origins, origin).await;
        (outcomes, self.provider.strategy())
    }
}
