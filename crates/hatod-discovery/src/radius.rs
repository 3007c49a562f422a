//! Radius search engine.
//!
//! One engine, two operation modes behind one contract shape: the routed
//! mode resolves road-network distances through the injected provider and
//! filters/sorts/pages in memory; the spatial mode pushes the whole
//! predicate into the store. Display semantics apply in both modes: a
//! merchant whose distance cannot be resolved is excluded, never
//! approximated.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use hatod_core::{AppConfig, Coordinate, Merchant, MerchantWithDistance};

use crate::error::DiscoveryError;
use crate::metrics::SearchMetrics;
use crate::provider::{DistanceOutcome, DistanceProvider};
use crate::sources::{CandidateFilter, MerchantCandidates, SpatialFilter, SpatialIndex};
use crate::zones::{filter_by_zone, ZoneType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Road-network distance via the routing provider; accuracy first.
    Routed,
    /// Store-computed geographic distance; throughput first.
    Spatial,
}

#[derive(Debug, Clone)]
pub struct RadiusQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to the configured radius when absent.
    pub radius_meters: Option<f64>,
    pub limit: i64,
    pub offset: i64,
    pub strategy: SearchStrategy,
    /// Filter to merchants whose *own* delivery radius covers the customer,
    /// instead of the caller-specified radius.
    pub only_within_delivery_radius: bool,
    pub zone: Option<ZoneType>,
}

impl RadiusQuery {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_meters: None,
            limit: 20,
            offset: 0,
            strategy: SearchStrategy::Routed,
            only_within_delivery_radius: false,
            zone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct RadiusSearchResult {
    pub merchants: Vec<MerchantWithDistance>,
    /// Matches before pagination (routed) or the store-side radius count
    /// (spatial).
    pub total_count: usize,
    pub pagination: Pagination,
    pub metrics: SearchMetrics,
}

/// Engine tunables, sourced from [`AppConfig`] in production.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub default_radius_meters: f64,
    pub max_radius_meters: f64,
    /// Candidate over-fetch multiplier absorbing radius-filtering loss.
    pub overfetch_factor: i64,
    /// Hard cap on the candidate superset, bounding provider cost.
    pub fetch_cap: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: 5_000.0,
            max_radius_meters: 100_000.0,
            overfetch_factor: 3,
            fetch_cap: 500,
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            default_radius_meters: config.default_radius_meters,
            max_radius_meters: config.max_radius_meters,
            overfetch_factor: config.candidate_overfetch_factor,
            fetch_cap: config.candidate_fetch_cap,
        }
    }
}

pub struct RadiusSearch<P, C, S> {
    provider: P,
    candidates: C,
    spatial: S,
    config: SearchConfig,
}

impl<P, C, S> RadiusSearch<P, C, S>
where
    P: DistanceProvider,
    C: MerchantCandidates,
    S: SpatialIndex,
{
    pub fn new(provider: P, candidates: C, spatial: S, config: SearchConfig) -> Self {
        Self {
            provider,
            candidates,
            spatial,
            config,
        }
    }

    /// Distance-sorted, paginated merchants within the requested radius.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::InvalidCoordinates`] before any store or API call.
    /// - [`DiscoveryError::RadiusTooLarge`] before any store or API call.
    /// - [`DiscoveryError::ProviderUnavailable`] if the routed pre-flight
    ///   self-test fails (routed mode only).
    /// - [`DiscoveryError::Db`] if a store query fails.
    pub async fn find_within_radius(
        &self,
        query: &RadiusQuery,
    ) -> Result<RadiusSearchResult, DiscoveryError> {
        let origin = Coordinate::new(query.latitude, query.longitude)?;
        let radius = query
            .radius_meters
            .unwrap_or(self.config.default_radius_meters);
        if radius > self.config.max_radius_meters {
            return Err(DiscoveryError::RadiusTooLarge {
                requested_meters: radius,
                max_meters: self.config.max_radius_meters,
            });
        }

        match query.strategy {
            SearchStrategy::Routed => self.routed(origin, radius, query).await,
            SearchStrategy::Spatial => self.spatial(origin, radius, query).await,
        }
    }

    async fn routed(
        &self,
        origin: Coordinate,
        radius: f64,
        query: &RadiusQuery,
    ) -> Result<RadiusSearchResult, DiscoveryError> {
        let started = Instant::now();

        let fetch_limit = (query.offset.saturating_add(query.limit).max(1))
            .saturating_mul(self.config.overfetch_factor)
            .min(self.config.fetch_cap);
        let fetched = self
            .candidates
            .candidates(CandidateFilter {
                require_currently_delivering: false,
                fetch_limit,
            })
            .await?;
        let scanned = fetched.len();

        let located: Vec<(Merchant, Coordinate)> = fetched
            .into_iter()
            .filter_map(|m| m.location.map(|loc| (m, loc)))
            .collect();

        if located.is_empty() {
            // Empty-input law: no provider calls for a coordinate-less set.
            return Ok(Self::empty_result(
                query,
                started,
                scanned,
                self.provider.strategy(),
            ));
        }

        self.provider.ensure_available(origin).await?;

        let origins: Vec<Coordinate> = located.iter().map(|(_, loc)| *loc).collect();
        let outcomes = self.provider.distances(origins, origin).await;

        let mut matched: Vec<MerchantWithDistance> = located
            .into_iter()
            .zip(outcomes)
            .filter_map(|((merchant, _), outcome)| match outcome {
                DistanceOutcome::Resolved { meters, .. } => {
                    let keep = if query.only_within_delivery_radius {
                        merchant.delivery_radius_meters.is_some_and(|r| meters <= r)
                    } else {
                        meters <= radius
                    };
                    keep.then(|| MerchantWithDistance::new(merchant, meters))
                }
                DistanceOutcome::NoRoute | DistanceOutcome::Failed => {
                    tracing::debug!(
                        merchant_id = %merchant.id,
                        "distance unresolved; excluding merchant from display result"
                    );
                    None
                }
            })
            .collect();

        if let Some(zone) = query.zone {
            matched = filter_by_zone(matched, origin, zone);
        }
        matched.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

        let total_count = matched.len();
        let page = paginate(matched, query.limit, query.offset);
        // Report the injected provider's own identifier, same as checkout.
        let metrics = SearchMetrics::since(started, scanned, total_count, self.provider.strategy());

        Ok(RadiusSearchResult {
            merchants: page,
            total_count,
            pagination: Pagination {
                limit: query.limit,
                offset: query.offset,
            },
            metrics,
        })
    }

    async fn spatial(
        &self,
        origin: Coordinate,
        radius: f64,
        query: &RadiusQuery,
    ) -> Result<RadiusSearchResult, DiscoveryError> {
        let started = Instant::now();

        // Delivery-radius and zone narrowing run inside the store query, so
        // the returned page and total_count describe the same filtered set.
        let page = self
            .spatial
            .within_radius(
                origin,
                radius,
                SpatialFilter {
                    only_within_delivery_radius: query.only_within_delivery_radius,
                    zone: query.zone,
                },
                query.limit,
                query.offset,
            )
            .await?;
        let scanned = page.merchants.len();

        let merchants: Vec<MerchantWithDistance> = page
            .merchants
            .into_iter()
            .map(|(merchant, meters)| MerchantWithDistance::new(merchant, meters))
            .collect();

        let total_count = usize::try_from(page.total_count).unwrap_or(0);
        let metrics = SearchMetrics::since(started, scanned, merchants.len(), "spatial");

        Ok(RadiusSearchResult {
            merchants,
            total_count,
            pagination: Pagination {
                limit: query.limit,
                offset: query.offset,
            },
            metrics,
        })
    }

    fn empty_result(
        query: &RadiusQuery,
        started: Instant,
        scanned: usize,
        strategy: &'static str,
    ) -> RadiusSearchResult {
        RadiusSearchResult {
            merchants: Vec::new(),
            total_count: 0,
            pagination: Pagination {
                limit: query.limit,
                offset: query.offset,
            },
            metrics: SearchMetrics::since(started, scanned, 0, strategy),
        }
    }
}

fn paginate(
    merchants: Vec<MerchantWithDistance>,
    limit: i64,
    offset: i64,
) -> Vec<MerchantWithDistance> {
    let offset = usize::try_from(offset.max(0)).unwrap_or(0);
    let limit = usize::try_from(limit.max(0)).unwrap_or(0);
    merchants.into_iter().skip(offset).take(limit).collect()
}
