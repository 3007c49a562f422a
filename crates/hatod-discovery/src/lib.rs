//! Merchant discovery engines: radius search, checkout resolution, zone
//! classification and category aggregation.
//!
//! The engines are generic over a [`DistanceProvider`] and the data-source
//! traits in [`sources`], so the same control flow runs against the routed
//! matrix API, the spatial store, or in-memory fakes.

pub mod categories;
pub mod checkout;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod radius;
pub mod sources;
pub mod zones;

pub use categories::{
    CategoryAggregation, CategoryAggregator, CategoryQuery, CategorySort, CategoryWithMetadata,
};
pub use checkout::{CheckoutConfig, CheckoutResolver, CheckoutResult};
pub use error::DiscoveryError;
pub use metrics::SearchMetrics;
pub use provider::{DistanceOutcome, DistanceProvider, RoutedProvider};
pub use radius::{
    Pagination, RadiusQuery, RadiusSearch, RadiusSearchResult, SearchConfig, SearchStrategy,
};
pub use sources::{
    CandidateFilter, CatalogSource, CustomerDirectory, MerchantCandidates, PgSources,
    SpatialFilter, SpatialIndex, SpatialPage,
};
pub use zones::{classify, filter_by_zone, ZoneMembership, ZonePriority, ZoneType};

#[cfg(test)]
pub(crate) mod testutil {
    //! In-memory doubles for the engine seams, with call counters so tests
    //! can assert which collaborators were (not) touched.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use uuid::Uuid;

    use hatod_core::{Address, Coordinate, Customer, Merchant, ZoneGeometries};

    use crate::error::DiscoveryError;
    use crate::provider::{DistanceOutcome, DistanceProvider};
    use crate::sources::{
        CandidateFilter, CatalogSource, CustomerDirectory, MerchantCandidates,
        MerchantProductLink, ProductCategoryLink, SpatialFilter, SpatialIndex, SpatialPage,
    };
    use crate::zones::classify;

    pub const MANILA_LAT: f64 = 14.5995;
    pub const MANILA_LNG: f64 = 120.9842;

    pub fn located_merchant(name: &str, lat: f64, lng: f64) -> Merchant {
        Merchant {
            id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            name: name.to_owned(),
            location: Some(Coordinate::new(lat, lng).unwrap()),
            delivery_radius_meters: Some(5_000.0),
            is_active: true,
            is_accepting_orders: true,
            is_currently_delivering: true,
            avg_delivery_time_minutes: None,
            zones: ZoneGeometries::default(),
        }
    }

    pub struct FakeProvider {
        outcomes: Vec<DistanceOutcome>,
        available: bool,
        availability_calls: AtomicUsize,
        distance_calls: AtomicUsize,
    }

    impl FakeProvider {
        pub fn resolving(outcomes: Vec<DistanceOutcome>) -> Self {
            Self {
                outcomes,
                available: true,
                availability_calls: AtomicUsize::new(0),
                distance_calls: AtomicUsize::new(0),
            }
        }

        pub fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::resolving(Vec::new())
            }
        }

        pub fn availability_calls(&self) -> usize {
            self.availability_calls.load(Ordering::SeqCst)
        }

        pub fn distance_calls(&self) -> usize {
            self.distance_calls.load(Ordering::SeqCst)
        }
    }

    impl DistanceProvider for FakeProvider {
        fn strategy(&self) -> &'static str {
            "fake"
        }

        async fn ensure_available(&self, _probe: Coordinate) -> Result<(), DiscoveryError> {
            self.availability_calls.fetch_add(1, Ordering::SeqCst);
            if self.available {
                Ok(())
            } else {
                Err(DiscoveryError::ProviderUnavailable(
                    "probe failed".to_owned(),
                ))
            }
        }

        async fn distances(
            &self,
            origins: Vec<Coordinate>,
            _destination: Coordinate,
        ) -> Vec<DistanceOutcome> {
            self.distance_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(
                origins.len(),
                self.outcomes.len(),
                "test fixture outcome count must match origins"
            );
            self.outcomes.clone()
        }
    }

    pub struct FakeCandidates {
        merchants: Vec<Merchant>,
        calls: AtomicUsize,
        last_filter: Mutex<Option<CandidateFilter>>,
    }

    impl FakeCandidates {
        pub fn new(merchants: Vec<Merchant>) -> Self {
            Self {
                merchants,
                calls: AtomicUsize::new(0),
                last_filter: Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_filter(&self) -> Option<CandidateFilter> {
            *self.last_filter.lock().unwrap()
        }
    }

    impl MerchantCandidates for FakeCandidates {
        async fn candidates(
            &self,
            filter: CandidateFilter,
        ) -> Result<Vec<Merchant>, DiscoveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_filter.lock().unwrap() = Some(filter);
            Ok(self.merchants.clone())
        }
    }

    #[derive(Default)]
    pub struct FakeDirectory {
        customer: Option<Customer>,
        address: Option<Address>,
    }

    impl FakeDirectory {
        pub fn with_customer(customer: Customer, address: Option<Address>) -> Self {
            Self {
                customer: Some(customer),
                address,
            }
        }
    }

    impl CustomerDirectory for FakeDirectory {
        async fn customer(&self, id: Uuid) -> Result<Option<Customer>, DiscoveryError> {
            Ok(self.customer.clone().filter(|c| c.id == id))
        }

        async fn address(&self, id: Uuid) -> Result<Option<Address>, DiscoveryError> {
            Ok(self.address.clone().filter(|a| a.id == id))
        }
    }

    #[derive(Default)]
    pub struct FakeCatalog {
        links: Vec<MerchantProductLink>,
        edges: Vec<ProductCategoryLink>,
        merchant_product_calls: AtomicUsize,
        product_category_calls: AtomicUsize,
    }

    impl FakeCatalog {
        pub fn new(links: Vec<MerchantProductLink>, edges: Vec<ProductCategoryLink>) -> Self {
            Self {
                links,
                edges,
                ..Self::default()
            }
        }

        pub fn merchant_product_calls(&self) -> usize {
            self.merchant_product_calls.load(Ordering::SeqCst)
        }

        pub fn product_category_calls(&self) -> usize {
            self.product_category_calls.load(Ordering::SeqCst)
        }
    }

    impl CatalogSource for FakeCatalog {
        async fn merchant_products(
            &self,
            merchant_ids: &[Uuid],
        ) -> Result<Vec<MerchantProductLink>, DiscoveryError> {
            self.merchant_product_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .links
                .iter()
                .filter(|l| merchant_ids.contains(&l.merchant_id))
                .copied()
                .collect())
        }

        async fn product_categories(
            &self,
            product_ids: &[Uuid],
        ) -> Result<Vec<ProductCategoryLink>, DiscoveryError> {
            self.product_category_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .edges
                .iter()
                .filter(|e| product_ids.contains(&e.product_id))
                .cloned()
                .collect())
        }
    }

    /// Store double that evaluates the radius, delivery-radius and zone
    /// predicates over its seeded rows before paginating, mirroring the SQL
    /// path: page and `total_count` come from the same filtered set.
    #[derive(Default)]
    pub struct FakeSpatial {
        rows: Vec<(Merchant, f64)>,
    }

    impl FakeSpatial {
        pub fn new(rows: Vec<(Merchant, f64)>) -> Self {
            Self { rows }
        }
    }

    impl SpatialIndex for FakeSpatial {
        async fn within_radius(
            &self,
            origin: Coordinate,
            radius_meters: f64,
            filter: SpatialFilter,
            limit: i64,
            offset: i64,
        ) -> Result<SpatialPage, DiscoveryError> {
            let mut matched: Vec<(Merchant, f64)> = self
                .rows
                .iter()
                .filter(|(m, meters)| {
                    if *meters > radius_meters {
                        return false;
                    }
                    if filter.only_within_delivery_radius
                        && !m.delivery_radius_meters.is_some_and(|r| *meters <= r)
                    {
                        return false;
                    }
                    filter
                        .zone
                        .is_none_or(|zone| classify(m, origin).includes(zone))
                })
                .cloned()
                .collect();
            matched.sort_by(|a, b| a.1.total_cmp(&b.1));
            let total_count = i64::try_from(matched.len()).unwrap_or(i64::MAX);
            let offset = usize::try_from(offset.max(0)).unwrap_or(0);
            let limit = usize::try_from(limit.max(0)).unwrap_or(0);
            Ok(SpatialPage {
                merchants: matched.into_iter().skip(offset).take(limit).collect(),
                total_count,
            })
        }
    }
}
