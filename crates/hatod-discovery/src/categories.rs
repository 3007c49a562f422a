//! Category aggregation across a merchant set.
//!
//! Walks the merchant→product and product→category junctions and reports
//! each distinct category with its distinct-product and distinct-merchant
//! counts. A product listed by several merchants in the input set counts
//! once toward `product_count` and each listing merchant counts toward
//! `merchant_count`.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DiscoveryError;
use crate::metrics::SearchMetrics;
use crate::sources::CatalogSource;

const UNORDERED_DISPLAY_ORDER: i32 = 999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySort {
    #[default]
    Name,
    ProductCount,
    MerchantCount,
    DisplayOrder,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryQuery {
    pub sort_by: CategorySort,
    pub limit: Option<usize>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithMetadata {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub display_order: Option<i32>,
    pub product_count: usize,
    pub merchant_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryAggregation {
    pub categories: Vec<CategoryWithMetadata>,
    pub metrics: SearchMetrics,
}

struct CategoryAccumulator {
    name: String,
    is_active: bool,
    display_order: Option<i32>,
    products: HashSet<Uuid>,
    merchants: HashSet<Uuid>,
}

pub struct CategoryAggregator<C> {
    catalog: C,
}

impl<C: CatalogSource> CategoryAggregator<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Aggregates categories over the products the given merchants list.
    ///
    /// Pure with respect to the catalog: re-running against unchanged data
    /// yields the same categories and counts.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Db`] if either junction read fails.
    pub async fn aggregate(
        &self,
        merchant_ids: &[Uuid],
        query: &CategoryQuery,
    ) -> Result<CategoryAggregation, DiscoveryError> {
        let started = Instant::now();

        if merchant_ids.is_empty() {
            return Ok(Self::empty(started, 0));
        }

        let links = self.catalog.merchant_products(merchant_ids).await?;
        let scanned = links.len();
        if links.is_empty() {
            return Ok(Self::empty(started, scanned));
        }

        // BTreeSet keeps the product-id bind deterministic across runs.
        let product_ids: BTreeSet<Uuid> = links.iter().map(|l| l.product_id).collect();
        let mut merchants_by_product: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for link in &links {
            merchants_by_product
                .entry(link.product_id)
                .or_default()
                .insert(link.merchant_id);
        }

        let product_ids: Vec<Uuid> = product_ids.into_iter().collect();
        let edges = self.catalog.product_categories(&product_ids).await?;

        let mut accumulators: HashMap<Uuid, CategoryAccumulator> = HashMap::new();
        for edge in edges {
            let entry = accumulators
                .entry(edge.category_id)
                .or_insert_with(|| CategoryAccumulator {
                    name: edge.category_name.clone(),
                    is_active: edge.category_is_active,
                    display_order: edge.display_order,
                    products: HashSet::new(),
                    merchants: HashSet::new(),
                });
            entry.products.insert(edge.product_id);
            if let Some(merchants) = merchants_by_product.get(&edge.product_id) {
                entry.merchants.extend(merchants);
            }
        }

        let mut categories: Vec<CategoryWithMetadata> = accumulators
            .into_iter()
            .filter(|(_, acc)| query.include_inactive || acc.is_active)
            .map(|(id, acc)| CategoryWithMetadata {
                id,
                name: acc.name,
                is_active: acc.is_active,
                display_order: acc.display_order,
                product_count: acc.products.len(),
                merchant_count: acc.merchants.len(),
            })
            .collect();

        sort_categories(&mut categories, query.sort_by);
        let matched = categories.len();
        if let Some(limit) = query.limit {
            categories.truncate(limit);
        }

        Ok(CategoryAggregation {
            categories,
            metrics: SearchMetrics::since(started, scanned, matched, "catalog"),
        })
    }

    fn empty(started: Instant, scanned: usize) -> CategoryAggregation {
        CategoryAggregation {
            categories: Vec::new(),
            metrics: SearchMetrics::since(started, scanned, 0, "catalog"),
        }
    }
}

fn sort_categories(categories: &mut [CategoryWithMetadata], sort_by: CategorySort) {
    match sort_by {
        CategorySort::Name => categories.sort_by(|a, b| a.name.cmp(&b.name)),
        CategorySort::ProductCount => categories.sort_by(|a, b| {
            b.product_count
                .cmp(&a.product_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
        CategorySort::MerchantCount => categories.sort_by(|a, b| {
            b.merchant_count
                .cmp(&a.merchant_count)
                .then_with(|| a.name.cmp(&b.name))
        }),
        CategorySort::DisplayOrder => categories.sort_by(|a, b| {
            a.display_order
                .unwrap_or(UNORDERED_DISPLAY_ORDER)
                .cmp(&b.display_order.unwrap_or(UNORDERED_DISPLAY_ORDER))
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MerchantProductLink, ProductCategoryLink};
    use crate::testutil::FakeCatalog;

    fn link(merchant: Uuid, product: Uuid) -> MerchantProductLink {
        MerchantProductLink {
            merchant_id: merchant,
            product_id: product,
        }
    }

    fn edge(
        product: Uuid,
        category: Uuid,
        name: &str,
        active: bool,
        order: Option<i32>,
    ) -> ProductCategoryLink {
        ProductCategoryLink {
            product_id: product,
            category_id: category,
            category_name: name.to_owned(),
            category_is_active: active,
            display_order: order,
        }
    }

    #[tokio::test]
    async fn empty_merchant_set_skips_catalog_entirely() {
        let catalog = FakeCatalog::default();
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(&[], &CategoryQuery::default())
            .await
            .unwrap();
        assert!(result.categories.is_empty());
        assert_eq!(aggregator.catalog.merchant_product_calls(), 0);
        assert_eq!(aggregator.catalog.product_category_calls(), 0);
    }

    #[tokio::test]
    async fn merchants_without_products_skip_category_lookup() {
        let catalog = FakeCatalog::default();
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(&[Uuid::new_v4()], &CategoryQuery::default())
            .await
            .unwrap();
        assert!(result.categories.is_empty());
        assert_eq!(aggregator.catalog.merchant_product_calls(), 1);
        assert_eq!(aggregator.catalog.product_category_calls(), 0);
    }

    #[tokio::test]
    async fn shared_product_counts_once_per_product_and_per_merchant() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let adobo = Uuid::new_v4();
        let filipino = Uuid::new_v4();

        // Two merchants listing the same product under one category.
        let catalog = FakeCatalog::new(
            vec![link(m1, adobo), link(m2, adobo)],
            vec![edge(adobo, filipino, "Filipino", true, Some(1))],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(&[m1, m2], &CategoryQuery::default())
            .await
            .unwrap();
        assert_eq!(result.categories.len(), 1);
        let cat = &result.categories[0];
        assert_eq!(cat.name, "Filipino");
        assert_eq!(cat.product_count, 1);
        assert_eq!(cat.merchant_count, 2);
    }

    #[tokio::test]
    async fn product_in_two_categories_counts_toward_both() {
        let m = Uuid::new_v4();
        let halo = Uuid::new_v4();
        let desserts = Uuid::new_v4();
        let cold = Uuid::new_v4();

        let catalog = FakeCatalog::new(
            vec![link(m, halo)],
            vec![
                edge(halo, desserts, "Desserts", true, Some(2)),
                edge(halo, cold, "Cold Treats", true, Some(5)),
            ],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(&[m], &CategoryQuery::default())
            .await
            .unwrap();
        assert_eq!(result.categories.len(), 2);
        assert!(result
            .categories
            .iter()
            .all(|c| c.product_count == 1 && c.merchant_count == 1));
    }

    #[tokio::test]
    async fn inactive_categories_are_dropped_unless_requested() {
        let m = Uuid::new_v4();
        let p = Uuid::new_v4();
        let active = Uuid::new_v4();
        let retired = Uuid::new_v4();

        let catalog = FakeCatalog::new(
            vec![link(m, p)],
            vec![
                edge(p, active, "Active", true, None),
                edge(p, retired, "Retired", false, None),
            ],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let default = aggregator
            .aggregate(&[m], &CategoryQuery::default())
            .await
            .unwrap();
        assert_eq!(default.categories.len(), 1);
        assert_eq!(default.categories[0].name, "Active");

        let with_inactive = aggregator
            .aggregate(
                &[m],
                &CategoryQuery {
                    include_inactive: true,
                    ..CategoryQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(with_inactive.categories.len(), 2);
    }

    #[tokio::test]
    async fn display_order_sort_places_unordered_last() {
        let m = Uuid::new_v4();
        let p = Uuid::new_v4();
        let catalog = FakeCatalog::new(
            vec![link(m, p)],
            vec![
                edge(p, Uuid::new_v4(), "Unordered", true, None),
                edge(p, Uuid::new_v4(), "Second", true, Some(20)),
                edge(p, Uuid::new_v4(), "First", true, Some(3)),
            ],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(
                &[m],
                &CategoryQuery {
                    sort_by: CategorySort::DisplayOrder,
                    ..CategoryQuery::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = result.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Unordered"]);
    }

    #[tokio::test]
    async fn count_sorts_are_descending_with_name_tiebreak() {
        let m1 = Uuid::new_v4();
        let m2 = Uuid::new_v4();
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let big = Uuid::new_v4();
        let small = Uuid::new_v4();

        let catalog = FakeCatalog::new(
            vec![link(m1, p1), link(m2, p1), link(m1, p2)],
            vec![
                edge(p1, big, "Beverages", true, None),
                edge(p2, big, "Beverages", true, None),
                edge(p1, small, "Alcohol", true, None),
            ],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(
                &[m1, m2],
                &CategoryQuery {
                    sort_by: CategorySort::ProductCount,
                    ..CategoryQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(result.categories[0].name, "Beverages");
        assert_eq!(result.categories[0].product_count, 2);
        assert_eq!(result.categories[1].name, "Alcohol");
    }

    #[tokio::test]
    async fn limit_truncates_after_sorting() {
        let m = Uuid::new_v4();
        let p = Uuid::new_v4();
        let catalog = FakeCatalog::new(
            vec![link(m, p)],
            vec![
                edge(p, Uuid::new_v4(), "B", true, None),
                edge(p, Uuid::new_v4(), "A", true, None),
                edge(p, Uuid::new_v4(), "C", true, None),
            ],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let result = aggregator
            .aggregate(
                &[m],
                &CategoryQuery {
                    limit: Some(2),
                    ..CategoryQuery::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = result.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(result.metrics.matched, 3, "matched counts pre-truncation");
    }

    #[tokio::test]
    async fn aggregation_is_idempotent_over_unchanged_catalog() {
        let m = Uuid::new_v4();
        let p = Uuid::new_v4();
        let cat = Uuid::new_v4();
        let catalog = FakeCatalog::new(
            vec![link(m, p)],
            vec![edge(p, cat, "Snacks", true, Some(1))],
        );
        let aggregator = CategoryAggregator::new(catalog);

        let first = aggregator
            .aggregate(&[m], &CategoryQuery::default())
            .await
            .unwrap();
        let second = aggregator
            .aggregate(&[m], &CategoryQuery::default())
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&first.categories).unwrap(),
            serde_json::to_value(&second.categories).unwrap()
        );
    }
}
