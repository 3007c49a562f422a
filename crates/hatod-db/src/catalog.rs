//! Reads over the product/category relationship graph.
//!
//! The category aggregator needs two flat views: active+available
//! merchant↔product junction rows for a merchant set, and the categories of
//! a set of active products. Counting and deduplication happen in the
//! aggregator, not here.

use sqlx::PgPool;
use uuid::Uuid;

/// An active, available `merchant_products` junction row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MerchantProductRow {
    pub merchant_id: Uuid,
    pub product_id: Uuid,
}

/// One (product, category) edge for an active product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductCategoryRow {
    pub product_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_is_active: bool,
    pub display_order: Option<i32>,
}

/// Fetch active+available junction rows for the given merchant set.
///
/// Both `is_active` and `is_available` gate visibility; a merchant's
/// disabled offerings never contribute to category counts.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_active_merchant_products(
    pool: &PgPool,
    merchant_ids: &[Uuid],
) -> Result<Vec<MerchantProductRow>, sqlx::Error> {
    sqlx::query_as::<_, MerchantProductRow>(
        "SELECT merchant_id, product_id \
         FROM merchant_products \
         WHERE merchant_id = ANY($1) \
           AND is_active = TRUE \
           AND is_available = TRUE",
    )
    .bind(merchant_ids)
    .fetch_all(pool)
    .await
}

/// Fetch category edges for the given products, restricted to active products.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_product_categories(
    pool: &PgPool,
    product_ids: &[Uuid],
) -> Result<Vec<ProductCategoryRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductCategoryRow>(
        "SELECT pc.product_id, c.id AS category_id, c.name AS category_name, \
                c.is_active AS category_is_active, c.display_order \
         FROM product_categories pc \
         JOIN products p ON p.id = pc.product_id \
         JOIN categories c ON c.id = pc.category_id \
         WHERE pc.product_id = ANY($1) \
           AND p.is_active = TRUE",
    )
    .bind(product_ids)
    .fetch_all(pool)
    .await
}
