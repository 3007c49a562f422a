use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use hatod_discovery::{CategoryAggregation, CategoryAggregator, CategoryQuery, CategorySort, PgSources};

use crate::middleware::RequestId;

use super::{map_discovery_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CategoryParams {
    /// Comma-separated merchant UUIDs.
    merchant_ids: String,
    sort_by: Option<CategorySort>,
    limit: Option<usize>,
    include_inactive: Option<bool>,
}

fn parse_merchant_ids(raw: &str) -> Result<Vec<Uuid>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| format!("invalid merchant id: {s}"))
        })
        .collect()
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CategoryParams>,
) -> Result<Json<ApiResponse<CategoryAggregation>>, ApiError> {
    let merchant_ids = parse_merchant_ids(&params.merchant_ids)
        .map_err(|e| ApiError::new(req_id.0.clone(), "VALIDATION_ERROR", e))?;

    let query = CategoryQuery {
        sort_by: params.sort_by.unwrap_or_default(),
        limit: params.limit,
        include_inactive: params.include_inactive.unwrap_or(false),
    };

    let aggregator = CategoryAggregator::new(PgSources::new(state.pool.clone()));
    let result = aggregator
        .aggregate(&merchant_ids, &query)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
