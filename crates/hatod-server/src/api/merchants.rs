use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use hatod_discovery::{
    CheckoutConfig, CheckoutResolver, CheckoutResult, PgSources, RadiusQuery, RadiusSearch,
    RadiusSearchResult, RoutedProvider, SearchConfig, SearchStrategy, ZoneType,
};

use crate::middleware::RequestId;

use super::{map_discovery_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct NearbyParams {
    lat: f64,
    lng: f64,
    radius_m: Option<f64>,
    limit: Option<i64>,
    offset: Option<i64>,
    strategy: Option<SearchStrategy>,
    zone: Option<String>,
    within_delivery_radius: Option<bool>,
}

fn routed_provider(state: &AppState) -> RoutedProvider {
    RoutedProvider::new(
        Arc::clone(&state.routing),
        state.config.routing_selftest_timeout_secs,
        state.config.routing_max_concurrent_batches,
    )
}

pub(super) async fn find_nearby_merchants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<ApiResponse<RadiusSearchResult>>, ApiError> {
    let zone = params
        .zone
        .as_deref()
        .map(str::parse::<ZoneType>)
        .transpose()
        .map_err(|e| ApiError::new(req_id.0.clone(), "VALIDATION_ERROR", e))?;

    let query = RadiusQuery {
        latitude: params.lat,
        longitude: params.lng,
        radius_meters: params.radius_m,
        limit: normalize_limit(params.limit),
        offset: params.offset.unwrap_or(0).max(0),
        strategy: params.strategy.unwrap_or(SearchStrategy::Routed),
        only_within_delivery_radius: params.within_delivery_radius.unwrap_or(false),
        zone,
    };

    let sources = PgSources::new(state.pool.clone());
    let search = RadiusSearch::new(
        routed_provider(&state),
        sources.clone(),
        sources,
        SearchConfig::from_app_config(&state.config),
    );

    let result = search
        .find_within_radius(&query)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn resolve_checkout_merchants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CheckoutResult>>, ApiError> {
    let sources = PgSources::new(state.pool.clone());
    let resolver = CheckoutResolver::new(
        routed_provider(&state),
        sources.clone(),
        sources,
        CheckoutConfig::from_app_config(&state.config),
    );

    let result = resolver
        .resolve(customer_id)
        .await
        .map_err(|e| map_discovery_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
