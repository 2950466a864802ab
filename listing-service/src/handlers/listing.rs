use crate::models::{GenerationResult, ListingQuery};
use crate::services::description::generate_description;
use crate::services::inventory::resolve_vehicle;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::Uri,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;

/// Endpoint selected by the request path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingRoute {
    Lookup,
    Generate,
}

impl ListingRoute {
    /// Any prefix is accepted so API Gateway stage paths such as
    /// `/prod/lookup` resolve the same way as `/lookup`.
    pub fn from_path(path: &str) -> Option<Self> {
        if path.ends_with("/lookup") {
            Some(ListingRoute::Lookup)
        } else if path.ends_with("/generate") {
            Some(ListingRoute::Generate)
        } else {
            None
        }
    }
}

/// Entry point for every path other than the health and metrics routes.
///
/// Validation runs before the inventory is fetched; a missing `stock` is
/// reported ahead of an unknown path.
pub async fn route_listing(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let query: ListingQuery = params.into_iter().collect();

    let stock = query
        .stock()
        .ok_or_else(|| AppError::bad_request("Missing stock number"))?;
    let route = ListingRoute::from_path(uri.path())
        .ok_or_else(|| AppError::bad_request("Unknown path"))?;

    let vehicle = resolve_vehicle(state.blob_store.as_ref(), &state.config.inventory, stock)
        .await
        .map_err(|e| {
            if let AppError::NotFound(_) = e {
                tracing::info!(stock = %stock, "Stock not found");
            }
            e
        })?;

    match route {
        ListingRoute::Lookup => {
            tracing::info!(stock = %stock, "Vehicle lookup");
            Ok(Json(vehicle).into_response())
        }
        ListingRoute::Generate => {
            let request = query
                .generation_request()
                .ok_or_else(|| AppError::bad_request("Missing options"))?;

            let description = generate_description(
                state.text_provider.as_ref(),
                &state.generation_params(),
                &vehicle,
                &request,
                state.config.description.append_disclaimer,
            )
            .await?;

            Ok(Json(GenerationResult {
                vehicle,
                description,
            })
            .into_response())
        }
    }
}
