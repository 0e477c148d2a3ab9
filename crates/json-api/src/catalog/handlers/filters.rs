//! Available Filters Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use spareline::facets::ProductFilter;

use crate::{
    catalog::{
        errors::into_status_error, requests::ProductFilterRequest,
        responses::AvailableFiltersResponse,
    },
    extensions::*,
    state::State,
};

/// Available Filters Handler
///
/// Facet counts for a catalog query. Each facet is counted as if its own
/// selection were lifted, so picking one option never hides its siblings.
#[endpoint(
    tags("catalog"),
    summary = "Available Filters",
    responses(
        (status_code = StatusCode::OK, description = "Facets"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid filter"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "catalog.filters", skip_all, err)]
pub(crate) async fn handler(
    json: JsonBody<ProductFilterRequest>,
    depot: &mut Depot,
) -> Result<Json<AvailableFiltersResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let filter = ProductFilter::try_from(json.into_inner())?;

    let filters = state
        .app
        .catalog
        .available_filters(filter)
        .await
        .map_err(into_status_error)?;

    Ok(Json(filters.into()))
}
