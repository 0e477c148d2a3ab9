//! List Favorites Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spareline_app::domain::favorites::records::FavoriteRecord;

use crate::{extensions::*, favorites::errors::into_status_error, state::State};

/// Favorite Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct FavoriteResponse {
    pub uuid: Uuid,
    pub product_uuid: Uuid,
    pub name: String,
    pub sku: String,

    /// Current price in kopecks
    pub price: u64,

    pub is_active: bool,
    pub in_stock: bool,
    pub created_at: String,
}

impl From<FavoriteRecord> for FavoriteResponse {
    fn from(record: FavoriteRecord) -> Self {
        Self {
            uuid: record.uuid.into_uuid(),
            product_uuid: record.product_uuid.into_uuid(),
            name: record.name,
            sku: record.sku,
            price: record.price,
            is_active: record.is_active,
            in_stock: record.in_stock,
            created_at: record.created_at.to_string(),
        }
    }
}

/// List Favorites Handler
#[endpoint(
    tags("favorites"),
    summary = "List Favorites",
    security(("bearer_auth" = []), ("anonymous_token" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Favorites, newest first"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(name = "favorites.index", skip_all, err)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<Vec<FavoriteResponse>>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let owner = depot.identity_or_500()?.owner();

    let favorites = state
        .app
        .favorites
        .list(owner)
        .await
        .map_err(into_status_error)?;

    Ok(Json(favorites.into_iter().map(Into::into).collect()))
}
