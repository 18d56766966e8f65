use axum::Json;
use axum::extract::State;

use crate::dto::CatalogResponse;
use crate::state::AppState;

pub async fn catalog_handler(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse::from(state.editor.catalog()))
}
