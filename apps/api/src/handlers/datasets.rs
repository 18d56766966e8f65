use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{DatasetFilesResponse, LinkedServiceResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_datasets_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<DatasetFilesResponse>> {
    let files = state.editor.list_datasets().await?;
    Ok(Json(DatasetFilesResponse { files }))
}

pub async fn linked_services_handler(
    State(state): State<AppState>,
    Path(dataset_type): Path<String>,
) -> ApiResult<Json<Vec<LinkedServiceResponse>>> {
    let services = state
        .editor
        .linked_service_options(dataset_type.as_str())
        .await?
        .iter()
        .map(LinkedServiceResponse::from)
        .collect();
    Ok(Json(services))
}
