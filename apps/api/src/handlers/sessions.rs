use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::dto::{
    ChangeFieldRequest, CloseSessionRequest, ExpressionModeRequest, SaveResponse,
    SelectFileTypeRequest, SelectTypeRequest, SessionRequest, SnapshotResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn open_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state.editor.open(payload.path.as_str()).await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<(StatusCode, Json<SnapshotResponse>)> {
    let snapshot = state.editor.create(payload.path.as_str()).await?;
    Ok((StatusCode::CREATED, Json(SnapshotResponse::from(snapshot))))
}

pub async fn close_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<CloseSessionRequest>,
) -> ApiResult<StatusCode> {
    state
        .editor
        .close(payload.path.as_str(), payload.force)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn snapshot_handler(
    State(state): State<AppState>,
    Query(query): Query<SessionRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state.editor.snapshot(query.path.as_str()).await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn select_type_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectTypeRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state
        .editor
        .set_dataset_type(payload.path.as_str(), payload.dataset_type.as_str())
        .await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn select_file_type_handler(
    State(state): State<AppState>,
    Json(payload): Json<SelectFileTypeRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state
        .editor
        .set_file_type(payload.path.as_str(), payload.file_type.as_str())
        .await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn change_field_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChangeFieldRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state
        .editor
        .change_field(
            payload.path.as_str(),
            payload.field_key.as_str(),
            &payload.value,
        )
        .await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn expression_mode_handler(
    State(state): State<AppState>,
    Json(payload): Json<ExpressionModeRequest>,
) -> ApiResult<Json<SnapshotResponse>> {
    let snapshot = state
        .editor
        .set_expression_mode(
            payload.path.as_str(),
            payload.field_key.as_str(),
            payload.enabled,
        )
        .await?;
    Ok(Json(SnapshotResponse::from(snapshot)))
}

pub async fn save_session_handler(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> ApiResult<Json<SaveResponse>> {
    let outcome = state.editor.save(payload.path.as_str()).await?;
    Ok(Json(SaveResponse::from(outcome)))
}
