//! adfstudio API composition root: the local bridge the dataset-editor
//! webview talks to.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use adfstudio_application::EditorService;
use adfstudio_core::AppError;
use adfstudio_domain::FieldCatalog;
use adfstudio_infrastructure::{FsDatasetStore, WorkspaceLinkedServiceRegistry};
use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::handlers::catalog::catalog_handler;
use crate::handlers::datasets::{linked_services_handler, list_datasets_handler};
use crate::handlers::health::health_handler;
use crate::handlers::sessions::{
    change_field_handler, close_session_handler, create_session_handler,
    expression_mode_handler, open_session_handler, save_session_handler,
    select_file_type_handler, select_type_handler, snapshot_handler,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let workspace_dir = env::var("ADF_WORKSPACE_DIR").unwrap_or_else(|_| ".".to_owned());
    let webview_url =
        env::var("WEBVIEW_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(4120);

    let catalog = Arc::new(FieldCatalog::builtin()?);
    let store = Arc::new(FsDatasetStore::new(workspace_dir.as_str()));
    let linked_services = Arc::new(WorkspaceLinkedServiceRegistry::new(store.clone()));
    let editor = Arc::new(EditorService::new(catalog, store, linked_services));
    let state = AppState { editor };

    let cors_origin = HeaderValue::from_str(webview_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid WEBVIEW_URL: {error}")))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/catalog", get(catalog_handler))
        .route("/datasets", get(list_datasets_handler))
        .route("/linked-services/{dataset_type}", get(linked_services_handler))
        .route("/sessions/open", post(open_session_handler))
        .route("/sessions/create", post(create_session_handler))
        .route("/sessions/close", post(close_session_handler))
        .route("/sessions/snapshot", get(snapshot_handler))
        .route("/sessions/select-type", post(select_type_handler))
        .route("/sessions/select-file-type", post(select_file_type_handler))
        .route("/sessions/field", post(change_field_handler))
        .route("/sessions/expression", post(expression_mode_handler))
        .route("/sessions/save", post(save_session_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let host = IpAddr::from_str(api_host.as_str())
        .map_err(|error| AppError::Validation(format!("invalid API_HOST: {error}")))?;
    let address = SocketAddr::new(host, api_port);
    info!(%address, workspace = workspace_dir, "adfstudio api listening");

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("binding {address}: {error}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(error.to_string()))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
