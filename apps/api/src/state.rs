use std::sync::Arc;

use adfstudio_application::EditorService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub editor: Arc<EditorService>,
}
