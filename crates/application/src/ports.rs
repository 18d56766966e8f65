use adfstudio_core::AppResult;
use adfstudio_domain::LinkedServiceSummary;
use async_trait::async_trait;

/// Read/write access to the JSON definition files of one ADF workspace.
///
/// Paths are relative to the workspace root, e.g. `dataset/Orders.json`.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Reads a definition file. `NotFound` when the file does not exist,
    /// `Persistence` for any other I/O failure.
    async fn read_text(&self, path: &str) -> AppResult<String>;

    /// Writes a definition file, creating parent directories as needed.
    async fn write_text(&self, path: &str, contents: &str) -> AppResult<()>;

    /// Lists the JSON file names directly inside one workspace directory,
    /// sorted by name. A missing directory lists as empty.
    async fn list_json_files(&self, directory: &str) -> AppResult<Vec<String>>;
}

/// Source of linked service definitions, used only to populate and filter
/// the `linkedService` option set.
#[async_trait]
pub trait LinkedServiceRegistry: Send + Sync {
    /// Returns every known linked service.
    async fn list_services(&self) -> AppResult<Vec<LinkedServiceSummary>>;
}
