use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use adfstudio_application::DatasetStore;
use adfstudio_core::{AppError, AppResult};
use async_trait::async_trait;

/// Dataset store over an ADF workspace directory on disk, with the usual
/// `dataset/` and `linkedService/` layout.
#[derive(Debug, Clone)]
pub struct FsDatasetStore {
    root: PathBuf,
}

impl FsDatasetStore {
    /// Creates a store rooted at the workspace directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Joins a workspace-relative path, rejecting absolute paths and any
    /// traversal outside the root.
    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let candidate = Path::new(relative);
        let escapes = candidate.components().any(|component| {
            !matches!(component, Component::Normal(_) | Component::CurDir)
        });
        if escapes || candidate.as_os_str().is_empty() {
            return Err(AppError::Validation(format!(
                "'{relative}' is not a workspace-relative path"
            )));
        }

        Ok(self.root.join(candidate))
    }
}

#[async_trait]
impl DatasetStore for FsDatasetStore {
    async fn read_text(&self, path: &str) -> AppResult<String> {
        let resolved = self.resolve(path)?;
        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound => AppError::NotFound(format!("no file '{path}'")),
                _ => AppError::Persistence(format!("reading '{path}': {error}")),
            })
    }

    async fn write_text(&self, path: &str, contents: &str) -> AppResult<()> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| {
                    AppError::Persistence(format!("creating directories for '{path}': {error}"))
                })?;
        }

        tokio::fs::write(&resolved, contents)
            .await
            .map_err(|error| AppError::Persistence(format!("writing '{path}': {error}")))
    }

    async fn list_json_files(&self, directory: &str) -> AppResult<Vec<String>> {
        let resolved = self.resolve(directory)?;
        let mut entries = match tokio::fs::read_dir(&resolved).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(AppError::Persistence(format!(
                    "listing '{directory}': {error}"
                )));
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|error| {
                AppError::Persistence(format!("listing '{directory}': {error}"))
            })?;
            let Some(entry) = entry else {
                break;
            };

            let is_file = entry
                .file_type()
                .await
                .map(|file_type| file_type.is_file())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && name.ends_with(".json") {
                names.push(name);
            }
        }

        names.sort();
        Ok(names)
    }
}
