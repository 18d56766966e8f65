use std::collections::HashMap;

use adfstudio_application::DatasetStore;
use adfstudio_core::{AppError, AppResult};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory dataset store implementation for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryDatasetStore {
    files: RwLock<HashMap<String, String>>,
}

impl InMemoryDatasetStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds one file, replacing any previous contents.
    pub async fn seed(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.write().await.insert(path.into(), contents.into());
    }
}

#[async_trait]
impl DatasetStore for InMemoryDatasetStore {
    async fn read_text(&self, path: &str) -> AppResult<String> {
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no file '{path}'")))
    }

    async fn write_text(&self, path: &str, contents: &str) -> AppResult<()> {
        self.files
            .write()
            .await
            .insert(path.to_owned(), contents.to_owned());
        Ok(())
    }

    async fn list_json_files(&self, directory: &str) -> AppResult<Vec<String>> {
        let prefix = format!("{directory}/");
        let files = self.files.read().await;
        let mut names: Vec<String> = files
            .keys()
            .filter_map(|path| path.strip_prefix(prefix.as_str()))
            .filter(|name| name.ends_with(".json") && !name.contains('/'))
            .map(str::to_owned)
            .collect();
        names.sort();
        Ok(names)
    }
}
