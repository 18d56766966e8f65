use std::sync::Arc;

use adfstudio_application::{DatasetStore, LinkedServiceRegistry};
use adfstudio_core::AppResult;
use adfstudio_domain::LinkedServiceSummary;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Linked service registry over the workspace's `linkedService/` directory.
/// Files that fail to parse are skipped; the registry itself never fails a
/// listing because of one bad definition.
pub struct WorkspaceLinkedServiceRegistry {
    store: Arc<dyn DatasetStore>,
}

impl WorkspaceLinkedServiceRegistry {
    /// Creates a registry reading through a dataset store.
    #[must_use]
    pub fn new(store: Arc<dyn DatasetStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LinkedServiceRegistry for WorkspaceLinkedServiceRegistry {
    async fn list_services(&self) -> AppResult<Vec<LinkedServiceSummary>> {
        let mut services = Vec::new();
        for file in self.store.list_json_files("linkedService").await? {
            let path = format!("linkedService/{file}");
            let contents = self.store.read_text(path.as_str()).await?;

            let Ok(document) = serde_json::from_str::<Value>(contents.as_str()) else {
                warn!(path, "skipping unparseable linked service definition");
                continue;
            };
            let name = document.get("name").and_then(Value::as_str);
            let service_type = document
                .get("properties")
                .and_then(|properties| properties.get("type"))
                .and_then(Value::as_str);
            let summary = match (name, service_type) {
                (Some(name), Some(service_type)) => LinkedServiceSummary::new(name, service_type),
                _ => {
                    warn!(path, "skipping linked service definition without name/type");
                    continue;
                }
            };

            match summary {
                Ok(summary) => services.push(summary),
                Err(error) => {
                    warn!(path, %error, "skipping invalid linked service definition");
                }
            }
        }

        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use adfstudio_application::LinkedServiceRegistry;
    use serde_json::json;

    use super::WorkspaceLinkedServiceRegistry;
    use crate::InMemoryDatasetStore;

    #[tokio::test]
    async fn lists_name_and_type_from_definitions() {
        let store = Arc::new(InMemoryDatasetStore::new());
        store
            .seed(
                "linkedService/WarehouseDb.json",
                json!({
                    "name": "WarehouseDb",
                    "properties": {
                        "type": "AzureSqlDatabase",
                        "typeProperties": {"connectionString": "Server=..."}
                    }
                })
                .to_string(),
            )
            .await;

        let registry = WorkspaceLinkedServiceRegistry::new(store);
        let services = registry.list_services().await;
        assert!(services.is_ok());
        let services = services.unwrap_or_default();
        assert_eq!(services.len(), 1);
        assert_eq!(
            services.first().map(|s| s.service_type().as_str()),
            Some("AzureSqlDatabase")
        );
    }

    #[tokio::test]
    async fn malformed_definitions_are_skipped_not_fatal() {
        let store = Arc::new(InMemoryDatasetStore::new());
        store.seed("linkedService/Broken.json", "not json").await;
        store
            .seed(
                "linkedService/LandingBlob.json",
                json!({"name": "LandingBlob", "properties": {"type": "AzureBlobStorage"}})
                    .to_string(),
            )
            .await;
        store
            .seed("linkedService/NoType.json", json!({"name": "NoType"}).to_string())
            .await;

        let registry = WorkspaceLinkedServiceRegistry::new(store);
        let services = registry.list_services().await;
        assert!(services.is_ok());
        let services = services.unwrap_or_default();
        assert_eq!(services.len(), 1);
        assert_eq!(
            services.first().map(|s| s.name().as_str()),
            Some("LandingBlob")
        );
    }
}
