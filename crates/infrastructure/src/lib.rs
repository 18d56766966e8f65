//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod fs_dataset_store;
mod in_memory_dataset_store;
mod workspace_linked_service_registry;

pub use fs_dataset_store::FsDatasetStore;
pub use in_memory_dataset_store::InMemoryDatasetStore;
pub use workspace_linked_service_registry::WorkspaceLinkedServiceRegistry;
