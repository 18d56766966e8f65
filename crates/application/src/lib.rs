//! Application services and ports for the dataset editor.

#![forbid(unsafe_code)]

mod mapper;
mod ports;
mod session;
mod validator;
mod visibility;

pub use mapper::{LoadedDataset, from_json, seed_defaults, to_json};
pub use ports::{DatasetStore, LinkedServiceRegistry};
pub use session::{EditorService, EditorSession, EditorSnapshot, SaveOutcome, SessionState};
pub use validator::{ValidationReport, validate};
pub use visibility::{active_fields, apply_visibility, is_active};
