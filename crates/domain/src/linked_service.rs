use adfstudio_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Name and type of one linked service known to the workspace, used to
/// populate and filter the `linkedService` option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedServiceSummary {
    name: NonEmptyString,
    service_type: NonEmptyString,
}

impl LinkedServiceSummary {
    /// Creates a validated linked service summary.
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            service_type: NonEmptyString::new(service_type)?,
        })
    }

    /// Returns the linked service name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the linked service type, e.g. `AzureSqlDatabase`.
    #[must_use]
    pub fn service_type(&self) -> &NonEmptyString {
        &self.service_type
    }
}
