//! Domain model: field catalog, form records, and dataset vocabulary.

#![forbid(unsafe_code)]

mod builtin;
mod catalog;
mod field;
mod linked_service;
mod record;

pub use catalog::{
    DatasetTypeConfig, DatasetTypeInput, FieldCatalog, FieldScope, FieldSection, FileTypeConfig,
};
pub use field::{DerivedRule, FieldDef, FieldDefInput, FieldOption, FieldType, JsonPath, ShowWhen};
pub use linked_service::LinkedServiceSummary;
pub use record::{FieldValue, Parameter, ParameterSet, Record};

/// Record key holding the dataset name, present for every dataset type.
pub const NAME_FIELD: &str = "name";

/// Record key holding the linked service reference, present for every dataset type.
pub const LINKED_SERVICE_FIELD: &str = "linkedService";
