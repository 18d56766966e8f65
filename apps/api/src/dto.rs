use std::collections::BTreeMap;

use adfstudio_application::{EditorSnapshot, SaveOutcome};
use adfstudio_domain::{
    DatasetTypeConfig, FieldCatalog, FieldDef, FieldSection, FieldValue, FileTypeConfig,
    LinkedServiceSummary, Record, ShowWhen,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/health-response.ts")]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Full catalog description the webview builds its forms from.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/catalog-response.ts")]
pub struct CatalogResponse {
    pub dataset_types: Vec<DatasetTypeResponse>,
}

/// One dataset type with its layout.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/dataset-type-response.ts")]
pub struct DatasetTypeResponse {
    pub type_name: String,
    pub display_name: String,
    pub requires_file_type: bool,
    pub linked_service_types: Vec<String>,
    pub file_types: Vec<FileTypeResponse>,
    pub sections: Vec<SectionResponse>,
}

/// One file type with its sections.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/file-type-response.ts")]
pub struct FileTypeResponse {
    pub type_name: String,
    pub display_name: String,
    pub sections: Vec<SectionResponse>,
}

/// One form section.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/section-response.ts")]
pub struct SectionResponse {
    pub name: String,
    pub fields: Vec<FieldResponse>,
}

/// One renderable field definition.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/field-response.ts")]
pub struct FieldResponse {
    pub key: String,
    pub field_type: String,
    pub label: String,
    pub required: bool,
    pub options: Vec<OptionResponse>,
    pub show_when: Option<ShowWhenResponse>,
    pub value_types: Vec<String>,
    pub help_text: Option<String>,
    pub multiline: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// One selectable option.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/option-response.ts")]
pub struct OptionResponse {
    pub label: String,
    pub value: String,
}

/// Visibility rule in webview form.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/show-when-response.ts")]
pub struct ShowWhenResponse {
    pub field: String,
    /// Expected literal; absent means "any non-empty value".
    pub equals: Option<String>,
}

/// One linked service option for the `linkedService` dropdown.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/linked-service-response.ts")]
pub struct LinkedServiceResponse {
    pub name: String,
    pub service_type: String,
}

/// Names of the dataset definition files in the workspace.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/dataset-files-response.ts")]
pub struct DatasetFilesResponse {
    pub files: Vec<String>,
}

/// Session form state pushed to the webview.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/snapshot-response.ts")]
pub struct SnapshotResponse {
    pub path: String,
    pub dataset_type: Option<String>,
    pub file_type: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    pub values: BTreeMap<String, Value>,
    pub expression_fields: Vec<String>,
    pub active_fields: Vec<String>,
    pub errors: Vec<String>,
    pub dirty: bool,
}

/// Save outcome. `saved: false` carries the validation errors.
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/save-response.ts")]
pub struct SaveResponse {
    pub saved: bool,
    pub errors: Vec<String>,
}

/// Request naming an open (or openable) session by workspace path.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/session-request.ts")]
pub struct SessionRequest {
    pub path: String,
}

/// Close request; `force` discards unsaved edits.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/close-session-request.ts")]
pub struct CloseSessionRequest {
    pub path: String,
    #[serde(default)]
    pub force: bool,
}

/// Dataset type selection.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/select-type-request.ts")]
pub struct SelectTypeRequest {
    pub path: String,
    pub dataset_type: String,
}

/// File type selection.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/select-file-type-request.ts")]
pub struct SelectFileTypeRequest {
    pub path: String,
    pub file_type: String,
}

/// Raw field-change event from the webview.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/change-field-request.ts")]
pub struct ChangeFieldRequest {
    pub path: String,
    pub field_key: String,
    #[ts(type = "unknown")]
    pub value: Value,
}

/// Expression-mode toggle for a select-text field.
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../../../webview/src/generated/expression-mode-request.ts")]
pub struct ExpressionModeRequest {
    pub path: String,
    pub field_key: String,
    pub enabled: bool,
}

impl From<&FieldCatalog> for CatalogResponse {
    fn from(catalog: &FieldCatalog) -> Self {
        Self {
            dataset_types: catalog
                .dataset_types()
                .iter()
                .map(DatasetTypeResponse::from)
                .collect(),
        }
    }
}

impl From<&DatasetTypeConfig> for DatasetTypeResponse {
    fn from(config: &DatasetTypeConfig) -> Self {
        Self {
            type_name: config.type_name().as_str().to_owned(),
            display_name: config.display_name().as_str().to_owned(),
            requires_file_type: config.requires_file_type(),
            linked_service_types: config.linked_service_types().iter().cloned().collect(),
            file_types: config.file_types().iter().map(FileTypeResponse::from).collect(),
            sections: config.sections().iter().map(SectionResponse::from).collect(),
        }
    }
}

impl From<&FileTypeConfig> for FileTypeResponse {
    fn from(config: &FileTypeConfig) -> Self {
        Self {
            type_name: config.type_name().as_str().to_owned(),
            display_name: config.display_name().as_str().to_owned(),
            sections: config.sections().iter().map(SectionResponse::from).collect(),
        }
    }
}

impl From<&FieldSection> for SectionResponse {
    fn from(section: &FieldSection) -> Self {
        Self {
            name: section.name().as_str().to_owned(),
            fields: section
                .fields()
                .map(|(key, def)| field_response(key, def))
                .collect(),
        }
    }
}

fn field_response(key: &str, def: &FieldDef) -> FieldResponse {
    FieldResponse {
        key: key.to_owned(),
        field_type: def.field_type().as_str().to_owned(),
        label: def.label().as_str().to_owned(),
        required: def.required(),
        options: def
            .options()
            .iter()
            .map(|option| OptionResponse {
                label: option.label().as_str().to_owned(),
                value: option.value().to_owned(),
            })
            .collect(),
        show_when: def.show_when().map(|rule| match rule {
            ShowWhen::NotEmpty { field } => ShowWhenResponse {
                field: field.as_str().to_owned(),
                equals: None,
            },
            ShowWhen::Equals { field, value } => ShowWhenResponse {
                field: field.as_str().to_owned(),
                equals: Some(value.clone()),
            },
        }),
        value_types: def.value_types().to_vec(),
        help_text: def.help_text().map(str::to_owned),
        multiline: def.multiline(),
        min: def.min(),
        max: def.max(),
    }
}

impl From<&LinkedServiceSummary> for LinkedServiceResponse {
    fn from(summary: &LinkedServiceSummary) -> Self {
        Self {
            name: summary.name().as_str().to_owned(),
            service_type: summary.service_type().as_str().to_owned(),
        }
    }
}

impl From<EditorSnapshot> for SnapshotResponse {
    fn from(snapshot: EditorSnapshot) -> Self {
        let expression_fields = snapshot
            .record
            .keys()
            .filter(|key| snapshot.record.is_expression(key))
            .map(str::to_owned)
            .collect();

        Self {
            path: snapshot.path,
            dataset_type: snapshot.dataset_type,
            file_type: snapshot.file_type,
            values: record_values(&snapshot.record),
            expression_fields,
            active_fields: snapshot.active_fields.into_iter().collect(),
            errors: snapshot.errors,
            dirty: snapshot.dirty,
        }
    }
}

impl From<SaveOutcome> for SaveResponse {
    fn from(outcome: SaveOutcome) -> Self {
        Self {
            saved: outcome.saved,
            errors: outcome.errors,
        }
    }
}

fn record_values(record: &Record) -> BTreeMap<String, Value> {
    record
        .keys()
        .filter_map(|key| record.get(key).map(|value| (key.to_owned(), field_value_json(value))))
        .collect()
}

/// Parameters mirror the wire shape of `ChangeFieldRequest.value`.
fn field_value_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Bool(state) => Value::Bool(*state),
        FieldValue::Parameters(parameters) => Value::Array(
            parameters
                .parameters()
                .iter()
                .map(|parameter| {
                    serde_json::json!({
                        "name": parameter.name().as_str(),
                        "type": parameter.parameter_type().as_str(),
                        "defaultValue": parameter.default_value(),
                    })
                })
                .collect(),
        ),
    }
}
