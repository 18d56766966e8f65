//! Structural validation of a form record against the field catalog.

use adfstudio_domain::{
    FieldCatalog, FieldType, FieldValue, LINKED_SERVICE_FIELD, NAME_FIELD, Record,
};
use serde::Serialize;

use crate::visibility;

/// Accumulated validation outcome. Errors are ordered: identity fields,
/// type selection, then per-section fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<String>,
}

impl ValidationReport {
    /// Returns whether the record may be saved.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the human-readable error list.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Consumes the report into its error list.
    #[must_use]
    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}

/// Validates a record for the selected dataset type and file type. The pass
/// never short-circuits; every violated rule is reported.
#[must_use]
pub fn validate(
    catalog: &FieldCatalog,
    dataset_type: Option<&str>,
    file_type: Option<&str>,
    record: &Record,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if record.is_empty_at(NAME_FIELD) {
        report.push("Dataset name is required");
    }
    if record.is_empty_at(LINKED_SERVICE_FIELD) {
        report.push("Linked service is required");
    }

    let Some(type_name) = dataset_type else {
        report.push("Dataset type is required");
        return report;
    };
    let Some(config) = catalog.find(type_name) else {
        report.push(format!("Unknown dataset type '{type_name}'"));
        return report;
    };

    if config.requires_file_type() && file_type.is_none() {
        report.push("File type is required");
        return report;
    }
    let scope = match config.scope(file_type) {
        Ok(scope) => scope,
        Err(_) => {
            report.push(format!(
                "Unknown file type '{}' for dataset type '{type_name}'",
                file_type.unwrap_or_default()
            ));
            return report;
        }
    };

    for (key, def) in scope.fields() {
        if !visibility::is_active(&scope, record, key) {
            continue;
        }

        let label = def.label();
        match def.field_type() {
            // Checkbox state is always a usable value.
            FieldType::Boolean => {}
            FieldType::Number => {
                let text = record.text(key).unwrap_or_default();
                if text.is_empty() {
                    if def.required() {
                        report.push(format!("{label} is required"));
                    }
                    continue;
                }
                let Ok(value) = text.parse::<f64>() else {
                    report.push(format!("{label} must be a number"));
                    continue;
                };
                if let Some(min) = def.min()
                    && value < min
                {
                    report.push(format!("{label} must be at least {min}"));
                }
                if let Some(max) = def.max()
                    && value > max
                {
                    report.push(format!("{label} must be at most {max}"));
                }
            }
            FieldType::KeyvalueParameters => {
                match record.get(key).and_then(FieldValue::as_parameters) {
                    Some(parameters) if !parameters.is_empty() => {
                        for parameter in parameters.parameters() {
                            let type_name = parameter.parameter_type().as_str();
                            if !def.value_types().is_empty()
                                && !def.value_types().iter().any(|allowed| allowed == type_name)
                            {
                                report.push(format!(
                                    "{label} entry '{}' has unsupported type '{type_name}'",
                                    parameter.name()
                                ));
                            }
                        }
                    }
                    _ => {
                        if def.required() {
                            report.push(format!("{label} is required"));
                        }
                    }
                }
            }
            FieldType::Text
            | FieldType::Select
            | FieldType::SelectText
            | FieldType::Radio
            | FieldType::Hidden => {
                if def.required() && record.is_empty_at(key) {
                    report.push(format!("{label} is required"));
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests;
