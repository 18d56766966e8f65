//! Bidirectional mapping between form records and ADF dataset documents.
//!
//! `to_json` never fails: the validator is the gate, and anything it would
//! reject simply contributes nothing to the document. `from_json` never
//! fails either: an unrecognized document shape degrades to a partial load
//! carrying only the identity fields.

use adfstudio_domain::{
    DatasetTypeConfig, FieldCatalog, FieldDef, FieldScope, FieldType, FieldValue, FileTypeConfig,
    JsonPath, LINKED_SERVICE_FIELD, NAME_FIELD, Parameter, ParameterSet, Record,
};
use serde_json::{Map, Number, Value};

use crate::visibility;

/// Result of loading a dataset document into form state. Absent type names
/// mark a degraded load of an unrecognized shape.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    /// Detected dataset type name.
    pub dataset_type: Option<String>,
    /// Detected file type name, for file-based dataset types.
    pub file_type: Option<String>,
    /// Extracted form record.
    pub record: Record,
}

/// Applies schema-declared defaults to every absent field of the scope.
pub fn seed_defaults(scope: &FieldScope<'_>, record: &mut Record) {
    for (key, def) in scope.fields() {
        if record.get(key).is_none()
            && let Some(default) = def.default_value()
        {
            record.set(key, default.clone());
        }
    }
}

/// Builds the dataset document for a record, per the selected dataset type
/// and file type.
#[must_use]
pub fn to_json(
    config: &DatasetTypeConfig,
    file_type: Option<&FileTypeConfig>,
    scope: &FieldScope<'_>,
    record: &Record,
) -> Value {
    let mut document = Value::Object(Map::new());

    write_at(
        &mut document,
        &["name"],
        Value::String(record.text(NAME_FIELD).unwrap_or_default().to_owned()),
    );

    let type_name = file_type
        .map(|file_type| file_type.type_name().as_str())
        .unwrap_or(config.type_name().as_str());
    write_at(
        &mut document,
        &["properties", "type"],
        Value::String(type_name.to_owned()),
    );

    if let Some(reference) = record.text(LINKED_SERVICE_FIELD)
        && !reference.is_empty()
    {
        let mut linked_service = Map::new();
        linked_service.insert("referenceName".to_owned(), Value::String(reference.to_owned()));
        linked_service.insert(
            "type".to_owned(),
            Value::String("LinkedServiceReference".to_owned()),
        );
        write_at(
            &mut document,
            &["properties", "linkedServiceName"],
            Value::Object(linked_service),
        );
    }

    if file_type.is_some()
        && let Some(location_type) = config.location_type()
    {
        write_at(
            &mut document,
            &["properties", "typeProperties", "location", "type"],
            Value::String(location_type.as_str().to_owned()),
        );
    }

    let active = visibility::active_fields(scope, record);
    for (key, def) in scope.fields() {
        if !active.contains(key) || def.omit_from_json() {
            continue;
        }

        if def.field_type() == FieldType::KeyvalueParameters {
            if let Some(parameters) = record.get(key).and_then(FieldValue::as_parameters)
                && !parameters.is_empty()
            {
                write_at(
                    &mut document,
                    &["properties", "parameters"],
                    parameters_value(parameters),
                );
            }
            continue;
        }

        let Some(path) = def.json_path() else {
            continue;
        };

        if let Some(value) = field_json_value(record, key, def) {
            write_path(&mut document, path, value);
        }
    }

    document
}

fn field_json_value(record: &Record, key: &str, def: &FieldDef) -> Option<Value> {
    match def.field_type() {
        FieldType::Boolean => record
            .get(key)
            .and_then(FieldValue::as_bool)
            .map(Value::Bool),
        FieldType::Number => {
            let text = record.text(key)?;
            parse_number(text).map(Value::Number)
        }
        FieldType::SelectText => {
            let text = record.text(key)?;
            if text.is_empty() {
                return None;
            }
            if record.is_expression(key) {
                let mut expression = Map::new();
                expression.insert("value".to_owned(), Value::String(text.to_owned()));
                expression.insert("type".to_owned(), Value::String("Expression".to_owned()));
                return Some(Value::Object(expression));
            }
            if def.option_for_value(text).is_some_and(|o| o.omit_from_json()) {
                return None;
            }
            Some(Value::String(text.to_owned()))
        }
        FieldType::Text | FieldType::Select | FieldType::Radio | FieldType::Hidden => {
            let text = record.text(key)?;
            if text.is_empty() {
                return None;
            }
            if def.option_for_value(text).is_some_and(|o| o.omit_from_json()) {
                return None;
            }
            Some(Value::String(text.to_owned()))
        }
        FieldType::KeyvalueParameters => None,
    }
}

fn parameters_value(parameters: &ParameterSet) -> Value {
    let mut object = Map::new();
    for parameter in parameters.parameters() {
        let mut entry = Map::new();
        entry.insert(
            "type".to_owned(),
            Value::String(parameter.parameter_type().as_str().to_owned()),
        );
        entry.insert(
            "defaultValue".to_owned(),
            Value::String(parameter.default_value().to_owned()),
        );
        object.insert(parameter.name().as_str().to_owned(), Value::Object(entry));
    }
    Value::Object(object)
}

/// Extracts form state from a dataset document. Detection runs first; an
/// unrecognized shape loads only the identity fields and reports no types.
#[must_use]
pub fn from_json(catalog: &FieldCatalog, document: &Value) -> LoadedDataset {
    let mut record = Record::new();

    if let Some(name) = value_at(document, &["name"]).and_then(Value::as_str) {
        record.set(NAME_FIELD, FieldValue::text(name));
    }
    if let Some(reference) = value_at(
        document,
        &["properties", "linkedServiceName", "referenceName"],
    )
    .and_then(Value::as_str)
    {
        record.set(LINKED_SERVICE_FIELD, FieldValue::text(reference));
    }

    let Some((config, file_type)) = detect(catalog, document) else {
        return LoadedDataset {
            dataset_type: None,
            file_type: None,
            record,
        };
    };

    let Ok(scope) = config.scope(file_type.map(|f| f.type_name().as_str())) else {
        return LoadedDataset {
            dataset_type: None,
            file_type: None,
            record,
        };
    };

    for (key, def) in scope.fields() {
        match def.field_type() {
            // Defaults are a fresh-session concern; a loaded record mirrors
            // the document, except radios, which fall back to their default
            // when no derivation rule matches.
            FieldType::Radio if def.omit_from_json() => {
                let selected = derive_radio(&scope, def, document)
                    .or_else(|| def.default_value().and_then(FieldValue::as_text));
                if let Some(selected) = selected {
                    record.set(key, FieldValue::text(selected));
                }
            }
            FieldType::KeyvalueParameters => {
                if let Some(parameters) =
                    value_at(document, &["properties", "parameters"]).and_then(Value::as_object)
                {
                    record.set(key, FieldValue::Parameters(read_parameters(parameters)));
                }
            }
            FieldType::Boolean => {
                if let Some(state) = def
                    .json_path()
                    .and_then(|path| value_path(document, path))
                    .and_then(Value::as_bool)
                {
                    record.set(key, FieldValue::Bool(state));
                }
            }
            FieldType::SelectText => {
                let Some(value) = def.json_path().and_then(|path| value_path(document, path))
                else {
                    continue;
                };
                if let Some(expression) = expression_text(value) {
                    record.set(key, FieldValue::text(expression));
                    record.set_expression_mode(key, true);
                } else if let Some(text) = scalar_text(value) {
                    record.set(key, FieldValue::text(text));
                }
            }
            FieldType::Text
            | FieldType::Select
            | FieldType::Radio
            | FieldType::Number
            | FieldType::Hidden => {
                if let Some(text) = def
                    .json_path()
                    .and_then(|path| value_path(document, path))
                    .and_then(scalar_text)
                {
                    record.set(key, FieldValue::text(text));
                }
            }
        }
    }

    visibility::apply_visibility(&scope, &mut record);

    LoadedDataset {
        dataset_type: Some(config.type_name().as_str().to_owned()),
        file_type: file_type.map(|f| f.type_name().as_str().to_owned()),
        record,
    }
}

fn detect<'a>(
    catalog: &'a FieldCatalog,
    document: &Value,
) -> Option<(&'a DatasetTypeConfig, Option<&'a FileTypeConfig>)> {
    let declared = value_at(document, &["properties", "type"]).and_then(Value::as_str)?;

    if let Some(config) = catalog.find(declared)
        && !config.requires_file_type()
    {
        return Some((config, None));
    }

    let location = value_at(
        document,
        &["properties", "typeProperties", "location", "type"],
    )
    .and_then(Value::as_str)?;
    let config = catalog.find_by_location_type(location)?;
    let file_type = config.file_type(declared)?;
    Some((config, Some(file_type)))
}

/// First derivation rule whose referenced sibling resolves to a non-empty
/// value in the document wins; no match keeps the schema default.
fn derive_radio<'a>(
    scope: &FieldScope<'_>,
    def: &'a FieldDef,
    document: &Value,
) -> Option<&'a str> {
    for rule in def.derived_from() {
        let present = scope
            .field(rule.field().as_str())
            .and_then(|sibling| sibling.json_path())
            .and_then(|path| value_path(document, path))
            .and_then(scalar_text)
            .is_some_and(|text| !text.is_empty());
        if present {
            return Some(rule.then_value());
        }
    }
    None
}

fn read_parameters(object: &Map<String, Value>) -> ParameterSet {
    let mut parameters = ParameterSet::new();
    for (name, entry) in object {
        let parameter_type = value_at(entry, &["type"])
            .and_then(Value::as_str)
            .unwrap_or("string");
        let default_value = value_at(entry, &["defaultValue"])
            .and_then(scalar_text)
            .unwrap_or_default();
        // Malformed entries are treated as absent rather than failing the load.
        if let Ok(parameter) = Parameter::new(name, parameter_type, default_value) {
            parameters.insert(parameter).ok();
        }
    }
    parameters
}

fn expression_text(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.get("type").and_then(Value::as_str) != Some("Expression") {
        return None;
    }
    object
        .get("value")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(state) => Some(state.to_string()),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Number> {
    if text.is_empty() {
        return None;
    }
    if let Ok(integer) = text.parse::<i64>() {
        return Some(Number::from(integer));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Resolves a value under a sequence of object keys. Traversal through a
/// missing intermediate yields `None`, distinct from a stored JSON `null`.
fn value_at<'a>(document: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(document, |current, segment| {
        current.as_object().and_then(|object| object.get(*segment))
    })
}

fn value_path<'a>(document: &'a Value, path: &JsonPath) -> Option<&'a Value> {
    path.segments().iter().try_fold(document, |current, segment| {
        current
            .as_object()
            .and_then(|object| object.get(segment.as_str()))
    })
}

fn write_path(document: &mut Value, path: &JsonPath, value: Value) {
    let segments: Vec<&str> = path.segments().iter().map(String::as_str).collect();
    write_at(document, &segments, value);
}

fn write_at(document: &mut Value, segments: &[&str], value: Value) {
    let Some((last, intermediate)) = segments.split_last() else {
        return;
    };

    let mut current = document;
    for segment in intermediate {
        let Some(object) = current.as_object_mut() else {
            return;
        };
        let entry = object
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry;
    }

    if let Some(object) = current.as_object_mut() {
        object.insert((*last).to_owned(), value);
    }
}

#[cfg(test)]
mod tests;
