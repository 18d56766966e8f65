use adfstudio_domain::{
    DatasetTypeConfig, FieldCatalog, FieldType, FieldValue, LINKED_SERVICE_FIELD, NAME_FIELD,
    Parameter, ParameterSet, Record,
};
use proptest::prelude::*;
use serde_json::{Value, json};

use super::{LoadedDataset, from_json, seed_defaults, to_json};
use crate::visibility;

fn catalog() -> FieldCatalog {
    FieldCatalog::builtin().unwrap_or_else(|_| unreachable!())
}

fn config<'a>(catalog: &'a FieldCatalog, type_name: &str) -> &'a DatasetTypeConfig {
    catalog.find(type_name).unwrap_or_else(|| unreachable!())
}

/// Fills every currently active field of a scope with a plausible value,
/// re-normalizing visibility after each write.
fn filled_record(config: &DatasetTypeConfig, file_type: Option<&str>) -> Record {
    let scope = config.scope(file_type).unwrap_or_else(|_| unreachable!());
    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("Orders"));
    record.set(LINKED_SERVICE_FIELD, FieldValue::text("WarehouseService"));
    seed_defaults(&scope, &mut record);

    let keys: Vec<String> = scope.fields().map(|(key, _)| key.to_owned()).collect();
    for key in keys {
        let def = scope.field(key.as_str()).unwrap_or_else(|| unreachable!());
        if !visibility::is_active(&scope, &record, key.as_str())
            || record.get(key.as_str()).is_some()
        {
            continue;
        }

        let value = match def.field_type() {
            FieldType::Text | FieldType::Hidden => Some(FieldValue::text("sample")),
            FieldType::Number => Some(FieldValue::text("2")),
            FieldType::Boolean => Some(FieldValue::Bool(true)),
            FieldType::Select | FieldType::SelectText | FieldType::Radio => def
                .options()
                .iter()
                .find(|option| !option.omit_from_json())
                .map(|option| FieldValue::text(option.value())),
            FieldType::KeyvalueParameters => {
                let parameter =
                    Parameter::new("env", "string", "dev").unwrap_or_else(|_| unreachable!());
                let parameters = ParameterSet::from_parameters(vec![parameter])
                    .unwrap_or_else(|_| unreachable!());
                Some(FieldValue::Parameters(parameters))
            }
        };
        if let Some(value) = value {
            record.set(key, value);
        }
        visibility::apply_visibility(&scope, &mut record);
    }

    record
}

#[test]
fn sql_table_scenario_loads_validates_and_reproduces_shape() {
    let catalog = catalog();
    let document = json!({
        "name": "Ds1",
        "properties": {
            "type": "AzureSqlTable",
            "linkedServiceName": {"referenceName": "LS1"}
        }
    });

    let loaded = from_json(&catalog, &document);
    assert_eq!(loaded.dataset_type.as_deref(), Some("AzureSqlTable"));
    assert_eq!(loaded.file_type, None);
    assert_eq!(loaded.record.text(NAME_FIELD), Some("Ds1"));
    assert_eq!(loaded.record.text(LINKED_SERVICE_FIELD), Some("LS1"));

    let report = crate::validate(&catalog, Some("AzureSqlTable"), None, &loaded.record);
    assert!(report.is_valid());

    let config = config(&catalog, "AzureSqlTable");
    let scope = config.scope(None).unwrap_or_else(|_| unreachable!());
    let saved = to_json(config, None, &scope, &loaded.record);
    assert_eq!(
        saved,
        json!({
            "name": "Ds1",
            "properties": {
                "type": "AzureSqlTable",
                "linkedServiceName": {
                    "referenceName": "LS1",
                    "type": "LinkedServiceReference"
                }
            }
        })
    );
}

#[test]
fn empty_parameter_set_omits_the_parameters_key() {
    let catalog = catalog();
    let config = config(&catalog, "AzureSqlTable");
    let scope = config.scope(None).unwrap_or_else(|_| unreachable!());

    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("Ds1"));
    record.set(LINKED_SERVICE_FIELD, FieldValue::text("LS1"));
    record.set("parameters", FieldValue::Parameters(ParameterSet::new()));

    let document = to_json(config, None, &scope, &record);
    assert_eq!(super::value_at(&document, &["properties", "parameters"]), None);
}

#[test]
fn single_parameter_serializes_exactly() {
    let catalog = catalog();
    let config = config(&catalog, "AzureSqlTable");
    let scope = config.scope(None).unwrap_or_else(|_| unreachable!());

    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("Ds1"));
    record.set(LINKED_SERVICE_FIELD, FieldValue::text("LS1"));
    let parameter = Parameter::new("p1", "String", "x").unwrap_or_else(|_| unreachable!());
    let parameters =
        ParameterSet::from_parameters(vec![parameter]).unwrap_or_else(|_| unreachable!());
    record.set("parameters", FieldValue::Parameters(parameters));

    let document = to_json(config, None, &scope, &record);
    assert_eq!(
        super::value_at(&document, &["properties", "parameters"]),
        Some(&json!({"p1": {"type": "string", "defaultValue": "x"}}))
    );
}

#[test]
fn derived_radio_loads_from_sibling_and_never_serializes() {
    let catalog = catalog();
    let document = json!({
        "name": "Report",
        "properties": {
            "type": "Excel",
            "linkedServiceName": {"referenceName": "Blob", "type": "LinkedServiceReference"},
            "typeProperties": {
                "location": {
                    "type": "AzureBlobStorageLocation",
                    "container": "reports",
                    "fileName": "q3.xlsx"
                },
                "sheetIndex": 4
            }
        }
    });

    let loaded = from_json(&catalog, &document);
    assert_eq!(loaded.dataset_type.as_deref(), Some("AzureBlobStorage"));
    assert_eq!(loaded.file_type.as_deref(), Some("Excel"));
    // First matching derivation rule wins: sheetName is absent, sheetIndex present.
    assert_eq!(loaded.record.text("sheetMode"), Some("index"));
    assert_eq!(loaded.record.text("sheetIndex"), Some("4"));
    // The radio hid its unselected sibling.
    assert_eq!(loaded.record.get("sheetName"), None);
    // fileName present in the document selects the "file" radio branch.
    assert_eq!(loaded.record.text("fileSelection"), Some("file"));

    let config = config(&catalog, "AzureBlobStorage");
    let scope = config.scope(Some("Excel")).unwrap_or_else(|_| unreachable!());
    let saved = to_json(config, config.file_type("Excel"), &scope, &loaded.record);
    assert_eq!(
        super::value_at(&saved, &["properties", "typeProperties", "sheetMode"]),
        None
    );
    assert_eq!(
        super::value_at(&saved, &["properties", "typeProperties", "fileSelection"]),
        None
    );
    assert_eq!(
        super::value_at(&saved, &["properties", "typeProperties", "sheetIndex"]),
        Some(&json!(4))
    );
}

#[test]
fn radio_without_matching_rule_keeps_schema_default() {
    let catalog = catalog();
    let document = json!({
        "name": "Report",
        "properties": {
            "type": "Excel",
            "linkedServiceName": {"referenceName": "Blob"},
            "typeProperties": {
                "location": {"type": "AzureBlobStorageLocation", "container": "reports"}
            }
        }
    });

    let loaded = from_json(&catalog, &document);
    assert_eq!(loaded.record.text("sheetMode"), Some("name"));
    assert_eq!(loaded.record.text("fileSelection"), Some("folder"));
}

#[test]
fn expression_mode_round_trips_as_expression_object() {
    let catalog = catalog();
    let config = config(&catalog, "AzureBlobStorage");
    let scope = config
        .scope(Some("DelimitedText"))
        .unwrap_or_else(|_| unreachable!());

    let mut record = filled_record(config, Some("DelimitedText"));
    record.set("columnDelimiter", FieldValue::text("@dataset().delimiter"));
    record.set_expression_mode("columnDelimiter", true);

    let document = to_json(config, config.file_type("DelimitedText"), &scope, &record);
    assert_eq!(
        super::value_at(&document, &["properties", "typeProperties", "columnDelimiter"]),
        Some(&json!({"value": "@dataset().delimiter", "type": "Expression"}))
    );

    let loaded = from_json(&catalog, &document);
    assert_eq!(loaded.record.text("columnDelimiter"), Some("@dataset().delimiter"));
    assert!(loaded.record.is_expression("columnDelimiter"));
}

#[test]
fn omitted_option_values_stay_out_of_the_document() {
    let catalog = catalog();
    let config = config(&catalog, "AzureBlobStorage");
    let scope = config
        .scope(Some("DelimitedText"))
        .unwrap_or_else(|_| unreachable!());

    let mut record = filled_record(config, Some("DelimitedText"));
    // "Default (UTF-8)" and "no quote character" are placeholder choices.
    record.set("encodingName", FieldValue::text(""));
    record.set("quoteChar", FieldValue::text(""));

    let document = to_json(config, config.file_type("DelimitedText"), &scope, &record);
    assert_eq!(
        super::value_at(&document, &["properties", "typeProperties", "encodingName"]),
        None
    );
    assert_eq!(
        super::value_at(&document, &["properties", "typeProperties", "quoteChar"]),
        None
    );
}

#[test]
fn missing_intermediate_keys_load_as_absent_values() {
    let catalog = catalog();
    let document = json!({
        "name": "Bare",
        "properties": {"type": "AzureSqlTable", "linkedServiceName": {"referenceName": "LS1"}}
    });

    let loaded = from_json(&catalog, &document);
    assert_eq!(loaded.record.get("table"), None);
    assert_eq!(loaded.record.get("schema"), None);
    assert_ne!(loaded.record.text("table"), Some("undefined"));
}

#[test]
fn unrecognized_shape_degrades_to_identity_only_load() {
    let catalog = catalog();
    let document = json!({
        "name": "Mystery",
        "properties": {
            "type": "CosmosDbSqlApiCollection",
            "linkedServiceName": {"referenceName": "Cosmos"},
            "typeProperties": {"collectionName": "events"}
        }
    });

    let loaded = from_json(&catalog, &document);
    assert_eq!(
        loaded,
        LoadedDataset {
            dataset_type: None,
            file_type: None,
            record: {
                let mut record = Record::new();
                record.set(NAME_FIELD, FieldValue::text("Mystery"));
                record.set(LINKED_SERVICE_FIELD, FieldValue::text("Cosmos"));
                record
            },
        }
    );
}

#[test]
fn numbers_serialize_as_json_numbers() {
    let catalog = catalog();
    let config = config(&catalog, "AzureBlobStorage");
    let scope = config.scope(Some("Excel")).unwrap_or_else(|_| unreachable!());

    let mut record = filled_record(config, Some("Excel"));
    record.set("sheetMode", FieldValue::text("index"));
    visibility::apply_visibility(&scope, &mut record);
    record.set("sheetIndex", FieldValue::text("3"));

    let document = to_json(config, config.file_type("Excel"), &scope, &record);
    assert_eq!(
        super::value_at(&document, &["properties", "typeProperties", "sheetIndex"]),
        Some(&json!(3))
    );
}

#[test]
fn every_builtin_layout_round_trips() {
    let catalog = catalog();
    for config in catalog.dataset_types() {
        let selections: Vec<Option<String>> = if config.requires_file_type() {
            config
                .file_types()
                .iter()
                .map(|file_type| Some(file_type.type_name().as_str().to_owned()))
                .collect()
        } else {
            vec![None]
        };

        for selection in selections {
            let file_type = selection.as_deref();
            let scope = config.scope(file_type).unwrap_or_else(|_| unreachable!());
            let record = filled_record(config, file_type);

            let first = to_json(
                config,
                file_type.and_then(|name| config.file_type(name)),
                &scope,
                &record,
            );
            let loaded = from_json(&catalog, &first);
            assert_eq!(
                loaded.dataset_type.as_deref(),
                Some(config.type_name().as_str())
            );
            assert_eq!(loaded.file_type.as_deref(), file_type);

            let second = to_json(
                config,
                file_type.and_then(|name| config.file_type(name)),
                &scope,
                &loaded.record,
            );
            assert_eq!(first, second, "round trip for {}", config.type_name());
        }
    }
}

fn document_for(container: &str, folder: &str, header: bool) -> Value {
    let catalog = catalog();
    let config = config(&catalog, "AzureBlobStorage");
    let scope = config
        .scope(Some("DelimitedText"))
        .unwrap_or_else(|_| unreachable!());

    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("Extract"));
    record.set(LINKED_SERVICE_FIELD, FieldValue::text("Blob"));
    seed_defaults(&scope, &mut record);
    record.set("container", FieldValue::text(container));
    record.set("folderPath", FieldValue::text(folder));
    record.set("firstRowAsHeader", FieldValue::Bool(header));

    to_json(config, config.file_type("DelimitedText"), &scope, &record)
}

proptest! {
    #[test]
    fn delimited_text_round_trip_holds_for_arbitrary_locations(
        container in "[a-z][a-z0-9]{0,11}",
        folder in "[a-z0-9/]{0,16}",
        header in any::<bool>(),
    ) {
        let catalog = catalog();
        let config = config(&catalog, "AzureBlobStorage");
        let scope = config
            .scope(Some("DelimitedText"))
            .unwrap_or_else(|_| unreachable!());

        let first = document_for(container.as_str(), folder.as_str(), header);
        let loaded = from_json(&catalog, &first);
        let second = to_json(
            config,
            config.file_type("DelimitedText"),
            &scope,
            &loaded.record,
        );
        prop_assert_eq!(first, second);
    }
}
