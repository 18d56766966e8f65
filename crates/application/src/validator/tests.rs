use adfstudio_domain::{
    FieldCatalog, FieldValue, LINKED_SERVICE_FIELD, NAME_FIELD, Parameter, ParameterSet, Record,
};

use super::validate;

fn catalog() -> FieldCatalog {
    FieldCatalog::builtin().unwrap_or_else(|_| unreachable!())
}

fn identity_record() -> Record {
    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("Orders"));
    record.set(LINKED_SERVICE_FIELD, FieldValue::text("Warehouse"));
    record
}

#[test]
fn missing_name_reports_required_first() {
    let catalog = catalog();
    let record = Record::new();

    let report = validate(&catalog, Some("AzureSqlTable"), None, &record);
    assert!(!report.is_valid());
    assert_eq!(
        report.errors().first().map(String::as_str),
        Some("Dataset name is required")
    );
    assert!(report.errors().iter().any(|error| error.contains("required")));
}

#[test]
fn supplying_name_removes_only_that_error() {
    let catalog = catalog();
    let mut record = Record::new();
    record.set(NAME_FIELD, FieldValue::text("ds1"));

    let report = validate(&catalog, Some("AzureSqlTable"), None, &record);
    assert!(
        !report
            .errors()
            .iter()
            .any(|error| error == "Dataset name is required")
    );
    assert!(
        report
            .errors()
            .iter()
            .any(|error| error == "Linked service is required")
    );
}

#[test]
fn missing_dataset_type_short_circuits_field_checks() {
    let catalog = catalog();
    let report = validate(&catalog, None, None, &identity_record());
    assert_eq!(report.errors(), ["Dataset type is required"]);
}

#[test]
fn file_typed_dataset_requires_file_type_selection() {
    let catalog = catalog();
    let report = validate(&catalog, Some("AzureBlobStorage"), None, &identity_record());
    assert_eq!(report.errors(), ["File type is required"]);
}

#[test]
fn required_location_field_reports_with_label() {
    let catalog = catalog();
    let report = validate(
        &catalog,
        Some("AzureBlobStorage"),
        Some("DelimitedText"),
        &identity_record(),
    );
    assert!(
        report
            .errors()
            .iter()
            .any(|error| error == "Container is required")
    );
}

#[test]
fn hidden_fields_are_not_validated() {
    let catalog = catalog();
    let mut record = identity_record();
    seed_delimited_defaults(&catalog, &mut record);
    record.set("container", FieldValue::text("landing"));
    // compressionLevel stays hidden while no codec is picked, so its
    // emptiness never reaches the report.
    let report = validate(
        &catalog,
        Some("AzureBlobStorage"),
        Some("DelimitedText"),
        &record,
    );
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors());
}

fn seed_delimited_defaults(catalog: &FieldCatalog, record: &mut Record) {
    let scope = catalog
        .find("AzureBlobStorage")
        .map(|config| config.scope(Some("DelimitedText")))
        .unwrap_or_else(|| unreachable!());
    assert!(scope.is_ok());
    crate::seed_defaults(&scope.unwrap_or_else(|_| unreachable!()), record);
}

#[test]
fn unparseable_number_reports_format_error() {
    let catalog = catalog();
    let mut record = identity_record();
    record.set("container", FieldValue::text("reports"));
    record.set("sheetMode", FieldValue::text("index"));
    record.set("sheetIndex", FieldValue::text("three"));

    let report = validate(&catalog, Some("AzureBlobStorage"), Some("Excel"), &record);
    assert!(
        report
            .errors()
            .iter()
            .any(|error| error == "Sheet index must be a number")
    );
}

#[test]
fn number_below_minimum_reports_range_error() {
    let catalog = catalog();
    let mut record = identity_record();
    record.set("container", FieldValue::text("reports"));
    record.set("sheetMode", FieldValue::text("index"));
    record.set("sheetIndex", FieldValue::text("-1"));

    let report = validate(&catalog, Some("AzureBlobStorage"), Some("Excel"), &record);
    assert!(
        report
            .errors()
            .iter()
            .any(|error| error == "Sheet index must be at least 0")
    );
}

#[test]
fn boolean_fields_are_never_required_empty() {
    let catalog = catalog();
    let mut record = identity_record();
    seed_delimited_defaults(&catalog, &mut record);
    record.set("container", FieldValue::text("reports"));
    record.clear("firstRowAsHeader");
    // firstRowAsHeader is absent entirely; that is still a valid record.
    let report = validate(
        &catalog,
        Some("AzureBlobStorage"),
        Some("DelimitedText"),
        &record,
    );
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors());
}

#[test]
fn unsupported_parameter_type_is_reported() {
    let catalog = catalog();
    let mut record = identity_record();
    let parameter = Parameter::new("retries", "decimal", "1").unwrap_or_else(|_| unreachable!());
    let parameters =
        ParameterSet::from_parameters(vec![parameter]).unwrap_or_else(|_| unreachable!());
    record.set("parameters", FieldValue::Parameters(parameters));

    let report = validate(&catalog, Some("AzureSqlTable"), None, &record);
    assert!(
        report
            .errors()
            .iter()
            .any(|error| error == "Parameters entry 'retries' has unsupported type 'decimal'")
    );
}

#[test]
fn errors_accumulate_across_sections_in_order() {
    let catalog = catalog();
    let mut record = Record::new();
    record.set("sheetMode", FieldValue::text("index"));
    record.set("sheetIndex", FieldValue::text("nine"));

    let report = validate(&catalog, Some("AzureBlobStorage"), Some("Excel"), &record);
    let errors = report.errors();
    assert_eq!(
        errors,
        [
            "Dataset name is required",
            "Linked service is required",
            "Container is required",
            "Sheet index must be a number",
        ]
    );
}
