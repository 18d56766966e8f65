//! Built-in catalog covering the dataset types the editor ships with.
//!
//! Layouts follow the published ADF dataset JSON shapes: SQL tables keep
//! `schema`/`table` under `typeProperties`, file-based datasets keep a
//! storage `location` object plus per-format settings.

use adfstudio_core::{AppResult, NonEmptyString};

use crate::catalog::{
    DatasetTypeConfig, DatasetTypeInput, FieldCatalog, FieldSection, FileTypeConfig,
};
use crate::field::{
    DerivedRule, FieldDef, FieldDefInput, FieldOption, FieldType, JsonPath, ShowWhen,
};
use crate::record::FieldValue;

const PARAMETER_VALUE_TYPES: [&str; 7] = [
    "string",
    "int",
    "float",
    "bool",
    "array",
    "object",
    "securestring",
];

impl FieldCatalog {
    /// Builds the built-in catalog. Construction is validated; an error here
    /// means the shipped layout itself is malformed.
    pub fn builtin() -> AppResult<Self> {
        Self::new(vec![
            azure_sql_table()?,
            sql_server_table()?,
            azure_blob_storage()?,
            azure_data_lake_gen2()?,
        ])
    }
}

fn azure_sql_table() -> AppResult<DatasetTypeConfig> {
    DatasetTypeConfig::new(
        "AzureSqlTable",
        "Azure SQL Table",
        DatasetTypeInput {
            linked_service_types: vec!["AzureSqlDatabase".to_owned()],
            sections: vec![sql_connection_section()?, general_section()?, parameters_section()?],
            ..DatasetTypeInput::default()
        },
    )
}

fn sql_server_table() -> AppResult<DatasetTypeConfig> {
    DatasetTypeConfig::new(
        "SqlServerTable",
        "SQL Server Table",
        DatasetTypeInput {
            linked_service_types: vec!["SqlServer".to_owned()],
            sections: vec![sql_connection_section()?, general_section()?, parameters_section()?],
            ..DatasetTypeInput::default()
        },
    )
}

fn azure_blob_storage() -> AppResult<DatasetTypeConfig> {
    DatasetTypeConfig::new(
        "AzureBlobStorage",
        "Azure Blob Storage",
        DatasetTypeInput {
            linked_service_types: vec!["AzureBlobStorage".to_owned()],
            location_type: Some("AzureBlobStorageLocation".to_owned()),
            file_types: vec![
                FileTypeConfig::new(
                    "DelimitedText",
                    "Delimited text",
                    vec![
                        location_section(BLOB_CONTAINER)?,
                        delimited_format_section()?,
                        delimited_compression_section()?,
                    ],
                )?,
                FileTypeConfig::new(
                    "Json",
                    "JSON",
                    vec![location_section(BLOB_CONTAINER)?, json_format_section()?],
                )?,
                FileTypeConfig::new(
                    "Parquet",
                    "Parquet",
                    vec![location_section(BLOB_CONTAINER)?, parquet_format_section()?],
                )?,
                FileTypeConfig::new(
                    "Excel",
                    "Excel",
                    vec![location_section(BLOB_CONTAINER)?, excel_sheet_section()?],
                )?,
            ],
            sections: vec![general_section()?, parameters_section()?],
        },
    )
}

fn azure_data_lake_gen2() -> AppResult<DatasetTypeConfig> {
    DatasetTypeConfig::new(
        "AzureDataLakeStorageGen2",
        "Azure Data Lake Storage Gen2",
        DatasetTypeInput {
            linked_service_types: vec!["AzureBlobFS".to_owned()],
            location_type: Some("AzureBlobFSLocation".to_owned()),
            file_types: vec![
                FileTypeConfig::new(
                    "DelimitedText",
                    "Delimited text",
                    vec![
                        location_section(ADLS_FILE_SYSTEM)?,
                        delimited_format_section()?,
                        delimited_compression_section()?,
                    ],
                )?,
                FileTypeConfig::new(
                    "Json",
                    "JSON",
                    vec![location_section(ADLS_FILE_SYSTEM)?, json_format_section()?],
                )?,
                FileTypeConfig::new(
                    "Parquet",
                    "Parquet",
                    vec![location_section(ADLS_FILE_SYSTEM)?, parquet_format_section()?],
                )?,
            ],
            sections: vec![general_section()?, parameters_section()?],
        },
    )
}

struct RootContainer {
    key: &'static str,
    label: &'static str,
    path: &'static str,
}

const BLOB_CONTAINER: RootContainer = RootContainer {
    key: "container",
    label: "Container",
    path: "properties.typeProperties.location.container",
};

const ADLS_FILE_SYSTEM: RootContainer = RootContainer {
    key: "fileSystem",
    label: "File system",
    path: "properties.typeProperties.location.fileSystem",
};

fn path(raw: &str) -> AppResult<Option<JsonPath>> {
    JsonPath::parse(raw).map(Some)
}

fn sql_connection_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Connection",
        vec![
            (
                "schema",
                FieldDef::new(
                    FieldType::Text,
                    "Table schema",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.schema")?,
                        help_text: Some("Schema that owns the table, e.g. dbo.".to_owned()),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "table",
                FieldDef::new(
                    FieldType::Text,
                    "Table name",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.table")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn general_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "General",
        vec![
            (
                "description",
                FieldDef::new(
                    FieldType::Text,
                    "Description",
                    FieldDefInput {
                        json_path: path("properties.description")?,
                        multiline: true,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "folder",
                FieldDef::new(
                    FieldType::Text,
                    "Folder",
                    FieldDefInput {
                        json_path: path("properties.folder.name")?,
                        help_text: Some(
                            "Factory folder the dataset is grouped under.".to_owned(),
                        ),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn parameters_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Parameters",
        vec![(
            "parameters",
            FieldDef::new(
                FieldType::KeyvalueParameters,
                "Parameters",
                FieldDefInput {
                    value_types: PARAMETER_VALUE_TYPES
                        .iter()
                        .map(|name| (*name).to_owned())
                        .collect(),
                    ..FieldDefInput::default()
                },
            )?,
        )],
    )
}

fn location_section(container: RootContainer) -> AppResult<FieldSection> {
    FieldSection::new(
        "Location",
        vec![
            (
                container.key.to_owned(),
                FieldDef::new(
                    FieldType::Text,
                    container.label,
                    FieldDefInput {
                        required: true,
                        json_path: path(container.path)?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "folderPath".to_owned(),
                FieldDef::new(
                    FieldType::Text,
                    "Folder path",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.location.folderPath")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "fileSelection".to_owned(),
                FieldDef::new(
                    FieldType::Radio,
                    "File selection",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("All files in folder", "folder")?,
                            FieldOption::new("Specific file", "file")?,
                        ],
                        default_value: Some(FieldValue::text("folder")),
                        derived_from: vec![DerivedRule::new("fileName", "file")?],
                        omit_from_json: true,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "fileName".to_owned(),
                FieldDef::new(
                    FieldType::Text,
                    "File name",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.location.fileName")?,
                        show_when: Some(ShowWhen::Equals {
                            field: NonEmptyString::new("fileSelection")?,
                            value: "file".to_owned(),
                        }),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn delimited_format_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Format",
        vec![
            (
                "columnDelimiter",
                FieldDef::new(
                    FieldType::SelectText,
                    "Column delimiter",
                    FieldDefInput {
                        required: true,
                        options: vec![
                            FieldOption::new("Comma (,)", ",")?,
                            FieldOption::new("Semicolon (;)", ";")?,
                            FieldOption::new("Pipe (|)", "|")?,
                            FieldOption::new("Tab (\\t)", "\t")?,
                        ],
                        default_value: Some(FieldValue::text(",")),
                        json_path: path("properties.typeProperties.columnDelimiter")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "rowDelimiter",
                FieldDef::new(
                    FieldType::SelectText,
                    "Row delimiter",
                    FieldDefInput {
                        options: vec![
                            FieldOption::omitted("Auto detect (\\r, \\n, or \\r\\n)", "")?,
                            FieldOption::new("Carriage return + line feed (\\r\\n)", "\r\n")?,
                            FieldOption::new("Line feed (\\n)", "\n")?,
                            FieldOption::new("Carriage return (\\r)", "\r")?,
                        ],
                        json_path: path("properties.typeProperties.rowDelimiter")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "encodingName",
                FieldDef::new(
                    FieldType::Select,
                    "Encoding",
                    FieldDefInput {
                        options: encoding_options()?,
                        json_path: path("properties.typeProperties.encodingName")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "quoteChar",
                FieldDef::new(
                    FieldType::Select,
                    "Quote character",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("Double quote (\")", "\"")?,
                            FieldOption::new("Single quote (')", "'")?,
                            FieldOption::omitted("No quote character", "")?,
                        ],
                        default_value: Some(FieldValue::text("\"")),
                        json_path: path("properties.typeProperties.quoteChar")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "escapeChar",
                FieldDef::new(
                    FieldType::Select,
                    "Escape character",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("Backslash (\\)", "\\")?,
                            FieldOption::new("Slash (/)", "/")?,
                            FieldOption::omitted("No escape character", "")?,
                        ],
                        default_value: Some(FieldValue::text("\\")),
                        json_path: path("properties.typeProperties.escapeChar")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "firstRowAsHeader",
                FieldDef::new(
                    FieldType::Boolean,
                    "First row as header",
                    FieldDefInput {
                        default_value: Some(FieldValue::Bool(false)),
                        json_path: path("properties.typeProperties.firstRowAsHeader")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "nullValue",
                FieldDef::new(
                    FieldType::Text,
                    "Null value",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.nullValue")?,
                        help_text: Some("Text that represents a missing value.".to_owned()),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn delimited_compression_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Compression",
        vec![
            (
                "compressionCodec",
                FieldDef::new(
                    FieldType::Select,
                    "Compression type",
                    FieldDefInput {
                        options: vec![
                            FieldOption::omitted("None", "")?,
                            FieldOption::new("gzip", "gzip")?,
                            FieldOption::new("bzip2", "bzip2")?,
                            FieldOption::new("deflate", "deflate")?,
                            FieldOption::new("ZipDeflate", "ZipDeflate")?,
                        ],
                        json_path: path("properties.typeProperties.compressionCodec")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "compressionLevel",
                FieldDef::new(
                    FieldType::Select,
                    "Compression level",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("Optimal", "Optimal")?,
                            FieldOption::new("Fastest", "Fastest")?,
                        ],
                        show_when: Some(ShowWhen::NotEmpty {
                            field: NonEmptyString::new("compressionCodec")?,
                        }),
                        json_path: path("properties.typeProperties.compressionLevel")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn json_format_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Format",
        vec![
            (
                "encodingName",
                FieldDef::new(
                    FieldType::Select,
                    "Encoding",
                    FieldDefInput {
                        options: encoding_options()?,
                        json_path: path("properties.typeProperties.encodingName")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "compressionType",
                FieldDef::new(
                    FieldType::Select,
                    "Compression type",
                    FieldDefInput {
                        options: vec![
                            FieldOption::omitted("None", "")?,
                            FieldOption::new("gzip", "gzip")?,
                            FieldOption::new("bzip2", "bzip2")?,
                            FieldOption::new("deflate", "deflate")?,
                        ],
                        json_path: path("properties.typeProperties.compression.type")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "compressionLevel",
                FieldDef::new(
                    FieldType::Select,
                    "Compression level",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("Optimal", "Optimal")?,
                            FieldOption::new("Fastest", "Fastest")?,
                        ],
                        show_when: Some(ShowWhen::NotEmpty {
                            field: NonEmptyString::new("compressionType")?,
                        }),
                        json_path: path("properties.typeProperties.compression.level")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn parquet_format_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Format",
        vec![(
            "compressionCodec",
            FieldDef::new(
                FieldType::Select,
                "Compression codec",
                FieldDefInput {
                    options: vec![
                        FieldOption::new("snappy", "snappy")?,
                        FieldOption::new("gzip", "gzip")?,
                        FieldOption::new("none", "none")?,
                    ],
                    default_value: Some(FieldValue::text("snappy")),
                    json_path: path("properties.typeProperties.compressionCodec")?,
                    ..FieldDefInput::default()
                },
            )?,
        )],
    )
}

fn excel_sheet_section() -> AppResult<FieldSection> {
    FieldSection::new(
        "Sheet",
        vec![
            (
                "sheetMode",
                FieldDef::new(
                    FieldType::Radio,
                    "Select sheet",
                    FieldDefInput {
                        options: vec![
                            FieldOption::new("By name", "name")?,
                            FieldOption::new("By index", "index")?,
                        ],
                        default_value: Some(FieldValue::text("name")),
                        derived_from: vec![
                            DerivedRule::new("sheetName", "name")?,
                            DerivedRule::new("sheetIndex", "index")?,
                        ],
                        omit_from_json: true,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "sheetName",
                FieldDef::new(
                    FieldType::Text,
                    "Sheet name",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.sheetName")?,
                        show_when: Some(ShowWhen::Equals {
                            field: NonEmptyString::new("sheetMode")?,
                            value: "name".to_owned(),
                        }),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "sheetIndex",
                FieldDef::new(
                    FieldType::Number,
                    "Sheet index",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.sheetIndex")?,
                        show_when: Some(ShowWhen::Equals {
                            field: NonEmptyString::new("sheetMode")?,
                            value: "index".to_owned(),
                        }),
                        min: Some(0.0),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "range",
                FieldDef::new(
                    FieldType::Text,
                    "Range",
                    FieldDefInput {
                        json_path: path("properties.typeProperties.range")?,
                        help_text: Some("Cell range to read, e.g. A3:H35.".to_owned()),
                        ..FieldDefInput::default()
                    },
                )?,
            ),
            (
                "firstRowAsHeader",
                FieldDef::new(
                    FieldType::Boolean,
                    "First row as header",
                    FieldDefInput {
                        default_value: Some(FieldValue::Bool(false)),
                        json_path: path("properties.typeProperties.firstRowAsHeader")?,
                        ..FieldDefInput::default()
                    },
                )?,
            ),
        ],
    )
}

fn encoding_options() -> AppResult<Vec<FieldOption>> {
    Ok(vec![
        FieldOption::omitted("Default (UTF-8)", "")?,
        FieldOption::new("UTF-16", "UTF-16")?,
        FieldOption::new("UTF-16BE", "UTF-16BE")?,
        FieldOption::new("US-ASCII", "US-ASCII")?,
        FieldOption::new("ISO-8859-1", "ISO-8859-1")?,
        FieldOption::new("Windows-1252", "WINDOWS-1252")?,
    ])
}

#[cfg(test)]
mod tests {
    use crate::catalog::FieldCatalog;

    #[test]
    fn builtin_catalog_validates() {
        let catalog = FieldCatalog::builtin();
        assert!(catalog.is_ok());
    }

    #[test]
    fn builtin_catalog_resolves_every_scope() {
        let catalog = FieldCatalog::builtin().unwrap_or_else(|_| unreachable!());
        for config in catalog.dataset_types() {
            if config.requires_file_type() {
                for file_type in config.file_types() {
                    assert!(config.scope(Some(file_type.type_name().as_str())).is_ok());
                }
            } else {
                assert!(config.scope(None).is_ok());
            }
        }
    }

    #[test]
    fn blob_location_kind_is_detectable() {
        let catalog = FieldCatalog::builtin().unwrap_or_else(|_| unreachable!());
        let config = catalog.find_by_location_type("AzureBlobStorageLocation");
        assert_eq!(
            config.map(|c| c.type_name().as_str()),
            Some("AzureBlobStorage")
        );
    }

    #[test]
    fn sql_table_restricts_linked_service_types() {
        let catalog = FieldCatalog::builtin().unwrap_or_else(|_| unreachable!());
        let config = catalog.find("AzureSqlTable");
        assert!(config.is_some_and(|c| c.allows_linked_service_type("AzureSqlDatabase")));
        assert!(config.is_some_and(|c| !c.allows_linked_service_type("AzureBlobFS")));
    }
}
