use std::collections::BTreeSet;

use adfstudio_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::field::{FieldDef, FieldType};
use crate::{LINKED_SERVICE_FIELD, NAME_FIELD};

/// Named, ordered group of field definitions. Declaration order drives
/// rendering order and validation error order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSection {
    name: NonEmptyString,
    fields: Vec<(NonEmptyString, FieldDef)>,
}

impl FieldSection {
    /// Creates a validated section from `(field key, definition)` pairs.
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        fields: Vec<(K, FieldDef)>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        let mut validated = Vec::with_capacity(fields.len());
        for (key, def) in fields {
            validated.push((NonEmptyString::new(key)?, def));
        }

        Ok(Self {
            name,
            fields: validated,
        })
    }

    /// Returns the section name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns `(field key, definition)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(key, def)| (key.as_str(), def))
    }
}

/// Field layout for one on-disk format of a file-based dataset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTypeConfig {
    type_name: NonEmptyString,
    display_name: NonEmptyString,
    sections: Vec<FieldSection>,
}

impl FileTypeConfig {
    /// Creates a validated file type config. `type_name` is the ADF
    /// `properties.type` value, e.g. `DelimitedText`.
    pub fn new(
        type_name: impl Into<String>,
        display_name: impl Into<String>,
        sections: Vec<FieldSection>,
    ) -> AppResult<Self> {
        Ok(Self {
            type_name: NonEmptyString::new(type_name)?,
            display_name: NonEmptyString::new(display_name)?,
            sections,
        })
    }

    /// Returns the serialized `properties.type` value.
    #[must_use]
    pub fn type_name(&self) -> &NonEmptyString {
        &self.type_name
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the file-type-specific sections.
    #[must_use]
    pub fn sections(&self) -> &[FieldSection] {
        &self.sections
    }
}

/// Optional parts of a dataset type config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetTypeInput {
    /// Allowed linked service types; empty means unrestricted.
    pub linked_service_types: Vec<String>,
    /// Storage-location kind written at `properties.typeProperties.location.type`,
    /// present exactly when the type declares file types.
    pub location_type: Option<String>,
    /// On-disk formats selectable for this type.
    pub file_types: Vec<FileTypeConfig>,
    /// Sections shared across every file type (or the whole layout for
    /// types without file types).
    pub sections: Vec<FieldSection>,
}

/// Declarative form layout for one dataset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetTypeConfig {
    type_name: NonEmptyString,
    display_name: NonEmptyString,
    linked_service_types: BTreeSet<String>,
    location_type: Option<NonEmptyString>,
    file_types: Vec<FileTypeConfig>,
    sections: Vec<FieldSection>,
}

impl DatasetTypeConfig {
    /// Creates a validated dataset type config.
    pub fn new(
        type_name: impl Into<String>,
        display_name: impl Into<String>,
        input: DatasetTypeInput,
    ) -> AppResult<Self> {
        let DatasetTypeInput {
            linked_service_types,
            location_type,
            file_types,
            sections,
        } = input;

        let type_name = NonEmptyString::new(type_name)?;
        let location_type = location_type.map(NonEmptyString::new).transpose()?;

        match (&location_type, file_types.is_empty()) {
            (Some(_), true) => {
                return Err(AppError::Validation(format!(
                    "dataset type '{type_name}' declares a location type but no file types"
                )));
            }
            (None, false) => {
                return Err(AppError::Validation(format!(
                    "dataset type '{type_name}' declares file types but no location type"
                )));
            }
            _ => {}
        }

        let mut seen_file_types = BTreeSet::new();
        for file_type in &file_types {
            if !seen_file_types.insert(file_type.type_name().as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate file type '{}' in dataset type '{type_name}'",
                    file_type.type_name()
                )));
            }
        }

        let mut allowed_services = BTreeSet::new();
        for service_type in linked_service_types {
            if service_type.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "dataset type '{type_name}' declares an empty linked service type"
                )));
            }
            allowed_services.insert(service_type);
        }

        Ok(Self {
            type_name,
            display_name: NonEmptyString::new(display_name)?,
            linked_service_types: allowed_services,
            location_type,
            file_types,
            sections,
        })
    }

    /// Returns the serialized `properties.type` value for file-type-less
    /// datasets, and the catalog key for every dataset.
    #[must_use]
    pub fn type_name(&self) -> &NonEmptyString {
        &self.type_name
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the allowed linked service types; empty means unrestricted.
    #[must_use]
    pub fn linked_service_types(&self) -> &BTreeSet<String> {
        &self.linked_service_types
    }

    /// Returns whether a linked service of the given type may back this dataset.
    #[must_use]
    pub fn allows_linked_service_type(&self, service_type: &str) -> bool {
        self.linked_service_types.is_empty() || self.linked_service_types.contains(service_type)
    }

    /// Returns the storage-location kind for file-based types.
    #[must_use]
    pub fn location_type(&self) -> Option<&NonEmptyString> {
        self.location_type.as_ref()
    }

    /// Returns the selectable file types.
    #[must_use]
    pub fn file_types(&self) -> &[FileTypeConfig] {
        &self.file_types
    }

    /// Returns whether editing this type requires a file type selection.
    #[must_use]
    pub fn requires_file_type(&self) -> bool {
        !self.file_types.is_empty()
    }

    /// Returns one file type config by name.
    #[must_use]
    pub fn file_type(&self, type_name: &str) -> Option<&FileTypeConfig> {
        self.file_types
            .iter()
            .find(|file_type| file_type.type_name().as_str() == type_name)
    }

    /// Returns the shared sections.
    #[must_use]
    pub fn sections(&self) -> &[FieldSection] {
        &self.sections
    }

    /// Resolves the applicable field scope for a file type selection.
    /// File-type sections precede the shared sections.
    pub fn scope(&self, file_type: Option<&str>) -> AppResult<FieldScope<'_>> {
        let mut sections: Vec<&FieldSection> = Vec::new();
        match (self.requires_file_type(), file_type) {
            (false, None) => {}
            (false, Some(file_type)) => {
                return Err(AppError::Validation(format!(
                    "dataset type '{}' does not take file type '{file_type}'",
                    self.type_name
                )));
            }
            (true, None) => {
                return Err(AppError::Validation(format!(
                    "dataset type '{}' requires a file type",
                    self.type_name
                )));
            }
            (true, Some(file_type)) => {
                let config = self.file_type(file_type).ok_or_else(|| {
                    AppError::Validation(format!(
                        "unknown file type '{file_type}' for dataset type '{}'",
                        self.type_name
                    ))
                })?;
                sections.extend(config.sections());
            }
        }

        sections.extend(&self.sections);
        Ok(FieldScope { sections })
    }
}

/// Resolved view over the sections applicable to one `(dataset type, file
/// type)` selection.
#[derive(Debug, Clone)]
pub struct FieldScope<'a> {
    sections: Vec<&'a FieldSection>,
}

impl<'a> FieldScope<'a> {
    /// Returns the sections in declaration order.
    #[must_use]
    pub fn sections(&self) -> &[&'a FieldSection] {
        &self.sections
    }

    /// Returns every `(field key, definition)` pair in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a FieldDef)> {
        self.sections.iter().flat_map(|section| section.fields())
    }

    /// Returns the definition for a field key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'a FieldDef> {
        self.fields()
            .find_map(|(found, def)| (found == key).then_some(def))
    }

    /// Returns the keys of fields whose visibility depends on the trigger,
    /// in declaration order.
    #[must_use]
    pub fn dependents_of(&self, trigger: &str) -> Vec<&'a str> {
        self.fields()
            .filter_map(|(key, def)| {
                def.show_when()
                    .is_some_and(|rule| rule.field().as_str() == trigger)
                    .then_some(key)
            })
            .collect()
    }

    /// Returns whether any field's visibility depends on the trigger.
    #[must_use]
    pub fn has_dependents(&self, trigger: &str) -> bool {
        self.fields()
            .any(|(_, def)| def.show_when().is_some_and(|rule| rule.field().as_str() == trigger))
    }
}

/// The root field schema: every dataset type the editor understands.
/// Immutable after construction and shared across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalog {
    dataset_types: Vec<DatasetTypeConfig>,
}

impl FieldCatalog {
    /// Creates a validated catalog, failing fast on any malformed layout.
    pub fn new(dataset_types: Vec<DatasetTypeConfig>) -> AppResult<Self> {
        let mut seen_types = BTreeSet::new();
        let mut seen_locations = BTreeSet::new();
        for config in &dataset_types {
            if !seen_types.insert(config.type_name().as_str().to_owned()) {
                return Err(AppError::Validation(format!(
                    "duplicate dataset type '{}'",
                    config.type_name()
                )));
            }

            if let Some(location_type) = config.location_type()
                && !seen_locations.insert(location_type.as_str().to_owned())
            {
                return Err(AppError::Validation(format!(
                    "location type '{location_type}' is claimed by more than one dataset type"
                )));
            }

            if config.requires_file_type() {
                for file_type in config.file_types() {
                    let scope = config.scope(Some(file_type.type_name().as_str()))?;
                    Self::validate_scope(config, &scope)?;
                }
            } else {
                let scope = config.scope(None)?;
                Self::validate_scope(config, &scope)?;
            }
        }

        Ok(Self { dataset_types })
    }

    fn validate_scope(config: &DatasetTypeConfig, scope: &FieldScope<'_>) -> AppResult<()> {
        let context = config.type_name();

        let mut keys = BTreeSet::new();
        for (key, _) in scope.fields() {
            if key == NAME_FIELD || key == LINKED_SERVICE_FIELD {
                return Err(AppError::Validation(format!(
                    "field key '{key}' in dataset type '{context}' is reserved"
                )));
            }
            if !keys.insert(key) {
                return Err(AppError::Validation(format!(
                    "duplicate field key '{key}' in dataset type '{context}'"
                )));
            }
        }

        for (key, def) in scope.fields() {
            if let Some(rule) = def.show_when() {
                let trigger = scope.field(rule.field().as_str()).ok_or_else(|| {
                    AppError::Validation(format!(
                        "field '{key}' in dataset type '{context}' references unknown trigger '{}'",
                        rule.field()
                    ))
                })?;
                // One-hop dependency contract; deeper chains would need a
                // topological evaluation order the resolver does not implement.
                if trigger.show_when().is_some() {
                    return Err(AppError::Validation(format!(
                        "field '{key}' in dataset type '{context}' depends on conditional field '{}'",
                        rule.field()
                    )));
                }
            }

            for rule in def.derived_from() {
                let sibling = scope.field(rule.field().as_str()).ok_or_else(|| {
                    AppError::Validation(format!(
                        "radio '{key}' in dataset type '{context}' derives from unknown field '{}'",
                        rule.field()
                    ))
                })?;
                if sibling.json_path().is_none() {
                    return Err(AppError::Validation(format!(
                        "radio '{key}' in dataset type '{context}' derives from path-less field '{}'",
                        rule.field()
                    )));
                }
            }

            if matches!(def.field_type(), FieldType::Select | FieldType::Radio)
                && let Some(default) = def.default_value().and_then(|value| value.as_text())
                && !default.is_empty()
                && def.option_for_value(default).is_none()
            {
                return Err(AppError::Validation(format!(
                    "default '{default}' of field '{key}' in dataset type '{context}' matches no option"
                )));
            }
        }

        Ok(())
    }

    /// Returns the dataset types in declaration order.
    #[must_use]
    pub fn dataset_types(&self) -> &[DatasetTypeConfig] {
        &self.dataset_types
    }

    /// Returns one dataset type config by name.
    #[must_use]
    pub fn find(&self, type_name: &str) -> Option<&DatasetTypeConfig> {
        self.dataset_types
            .iter()
            .find(|config| config.type_name().as_str() == type_name)
    }

    /// Returns the dataset type claiming a storage-location kind, used by
    /// document shape detection.
    #[must_use]
    pub fn find_by_location_type(&self, location_type: &str) -> Option<&DatasetTypeConfig> {
        self.dataset_types.iter().find(|config| {
            config
                .location_type()
                .is_some_and(|known| known.as_str() == location_type)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DatasetTypeConfig, DatasetTypeInput, FieldCatalog, FieldSection, FileTypeConfig};
    use crate::field::{FieldDef, FieldDefInput, FieldType, JsonPath, ShowWhen};
    use adfstudio_core::{AppResult, NonEmptyString};

    fn text_field(path: &str) -> AppResult<FieldDef> {
        FieldDef::new(
            FieldType::Text,
            "Field",
            FieldDefInput {
                json_path: Some(JsonPath::parse(path)?),
                ..FieldDefInput::default()
            },
        )
    }

    fn conditional_field(path: &str, trigger: &str) -> AppResult<FieldDef> {
        FieldDef::new(
            FieldType::Text,
            "Dependent",
            FieldDefInput {
                json_path: Some(JsonPath::parse(path)?),
                show_when: Some(ShowWhen::NotEmpty {
                    field: NonEmptyString::new(trigger)?,
                }),
                ..FieldDefInput::default()
            },
        )
    }

    fn simple_type(sections: Vec<FieldSection>) -> AppResult<DatasetTypeConfig> {
        DatasetTypeConfig::new(
            "AzureSqlTable",
            "Azure SQL Table",
            DatasetTypeInput {
                sections,
                ..DatasetTypeInput::default()
            },
        )
    }

    #[test]
    fn catalog_rejects_duplicate_field_keys() {
        let build = || -> AppResult<FieldCatalog> {
            let section_one = FieldSection::new(
                "Connection",
                vec![("table", text_field("properties.typeProperties.table")?)],
            )?;
            let section_two = FieldSection::new(
                "Extra",
                vec![("table", text_field("properties.typeProperties.other")?)],
            )?;
            FieldCatalog::new(vec![simple_type(vec![section_one, section_two])?])
        };
        assert!(build().is_err());
    }

    #[test]
    fn catalog_rejects_unknown_show_when_trigger() {
        let build = || -> AppResult<FieldCatalog> {
            let section = FieldSection::new(
                "Connection",
                vec![(
                    "dependent",
                    conditional_field("properties.typeProperties.dependent", "missing")?,
                )],
            )?;
            FieldCatalog::new(vec![simple_type(vec![section])?])
        };
        assert!(build().is_err());
    }

    #[test]
    fn catalog_rejects_dependency_chains() {
        let build = || -> AppResult<FieldCatalog> {
            let section = FieldSection::new(
                "Connection",
                vec![
                    ("root", text_field("properties.typeProperties.root")?),
                    (
                        "middle",
                        conditional_field("properties.typeProperties.middle", "root")?,
                    ),
                    (
                        "leaf",
                        conditional_field("properties.typeProperties.leaf", "middle")?,
                    ),
                ],
            )?;
            FieldCatalog::new(vec![simple_type(vec![section])?])
        };
        assert!(build().is_err());
    }

    #[test]
    fn catalog_rejects_reserved_field_keys() {
        let build = || -> AppResult<FieldCatalog> {
            let section = FieldSection::new(
                "Connection",
                vec![("name", text_field("properties.typeProperties.name")?)],
            )?;
            FieldCatalog::new(vec![simple_type(vec![section])?])
        };
        assert!(build().is_err());
    }

    #[test]
    fn file_typed_dataset_requires_location_type() {
        let build = || -> AppResult<DatasetTypeConfig> {
            let file_type = FileTypeConfig::new("DelimitedText", "Delimited text", Vec::new())?;
            DatasetTypeConfig::new(
                "AzureBlobStorage",
                "Azure Blob Storage",
                DatasetTypeInput {
                    file_types: vec![file_type],
                    ..DatasetTypeInput::default()
                },
            )
        };
        assert!(build().is_err());
    }

    #[test]
    fn scope_resolution_enforces_file_type_rules() {
        let build = || -> AppResult<DatasetTypeConfig> { simple_type(Vec::new()) };
        let config = build();
        assert!(config.is_ok());
        let config = config.unwrap_or_else(|_| unreachable!());
        assert!(config.scope(None).is_ok());
        assert!(config.scope(Some("Parquet")).is_err());
    }
}
