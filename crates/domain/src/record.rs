use std::collections::{BTreeMap, BTreeSet};

use adfstudio_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// One dataset parameter as edited in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    name: NonEmptyString,
    parameter_type: NonEmptyString,
    default_value: String,
}

impl Parameter {
    /// Creates a validated parameter. The type name is lowercased, matching
    /// the serialized `properties.parameters.<name>.type` convention.
    pub fn new(
        name: impl Into<String>,
        parameter_type: impl Into<String>,
        default_value: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            parameter_type: NonEmptyString::new(parameter_type.into().to_lowercase())?,
            default_value: default_value.into(),
        })
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the lowercase parameter type name.
    #[must_use]
    pub fn parameter_type(&self) -> &NonEmptyString {
        &self.parameter_type
    }

    /// Returns the default value text.
    #[must_use]
    pub fn default_value(&self) -> &str {
        self.default_value.as_str()
    }
}

/// Insertion-ordered, name-unique set of dataset parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet(Vec<Parameter>);

impl ParameterSet {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a parameter set from a list, rejecting duplicate names.
    pub fn from_parameters(parameters: Vec<Parameter>) -> AppResult<Self> {
        let mut set = Self::new();
        for parameter in parameters {
            set.insert(parameter)?;
        }
        Ok(set)
    }

    /// Appends a parameter, rejecting a duplicate name.
    pub fn insert(&mut self, parameter: Parameter) -> AppResult<()> {
        if self
            .0
            .iter()
            .any(|existing| existing.name() == parameter.name())
        {
            return Err(AppError::Validation(format!(
                "duplicate parameter name '{}'",
                parameter.name()
            )));
        }

        self.0.push(parameter);
        Ok(())
    }

    /// Returns the parameters in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.0
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the set holds no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One stored form value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text as entered. Number-typed fields also store text; the validator
    /// reports unparseable input and the mapper coerces on save.
    Text(String),
    /// Checkbox state.
    Bool(bool),
    /// Parameter list.
    Parameters(ParameterSet),
}

impl FieldValue {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns whether the value counts as empty for visibility and
    /// validation. Booleans are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Bool(_) => false,
            Self::Parameters(parameters) => parameters.is_empty(),
        }
    }

    /// Returns the text content, when textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns the boolean content, when boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the parameter content, when a parameter list.
    #[must_use]
    pub fn as_parameters(&self) -> Option<&ParameterSet> {
        match self {
            Self::Parameters(parameters) => Some(parameters),
            _ => None,
        }
    }
}

/// Flat form state for one editing session: field key to value, plus the
/// set of select-text keys currently in manual expression mode.
///
/// A key is present only while its field is visible; consumers treat absent
/// keys as "no value" rather than as faults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    values: BTreeMap<String, FieldValue>,
    expression_keys: BTreeSet<String>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for a field key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Returns the stored text for a field key, when present and textual.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Stores a value for a field key.
    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    /// Removes the stored value for a field key.
    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
        self.expression_keys.remove(key);
    }

    /// Returns whether the field currently holds no usable value.
    #[must_use]
    pub fn is_empty_at(&self, key: &str) -> bool {
        self.get(key).is_none_or(FieldValue::is_empty)
    }

    /// Flags or unflags a select-text field as manual expression entry.
    pub fn set_expression_mode(&mut self, key: impl Into<String>, enabled: bool) {
        let key = key.into();
        if enabled {
            self.expression_keys.insert(key);
        } else {
            self.expression_keys.remove(&key);
        }
    }

    /// Returns whether a field is in manual expression mode.
    #[must_use]
    pub fn is_expression(&self, key: &str) -> bool {
        self.expression_keys.contains(key)
    }

    /// Returns the stored field keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}
