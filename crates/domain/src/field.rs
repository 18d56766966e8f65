use std::fmt::{Display, Formatter};
use std::str::FromStr;

use adfstudio_core::{AppError, AppResult, NonEmptyString};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::record::FieldValue;

/// Supported form control kinds. The set is closed; every mapper and
/// validator match over it is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Free-text input.
    Text,
    /// Dropdown restricted to declared options.
    Select,
    /// Dropdown with a manual-entry mode that serializes as an ADF expression.
    SelectText,
    /// Option group that may exist purely to drive sibling visibility.
    Radio,
    /// Checkbox serialized as a JSON boolean.
    Boolean,
    /// Numeric input with optional bounds.
    Number,
    /// Parameter name/type/default editor serialized under `properties.parameters`.
    KeyvalueParameters,
    /// Value tracked but never rendered.
    Hidden,
}

impl FieldType {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Select => "select",
            Self::SelectText => "select-text",
            Self::Radio => "radio",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::KeyvalueParameters => "keyvalue-parameters",
            Self::Hidden => "hidden",
        }
    }

    /// Returns whether values of this type survive being hidden. Checkbox
    /// state and parameter lists are kept; every other control is cleared
    /// when its visibility condition stops holding.
    #[must_use]
    pub fn retains_value_when_hidden(&self) -> bool {
        matches!(self, Self::Boolean | Self::KeyvalueParameters)
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "select" => Ok(Self::Select),
            "select-text" => Ok(Self::SelectText),
            "radio" => Ok(Self::Radio),
            "boolean" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "keyvalue-parameters" => Ok(Self::KeyvalueParameters),
            "hidden" => Ok(Self::Hidden),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// Dot-delimited location of a value inside the dataset document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonPath(Vec<String>);

impl JsonPath {
    /// Parses a dot-delimited path such as `properties.typeProperties.schema`.
    pub fn parse(path: &str) -> AppResult<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(AppError::Validation(format!(
                "json path '{path}' contains an empty segment"
            )));
        }

        Ok(Self(segments))
    }

    /// Returns the path segments in traversal order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl Display for JsonPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.join("."))
    }
}

impl Serialize for JsonPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JsonPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw.as_str()).map_err(|error| D::Error::custom(error.to_string()))
    }
}

/// One choice in a select, select-text, or radio control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    label: NonEmptyString,
    value: String,
    omit_from_json: bool,
}

impl FieldOption {
    /// Creates an option whose value serializes as a literal.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            label: NonEmptyString::new(label)?,
            value: value.into(),
            omit_from_json: false,
        })
    }

    /// Creates a placeholder option that is tracked for form logic but never
    /// written to the document, modeling "use service default" choices.
    pub fn omitted(label: impl Into<String>, value: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            label: NonEmptyString::new(label)?,
            value: value.into(),
            omit_from_json: true,
        })
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns the stored value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Returns whether selecting this option keeps the field out of the document.
    #[must_use]
    pub fn omit_from_json(&self) -> bool {
        self.omit_from_json
    }
}

/// Conditional-visibility rule evaluated against the current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ShowWhen {
    /// Active while the referenced field holds any non-empty value.
    NotEmpty {
        /// Trigger field key.
        field: NonEmptyString,
    },
    /// Active while the referenced field equals the literal, compared as strings.
    Equals {
        /// Trigger field key.
        field: NonEmptyString,
        /// Expected literal value.
        value: String,
    },
}

impl ShowWhen {
    /// Returns the trigger field key this rule observes.
    #[must_use]
    pub fn field(&self) -> &NonEmptyString {
        match self {
            Self::NotEmpty { field } | Self::Equals { field, .. } => field,
        }
    }
}

/// One derivation rule for reconstructing a radio selection from the
/// document. Rules are evaluated in declared order; the first whose
/// referenced sibling resolves to a non-empty value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRule {
    field: NonEmptyString,
    then_value: String,
}

impl DerivedRule {
    /// Creates a validated derivation rule.
    pub fn new(field: impl Into<String>, then_value: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            then_value: then_value.into(),
        })
    }

    /// Returns the sibling field key the rule tests.
    #[must_use]
    pub fn field(&self) -> &NonEmptyString {
        &self.field
    }

    /// Returns the radio value selected when the rule matches.
    #[must_use]
    pub fn then_value(&self) -> &str {
        self.then_value.as_str()
    }
}

/// Optional parts of a field definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldDefInput {
    /// Whether an empty value blocks a save.
    pub required: bool,
    /// Schema-declared default applied to fresh records.
    pub default_value: Option<FieldValue>,
    /// Document location, absent only for fields that never serialize.
    pub json_path: Option<JsonPath>,
    /// Ordered choices for select, select-text, and radio controls.
    pub options: Vec<FieldOption>,
    /// Conditional-visibility rule.
    pub show_when: Option<ShowWhen>,
    /// Radio derivation rules applied when loading a document.
    pub derived_from: Vec<DerivedRule>,
    /// Allowed parameter type names for keyvalue-parameters controls.
    pub value_types: Vec<String>,
    /// Inline help shown next to the control.
    pub help_text: Option<String>,
    /// Renders a text control as a multi-line editor.
    pub multiline: bool,
    /// Lower bound for number controls.
    pub min: Option<f64>,
    /// Upper bound for number controls.
    pub max: Option<f64>,
    /// Tracks the value for form logic without ever serializing it.
    pub omit_from_json: bool,
}

/// Declarative definition of one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    field_type: FieldType,
    label: NonEmptyString,
    required: bool,
    default_value: Option<FieldValue>,
    json_path: Option<JsonPath>,
    options: Vec<FieldOption>,
    show_when: Option<ShowWhen>,
    derived_from: Vec<DerivedRule>,
    value_types: Vec<String>,
    help_text: Option<String>,
    multiline: bool,
    min: Option<f64>,
    max: Option<f64>,
    omit_from_json: bool,
}

impl FieldDef {
    /// Creates a validated field definition.
    pub fn new(
        field_type: FieldType,
        label: impl Into<String>,
        input: FieldDefInput,
    ) -> AppResult<Self> {
        let FieldDefInput {
            required,
            default_value,
            json_path,
            options,
            show_when,
            derived_from,
            value_types,
            help_text,
            multiline,
            min,
            max,
            omit_from_json,
        } = input;

        let label = NonEmptyString::new(label)?;

        let takes_options = matches!(
            field_type,
            FieldType::Select | FieldType::SelectText | FieldType::Radio
        );
        if takes_options && options.is_empty() {
            return Err(AppError::Validation(format!(
                "{} field '{label}' requires at least one option",
                field_type.as_str()
            )));
        }
        if !takes_options && !options.is_empty() {
            return Err(AppError::Validation(format!(
                "options are not allowed for {} field '{label}'",
                field_type.as_str()
            )));
        }

        if !derived_from.is_empty() && field_type != FieldType::Radio {
            return Err(AppError::Validation(format!(
                "derived_from is only allowed for radio fields, found on '{label}'"
            )));
        }

        if omit_from_json {
            if json_path.is_some() {
                return Err(AppError::Validation(format!(
                    "field '{label}' is omitted from the document and must not declare a json path"
                )));
            }
            if field_type == FieldType::Radio && derived_from.is_empty() {
                return Err(AppError::Validation(format!(
                    "omitted radio field '{label}' requires at least one derivation rule"
                )));
            }
        } else if json_path.is_none() && field_type != FieldType::KeyvalueParameters {
            return Err(AppError::Validation(format!(
                "field '{label}' requires a json path"
            )));
        }

        if (min.is_some() || max.is_some()) && field_type != FieldType::Number {
            return Err(AppError::Validation(format!(
                "min/max bounds are only allowed for number fields, found on '{label}'"
            )));
        }
        if let (Some(min), Some(max)) = (min, max)
            && min > max
        {
            return Err(AppError::Validation(format!(
                "field '{label}' declares min {min} greater than max {max}"
            )));
        }

        if !value_types.is_empty() && field_type != FieldType::KeyvalueParameters {
            return Err(AppError::Validation(format!(
                "value_types is only allowed for keyvalue-parameters fields, found on '{label}'"
            )));
        }
        if value_types
            .iter()
            .any(|name| name.is_empty() || name.chars().any(char::is_uppercase))
        {
            return Err(AppError::Validation(format!(
                "parameter type names for '{label}' must be non-empty and lowercase"
            )));
        }

        if multiline && field_type != FieldType::Text {
            return Err(AppError::Validation(format!(
                "multiline is only allowed for text fields, found on '{label}'"
            )));
        }

        if let Some(default_value) = &default_value {
            let compatible = match field_type {
                FieldType::Boolean => matches!(default_value, FieldValue::Bool(_)),
                FieldType::KeyvalueParameters => {
                    matches!(default_value, FieldValue::Parameters(_))
                }
                _ => matches!(default_value, FieldValue::Text(_)),
            };
            if !compatible {
                return Err(AppError::Validation(format!(
                    "default value for '{label}' does not match its {} type",
                    field_type.as_str()
                )));
            }
        }

        Ok(Self {
            field_type,
            label,
            required,
            default_value,
            json_path,
            options,
            show_when,
            derived_from,
            value_types,
            help_text,
            multiline,
            min,
            max,
            omit_from_json,
        })
    }

    /// Returns the control kind.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &NonEmptyString {
        &self.label
    }

    /// Returns whether an empty value blocks a save.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns the schema-declared default.
    #[must_use]
    pub fn default_value(&self) -> Option<&FieldValue> {
        self.default_value.as_ref()
    }

    /// Returns the document location for path-mapped fields.
    #[must_use]
    pub fn json_path(&self) -> Option<&JsonPath> {
        self.json_path.as_ref()
    }

    /// Returns the ordered option list.
    #[must_use]
    pub fn options(&self) -> &[FieldOption] {
        &self.options
    }

    /// Returns the option matching a stored value.
    #[must_use]
    pub fn option_for_value(&self, value: &str) -> Option<&FieldOption> {
        self.options.iter().find(|option| option.value() == value)
    }

    /// Returns the conditional-visibility rule.
    #[must_use]
    pub fn show_when(&self) -> Option<&ShowWhen> {
        self.show_when.as_ref()
    }

    /// Returns the radio derivation rules in declared order.
    #[must_use]
    pub fn derived_from(&self) -> &[DerivedRule] {
        &self.derived_from
    }

    /// Returns the allowed parameter type names.
    #[must_use]
    pub fn value_types(&self) -> &[String] {
        &self.value_types
    }

    /// Returns the inline help text.
    #[must_use]
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    /// Returns whether a text control renders multi-line.
    #[must_use]
    pub fn multiline(&self) -> bool {
        self.multiline
    }

    /// Returns the lower bound for number controls.
    #[must_use]
    pub fn min(&self) -> Option<f64> {
        self.min
    }

    /// Returns the upper bound for number controls.
    #[must_use]
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Returns whether the field is tracked without ever serializing.
    #[must_use]
    pub fn omit_from_json(&self) -> bool {
        self.omit_from_json
    }
}

#[cfg(test)]
mod tests {
    use super::{DerivedRule, FieldDef, FieldDefInput, FieldOption, FieldType, JsonPath};

    fn path(raw: &str) -> Option<JsonPath> {
        JsonPath::parse(raw).ok()
    }

    #[test]
    fn select_requires_options() {
        let result = FieldDef::new(
            FieldType::Select,
            "Encoding",
            FieldDefInput {
                json_path: path("properties.typeProperties.encodingName"),
                ..FieldDefInput::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn derived_rules_rejected_outside_radio() {
        let rule = DerivedRule::new("sheetName", "name");
        assert!(rule.is_ok());
        let result = FieldDef::new(
            FieldType::Text,
            "Sheet name",
            FieldDefInput {
                json_path: path("properties.typeProperties.sheetName"),
                derived_from: rule.into_iter().collect(),
                ..FieldDefInput::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn omitted_field_must_not_declare_path() {
        let option = FieldOption::new("By name", "name");
        assert!(option.is_ok());
        let result = FieldDef::new(
            FieldType::Radio,
            "Sheet mode",
            FieldDefInput {
                options: option.into_iter().collect(),
                json_path: path("properties.typeProperties.sheetMode"),
                omit_from_json: true,
                ..FieldDefInput::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn path_mapped_field_requires_path() {
        let result = FieldDef::new(FieldType::Text, "Table", FieldDefInput::default());
        assert!(result.is_err());
    }

    #[test]
    fn number_bounds_must_be_ordered() {
        let result = FieldDef::new(
            FieldType::Number,
            "Sheet index",
            FieldDefInput {
                json_path: path("properties.typeProperties.sheetIndex"),
                min: Some(10.0),
                max: Some(0.0),
                ..FieldDefInput::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn json_path_rejects_empty_segments() {
        assert!(JsonPath::parse("properties..schema").is_err());
        let parsed = JsonPath::parse("properties.typeProperties.schema");
        assert_eq!(
            parsed.map(|p| p.to_string()).ok().as_deref(),
            Some("properties.typeProperties.schema")
        );
    }
}
