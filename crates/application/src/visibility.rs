//! Conditional-visibility resolution over a field scope.

use std::collections::BTreeSet;

use adfstudio_domain::{FieldScope, FieldValue, Record, ShowWhen};

/// Returns whether one field is currently visible. A field with no
/// visibility rule is always active; unknown keys are never active.
#[must_use]
pub fn is_active(scope: &FieldScope<'_>, record: &Record, key: &str) -> bool {
    scope.field(key).is_some_and(|def| {
        def.show_when()
            .is_none_or(|rule| condition_holds(rule, record))
    })
}

/// Computes the set of currently visible field keys.
#[must_use]
pub fn active_fields(scope: &FieldScope<'_>, record: &Record) -> BTreeSet<String> {
    scope
        .fields()
        .filter_map(|(key, def)| {
            def.show_when()
                .is_none_or(|rule| condition_holds(rule, record))
                .then(|| key.to_owned())
        })
        .collect()
}

/// Re-establishes the visibility invariant after a trigger change or a
/// document load: values of hidden fields are dropped, except checkbox and
/// parameter controls, which keep their state while hidden. Returns the
/// cleared keys.
pub fn apply_visibility(scope: &FieldScope<'_>, record: &mut Record) -> Vec<String> {
    let cleared: Vec<String> = scope
        .fields()
        .filter_map(|(key, def)| {
            let hidden = def
                .show_when()
                .is_some_and(|rule| !condition_holds(rule, record));
            (hidden && !def.field_type().retains_value_when_hidden() && record.get(key).is_some())
                .then(|| key.to_owned())
        })
        .collect();

    for key in &cleared {
        record.clear(key);
    }

    cleared
}

fn condition_holds(rule: &ShowWhen, record: &Record) -> bool {
    match rule {
        ShowWhen::NotEmpty { field } => !record.is_empty_at(field.as_str()),
        ShowWhen::Equals { field, value } => {
            comparable_text(record.get(field.as_str())).as_deref() == Some(value.as_str())
        }
    }
}

/// Trigger values compare as strings; checkbox state compares as
/// `true`/`false`. Parameter lists never participate in comparisons.
fn comparable_text(value: Option<&FieldValue>) -> Option<String> {
    match value? {
        FieldValue::Text(text) => Some(text.clone()),
        FieldValue::Bool(state) => Some(state.to_string()),
        FieldValue::Parameters(_) => None,
    }
}
