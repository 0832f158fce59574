//! # Allowed Values
//!
//! The option set of a select field is a pure function of the specification
//! and the current state. Keyed option sources look up the value of their
//! driving field; an unset or unknown driver allows nothing.

use brgy_core::FormState;

use crate::spec::{FormSpecification, OptionSource};

/// Values a field may currently take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedValues {
    /// Free-form input, or a key the specification does not declare.
    Unrestricted,
    /// One of these values, in display order.
    OneOf(Vec<String>),
}

impl AllowedValues {
    pub fn permits(&self, value: &str) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::OneOf(values) => values.iter().any(|v| v == value),
        }
    }

    /// Options to render, empty for unrestricted fields.
    pub fn options(&self) -> &[String] {
        match self {
            Self::Unrestricted => &[],
            Self::OneOf(values) => values,
        }
    }
}

/// Current allowed values of `key` under `state`.
pub fn allowed_values(spec: &FormSpecification, key: &str, state: &FormState) -> AllowedValues {
    let Some(field) = spec.field(key) else {
        return AllowedValues::Unrestricted;
    };
    match &field.options {
        None => AllowedValues::Unrestricted,
        Some(OptionSource::Fixed(values)) => AllowedValues::OneOf(values.clone()),
        Some(OptionSource::Keyed(table)) => {
            let driver = field
                .depends_on
                .as_ref()
                .and_then(|d| state.text(d.as_str()));
            let values = driver
                .and_then(|d| table.get(d))
                .cloned()
                .unwrap_or_default();
            AllowedValues::OneOf(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;
    use brgy_core::{DocumentKind, FieldKey};

    fn spec() -> FormSpecification {
        FormSpecification::builder(DocumentKind::IncidentReport)
            .field(FieldSpec::select("category", "Category", ["Traffic", "Animals"]))
            .field(FieldSpec::dependent_select(
                "subCategory",
                "Sub-category",
                "category",
                [
                    ("Traffic", vec!["Illegal Parking", "Accidents"]),
                    ("Animals", vec!["Stray Animals"]),
                ],
            ))
            .field(FieldSpec::text("location", "Location"))
            .build()
            .unwrap()
    }

    #[test]
    fn fixed_options_ignore_state() {
        let allowed = allowed_values(&spec(), "category", &FormState::new());
        assert_eq!(allowed.options(), ["Traffic", "Animals"]);
    }

    #[test]
    fn keyed_options_follow_driver() {
        let spec = spec();
        let mut state = FormState::new();
        state.insert(FieldKey::new("category").unwrap(), "Animals".into());
        let allowed = allowed_values(&spec, "subCategory", &state);
        assert!(allowed.permits("Stray Animals"));
        assert!(!allowed.permits("Accidents"));
    }

    #[test]
    fn unset_driver_allows_nothing() {
        let allowed = allowed_values(&spec(), "subCategory", &FormState::new());
        assert_eq!(allowed, AllowedValues::OneOf(vec![]));
        assert!(!allowed.permits("Accidents"));
    }

    #[test]
    fn text_and_unknown_fields_are_unrestricted() {
        let spec = spec();
        let state = FormState::new();
        assert_eq!(allowed_values(&spec, "location", &state), AllowedValues::Unrestricted);
        assert_eq!(allowed_values(&spec, "nope", &state), AllowedValues::Unrestricted);
    }
}
