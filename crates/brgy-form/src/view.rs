//! # Render Model
//!
//! A snapshot of everything a page needs to draw a form: per-field value,
//! options, read-only flag, error and, for date fields, which input widget
//! to use.

use serde::Serialize;

use brgy_core::{DocumentKind, FieldKey, FieldValue, FormState};
use brgy_schema::{allowed_values, FieldKind, FormSpecification, ValidationResult};
use brgy_state::FormPhase;

use crate::probe::EnvironmentProfile;

/// Widget used for date fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateInputStrategy {
    /// The browser's own date input.
    Native,
    /// Calendar popover.
    Calendar,
}

impl From<EnvironmentProfile> for DateInputStrategy {
    fn from(profile: EnvironmentProfile) -> Self {
        if profile.use_native_date_input {
            Self::Native
        } else {
            Self::Calendar
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub key: FieldKey,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    /// Current options of a select field; empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_input: Option<DateInputStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub document_kind: DocumentKind,
    pub phase: FormPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub fields: Vec<FieldView>,
}

impl FormView {
    pub fn field(&self, key: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.key.as_str() == key)
    }

    /// Submit controls are disabled while a submission is in flight.
    pub fn can_submit(&self) -> bool {
        self.phase.can_submit()
    }
}

pub(crate) fn render(
    spec: &FormSpecification,
    state: &FormState,
    errors: &ValidationResult,
    profile: EnvironmentProfile,
    phase: FormPhase,
    failure: Option<&str>,
) -> FormView {
    let fields = spec
        .fields()
        .iter()
        .map(|field| {
            let key = field.key.as_str();
            FieldView {
                key: field.key.clone(),
                label: field.label.clone(),
                kind: field.kind,
                required: field.required,
                read_only: field.is_read_only(),
                value: state.get(key).cloned(),
                options: allowed_values(spec, key, state).options().to_vec(),
                error: errors.get(key).map(str::to_string),
                placeholder: field.placeholder.clone(),
                date_input: (field.kind == FieldKind::Date).then(|| profile.into()),
            }
        })
        .collect();

    FormView {
        document_kind: spec.document_kind(),
        phase,
        failure: failure.map(str::to_string),
        fields,
    }
}
