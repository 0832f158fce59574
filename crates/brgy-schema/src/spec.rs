//! # Form Specifications
//!
//! A [`FormSpecification`] is built from unchecked [`FieldSpec`] drafts via
//! [`FormSpecBuilder`]. `build()` checks the structural invariants once, so
//! the validator and resolver can rely on them without re-checking.
//!
//! ```
//! use brgy_core::{DocumentKind, IdentityAttr};
//! use brgy_schema::{FieldSpec, FormSpecification};
//!
//! let spec = FormSpecification::builder(DocumentKind::Cedula)
//!     .field(FieldSpec::text("name", "Full Name").required().locked(IdentityAttr::Name))
//!     .field(FieldSpec::select("civilStatus", "Civil Status", ["Single", "Married"]).required())
//!     .field(FieldSpec::date("dateOfBirth", "Date of Birth").required())
//!     .build()
//!     .unwrap();
//! assert_eq!(spec.fields().len(), 3);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

use brgy_core::{is_reserved_key, DocumentKind, FieldKey, IdentityAttr, ValidationError};

// ─── Field kinds ─────────────────────────────────────────────────────

/// Input kind of a field. Determines the expected value shape and the
/// built-in format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "email")]
    Email,
    #[serde(rename = "tel")]
    Tel,
    /// `YYYY-MM-DD`.
    #[serde(rename = "date")]
    Date,
    /// `HH:MM`, 24-hour.
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "multiselect")]
    MultiSelect,
    #[serde(rename = "file[]")]
    Files,
}

impl FieldKind {
    /// Kinds whose value is a single free-form string.
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text | Self::Email | Self::Tel)
    }

    /// Kinds whose value is restricted to an option set.
    pub fn has_options(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Tel => "tel",
            Self::Date => "date",
            Self::Time => "time",
            Self::Number => "number",
            Self::Select => "select",
            Self::MultiSelect => "multiselect",
            Self::Files => "file[]",
        };
        f.write_str(s)
    }
}

// ─── Constraints ─────────────────────────────────────────────────────

/// Upper or lower bound for a date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateBound {
    /// The date on which validation runs.
    Today,
    Fixed(NaiveDate),
}

impl DateBound {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Fixed(date) => *date,
        }
    }
}

/// A compiled regular expression that serializes as its source.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// Declarative validation rules of one field. Which rules apply depends on
/// the field kind: lengths and patterns for text-like kinds, `min`/`max` for
/// numbers, `earliest`/`latest` for dates, `max_files` for file inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
    /// Replaces the generated message for any constraint violation other
    /// than a missing required value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ─── Options and identity bindings ───────────────────────────────────

/// Where a select field's options come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionSource {
    /// The same list regardless of other fields.
    Fixed(Vec<String>),
    /// A list chosen by the value of the field named in `depends_on`.
    /// An unset or unknown driver value allows nothing.
    Keyed(BTreeMap<String, Vec<String>>),
}

/// How a field is sourced from the session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentityBinding {
    /// Read-only; always mirrors the identity attribute, blank if absent.
    Locked(IdentityAttr),
    /// Seeded from the identity but editable by the user.
    Defaulted(IdentityAttr),
}

impl IdentityBinding {
    pub fn attr(&self) -> IdentityAttr {
        match self {
            Self::Locked(attr) | Self::Defaulted(attr) => *attr,
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }
}

// ─── Descriptors ─────────────────────────────────────────────────────

/// A validated field of a [`FormSpecification`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: FieldKey,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<FieldKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<IdentityBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    /// Identity-locked fields are never editable.
    pub fn is_read_only(&self) -> bool {
        self.binding.map_or(false, |b| b.is_locked())
    }
}

/// Unchecked field draft, consumed by [`FormSpecBuilder::field`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    key: String,
    label: String,
    kind: FieldKind,
    required: bool,
    constraints: Constraints,
    pattern: Option<String>,
    depends_on: Option<String>,
    options: Option<OptionSource>,
    binding: Option<IdentityBinding>,
    placeholder: Option<String>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            constraints: Constraints::default(),
            pattern: None,
            depends_on: None,
            options: None,
            binding: None,
            placeholder: None,
        }
    }

    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn email(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Email)
    }

    pub fn tel(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Tel)
    }

    pub fn date(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub fn time(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Time)
    }

    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn files(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Files)
    }

    /// Single select over a fixed option list.
    pub fn select<I, S>(key: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(key, label, FieldKind::Select);
        spec.options = Some(OptionSource::Fixed(
            options.into_iter().map(Into::into).collect(),
        ));
        spec
    }

    /// Multi select over a fixed option list.
    pub fn multiselect<I, S>(key: impl Into<String>, label: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::select(key, label, options);
        spec.kind = FieldKind::MultiSelect;
        spec
    }

    /// Single select whose options are chosen by the value of `driver`.
    pub fn dependent_select<I, K, V, S>(
        key: impl Into<String>,
        label: impl Into<String>,
        driver: impl Into<String>,
        table: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = Self::new(key, label, FieldKind::Select);
        spec.depends_on = Some(driver.into());
        spec.options = Some(OptionSource::Keyed(
            table
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().map(Into::into).collect()))
                .collect(),
        ));
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.constraints.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.constraints.max_length = Some(n);
        self
    }

    /// Regular expression the whole trimmed value must match.
    pub fn pattern(mut self, source: impl Into<String>) -> Self {
        self.pattern = Some(source.into());
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    pub fn earliest(mut self, bound: DateBound) -> Self {
        self.constraints.earliest = Some(bound);
        self
    }

    pub fn latest(mut self, bound: DateBound) -> Self {
        self.constraints.latest = Some(bound);
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.constraints.max_files = Some(n);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.constraints.message = Some(message.into());
        self
    }

    pub fn depends_on(mut self, driver: impl Into<String>) -> Self {
        self.depends_on = Some(driver.into());
        self
    }

    /// Bind to an identity attribute, read-only.
    pub fn locked(mut self, attr: IdentityAttr) -> Self {
        self.binding = Some(IdentityBinding::Locked(attr));
        self
    }

    /// Seed from an identity attribute, editable.
    pub fn defaulted(mut self, attr: IdentityAttr) -> Self {
        self.binding = Some(IdentityBinding::Defaulted(attr));
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }
}

// ─── Specification ───────────────────────────────────────────────────

/// Ordered, validated field list for one document kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpecification {
    document_kind: DocumentKind,
    fields: Vec<FieldDescriptor>,
}

impl FormSpecification {
    pub fn builder(document_kind: DocumentKind) -> FormSpecBuilder {
        FormSpecBuilder {
            document_kind,
            fields: Vec::new(),
        }
    }

    pub fn document_kind(&self) -> DocumentKind {
        self.document_kind
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key.as_str() == key)
    }

    /// Fields whose `depends_on` names `key`, in declaration order.
    pub fn dependents<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldDescriptor> {
        self.fields
            .iter()
            .filter(move |f| f.depends_on.as_ref().map_or(false, |d| d.as_str() == key))
    }

    /// File-input fields in declaration order.
    pub fn file_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Files)
    }
}

/// Errors raised when a specification violates a structural invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecError {
    #[error("invalid field key: {0}")]
    InvalidKey(#[from] ValidationError),

    #[error("field key {0:?} is declared more than once")]
    DuplicateKey(String),

    #[error("field key {0:?} is reserved by the submission payload")]
    ReservedKey(String),

    /// `depends_on` must name a field declared earlier in the same spec.
    #[error("field {field:?} depends on {depends_on:?}, which is not declared before it")]
    DependencyNotDeclaredEarlier { field: String, depends_on: String },

    #[error("select field {0:?} declares no options")]
    MissingOptions(String),

    #[error("field {0:?} declares options but is not a select")]
    OptionsOnNonSelect(String),

    #[error("field {0:?} has keyed options but no depends_on")]
    KeyedOptionsWithoutDependency(String),

    #[error("field {field:?} is bound to the identity but has kind {kind}")]
    BindingOnNonText { field: String, kind: FieldKind },

    #[error("field {field:?} has an invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },
}

/// Collects [`FieldSpec`] drafts and checks them in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct FormSpecBuilder {
    document_kind: DocumentKind,
    fields: Vec<FieldSpec>,
}

impl FormSpecBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate every draft and produce the specification.
    pub fn build(self) -> Result<FormSpecification, SpecError> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for draft in self.fields {
            let key = FieldKey::new(draft.key.clone())?;

            if seen.contains(key.as_str()) {
                return Err(SpecError::DuplicateKey(draft.key));
            }
            let reserved = is_reserved_key(key.as_str())
                && !(key.as_str() == "evidence" && draft.kind == FieldKind::Files);
            if reserved {
                return Err(SpecError::ReservedKey(draft.key));
            }

            let depends_on = match draft.depends_on {
                Some(driver) if seen.contains(&driver) => Some(FieldKey::new(driver)?),
                Some(driver) => {
                    return Err(SpecError::DependencyNotDeclaredEarlier {
                        field: draft.key,
                        depends_on: driver,
                    })
                }
                None => None,
            };

            match (&draft.options, draft.kind.has_options()) {
                (None, true) => return Err(SpecError::MissingOptions(draft.key)),
                (Some(_), false) => return Err(SpecError::OptionsOnNonSelect(draft.key)),
                (Some(OptionSource::Keyed(_)), true) if depends_on.is_none() => {
                    return Err(SpecError::KeyedOptionsWithoutDependency(draft.key))
                }
                _ => {}
            }

            if draft.binding.is_some() && !draft.kind.is_text_like() {
                return Err(SpecError::BindingOnNonText {
                    field: draft.key,
                    kind: draft.kind,
                });
            }

            let mut constraints = draft.constraints;
            if let Some(source) = draft.pattern {
                // Anchor so the pattern has to match the whole value.
                let anchored = format!("^(?:{source})$");
                let regex = Regex::new(&anchored).map_err(|e| SpecError::InvalidPattern {
                    field: draft.key.clone(),
                    reason: e.to_string(),
                })?;
                constraints.pattern = Some(Pattern { source, regex });
            }

            seen.insert(draft.key);
            fields.push(FieldDescriptor {
                key,
                label: draft.label,
                kind: draft.kind,
                required: draft.required,
                constraints,
                depends_on,
                options: draft.options,
                binding: draft.binding,
                placeholder: draft.placeholder,
            });
        }

        Ok(FormSpecification {
            document_kind: self.document_kind,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> FormSpecBuilder {
        FormSpecification::builder(DocumentKind::IncidentReport)
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = builder()
            .field(FieldSpec::text("location", "Location"))
            .field(FieldSpec::text("location", "Location again"))
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::DuplicateKey("location".into()));
    }

    #[test]
    fn rejects_forward_dependency() {
        let err = builder()
            .field(FieldSpec::dependent_select(
                "subCategory",
                "Sub-category",
                "category",
                [("A", ["a1"])],
            ))
            .field(FieldSpec::select("category", "Category", ["A"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::DependencyNotDeclaredEarlier { .. }));
    }

    #[test]
    fn rejects_self_dependency() {
        let err = builder()
            .field(FieldSpec::text("a", "A").depends_on("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::DependencyNotDeclaredEarlier { .. }));
    }

    #[test]
    fn rejects_select_without_options() {
        let err = builder()
            .field(FieldSpec::new("status", "Status", FieldKind::Select))
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::MissingOptions("status".into()));
    }

    #[test]
    fn rejects_reserved_keys() {
        let err = builder()
            .field(FieldSpec::text("documentKind", "Kind"))
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::ReservedKey("documentKind".into()));

        let err = builder()
            .field(FieldSpec::text("evidence", "Evidence"))
            .build()
            .unwrap_err();
        assert_eq!(err, SpecError::ReservedKey("evidence".into()));

        assert!(builder()
            .field(FieldSpec::files("evidence", "Evidence"))
            .build()
            .is_ok());
    }

    #[test]
    fn rejects_binding_on_date() {
        let err = builder()
            .field(FieldSpec::date("date", "Date").locked(IdentityAttr::Name))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::BindingOnNonText { .. }));
    }

    #[test]
    fn rejects_bad_pattern() {
        let err = builder()
            .field(FieldSpec::text("code", "Code").pattern("[unclosed"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::InvalidPattern { .. }));
    }

    #[test]
    fn rejects_invalid_key() {
        let err = builder()
            .field(FieldSpec::text("date of birth", "DOB"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SpecError::InvalidKey(_)));
    }

    #[test]
    fn dependents_are_found() {
        let spec = builder()
            .field(FieldSpec::select("category", "Category", ["A", "B"]))
            .field(FieldSpec::dependent_select(
                "subCategory",
                "Sub-category",
                "category",
                [("A", vec!["a1"]), ("B", vec!["b1"])],
            ))
            .build()
            .unwrap();
        let deps: Vec<_> = spec.dependents("category").map(|f| f.key.as_str()).collect();
        assert_eq!(deps, ["subCategory"]);
        assert_eq!(spec.dependents("subCategory").count(), 0);
    }

    #[test]
    fn serializes_kind_names() {
        let spec = builder()
            .field(FieldSpec::files("evidence", "Upload Evidence").max_files(5))
            .build()
            .unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["documentKind"], "incident-report");
        assert_eq!(json["fields"][0]["kind"], "file[]");
        assert_eq!(json["fields"][0]["constraints"]["maxFiles"], 5);
    }
}
