//! # Validator
//!
//! Pure functions from a specification and a state to per-field error
//! messages. Nothing here touches the clock except [`validate`] and
//! [`validate_field`], which read the local date once for `today` bounds;
//! [`validate_on`] takes it explicitly.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Local, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Serialize;

use brgy_core::{FieldKey, FieldValue, FormState};

use crate::options::allowed_values;
use crate::spec::{FieldDescriptor, FieldKind, FormSpecification};

/// Field key to error message. Empty means the state is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult(BTreeMap<FieldKey, String>);

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.0.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace or clear the message for one field.
    pub fn update(&mut self, key: FieldKey, message: Option<String>) {
        match message {
            Some(message) => {
                self.0.insert(key, message);
            }
            None => {
                self.0.remove(key.as_str());
            }
        }
    }
}

/// Validate the whole state against today's local date.
pub fn validate(spec: &FormSpecification, state: &FormState) -> ValidationResult {
    validate_on(spec, state, Local::now().date_naive())
}

/// Validate the whole state, resolving `today` bounds to the given date.
///
/// Every declared field is checked, and every undeclared key in the state is
/// reported.
pub fn validate_on(spec: &FormSpecification, state: &FormState, today: NaiveDate) -> ValidationResult {
    let mut errors = BTreeMap::new();
    for field in spec.fields() {
        if let Some(message) = check(spec, field, state, today) {
            errors.insert(field.key.clone(), message);
        }
    }
    for key in state.keys() {
        if spec.field(key.as_str()).is_none() {
            errors.insert(key.clone(), format!("{key} is not a field of this form"));
        }
    }
    ValidationResult(errors)
}

/// Validate a single field. `None` when it is valid or undeclared.
pub fn validate_field(spec: &FormSpecification, state: &FormState, key: &str) -> Option<String> {
    let field = spec.field(key)?;
    check(spec, field, state, Local::now().date_naive())
}

fn check(
    spec: &FormSpecification,
    field: &FieldDescriptor,
    state: &FormState,
    today: NaiveDate,
) -> Option<String> {
    let label = &field.label;
    let value = match state.get(field.key.as_str()) {
        Some(value) if is_present(value) => value,
        _ if field.required => return Some(format!("{label} is required")),
        _ => return None,
    };

    let violation = match (field.kind, value) {
        (FieldKind::MultiSelect, FieldValue::List(items)) => {
            let allowed = allowed_values(spec, field.key.as_str(), state);
            items
                .iter()
                .find(|item| !allowed.permits(item))
                .map(|item| format!("{item:?} is not an option for {label}"))
        }
        (FieldKind::Files, FieldValue::Files(files)) => match field.constraints.max_files {
            Some(max) if files.len() > max => {
                Some(format!("{label} accepts at most {max} files"))
            }
            _ => None,
        },
        (FieldKind::MultiSelect | FieldKind::Files, _) => {
            Some(format!("{label} has the wrong kind of value"))
        }
        (kind, FieldValue::Text(raw)) => check_text(spec, field, kind, raw.trim(), state, today),
        (_, _) => Some(format!("{label} has the wrong kind of value")),
    }?;

    Some(field.constraints.message.clone().unwrap_or(violation))
}

fn check_text(
    spec: &FormSpecification,
    field: &FieldDescriptor,
    kind: FieldKind,
    value: &str,
    state: &FormState,
    today: NaiveDate,
) -> Option<String> {
    let label = &field.label;
    let c = &field.constraints;

    let chars = value.chars().count();
    if let Some(min) = c.min_length {
        if chars < min {
            return Some(format!("{label} must be at least {min} characters"));
        }
    }
    if let Some(max) = c.max_length {
        if chars > max {
            return Some(format!("{label} must be at most {max} characters"));
        }
    }
    if let Some(pattern) = &c.pattern {
        if !pattern.is_match(value) {
            return Some(format!("{label} has an invalid format"));
        }
    }

    match kind {
        FieldKind::Email if !is_email(value) => {
            Some(format!("{label} must be a valid email address"))
        }
        FieldKind::Tel if !is_phone_number(value) => {
            Some(format!("{label} must be a valid phone number"))
        }
        FieldKind::Date => {
            let Some(date) = parse_date(value) else {
                return Some(format!("{label} must be a date (YYYY-MM-DD)"));
            };
            if let Some(earliest) = c.earliest.map(|b| b.resolve(today)) {
                if date < earliest {
                    return Some(format!("{label} cannot be before {earliest}"));
                }
            }
            match c.latest.map(|b| b.resolve(today)) {
                Some(latest) if date > latest => {
                    Some(format!("{label} cannot be after {latest}"))
                }
                _ => None,
            }
        }
        FieldKind::Time if parse_time(value).is_none() => {
            Some(format!("{label} must be a time (HH:MM)"))
        }
        FieldKind::Number => {
            let Some(n) = value.parse::<f64>().ok().filter(|n| n.is_finite()) else {
                return Some(format!("{label} must be a number"));
            };
            if let Some(min) = c.min.filter(|min| n < *min) {
                return Some(format!("{label} must be at least {min}"));
            }
            c.max
                .filter(|max| n > *max)
                .map(|max| format!("{label} must be at most {max}"))
        }
        FieldKind::Select => {
            let allowed = allowed_values(spec, field.key.as_str(), state);
            (!allowed.permits(value)).then(|| format!("{value:?} is not an option for {label}"))
        }
        _ => None,
    }
}

fn is_present(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => !s.trim().is_empty(),
        other => !other.is_empty(),
    }
}

/// `local@domain.tld`, no whitespace, exactly one `@`, no empty domain
/// labels.
const EMAIL_SHAPE: &str = r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$";

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(EMAIL_SHAPE).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Optional leading `+`, then 7 to 15 digits; spaces, dashes and
/// parentheses are ignored.
fn is_phone_number(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let mut count = 0;
    for c in digits.chars() {
        match c {
            '0'..='9' => count += 1,
            ' ' | '-' | '(' | ')' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&count)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    if value.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}
