//! # Field Keys, Values and Form State
//!
//! A [`FormState`] maps [`FieldKey`]s to [`FieldValue`]s. Unset fields are
//! absent: inserting an empty value removes the key, so the map never holds
//! placeholders and equal answers always compare (and serialize) equal.
//!
//! Values mirror what an HTML form produces: single text for text-like,
//! date, time, number and select inputs; a list of strings for
//! multi-selects; and a list of file handles for file inputs.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of a form field, e.g. `civilStatus`.
///
/// Keys are ASCII identifiers starting with a letter, matching the
/// camelCase property names of the submission payload.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldKey(String);

impl_validating_deserialize!(FieldKey);

impl FieldKey {
    /// Create a key, validating its format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFieldKey`] when the string is empty,
    /// does not start with an ASCII letter, or contains characters other than
    /// ASCII alphanumerics and `_`.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        let mut chars = s.chars();
        let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(ValidationError::InvalidFieldKey(s));
        }
        Ok(Self(s))
    }

    /// Access the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file chosen by the user for upload, not yet read.
///
/// The bytes are only read (and base64-encoded) when the form is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    /// Location of the file on disk.
    pub path: PathBuf,
    /// Name reported to the server.
    pub filename: String,
    /// MIME type reported to the server.
    pub content_type: String,
}

impl FileHandle {
    /// Build a handle from a path, deriving the filename and guessing the
    /// content type from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = content_type_for(&path).to_string();
        Self {
            path,
            filename,
            content_type,
        }
    }

    /// Override the guessed content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Content types for the evidence formats residents typically upload.
fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("pdf") => "application/pdf",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Current value of one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text, email, tel, date, time, number and single-select inputs.
    Text(String),
    /// Multi-select inputs.
    List(Vec<String>),
    /// File inputs.
    Files(Vec<FileHandle>),
}

impl FieldValue {
    /// Whether the value carries nothing (and so counts as unset).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Files(files) => files.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileHandle]> {
        match self {
            Self::Files(files) => Some(files),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<FileHandle>> for FieldValue {
    fn from(value: Vec<FileHandle>) -> Self {
        Self::Files(value)
    }
}

/// Mapping from field key to current value. Unset fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "BTreeMap<FieldKey, FieldValue>")]
pub struct FormState(BTreeMap<FieldKey, FieldValue>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Empty values remove the key instead.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: FieldKey, value: FieldValue) -> Option<FieldValue> {
        if value.is_empty() {
            self.0.remove(key.as_str())
        } else {
            self.0.insert(key, value)
        }
    }

    /// Unset a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Text value of a field, if it is set and text-valued.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &FieldValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<FieldKey, FieldValue>> for FormState {
    fn from(map: BTreeMap<FieldKey, FieldValue>) -> Self {
        Self(map.into_iter().filter(|(_, v)| !v.is_empty()).collect())
    }
}

impl FromIterator<(FieldKey, FieldValue)> for FormState {
    fn from_iter<I: IntoIterator<Item = (FieldKey, FieldValue)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (key, value) in iter {
            state.insert(key, value);
        }
        state
    }
}

impl Serialize for FormState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> FieldKey {
        FieldKey::new(s).unwrap()
    }

    #[test]
    fn field_key_accepts_camel_case() {
        assert_eq!(key("civilStatus").as_str(), "civilStatus");
        assert_eq!(key("sub_category").as_str(), "sub_category");
    }

    #[test]
    fn field_key_rejects_bad_shapes() {
        for bad in ["", "1st", "civil status", "date-of-birth", "_x"] {
            assert!(FieldKey::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn field_key_deserialize_validates() {
        assert!(serde_json::from_str::<FieldKey>("\"name\"").is_ok());
        assert!(serde_json::from_str::<FieldKey>("\"bad key\"").is_err());
    }

    #[test]
    fn inserting_empty_value_unsets_field() {
        let mut state = FormState::new();
        state.insert(key("purpose"), "Employment".into());
        assert_eq!(state.text("purpose"), Some("Employment"));

        let previous = state.insert(key("purpose"), "".into());
        assert_eq!(previous, Some(FieldValue::from("Employment")));
        assert!(!state.contains("purpose"));
        assert!(state.is_empty());
    }

    #[test]
    fn deserialize_drops_empty_values() {
        let state: FormState =
            serde_json::from_str(r#"{"name":"Juan","purpose":"","tags":[]}"#).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(state.text("name"), Some("Juan"));
    }

    #[test]
    fn serialization_is_key_ordered() {
        let state: FormState = [
            (key("zeta"), FieldValue::from("z")),
            (key("alpha"), FieldValue::from("a")),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"alpha":"a","zeta":"z"}"#
        );
    }

    #[test]
    fn file_handle_guesses_name_and_type() {
        let handle = FileHandle::from_path("/tmp/evidence/Photo.JPG");
        assert_eq!(handle.filename, "Photo.JPG");
        assert_eq!(handle.content_type, "image/jpeg");

        let unknown = FileHandle::from_path("notes.xyz");
        assert_eq!(unknown.content_type, "application/octet-stream");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn state_never_stores_empty_values(
            ops in proptest::collection::vec(("[a-e]", "[a-z]{0,3}"), 0..40)
        ) {
            let mut state = FormState::new();
            for (k, v) in ops {
                state.insert(FieldKey::new(k).unwrap(), FieldValue::Text(v));
            }
            prop_assert!(state.iter().all(|(_, v)| !v.is_empty()));
        }

        #[test]
        fn equal_states_serialize_identically(
            entries in proptest::collection::btree_map("[a-z][a-zA-Z]{0,6}", "[a-z ]{1,8}", 0..8)
        ) {
            let forward: FormState = entries
                .iter()
                .map(|(k, v)| (FieldKey::new(k.clone()).unwrap(), FieldValue::from(v.as_str())))
                .collect();
            let backward: FormState = entries
                .iter()
                .rev()
                .map(|(k, v)| (FieldKey::new(k.clone()).unwrap(), FieldValue::from(v.as_str())))
                .collect();
            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(
                serde_json::to_string(&forward).unwrap(),
                serde_json::to_string(&backward).unwrap()
            );
        }
    }
}
