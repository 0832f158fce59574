//! # Submission Payload
//!
//! The normalized body sent to the submission gateway: every answered field
//! under its own camelCase property, file inputs replaced by base64
//! [`EvidenceAttachment`]s under `evidence`, and a `documentKind` tag.
//!
//! ```json
//! {
//!   "documentKind": "cedula",
//!   "name": "Juan Dela Cruz",
//!   "civilStatus": "Married",
//!   "dateOfBirth": "1990-05-01",
//!   "evidence": []
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;
use crate::error::ValidationError;
use crate::value::FieldKey;

/// Payload property holding the document discriminator.
pub const DOCUMENT_KIND_PROPERTY: &str = "documentKind";

/// Payload property holding encoded attachments.
pub const EVIDENCE_PROPERTY: &str = "evidence";

/// One uploaded file, read and encoded at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceAttachment {
    pub filename: String,
    pub content_type: String,
    /// Standard base64 (with padding) of the file bytes.
    pub data: String,
}

/// A non-file field value as it appears in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    Text(String),
    List(Vec<String>),
}

/// Immutable, tagged submission body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    document_kind: DocumentKind,
    #[serde(flatten)]
    fields: BTreeMap<FieldKey, PayloadValue>,
    evidence: Vec<EvidenceAttachment>,
}

impl SubmissionPayload {
    /// Assemble a payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ReservedFieldKey`] if `fields` contains
    /// `documentKind` or `evidence`, which the payload defines itself.
    pub fn new(
        document_kind: DocumentKind,
        fields: BTreeMap<FieldKey, PayloadValue>,
        evidence: Vec<EvidenceAttachment>,
    ) -> Result<Self, ValidationError> {
        if let Some(reserved) = fields
            .keys()
            .find(|k| is_reserved_key(k.as_str()))
        {
            return Err(ValidationError::ReservedFieldKey(reserved.to_string()));
        }
        Ok(Self {
            document_kind,
            fields,
            evidence,
        })
    }

    pub fn document_kind(&self) -> DocumentKind {
        self.document_kind
    }

    pub fn fields(&self) -> &BTreeMap<FieldKey, PayloadValue> {
        &self.fields
    }

    /// Text value of a field, if present.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(PayloadValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn evidence(&self) -> &[EvidenceAttachment] {
        &self.evidence
    }
}

/// Whether a key names a property the payload defines itself.
pub fn is_reserved_key(key: &str) -> bool {
    key == DOCUMENT_KIND_PROPERTY || key == EVIDENCE_PROPERTY
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(s: &str) -> FieldKey {
        FieldKey::new(s).unwrap()
    }

    #[test]
    fn serializes_flat_with_tag_and_evidence() {
        let mut fields = BTreeMap::new();
        fields.insert(key("name"), PayloadValue::Text("Juan Dela Cruz".into()));
        fields.insert(key("civilStatus"), PayloadValue::Text("Married".into()));
        let payload = SubmissionPayload::new(DocumentKind::Cedula, fields, vec![]).unwrap();

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "documentKind": "cedula",
                "name": "Juan Dela Cruz",
                "civilStatus": "Married",
                "evidence": []
            })
        );
    }

    #[test]
    fn attachment_uses_camel_case() {
        let attachment = EvidenceAttachment {
            filename: "photo.png".into(),
            content_type: "image/png".into(),
            data: "iVBORw0KGgo=".into(),
        };
        let value = serde_json::to_value(&attachment).unwrap();
        assert_eq!(value["contentType"], "image/png");
    }

    #[test]
    fn reserved_keys_are_rejected() {
        let mut fields = BTreeMap::new();
        fields.insert(key("evidence"), PayloadValue::Text("x".into()));
        let err = SubmissionPayload::new(DocumentKind::IncidentReport, fields, vec![]).unwrap_err();
        assert_eq!(err, ValidationError::ReservedFieldKey("evidence".into()));
    }

    #[test]
    fn deserializes_payload_back() {
        let payload: SubmissionPayload = serde_json::from_value(json!({
            "documentKind": "incident-report",
            "category": "Traffic & Road Issues",
            "evidence": [{"filename": "a.txt", "contentType": "text/plain", "data": "aGk="}]
        }))
        .unwrap();
        assert_eq!(payload.document_kind(), DocumentKind::IncidentReport);
        assert_eq!(payload.text("category"), Some("Traffic & Road Issues"));
        assert_eq!(payload.evidence().len(), 1);
    }
}
