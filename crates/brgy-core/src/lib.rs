//! # brgy-core — Foundational Types for Barangay Request Forms
//!
//! Every other crate in the workspace depends on `brgy-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for identifiers.** `FieldKey` is validated at construction
//!    and at deserialization. No bare strings for field names.
//!
//! 2. **Unset means absent.** [`FormState`] never stores empty values;
//!    inserting an empty string, list or file set removes the key. Two states
//!    holding the same answers are therefore equal and serialize identically.
//!
//! 3. **Payloads are immutable.** A [`SubmissionPayload`] is assembled once,
//!    tagged with its [`DocumentKind`], and only read afterwards.
//!
//! 4. **Secrets redact themselves.** [`SessionToken`] zeroizes on drop and
//!    never prints its value through `Debug`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `brgy-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

/// Implements `Deserialize` for string newtypes that must validate their
/// contents: deserializes a plain `String`, then routes it through the
/// type's `new()` constructor so invalid values are rejected at the boundary.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod document;
pub mod error;
pub mod identity;
pub mod payload;
pub mod value;

pub use document::DocumentKind;
pub use error::ValidationError;
pub use identity::{Identity, IdentityAttr, SessionToken};
pub use payload::{is_reserved_key, EvidenceAttachment, PayloadValue, SubmissionPayload};
pub use value::{FieldKey, FieldValue, FileHandle, FormState};
