//! # Error Types
//!
//! Construction-time validation failures for the domain newtypes defined in
//! this crate. Higher layers (schema, client, controller) define their own
//! `thiserror` enums and wrap these where needed.

use thiserror::Error;

/// A value was rejected while constructing a domain primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field keys must be non-empty ASCII identifiers starting with a letter.
    #[error("invalid field key {0:?}: expected an ASCII identifier starting with a letter")]
    InvalidFieldKey(String),

    /// The string does not name a known document kind.
    #[error("unknown document kind {0:?} (expected barangay-clearance, cedula or incident-report)")]
    UnknownDocumentKind(String),

    /// The key collides with a property the payload itself defines.
    #[error("field key {0:?} is reserved by the submission payload")]
    ReservedFieldKey(String),

    /// A session token was empty or contained characters that cannot travel
    /// in an `Authorization` header.
    #[error("invalid session token: {0}")]
    InvalidToken(&'static str),
}
