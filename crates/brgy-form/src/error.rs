//! Controller error types.
//!
//! Only edits and cancellation return these. Submission reports its result
//! as a [`SubmitOutcome`](crate::SubmitOutcome) instead, since every
//! failure there is an expected user-facing state.

use thiserror::Error;

use brgy_core::ValidationError;
use brgy_schema::FieldKind;
use brgy_state::LifecycleError;

use crate::attachments::AttachmentError;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("{0:?} is not a field of this form")]
    UnknownField(String),

    /// Identity-locked fields mirror the session and cannot be edited.
    #[error("{0:?} is read-only")]
    ReadOnlyField(String),

    #[error("{field:?} is a {kind} field and cannot hold this value")]
    WrongValueKind { field: String, kind: FieldKind },

    #[error("{value:?} is not an option for {field:?}")]
    NotAnOption { field: String, value: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Why a payload could not be assembled.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error(transparent)]
    Field(#[from] ValidationError),
}
