//! # brgy-form — Guided Form Controller
//!
//! Drives one barangay request form from mount to submission:
//!
//! ```text
//!   IdentitySource ──subscribe──▶ GuidedForm ◀──probe── EnvironmentProbe
//!        (session)                 │   │
//!                       set_field  │   │ submit
//!                                  ▼   ▼
//!                           StateSink   SubmissionGateway ──▶ HTTP
//!                         (RequestDraft)   (HttpGateway)
//! ```
//!
//! The controller owns the form state exclusively. Identity, probe and
//! gateway are trait objects at the seams, so embedding callers and tests
//! can substitute their own.
//!
//! ## Guarantees
//!
//! - Identity-locked fields always mirror the identity and reject edits.
//! - A submission is only attempted on a fully valid state; the payload is
//!   tagged with its document kind and always carries an `evidence` list.
//! - At most one submission is in flight per form; identity updates that
//!   arrive meanwhile are applied once it resolves.
//! - A failed submission keeps everything the resident entered.

pub mod attachments;
pub mod controller;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod probe;
pub mod seed;
pub mod session;
pub mod view;

pub use attachments::{encode_attachments, AttachmentError, AttachmentReader, FsAttachmentReader};
pub use controller::{build_payload, GuidedForm, GuidedFormBuilder, SubmitOutcome};
pub use draft::{RequestDraft, StateSink};
pub use error::{FormError, PayloadError};
pub use gateway::{GatewayError, HttpGateway, SubmissionGateway};
pub use identity::{IdentitySource, IdentitySubscription, MemoryIdentity};
pub use probe::{
    is_chrome_like, EnvironmentProbe, EnvironmentProfile, FixedProbe, PrivacyBrowserCheck,
    ProbeError, UserAgentProbe,
};
pub use seed::initialize;
pub use session::{SessionError, SessionStore, SessionWatch, TokenSource};
pub use view::{DateInputStrategy, FieldView, FormView};

pub use brgy_state::FormPhase;
