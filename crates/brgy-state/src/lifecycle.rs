//! # Guided Form Lifecycle
//!
//! `Submitting` is exclusive: a second submit, a cancel, or a reset while a
//! submission is in flight is rejected. `Succeeded` is transient; the
//! controller resets to `Idle` with a fresh seed right after reaching it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Phase ───────────────────────────────────────────────────────────

/// Lifecycle phase of a guided form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    /// Seeded, untouched since the last reset.
    Idle,
    /// The user has edited at least one field.
    Editing,
    /// Attachments are being encoded or the payload is in flight.
    Submitting,
    /// The gateway accepted the payload.
    Succeeded,
    /// The gateway rejected the payload or could not be reached.
    Failed,
}

impl FormPhase {
    /// Whether a new submission may start from this phase.
    pub fn can_submit(&self) -> bool {
        matches!(self, Self::Idle | Self::Editing | Self::Failed)
    }
}

impl std::fmt::Display for FormPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "IDLE",
            Self::Editing => "EDITING",
            Self::Submitting => "SUBMITTING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Attempted transition is not valid from the current phase.
    #[error("invalid form transition: {from} -> {to}")]
    InvalidTransition { from: FormPhase, to: FormPhase },

    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

// ─── Transition log ──────────────────────────────────────────────────

/// Record of one accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from_phase: FormPhase,
    pub to_phase: FormPhase,
    pub at: DateTime<Utc>,
    pub reason: String,
}

// ─── Lifecycle ───────────────────────────────────────────────────────

/// Current phase plus the history that led to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormLifecycle {
    phase: FormPhase,
    failure: Option<String>,
    transitions: Vec<TransitionRecord>,
}

impl Default for FormLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl FormLifecycle {
    /// A freshly seeded form.
    pub fn new() -> Self {
        Self {
            phase: FormPhase::Idle,
            failure: None,
            transitions: Vec::new(),
        }
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// Reason of the last failure while the phase is `Failed`.
    pub fn failure(&self) -> Option<&str> {
        match self.phase {
            FormPhase::Failed => self.failure.as_deref(),
            _ => None,
        }
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    /// A field was edited (IDLE | FAILED → EDITING).
    ///
    /// Editing while already in `Editing` is accepted without a record.
    pub fn edit(&mut self) -> Result<(), LifecycleError> {
        match self.phase {
            FormPhase::Editing => Ok(()),
            FormPhase::Idle | FormPhase::Failed => {
                self.do_transition(FormPhase::Editing, "field edited");
                Ok(())
            }
            FormPhase::Submitting => Err(LifecycleError::AlreadySubmitting),
            FormPhase::Succeeded => Err(self.invalid(FormPhase::Editing)),
        }
    }

    /// Validation blocked a submit attempt (IDLE | EDITING | FAILED → EDITING).
    pub fn reject_invalid(&mut self, field_errors: usize) -> Result<(), LifecycleError> {
        self.require_can_submit(FormPhase::Editing)?;
        let reason = format!("{field_errors} field(s) failed validation");
        self.do_transition(FormPhase::Editing, &reason);
        Ok(())
    }

    /// Start a submission (IDLE | EDITING | FAILED → SUBMITTING).
    pub fn begin_submit(&mut self) -> Result<(), LifecycleError> {
        self.require_can_submit(FormPhase::Submitting)?;
        self.do_transition(FormPhase::Submitting, "submission started");
        Ok(())
    }

    /// The gateway accepted the payload (SUBMITTING → SUCCEEDED).
    pub fn succeed(&mut self) -> Result<(), LifecycleError> {
        self.require_phase(FormPhase::Submitting, FormPhase::Succeeded)?;
        self.do_transition(FormPhase::Succeeded, "gateway accepted submission");
        Ok(())
    }

    /// The submission failed (SUBMITTING → FAILED).
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), LifecycleError> {
        self.require_phase(FormPhase::Submitting, FormPhase::Failed)?;
        let reason = reason.into();
        self.do_transition(FormPhase::Failed, &reason);
        self.failure = Some(reason);
        Ok(())
    }

    /// Return to a fresh seed after success or cancel (any phase except
    /// SUBMITTING → IDLE).
    pub fn reset(&mut self, reason: &str) -> Result<(), LifecycleError> {
        if self.phase == FormPhase::Submitting {
            return Err(LifecycleError::AlreadySubmitting);
        }
        if self.phase != FormPhase::Idle {
            self.do_transition(FormPhase::Idle, reason);
        }
        self.failure = None;
        Ok(())
    }

    fn require_can_submit(&self, target: FormPhase) -> Result<(), LifecycleError> {
        if self.phase == FormPhase::Submitting {
            return Err(LifecycleError::AlreadySubmitting);
        }
        if !self.phase.can_submit() {
            return Err(self.invalid(target));
        }
        Ok(())
    }

    fn require_phase(&self, expected: FormPhase, target: FormPhase) -> Result<(), LifecycleError> {
        if self.phase != expected {
            return Err(self.invalid(target));
        }
        Ok(())
    }

    fn invalid(&self, to: FormPhase) -> LifecycleError {
        LifecycleError::InvalidTransition {
            from: self.phase,
            to,
        }
    }

    fn do_transition(&mut self, to: FormPhase, reason: &str) {
        self.transitions.push(TransitionRecord {
            from_phase: self.phase,
            to_phase: to,
            at: Utc::now(),
            reason: reason.to_string(),
        });
        self.phase = to;
    }
}
