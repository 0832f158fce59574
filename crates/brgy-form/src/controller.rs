//! # Guided Form Controller
//!
//! Owns one form's state from mount to teardown:
//!
//! 1. seeds from the identity and the caller's initial data;
//! 2. re-applies identity-bound fields when the identity changes, without
//!    touching the resident's other edits;
//! 3. applies edits, resolves dependent selects and reports the full state
//!    to the [`StateSink`];
//! 4. on submit, validates everything, encodes attachments in order, tags
//!    the payload and hands it to the [`SubmissionGateway`].
//!
//! Edits are synchronous. The environment probe runs once, in the
//! background, and is folded in on the next [`render`](GuidedForm::render).
//! Identity changes that arrive while a submission is in flight stay
//! pending on the subscription and are applied once it resolves.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::oneshot;

use brgy_client::SubmissionReceipt;
use brgy_core::{FieldKey, FieldValue, FormState, Identity, PayloadValue, SubmissionPayload};
use brgy_schema::{
    allowed_values, on_field_change, validate, FieldDescriptor, FieldKind, FormSpecification,
    ValidationResult,
};
use brgy_state::{FormLifecycle, FormPhase};

use crate::attachments::{encode_attachments, AttachmentReader, FsAttachmentReader};
use crate::draft::StateSink;
use crate::error::{FormError, PayloadError};
use crate::gateway::SubmissionGateway;
use crate::identity::{IdentitySource, IdentitySubscription};
use crate::probe::{EnvironmentProbe, EnvironmentProfile};
use crate::seed::initialize;
use crate::view::{self, FormView};

/// Reason recorded when a submit future is dropped before it resolved.
const ABANDONED: &str = "Submission was interrupted. Please try again.";

/// Result of [`GuidedForm::submit`], the only thing the surrounding page
/// observes about a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The gateway accepted the payload; the form is back to a fresh seed.
    Succeeded(SubmissionReceipt),
    /// Validation failed; nothing was sent.
    Invalid(ValidationResult),
    /// Encoding or the gateway failed; the state is kept for a retry.
    Failed { reason: String },
    /// A submission was already in flight.
    Rejected,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Assembles a [`GuidedForm`].
pub struct GuidedFormBuilder {
    spec: Arc<FormSpecification>,
    identity: Arc<dyn IdentitySource>,
    gateway: Arc<dyn SubmissionGateway>,
    initial_data: FormState,
    probe: Option<Arc<dyn EnvironmentProbe>>,
    attachments: Arc<dyn AttachmentReader>,
    sink: Option<Arc<dyn StateSink>>,
}

impl GuidedFormBuilder {
    /// Values for fields not bound to the identity.
    pub fn initial_data(mut self, data: FormState) -> Self {
        self.initial_data = data;
        self
    }

    /// Environment probe, run once in the background. Without one the
    /// default profile (calendar date input) is used.
    pub fn probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Attachment reader; defaults to the local filesystem.
    pub fn attachments(mut self, reader: Arc<dyn AttachmentReader>) -> Self {
        self.attachments = reader;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn StateSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Subscribe to the identity, seed the state and start the probe.
    pub fn build(self) -> GuidedForm {
        // Subscribe before reading so a change in between is not lost.
        let mut subscription = self.identity.subscribe();
        subscription.mark_seen();
        let identity = self.identity.read();
        let state = initialize(&self.spec, &identity, &self.initial_data);

        let form = GuidedForm {
            probe: spawn_probe(self.probe),
            spec: self.spec,
            identity_source: self.identity,
            subscription,
            identity,
            initial_data: self.initial_data,
            state,
            dirty: BTreeSet::new(),
            errors: ValidationResult::default(),
            lifecycle: FormLifecycle::new(),
            profile: EnvironmentProfile::default(),
            gateway: self.gateway,
            attachments: self.attachments,
            sink: self.sink,
        };
        form.notify();
        form
    }
}

/// Controller for one mounted form.
pub struct GuidedForm {
    spec: Arc<FormSpecification>,
    identity_source: Arc<dyn IdentitySource>,
    subscription: IdentitySubscription,
    identity: Identity,
    initial_data: FormState,
    state: FormState,
    /// Fields the resident edited since the last seed.
    dirty: BTreeSet<FieldKey>,
    errors: ValidationResult,
    lifecycle: FormLifecycle,
    profile: EnvironmentProfile,
    probe: Option<oneshot::Receiver<EnvironmentProfile>>,
    gateway: Arc<dyn SubmissionGateway>,
    attachments: Arc<dyn AttachmentReader>,
    sink: Option<Arc<dyn StateSink>>,
}

impl std::fmt::Debug for GuidedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuidedForm")
            .field("document_kind", &self.spec.document_kind())
            .field("phase", &self.lifecycle.phase())
            .field("state", &self.state)
            .field("profile", &self.profile)
            .field("probe_pending", &self.probe.is_some())
            .finish_non_exhaustive()
    }
}

impl GuidedForm {
    pub fn builder(
        spec: impl Into<Arc<FormSpecification>>,
        identity: Arc<dyn IdentitySource>,
        gateway: Arc<dyn SubmissionGateway>,
    ) -> GuidedFormBuilder {
        GuidedFormBuilder {
            spec: spec.into(),
            identity,
            gateway,
            initial_data: FormState::new(),
            probe: None,
            attachments: Arc::new(FsAttachmentReader::new()),
            sink: None,
        }
    }

    pub fn spec(&self) -> &FormSpecification {
        &self.spec
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn phase(&self) -> FormPhase {
        self.lifecycle.phase()
    }

    pub fn lifecycle(&self) -> &FormLifecycle {
        &self.lifecycle
    }

    /// Reason of the last failed submission, while the form is `Failed`.
    pub fn failure(&self) -> Option<&str> {
        self.lifecycle.failure()
    }

    /// Errors from the last submit attempt, kept current for fields the
    /// resident edits afterwards.
    pub fn errors(&self) -> &ValidationResult {
        &self.errors
    }

    /// The identity the form was last seeded or re-seeded from.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current profile; the default until the probe resolves.
    pub fn profile(&self) -> EnvironmentProfile {
        self.profile
    }

    /// Check one field against the current state.
    pub fn validate_field(&self, key: &str) -> Option<String> {
        brgy_schema::validate_field(&self.spec, &self.state, key)
    }

    /// Set a field, resolve its dependents and notify the sink.
    ///
    /// Identity-locked fields reject edits, even when the identity is absent.
    /// Select values must be among the field's current options. An empty
    /// value unsets the field.
    pub fn set_field(&mut self, key: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.sync_identity();
        let spec = Arc::clone(&self.spec);
        let field = spec
            .field(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        if field.is_read_only() {
            return Err(FormError::ReadOnlyField(key.to_string()));
        }
        let value = value.into();
        check_value(&spec, &self.state, field, &value)?;
        self.lifecycle.edit()?;

        let mut next = self.state.clone();
        next.insert(field.key.clone(), value);
        self.state = on_field_change(&spec, &next, key);
        self.dirty.insert(field.key.clone());

        // Live re-validation for fields already flagged by a submit attempt,
        // including dependents the resolver may have cleared.
        let flagged: Vec<FieldKey> = self.errors.keys().cloned().collect();
        for flagged_key in flagged {
            let message = brgy_schema::validate_field(&spec, &self.state, flagged_key.as_str());
            self.errors.update(flagged_key, message);
        }

        tracing::debug!(document_kind = %spec.document_kind(), field = key, "field edited");
        self.notify();
        Ok(())
    }

    /// Re-read the identity if the source signalled a change. Returns
    /// whether an update was applied. Never applies during a submission.
    pub fn refresh_identity(&mut self) -> bool {
        self.sync_identity()
    }

    /// Apply a new identity: locked fields always follow it; defaulted
    /// fields follow it unless the resident edited them.
    pub fn on_identity_changed(&mut self, identity: Identity) -> Result<(), FormError> {
        if self.lifecycle.is_submitting() {
            return Err(brgy_state::LifecycleError::AlreadySubmitting.into());
        }
        self.apply_identity(identity);
        Ok(())
    }

    /// Discard edits and return to `Idle` with the most recent seed.
    pub fn cancel(&mut self) -> Result<(), FormError> {
        self.lifecycle.reset("cancelled")?;
        if let Some(identity) = self.take_identity_update() {
            self.identity = identity;
        }
        self.reseed();
        Ok(())
    }

    /// Fold in the probe result if it arrived, apply pending identity
    /// changes, and describe the form for drawing.
    pub fn render(&mut self) -> FormView {
        self.poll_probe();
        self.sync_identity();
        view::render(
            &self.spec,
            &self.state,
            &self.errors,
            self.profile,
            self.lifecycle.phase(),
            self.lifecycle.failure(),
        )
    }

    /// Wait for the probe to finish and apply its profile.
    pub async fn probe_settled(&mut self) -> EnvironmentProfile {
        if let Some(rx) = self.probe.take() {
            match rx.await {
                Ok(profile) => self.apply_profile(profile),
                Err(_) => tracing::debug!("environment probe ended without a result"),
            }
        }
        self.profile
    }

    /// Validate, encode, tag and submit.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.sync_identity();
        let kind = self.spec.document_kind();
        if self.lifecycle.is_submitting() {
            tracing::warn!(document_kind = %kind, "submit rejected: already submitting");
            return SubmitOutcome::Rejected;
        }

        let errors = validate(&self.spec, &self.state);
        if !errors.is_valid() {
            if let Err(e) = self.lifecycle.reject_invalid(errors.len()) {
                tracing::warn!(document_kind = %kind, "submit rejected: {e}");
                return SubmitOutcome::Rejected;
            }
            tracing::info!(document_kind = %kind, invalid = errors.len(), "submission blocked by validation");
            self.errors = errors.clone();
            return SubmitOutcome::Invalid(errors);
        }
        self.errors = ValidationResult::default();

        let flight = match InFlight::begin(&mut self.lifecycle) {
            Ok(flight) => flight,
            Err(e) => {
                tracing::warn!(document_kind = %kind, "submit rejected: {e}");
                return SubmitOutcome::Rejected;
            }
        };
        tracing::info!(document_kind = %kind, "submission started");

        let result = send(
            &self.spec,
            &self.state,
            self.attachments.as_ref(),
            self.gateway.as_ref(),
        )
        .await;

        match result {
            Ok(receipt) => {
                flight.succeed();
                tracing::info!(document_kind = %kind, status = receipt.status, "submission accepted");
                if let Err(e) = self.lifecycle.reset("fresh seed after success") {
                    tracing::warn!(document_kind = %kind, "could not reset after success: {e}");
                }
                if let Some(identity) = self.take_identity_update() {
                    self.identity = identity;
                }
                self.reseed();
                SubmitOutcome::Succeeded(receipt)
            }
            Err(reason) => {
                flight.fail(&reason);
                tracing::info!(document_kind = %kind, %reason, "submission failed");
                self.sync_identity();
                SubmitOutcome::Failed { reason }
            }
        }
    }

    fn reseed(&mut self) {
        self.state = initialize(&self.spec, &self.identity, &self.initial_data);
        self.dirty.clear();
        self.errors = ValidationResult::default();
        self.notify();
    }

    /// Pending identity, unless a submission is in flight.
    fn take_identity_update(&mut self) -> Option<Identity> {
        if self.lifecycle.is_submitting() || !self.subscription.has_changed() {
            return None;
        }
        self.subscription.mark_seen();
        Some(self.identity_source.read())
    }

    fn sync_identity(&mut self) -> bool {
        match self.take_identity_update() {
            Some(identity) => {
                self.apply_identity(identity);
                true
            }
            None => false,
        }
    }

    fn apply_identity(&mut self, identity: Identity) {
        let spec = Arc::clone(&self.spec);
        let mut next = self.state.clone();
        let mut touched = Vec::new();

        for field in spec.fields() {
            let Some(binding) = field.binding else {
                continue;
            };
            if !binding.is_locked() && self.dirty.contains(field.key.as_str()) {
                continue;
            }
            let changed = match identity.get(binding.attr()) {
                Some(value) => {
                    let value = FieldValue::Text(value.to_string());
                    next.insert(field.key.clone(), value.clone()).as_ref() != Some(&value)
                }
                None => next.remove(field.key.as_str()).is_some(),
            };
            if changed {
                touched.push(field.key.clone());
            }
        }
        for key in &touched {
            next = on_field_change(&spec, &next, key.as_str());
        }

        self.identity = identity;
        if next != self.state {
            tracing::debug!(document_kind = %spec.document_kind(), fields = touched.len(), "identity re-applied");
            self.state = next;
            self.notify();
        }
    }

    fn poll_probe(&mut self) {
        let Some(rx) = self.probe.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(profile) => {
                self.probe = None;
                self.apply_profile(profile);
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                self.probe = None;
                tracing::debug!("environment probe ended without a result");
            }
        }
    }

    fn apply_profile(&mut self, profile: EnvironmentProfile) {
        tracing::debug!(native_date_input = profile.use_native_date_input, "environment profile applied");
        self.profile = profile;
    }

    fn notify(&self) {
        if let Some(sink) = &self.sink {
            sink.state_changed(self.spec.document_kind(), &self.state);
        }
    }
}

/// Marks the lifecycle `Submitting` for its lifetime. If dropped without
/// being settled (the submit future was abandoned), it records a failure so
/// the form does not stay stuck in `Submitting`.
struct InFlight<'a> {
    lifecycle: &'a mut FormLifecycle,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn begin(lifecycle: &'a mut FormLifecycle) -> Result<Self, brgy_state::LifecycleError> {
        lifecycle.begin_submit()?;
        Ok(Self {
            lifecycle,
            settled: false,
        })
    }

    fn succeed(mut self) {
        self.settled = true;
        if let Err(e) = self.lifecycle.succeed() {
            tracing::warn!("lifecycle refused success: {e}");
        }
    }

    fn fail(mut self, reason: &str) {
        self.settled = true;
        if let Err(e) = self.lifecycle.fail(reason) {
            tracing::warn!("lifecycle refused failure: {e}");
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("submission dropped before it resolved");
            let _ = self.lifecycle.fail(ABANDONED);
        }
    }
}

/// Build the payload and hand it to the gateway. Errors are the reason
/// shown to the resident.
async fn send(
    spec: &FormSpecification,
    state: &FormState,
    reader: &dyn AttachmentReader,
    gateway: &dyn SubmissionGateway,
) -> Result<SubmissionReceipt, String> {
    let payload = build_payload(spec, state, reader).await.map_err(|e| {
        tracing::warn!(document_kind = %spec.document_kind(), "payload not built: {e}");
        format!("Could not prepare the submission: {e}")
    })?;
    gateway.submit(&payload).await.map_err(|e| {
        tracing::warn!(document_kind = %spec.document_kind(), status = ?e.status(), "gateway error: {e}");
        e.reason()
    })
}

/// Assemble the tagged payload: answered fields by key, file fields encoded
/// into `evidence` in declaration order. No files gives an empty list.
pub async fn build_payload(
    spec: &FormSpecification,
    state: &FormState,
    reader: &dyn AttachmentReader,
) -> Result<SubmissionPayload, PayloadError> {
    let mut fields = BTreeMap::new();
    let mut evidence = Vec::new();
    for field in spec.fields() {
        match state.get(field.key.as_str()) {
            None => {}
            // Sent exactly as validated: surrounding whitespace dropped,
            // blank text omitted.
            Some(FieldValue::Text(text)) => {
                let text = text.trim();
                if !text.is_empty() {
                    fields.insert(field.key.clone(), PayloadValue::Text(text.to_string()));
                }
            }
            Some(FieldValue::List(items)) => {
                fields.insert(field.key.clone(), PayloadValue::List(items.clone()));
            }
            Some(FieldValue::Files(handles)) => {
                evidence.extend(encode_attachments(reader, handles).await?);
            }
        }
    }
    Ok(SubmissionPayload::new(spec.document_kind(), fields, evidence)?)
}

/// Reject values of the wrong shape and select values outside the current
/// options.
fn check_value(
    spec: &FormSpecification,
    state: &FormState,
    field: &FieldDescriptor,
    value: &FieldValue,
) -> Result<(), FormError> {
    let wrong_kind = || FormError::WrongValueKind {
        field: field.key.to_string(),
        kind: field.kind,
    };
    let not_an_option = |value: &str| FormError::NotAnOption {
        field: field.key.to_string(),
        value: value.to_string(),
    };
    let allowed = || allowed_values(spec, field.key.as_str(), state);

    match (field.kind, value) {
        (FieldKind::Files, FieldValue::Files(_)) => Ok(()),
        (FieldKind::Files, _) | (_, FieldValue::Files(_)) => Err(wrong_kind()),
        (FieldKind::MultiSelect, FieldValue::List(items)) => {
            let allowed = allowed();
            match items.iter().find(|item| !allowed.permits(item)) {
                Some(item) => Err(not_an_option(item)),
                None => Ok(()),
            }
        }
        (FieldKind::MultiSelect, FieldValue::Text(text)) if text.is_empty() => Ok(()),
        (FieldKind::MultiSelect, _) | (_, FieldValue::List(_)) => Err(wrong_kind()),
        (FieldKind::Select, FieldValue::Text(text)) if !text.is_empty() => {
            if allowed().permits(text) {
                Ok(())
            } else {
                Err(not_an_option(text))
            }
        }
        _ => Ok(()),
    }
}

/// Start the probe on the current runtime. Without a runtime the default
/// profile stays in effect.
fn spawn_probe(
    probe: Option<Arc<dyn EnvironmentProbe>>,
) -> Option<oneshot::Receiver<EnvironmentProfile>> {
    let probe = probe?;
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let (tx, rx) = oneshot::channel();
            handle.spawn(async move {
                let profile = probe.detect().await;
                // The form may be gone already; nothing to do then.
                let _ = tx.send(profile);
            });
            Some(rx)
        }
        Err(_) => {
            tracing::warn!("no async runtime; skipping environment probe");
            None
        }
    }
}
