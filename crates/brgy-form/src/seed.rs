//! # Seeding
//!
//! The initial state of a form: identity-locked fields from the identity,
//! other declared fields from the caller's initial data, identity-defaulted
//! fields from the identity where the initial data leaves them unset. The
//! result is normalized by the resolver, so it is a valid starting point
//! for dependent selects.

use brgy_core::{FieldValue, FormState, Identity};
use brgy_schema::{resolve_all, FormSpecification, IdentityBinding};

/// Compute the seed state. Pure: equal inputs give equal seeds, and seeding
/// from a seed reproduces it.
pub fn initialize(spec: &FormSpecification, identity: &Identity, initial_data: &FormState) -> FormState {
    let mut state = FormState::new();
    for field in spec.fields() {
        let from_initial = initial_data.get(field.key.as_str()).cloned();
        let from_identity = || {
            field
                .binding
                .and_then(|b| identity.get(b.attr()))
                .map(|v| FieldValue::Text(v.to_string()))
        };
        let value = match field.binding {
            Some(IdentityBinding::Locked(_)) => from_identity(),
            Some(IdentityBinding::Defaulted(_)) => from_initial.or_else(from_identity),
            None => from_initial,
        };
        if let Some(value) = value {
            state.insert(field.key.clone(), value);
        }
    }
    resolve_all(spec, &state)
}
