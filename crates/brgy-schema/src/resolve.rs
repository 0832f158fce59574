//! # Derived-Field Resolver
//!
//! When a driving field changes, dependents whose value is no longer in
//! their allowed set are cleared, and the clearing cascades to their own
//! dependents. Since `depends_on` always points backwards, one pass in
//! declaration order reaches the fixed point.

use std::collections::BTreeSet;

use brgy_core::{FieldValue, FormState};

use crate::options::{allowed_values, AllowedValues};
use crate::spec::{FieldDescriptor, FormSpecification};

/// Resolve dependents of `changed` after it was edited.
///
/// Returns the new state; calling it again on the result returns the same
/// state.
pub fn on_field_change(spec: &FormSpecification, state: &FormState, changed: &str) -> FormState {
    let mut next = state.clone();
    let mut dirty: BTreeSet<&str> = BTreeSet::new();
    dirty.insert(changed);

    for field in spec.fields() {
        let Some(driver) = &field.depends_on else {
            continue;
        };
        if !dirty.contains(driver.as_str()) {
            continue;
        }
        if prune(spec, field, &mut next) {
            tracing::debug!(
                field = %field.key,
                driver = %driver,
                "cleared dependent field no longer allowed"
            );
            dirty.insert(field.key.as_str());
        }
    }
    next
}

/// Normalize a whole state: drop keys the specification does not declare
/// and clear every select value outside its allowed set.
pub fn resolve_all(spec: &FormSpecification, state: &FormState) -> FormState {
    let mut next: FormState = state
        .iter()
        .filter(|(key, _)| spec.field(key.as_str()).is_some())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for field in spec.fields() {
        prune(spec, field, &mut next);
    }
    next
}

/// Drop disallowed values of one field. Returns whether the value changed.
fn prune(spec: &FormSpecification, field: &FieldDescriptor, state: &mut FormState) -> bool {
    let allowed = allowed_values(spec, field.key.as_str(), state);
    if allowed == AllowedValues::Unrestricted {
        return false;
    }
    let replacement = match state.get(field.key.as_str()) {
        None => return false,
        Some(FieldValue::Text(value)) if allowed.permits(value) => return false,
        Some(FieldValue::List(items)) => {
            let kept: Vec<String> = items.iter().filter(|v| allowed.permits(v)).cloned().collect();
            if kept.len() == items.len() {
                return false;
            }
            FieldValue::List(kept)
        }
        // Disallowed text, or a value of the wrong shape for a select.
        Some(_) => FieldValue::Text(String::new()),
    };
    state.insert(field.key.clone(), replacement);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FieldSpec;
    use brgy_core::{DocumentKind, FieldKey};
    use proptest::prelude::*;

    fn key(s: &str) -> FieldKey {
        FieldKey::new(s).unwrap()
    }

    /// region → province → town, plus an unrelated text field.
    fn chained() -> FormSpecification {
        FormSpecification::builder(DocumentKind::IncidentReport)
            .field(FieldSpec::select("region", "Region", ["North", "South"]))
            .field(FieldSpec::dependent_select(
                "province",
                "Province",
                "region",
                [("North", vec!["Ilocos", "Benguet"]), ("South", vec!["Cebu"])],
            ))
            .field(FieldSpec::dependent_select(
                "town",
                "Town",
                "province",
                [
                    ("Ilocos", vec!["Vigan"]),
                    ("Benguet", vec!["Baguio"]),
                    ("Cebu", vec!["Moalboal"]),
                ],
            ))
            .field(FieldSpec::text("notes", "Notes"))
            .build()
            .unwrap()
    }

    fn state(pairs: &[(&str, &str)]) -> FormState {
        pairs.iter().map(|(k, v)| (key(k), FieldValue::from(*v))).collect()
    }

    #[test]
    fn changing_driver_clears_disallowed_dependent() {
        let spec = chained();
        let before = state(&[("region", "South"), ("province", "Ilocos"), ("notes", "x")]);
        let after = on_field_change(&spec, &before, "region");
        assert!(!after.contains("province"));
        assert_eq!(after.text("region"), Some("South"));
        assert_eq!(after.text("notes"), Some("x"));
    }

    #[test]
    fn clearing_cascades_transitively() {
        let spec = chained();
        let before = state(&[
            ("region", "South"),
            ("province", "Ilocos"),
            ("town", "Vigan"),
        ]);
        let after = on_field_change(&spec, &before, "region");
        assert!(!after.contains("province"));
        assert!(!after.contains("town"));
    }

    #[test]
    fn allowed_dependent_is_kept() {
        let spec = chained();
        let before = state(&[("region", "North"), ("province", "Benguet"), ("town", "Baguio")]);
        let after = on_field_change(&spec, &before, "region");
        assert_eq!(after, before);
    }

    #[test]
    fn unrelated_change_touches_nothing() {
        let spec = chained();
        let before = state(&[("region", "South"), ("province", "Ilocos")]);
        assert_eq!(on_field_change(&spec, &before, "notes"), before);
    }

    #[test]
    fn resolve_all_drops_undeclared_and_disallowed() {
        let spec = chained();
        let before = state(&[("region", "West"), ("province", "Cebu"), ("stray", "x")]);
        let after = resolve_all(&spec, &before);
        assert!(after.is_empty());
    }

    #[test]
    fn multiselect_keeps_permitted_items() {
        let spec = FormSpecification::builder(DocumentKind::Cedula)
            .field(FieldSpec::multiselect("ids", "IDs", ["Passport", "UMID"]))
            .build()
            .unwrap();
        let mut before = FormState::new();
        before.insert(
            key("ids"),
            FieldValue::List(vec!["Passport".into(), "Library Card".into()]),
        );
        let after = resolve_all(&spec, &before);
        assert_eq!(after.get("ids"), Some(&FieldValue::List(vec!["Passport".into()])));
    }

    fn arb_state() -> impl Strategy<Value = FormState> {
        let region = prop::option::of(prop::sample::select(vec!["North", "South", "West"]));
        let province = prop::option::of(prop::sample::select(vec!["Ilocos", "Benguet", "Cebu"]));
        let town = prop::option::of(prop::sample::select(vec!["Vigan", "Baguio", "Moalboal"]));
        (region, province, town).prop_map(|(r, p, t)| {
            let mut s = FormState::new();
            for (k, v) in [("region", r), ("province", p), ("town", t)] {
                if let Some(v) = v {
                    s.insert(key(k), v.into());
                }
            }
            s
        })
    }

    proptest! {
        #[test]
        fn on_field_change_is_idempotent(s in arb_state(), changed in prop::sample::select(vec!["region", "province", "town", "notes"])) {
            let spec = chained();
            let once = on_field_change(&spec, &s, changed);
            let twice = on_field_change(&spec, &once, changed);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn resolve_all_reaches_fixed_point(s in arb_state()) {
            let spec = chained();
            let once = resolve_all(&spec, &s);
            prop_assert_eq!(resolve_all(&spec, &once), once.clone());
            for k in ["province", "town"] {
                if let Some(v) = once.text(k) {
                    prop_assert!(allowed_values(&spec, k, &once).permits(v));
                }
            }
        }
    }
}
