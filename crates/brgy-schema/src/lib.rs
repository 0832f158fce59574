//! # brgy-schema — Form Specifications and Validation
//!
//! A [`FormSpecification`] is an ordered list of field descriptors for one
//! document kind. This crate compiles those descriptors into:
//!
//! - [`validate()`] — a pure function from (spec, state) to per-field errors;
//! - [`allowed_values()`] — the current option set of a select field, which
//!   may depend on another field's value (category → sub-category);
//! - [`on_field_change()`] — the resolver that clears dependent fields whose
//!   value stopped being allowed.
//!
//! The [`catalog`] module holds the three built-in forms.
//!
//! ## Structural Invariants
//!
//! Enforced by [`FormSpecBuilder::build()`]:
//!
//! - Field keys are unique within a specification.
//! - `depends_on` names a field declared *earlier* (so no cycles, and one
//!   forward pass of the resolver reaches a fixed point).
//! - Select fields declare their options; keyed options require `depends_on`.
//! - `documentKind` is never a field key; `evidence` only for file inputs.

pub mod catalog;
pub mod options;
pub mod resolve;
pub mod spec;
pub mod validate;

pub use options::{allowed_values, AllowedValues};
pub use resolve::{on_field_change, resolve_all};
pub use spec::{
    Constraints, DateBound, FieldDescriptor, FieldKind, FieldSpec, FormSpecBuilder,
    FormSpecification, IdentityBinding, OptionSource, Pattern, SpecError,
};
pub use validate::{validate, validate_field, validate_on, ValidationResult};
