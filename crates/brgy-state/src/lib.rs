//! # brgy-state — Form Lifecycle State Machine
//!
//! A guided form moves through:
//!
//! ```text
//! Idle ──edit──▶ Editing ──submit──▶ Submitting ──▶ Succeeded ──reset──▶ Idle
//!   │                ▲                    │
//!   └────submit──────┼────────────────────┤
//!                    │                    ▼
//!                    └──────edit────── Failed(reason)
//! ```
//!
//! Transitions are runtime-checked: the controller drives the machine from
//! user events and asynchronous results, so the current phase is only known
//! at runtime. Every accepted transition is appended to the lifecycle's
//! transition log.

pub mod lifecycle;

pub use lifecycle::{FormLifecycle, FormPhase, LifecycleError, TransitionRecord};
