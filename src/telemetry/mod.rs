//! Dialogue telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. It is never read by the
//! dialogue loop or by a policy.
//!
//! # PRIVACY INVARIANT
//! Events never contain user content (utterances, parameter values, result
//! values). Only kinds, acts, counts and flags.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{QueueItemKind, TelemetryEvent};
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
