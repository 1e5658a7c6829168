//! Declarative reconciliation of fraud detectors.
//!
//! [`DetectorReconciler`] takes a desired [`fdsync_core::Detector`] model and
//! drives the remote store toward it: dependency resolution, diffing,
//! rule re-versioning, detector version lifecycle, orphan collection and
//! finally rehydration of the resulting model.

mod context;
pub mod diff;
pub mod engine;
pub mod error;
mod gc;
mod models;
pub mod rehydrate;
mod resolver;
mod rules;
mod versions;

pub use engine::{DetectorReconciler, UpdateReport};
pub use error::{ReconcileError, Result};
pub use gc::SweepReport;
pub use rehydrate::ReferenceSet;
