//! Acquisition engine with fallback cascade.
//!
//! Turns a URL, an output selection and a strategy profile into a set of
//! local files. When both video and audio are wanted, the two primary
//! downloads run concurrently and their outcomes are reconciled:
//!
//! | video | audio | action                                           |
//! |-------|-------|--------------------------------------------------|
//! | ok    | ok    | done                                             |
//! | ok    | fail  | transcode audio from the video                   |
//! | fail  | ok    | retry the video once                             |
//! | fail  | fail  | one emergency video attempt, then transcode      |
//!
//! Every attempt uses a fresh output stem so retries never collide with
//! partial files from earlier attempts.

mod attempt;
mod engine;
mod error;
mod types;

pub use attempt::AttemptIds;
pub use engine::{AcquisitionEngine, NoopReporter, ProgressReporter};
pub use error::AcquisitionError;
pub use types::{reconcile, AcquiredAssets, AttemptBranch, OutputSelection, Reconciliation};
