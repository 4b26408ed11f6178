//! Asynchronous lifecycle management for reconstruction jobs.
//!
//! [`JobManager`] accepts submissions, hands them to a [`Reconstructor`]
//! through the bounded worker pool in [`dispatcher`], and applies the single
//! terminal transition when the work finishes.

pub mod dispatcher;
pub mod error;
pub mod locks;
pub mod manager;
pub mod reconstruct;
pub mod sample;

pub use error::PipelineError;
pub use manager::{CompletionResult, JobManager, ManagerConfig, RecordWriteRetry};
pub use reconstruct::{Outcome, ReconstructionError, Reconstructor};
pub use sample::SampleReconstructor;
