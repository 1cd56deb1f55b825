//! Process management for track conversions.
//!
//! [`ProcessRegistry`] tracks every live child so a batch-wide interrupt
//! reaches all of them; [`PipelineRunner`] wires the decoder and encoder
//! of a single track together.

mod registry;
mod runner;

pub use registry::{ProcessHandle, ProcessRegistry, StageExit, TerminationCause, TrackedChild};
pub use runner::{settle, PipelineRunner, PipelineShape, PipelineState};
