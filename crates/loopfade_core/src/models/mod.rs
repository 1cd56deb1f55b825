//! Data models shared across discovery, planning and execution.

mod enums;
mod outcome;
mod track;

pub use enums::{SourceKind, SplitPart};
pub use outcome::{ConversionOutcome, OutcomeStatus};
pub use track::{SourceFile, TrackDescriptor, TrackSources};
