//! Timing: how long a track plays before the fade and where the fade sits.
//!
//! ```text
//! intro ─┬─ loop body × (loops + 1) ─┬─ fade delay ─┬─ fade ─┬─ 0.5 s pad
//!        0                      main length     fade start  fade end  truncate
//! ```

mod duration;
mod header;
mod loop_policy;
mod planner;

pub use duration::{
    compressed_main_length, resolve_main_length, resolve_probe_path, split_main_length,
    tracker_main_length, FRAMES_PER_MS, SAMPLE_RATE, SAMPLE_RATE_HZ,
};
pub use header::{read_header, OrgVersion, TrackHeader, HEADER_LEN};
pub use loop_policy::{effective_loop_count, LoopOp, LoopOverride, LoopPlan};
pub use planner::{format_seconds, TimingPlan, TRUNCATION_PAD_SECS};
