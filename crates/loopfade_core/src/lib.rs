//! loopfade core - conversion logic for looping game music
//!
//! This crate contains the per-track conversion pipeline and the batch
//! orchestrator with zero front-end dependencies. It can be driven by the
//! bundled CLI or embedded in another tool.
//!
//! # Layout
//!
//! ```text
//! orchestrator   discovery + concurrent batch execution
//!     ├── timing      header parsing, loop policy, fade planning
//!     ├── metadata    metadata files and tag merging
//!     ├── tools       decoder / encoder / prober command lines
//!     └── pipeline    process registry and per-track runner
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod orchestrator;
pub mod pipeline;
pub mod timing;
pub mod tools;

pub use errors::{ConversionError, ConversionResult, Stage};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
