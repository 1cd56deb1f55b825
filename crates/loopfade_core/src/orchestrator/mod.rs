//! Batch orchestration.
//!
//! # Architecture
//!
//! ```text
//! BatchOrchestrator
//!     ├── Collection: discover tracks (pair split files, attach metadata)
//!     │     ├── Track: loop policy → main length → fade plan → tags
//!     │     │          → PipelineRunner
//!     │     └── ...
//!     └── Collection: ...
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use loopfade_core::config::Settings;
//! use loopfade_core::orchestrator::{
//!     BatchContext, BatchOrchestrator, CollectionSpec, ConversionOptions,
//! };
//! use loopfade_core::pipeline::ProcessRegistry;
//!
//! # async fn run() {
//! let settings = Settings::default();
//! let registry = Arc::new(ProcessRegistry::new());
//! let ctx = BatchContext::new(
//!     ConversionOptions::from(&settings.conversion),
//!     settings.tools.clone(),
//!     registry,
//! );
//!
//! let collections = settings
//!     .collections
//!     .iter()
//!     .map(|c| CollectionSpec::from_settings(c, Path::new("flac-output")))
//!     .collect();
//! let report = BatchOrchestrator::new(ctx).run(collections).await;
//! println!("{} failed", report.failed_tracks().len());
//! # }
//! ```

mod batch;
mod discovery;
mod output;
mod track;
mod types;

pub use batch::{BatchOrchestrator, BatchReport, CollectionReport};
pub use discovery::{discover_tracks, list_sources};
pub use output::{describe_plan, ordinal_suffix, prepare_output_dir};
pub use track::{build_shape, convert_track, plan_track, TrackJob};
pub use types::{BatchContext, CollectionSpec, ConversionOptions};
