//! Core types for the batch orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{CollectionKind, CollectionSettings, ConversionSettings, ToolSettings};
use crate::pipeline::{PipelineRunner, ProcessRegistry};
use crate::tools::Prober;

/// One source collection with its paths resolved.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    /// Label prefixed to this collection's log lines.
    pub name: String,
    pub kind: CollectionKind,
    pub source_dir: PathBuf,
    pub metadata: Option<PathBuf>,
    pub probe_dir: Option<PathBuf>,
    /// Where this collection's outputs are written.
    pub output_dir: PathBuf,
    /// Source file extension, without the dot.
    pub extension: String,
}

impl CollectionSpec {
    /// Resolve a configured collection beneath `output_root`.
    pub fn from_settings(settings: &CollectionSettings, output_root: &Path) -> Self {
        Self {
            name: settings.name.clone(),
            kind: settings.kind,
            source_dir: PathBuf::from(&settings.source_dir),
            metadata: settings.metadata.as_ref().map(PathBuf::from),
            probe_dir: settings.probe_dir.as_ref().map(PathBuf::from),
            output_dir: output_root.join(&settings.output_subdir),
            extension: settings.extension().to_string(),
        }
    }

    /// Prefix for log lines, e.g. `2 - New |`.
    pub fn label(&self) -> String {
        format!("{} |", self.name)
    }
}

/// Loop, fade and output options for a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    pub loop_count: u32,
    pub fade_delay: f64,
    pub fade_duration: f64,
    pub output_extension: String,
    pub cover_art: Option<PathBuf>,
    pub decoder_repeat_headroom: u32,
}

impl From<&ConversionSettings> for ConversionOptions {
    fn from(settings: &ConversionSettings) -> Self {
        Self {
            loop_count: settings.loop_count,
            fade_delay: settings.fade_delay,
            fade_duration: settings.fade_duration,
            output_extension: settings.output_extension.clone(),
            cover_art: settings.cover_art.as_ref().map(PathBuf::from),
            decoder_repeat_headroom: settings.decoder_repeat_headroom,
        }
    }
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::from(&ConversionSettings::default())
    }
}

/// Read-only state shared by every track of a batch.
#[derive(Debug)]
pub struct BatchContext {
    pub options: ConversionOptions,
    pub tools: ToolSettings,
    registry: Arc<ProcessRegistry>,
    prober: Prober,
    runner: PipelineRunner,
}

impl BatchContext {
    /// Create a context whose processes are all tracked by `registry`.
    pub fn new(
        options: ConversionOptions,
        tools: ToolSettings,
        registry: Arc<ProcessRegistry>,
    ) -> Self {
        let prober = Prober::new(tools.prober.clone(), Arc::clone(&registry));
        let runner = PipelineRunner::new(Arc::clone(&registry))
            .inherit_encoder_stderr(tools.inherit_encoder_stderr);
        Self {
            options,
            tools,
            registry,
            prober,
            runner,
        }
    }

    /// Registry of every process this batch starts.
    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    pub fn prober(&self) -> &Prober {
        &self.prober
    }

    pub fn runner(&self) -> &PipelineRunner {
        &self.runner
    }
}
