//! Track descriptors built during discovery.

use std::path::{Path, PathBuf};

use super::enums::SourceKind;
use crate::metadata::TrackConfig;

/// A compressed source file with an optional probe substitute.
///
/// The substitute is only a candidate path; whether it exists is checked
/// when the duration is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// File that is actually encoded.
    pub path: PathBuf,
    /// Same-named file in the probe directory, if one was configured.
    pub probe_override: Option<PathBuf>,
}

impl SourceFile {
    /// Create a source file, deriving the probe candidate from `probe_dir`.
    pub fn new(path: PathBuf, probe_dir: Option<&Path>) -> Self {
        let probe_override = match (probe_dir, path.file_name()) {
            (Some(dir), Some(name)) => Some(dir.join(name)),
            _ => None,
        };
        Self {
            path,
            probe_override,
        }
    }
}

/// Source files of one logical song.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackSources {
    /// Tracker binary decoded to PCM.
    Tracker(PathBuf),
    /// One compressed file looping as a whole.
    Single(SourceFile),
    /// Intro played once, then the loop body repeated.
    Split { intro: SourceFile, body: SourceFile },
}

/// One logical song, immutable after discovery.
#[derive(Debug, Clone)]
pub struct TrackDescriptor {
    /// Name used for output and metadata lookup (no extension, no part suffix).
    pub base_name: String,
    /// Where the audio comes from.
    pub sources: TrackSources,
    /// Per-track tags and loop override.
    pub config: TrackConfig,
}

impl TrackDescriptor {
    /// Create a descriptor.
    pub fn new(base_name: impl Into<String>, sources: TrackSources, config: TrackConfig) -> Self {
        Self {
            base_name: base_name.into(),
            sources,
            config,
        }
    }

    /// Source kind derived from the sources.
    pub fn kind(&self) -> SourceKind {
        match self.sources {
            TrackSources::Tracker(_) => SourceKind::TrackerBinary,
            TrackSources::Single(_) => SourceKind::SingleCompressed,
            TrackSources::Split { .. } => SourceKind::SplitIntroLoop,
        }
    }

    /// Human-readable identifier for log lines.
    ///
    /// Split pairs are shown as `song_intro.ogg & song_loop.ogg`.
    pub fn display_name(&self) -> String {
        fn name_of(path: &Path) -> String {
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string())
        }

        match &self.sources {
            TrackSources::Tracker(path) => name_of(path),
            TrackSources::Single(file) => name_of(&file.path),
            TrackSources::Split { intro, body } => {
                format!("{} & {}", name_of(&intro.path), name_of(&body.path))
            }
        }
    }

    /// Key used to look the track up in a metadata file.
    pub fn metadata_key(&self) -> String {
        self.base_name.to_lowercase()
    }

    /// Output path inside `out_dir` with the given extension.
    pub fn output_path(&self, out_dir: &Path, extension: &str) -> PathBuf {
        out_dir.join(format!("{}.{}", self.base_name, extension))
    }
}
