//! Error types for track conversion.
//!
//! Errors carry enough context to print a single failure line per track:
//! Collection → Track → Stage → Detail

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Side of a conversion pipeline that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Tracker-binary to PCM decoder.
    Decoder,
    /// Encoder/muxer writing the final file.
    Encoder,
    /// Duration prober.
    Prober,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Decoder => write!(f, "decoder"),
            Stage::Encoder => write!(f, "encoder"),
            Stage::Prober => write!(f, "prober"),
        }
    }
}

/// Error raised while discovering or converting tracks.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The tracker file does not start with a recognised version tag.
    #[error("Invalid magic number {magic:?} in {}", .path.display())]
    InvalidFormat { path: PathBuf, magic: String },

    /// Opening or reading a file failed.
    #[error("Failed to {operation} {} (code: {}): {source}", .path.display(), io_code(.source))]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The duration prober failed or returned something unusable.
    #[error("Failed to probe {}: {message}", .path.display())]
    ProbeFailed { path: PathBuf, message: String },

    /// A split intro/loop file has no partner.
    #[error("Song {} does not have a {expected} counterpart", .file.display())]
    MissingCounterpart { file: PathBuf, expected: String },

    /// An external process could not be started.
    #[error("Failed to spawn {stage} '{program}': {source}")]
    SpawnFailed {
        stage: Stage,
        program: String,
        #[source]
        source: io::Error,
    },

    /// An external process exited unsuccessfully.
    #[error("{stage} exited with {}", describe_exit(.code))]
    ExitFailed { stage: Stage, code: Option<i32> },

    /// The batch was interrupted before this track finished.
    #[error("Interrupted")]
    Interrupted,

    /// A collection metadata file could not be understood.
    #[error("Invalid metadata file {}: {message}", .path.display())]
    Metadata { path: PathBuf, message: String },

    /// The output directory exists and overwriting was not requested.
    #[error("Refusing to overwrite output directory {} without the force flag", .path.display())]
    OutputExists { path: PathBuf },
}

fn io_code(err: &io::Error) -> String {
    match err.raw_os_error() {
        Some(code) => format!("{:?}/{}", err.kind(), code),
        None => format!("{:?}", err.kind()),
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ConversionError {
    /// Create an I/O error with the operation and file it concerns.
    pub fn io(operation: impl Into<String>, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a probe failure.
    pub fn probe_failed(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create a spawn failure.
    pub fn spawn_failed(stage: Stage, program: impl Into<String>, source: io::Error) -> Self {
        Self::SpawnFailed {
            stage,
            program: program.into(),
            source,
        }
    }

    /// Create an exit failure.
    pub fn exit_failed(stage: Stage, code: Option<i32>) -> Self {
        Self::ExitFailed { stage, code }
    }

    /// Create a metadata file error.
    pub fn metadata(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Metadata {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether this error stems from the batch-wide interrupt.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ConversionError::Interrupted)
    }
}

/// Result type for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;
