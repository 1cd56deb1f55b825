//! Duration probing using `ffprobe -show_format`.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncReadExt;

use super::command::ToolCommand;
use crate::errors::{ConversionError, ConversionResult, Stage};
use crate::pipeline::{ProcessRegistry, TerminationCause};

/// Runs the configured prober to read a file's unlooped duration.
#[derive(Debug, Clone)]
pub struct Prober {
    command: ToolCommand,
    registry: Arc<ProcessRegistry>,
}

impl Prober {
    pub fn new(command: ToolCommand, registry: Arc<ProcessRegistry>) -> Self {
        Self { command, registry }
    }

    /// Probe the duration of `path` in seconds.
    pub async fn probe(&self, path: &Path) -> ConversionResult<f64> {
        let args = [
            OsString::from(path),
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
        ];
        let command = self.command.invoke(Stage::Prober, args);

        let mut child = self.registry.spawn(&command, |cmd| {
            cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        })?;
        let mut stdout = child
            .take_stdout()
            .ok_or_else(|| ConversionError::probe_failed(path, "prober stdout was not captured"))?;

        let mut output = Vec::new();
        let (read, exit) = tokio::join!(stdout.read_to_end(&mut output), child.wait());
        let exit = exit?;

        if exit.cause == Some(TerminationCause::Interrupt) {
            return Err(ConversionError::Interrupted);
        }
        if !exit.success() {
            return Err(ConversionError::probe_failed(
                path,
                format!("prober exited with {:?}", exit.code),
            ));
        }
        read.map_err(|e| ConversionError::io("read prober output for", path, e))?;

        let duration = parse_probe_output(path, &output)?;
        tracing::debug!("{}: {:.3}s unlooped", path.display(), duration);
        Ok(duration)
    }
}

/// Extract `format.duration` from the prober's JSON output.
///
/// The duration may be a JSON string or number.
pub fn parse_probe_output(path: &Path, output: &[u8]) -> ConversionResult<f64> {
    let json: Value = serde_json::from_slice(output)
        .map_err(|e| ConversionError::probe_failed(path, format!("invalid JSON: {}", e)))?;

    let duration = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .ok_or_else(|| ConversionError::probe_failed(path, "no format.duration in output"))?;

    let seconds = match duration {
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => Ok(s),
        _ => Err(ConversionError::probe_failed(
            path,
            format!("duration {} is not a number", duration),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_string_is_parsed() {
        let out = br#"{"format":{"filename":"a.ogg","duration":"92.473469"}}"#;
        let secs = parse_probe_output(Path::new("a.ogg"), out).unwrap();
        assert!((secs - 92.473469).abs() < 1e-9);
    }

    #[test]
    fn duration_number_is_parsed() {
        let secs = parse_probe_output(Path::new("a.ogg"), br#"{"format":{"duration":12}}"#).unwrap();
        assert_eq!(secs, 12.0);
    }

    #[test]
    fn missing_or_bad_duration_fails() {
        for out in [
            &br#"{"format":{}}"#[..],
            br#"{"format":{"duration":"N/A"}}"#,
            br#"{}"#,
            b"",
        ] {
            let err = parse_probe_output(Path::new("a.ogg"), out).unwrap_err();
            assert!(matches!(err, ConversionError::ProbeFailed { .. }));
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probes_through_configured_tool() {
        let registry = Arc::new(ProcessRegistry::new());
        let tool = ToolCommand::new("sh").with_args([
            "-c",
            r#"echo '{"format":{"duration":"7.25"}}'"#,
            "fake-ffprobe",
        ]);
        let prober = Prober::new(tool, registry);
        let secs = prober.probe(Path::new("/music/a.ogg")).await.unwrap();
        assert_eq!(secs, 7.25);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_prober_is_probe_failure() {
        let registry = Arc::new(ProcessRegistry::new());
        let tool = ToolCommand::new("sh").with_args(["-c", "exit 1", "fake-ffprobe"]);
        let prober = Prober::new(tool, registry);
        let err = prober.probe(Path::new("/music/a.ogg")).await.unwrap_err();
        assert!(matches!(err, ConversionError::ProbeFailed { .. }));
    }
}
