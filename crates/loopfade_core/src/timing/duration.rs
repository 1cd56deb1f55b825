//! Unlooped and looped track lengths.

use std::path::PathBuf;

use super::header::{read_header, TrackHeader};
use crate::errors::ConversionResult;
use crate::models::{SourceFile, TrackSources};
use crate::tools::Prober;

/// Sample rate of the decoder's PCM output in hertz.
pub const SAMPLE_RATE_HZ: u32 = 44_100;

/// [`SAMPLE_RATE_HZ`] for length arithmetic.
pub const SAMPLE_RATE: f64 = SAMPLE_RATE_HZ as f64;

/// PCM frames per millisecond at [`SAMPLE_RATE`].
pub const FRAMES_PER_MS: f64 = SAMPLE_RATE / 1000.0;

/// Seconds a tracker song plays before the fade delay starts.
///
/// The intro (`loop_start_tick` ticks) plays once, then the loop body
/// plays `loop_count + 1` times.
pub fn tracker_main_length(header: &TrackHeader, loop_count: u32) -> f64 {
    let frames_per_tick = FRAMES_PER_MS * f64::from(header.tick_duration_ms);
    let total_ticks = f64::from(header.loop_start_tick)
        + header.loop_ticks() as f64 * (f64::from(loop_count) + 1.0);
    frames_per_tick * total_ticks / SAMPLE_RATE
}

/// Main length of a single compressed file that loops as a whole.
pub fn compressed_main_length(unlooped: f64, loop_count: u32) -> f64 {
    unlooped * (1.0 + f64::from(loop_count))
}

/// Main length of a split pair: the intro once, then the body `loop_count` times.
pub fn split_main_length(intro: f64, body: f64, loop_count: u32) -> f64 {
    intro + body * f64::from(loop_count)
}

/// Pick the file to probe for a compressed source.
///
/// A same-named file in the probe directory is used when it exists;
/// otherwise the source itself is probed.
pub async fn resolve_probe_path(source: &SourceFile, label: &str) -> PathBuf {
    let Some(candidate) = &source.probe_override else {
        return source.path.clone();
    };

    match tokio::fs::try_exists(candidate).await {
        Ok(true) => {
            tracing::info!(
                "{} Probing {} in place of {}",
                label,
                candidate.display(),
                source.path.display()
            );
            candidate.clone()
        }
        _ => {
            tracing::warn!(
                "{} {} did not have a probe version, delegating to source file",
                label,
                source.path.display()
            );
            source.path.clone()
        }
    }
}

/// Resolve the main length of a track for the given loop count.
pub async fn resolve_main_length(
    sources: &TrackSources,
    loop_count: u32,
    prober: &Prober,
    label: &str,
) -> ConversionResult<f64> {
    match sources {
        TrackSources::Tracker(path) => {
            let header = read_header(path).await?;
            tracing::debug!(
                "{} {}: tick={}ms loop={}..{}",
                label,
                path.display(),
                header.tick_duration_ms,
                header.loop_start_tick,
                header.loop_end_tick
            );
            Ok(tracker_main_length(&header, loop_count))
        }
        TrackSources::Single(file) => {
            let unlooped = prober.probe(&resolve_probe_path(file, label).await).await?;
            Ok(compressed_main_length(unlooped, loop_count))
        }
        TrackSources::Split { intro, body } => {
            let intro_path = resolve_probe_path(intro, label).await;
            let body_path = resolve_probe_path(body, label).await;
            let (intro_len, body_len) =
                tokio::try_join!(prober.probe(&intro_path), prober.probe(&body_path))?;
            Ok(split_main_length(intro_len, body_len, loop_count))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogCapture;
    use crate::timing::OrgVersion;
    use std::path::Path;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn tracker_length_follows_tick_arithmetic() {
        let header = TrackHeader {
            version: OrgVersion::V2,
            tick_duration_ms: 120,
            loop_start_tick: 1000,
            loop_end_tick: 5000,
        };
        // 5292 frames per tick * 9000 ticks / 44100
        assert!(approx(tracker_main_length(&header, 1), 1080.0));
        // intro + one pass of the body
        assert!(approx(tracker_main_length(&header, 0), 0.12 * 5000.0));
    }

    #[test]
    fn tracker_length_grows_with_loops() {
        let header = TrackHeader {
            version: OrgVersion::V1,
            tick_duration_ms: 100,
            loop_start_tick: 0,
            loop_end_tick: 10,
        };
        let mut previous = 0.0;
        for loops in 0..5 {
            let length = tracker_main_length(&header, loops);
            assert!(length > previous);
            previous = length;
        }
    }

    #[test]
    fn compressed_lengths() {
        assert!(approx(compressed_main_length(30.0, 0), 30.0));
        assert!(approx(compressed_main_length(30.0, 2), 90.0));
        assert!(approx(split_main_length(5.0, 20.0, 0), 5.0));
        assert!(approx(split_main_length(5.0, 20.0, 2), 45.0));
    }

    #[tokio::test]
    async fn probe_path_prefers_existing_override() {
        let dir = tempfile::tempdir().unwrap();
        let probe_dir = dir.path().join("probe");
        std::fs::create_dir(&probe_dir).unwrap();
        std::fs::write(probe_dir.join("a.ogg"), b"x").unwrap();

        let present = SourceFile::new(dir.path().join("a.ogg"), Some(&probe_dir));
        assert_eq!(resolve_probe_path(&present, "t |").await, probe_dir.join("a.ogg"));

        let absent = SourceFile::new(dir.path().join("b.ogg"), Some(&probe_dir));
        assert_eq!(resolve_probe_path(&absent, "t |").await, dir.path().join("b.ogg"));

        let none = SourceFile::new(dir.path().join("c.ogg"), None::<&Path>);
        assert_eq!(resolve_probe_path(&none, "t |").await, dir.path().join("c.ogg"));
    }

    #[tokio::test]
    async fn missing_probe_version_warns_with_collection_label() {
        let capture = LogCapture::default();
        let _guard = capture.install();

        let dir = tempfile::tempdir().unwrap();
        let probe_dir = dir.path().join("probe");
        std::fs::create_dir(&probe_dir).unwrap();
        let source = SourceFile::new(dir.path().join("b.ogg"), Some(&probe_dir));

        assert_eq!(resolve_probe_path(&source, "2 - New |").await, source.path);

        let logs = capture.contents();
        let line = logs
            .lines()
            .find(|l| l.contains("did not have a probe version"))
            .unwrap();
        assert!(line.contains("WARN"));
        assert!(line.contains("2 - New | "));
    }
}
