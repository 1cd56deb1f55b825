//! Output directory preparation and the batch banner.

use std::path::Path;

use super::types::ConversionOptions;
use crate::errors::{ConversionError, ConversionResult};
use crate::timing::format_seconds;

/// Prepare the batch output directory.
///
/// An existing directory is only replaced when `force` is set; nothing
/// is converted otherwise.
pub async fn prepare_output_dir(path: &Path, force: bool) -> ConversionResult<()> {
    let exists = tokio::fs::try_exists(path)
        .await
        .map_err(|e| ConversionError::io("check", path, e))?;

    if exists {
        if !force {
            return Err(ConversionError::OutputExists {
                path: path.to_path_buf(),
            });
        }
        tracing::info!("Clearing output directory {}", path.display());
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|e| ConversionError::io("remove output directory", path, e))?;
    }

    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| ConversionError::io("create output directory", path, e))
}

/// English ordinal suffix: `st`, `nd`, `rd` or `th`.
pub fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Describe the loop and fade plan in words.
pub fn describe_plan(options: &ConversionOptions) -> String {
    let loops = options.loop_count;
    let fade_pass = loops.saturating_add(2);
    format!(
        "Each song will play {} times (1 play-through, plus {} loop(s)), start a fade {} second(s) \
         into the {}{} play-through, fading to complete silence {} second(s) later.",
        loops.saturating_add(1),
        loops,
        format_seconds(options.fade_delay),
        fade_pass,
        ordinal_suffix(fade_pass),
        format_seconds(options.fade_duration)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ordinals() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (101, "st"),
            (111, "th"),
        ];
        for (n, suffix) in cases {
            assert_eq!(ordinal_suffix(n), suffix, "n = {}", n);
        }
    }

    #[test]
    fn plan_is_described() {
        let text = describe_plan(&ConversionOptions::default());
        assert!(text.starts_with("Each song will play 2 times"));
        assert!(text.contains("2 second(s) into the 3rd play-through"));
        assert!(text.ends_with("silence 8 second(s) later."));
    }

    #[tokio::test]
    async fn existing_directory_needs_force() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("flac-output");
        std::fs::create_dir(&out).unwrap();
        std::fs::write(out.join("old.flac"), b"x").unwrap();

        let err = prepare_output_dir(&out, false).await.unwrap_err();
        assert!(matches!(err, ConversionError::OutputExists { .. }));
        assert!(out.join("old.flac").exists());

        prepare_output_dir(&out, true).await.unwrap();
        assert!(out.is_dir());
        assert!(!out.join("old.flac").exists());
    }

    #[tokio::test]
    async fn missing_directory_is_created() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("a").join("b");
        prepare_output_dir(&out, false).await.unwrap();
        assert!(out.is_dir());
    }
}
