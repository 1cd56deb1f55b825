//! Source discovery and split-pair matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::types::CollectionSpec;
use crate::config::CollectionKind;
use crate::errors::{ConversionError, ConversionResult};
use crate::metadata::CollectionMetadata;
use crate::models::{SourceFile, SplitPart, TrackDescriptor, TrackSources};

/// Discover every track of a collection, sorted by base name.
///
/// An unreadable directory or an unpaired split file fails the whole
/// collection.
pub async fn discover_tracks(
    spec: &CollectionSpec,
    metadata: &CollectionMetadata,
) -> ConversionResult<Vec<TrackDescriptor>> {
    let files = list_sources(&spec.source_dir, &spec.extension).await?;

    let mut tracks = match spec.kind {
        CollectionKind::Tracker => files
            .into_iter()
            .map(|path| (file_stem(&path), TrackSources::Tracker(path)))
            .collect::<Vec<_>>(),
        CollectionKind::Compressed => pair_sources(files, spec.probe_dir.as_deref())?,
    }
    .into_iter()
    .map(|(base_name, sources)| {
        let mut track = TrackDescriptor::new(base_name, sources, Default::default());
        track.config = metadata.track(&track.metadata_key());
        track
    })
    .collect::<Vec<_>>();

    tracks.sort_by(|a, b| a.base_name.cmp(&b.base_name));
    Ok(tracks)
}

/// List regular files in `dir` with the given extension (case-insensitive).
pub async fn list_sources(dir: &Path, extension: &str) -> ConversionResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| ConversionError::io("read directory", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ConversionError::io("read directory", dir, e))?
    {
        let path = entry.path();
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        let matches = path
            .extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if is_file && matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Group compressed files into single tracks and intro/loop pairs.
fn pair_sources(
    files: Vec<PathBuf>,
    probe_dir: Option<&Path>,
) -> ConversionResult<Vec<(String, TrackSources)>> {
    let mut tracks = Vec::new();
    let mut halves: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();

    for path in files {
        let stem = file_stem(&path);
        match SplitPart::from_stem(&stem) {
            Some((base, SplitPart::Intro)) => {
                halves.entry(base.to_string()).or_default().0 = Some(path);
            }
            Some((base, SplitPart::Loop)) => {
                halves.entry(base.to_string()).or_default().1 = Some(path);
            }
            None => {
                let sources = TrackSources::Single(SourceFile::new(path, probe_dir));
                tracks.push((stem, sources));
            }
        }
    }

    for (base, pair) in halves {
        let (intro, body) = match pair {
            (Some(intro), Some(body)) => (intro, body),
            (Some(orphan), None) | (None, Some(orphan)) => {
                let part = match SplitPart::from_stem(&file_stem(&orphan)) {
                    Some((_, part)) => part,
                    None => SplitPart::Intro,
                };
                return Err(ConversionError::MissingCounterpart {
                    file: orphan,
                    expected: part.counterpart().to_string(),
                });
            }
            (None, None) => continue,
        };

        let sources = TrackSources::Split {
            intro: SourceFile::new(intro, probe_dir),
            body: SourceFile::new(body, probe_dir),
        };
        tracks.push((base, sources));
    }

    Ok(tracks)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
