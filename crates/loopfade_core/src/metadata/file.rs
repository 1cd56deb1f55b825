//! Metadata file loading.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{is_internal_key, COMMON_KEY, LOOP_OVERRIDE_KEY};
use crate::errors::{ConversionError, ConversionResult};
use crate::timing::LoopOverride;

/// Tags and control fields for one track (or for a whole collection).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackConfig {
    /// Tags in file order, internal keys removed.
    pub tags: IndexMap<String, String>,
    /// Loop-override expression, if present and well-formed.
    pub loop_override: Option<LoopOverride>,
}

impl TrackConfig {
    /// Build a config from one JSON object of the metadata file.
    ///
    /// Strings, numbers and booleans become tag text; `null`, arrays and
    /// objects are skipped. A malformed loop override is dropped so the
    /// batch default applies.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut config = TrackConfig::default();

        for (key, value) in object {
            if key == LOOP_OVERRIDE_KEY {
                config.loop_override = LoopOverride::from_json(value);
                if config.loop_override.is_none() {
                    tracing::debug!("Ignoring malformed loop override {}", value);
                }
                continue;
            }
            if is_internal_key(key) {
                continue;
            }
            if let Some(text) = tag_text(value) {
                config.tags.insert(key.clone(), text);
            }
        }

        config
    }
}

fn tag_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parsed metadata file of one collection.
#[derive(Debug, Clone, Default)]
pub struct CollectionMetadata {
    /// Collection-wide tags (`__common__`).
    pub common: TrackConfig,
    /// Per-track configs keyed by lower-cased stem.
    tracks: HashMap<String, TrackConfig>,
}

impl CollectionMetadata {
    /// Load a metadata file.
    pub async fn load(path: &Path) -> ConversionResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConversionError::io("read metadata file", path, e))?;
        Self::parse(path, &content)
    }

    /// Parse metadata file content. `path` is only used for error messages.
    pub fn parse(path: &Path, content: &str) -> ConversionResult<Self> {
        let json: Value = serde_json::from_str(content)
            .map_err(|e| ConversionError::metadata(path, e.to_string()))?;

        let Value::Object(root) = json else {
            return Err(ConversionError::metadata(path, "top level is not an object"));
        };

        let mut metadata = CollectionMetadata::default();
        for (stem, entry) in &root {
            let Value::Object(object) = entry else {
                return Err(ConversionError::metadata(
                    path,
                    format!("entry '{}' is not an object", stem),
                ));
            };

            let config = TrackConfig::from_object(object);
            if stem == COMMON_KEY {
                metadata.common = config;
            } else {
                metadata.tracks.insert(stem.to_lowercase(), config);
            }
        }

        Ok(metadata)
    }

    /// Config for a track, or an empty one if the file has no entry.
    pub fn track(&self, key: &str) -> TrackConfig {
        self.tracks.get(key).cloned().unwrap_or_default()
    }

    /// Number of per-track entries.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the file had no per-track entries.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::LoopOp;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
        "__common__": { "album": "Cave Story", "artist": "Pixel", "__note": "x" },
        "Access": { "title": "Access", "track": 1 },
        "fanfale1": { "title": "Victory!", "__loops": "*0", "comment": null }
    }"#;

    #[test]
    fn parses_common_and_tracks() {
        let metadata = CollectionMetadata::parse(Path::new("meta.json"), SAMPLE).unwrap();

        assert_eq!(metadata.len(), 2);
        let common: Vec<_> = metadata.common.tags.keys().cloned().collect();
        assert_eq!(common, vec!["album", "artist"]);

        let access = metadata.track("access");
        assert_eq!(access.tags.get("track").map(String::as_str), Some("1"));
        assert_eq!(access.loop_override, None);

        let fanfare = metadata.track("fanfale1");
        assert_eq!(
            fanfare.loop_override,
            Some(LoopOverride::Relative {
                op: LoopOp::Mul,
                operand: 0.0
            })
        );
        assert!(!fanfare.tags.contains_key("__loops"));
        assert!(!fanfare.tags.contains_key("comment"));
    }

    #[test]
    fn missing_track_yields_empty_config() {
        let metadata = CollectionMetadata::parse(Path::new("meta.json"), SAMPLE).unwrap();
        assert_eq!(metadata.track("nope"), TrackConfig::default());
        assert!(!metadata.is_empty());
    }

    #[test]
    fn common_only_file_has_no_track_entries() {
        let metadata = CollectionMetadata::parse(
            Path::new("meta.json"),
            r#"{"__common__": {"album": "Cave Story"}}"#,
        )
        .unwrap();
        assert!(metadata.is_empty());
        assert_eq!(metadata.len(), 0);
    }

    #[test]
    fn rejects_non_object_entries() {
        let err = CollectionMetadata::parse(Path::new("meta.json"), r#"{ "a": 3 }"#).unwrap_err();
        assert!(matches!(err, ConversionError::Metadata { .. }));

        let err = CollectionMetadata::parse(Path::new("meta.json"), "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("meta.json"));
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = CollectionMetadata::load(&PathBuf::from("/nonexistent/metadata.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Io { .. }));
    }
}
