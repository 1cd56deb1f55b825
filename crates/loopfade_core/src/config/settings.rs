//! Settings struct with TOML-based sections.
//!
//! Every field has a serde default, so a partial file (or an empty one)
//! loads into a complete [`Settings`].

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::tools::ToolCommand;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// External programs.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Loop, fade and output options shared by every collection.
    #[serde(default)]
    pub conversion: ConversionSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Source collections to convert, in order.
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tools: ToolSettings::default(),
            conversion: ConversionSettings::default(),
            logging: LoggingSettings::default(),
            collections: default_collections(),
        }
    }
}

/// External tool invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Tracker-binary to PCM decoder.
    #[serde(default = "default_decoder")]
    pub decoder: ToolCommand,

    /// Encoder/muxer.
    #[serde(default = "default_encoder")]
    pub encoder: ToolCommand,

    /// Duration prober.
    #[serde(default = "default_prober")]
    pub prober: ToolCommand,

    /// Pass encoder diagnostics through to the console.
    #[serde(default = "default_true")]
    pub inherit_encoder_stderr: bool,
}

fn default_decoder() -> ToolCommand {
    ToolCommand::new("organism")
}

fn default_encoder() -> ToolCommand {
    ToolCommand::new("ffmpeg")
}

fn default_prober() -> ToolCommand {
    ToolCommand::new("ffprobe")
}

fn default_true() -> bool {
    true
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            decoder: default_decoder(),
            encoder: default_encoder(),
            prober: default_prober(),
            inherit_encoder_stderr: true,
        }
    }
}

/// Loop and fade parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Loops after the first play-through, before any per-track override.
    #[serde(default = "default_loop_count")]
    pub loop_count: u32,

    /// Seconds between the end of the last loop and the fade start.
    #[serde(default = "default_fade_delay")]
    pub fade_delay: f64,

    /// Fade length in seconds.
    #[serde(default = "default_fade_duration")]
    pub fade_duration: f64,

    /// Output file extension; selects the encoder's container.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Image attached to every output as the cover picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_art: Option<String>,

    /// Extra loops the decoder is asked to play beyond the planned count.
    #[serde(default = "default_repeat_headroom")]
    pub decoder_repeat_headroom: u32,
}

fn default_loop_count() -> u32 {
    1
}

fn default_fade_delay() -> f64 {
    2.0
}

fn default_fade_duration() -> f64 {
    8.0
}

fn default_output_extension() -> String {
    "flac".to_string()
}

fn default_repeat_headroom() -> u32 {
    2
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            loop_count: default_loop_count(),
            fade_delay: default_fade_delay(),
            fade_duration: default_fade_duration(),
            output_extension: default_output_extension(),
            cover_art: None,
            decoder_repeat_headroom: default_repeat_headroom(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level shown when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: LogLevel,

    /// Directory for a timestamped log file copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

/// How a collection's sources are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Tracker binaries rendered by the decoder.
    Tracker,
    /// Compressed audio, single files or intro/loop pairs.
    Compressed,
}

impl CollectionKind {
    /// Source extension used when the collection does not set one.
    pub fn default_extension(&self) -> &'static str {
        match self {
            CollectionKind::Tracker => "org",
            CollectionKind::Compressed => "ogg",
        }
    }
}

/// One source directory converted into one output subdirectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSettings {
    /// Label prefixed to every log line of this collection.
    pub name: String,

    pub kind: CollectionKind,

    pub source_dir: String,

    /// JSON metadata file for the collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,

    /// Directory of same-named files probed in place of the sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_dir: Option<String>,

    /// Subdirectory of the output directory.
    pub output_subdir: String,

    /// Source extension override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl CollectionSettings {
    /// Source file extension for this collection.
    pub fn extension(&self) -> &str {
        self.extension
            .as_deref()
            .unwrap_or_else(|| self.kind.default_extension())
    }
}

fn default_collections() -> Vec<CollectionSettings> {
    vec![
        CollectionSettings {
            name: "1 - Original".to_string(),
            kind: CollectionKind::Tracker,
            source_dir: "source/1-original/org-source".to_string(),
            metadata: Some("source/1-original/metadata.json".to_string()),
            probe_dir: None,
            output_subdir: "1-original".to_string(),
            extension: None,
        },
        CollectionSettings {
            name: "2 - New".to_string(),
            kind: CollectionKind::Compressed,
            source_dir: "source/2-new/ogg-source-fixed".to_string(),
            metadata: Some("source/2-new/metadata.json".to_string()),
            probe_dir: Some("source/2-new/ogg-source-game".to_string()),
            output_subdir: "2-new".to_string(),
            extension: None,
        },
        CollectionSettings {
            name: "3 - Remastered".to_string(),
            kind: CollectionKind::Compressed,
            source_dir: "source/3-remastered/ogg-source".to_string(),
            metadata: Some("source/3-remastered/metadata.json".to_string()),
            probe_dir: None,
            output_subdir: "3-remastered".to_string(),
            extension: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gets_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.conversion.loop_count, 1);
        assert_eq!(settings.conversion.fade_delay, 2.0);
        assert_eq!(settings.conversion.fade_duration, 8.0);
        assert_eq!(settings.tools.encoder.program, "ffmpeg");
        assert_eq!(settings.collections.len(), 3);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [conversion]
            loop_count = 3

            [tools.decoder]
            program = "cargo"
            args = ["run", "-qr", "--"]

            [[collections]]
            name = "OST"
            kind = "compressed"
            source_dir = "ost"
            output_subdir = "ost"
            extension = "opus"
            "#,
        )
        .unwrap();

        assert_eq!(settings.conversion.loop_count, 3);
        assert_eq!(settings.conversion.fade_duration, 8.0);
        assert_eq!(settings.tools.decoder.args, vec!["run", "-qr", "--"]);
        assert_eq!(settings.tools.prober.program, "ffprobe");
        assert_eq!(settings.collections.len(), 1);
        assert_eq!(settings.collections[0].extension(), "opus");
    }

    #[test]
    fn kind_picks_extension() {
        let mut collection = default_collections().remove(0);
        assert_eq!(collection.extension(), "org");
        collection.kind = CollectionKind::Compressed;
        assert_eq!(collection.extension(), "ogg");
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}
