//! Encoder command options builder.
//!
//! Builds ffmpeg-style command-line tokens from a timing plan, merged
//! tags and the track's input shape.
//!
//! # Input shapes
//!
//! - **Raw PCM**: decoder output on stdin (`-f s16le ... -i pipe:`)
//! - **File**: one compressed file looped forever (`-stream_loop -1`)
//! - **Split pair**: the intro once, then the body looped forever,
//!   joined with a `concat` filter graph
//!
//! The stream is always cut with `-t`, so infinite loops are safe.

use std::ffi::OsString;
use std::path::Path;

use super::command::{StageCommand, ToolCommand};
use super::decoder::{PCM_CHANNELS, PCM_FORMAT};
use crate::errors::Stage;
use crate::metadata::TagDirective;
use crate::timing::{format_seconds, TimingPlan, SAMPLE_RATE_HZ};

/// What the encoder reads from.
#[derive(Debug, Clone, Copy)]
pub enum EncoderInput<'a> {
    /// Raw PCM piped from the decoder.
    RawPcm,
    /// A single file looping as a whole.
    File(&'a Path),
    /// An intro followed by a looping body.
    SplitPair { intro: &'a Path, body: &'a Path },
}

/// Builder for encoder command-line options.
pub struct EncoderArgsBuilder<'a> {
    input: EncoderInput<'a>,
    plan: &'a TimingPlan,
    tags: &'a [TagDirective],
    cover_art: Option<&'a Path>,
    output_path: &'a Path,
}

impl<'a> EncoderArgsBuilder<'a> {
    /// Create a new options builder.
    pub fn new(
        input: EncoderInput<'a>,
        plan: &'a TimingPlan,
        tags: &'a [TagDirective],
        output_path: &'a Path,
    ) -> Self {
        Self {
            input,
            plan,
            tags,
            cover_art: None,
            output_path,
        }
    }

    /// Attach a still image as the cover picture.
    pub fn cover_art(mut self, cover_art: Option<&'a Path>) -> Self {
        self.cover_art = cover_art;
        self
    }

    /// Build the complete encoder command tokens.
    pub fn build(&self) -> Vec<OsString> {
        let mut tokens = vec![OsString::from("-hide_banner")];

        self.add_inputs(&mut tokens);
        self.add_cover_art(&mut tokens);

        // Trim
        tokens.push("-ss".into());
        tokens.push("0".into());
        tokens.push("-t".into());
        tokens.push(format_seconds(self.plan.truncate_at()).into());

        for tag in self.tags {
            tokens.push("-metadata".into());
            tokens.push(tag.to_arg().into());
        }

        self.add_filters(&mut tokens);

        tokens.push(self.output_path.into());
        tokens
    }

    /// Build the encoder stage command.
    pub fn build_command(&self, tool: &ToolCommand) -> StageCommand {
        tool.invoke(Stage::Encoder, self.build())
    }

    fn add_inputs(&self, tokens: &mut Vec<OsString>) {
        match self.input {
            EncoderInput::RawPcm => {
                tokens.push("-f".into());
                tokens.push(PCM_FORMAT.into());
                tokens.push("-ar".into());
                tokens.push(SAMPLE_RATE_HZ.to_string().into());
                tokens.push("-ac".into());
                tokens.push(PCM_CHANNELS.to_string().into());
                tokens.push("-channel_layout".into());
                tokens.push("stereo".into());
                tokens.push("-i".into());
                tokens.push("pipe:".into());
            }
            EncoderInput::File(path) => {
                tokens.push("-nostdin".into());
                tokens.push("-stream_loop".into());
                tokens.push("-1".into());
                tokens.push("-i".into());
                tokens.push(path.into());
            }
            EncoderInput::SplitPair { intro, body } => {
                tokens.push("-nostdin".into());
                tokens.push("-i".into());
                tokens.push(intro.into());
                tokens.push("-stream_loop".into());
                tokens.push("-1".into());
                tokens.push("-i".into());
                tokens.push(body.into());
            }
        }
    }

    /// Cover art is the last input; audio comes from the filter graph for
    /// split pairs and from input 0 otherwise.
    fn add_cover_art(&self, tokens: &mut Vec<OsString>) {
        let Some(cover) = self.cover_art else {
            return;
        };

        tokens.push("-i".into());
        tokens.push(cover.into());

        match self.input {
            EncoderInput::SplitPair { .. } => {
                tokens.push("-map".into());
                tokens.push("2:v".into());
            }
            EncoderInput::RawPcm | EncoderInput::File(_) => {
                tokens.push("-map".into());
                tokens.push("0:a".into());
                tokens.push("-map".into());
                tokens.push("1:v".into());
            }
        }

        tokens.extend(
            [
                "-codec:v",
                "copy",
                "-metadata:s:v",
                "title=Album cover",
                "-metadata:s:v",
                "comment=Cover (front)",
                "-disposition:v",
                "attached_pic",
            ]
            .map(OsString::from),
        );
    }

    fn add_filters(&self, tokens: &mut Vec<OsString>) {
        match self.input {
            EncoderInput::SplitPair { .. } => {
                let concat = "[0:0][1:0]concat=n=2:v=0:a=1[cout]";
                let (graph, output) = match self.plan.fade_filter() {
                    Some(fade) => (format!("{concat};[cout]{fade}[fout]"), "[fout]"),
                    None => (concat.to_string(), "[cout]"),
                };
                tokens.push("-filter_complex".into());
                tokens.push(graph.into());
                tokens.push("-map".into());
                tokens.push(output.into());
            }
            EncoderInput::RawPcm | EncoderInput::File(_) => {
                if let Some(fade) = self.plan.fade_filter() {
                    tokens.push("-af".into());
                    tokens.push(fade.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<TagDirective> {
        vec![
            TagDirective {
                key: "album".to_string(),
                value: "OST".to_string(),
            },
            TagDirective {
                key: "title".to_string(),
                value: "Theme".to_string(),
            },
        ]
    }

    fn value_after<'t>(tokens: &'t [OsString], flag: &str) -> Option<&'t str> {
        tokens
            .iter()
            .position(|t| t == flag)
            .and_then(|i| tokens.get(i + 1))
            .and_then(|t| t.to_str())
    }

    #[test]
    fn raw_pcm_with_fade() {
        let plan = TimingPlan::new(24.0, 2.0, 8.0, 1);
        let tags = tags();
        let tokens =
            EncoderArgsBuilder::new(EncoderInput::RawPcm, &plan, &tags, Path::new("/out/a.flac"))
                .build();

        assert_eq!(value_after(&tokens, "-f"), Some("s16le"));
        assert_eq!(value_after(&tokens, "-ar"), Some("44100"));
        assert_eq!(value_after(&tokens, "-ac"), Some("2"));
        assert_eq!(value_after(&tokens, "-i"), Some("pipe:"));
        assert_eq!(value_after(&tokens, "-t"), Some("34.5"));
        assert_eq!(value_after(&tokens, "-af"), Some("afade=t=out:st=26:d=8"));
        assert_eq!(tokens.last().and_then(|t| t.to_str()), Some("/out/a.flac"));

        let metadata: Vec<_> = tokens
            .windows(2)
            .filter(|w| w[0] == "-metadata")
            .filter_map(|w| w[1].to_str())
            .collect();
        assert_eq!(metadata, vec!["album=OST", "title=Theme"]);
    }

    #[test]
    fn no_fade_truncates_without_filter() {
        let plan = TimingPlan::new(24.0, 2.0, 8.0, 0);
        let tokens = EncoderArgsBuilder::new(
            EncoderInput::File(Path::new("/src/a.ogg")),
            &plan,
            &[],
            Path::new("/out/a.flac"),
        )
        .build();

        assert_eq!(value_after(&tokens, "-t"), Some("24.5"));
        assert!(!tokens.iter().any(|t| t == "-af"));
        assert_eq!(value_after(&tokens, "-stream_loop"), Some("-1"));
    }

    #[test]
    fn split_pair_uses_concat_graph() {
        let plan = TimingPlan::new(45.0, 2.0, 8.0, 2);
        let tokens = EncoderArgsBuilder::new(
            EncoderInput::SplitPair {
                intro: Path::new("/s/b_intro.ogg"),
                body: Path::new("/s/b_loop.ogg"),
            },
            &plan,
            &[],
            Path::new("/out/b.flac"),
        )
        .build();

        assert_eq!(
            value_after(&tokens, "-filter_complex"),
            Some("[0:0][1:0]concat=n=2:v=0:a=1[cout];[cout]afade=t=out:st=47:d=8[fout]")
        );
        assert_eq!(value_after(&tokens, "-map"), Some("[fout]"));
        let inputs: Vec<_> = tokens
            .windows(2)
            .filter(|w| w[0] == "-i")
            .filter_map(|w| w[1].to_str())
            .collect();
        assert_eq!(inputs, vec!["/s/b_intro.ogg", "/s/b_loop.ogg"]);
    }

    #[test]
    fn cover_art_is_attached() {
        let plan = TimingPlan::new(24.0, 2.0, 8.0, 1);
        let tokens =
            EncoderArgsBuilder::new(EncoderInput::RawPcm, &plan, &[], Path::new("/out/a.flac"))
                .cover_art(Some(Path::new("/art/cover.jpg")))
                .build();

        assert!(tokens.iter().any(|t| t == "/art/cover.jpg"));
        assert_eq!(value_after(&tokens, "-disposition:v"), Some("attached_pic"));
        assert_eq!(value_after(&tokens, "-codec:v"), Some("copy"));
        assert_eq!(value_after(&tokens, "-map"), Some("0:a"));
    }

    #[test]
    fn split_cover_maps_third_input() {
        let plan = TimingPlan::new(24.0, 2.0, 0.0, 1);
        let tokens = EncoderArgsBuilder::new(
            EncoderInput::SplitPair {
                intro: Path::new("i.ogg"),
                body: Path::new("l.ogg"),
            },
            &plan,
            &[],
            Path::new("o.flac"),
        )
        .cover_art(Some(Path::new("c.png")))
        .build();

        let maps: Vec<_> = tokens
            .windows(2)
            .filter(|w| w[0] == "-map")
            .filter_map(|w| w[1].to_str())
            .collect();
        assert_eq!(maps, vec!["2:v", "[cout]"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_reach_the_encoder_unchanged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"/src/\xffboss.ogg"));
        let output = Path::new(OsStr::from_bytes(b"/out/\xffboss.flac"));
        let plan = TimingPlan::new(24.0, 2.0, 8.0, 1);
        let tokens = EncoderArgsBuilder::new(EncoderInput::File(source), &plan, &[], output).build();

        assert!(tokens.iter().any(|t| t.as_os_str() == source.as_os_str()));
        assert_eq!(tokens.last().map(|t| t.as_os_str()), Some(output.as_os_str()));
    }
}
