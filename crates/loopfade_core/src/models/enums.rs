//! Core enums used throughout the crate.

use serde::{Deserialize, Serialize};

/// How a track's audio is stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Tracker binary (`.org`) rendered to PCM by the external decoder.
    TrackerBinary,
    /// A single pre-rendered compressed file that loops as a whole.
    SingleCompressed,
    /// A pre-rendered intro file followed by a looping body file.
    SplitIntroLoop,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::TrackerBinary => write!(f, "tracker"),
            SourceKind::SingleCompressed => write!(f, "single"),
            SourceKind::SplitIntroLoop => write!(f, "split"),
        }
    }
}

/// Half of a split intro/loop pair, taken from the file stem suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitPart {
    Intro,
    Loop,
}

impl SplitPart {
    /// Stem suffix that marks this part (`song_intro`, `song_loop`).
    pub fn suffix(&self) -> &'static str {
        match self {
            SplitPart::Intro => "_intro",
            SplitPart::Loop => "_loop",
        }
    }

    /// The part this one must be paired with.
    pub fn counterpart(&self) -> SplitPart {
        match self {
            SplitPart::Intro => SplitPart::Loop,
            SplitPart::Loop => SplitPart::Intro,
        }
    }

    /// Split a file stem into its base name and part, if it carries a suffix.
    pub fn from_stem(stem: &str) -> Option<(&str, SplitPart)> {
        [SplitPart::Intro, SplitPart::Loop]
            .into_iter()
            .find_map(|part| {
                stem.strip_suffix(part.suffix())
                    .filter(|base| !base.is_empty())
                    .map(|base| (base, part))
            })
    }
}

impl std::fmt::Display for SplitPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitPart::Intro => write!(f, "intro"),
            SplitPart::Loop => write!(f, "loop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_part_parses_stems() {
        assert_eq!(
            SplitPart::from_stem("boss_intro"),
            Some(("boss", SplitPart::Intro))
        );
        assert_eq!(
            SplitPart::from_stem("boss_loop"),
            Some(("boss", SplitPart::Loop))
        );
        assert_eq!(SplitPart::from_stem("boss"), None);
        assert_eq!(SplitPart::from_stem("_loop"), None);
    }

    #[test]
    fn counterpart_is_symmetric() {
        assert_eq!(SplitPart::Intro.counterpart(), SplitPart::Loop);
        assert_eq!(SplitPart::Loop.counterpart().counterpart(), SplitPart::Loop);
    }
}
