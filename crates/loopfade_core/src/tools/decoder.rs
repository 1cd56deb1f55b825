//! Tracker decoder invocation.
//!
//! The decoder takes a tracker file and a loop-repeat count and writes
//! raw signed 16-bit little-endian interleaved stereo PCM at 44.1 kHz to
//! stdout until it has played that many loops or is terminated.

use std::ffi::OsString;
use std::path::Path;

use super::command::{StageCommand, ToolCommand};
use crate::errors::Stage;

/// Encoder input format name for the decoder's output.
pub const PCM_FORMAT: &str = "s16le";

/// Channel count of the decoder's output.
pub const PCM_CHANNELS: u32 = 2;

/// Build the decoder command for a tracker file.
///
/// The repeat count only needs to be large enough; the decoder is always
/// terminated once the encoder has what it needs.
pub fn decoder_command(tool: &ToolCommand, source: &Path, repeat_count: u32) -> StageCommand {
    tool.invoke(
        Stage::Decoder,
        [OsString::from(source), OsString::from(repeat_count.to_string())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_receives_file_and_repeats() {
        let cmd = decoder_command(&ToolCommand::new("organism"), Path::new("/o/a.org"), 3);
        assert_eq!(cmd.program, "organism");
        assert_eq!(cmd.args, vec!["/o/a.org", "3"]);
    }

    #[cfg(unix)]
    #[test]
    fn decoder_keeps_raw_path_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"/o/\xfe\xffa.org"));
        let cmd = decoder_command(&ToolCommand::new("organism"), source, 3);
        assert_eq!(cmd.args[0].as_os_str(), source.as_os_str());
    }
}
