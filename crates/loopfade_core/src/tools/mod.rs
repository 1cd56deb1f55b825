//! Command lines for the external decoder, encoder and prober.
//!
//! None of these tools are linked; each is an executable configured in
//! the `[tools]` settings section and driven through its arguments and
//! standard streams.

mod command;
mod decoder;
mod encoder;
mod prober;

pub use command::{StageCommand, ToolCommand};
pub use decoder::{decoder_command, PCM_CHANNELS, PCM_FORMAT};
pub use encoder::{EncoderArgsBuilder, EncoderInput};
pub use prober::{parse_probe_output, Prober};
