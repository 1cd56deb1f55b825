//! Per-track process pipeline.
//!
//! A tracker track runs as decoder → encoder with the decoder's stdout
//! forwarded into the encoder's stdin. Compressed tracks run the encoder
//! alone. The encoder cuts the stream at the truncation point and exits;
//! the decoder is then asked to stop.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use super::registry::{ProcessRegistry, StageExit, TerminationCause};
use crate::errors::{ConversionError, ConversionResult, Stage};
use crate::tools::StageCommand;

/// Process layout for one track.
#[derive(Debug, Clone)]
pub enum PipelineShape {
    /// Decoder output streamed into the encoder.
    TwoStage {
        decoder: StageCommand,
        encoder: StageCommand,
    },
    /// Encoder reading its inputs directly.
    SingleStage { encoder: StageCommand },
}

/// Pipeline progress, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Starting,
    Streaming,
    Running,
    EncoderClosed,
    DecoderExited,
    Exited,
    Error,
    Terminating,
    Joined,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Starting => "starting",
            PipelineState::Streaming => "streaming",
            PipelineState::Running => "running",
            PipelineState::EncoderClosed => "encoder closed input",
            PipelineState::DecoderExited => "decoder exited",
            PipelineState::Exited => "encoder exited",
            PipelineState::Error => "error",
            PipelineState::Terminating => "terminating decoder",
            PipelineState::Joined => "joined",
        };
        write!(f, "{}", name)
    }
}

/// Decide a track's result from how its processes ended.
///
/// A decoder that was stopped by the pipeline itself counts as clean.
/// Decoder failures are reported ahead of encoder failures.
pub fn settle(encoder: StageExit, decoder: Option<StageExit>) -> ConversionResult<()> {
    if let Some(decoder) = decoder {
        if !decoder.success() {
            match decoder.cause {
                Some(TerminationCause::Pipeline) => {}
                Some(TerminationCause::Interrupt) => return Err(ConversionError::Interrupted),
                None => return Err(ConversionError::exit_failed(Stage::Decoder, decoder.code)),
            }
        }
    }

    if encoder.success() {
        return Ok(());
    }
    match encoder.cause {
        Some(TerminationCause::Interrupt) => Err(ConversionError::Interrupted),
        _ => Err(ConversionError::exit_failed(Stage::Encoder, encoder.code)),
    }
}

/// Runs track pipelines against a shared process registry.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    registry: Arc<ProcessRegistry>,
    inherit_encoder_stderr: bool,
}

impl PipelineRunner {
    pub fn new(registry: Arc<ProcessRegistry>) -> Self {
        Self {
            registry,
            inherit_encoder_stderr: true,
        }
    }

    /// Show encoder diagnostics on the console (default) or discard them.
    pub fn inherit_encoder_stderr(mut self, inherit: bool) -> Self {
        self.inherit_encoder_stderr = inherit;
        self
    }

    fn encoder_stderr(&self) -> Stdio {
        if self.inherit_encoder_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }

    /// Run one track's processes to completion.
    ///
    /// `track` prefixes every log line. The destination's parent directory
    /// is created first.
    pub async fn run(
        &self,
        track: &str,
        shape: &PipelineShape,
        destination: &Path,
    ) -> ConversionResult<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConversionError::io("create directory", parent, e))?;
        }

        log_state(track, PipelineState::Starting);
        let result = match shape {
            PipelineShape::SingleStage { encoder } => self.run_single(track, encoder).await,
            PipelineShape::TwoStage { decoder, encoder } => {
                self.run_two_stage(track, decoder, encoder).await
            }
        };

        if let Err(e) = &result {
            if !e.is_interrupted() {
                log_state(track, PipelineState::Error);
            }
        }
        result
    }

    async fn run_single(&self, track: &str, encoder: &StageCommand) -> ConversionResult<()> {
        let stderr = self.encoder_stderr();
        let mut child = self.registry.spawn(encoder, |cmd| {
            cmd.stderr(stderr);
        })?;
        log_state(track, PipelineState::Running);

        let exit = child.wait().await?;
        log_state(track, PipelineState::Exited);
        drop(child);
        log_state(track, PipelineState::Joined);

        settle(exit, None)
    }

    async fn run_two_stage(
        &self,
        track: &str,
        decoder_cmd: &StageCommand,
        encoder_cmd: &StageCommand,
    ) -> ConversionResult<()> {
        let mut decoder = self.registry.spawn(decoder_cmd, |cmd| {
            cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        })?;
        let decoder_handle = decoder.handle();

        let stderr = self.encoder_stderr();
        let mut encoder = match self.registry.spawn(encoder_cmd, |cmd| {
            cmd.stdin(Stdio::piped()).stderr(stderr);
        }) {
            Ok(child) => child,
            Err(e) => {
                log_state(track, PipelineState::Terminating);
                decoder_handle.request_termination(TerminationCause::Pipeline);
                let _ = decoder.wait().await;
                return Err(e);
            }
        };

        let (Some(mut pcm_out), Some(mut pcm_in)) = (decoder.take_stdout(), encoder.take_stdin())
        else {
            return Err(ConversionError::io(
                "connect",
                "decoder to encoder",
                std::io::Error::from(std::io::ErrorKind::BrokenPipe),
            ));
        };

        // The decoder's stdout stays open until the decoder is reaped, so
        // it never dies of SIGPIPE before termination is requested.
        let mut forward = tokio::spawn(async move {
            let copied = tokio::io::copy(&mut pcm_out, &mut pcm_in).await;
            drop(pcm_in);
            (copied, pcm_out)
        });
        let forward_abort = forward.abort_handle();
        log_state(track, PipelineState::Streaming);

        let mut forward_done = false;
        let mut parked_output = None;
        let mut encoder_exit: Option<StageExit> = None;
        let mut decoder_exit: Option<StageExit> = None;

        while encoder_exit.is_none() || decoder_exit.is_none() {
            tokio::select! {
                joined = &mut forward, if !forward_done => {
                    forward_done = true;
                    match joined {
                        Ok((Ok(bytes), _)) => {
                            tracing::debug!("{} forwarded {} bytes of PCM", track, bytes);
                        }
                        Ok((Err(e), output)) => {
                            parked_output = Some(output);
                            tracing::debug!("{} forwarding stopped: {}", track, e);
                            log_state(track, PipelineState::EncoderClosed);
                            if decoder_exit.is_none() {
                                log_state(track, PipelineState::Terminating);
                                decoder_handle.request_termination(TerminationCause::Pipeline);
                            }
                        }
                        Err(e) => {
                            tracing::debug!("{} forwarding task ended: {}", track, e);
                        }
                    }
                }
                exit = encoder.wait(), if encoder_exit.is_none() => {
                    encoder_exit = Some(exit?);
                    log_state(track, PipelineState::Exited);
                    if decoder_exit.is_none() {
                        log_state(track, PipelineState::Terminating);
                        decoder_handle.request_termination(TerminationCause::Pipeline);
                    }
                }
                exit = decoder.wait(), if decoder_exit.is_none() => {
                    decoder_exit = Some(exit?);
                    log_state(track, PipelineState::DecoderExited);
                }
            }
        }

        if !forward_done {
            forward_abort.abort();
        }
        drop(parked_output);
        drop(decoder);
        drop(encoder);
        log_state(track, PipelineState::Joined);

        match encoder_exit {
            Some(encoder_exit) => settle(encoder_exit, decoder_exit),
            None => Err(ConversionError::exit_failed(Stage::Encoder, None)),
        }
    }
}

fn log_state(track: &str, state: PipelineState) {
    tracing::debug!("{} pipeline {}", track, state);
}
