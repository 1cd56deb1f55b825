//! Conversion of a single track.
//!
//! Loop policy, duration and fade planning feed the encoder arguments;
//! the resulting pipeline is handed to the runner.

use std::path::{Path, PathBuf};

use super::types::BatchContext;
use crate::errors::ConversionResult;
use crate::metadata::{merge_tags, TagDirective, TrackConfig};
use crate::models::{TrackDescriptor, TrackSources};
use crate::pipeline::PipelineShape;
use crate::timing::{effective_loop_count, resolve_main_length, TimingPlan};
use crate::tools::{decoder_command, EncoderArgsBuilder, EncoderInput};

/// Everything needed to start one track's processes.
#[derive(Debug, Clone)]
pub struct TrackJob {
    pub loop_count: u32,
    pub plan: TimingPlan,
    pub tags: Vec<TagDirective>,
    pub destination: PathBuf,
    pub shape: PipelineShape,
}

/// Plan a track: loop count, main length, fade window, tags and commands.
///
/// A per-track loop override wins over one in the collection's common
/// entry; without either the batch default applies. `label` prefixes
/// every log line.
pub async fn plan_track(
    ctx: &BatchContext,
    track: &TrackDescriptor,
    common: &TrackConfig,
    out_dir: &Path,
    label: &str,
) -> ConversionResult<TrackJob> {
    let options = &ctx.options;
    let loop_override = track
        .config
        .loop_override
        .as_ref()
        .or(common.loop_override.as_ref());
    let loop_count = effective_loop_count(options.loop_count, loop_override).effective_loop_count;

    let main_length = resolve_main_length(&track.sources, loop_count, ctx.prober(), label).await?;
    let plan = TimingPlan::new(
        main_length,
        options.fade_delay,
        options.fade_duration,
        loop_count,
    );
    tracing::debug!(
        "{} {}: {} loop(s), main {:.3}s, cut at {:.3}s{}",
        label,
        track.display_name(),
        loop_count,
        plan.main_length,
        plan.truncate_at(),
        if plan.apply_fade { "" } else { " (no fade)" }
    );

    let tags = merge_tags(&common.tags, &track.config.tags);
    let destination = track.output_path(out_dir, &options.output_extension);
    let shape = build_shape(ctx, track, loop_count, &plan, &tags, &destination);

    Ok(TrackJob {
        loop_count,
        plan,
        tags,
        destination,
        shape,
    })
}

/// Build the process layout for a planned track.
pub fn build_shape(
    ctx: &BatchContext,
    track: &TrackDescriptor,
    loop_count: u32,
    plan: &TimingPlan,
    tags: &[TagDirective],
    destination: &Path,
) -> PipelineShape {
    let input = match &track.sources {
        TrackSources::Tracker(_) => EncoderInput::RawPcm,
        TrackSources::Single(file) => EncoderInput::File(&file.path),
        TrackSources::Split { intro, body } => EncoderInput::SplitPair {
            intro: &intro.path,
            body: &body.path,
        },
    };

    let encoder = EncoderArgsBuilder::new(input, plan, tags, destination)
        .cover_art(ctx.options.cover_art.as_deref())
        .build_command(&ctx.tools.encoder);

    match &track.sources {
        TrackSources::Tracker(path) => {
            let repeat_count = loop_count.saturating_add(ctx.options.decoder_repeat_headroom);
            PipelineShape::TwoStage {
                decoder: decoder_command(&ctx.tools.decoder, path, repeat_count),
                encoder,
            }
        }
        TrackSources::Single(_) | TrackSources::Split { .. } => {
            PipelineShape::SingleStage { encoder }
        }
    }
}

/// Plan and run one track.
pub async fn convert_track(
    ctx: &BatchContext,
    track: &TrackDescriptor,
    common: &TrackConfig,
    out_dir: &Path,
    label: &str,
) -> ConversionResult<()> {
    let job = plan_track(ctx, track, common, out_dir, label).await?;
    let name = track.display_name();

    tracing::info!("{} Spawning child process(es) for {}...", label, name);
    let prefix = format!("{} {}", label, name);
    ctx.runner().run(&prefix, &job.shape, &job.destination).await
}
