//! Concurrent batch execution.
//!
//! Collections run concurrently with each other and every track of a
//! collection runs as its own task. A failing track never stops its
//! siblings; a failing collection never stops other collections.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;

use super::discovery::discover_tracks;
use super::track::convert_track;
use super::types::{BatchContext, CollectionSpec};
use crate::errors::ConversionResult;
use crate::logging::MessagePrefix;
use crate::metadata::{CollectionMetadata, TrackConfig};
use crate::models::{ConversionOutcome, OutcomeStatus, TrackDescriptor};

/// Outcomes of one collection.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub name: String,
    /// One outcome per discovered track, in discovery order.
    pub outcomes: Vec<ConversionOutcome>,
    /// Set when the collection could not be discovered at all.
    pub error: Option<String>,
}

impl CollectionReport {
    fn aborted(name: String, error: String) -> Self {
        Self {
            name,
            outcomes: Vec::new(),
            error: Some(error),
        }
    }

    /// Number of tracks that converted successfully.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Whether every track converted and discovery succeeded.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.outcomes.iter().all(ConversionOutcome::is_success)
    }
}

/// Outcomes of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub collections: Vec<CollectionReport>,
}

impl BatchReport {
    /// Every failed track with the name of its collection.
    pub fn failed_tracks(&self) -> Vec<(&str, &ConversionOutcome)> {
        self.collections
            .iter()
            .flat_map(|c| {
                c.outcomes
                    .iter()
                    .filter(|o| !o.is_success())
                    .map(move |o| (c.name.as_str(), o))
            })
            .collect()
    }

    /// Total number of discovered tracks.
    pub fn total_tracks(&self) -> usize {
        self.collections.iter().map(|c| c.outcomes.len()).sum()
    }

    /// Number of tracks that converted successfully.
    pub fn succeeded(&self) -> usize {
        self.collections.iter().map(CollectionReport::succeeded).sum()
    }

    /// Whether any track resolved to an interrupt.
    pub fn was_interrupted(&self) -> bool {
        self.collections
            .iter()
            .flat_map(|c| c.outcomes.iter())
            .any(|o| o.interrupted)
    }

    /// Whether every collection and every track succeeded.
    pub fn is_success(&self) -> bool {
        self.collections.iter().all(CollectionReport::is_success)
    }
}

/// Runs collections of tracks against a shared context.
pub struct BatchOrchestrator {
    ctx: Arc<BatchContext>,
}

impl BatchOrchestrator {
    pub fn new(ctx: BatchContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    /// Shared context, including the process registry.
    pub fn context(&self) -> &Arc<BatchContext> {
        &self.ctx
    }

    /// Run every collection concurrently and report all outcomes.
    pub async fn run(&self, collections: Vec<CollectionSpec>) -> BatchReport {
        let runs = collections
            .into_iter()
            .map(|spec| run_collection(Arc::clone(&self.ctx), spec));

        BatchReport {
            collections: join_all(runs).await,
        }
    }
}

async fn run_collection(ctx: Arc<BatchContext>, spec: CollectionSpec) -> CollectionReport {
    let label = spec.label();

    let (metadata, tracks) = match discover(&spec).await {
        Ok(found) => found,
        Err(e) => {
            tracing::error!(
                "{} {}",
                label,
                MessagePrefix::Failed.format(&format!("collection aborted: {}", e))
            );
            return CollectionReport::aborted(spec.name, e.to_string());
        }
    };

    let total = tracks.len();
    tracing::info!(
        "{} Found {} track(s) in {}",
        label,
        total,
        spec.source_dir.display()
    );

    let common = Arc::new(metadata.common);
    let finished = Arc::new(AtomicUsize::new(0));
    let out_dir = Arc::new(spec.output_dir);

    let mut ids = Vec::with_capacity(total);
    let mut handles = Vec::with_capacity(total);
    for track in tracks {
        ids.push(track.display_name());
        handles.push(tokio::spawn(run_track(
            Arc::clone(&ctx),
            track,
            Arc::clone(&common),
            Arc::clone(&out_dir),
            label.clone(),
            Arc::clone(&finished),
            total,
        )));
    }

    let outcomes: Vec<ConversionOutcome> = join_all(handles)
        .await
        .into_iter()
        .zip(ids)
        .map(|(joined, id)| match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    "{} {}",
                    label,
                    MessagePrefix::Failed.format(&format!("{}: task failed: {}", id, e))
                );
                ConversionOutcome {
                    track_id: id,
                    status: OutcomeStatus::Failed(format!("task failed: {}", e)),
                    interrupted: false,
                }
            }
        })
        .collect();

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    tracing::info!(
        "{} {}",
        label,
        MessagePrefix::Phase.format(&format!("{}/{} track(s) converted", succeeded, total))
    );

    CollectionReport {
        name: spec.name,
        outcomes,
        error: None,
    }
}

async fn discover(
    spec: &CollectionSpec,
) -> ConversionResult<(CollectionMetadata, Vec<TrackDescriptor>)> {
    let metadata = match &spec.metadata {
        Some(path) => {
            let metadata = CollectionMetadata::load(path).await?;
            if metadata.is_empty() {
                tracing::debug!("{} {} has no per-track entries", spec.label(), path.display());
            } else {
                tracing::debug!(
                    "{} Loaded {} track entr(ies) from {}",
                    spec.label(),
                    metadata.len(),
                    path.display()
                );
            }
            metadata
        }
        None => CollectionMetadata::default(),
    };
    let tracks = discover_tracks(spec, &metadata).await?;
    Ok((metadata, tracks))
}

async fn run_track(
    ctx: Arc<BatchContext>,
    track: TrackDescriptor,
    common: Arc<TrackConfig>,
    out_dir: Arc<PathBuf>,
    label: String,
    finished: Arc<AtomicUsize>,
    total: usize,
) -> ConversionOutcome {
    let id = track.display_name();
    let result = convert_track(&ctx, &track, &common, &out_dir, &label).await;
    let k = finished.fetch_add(1, Ordering::SeqCst) + 1;

    match &result {
        Ok(()) => tracing::info!("{} Completed {} ({}/{})", label, id, k, total),
        Err(e) if e.is_interrupted() => {
            tracing::warn!("{} {} interrupted ({}/{})", label, id, k, total)
        }
        Err(e) => tracing::error!(
            "{} {} ({}/{})",
            label,
            MessagePrefix::Failed.format(&format!("{}: {}", id, e)),
            k,
            total
        ),
    }

    ConversionOutcome::from_result(id, &result)
}
