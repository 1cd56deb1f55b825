//! loopfade CLI - batch conversion of looping game music
//!
//! Loads `loopfade.toml` (creating it with defaults when missing), applies
//! command-line overrides, then converts every configured collection
//! concurrently. Ctrl-C stops every running decoder and encoder; the
//! report is still printed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use loopfade_core::config::{ConfigManager, Settings};
use loopfade_core::logging::{init_tracing, init_tracing_with_file, LogLevel, MessagePrefix};
use loopfade_core::orchestrator::{
    describe_plan, prepare_output_dir, BatchContext, BatchOrchestrator, BatchReport,
    CollectionSpec, ConversionOptions,
};
use loopfade_core::pipeline::ProcessRegistry;

/// Loop, fade and tag chiptune tracks into finished audio files
#[derive(Parser, Debug)]
#[command(name = "loopfade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output directory (one subdirectory per collection)
    #[arg(default_value = "flac-output")]
    output_dir: PathBuf,

    /// Image attached to every output as cover art
    #[arg(long)]
    cover: Option<String>,

    /// Loops after the first play-through
    #[arg(long)]
    loops: Option<u32>,

    /// Seconds between the end of the last loop and the fade start
    #[arg(long)]
    fade_delay: Option<f64>,

    /// Fade length in seconds
    #[arg(long)]
    fade_duration: Option<f64>,

    /// Replace the output directory if it already exists
    #[arg(short, long)]
    force: bool,

    /// Settings file
    #[arg(short, long, default_value = "loopfade.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Also write a timestamped log file to this directory
    #[arg(long)]
    log_dir: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded settings.
    fn apply(&self, settings: &mut Settings) {
        let conversion = &mut settings.conversion;
        if let Some(cover) = &self.cover {
            conversion.cover_art = Some(cover.clone());
        }
        if let Some(loops) = self.loops {
            conversion.loop_count = loops;
        }
        if let Some(delay) = self.fade_delay {
            conversion.fade_delay = delay;
        }
        if let Some(duration) = self.fade_duration {
            conversion.fade_duration = duration;
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if let Some(dir) = &self.log_dir {
            settings.logging.log_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = ConfigManager::new(&cli.config);
    let created = config
        .load_or_create()
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    cli.apply(config.settings_mut());

    let logging = &config.settings().logging;
    let _log_guard = match &logging.log_dir {
        Some(dir) => Some(
            init_tracing_with_file(logging.level, Path::new(dir))
                .with_context(|| format!("Failed to open log directory {}", dir))?,
        ),
        None => {
            init_tracing(logging.level);
            None
        }
    };
    if created {
        tracing::info!("No config at {}, wrote defaults", config.path().display());
    }
    let settings = config.into_settings();

    prepare_output_dir(&cli.output_dir, cli.force).await?;

    let options = ConversionOptions::from(&settings.conversion);
    tracing::info!("{}", describe_plan(&options));
    tracing::info!("Everything will run concurrently. You may see a lot of CPU usage for a bit.");
    tracing::info!("{}", MessagePrefix::Phase.format("Running"));

    let registry = Arc::new(ProcessRegistry::new());
    {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                registry.interrupt_all();
            }
        });
    }

    let collections = settings
        .collections
        .iter()
        .map(|c| CollectionSpec::from_settings(c, &cli.output_dir))
        .collect();
    let ctx = BatchContext::new(options, settings.tools.clone(), registry);
    let report = BatchOrchestrator::new(ctx).run(collections).await;

    print_summary(&report);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_summary(report: &BatchReport) {
    tracing::info!("{}", MessagePrefix::Phase.format("Summary"));
    for collection in &report.collections {
        match &collection.error {
            Some(error) => tracing::error!(
                "{}",
                MessagePrefix::Failed.format(&format!("{}: {}", collection.name, error))
            ),
            None => tracing::info!(
                "{}: {}/{} converted",
                collection.name,
                collection.succeeded(),
                collection.outcomes.len()
            ),
        }
    }

    for (collection, outcome) in report.failed_tracks() {
        tracing::error!(
            "{}",
            MessagePrefix::Failed.format(&format!(
                "{} / {}: {}",
                collection,
                outcome.track_id,
                outcome.reason().unwrap_or("unknown")
            ))
        );
    }

    if report.was_interrupted() {
        tracing::warn!("{}", MessagePrefix::Warning.format("Batch was interrupted"));
    } else if report.is_success() {
        tracing::info!(
            "{}",
            MessagePrefix::Success.format(&format!("{} track(s) converted", report.succeeded()))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_leave_settings_alone() {
        let cli = Cli::parse_from(["loopfade"]);
        assert_eq!(cli.output_dir, PathBuf::from("flac-output"));
        assert_eq!(cli.config, PathBuf::from("loopfade.toml"));
        assert!(!cli.force);

        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn flags_override_conversion() {
        let cli = Cli::parse_from([
            "loopfade",
            "out",
            "--cover",
            "art/cover.jpg",
            "--loops",
            "3",
            "--fade-delay",
            "1.5",
            "--fade-duration",
            "10",
            "-f",
            "--log-level",
            "debug",
        ]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);

        assert_eq!(cli.output_dir, PathBuf::from("out"));
        assert!(cli.force);
        assert_eq!(settings.conversion.loop_count, 3);
        assert_eq!(settings.conversion.fade_delay, 1.5);
        assert_eq!(settings.conversion.fade_duration, 10.0);
        assert_eq!(
            settings.conversion.cover_art.as_deref(),
            Some("art/cover.jpg")
        );
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn bad_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["loopfade", "--log-level", "loud"]).is_err());
    }
}
