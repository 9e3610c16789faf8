use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reveal_config::RevealConfig;
use reveal_scene::{PageSpec, QueuedEvent, Stage, StageEvent};

#[derive(Parser)]
#[command(name = "reveal")]
#[command(author, version, about = "Headless driver for scroll-triggered page animations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./reveal.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a page, script a scroll through it and report every event
    Run {
        /// Page spec (defaults to `page.path` from the configuration)
        page: Option<PathBuf>,
        /// Scroll positions to visit in order, comma separated
        #[arg(short, long, value_delimiter = ',')]
        positions: Vec<f64>,
        /// Longest time to let each position settle, in milliseconds
        #[arg(long, default_value_t = 5000.0)]
        settle_ms: f64,
        /// Print events as JSON lines on stdout instead of logging them
        #[arg(long)]
        json: bool,
    },
    /// Validate a page spec by mounting every section
    Check {
        /// Page spec to validate
        page: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run {
            page,
            positions,
            settle_ms,
            json,
        } => {
            let path = page
                .or_else(|| config.page.path.clone())
                .context("no page spec given and `page.path` is not configured")?;
            run(&config, &path, positions, settle_ms, json)
        }
        Commands::Check { page } => check(&config, &page),
    }
}

fn load_config(path: Option<&Path>) -> Result<RevealConfig> {
    match path {
        Some(path) => {
            let mut config = RevealConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.merge_with_env();
            config.validate()?;
            Ok(config)
        }
        None => Ok(RevealConfig::load()?),
    }
}

fn run(
    config: &RevealConfig,
    path: &Path,
    positions: Vec<f64>,
    settle_ms: f64,
    json: bool,
) -> Result<()> {
    let page = PageSpec::load(path).with_context(|| format!("loading {}", path.display()))?;
    let mut stage = Stage::new(config);

    let mut handles = Vec::new();
    for section in &page.sections {
        handles.push(stage.mount(section)?);
    }
    tracing::info!(sections = handles.len(), page = %path.display(), "page mounted");

    // Down to the bottom and back up unless told otherwise
    let positions = if positions.is_empty() {
        let max = config.stage.max_scroll();
        vec![max / 2.0, max, 0.0]
    } else {
        positions
    };

    let mut total = 0;
    stage.settle(settle_ms);
    total += report(&mut stage, json)?;
    for y in positions {
        stage.scroll_to(y);
        let spent = stage.settle(settle_ms);
        tracing::info!(y = stage.current_position().y, spent_ms = spent, "scroll settled");
        total += report(&mut stage, json)?;
    }

    for handle in &handles {
        stage.unmount(handle);
    }
    total += report(&mut stage, json)?;

    tracing::info!(
        events = total,
        frames = stage.frame(),
        elapsed_ms = stage.now_ms(),
        "run finished"
    );
    Ok(())
}

fn report(stage: &mut Stage, json: bool) -> Result<usize> {
    let events = stage.drain_events();
    for event in &events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            log_event(event);
        }
    }
    Ok(events.len())
}

fn log_event(queued: &QueuedEvent) {
    let QueuedEvent {
        seq,
        frame,
        time_ms,
        event,
    } = queued;
    match event {
        StageEvent::Trigger(trigger) => tracing::info!(
            seq,
            frame,
            time_ms,
            trigger = %trigger.trigger,
            kind = ?trigger.kind,
            direction = ?trigger.direction,
            y = trigger.position,
            "trigger"
        ),
        StageEvent::Timeline(timeline) => tracing::info!(
            seq,
            frame,
            time_ms,
            timeline = %timeline.timeline(),
            element = timeline.element().map(|e| e.as_str()).unwrap_or("-"),
            "{timeline:?}"
        ),
        StageEvent::Interaction(interaction) => tracing::info!(
            seq,
            frame,
            time_ms,
            element = %interaction.element(),
            "{interaction:?}"
        ),
    }
}

fn check(config: &RevealConfig, path: &Path) -> Result<()> {
    let page = PageSpec::load(path).with_context(|| format!("loading {}", path.display()))?;
    let mut stage = Stage::new(config);

    let mut failures = 0;
    for section in &page.sections {
        match stage.mount(section) {
            Ok(handle) => {
                println!(
                    "ok    {} ({} timelines, {} interactions)",
                    section.name,
                    section.timelines.len(),
                    section.interactions.len()
                );
                stage.unmount(&handle);
            }
            Err(err) => {
                failures += 1;
                println!("error {}: {err}", section.name);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} sections failed to mount", page.sections.len());
    }
    Ok(())
}
