//! Run command implementation.

use std::io::{IsTerminal, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use log::info;
use tankland::render::{AsciiRenderer, LogRenderer, Renderer, render_ascii, render_plain};
use tankland::{Arena, BehaviorCatalog, MatchOutcome};

use super::output::{MatchSummary, format_text};
use super::{ArenaArgs, OutputFormat};

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the config is invalid, fewer than two tanks could be
/// started, or the result cannot be printed.
pub(crate) async fn execute(
    args: &ArenaArgs,
    format: OutputFormat,
    live: bool,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    ensure!(
        !(live && format == OutputFormat::Json),
        "--live draws to stdout and cannot be combined with JSON output"
    );

    let config = args.load()?;
    let seed = config.seed;
    let color = stdout().is_terminal();

    let renderer: Arc<dyn Renderer> = if live {
        Arc::new(AsciiRenderer::new(stdout(), color))
    } else {
        Arc::new(LogRenderer)
    };

    let arena = Arena::new(config.clone(), Arc::clone(&renderer)).context("failed to set up the arena")?;
    let catalog = BehaviorCatalog::builtin();
    let (report, tasks) = arena.launch(&catalog, &config.roster).await;

    if tasks.len() < 2 {
        arena.kill_all().await;
        arena.events().flush().await;
        anyhow::bail!(
            "a match needs at least two tanks, {} started ({} rejected)",
            tasks.len(),
            report.rejected_count()
        );
    }

    let broadcast = live.then(|| arena.spawn_broadcast(Arc::clone(&renderer)));

    let (outcome, timed_out) = match timeout {
        Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), arena.wait_for_outcome()).await {
            Ok(outcome) => (outcome, false),
            Err(_) => {
                info!("no winner after {secs}s");
                (MatchOutcome::Running, true)
            }
        },
        None => (arena.wait_for_outcome().await, false),
    };

    // Keep the board as it ended, then stop everyone still running.
    let last = arena.snapshot().await;
    arena.kill_all().await;
    for task in tasks {
        task.join().await;
    }
    if let Some(broadcast) = broadcast {
        broadcast.await.context("broadcast task failed")?;
    }
    arena.events().flush().await;

    let summary = MatchSummary::new(seed, &report, outcome, timed_out, &last, arena.events().written());
    match format {
        OutputFormat::Text => {
            if !live {
                let board = if color { render_ascii(&last) } else { render_plain(&last) };
                println!("{board}");
            }
            print!("{}", format_text(&summary));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).context("failed to serialize the result")?;
            println!("{json}");
        }
    }

    Ok(())
}
