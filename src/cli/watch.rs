//! Watch command implementation - Interactive TUI viewer.

use std::collections::HashMap;
use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, ensure};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tankland::render::{RecordingRenderer, Renderer, tank_symbol};
use tankland::{Arena, BehaviorCatalog, Location, MatchOutcome, OccupantKind, Snapshot};

use super::ArenaArgs;

/// Time between redraws.
const FRAME: Duration = Duration::from_millis(50);

/// Lines kept in the message feed.
const FEED_LINES: u16 = 8;

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if the config is invalid, no tank could be started, or
/// the terminal fails.
pub(crate) async fn execute(args: &ArenaArgs) -> anyhow::Result<()> {
    let config = args.load()?;
    let recorder = Arc::new(RecordingRenderer::new());
    let renderer: Arc<dyn Renderer> = recorder.clone();

    let arena = Arena::new(config.clone(), Arc::clone(&renderer)).context("failed to set up the arena")?;
    let (report, tasks) = arena.launch(&BehaviorCatalog::builtin(), &config.roster).await;
    ensure!(
        !tasks.is_empty(),
        "no tank could be started ({} rejected)",
        report.rejected_count()
    );

    let broadcast = arena.spawn_broadcast(renderer);
    let app = App {
        arena: arena.clone(),
        recorder,
        rejected: report.rejected_count(),
        started: Instant::now(),
    };

    let result = run_tui(&app).await;

    arena.kill_all().await;
    for task in tasks {
        task.join().await;
    }
    broadcast.abort();
    arena.events().flush().await;

    result
}

/// App state for the TUI.
struct App {
    arena: Arena,
    recorder: Arc<RecordingRenderer>,
    rejected: usize,
    started: Instant,
}

async fn run_tui(app: &App) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let result = event_loop(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &App) -> anyhow::Result<()> {
    loop {
        let outcome = app.arena.outcome();
        let snapshot = app.recorder.latest().unwrap_or_default();
        let feed = app.recorder.recent_messages(usize::from(FEED_LINES));

        terminal.draw(|f| ui(f, app, &outcome, &snapshot, &feed))?;

        // Drain pending input without blocking the runtime.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
            {
                return Ok(());
            }
        }

        tokio::time::sleep(FRAME).await;
    }
}

fn ui(f: &mut Frame, app: &App, outcome: &MatchOutcome, snapshot: &Snapshot, feed: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Header
            Constraint::Min(10),                // Board and tanks
            Constraint::Length(FEED_LINES + 2), // Event feed
            Constraint::Length(3),              // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], app, outcome, snapshot);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_board(f, main_chunks[0], snapshot);
    render_tanks(f, main_chunks[1], snapshot);
    render_feed(f, chunks[2], feed);
    render_footer(f, chunks[3], outcome);
}

fn render_header(f: &mut Frame, area: Rect, app: &App, outcome: &MatchOutcome, snapshot: &Snapshot) {
    let status = match outcome {
        MatchOutcome::Running => "RUNNING".to_owned(),
        MatchOutcome::Winner(name) => format!("WINNER: {name}"),
        MatchOutcome::Destroyed => "ALL DESTROYED".to_owned(),
    };

    let title = format!(
        " Tankland | Tanks alive: {} | Rejected: {} | {} | {:.1}s ",
        snapshot.tanks.len(),
        app.rejected,
        status,
        app.started.elapsed().as_secs_f64()
    );

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn render_board(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let colors: HashMap<&str, Color> = snapshot
        .tanks
        .iter()
        .enumerate()
        .map(|(index, tank)| (tank.name.as_str(), tank_color(index)))
        .collect();
    let cells: HashMap<Location, _> = snapshot.cells.iter().map(|cell| (cell.location, cell)).collect();

    // Show as much of the board as fits
    let size = i32::from(snapshot.size);
    let visible_rows = i32::from(area.height.saturating_sub(2)).min(size);
    let visible_cols = i32::from(area.width.saturating_sub(2) / 2).min(size);

    let mut lines: Vec<Line> = Vec::new();
    for row in 0..visible_rows {
        let mut spans = Vec::new();
        for col in 0..visible_cols {
            let (symbol, style) = match cells.get(&Location::new(row, col)) {
                None => (".".to_owned(), Style::default().fg(Color::DarkGray)),
                Some(cell) => match (cell.kind, &cell.tank) {
                    (OccupantKind::Tank, Some(tank)) => (
                        tank_symbol(&tank.name).to_string(),
                        Style::default()
                            .fg(colors.get(tank.name.as_str()).copied().unwrap_or(Color::White))
                            .add_modifier(Modifier::BOLD),
                    ),
                    (OccupantKind::Mine, _) => ("*".to_owned(), Style::default().fg(Color::Yellow)),
                    _ => ("#".to_owned(), Style::default().fg(Color::Gray)),
                },
            };
            spans.push(Span::styled(format!("{symbol} "), style));
        }
        lines.push(Line::from(spans));
    }

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Board "));
    f.render_widget(board, area);
}

fn render_tanks(f: &mut Frame, area: Rect, snapshot: &Snapshot) {
    let mut lines = vec![Line::from("")];

    for (index, tank) in snapshot.tanks.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} {}", tank_symbol(&tank.name), tank.name),
                Style::default().fg(tank_color(index)).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  at {}", tank.location)),
        ]));
        lines.push(Line::from(format!("  HP {:>3}  EN {:>3}", tank.health, tank.energy)));
        if tank.shield > 0.0 {
            lines.push(Line::from(format!("  Shield {:.0}%", tank.shield * 100.0)));
        }
        lines.push(Line::from(""));
    }

    let stats = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Tanks "))
        .wrap(Wrap { trim: false });

    f.render_widget(stats, area);
}

fn render_feed(f: &mut Frame, area: Rect, feed: &[String]) {
    let lines: Vec<Line> = feed.iter().map(|message| Line::from(message.as_str())).collect();
    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Events "));
    f.render_widget(widget, area);
}

fn tank_color(index: usize) -> Color {
    const COLORS: [Color; 8] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::LightRed,
        Color::LightBlue,
    ];
    COLORS[index % COLORS.len()]
}

fn render_footer(f: &mut Frame, area: Rect, outcome: &MatchOutcome) {
    let controls = if outcome.is_finished() {
        " Match over  [q] Quit "
    } else {
        " [q] Quit (destroys every tank) "
    };

    let footer = Paragraph::new(controls)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}
