//! Renderer collaborator and ASCII board rendering.
//!
//! The arena never draws anything itself. It pushes snapshots, log lines and
//! the victory notice to a [`Renderer`].

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::arena::{Location, OccupantKind, Snapshot};

/// Receives what the arena wants to show.
///
/// Called from the broadcast and event-log tasks, so implementations must be
/// cheap and must not block for long.
pub trait Renderer: Send + Sync {
    /// Show a fresh board snapshot.
    fn render(&self, snapshot: &Snapshot);

    /// Append a line to the message feed.
    fn log_message(&self, text: &str);

    /// Show a prominent notice. Used once, for the victory.
    fn announce(&self, text: &str);
}

/// ANSI colors handed out to tanks in name order.
const TANK_COLORS: [&str; 6] = [
    "\x1b[31m", // Red
    "\x1b[34m", // Blue
    "\x1b[32m", // Green
    "\x1b[33m", // Yellow
    "\x1b[35m", // Magenta
    "\x1b[36m", // Cyan
];

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GRAY: &str = "\x1b[90m";

/// Render a snapshot to ASCII with ANSI colors.
///
/// Output format:
/// ```text
/// Tanks alive: 2
/// ┌─────────────────────┐
/// │ . . . . . . . . . . │
/// │ . A . . * . . . . . │
/// │ . . . . . . . B . . │
/// └─────────────────────┘
///
/// Legend: A-Z=Tank  *=Mine  .=Empty
///
/// A alpha   HP 100  EN  87  SH  0%  at (1, 1)
/// B beta    HP  64  EN  12  SH 50%  at (2, 7)
/// ```
#[must_use]
pub fn render_ascii(snapshot: &Snapshot) -> String {
    render_board(snapshot, true)
}

/// Same as [`render_ascii`] without color codes.
#[must_use]
pub fn render_plain(snapshot: &Snapshot) -> String {
    render_board(snapshot, false)
}

fn render_board(snapshot: &Snapshot, color: bool) -> String {
    let mut output = String::new();
    let size = i32::from(snapshot.size);
    let width = usize::from(snapshot.size) * 2 + 1;

    output.push_str(&format!("Tanks alive: {}\n", snapshot.tanks.len()));

    output.push('┌');
    output.push_str(&"─".repeat(width));
    output.push_str("┐\n");

    for row in 0..size {
        output.push_str("│ ");
        for col in 0..size {
            render_cell(&mut output, snapshot, Location::new(row, col), color);
            output.push(' ');
        }
        output.push_str("│\n");
    }

    output.push('└');
    output.push_str(&"─".repeat(width));
    output.push_str("┘\n");

    output.push_str("\nLegend: A-Z=Tank  *=Mine  .=Empty\n\n");

    for (index, tank) in snapshot.tanks.iter().enumerate() {
        let (start, end) = if color { (tank_color(index), RESET) } else { ("", "") };
        output.push_str(&format!(
            "{start}{}{end} {:<8} HP {:>3}  EN {:>3}  SH {:>2.0}%  at {}\n",
            tank_symbol(&tank.name),
            tank.name,
            tank.health,
            tank.energy,
            tank.shield * 100.0,
            tank.location,
        ));
    }

    output
}

/// Render a single cell.
fn render_cell(output: &mut String, snapshot: &Snapshot, location: Location, color: bool) {
    let Some(cell) = snapshot.cell(location) else {
        if color {
            output.push_str(&format!("{GRAY}.{RESET}"));
        } else {
            output.push('.');
        }
        return;
    };

    match (cell.kind, &cell.tank) {
        (OccupantKind::Tank, Some(tank)) => {
            let symbol = tank_symbol(&tank.name);
            if color {
                let index = snapshot
                    .tanks
                    .iter()
                    .position(|t| t.name == tank.name)
                    .unwrap_or(0);
                output.push_str(&format!("{}{BOLD}{symbol}{RESET}", tank_color(index)));
            } else {
                output.push(symbol);
            }
        }
        (OccupantKind::Mine, _) => output.push('*'),
        _ => output.push('?'),
    }
}

/// Board symbol for a tank: the first letter of its name, upper-cased.
#[must_use]
pub fn tank_symbol(name: &str) -> char {
    name.chars()
        .next()
        .map_or('?', |c| c.to_ascii_uppercase())
}

fn tank_color(index: usize) -> &'static str {
    TANK_COLORS[index % TANK_COLORS.len()]
}

/// Sends everything to the `log` facade. The default for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&self, snapshot: &Snapshot) {
        log::trace!("\n{}", render_plain(snapshot));
    }

    fn log_message(&self, text: &str) {
        log::info!("{text}");
    }

    fn announce(&self, text: &str) {
        log::info!("*** {text} ***");
    }
}

/// Writes every frame and message to a stream.
#[derive(Debug)]
pub struct AsciiRenderer<W> {
    out: Mutex<W>,
    color: bool,
}

impl<W: Write + Send> AsciiRenderer<W> {
    /// Render into `out`, with or without ANSI colors.
    #[must_use]
    pub const fn new(out: W, color: bool) -> Self {
        Self {
            out: Mutex::new(out),
            color,
        }
    }

    /// Take the stream back.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Display only; a closed pipe must not take the arena down.
        let _ = out.write_all(text.as_bytes()).and_then(|()| out.flush());
    }
}

impl<W: Write + Send> Renderer for AsciiRenderer<W> {
    fn render(&self, snapshot: &Snapshot) {
        let frame = render_board(snapshot, self.color);
        if self.color {
            // Clear screen and home the cursor.
            self.write(&format!("\x1b[2J\x1b[H{frame}"));
        } else {
            self.write(&format!("{frame}\n"));
        }
    }

    fn log_message(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    fn announce(&self, text: &str) {
        let bar = "=".repeat(text.chars().count() + 4);
        self.write(&format!("{bar}\n  {text}\n{bar}\n"));
    }
}

/// Messages a [`RecordingRenderer`] keeps by default.
pub const FEED_LIMIT: usize = 256;

/// What a [`RecordingRenderer`] has received so far.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    /// Most recent snapshot.
    pub latest: Option<Snapshot>,
    /// Number of snapshots received.
    pub frames: usize,
    /// The latest messages, oldest first.
    pub messages: VecDeque<String>,
    /// Announcements, oldest first.
    pub announcements: Vec<String>,
}

/// Keeps the latest frame, a bounded message feed and every announcement.
/// Backs the TUI and the tests.
#[derive(Debug)]
pub struct RecordingRenderer {
    inner: Mutex<Recording>,
    feed_limit: usize,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::with_feed_limit(FEED_LIMIT)
    }
}

impl RecordingRenderer {
    /// Create an empty recorder keeping [`FEED_LIMIT`] messages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty recorder keeping the last `limit` messages.
    #[must_use]
    pub fn with_feed_limit(limit: usize) -> Self {
        Self {
            inner: Mutex::new(Recording::default()),
            feed_limit: limit.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of everything received so far.
    #[must_use]
    pub fn recording(&self) -> Recording {
        self.lock().clone()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot> {
        self.lock().latest.clone()
    }

    /// The last `count` messages, oldest first.
    #[must_use]
    pub fn recent_messages(&self, count: usize) -> Vec<String> {
        let recording = self.lock();
        let skip = recording.messages.len().saturating_sub(count);
        recording.messages.iter().skip(skip).cloned().collect()
    }

    /// Announcements received so far.
    #[must_use]
    pub fn announcements(&self) -> Vec<String> {
        self.lock().announcements.clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, snapshot: &Snapshot) {
        let mut recording = self.lock();
        recording.latest = Some(snapshot.clone());
        recording.frames += 1;
    }

    fn log_message(&self, text: &str) {
        let mut recording = self.lock();
        if recording.messages.len() >= self.feed_limit {
            recording.messages.pop_front();
        }
        recording.messages.push_back(text.to_owned());
    }

    fn announce(&self, text: &str) {
        self.lock().announcements.push(text.to_owned());
    }
}
