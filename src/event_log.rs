//! Append-only event log.
//!
//! Producers hand entries to an unbounded channel, which never blocks, so
//! the arena can record from inside its critical section and the log order
//! is the commit order. A single writer task stamps each entry, keeps the
//! most recent ones in memory, optionally appends every one to a JSON-lines
//! file and forwards it to the renderer. The file is the full record.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use log::warn;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};

use crate::arena::Snapshot;
use crate::render::Renderer;

/// Entries kept in memory. Older ones survive only in the log file.
pub const HISTORY_LIMIT: usize = 1024;

/// What kind of event an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A tank joined.
    Created,
    /// A tank creation was refused.
    Refused,
    /// A state-changing action.
    Action,
    /// A tank was destroyed.
    Death,
    /// A behavior failed and its tank was killed.
    Fault,
    /// The last tank standing.
    Victory,
}

/// One line of history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Milliseconds since the UNIX epoch when the writer handled the entry.
    pub timestamp_ms: u64,
    /// Event kind.
    pub kind: EntryKind,
    /// Human-readable description.
    pub message: String,
    /// Board and registry right after the event.
    pub snapshot: Snapshot,
}

enum Command {
    Record {
        kind: EntryKind,
        message: String,
        snapshot: Snapshot,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to the event log. Cheap to clone.
#[derive(Clone)]
pub struct EventLog {
    sender: mpsc::UnboundedSender<Command>,
    history: Arc<Mutex<VecDeque<LogEntry>>>,
    written: Arc<AtomicUsize>,
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("entries", &self.len())
            .field("written", &self.written())
            .finish_non_exhaustive()
    }
}

impl EventLog {
    /// Start the writer task.
    ///
    /// When `path` is given, entries are appended to it as JSON lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(renderer: Arc<dyn Renderer>, path: Option<&Path>) -> std::io::Result<Self> {
        let file = match path {
            Some(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Some(BufWriter::new(File::from_std(file)))
            }
            None => None,
        };

        Ok(Self::spawn(renderer, file, HISTORY_LIMIT))
    }

    fn spawn(renderer: Arc<dyn Renderer>, file: Option<BufWriter<File>>, limit: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let history = Arc::new(Mutex::new(VecDeque::new()));
        let written = Arc::new(AtomicUsize::new(0));
        let writer = Writer {
            receiver,
            history: Arc::clone(&history),
            written: Arc::clone(&written),
            limit,
            renderer,
            file,
        };
        tokio::spawn(writer.run());

        Self {
            sender,
            history,
            written,
        }
    }

    /// Queue an entry. Never blocks.
    pub fn record(&self, kind: EntryKind, message: impl Into<String>, snapshot: Snapshot) {
        let command = Command::Record {
            kind,
            message: message.into(),
            snapshot,
        };
        if self.sender.send(command).is_err() {
            warn!("event log writer has stopped; entry dropped");
        }
    }

    /// Wait until every entry queued so far has been written.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    /// The most recent entries (up to [`HISTORY_LIMIT`]), oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Messages of the retained entries, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Number of entries held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of entries written since the log started, including those
    /// no longer held in memory.
    #[must_use]
    pub fn written(&self) -> usize {
        self.written.load(Ordering::Acquire)
    }

    /// Whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Writer {
    receiver: mpsc::UnboundedReceiver<Command>,
    history: Arc<Mutex<VecDeque<LogEntry>>>,
    written: Arc<AtomicUsize>,
    limit: usize,
    renderer: Arc<dyn Renderer>,
    file: Option<BufWriter<File>>,
}

impl Writer {
    async fn run(mut self) {
        while let Some(command) = self.receiver.recv().await {
            match command {
                Command::Record {
                    kind,
                    message,
                    snapshot,
                } => {
                    let entry = LogEntry {
                        timestamp_ms: now_ms(),
                        kind,
                        message,
                        snapshot,
                    };
                    self.write(entry).await;
                }
                Command::Flush(done) => {
                    self.flush_file().await;
                    let _ = done.send(());
                }
            }
        }
        self.flush_file().await;
    }

    async fn write(&mut self, entry: LogEntry) {
        if let Some(file) = self.file.as_mut() {
            let written = match serde_json::to_string(&entry) {
                Ok(mut line) => {
                    line.push('\n');
                    file.write_all(line.as_bytes()).await
                }
                Err(err) => Err(std::io::Error::other(err)),
            };
            if let Err(err) = written {
                warn!("event log file disabled: {err}");
                self.file = None;
            }
        }

        self.renderer.log_message(&entry.message);
        if entry.kind == EntryKind::Victory {
            self.renderer.announce(&entry.message);
        }

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() >= self.limit {
            history.pop_front();
        }
        history.push_back(entry);
        self.written.fetch_add(1, Ordering::Release);
    }

    async fn flush_file(&mut self) {
        if let Some(file) = self.file.as_mut()
            && let Err(err) = file.flush().await
        {
            warn!("event log flush failed: {err}");
            self.file = None;
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
