//! Progress events and their console consumer.
//!
//! The orchestrator is the only producer. A single consumer thread turns
//! events into progress bars and log lines, so workers never touch the
//! terminal.

use crate::output::progress::{create_batch_progress, finish_progress, set_progress};
use crossbeam_channel::{Receiver, Sender};
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::thread::JoinHandle;
use tracing::{error, info, warn};

/// Severity of a [`ProgressEvent::Log`] message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Something was skipped or degraded.
    Warn,
    /// The run failed.
    Error,
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Free-form status line.
    Status(String),
    /// A new directory is being analysed.
    CurrentDirectory {
        /// Directory path.
        path: PathBuf,
        /// 1-based position among the pending directories.
        position: usize,
        /// Number of pending directories.
        total: usize,
    },
    /// Files completed within the current batch.
    BatchProgress {
        /// Files finished so far.
        completed: usize,
        /// Files in the batch.
        total: usize,
    },
    /// Log message.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

/// Sending half of the progress channel.
///
/// A disconnected or disabled sender silently drops events.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    sender: Option<Sender<ProgressEvent>>,
}

impl ProgressSender {
    /// Wrap a channel sender.
    pub fn new(sender: Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// A sender that drops every event.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Emit an event.
    pub fn send(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(event);
        }
    }

    /// Emit a status line.
    pub fn status(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Status(message.into()));
    }

    /// Emit a log message.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.send(ProgressEvent::Log {
            level,
            message: message.into(),
        });
    }
}

/// Spawn the thread that renders progress events on the console.
///
/// The thread exits once every sender has been dropped.
pub fn spawn_console_consumer(events: Receiver<ProgressEvent>, show_bars: bool) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut bar: Option<ProgressBar> = None;

        for event in events {
            match event {
                ProgressEvent::Status(message) => {
                    with_bar_suspended(bar.as_ref(), || info!("{message}"));
                }
                ProgressEvent::CurrentDirectory {
                    path,
                    position,
                    total,
                } => {
                    finish_progress(bar.take(), "done");
                    info!("[{position}/{total}] Analysing {}", path.display());
                }
                ProgressEvent::BatchProgress { completed, total } => {
                    let resized = bar.as_ref().and_then(ProgressBar::length) != Some(total as u64);
                    if completed == 0 || resized {
                        finish_progress(bar.take(), "done");
                        bar = create_batch_progress(total, "", show_bars);
                    }
                    set_progress(bar.as_ref(), completed);
                }
                ProgressEvent::Log { level, message } => {
                    with_bar_suspended(bar.as_ref(), || match level {
                        LogLevel::Info => info!("{message}"),
                        LogLevel::Warn => warn!("{message}"),
                        LogLevel::Error => error!("{message}"),
                    });
                }
            }
        }

        finish_progress(bar, "done");
    })
}

fn with_bar_suspended(bar: Option<&ProgressBar>, f: impl FnOnce()) {
    match bar {
        Some(bar) => bar.suspend(f),
        None => f(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_delivers_events() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let sender = ProgressSender::new(tx);
        sender.status("starting");
        sender.log(LogLevel::Warn, "skipped");

        assert_eq!(rx.recv().unwrap(), ProgressEvent::Status("starting".to_string()));
        assert_eq!(
            rx.recv().unwrap(),
            ProgressEvent::Log {
                level: LogLevel::Warn,
                message: "skipped".to_string()
            }
        );
    }

    #[test]
    fn test_disabled_sender_drops_events() {
        ProgressSender::disabled().status("ignored");
    }

    #[test]
    fn test_consumer_exits_when_senders_drop() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn_console_consumer(rx, false);
        let sender = ProgressSender::new(tx);
        sender.send(ProgressEvent::CurrentDirectory {
            path: PathBuf::from("/data"),
            position: 1,
            total: 1,
        });
        sender.send(ProgressEvent::BatchProgress {
            completed: 0,
            total: 3,
        });
        sender.send(ProgressEvent::BatchProgress {
            completed: 3,
            total: 3,
        });
        drop(sender);
        handle.join().unwrap();
    }
}
