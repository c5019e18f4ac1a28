//! Crawl progress reporting

use std::io::{self, Write};
use std::sync::Mutex;

/// Receives a notification every time a traversal task completes
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, done: usize, total: usize);

    /// Called once after the root traversal has returned
    fn finish(&self) {}
}

/// Formats the progress line, e.g. `"2/3 (66.67%) tasks done."`
pub fn progress_message(done: usize, total: usize) -> String {
    let ratio = if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    };
    format!("{}/{} ({:.2}%) tasks done.", done, total, ratio * 100.0)
}

/// Observer that ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&self, _done: usize, _total: usize) {}
}

/// Rewrites a single stdout line in place
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    /// Width of the last line written, for padding over longer predecessors
    last_width: Mutex<usize>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_progress(&self, done: usize, total: usize) {
        let message = progress_message(done, total);
        let mut last_width = self
            .last_width
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let padding = last_width.saturating_sub(message.len());
        let mut stdout = io::stdout().lock();
        // Progress output is best effort
        let _ = write!(stdout, "\r{}{}", message, " ".repeat(padding));
        let _ = stdout.flush();

        *last_width = message.len();
    }

    fn finish(&self) {
        let mut last_width = self
            .last_width
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if *last_width == 0 {
            return;
        }

        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "\r{}\r", " ".repeat(*last_width));
        let _ = stdout.flush();
        *last_width = 0;
    }
}
