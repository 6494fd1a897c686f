//! Batch progress bookkeeping
//!
//! Pure state, no I/O. One instance lives for the whole session and is
//! reset by [`BatchProgress::start`] at the beginning of every batch.

use serde::Serialize;

/// What the batch is doing with the current file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Converting,
    Importing,
}

/// Progress of a running batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchProgress {
    total: usize,
    current_index: usize,
    current_name: String,
    phase: Phase,
    running: bool,
    cancelled: bool,
}

impl BatchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every field for a new batch of `total` items
    pub fn start(&mut self, total: usize) {
        self.total = total;
        self.current_index = 0;
        self.current_name.clear();
        self.phase = Phase::Idle;
        self.running = true;
        self.cancelled = false;
    }

    pub fn update(&mut self, index: usize, name: &str, phase: Phase) {
        self.current_index = index;
        self.current_name = name.to_string();
        self.phase = phase;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.running = false;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_name(&self) -> &str {
        &self.current_name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Percent complete (0.0 - 100.0)
    ///
    /// Conversion is about half of one file's work, so half a file is
    /// credited while converting.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        let mut percent = (self.current_index as f64 / total) * 100.0;
        if self.phase == Phase::Converting {
            percent += (0.5 / total) * 100.0;
        }
        percent.min(100.0)
    }

    /// Host status line, empty when no batch is running
    pub fn status_text(&self) -> String {
        if !self.running {
            return String::new();
        }
        let label = match self.phase {
            Phase::Converting => "Converting",
            _ => "Importing",
        };
        format!(
            "Ladder: {} {} ({}/{})",
            label,
            self.current_name,
            self.current_index + 1,
            self.total
        )
    }
}
