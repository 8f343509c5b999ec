use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::spreadsheet::Row;

/// Engines invoked per non-blank English field.
pub const ENGINES_PER_FIELD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    Started { total: usize },
    Advanced { done: usize, total: usize },
    /// Run over, successful or not. The indicator goes back to zero.
    Reset,
}

impl Progress {
    /// Value for a 0-100 progress indicator.
    pub fn percent(&self) -> f32 {
        match *self {
            Progress::Advanced { done, total } if total > 0 => {
                (done as f32 / total as f32 * 100.0).min(100.0)
            }
            _ => 0.0,
        }
    }
}

/// Number of synthesis attempts a run will make.
pub fn count_tasks(rows: &[Row]) -> usize {
    rows.iter()
        .flat_map(|row| [row.front(), row.example()])
        .filter(|text| !text.trim().is_empty())
        .count()
        * ENGINES_PER_FIELD
}

/// Counts finished attempts and publishes them. A dropped receiver (window
/// closed mid-run) is ignored.
pub struct ProgressTracker {
    done: usize,
    total: usize,
    tx: UnboundedSender<Progress>,
}

impl ProgressTracker {
    pub fn start(total: usize, tx: UnboundedSender<Progress>) -> Self {
        let _ = tx.send(Progress::Started { total });
        Self { done: 0, total, tx }
    }

    pub fn advance(&mut self) {
        self.done = (self.done + 1).min(self.total);
        debug!(done = self.done, total = self.total, "progress");
        let _ = self.tx.send(Progress::Advanced {
            done: self.done,
            total: self.total,
        });
    }

    pub fn done(&self) -> usize {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(front: &str, example: &str) -> Row {
        Row::from_cells([front, "", "", example].map(String::from))
    }

    #[test]
    fn counts_two_per_non_blank_field() {
        assert_eq!(count_tasks(&[row("hello", "world")]), 4);
        assert_eq!(count_tasks(&[row("hello", "   "), row("", "ex")]), 4);
        assert_eq!(count_tasks(&[row("", ""), row(" \t", "")]), 0);
        assert_eq!(count_tasks(&[]), 0);
    }

    #[test]
    fn percent_tracks_ratio() {
        assert_eq!(Progress::Advanced { done: 1, total: 4 }.percent(), 25.0);
        assert_eq!(Progress::Advanced { done: 4, total: 4 }.percent(), 100.0);
        assert_eq!(Progress::Started { total: 4 }.percent(), 0.0);
        assert_eq!(Progress::Reset.percent(), 0.0);
    }

    #[test]
    fn tracker_never_passes_total() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut tracker = ProgressTracker::start(2, tx);
        for _ in 0..3 {
            tracker.advance();
        }
        assert_eq!(tracker.done(), 2);

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen[0], Progress::Started { total: 2 });
        assert_eq!(seen.last(), Some(&Progress::Advanced { done: 2, total: 2 }));
    }
}
