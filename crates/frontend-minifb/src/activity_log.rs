//! Bounded activity log shown next to the display.

use std::collections::VecDeque;

use lcdsim_core::{Event, LogSink};

pub const DEFAULT_LINES: usize = 5;

/// Keeps the newest `capacity` messages; older ones fall off the front.
pub struct ActivityLog {
    lines: VecDeque<String>,
    capacity: usize,
    /// Total messages ever logged, for "new since" queries
    total: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        ActivityLog { lines: VecDeque::with_capacity(capacity), capacity, total: 0 }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.total += 1;
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Retained messages logged after the first `seen` ones.
    pub fn since(&self, seen: usize) -> impl Iterator<Item = &str> {
        let dropped = self.total - self.lines.len();
        let skip = seen.saturating_sub(dropped);
        self.lines.iter().skip(skip).map(String::as_str)
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(DEFAULT_LINES)
    }
}

impl LogSink for ActivityLog {
    fn log(&mut self, event: &Event) {
        self.push(event.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_newest() {
        let mut log = ActivityLog::new(3);
        for i in 0..5 {
            log.push(format!("line {}", i));
        }
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
        assert_eq!(log.last(), Some("line 4"));
        assert_eq!(log.total(), 5);
    }

    #[test]
    fn test_since() {
        let mut log = ActivityLog::new(3);
        log.push("a");
        log.push("b");
        let seen = log.total();
        log.push("c");
        log.push("d");
        assert_eq!(log.since(seen).collect::<Vec<_>>(), vec!["c", "d"]);
        assert_eq!(log.since(0).count(), 3);
    }

    #[test]
    fn test_zero_capacity() {
        let mut log = ActivityLog::new(0);
        log.push("x");
        assert_eq!(log.lines().count(), 0);
        assert_eq!(log.total(), 1);
    }

    #[test]
    fn test_sink_formats_events() {
        let mut log = ActivityLog::default();
        log.log(&Event::CommandSent(0x01));
        assert_eq!(log.last(), Some("Sending Command: 0x01"));
    }
}
