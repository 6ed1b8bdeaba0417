use std::sync::atomic::{AtomicU32, Ordering};

/// Host events that turn writing on or off.
///
/// Recording and streaming are independent activity sources; either one
/// being active keeps the writer active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    RecordingStarted,
    StreamingStarted,
    RecordingStopping,
    StreamingStopping,
}

impl HostEvent {
    pub fn is_start(&self) -> bool {
        matches!(self, Self::RecordingStarted | Self::StreamingStarted)
    }
}

/// Saturating count of activity sources currently asking for output.
///
/// State transitions:
/// ```text
/// inactive (0) --start--> active (n > 0) --stop (n == 1)--> inactive
/// ```
/// Stopping while already inactive stays at zero.
#[derive(Debug, Default)]
pub struct WritingTriggers {
    count: AtomicU32,
}

impl WritingTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more active source. Returns the new count.
    pub fn start(&self) -> u32 {
        self.count.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Release one source. Returns the new count, never below zero.
    pub fn stop(&self) -> u32 {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn is_active(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}
