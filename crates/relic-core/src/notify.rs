//! Notification channels out of the race core.
//!
//! Every announcement (milestones, loss and pickup events, victory and draw
//! banners) goes through a single broadcast channel of plain text lines. An
//! empty line is a blank separator. Discrete presentation cues travel on a
//! second channel keyed by [`PresentationCue`].
//!
//! Two sinks ship with the crate: [`RecordingSink`] keeps everything in
//! memory (tests, status replay) and [`TracingSink`] writes to the log.

use relic_types::PresentationCue;
use tracing::info;

/// Prefix added to every non-empty announcement.
pub const ANNOUNCE_PREFIX: &str = "[Relic Race] ";

/// Receiver of announcements and presentation cues.
pub trait NotificationSink {
    /// Deliver one line to every participant. An empty line is a blank
    /// separator and is delivered as-is.
    fn broadcast(&mut self, line: &str);

    /// Play a presentation cue for every participant.
    fn cue(&mut self, cue: PresentationCue);

    /// Broadcast a message with the race prefix. Empty messages stay empty.
    fn announce(&mut self, message: &str) {
        if message.is_empty() {
            self.broadcast("");
        } else {
            self.broadcast(&format!("{ANNOUNCE_PREFIX}{message}"));
        }
    }
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A broadcast line.
    Line(String),
    /// A presentation cue.
    Cue(PresentationCue),
}

/// Sink that records every notification in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    notices: Vec<Notice>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub const fn new() -> Self {
        Self {
            notices: Vec::new(),
        }
    }

    /// Everything recorded, in delivery order.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Broadcast lines only, in delivery order.
    pub fn lines(&self) -> Vec<&str> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Line(line) => Some(line.as_str()),
                Notice::Cue(_) => None,
            })
            .collect()
    }

    /// Cues only, in delivery order.
    pub fn cues(&self) -> Vec<PresentationCue> {
        self.notices
            .iter()
            .filter_map(|n| match n {
                Notice::Cue(cue) => Some(*cue),
                Notice::Line(_) => None,
            })
            .collect()
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    /// Forget everything recorded so far.
    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl NotificationSink for RecordingSink {
    fn broadcast(&mut self, line: &str) {
        self.notices.push(Notice::Line(line.to_owned()));
    }

    fn cue(&mut self, cue: PresentationCue) {
        self.notices.push(Notice::Cue(cue));
    }
}

/// Sink that writes announcements to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn broadcast(&mut self, line: &str) {
        if !line.is_empty() {
            info!(target: "relic::broadcast", "{line}");
        }
    }

    fn cue(&mut self, cue: PresentationCue) {
        info!(target: "relic::broadcast", ?cue, "Presentation cue");
    }
}
