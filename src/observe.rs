//! Structured diagnostics for the matching pass.
//!
//! The matcher reports what it built and what it resolved through an
//! injected observer instead of logging raw pattern arrays as a side
//! effect of computation. Callers pick the sink: nothing, the tracing
//! subscriber, or an in-memory log for inspection.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::MatchKind;

/// One diagnostic event from a matching pass.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// The combined alternation compiled.
    PatternBuilt {
        literal_count: usize,
        pattern_len: usize,
    },
    /// The regex engine rejected the alternation; the pass degraded to
    /// plain text.
    PatternRejected { literal_count: usize },
    /// A piece of the text resolved to an entry.
    SpanMatched {
        text: String,
        term: String,
        kind: MatchKind,
    },
}

pub trait MatchObserver: Send + Sync {
    fn emit(&self, event: MatchEvent);
}

/// Discards every event; the default for callers that only want spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl MatchObserver for NoopObserver {
    fn emit(&self, _event: MatchEvent) {}
}

/// Forwards events to the tracing subscriber at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceObserver;

impl MatchObserver for TraceObserver {
    fn emit(&self, event: MatchEvent) {
        match event {
            MatchEvent::PatternBuilt {
                literal_count,
                pattern_len,
            } => debug!(literal_count, pattern_len, "glossary pattern compiled"),
            MatchEvent::PatternRejected { literal_count } => {
                debug!(literal_count, "glossary pattern rejected")
            }
            MatchEvent::SpanMatched { text, term, kind } => {
                debug!(%text, %term, ?kind, "glossary span matched")
            }
        }
    }
}

/// Collects events behind shared state; clones observe the same log.
#[derive(Clone, Default)]
pub struct EventLog {
    shared: Arc<RwLock<Vec<MatchEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the events recorded so far, in emission order.
    pub fn events(&self) -> Vec<MatchEvent> {
        self.shared.read().clone()
    }

    pub fn clear(&self) {
        self.shared.write().clear();
    }
}

impl MatchObserver for EventLog {
    fn emit(&self, event: MatchEvent) {
        self.shared.write().push(event);
    }
}
