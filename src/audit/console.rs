//! Passive leak detection on console output
//!
//! The host hands every intercepted log call to a [`ConsoleInterceptor`]
//! before forwarding it to its normal destination. Listeners registered on the
//! interceptor receive one [`LeakNotice`] per offending call.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::types::{Category, ConsoleEvent, Issue, IssueSource, LeakNotice, Severity};

use super::patterns::PatternSet;
use super::sink::IssueSink;

/// Hard cap on excerpt length, in characters
pub const EXCERPT_LIMIT: usize = 200;

/// First [`EXCERPT_LIMIT`] characters of `text`. Never splits a character.
pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LIMIT) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

/// Inspect one logged call. Returns a notice for the first argument that
/// matches any pattern, listing every pattern that argument matched.
pub fn detect_leak(patterns: &PatternSet, event: &ConsoleEvent) -> Option<LeakNotice> {
    event.texts().find_map(|text| {
        let hits = patterns.matches(&text);
        if hits.is_empty() {
            return None;
        }
        Some(LeakNotice {
            level: event.level,
            excerpt: excerpt(&text),
            patterns: hits.iter().map(|p| p.name.to_string()).collect(),
        })
    })
}

/// Receives leak notices from a [`ConsoleInterceptor`]
pub trait LeakListener: Send + Sync {
    fn on_leak(&self, notice: &LeakNotice);
}

impl LeakListener for IssueSink {
    fn on_leak(&self, notice: &LeakNotice) {
        self.append(Issue::new(
            Category::Console,
            "Sensitive data in console output",
            Severity::Critical,
            format!(
                "console.{} call matched: {}",
                notice.level,
                notice.patterns.join(", ")
            ),
            IssueSource::Console { level: notice.level },
        ));
    }
}

/// Logs every notice at warn level
pub struct TracingLeakListener;

impl LeakListener for TracingLeakListener {
    fn on_leak(&self, notice: &LeakNotice) {
        // The excerpt stays out of the service log
        warn!(
            log_level = %notice.level,
            patterns = ?notice.patterns,
            "Sensitive data in console output"
        );
    }
}

/// Outcome of intercepting one call
#[derive(Debug, Clone)]
pub struct Intercepted {
    pub notice: Option<LeakNotice>,
    /// Coerced arguments, ready for their normal destination
    pub forward: Vec<String>,
}

/// Registration point for observing log calls
pub struct ConsoleInterceptor {
    patterns: &'static PatternSet,
    listeners: RwLock<Vec<Arc<dyn LeakListener>>>,
}

impl ConsoleInterceptor {
    pub fn new(patterns: &'static PatternSet) -> Self {
        Self {
            patterns,
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, listener: Arc<dyn LeakListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn intercept(&self, event: &ConsoleEvent) -> Intercepted {
        let notice = detect_leak(self.patterns, event);

        if let Some(notice) = &notice {
            debug!("Leak detected in console.{} call", notice.level);
            let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            for listener in listeners.iter() {
                listener.on_leak(notice);
            }
        }

        Intercepted {
            notice,
            forward: event.texts().collect(),
        }
    }
}
