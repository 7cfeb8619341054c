use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::types::{Issue, IssueCount, Severity};

#[derive(Default)]
struct SinkState {
    issues: Vec<Issue>,
    counts: IssueCount,
}

/// Collects the issues of one audit run.
///
/// The issue list and the severity tally live behind one lock, so a reader
/// never observes an appended issue without its count (or the reverse).
#[derive(Default)]
pub struct IssueSink {
    state: Mutex<SinkState>,
}

impl IssueSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SinkState> {
        // Poison is ignored: no update can leave the state half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, issue: Issue) {
        debug!(
            "{} issue [{}]: {}",
            issue.severity,
            issue.category.as_str(),
            issue.title
        );
        let mut state = self.lock();
        state.counts.increment(issue.severity);
        state.issues.push(issue);
    }

    pub fn counts(&self) -> IssueCount {
        self.lock().counts
    }

    pub fn count(&self, severity: Severity) -> u32 {
        self.lock().counts.get(severity)
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.lock().issues.clone()
    }

    /// Issues and counts read under one lock
    pub fn snapshot(&self) -> (Vec<Issue>, IssueCount) {
        let state = self.lock();
        (state.issues.clone(), state.counts)
    }

    pub fn len(&self) -> usize {
        self.lock().issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().issues.is_empty()
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.issues.clear();
        state.counts = IssueCount::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, IssueSource};
    use std::sync::Arc;

    fn issue(severity: Severity) -> Issue {
        Issue::new(
            Category::Headers,
            "Missing referrer-policy header",
            severity,
            "referrer-policy header is required for security",
            IssueSource::Header {
                name: "referrer-policy".to_string(),
            },
        )
    }

    #[test]
    fn test_append_and_count() {
        let sink = IssueSink::new();
        sink.append(issue(Severity::Low));
        sink.append(issue(Severity::Critical));
        sink.append(issue(Severity::Critical));

        let counts = sink.counts();
        assert_eq!(counts.critical, 2);
        assert_eq!(counts.low, 1);
        assert_eq!(sink.count(Severity::High), 0);
        assert_eq!(sink.len(), 3);
    }

    #[test]
    fn test_reset_clears_everything() {
        let sink = IssueSink::new();
        sink.append(issue(Severity::High));
        sink.reset();

        assert!(sink.is_empty());
        assert_eq!(sink.counts(), IssueCount::default());
    }

    #[test]
    fn test_concurrent_appends_keep_tally_consistent() {
        let sink = Arc::new(IssueSink::new());
        let handles: Vec<_> = Severity::ALL
            .into_iter()
            .map(|severity| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        sink.append(issue(severity));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let (issues, counts) = sink.snapshot();
        assert_eq!(issues.len(), 1000);
        assert_eq!(counts, IssueCount::tally(&issues));
        assert_eq!(counts.medium, 250);
    }
}
