use tracing::debug;

use crate::types::{coerce_to_text, Category, Issue, IssueSource, Severity, StorageArea};

use super::patterns::PatternSet;
use super::sink::IssueSink;

/// Scan every key and value of every store.
///
/// Every matching pattern is reported on its own. Descriptions name the store
/// and key, never the value.
pub fn check_storage(patterns: &PatternSet, stores: &[StorageArea], sink: &IssueSink) {
    for store in stores {
        debug!("Checking {} entries in {}", store.entries.len(), store.name);

        for (key, value) in &store.entries {
            let value = coerce_to_text(value);
            for pattern in patterns.matches_any(&[key.as_str(), value.as_str()]) {
                sink.append(
                    Issue::new(
                        Category::Storage,
                        "Sensitive data in storage",
                        Severity::Critical,
                        format!("Found in {} key: \"{}\"", store.name, key),
                        IssueSource::Storage {
                            store: store.name.clone(),
                            key: key.clone(),
                        },
                    )
                    .with_pattern(pattern.name),
                );
            }
        }
    }
}
