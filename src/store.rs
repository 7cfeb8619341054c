use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Response headers keyed by tab id.
///
/// Entries live until the tab closes and the collector calls [`HeaderCache::remove`].
#[derive(Default)]
pub struct HeaderCache {
    tabs: RwLock<HashMap<u64, HashMap<String, String>>>,
}

impl HeaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the headers of a tab's latest main-frame response, replacing any earlier set.
    /// Names are lower-cased.
    pub async fn record<I>(&self, tab_id: u64, headers: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        debug!("Caching {} headers for tab {}", headers.len(), tab_id);
        self.tabs.write().await.insert(tab_id, headers);
    }

    pub async fn get(&self, tab_id: u64) -> Option<HashMap<String, String>> {
        self.tabs.read().await.get(&tab_id).cloned()
    }

    /// Drop a closed tab's entry. Returns whether anything was cached.
    pub async fn remove(&self, tab_id: u64) -> bool {
        let removed = self.tabs.write().await.remove(&tab_id).is_some();
        if removed {
            debug!("Evicted headers for tab {}", tab_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.tabs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tabs.read().await.is_empty()
    }
}
