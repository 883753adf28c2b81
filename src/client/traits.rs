use crate::search::service::SearchOutcome;
use crate::search::types::RawParams;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;

/// Whatever executes a search on behalf of the controller.
///
/// [`crate::search::SearchService`] implements this directly; a remote
/// transport could implement it as well.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, params: RawParams) -> SearchOutcome;
}

/// The page's visible URL and history entry
pub trait HistoryBinding: Send + Sync {
    fn current_url(&self) -> Url;

    /// Replace the current history entry without adding a new one
    fn replace_state(&self, url: Url, params: &RawParams);
}

/// In-process location bar, for headless use and tests
#[derive(Debug)]
pub struct MemoryHistory {
    url: Mutex<Url>,
    entries: Mutex<Vec<(Url, RawParams)>>,
}

impl MemoryHistory {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn url(&self) -> Url {
        self.url.lock().clone()
    }

    /// Every `replace_state` call so far, oldest first
    pub fn replacements(&self) -> Vec<(Url, RawParams)> {
        self.entries.lock().clone()
    }
}

impl HistoryBinding for MemoryHistory {
    fn current_url(&self) -> Url {
        self.url()
    }

    fn replace_state(&self, url: Url, params: &RawParams) {
        *self.url.lock() = url.clone();
        self.entries.lock().push((url, params.clone()));
    }
}
