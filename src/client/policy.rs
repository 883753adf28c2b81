use crate::client::url_state::SearchKey;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Content-based dedupe: remembers the most recently issued search
#[derive(Debug, Default)]
pub struct DedupePolicy {
    last: Option<SearchKey>,
}

impl DedupePolicy {
    pub fn is_duplicate(&self, key: &SearchKey) -> bool {
        self.last.as_ref() == Some(key)
    }

    pub fn record(&mut self, key: SearchKey) {
        self.last = Some(key);
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Time-based cooldown: active while a search is pending and for `window`
/// after it completes
#[derive(Debug)]
pub struct CooldownPolicy {
    window: Duration,
    pending: bool,
    completed_at: Option<Instant>,
}

impl CooldownPolicy {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: false,
            completed_at: None,
        }
    }

    pub fn start(&mut self) {
        self.pending = true;
        self.completed_at = None;
    }

    pub fn finish(&mut self, at: Instant) {
        self.pending = false;
        self.completed_at = Some(at);
    }

    pub fn abandon(&mut self) {
        self.pending = false;
        self.completed_at = None;
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.pending
            || self
                .completed_at
                .map(|at| now.duration_since(at) < self.window)
                .unwrap_or(false)
    }
}

/// Restartable one-shot timer; starting or cancelling invalidates any earlier
/// firing
#[derive(Debug, Default)]
pub struct DebounceTimer {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    /// Cancel the running timer and return the generation for the next one
    pub fn restart(&mut self) -> u64 {
        self.cancel();
        self.generation
    }

    pub fn arm(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Claim a firing; false when the timer was restarted or cancelled since
    pub fn fire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.handle.is_none() {
            return false;
        }
        self.handle = None;
        true
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::RawParams;

    #[test]
    fn dedupe_matches_last_key_only() {
        let mut dedupe = DedupePolicy::default();
        let key = SearchKey::of(&RawParams::new());
        assert!(!dedupe.is_duplicate(&key));
        dedupe.record(key.clone());
        assert!(dedupe.is_duplicate(&key));
        dedupe.reset();
        assert!(!dedupe.is_duplicate(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_window() {
        let mut cooldown = CooldownPolicy::new(Duration::from_millis(500));
        assert!(!cooldown.is_active(Instant::now()));

        cooldown.start();
        assert!(cooldown.is_active(Instant::now()));

        cooldown.finish(Instant::now());
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(cooldown.is_active(Instant::now()));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!cooldown.is_active(Instant::now()));
    }

    #[tokio::test]
    async fn debounce_generations() {
        let mut timer = DebounceTimer::default();
        let first = timer.restart();
        timer.arm(tokio::spawn(async {}));
        let second = timer.restart();
        timer.arm(tokio::spawn(async {}));

        assert!(!timer.fire(first));
        assert!(timer.fire(second));
        assert!(!timer.fire(second), "fires once");

        let third = timer.restart();
        timer.arm(tokio::spawn(async {}));
        timer.cancel();
        assert!(!timer.fire(third));
        assert!(!timer.is_armed());
    }
}
