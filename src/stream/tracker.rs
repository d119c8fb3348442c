//! Seen-key bookkeeping and adaptive pacing for a single poller.
//!
//! A [`DedupTracker`] remembers every key a poller has observed and derives
//! the delay before the next fetch from whether the last cycle saw anything
//! new: an empty cycle doubles the wait (up to `max_wait`), a productive one
//! resets it to `min_wait`.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Duration;

/// Per-poller record of observed keys plus the current wait interval.
///
/// The seen set only grows; its lifetime is the lifetime of the poller that
/// owns it.
#[derive(Debug, Clone)]
pub struct DedupTracker<K> {
    seen: HashSet<K>,
    /// Most recently recorded key. `None` until the first key arrives, which
    /// never compares equal to a real key.
    last_seen: Option<K>,
    wait: Duration,
    min_wait: Duration,
    max_wait: Duration,
}

impl<K> DedupTracker<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty tracker.  `max_wait` is raised to `min_wait` if it is
    /// smaller, so the interval always stays inside `[min_wait, max_wait]`.
    pub fn new(min_wait: Duration, max_wait: Duration) -> Self {
        Self {
            seen: HashSet::new(),
            last_seen: None,
            wait: min_wait,
            min_wait,
            max_wait: max_wait.max(min_wait),
        }
    }

    /// Record `key` if it has not been observed before.
    ///
    /// Returns `true` for a new key (which also becomes the last seen key)
    /// and `false`, without side effects, for a repeat.
    pub fn is_new(&mut self, key: K) -> bool {
        if self.seen.contains(&key) {
            return false;
        }
        self.last_seen = Some(key.clone());
        self.seen.insert(key);
        true
    }

    /// The last key recorded by [`is_new`](Self::is_new), if any.
    pub fn last_seen(&self) -> Option<&K> {
        self.last_seen.as_ref()
    }

    /// Close a poll cycle and return how long to sleep before the next one.
    ///
    /// `first_key` is the value of [`last_seen`](Self::last_seen) captured
    /// before the cycle started.  If it still matches, the cycle produced no
    /// new key and the wait doubles (capped at `max_wait`); otherwise it
    /// resets to `min_wait`.
    pub fn record_cycle(&mut self, first_key: Option<&K>) -> Duration {
        if first_key == self.last_seen.as_ref() {
            self.wait = self.wait.saturating_mul(2).min(self.max_wait);
        } else {
            self.wait = self.min_wait;
        }
        self.wait
    }

    /// Current wait interval.
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Number of distinct keys observed so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }
}
