//! Single-source polling.
//!
//! A [`Poller`] calls its fetch function, drops what the filter rejects,
//! keeps only keys the [`DedupTracker`] has not seen, hands those out one at
//! a time, then sleeps for the tracker's wait before fetching again.
//!
//! Items are handed out lazily: the pacing sleep only starts once the
//! consumer asks for more than the current cycle produced.

use std::collections::VecDeque;
use std::hash::Hash;
use std::time::Duration;

use futures::Stream;
use tracing::{debug, warn};

use super::{DedupTracker, FetchFn, FilterFn, KeyFn, StreamError, StreamOptions};

/// Lazy, de-duplicated stream of items from one fetch function.
///
/// `A` is the extra argument value passed (cloned) to the fetch function on
/// every cycle, e.g. a listing query.  A poller is not rewindable: once it
/// hits its limit or a fetch fails it stays finished.
pub struct Poller<T, K, A = ()> {
    fetch: FetchFn<T, A>,
    key: KeyFn<T, K>,
    filter: Option<FilterFn<T>>,
    args: A,
    options: StreamOptions,
    tracker: DedupTracker<K>,
    /// New items from the latest cycle not yet handed out.
    pending: VecDeque<T>,
    /// Sleep owed before the next fetch.
    next_wait: Option<Duration>,
    cycles: u64,
    yielded: usize,
    done: bool,
}

impl<T, K> Poller<T, K, ()>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Poller over a fetch function that takes no arguments.
    pub fn new(fetch: FetchFn<T>, key: KeyFn<T, K>) -> Self {
        Self::with_args(fetch, key, ())
    }
}

impl<T, K, A> Poller<T, K, A>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + 'static,
    A: Clone + Send + 'static,
{
    pub fn with_args(fetch: FetchFn<T, A>, key: KeyFn<T, K>, args: A) -> Self {
        let options = StreamOptions::default();
        Self {
            fetch,
            key,
            filter: None,
            args,
            options,
            tracker: DedupTracker::new(options.min_wait, options.max_wait),
            pending: VecDeque::new(),
            next_wait: None,
            cycles: 0,
            yielded: 0,
            done: false,
        }
    }

    /// Replace the pacing/limit settings.  Must be called before polling
    /// starts; it resets the tracker.
    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.tracker = DedupTracker::new(options.min_wait, options.max_wait);
        self.options = options;
        self
    }

    pub fn with_filter(mut self, filter: FilterFn<T>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn tracker(&self) -> &DedupTracker<K> {
        &self.tracker
    }

    /// Completed fetch cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Items handed out so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    fn limit_reached(&self) -> bool {
        matches!(self.options.limit, Some(limit) if self.yielded >= limit)
    }

    /// Next unseen item.
    ///
    /// Returns `None` once the limit is reached or after a fetch error has
    /// been reported.  Without a limit this never returns `None` on its own:
    /// drop the poller (or the future) to stop it.
    pub async fn next(&mut self) -> Option<Result<T, StreamError>> {
        loop {
            if self.done || self.limit_reached() {
                self.done = true;
                self.pending.clear();
                return None;
            }

            if let Some(item) = self.pending.pop_front() {
                self.yielded += 1;
                return Some(Ok(item));
            }

            if let Some(wait) = self.next_wait {
                tokio::time::sleep(wait).await;
                self.next_wait = None;
            }

            if let Err(e) = self.poll_once().await {
                warn!(cycle = self.cycles + 1, error = %e, "poller stopped");
                self.done = true;
                return Some(Err(e));
            }
        }
    }

    /// Run one fetch-filter-dedup cycle, queueing new items.
    async fn poll_once(&mut self) -> Result<(), StreamError> {
        let first_key = self.tracker.last_seen().cloned();
        let snapshot = (self.fetch)(self.args.clone())
            .await
            .map_err(StreamError::UpstreamFetch)?;
        self.cycles += 1;

        let skipping = self.cycles == 1 && self.options.skip_existing;
        let budget = self
            .options
            .limit
            .map(|limit| limit.saturating_sub(self.yielded));
        let fetched = snapshot.len();
        let mut fresh = 0usize;

        for item in snapshot {
            if let Some(filter) = &self.filter {
                if !filter(&item) {
                    continue;
                }
            }
            if budget.is_some_and(|budget| self.pending.len() >= budget) {
                break;
            }
            if self.tracker.is_new((self.key)(&item)) {
                fresh += 1;
                if !skipping {
                    self.pending.push_back(item);
                }
            }
        }

        let wait = self.tracker.record_cycle(first_key.as_ref());
        self.next_wait = Some(wait);
        debug!(
            cycle = self.cycles,
            fetched,
            fresh,
            skipped_backlog = skipping,
            wait_ms = wait.as_millis() as u64,
            "poll cycle complete"
        );
        Ok(())
    }

    /// Adapt the poller into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<T, StreamError>> + Send {
        futures::stream::unfold(self, |mut poller| async move {
            poller.next().await.map(|item| (item, poller))
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::testing::{failing, fixed, scripted};
    use crate::stream::{fetch_fn, filter_fn, key_fn};
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn ident() -> KeyFn<u32, u32> {
        key_fn(|x: &u32| *x)
    }

    fn fast() -> StreamOptions {
        StreamOptions::default()
            .min_wait(Duration::from_secs(1))
            .max_wait(Duration::from_secs(8))
    }

    /// Drain up to `n` items, failing the test on errors.
    async fn take(poller: &mut Poller<u32, u32>, n: usize) -> Vec<u32> {
        let mut out = Vec::new();
        for _ in 0..n {
            match poller.next().await {
                Some(Ok(item)) => out.push(item),
                Some(Err(e)) => panic!("unexpected error: {e}"),
                None => break,
            }
        }
        out
    }

    /// True if the poller produces nothing within `secs` of virtual time.
    async fn stays_quiet(poller: &mut Poller<u32, u32>, secs: u64) -> bool {
        tokio::time::timeout(Duration::from_secs(secs), poller.next())
            .await
            .is_err()
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_snapshot_is_delivered_once() {
        let (fetch, calls) = fixed(vec![1, 2, 3]);
        let mut poller = Poller::new(fetch, ident()).with_options(fast());

        assert_eq!(take(&mut poller, 3).await, vec![1, 2, 3]);
        assert!(stays_quiet(&mut poller, 120).await);
        assert!(calls.load(Ordering::SeqCst) > 5, "kept polling");
        assert_eq!(poller.tracker().seen_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_order_is_preserved_across_cycles() {
        let (fetch, _) = scripted(vec![vec![3, 1], vec![3, 1, 7, 5], vec![9, 3, 1, 7, 5]]);
        let mut poller = Poller::new(fetch, ident()).with_options(fast());

        assert_eq!(take(&mut poller, 5).await, vec![3, 1, 7, 5, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_existing_drops_first_snapshot_only() {
        let (fetch, _) = scripted(vec![vec![1, 2], vec![1, 2, 3], vec![1, 2, 3, 4]]);
        let mut poller = Poller::new(fetch, ident())
            .with_options(fast().skip_existing(true));

        assert_eq!(take(&mut poller, 2).await, vec![3, 4]);
        assert!(poller.tracker().contains(&1));
        assert!(poller.tracker().contains(&2));
        assert!(stays_quiet(&mut poller, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_stops_within_the_cycle() {
        let (fetch, calls) = fixed(vec![1, 2, 3, 4, 5]);
        let mut poller = Poller::new(fetch, ident()).with_options(fast().limit(3));

        assert_eq!(take(&mut poller, 10).await, vec![1, 2, 3]);
        assert!(poller.is_finished());
        assert!(poller.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(poller.tracker().seen_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn limit_above_supply_keeps_polling() {
        let (fetch, _) = fixed(vec![1, 2]);
        let mut poller = Poller::new(fetch, ident()).with_options(fast().limit(5));

        assert_eq!(take(&mut poller, 2).await, vec![1, 2]);
        assert!(stays_quiet(&mut poller, 60).await);
        assert!(!poller.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn static_filter_excludes_forever() {
        let (fetch, calls) = fixed(vec![1, 2, 3]);
        let mut poller = Poller::new(fetch, ident())
            .with_options(fast())
            .with_filter(filter_fn(|x: &u32| x % 2 == 1));

        assert_eq!(take(&mut poller, 2).await, vec![1, 3]);
        assert!(stays_quiet(&mut poller, 30).await);
        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(!poller.tracker().contains(&2));
    }

    #[tokio::test(start_paused = true)]
    async fn filtered_item_is_not_marked_seen() {
        let (fetch, _) = fixed(vec![1, 2, 3]);
        let admit_two = Arc::new(AtomicBool::new(false));
        let flag = admit_two.clone();
        let mut poller = Poller::new(fetch, ident())
            .with_options(fast())
            .with_filter(filter_fn(move |x: &u32| *x != 2 || flag.load(Ordering::SeqCst)));

        assert_eq!(take(&mut poller, 2).await, vec![1, 3]);
        admit_two.store(true, Ordering::SeqCst);
        assert_eq!(take(&mut poller, 1).await, vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_to_max_then_resets() {
        let (fetch, _) = scripted(vec![vec![1], vec![1], vec![1], vec![1], vec![1], vec![1, 2]]);
        let mut poller = Poller::new(fetch, ident()).with_options(fast());

        assert_eq!(take(&mut poller, 1).await, vec![1]);
        assert_eq!(poller.tracker().wait(), Duration::from_secs(1));

        // cycles 2..=5 are empty: 2s, 4s, 8s, 8s
        assert_eq!(take(&mut poller, 1).await, vec![2]);
        assert_eq!(poller.cycles(), 6);
        assert_eq!(poller.tracker().wait(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_cycles_are_paced_by_backoff() {
        let (fetch, calls) = fixed(Vec::<u32>::new());
        let mut poller = Poller::new(fetch, ident()).with_options(fast());

        let start = tokio::time::Instant::now();
        assert!(stays_quiet(&mut poller, 40).await);
        // fetches at 0, 2, 6, 14, 22, 30, 38
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert_eq!(poller.tracker().wait(), Duration::from_secs(8));
        assert!(start.elapsed() >= Duration::from_secs(40));
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_error_is_reported_then_finishes() {
        let mut poller = Poller::new(failing::<u32>("boom"), ident());

        match poller.next().await {
            Some(Err(StreamError::UpstreamFetch(e))) => assert_eq!(e.to_string(), "boom"),
            other => panic!("expected upstream error, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(poller.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn extra_args_reach_every_fetch() {
        let fetch = fetch_fn(|page: u32| async move { Ok(vec![page, page + 1]) });
        let mut poller = Poller::with_args(fetch, key_fn(|x: &u32| *x), 40)
            .with_options(fast().limit(2));

        let mut out = Vec::new();
        while let Some(item) = poller.next().await {
            out.push(item.unwrap());
        }
        assert_eq!(out, vec![40, 41]);
    }

    #[tokio::test(start_paused = true)]
    async fn into_stream_ends_at_limit() {
        let (fetch, _) = scripted(vec![vec![1], vec![1, 2], vec![1, 2, 3]]);
        let items: Vec<u32> = Poller::new(fetch, ident())
            .with_options(fast().limit(3))
            .into_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(items, vec![1, 2, 3]);
    }
}
