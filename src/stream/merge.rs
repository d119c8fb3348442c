//! Fan-in of several pollers into one callback.
//!
//! Each source runs its own [`Poller`] on a tokio task and pushes what it
//! finds into a shared bounded channel.  The caller's task drains the
//! channel and invokes the callback, so delivery is first-arrived,
//! first-delivered across sources while each source keeps its own order.
//!
//! ```text
//! ┌──────────┐
//! │ poller 0 │──┐
//! └──────────┘  │  (index, item)  ┌────────────┐  callback(item)
//! ┌──────────┐  ├───────────────► │ dispatcher │ ───────────────►
//! │ poller 1 │──┘    (mpsc)       └────────────┘
//! └──────────┘
//! ```
//!
//! The workers live in a [`JoinSet`]: when the session ends (limit reached,
//! error returned, or the future dropped) every worker is aborted.

use std::hash::Hash;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::{FetchFn, FilterFn, KeyFn, Poller, StreamError, StreamOptions};

/// What the merger does when one source's fetch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceErrorPolicy {
    /// Cancel every source and return [`StreamError::Source`].
    #[default]
    Abort,
    /// Log the failure and let the other sources keep running.  If every
    /// source fails the session returns [`StreamError::AllSourcesFailed`].
    Continue,
}

/// A source that stopped because its fetch function failed.
#[derive(Debug)]
pub struct SourceFailure {
    pub index: usize,
    pub error: anyhow::Error,
}

/// Default capacity of the channel between workers and the dispatcher.
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

type Envelope<T> = (usize, Result<T, StreamError>);

/// A merge session: N sources, one callback, one shared limit.
pub struct Merge<T, K, A = ()> {
    fetchers: Vec<FetchFn<T, A>>,
    key_fns: Vec<KeyFn<T, K>>,
    filter: Option<FilterFn<T>>,
    options: StreamOptions,
    policy: SourceErrorPolicy,
    args: A,
    capacity: usize,
}

impl<T, K> Merge<T, K, ()>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new(fetchers: Vec<FetchFn<T>>, key_fns: Vec<KeyFn<T, K>>) -> Result<Self, StreamError> {
        Self::with_args(fetchers, key_fns, ())
    }
}

impl<T, K, A> Merge<T, K, A>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + 'static,
    A: Clone + Send + 'static,
{
    /// Pair each fetch function with the key function at the same index.
    ///
    /// Fails with [`StreamError::Configuration`] if the lengths differ; no
    /// fetch function is called in that case.
    pub fn with_args(
        fetchers: Vec<FetchFn<T, A>>,
        key_fns: Vec<KeyFn<T, K>>,
        args: A,
    ) -> Result<Self, StreamError> {
        if fetchers.len() != key_fns.len() {
            return Err(StreamError::Configuration {
                fetchers: fetchers.len(),
                key_fns: key_fns.len(),
            });
        }
        Ok(Self {
            fetchers,
            key_fns,
            filter: None,
            options: StreamOptions::default(),
            policy: SourceErrorPolicy::default(),
            args,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    /// Pacing, skip-existing and the global limit.  Each source is paced
    /// independently; the limit counts deliveries across all sources.
    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_filter(mut self, filter: FilterFn<T>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_policy(mut self, policy: SourceErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Number of sources in the session.
    pub fn len(&self) -> usize {
        self.fetchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// Run every source and call `callback` once per new item.
    ///
    /// Returns the number of callback invocations once the limit is reached
    /// or every source has ended.  Without a limit and with healthy sources
    /// this only returns when the future is dropped.
    pub async fn apply<C>(self, mut callback: C) -> Result<usize, StreamError>
    where
        C: FnMut(T),
    {
        let limit = self.options.limit;
        if limit == Some(0) || self.fetchers.is_empty() {
            return Ok(0);
        }

        let sources = self.fetchers.len();
        info!(sources, ?limit, policy = ?self.policy, "merge session started");

        let (tx, mut rx) = mpsc::channel::<Envelope<T>>(self.capacity);
        let mut workers = JoinSet::new();

        for (index, (fetch, key)) in self.fetchers.into_iter().zip(self.key_fns).enumerate() {
            let mut poller = Poller::with_args(fetch, key, self.args.clone()).with_options(self.options);
            if let Some(filter) = &self.filter {
                poller = poller.with_filter(filter.clone());
            }
            let tx = tx.clone();
            workers.spawn(async move {
                while let Some(item) = poller.next().await {
                    // The dispatcher hung up: the session is over.
                    if tx.send((index, item)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut delivered = 0usize;
        let mut failures: Vec<SourceFailure> = Vec::new();

        loop {
            tokio::select! {
                envelope = rx.recv() => {
                    let Some((index, item)) = envelope else {
                        break;
                    };
                    match item {
                        Ok(item) => {
                            callback(item);
                            delivered += 1;
                            if limit.is_some_and(|limit| delivered >= limit) {
                                info!(delivered, "merge limit reached, stopping sources");
                                break;
                            }
                        }
                        Err(e) => {
                            let error = match e {
                                StreamError::UpstreamFetch(error) => error,
                                other => anyhow::Error::new(other),
                            };
                            let message = format!("{error:#}");
                            error!(source = index, error = %message, "merge source failed");
                            match self.policy {
                                SourceErrorPolicy::Abort => {
                                    return Err(StreamError::Source { index, error });
                                }
                                SourceErrorPolicy::Continue => {
                                    failures.push(SourceFailure { index, error });
                                    if failures.len() == sources {
                                        return Err(StreamError::AllSourcesFailed { failures });
                                    }
                                }
                            }
                        }
                    }
                }
                Some(joined) = workers.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            std::panic::resume_unwind(e.into_panic());
                        }
                    }
                }
            }
        }

        workers.shutdown().await;
        Ok(delivered)
    }
}

/// Merge `fetchers` (paired by index with `key_fns`) into `callback`.
///
/// Shorthand for [`Merge::new`] + [`Merge::with_options`] + [`Merge::apply`].
pub async fn merge_apply<T, K, C>(
    fetchers: Vec<FetchFn<T>>,
    key_fns: Vec<KeyFn<T, K>>,
    callback: C,
    options: StreamOptions,
) -> Result<usize, StreamError>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Send + 'static,
    C: FnMut(T),
{
    Merge::new(fetchers, key_fns)?
        .with_options(options)
        .apply(callback)
        .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::testing::{failing, fixed, scripted};
    use crate::stream::{fetch_fn, filter_fn, key_fn};
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn ident() -> KeyFn<u32, u32> {
        key_fn(|x: &u32| *x)
    }

    fn fast() -> StreamOptions {
        StreamOptions::default()
            .min_wait(Duration::from_secs(1))
            .max_wait(Duration::from_secs(4))
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_every_item_once_and_keeps_source_order() {
        let (a, a_calls) = fixed(vec![1, 2, 3]);
        let (b, b_calls) = fixed(vec![9, 8]);

        let mut got = Vec::new();
        let delivered = merge_apply(vec![a, b], vec![ident(), ident()], |x| got.push(x), fast().limit(5))
            .await
            .unwrap();

        assert_eq!(delivered, 5);
        assert_eq!(got.len(), 5);
        let distinct: HashSet<u32> = got.iter().copied().collect();
        assert_eq!(distinct, HashSet::from([1, 2, 3, 9, 8]));

        let from_a: Vec<u32> = got.iter().copied().filter(|x| *x < 5).collect();
        let from_b: Vec<u32> = got.iter().copied().filter(|x| *x >= 5).collect();
        assert_eq!(from_a, vec![1, 2, 3]);
        assert_eq!(from_b, vec![9, 8]);

        // No poller outlives the session.
        let (a_after, b_after) = (a_calls.load(Ordering::SeqCst), b_calls.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(a_calls.load(Ordering::SeqCst), a_after);
        assert_eq!(b_calls.load(Ordering::SeqCst), b_after);
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_lengths_fail_before_fetching() {
        let (a, a_calls) = fixed(vec![1]);
        let (b, b_calls) = fixed(vec![2]);

        let mut called = false;
        let err = merge_apply(
            vec![a, b],
            vec![ident(), ident(), ident()],
            |_| called = true,
            fast(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StreamError::Configuration { fetchers: 2, key_fns: 3 }));
        assert!(!called);
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_limit_does_nothing() {
        let (a, a_calls) = fixed(vec![1]);
        let delivered = merge_apply(vec![a], vec![ident()], |_| panic!("no delivery"), fast().limit(0))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_session_returns_immediately() {
        let delivered = Merge::<u32, u32>::new(vec![], vec![])
            .unwrap()
            .apply(|_| panic!("no delivery"))
            .await
            .unwrap();
        assert_eq!(delivered, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shared_limit_caps_deliveries() {
        let (a, _) = fixed((1..=10u32).collect());
        let (b, _) = fixed((100..=110u32).collect());

        let mut count = 0;
        let delivered = merge_apply(vec![a, b], vec![ident(), ident()], |_| count += 1, fast().limit(4))
            .await
            .unwrap();
        assert_eq!(delivered, 4);
        assert_eq!(count, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn new_items_arriving_later_are_delivered() {
        let (a, _) = scripted(vec![vec![1], vec![1], vec![1, 2]]);
        let (b, _) = fixed(vec![50]);

        let mut got = Vec::new();
        merge_apply(vec![a, b], vec![ident(), ident()], |x| got.push(x), fast().limit(3))
            .await
            .unwrap();
        got.sort();
        assert_eq!(got, vec![1, 2, 50]);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_policy_surfaces_first_failure() {
        let (healthy, _) = fixed(vec![1, 2]);
        let err = Merge::new(vec![failing("upstream down"), healthy], vec![ident(), ident()])
            .unwrap()
            .with_options(fast())
            .apply(|_| {})
            .await
            .unwrap_err();

        match err {
            StreamError::Source { index, error } => {
                assert_eq!(index, 0);
                assert_eq!(error.to_string(), "upstream down");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn abort_stops_healthy_siblings() {
        let slow_failure = fetch_fn(|()| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err::<Vec<u32>, _>(anyhow::anyhow!("upstream down"))
        });
        let (healthy, healthy_calls) = fixed(vec![1, 2]);

        let err = Merge::new(vec![slow_failure, healthy], vec![ident(), ident()])
            .unwrap()
            .with_options(fast())
            .apply(|_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Source { index: 0, .. }));

        // The sibling kept polling while the failing fetch was pending.
        let at_return = healthy_calls.load(Ordering::SeqCst);
        assert!(at_return > 1);

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(healthy_calls.load(Ordering::SeqCst), at_return);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_policy_keeps_healthy_sources_running() {
        let (healthy, _) = scripted(vec![vec![1], vec![1, 2], vec![1, 2, 3]]);

        let mut got = Vec::new();
        let delivered = Merge::new(vec![failing("flaky"), healthy], vec![ident(), ident()])
            .unwrap()
            .with_options(fast().limit(3))
            .with_policy(SourceErrorPolicy::Continue)
            .apply(|x| got.push(x))
            .await
            .unwrap();

        assert_eq!(delivered, 3);
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn continue_policy_reports_when_every_source_failed() {
        let err = Merge::new(vec![failing::<u32>("a"), failing("b")], vec![ident(), ident()])
            .unwrap()
            .with_policy(SourceErrorPolicy::Continue)
            .apply(|_| {})
            .await
            .unwrap_err();

        match err {
            StreamError::AllSourcesFailed { failures } => {
                let mut indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
                indices.sort();
                assert_eq!(indices, vec![0, 1]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn skip_existing_applies_to_each_source() {
        let (a, _) = scripted(vec![vec![1], vec![1, 2]]);
        let (b, _) = scripted(vec![vec![10], vec![10, 11]]);

        let mut got = Vec::new();
        merge_apply(
            vec![a, b],
            vec![ident(), ident()],
            |x| got.push(x),
            fast().skip_existing(true).limit(2),
        )
        .await
        .unwrap();
        got.sort();
        assert_eq!(got, vec![2, 11]);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_is_shared_by_all_sources() {
        let (a, _) = fixed(vec![1, 2, 3, 4]);
        let (b, _) = fixed(vec![5, 6]);

        let mut got = Vec::new();
        Merge::new(vec![a, b], vec![ident(), ident()])
            .unwrap()
            .with_options(fast().limit(3))
            .with_filter(filter_fn(|x: &u32| x % 2 == 0))
            .apply(|x| got.push(x))
            .await
            .unwrap();
        got.sort();
        assert_eq!(got, vec![2, 4, 6]);
    }

    #[tokio::test(start_paused = true)]
    async fn extra_args_are_cloned_into_each_source() {
        let fetchers = vec![
            fetch_fn(|base: u32| async move { Ok(vec![base]) }),
            fetch_fn(|base: u32| async move { Ok(vec![base + 1]) }),
        ];

        let mut got = Vec::new();
        Merge::with_args(fetchers, vec![ident(), ident()], 10)
            .unwrap()
            .with_options(fast().limit(2))
            .apply(|x| got.push(x))
            .await
            .unwrap();
        got.sort();
        assert_eq!(got, vec![10, 11]);
    }
}
