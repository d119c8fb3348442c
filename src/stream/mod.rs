//! Deduplicating, rate-adaptive polling streams.
//!
//! Turns a function that returns "the latest page of items" into a lazy
//! stream of items that have not been seen before.
//!
//! * [`tracker`]: seen-key set and backoff/reset pacing.
//! * [`poller`]: one source, consumed item by item ([`Poller`]).
//! * [`merge`]: many sources fanned into one callback ([`merge_apply`]).
//!
//! ```ignore
//! let mut poller = Poller::new(
//!     fetch_fn(move |()| { let c = community.clone(); async move { Ok(c.get_posts(Default::default()).await?) } }),
//!     key_fn(|post: &Post| post.ap_id().to_string()),
//! )
//! .with_options(StreamOptions::default().skip_existing(true));
//!
//! while let Some(post) = poller.next().await {
//!     handle(post?);
//! }
//! ```

pub mod merge;
pub mod poller;
pub mod tracker;

pub use merge::{merge_apply, Merge, SourceErrorPolicy, SourceFailure};
pub use poller::Poller;
pub use tracker::DedupTracker;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

/// Future returned by a [`FetchFn`]: one snapshot of candidate items.
pub type FetchFuture<T> = BoxFuture<'static, anyhow::Result<Vec<T>>>;

/// Produces the current snapshot of items.  Called once per cycle with a
/// clone of the poller's extra arguments.
pub type FetchFn<T, A = ()> = Box<dyn FnMut(A) -> FetchFuture<T> + Send>;

/// Extracts the stable identity used for de-duplication.
pub type KeyFn<T, K> = Arc<dyn Fn(&T) -> K + Send + Sync>;

/// Candidates for which this returns `false` are dropped before de-duplication.
pub type FilterFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Box an async closure into a [`FetchFn`].
pub fn fetch_fn<T, A, F, Fut>(mut f: F) -> FetchFn<T, A>
where
    F: FnMut(A) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<Vec<T>>> + Send + 'static,
{
    Box::new(move |args| f(args).boxed())
}

/// Wrap a closure as a shareable [`KeyFn`].
pub fn key_fn<T, K, F>(f: F) -> KeyFn<T, K>
where
    F: Fn(&T) -> K + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a predicate as a shareable [`FilterFn`].
pub fn filter_fn<T, F>(f: F) -> FilterFn<T>
where
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Default lower bound of the polling interval.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_secs(1);
/// Default upper bound of the polling interval.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(300);

/// Pacing and termination settings shared by [`Poller`] and [`Merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Wait after a cycle that produced new items.
    pub min_wait: Duration,
    /// Ceiling for the doubling wait after empty cycles.
    pub max_wait: Duration,
    /// Stop after this many items.  `None` polls forever.
    pub limit: Option<usize>,
    /// Mark the first snapshot as seen without yielding it.
    pub skip_existing: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
            limit: None,
            skip_existing: false,
        }
    }
}

impl StreamOptions {
    pub fn min_wait(mut self, min_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self
    }

    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }
}

/// Errors raised by pollers and merge sessions.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("fetch functions and key functions must have the same length, got {fetchers} and {key_fns}")]
    Configuration { fetchers: usize, key_fns: usize },

    #[error("upstream fetch failed: {0:#}")]
    UpstreamFetch(anyhow::Error),

    #[error("source {index} failed: {error:#}")]
    Source { index: usize, error: anyhow::Error },

    #[error("all {} sources failed", .failures.len())]
    AllSourcesFailed { failures: Vec<SourceFailure> },
}
