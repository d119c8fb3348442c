//! Display-side representation of streamed Lemmy content.
//!
//! The stream engine delivers [`Content`](livescroll_lemmy::models::Content)
//! values; the viewer flattens each one into a [`FeedItem`] before it
//! crosses over to the UI thread.

mod feed_item;

pub use feed_item::{FeedItem, ItemKind};

#[cfg(test)]
pub(crate) use feed_item::tests::make_item;
