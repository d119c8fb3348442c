//! Background streaming.
//!
//! Runs the multi-community merge session on the tokio runtime and forwards
//! every new post or comment to the UI thread over an [`mpsc`] channel.
//! The UI thread stays synchronous; it drains the channel once per tick.

use std::sync::mpsc;

use livescroll_lemmy::models::{Content, MultiCommunityStream};
use livescroll_lemmy::stream::{SourceErrorPolicy, StreamError, StreamOptions};
use tokio::runtime::Handle;
use tracing::{error, info};

use crate::source::FeedItem;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod fixtures;

/// Messages sent from the stream task to the UI thread.
#[derive(Debug)]
pub enum PollMsg {
    /// A post or comment that has not been shown before.
    Item(FeedItem),
    /// The session hit its item limit after delivering this many items.
    Finished(usize),
    /// The session stopped with this error description.
    Error(String),
}

/// What to stream.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub options: StreamOptions,
    /// Stream posts only, not comments.
    pub posts_only: bool,
    pub policy: SourceErrorPolicy,
}

/// Start streaming on `runtime`.
///
/// Returns a receiver that the main loop should drain on every tick.  The
/// task runs until the session ends or the runtime shuts down.
pub fn spawn(runtime: &Handle, stream: MultiCommunityStream, config: PollConfig) -> mpsc::Receiver<PollMsg> {
    let (tx, rx) = mpsc::channel();

    runtime.spawn(async move {
        let forward = {
            let tx = tx.clone();
            move |content: Content| {
                // A closed receiver means the UI is shutting down.
                let _ = tx.send(PollMsg::Item(FeedItem::from(&content)));
            }
        };

        let result: Result<usize, StreamError> = async {
            if config.posts_only {
                stream
                    .posts(Default::default())?
                    .with_options(config.options)
                    .with_policy(config.policy)
                    .apply(move |post| forward(Content::Post(post)))
                    .await
            } else {
                stream
                    .content()?
                    .with_options(config.options)
                    .with_policy(config.policy)
                    .apply(forward)
                    .await
            }
        }
        .await;

        let msg = match result {
            Ok(delivered) => {
                info!(delivered, "stream finished");
                PollMsg::Finished(delivered)
            }
            Err(e) => {
                error!(error = %e, "stream stopped");
                PollMsg::Error(e.to_string())
            }
        };
        let _ = tx.send(msg);
    });

    rx
}
