//! A typed client for the Lemmy v3 API, with deduplicating polling streams.
//!
//! * [`Lemmy`]: the HTTP client (login, communities, posts, reports).
//! * [`models`]: [`Community`](models::Community), [`Post`](models::Post)
//!   and [`Comment`](models::Comment) handles that act on themselves.
//! * [`stream`]: the engine behind community streams, usable with any
//!   fetch function.
//! * [`api`]: the serde request and response types.
//!
//! ```ignore
//! let lemmy = Lemmy::new(ClientConfig::from_env()?)?;
//! let stream = lemmy.multi_communities_stream(["rust", "linux"]).await?;
//! stream
//!     .content_apply(|content| println!("{}", content.key()), StreamOptions::default().limit(10))
//!     .await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod stream;

pub use client::{CommunityRef, Lemmy, PostRef};
pub use config::ClientConfig;
pub use error::ClientError;
pub use stream::{StreamError, StreamOptions};
