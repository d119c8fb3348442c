//! Object wrappers over the raw API views.
//!
//! Each model keeps an `Arc<Lemmy>` so it can act on itself: a
//! [`Community`] lists and streams its posts, a [`Post`] takes comments and
//! reports, and so on.

mod comment;
mod community;
mod post;

pub use comment::{Comment, CommentReport};
pub use community::{Community, CommunityStream, Content, MultiCommunityStream};
pub use post::{Post, PostReport};
