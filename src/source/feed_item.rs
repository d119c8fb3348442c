//! The row type shown in the viewer.
//!
//! `FeedItem` is a flattened post or comment: just the text and metadata
//! the list needs, so the UI never touches the API views.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime, Utc};
use livescroll_lemmy::models::Content;

/// Longest comment excerpt used as a title.
const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    /// Short marker shown in front of the title.
    pub fn marker(self) -> &'static str {
        match self {
            ItemKind::Post => "P",
            ItemKind::Comment => "C",
        }
    }
}

/// A single post or comment, ready for display.
///
/// ## Sorting
///
/// `FeedItem` implements [`Ord`] for **reverse-chronological** ordering:
/// newer items sort before older ones, and items without a date sort last.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FeedItem {
    /// Stream de-duplication key (`post_<ap_id>` / `comment_<ap_id>`).
    pub id: String,

    pub kind: ItemKind,

    /// Post title, or the first line of a comment.
    pub title: String,

    /// Post body or full comment text.
    pub description: Option<String>,

    /// Activity-pub URL of the post or comment.
    pub link: Option<String>,

    /// `None` when the server's timestamp could not be parsed.
    pub published: Option<DateTime<Utc>>,

    pub author: String,

    /// Community the item was posted in.
    pub source_name: String,
}

impl From<&Content> for FeedItem {
    fn from(content: &Content) -> Self {
        let published = parse_published(content.published());
        match content {
            Content::Post(post) => {
                let view = post.view();
                FeedItem {
                    id: content.key(),
                    kind: ItemKind::Post,
                    title: view.post.name.clone(),
                    description: view.post.body.clone(),
                    link: Some(view.post.ap_id.clone()),
                    published,
                    author: view.creator.name.clone(),
                    source_name: view.community.name.clone(),
                }
            }
            Content::Comment(comment) => {
                let view = comment.view();
                FeedItem {
                    id: content.key(),
                    kind: ItemKind::Comment,
                    title: excerpt(&view.comment.content),
                    description: Some(view.comment.content.clone()),
                    link: Some(view.comment.ap_id.clone()),
                    published,
                    author: view.creator.name.clone(),
                    source_name: view.community.name.clone(),
                }
            }
        }
    }
}

/// Parse a Lemmy timestamp.  Newer servers send RFC 3339; older ones send a
/// naive UTC time such as `2023-06-20T12:34:56.123456`.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// First non-empty line, cut to [`EXCERPT_CHARS`] characters.
fn excerpt(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= EXCERPT_CHARS {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(EXCERPT_CHARS - 1).collect();
    cut.push('…');
    cut
}

// ---------------------------------------------------------------------------
// Ordering: reverse chronological (newest first)
// ---------------------------------------------------------------------------

impl Ord for FeedItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // `other` first so that `Some(newer) > Some(older)` gives us newest-first.
        other.published.cmp(&self.published)
    }
}

impl PartialOrd for FeedItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
