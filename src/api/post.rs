use serde::{Deserialize, Serialize};

use super::community::{Community, CommunityModeratorView, CommunityView, SubscribedType};
use super::listing::{ListingType, SortType};
use super::person::Person;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    pub body: Option<String>,
    pub creator_id: i32,
    pub community_id: i32,
    pub removed: bool,
    pub locked: bool,
    pub published: String,
    pub updated: Option<String>,
    pub deleted: bool,
    pub nsfw: bool,
    pub embed_title: Option<String>,
    pub embed_description: Option<String>,
    pub thumbnail_url: Option<String>,
    /// Activity-pub id; stable across instances.
    pub ap_id: String,
    pub local: bool,
    pub embed_video_url: Option<String>,
    pub language_id: i32,
    pub featured_community: bool,
    pub featured_local: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAggregates {
    pub id: i32,
    pub post_id: i32,
    pub comments: i64,
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub published: Option<String>,
    pub newest_comment_time: Option<String>,
    pub featured_community: Option<bool>,
    pub featured_local: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostView {
    pub post: Post,
    pub creator: Person,
    pub community: Community,
    pub creator_banned_from_community: bool,
    pub counts: PostAggregates,
    pub subscribed: SubscribedType,
    pub saved: bool,
    pub read: bool,
    pub creator_blocked: bool,
    pub my_vote: Option<i16>,
    pub unread_comments: i64,
}

/// Options for creating a post.  `name` and `community_id` are filled in by
/// [`Community::create_post`](crate::models::Community::create_post).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatePost {
    pub name: String,
    pub community_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honeypot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostResponse {
    pub post_view: PostView,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPostResponse {
    pub post_view: PostView,
    pub community_view: CommunityView,
    #[serde(default)]
    pub moderators: Vec<CommunityModeratorView>,
    #[serde(default)]
    pub online: i64,
}

/// Listing query for posts.  Also the per-cycle argument of post streams.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GetPosts {
    #[serde(rename = "type_", skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPostsResponse {
    pub posts: Vec<PostView>,
}
