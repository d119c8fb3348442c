use serde::{Deserialize, Serialize};

use super::comment::CommentView;
use super::community::CommunityModeratorView;
use super::listing::SortType;
use super::post::PostView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banned: bool,
    pub published: String,
    pub updated: Option<String>,
    pub actor_id: String,
    pub bio: Option<String>,
    pub local: bool,
    pub banner: Option<String>,
    pub deleted: bool,
    pub inbox_url: Option<String>,
    pub matrix_user_id: Option<String>,
    /// Some instances omit this field.
    pub admin: Option<bool>,
    pub bot_account: bool,
    pub ban_expires: Option<String>,
    pub instance_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAggregates {
    pub id: i32,
    pub person_id: i32,
    pub post_count: i64,
    pub post_score: i64,
    pub comment_count: i64,
    pub comment_score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonView {
    pub person: Person,
    pub counts: PersonAggregates,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetPersonDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetPersonDetailsResponse {
    pub person_view: PersonView,
    #[serde(default)]
    pub comments: Vec<CommentView>,
    #[serde(default)]
    pub posts: Vec<PostView>,
    #[serde(default)]
    pub moderates: Vec<CommunityModeratorView>,
}
