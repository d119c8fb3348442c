use serde::{Deserialize, Serialize};

use super::listing::{ListingType, SortType};
use super::person::Person;
use super::site::Site;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: i32,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub removed: bool,
    pub published: String,
    pub updated: Option<String>,
    pub deleted: bool,
    pub nsfw: bool,
    pub actor_id: String,
    pub local: bool,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub followers_url: Option<String>,
    pub inbox_url: Option<String>,
    pub hidden: bool,
    pub posting_restricted_to_mods: bool,
    pub instance_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityAggregates {
    pub id: i32,
    pub community_id: i32,
    pub subscribers: i64,
    pub posts: i64,
    pub comments: i64,
    pub users_active_day: i64,
    pub users_active_week: i64,
    pub users_active_month: i64,
    pub users_active_half_year: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscribedType {
    Subscribed,
    NotSubscribed,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityView {
    pub community: Community,
    pub subscribed: SubscribedType,
    pub blocked: bool,
    pub counts: CommunityAggregates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityModeratorView {
    pub community: Community,
    pub moderator: Person,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetCommunity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetCommunityResponse {
    pub community_view: CommunityView,
    pub site: Option<Site>,
    #[serde(default)]
    pub moderators: Vec<CommunityModeratorView>,
    #[serde(default)]
    pub discussion_languages: Vec<i32>,
}

/// Options for creating a community.  `name` and `title` are passed
/// separately to [`Lemmy::create_community`](crate::Lemmy::create_community).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCommunity {
    pub name: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_restricted_to_mods: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discussion_languages: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityResponse {
    pub community_view: CommunityView,
    #[serde(default)]
    pub discussion_languages: Vec<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCommunities {
    #[serde(rename = "type_", skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCommunitiesResponse {
    pub communities: Vec<CommunityView>,
}
