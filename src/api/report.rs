use serde::{Deserialize, Serialize};

use super::comment::{Comment, CommentAggregates};
use super::community::Community;
use super::person::Person;
use super::post::{Post, PostAggregates};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReport {
    pub id: i32,
    pub creator_id: i32,
    pub post_id: i32,
    pub original_post_name: String,
    pub original_post_url: Option<String>,
    pub original_post_body: Option<String>,
    pub reason: String,
    pub resolved: bool,
    pub resolver_id: Option<i32>,
    pub published: String,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReportView {
    pub post_report: PostReport,
    pub post: Post,
    pub community: Community,
    pub creator: Person,
    pub post_creator: Person,
    pub creator_banned_from_community: bool,
    pub my_vote: Option<i16>,
    pub counts: PostAggregates,
    pub resolver: Option<Person>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePostReport {
    pub post_id: i32,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvePostReport {
    pub report_id: i32,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReportResponse {
    pub post_report_view: PostReportView,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListPostReports {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPostReportsResponse {
    pub post_reports: Vec<PostReportView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReport {
    pub id: i32,
    pub creator_id: i32,
    pub comment_id: i32,
    pub original_comment_text: String,
    pub reason: String,
    pub resolved: bool,
    pub resolver_id: Option<i32>,
    pub published: String,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReportView {
    pub comment_report: CommentReport,
    pub comment: Comment,
    pub post: Post,
    pub community: Community,
    pub creator: Person,
    pub comment_creator: Person,
    pub counts: CommentAggregates,
    pub creator_banned_from_community: bool,
    pub my_vote: Option<i16>,
    pub resolver: Option<Person>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentReport {
    pub comment_id: i32,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveCommentReport {
    pub report_id: i32,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReportResponse {
    pub comment_report_view: CommentReportView,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListCommentReports {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCommentReportsResponse {
    pub comment_reports: Vec<CommentReportView>,
}
