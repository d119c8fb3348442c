use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::api::{
    CommentReportResponse, CommentReportView, CommentView, CreateCommentReport,
    ResolveCommentReport,
};
use crate::client::{Lemmy, PostRef};
use crate::endpoints::Endpoint;
use crate::error::Result;

use super::{Community, Post};

/// A comment, with lazily resolved handles to its post and community.
#[derive(Debug, Clone)]
pub struct Comment {
    lemmy: Arc<Lemmy>,
    view: CommentView,
    post: OnceCell<Post>,
    community: OnceCell<Community>,
}

impl Comment {
    pub fn new(lemmy: Arc<Lemmy>, view: CommentView) -> Self {
        Self {
            lemmy,
            view,
            post: OnceCell::new(),
            community: OnceCell::new(),
        }
    }

    pub fn with_post(mut self, post: Post) -> Self {
        self.post = OnceCell::new_with(Some(post));
        self
    }

    pub fn with_community(mut self, community: Community) -> Self {
        self.community = OnceCell::new_with(Some(community));
        self
    }

    pub fn view(&self) -> &CommentView {
        &self.view
    }

    pub fn into_view(self) -> CommentView {
        self.view
    }

    pub fn id(&self) -> i32 {
        self.view.comment.id
    }

    pub fn content(&self) -> &str {
        &self.view.comment.content
    }

    pub fn ap_id(&self) -> &str {
        &self.view.comment.ap_id
    }

    /// The post this comment sits under.
    pub async fn post(&self) -> Result<&Post> {
        self.post
            .get_or_try_init(|| self.lemmy.get_post(PostRef::Id(self.view.post.id)))
            .await
    }

    pub async fn community(&self) -> Result<&Community> {
        self.community
            .get_or_try_init(|| self.lemmy.get_community(self.view.community.id))
            .await
    }

    pub async fn create_report(&self, reason: &str) -> Result<CommentReport> {
        let form = CreateCommentReport {
            comment_id: self.id(),
            reason: reason.to_string(),
            auth: Some(self.lemmy.token().await?),
        };
        let response: CommentReportResponse =
            self.lemmy.post(Endpoint::CreateCommentReport, &form).await?;
        Ok(CommentReport::new(self.lemmy.clone(), response.comment_report_view).with_comment(self.clone()))
    }
}

/// A report filed against a comment.
#[derive(Debug, Clone)]
pub struct CommentReport {
    lemmy: Arc<Lemmy>,
    view: CommentReportView,
    comment: Option<Comment>,
}

impl CommentReport {
    pub fn new(lemmy: Arc<Lemmy>, view: CommentReportView) -> Self {
        Self { lemmy, view, comment: None }
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn view(&self) -> &CommentReportView {
        &self.view
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.view.comment_report.resolved
    }

    pub async fn resolve(&self, resolved: bool) -> Result<CommentReport> {
        let form = ResolveCommentReport {
            report_id: self.view.comment_report.id,
            resolved,
            auth: Some(self.lemmy.token().await?),
        };
        let response: CommentReportResponse =
            self.lemmy.put(Endpoint::ResolveCommentReport, &form).await?;
        Ok(Self {
            lemmy: self.lemmy.clone(),
            view: response.comment_report_view,
            comment: self.comment.clone(),
        })
    }
}
