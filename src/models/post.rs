use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::api::{
    CommentResponse, CreateComment, CreatePostReport, GetComments, GetCommentsResponse,
    PostReportResponse, PostReportView, PostView, ResolvePostReport,
};
use crate::client::Lemmy;
use crate::endpoints::Endpoint;
use crate::error::Result;

use super::{Comment, Community};

/// A post, plus a lazily resolved handle to its community.
#[derive(Debug, Clone)]
pub struct Post {
    lemmy: Arc<Lemmy>,
    view: PostView,
    community: OnceCell<Community>,
}

impl Post {
    pub fn new(lemmy: Arc<Lemmy>, view: PostView) -> Self {
        Self {
            lemmy,
            view,
            community: OnceCell::new(),
        }
    }

    /// Attach an already known community so [`community`](Self::community)
    /// does not have to look it up.
    pub fn with_community(mut self, community: Community) -> Self {
        self.community = OnceCell::new_with(Some(community));
        self
    }

    pub fn view(&self) -> &PostView {
        &self.view
    }

    pub fn into_view(self) -> PostView {
        self.view
    }

    pub fn id(&self) -> i32 {
        self.view.post.id
    }

    /// Title of the post.
    pub fn name(&self) -> &str {
        &self.view.post.name
    }

    pub fn ap_id(&self) -> &str {
        &self.view.post.ap_id
    }

    /// The community this was posted in.  Fetched on first use, then cached.
    pub async fn community(&self) -> Result<&Community> {
        self.community
            .get_or_try_init(|| self.lemmy.get_community(self.view.community.id))
            .await
    }

    /// Reply to the post at the top level.
    pub async fn create_comment(&self, content: &str, options: CreateComment) -> Result<Comment> {
        let form = CreateComment {
            content: content.to_string(),
            post_id: self.id(),
            auth: Some(self.lemmy.token().await?),
            ..options
        };
        let response: CommentResponse = self.lemmy.post(Endpoint::Comment, &form).await?;
        info!(post = self.id(), comment = response.comment_view.comment.id, "comment created");

        let mut comment = Comment::new(self.lemmy.clone(), response.comment_view).with_post(self.clone());
        if let Some(community) = self.community.get() {
            comment = comment.with_community(community.clone());
        }
        Ok(comment)
    }

    /// Comments under this post.
    pub async fn get_comments(&self, query: GetComments) -> Result<Vec<Comment>> {
        let query = GetComments {
            post_id: Some(self.id()),
            auth: self.lemmy.token_optional().await?,
            ..query
        };
        let response: GetCommentsResponse = self.lemmy.get(Endpoint::GetComments, &query).await?;
        let community = self.community.get();
        Ok(response
            .comments
            .into_iter()
            .map(|view| {
                let comment = Comment::new(self.lemmy.clone(), view).with_post(self.clone());
                match community {
                    Some(community) => comment.with_community(community.clone()),
                    None => comment,
                }
            })
            .collect())
    }

    /// Report the post to the community moderators.
    pub async fn create_report(&self, reason: &str) -> Result<PostReport> {
        let form = CreatePostReport {
            post_id: self.id(),
            reason: reason.to_string(),
            auth: Some(self.lemmy.token().await?),
        };
        let response: PostReportResponse = self.lemmy.post(Endpoint::CreatePostReport, &form).await?;
        Ok(PostReport::new(self.lemmy.clone(), response.post_report_view).with_post(self.clone()))
    }
}

/// A report filed against a post.
#[derive(Debug, Clone)]
pub struct PostReport {
    lemmy: Arc<Lemmy>,
    view: PostReportView,
    post: Option<Post>,
}

impl PostReport {
    pub fn new(lemmy: Arc<Lemmy>, view: PostReportView) -> Self {
        Self { lemmy, view, post: None }
    }

    pub fn with_post(mut self, post: Post) -> Self {
        self.post = Some(post);
        self
    }

    pub fn view(&self) -> &PostReportView {
        &self.view
    }

    /// The reported post, if this report was created from one.
    pub fn post(&self) -> Option<&Post> {
        self.post.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.view.post_report.resolved
    }

    /// Mark the report resolved (or reopen it with `false`).  Returns the
    /// updated report.
    pub async fn resolve(&self, resolved: bool) -> Result<PostReport> {
        let form = ResolvePostReport {
            report_id: self.view.post_report.id,
            resolved,
            auth: Some(self.lemmy.token().await?),
        };
        let response: PostReportResponse = self.lemmy.put(Endpoint::ResolvePostReport, &form).await?;
        Ok(Self {
            lemmy: self.lemmy.clone(),
            view: response.post_report_view,
            post: self.post.clone(),
        })
    }
}
