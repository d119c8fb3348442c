use std::sync::Arc;

use crate::api::{
    CommentReportView, CommentSortType, CommunityView, CreatePost, GetComments, GetCommentsResponse,
    GetPosts, GetPostsResponse, ListCommentReports, ListPostReports, PostReportView, PostResponse,
    SortType,
};
use crate::client::Lemmy;
use crate::endpoints::Endpoint;
use crate::error::Result;
use crate::stream::{fetch_fn, key_fn, FetchFn, KeyFn, Merge, Poller, StreamError, StreamOptions};

use super::{Comment, Post};

/// A community on the instance.
///
/// ```ignore
/// let community = lemmy.get_community("test").await?;
/// let mut posts = community.stream().posts(StreamOptions::default(), GetPosts::default());
/// while let Some(post) = posts.next().await {
///     process_post(post?).await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Community {
    lemmy: Arc<Lemmy>,
    view: CommunityView,
}

impl Community {
    pub fn new(lemmy: Arc<Lemmy>, view: CommunityView) -> Self {
        Self { lemmy, view }
    }

    pub fn view(&self) -> &CommunityView {
        &self.view
    }

    pub fn id(&self) -> i32 {
        self.view.community.id
    }

    pub fn name(&self) -> &str {
        &self.view.community.name
    }

    pub fn title(&self) -> &str {
        &self.view.community.title
    }

    pub fn lemmy(&self) -> &Arc<Lemmy> {
        &self.lemmy
    }

    /// Submit a post titled `name` to this community.
    pub async fn create_post(&self, name: &str, options: CreatePost) -> Result<Post> {
        let form = CreatePost {
            name: name.to_string(),
            community_id: self.id(),
            auth: Some(self.lemmy.token().await?),
            ..options
        };
        let response: PostResponse = self.lemmy.post(Endpoint::Post, &form).await?;
        Ok(Post::new(self.lemmy.clone(), response.post_view).with_community(self.clone()))
    }

    /// One page of posts, scoped to this community.
    pub async fn get_posts(&self, query: GetPosts) -> Result<Vec<Post>> {
        let query = GetPosts {
            community_id: Some(self.id()),
            auth: self.lemmy.token_optional().await?,
            ..query
        };
        let response: GetPostsResponse = self.lemmy.get(Endpoint::GetPosts, &query).await?;
        Ok(response
            .posts
            .into_iter()
            .map(|view| Post::new(self.lemmy.clone(), view).with_community(self.clone()))
            .collect())
    }

    /// One page of comments across every post of this community.
    pub async fn get_comments(&self, query: GetComments) -> Result<Vec<Comment>> {
        let query = GetComments {
            community_id: Some(self.id()),
            auth: self.lemmy.token_optional().await?,
            ..query
        };
        let response: GetCommentsResponse = self.lemmy.get(Endpoint::GetComments, &query).await?;
        Ok(response
            .comments
            .into_iter()
            .map(|view| Comment::new(self.lemmy.clone(), view).with_community(self.clone()))
            .collect())
    }

    pub async fn list_post_reports(&self, query: ListPostReports) -> Result<Vec<PostReportView>> {
        self.lemmy
            .list_post_reports(ListPostReports {
                community_id: Some(self.id()),
                ..query
            })
            .await
    }

    pub async fn list_comment_reports(&self, query: ListCommentReports) -> Result<Vec<CommentReportView>> {
        self.lemmy
            .list_comment_reports(ListCommentReports {
                community_id: Some(self.id()),
                ..query
            })
            .await
    }

    /// Streams of new content in this community.
    pub fn stream(&self) -> CommunityStream {
        CommunityStream {
            community: self.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stream plumbing
// ---------------------------------------------------------------------------

/// Listings are polled newest-first unless the caller picked a sort.
fn newest_posts(query: GetPosts) -> GetPosts {
    GetPosts {
        sort: query.sort.or(Some(SortType::New)),
        ..query
    }
}

fn newest_comments(query: GetComments) -> GetComments {
    GetComments {
        sort: query.sort.or(Some(CommentSortType::New)),
        ..query
    }
}

fn posts_fetcher(community: Community) -> FetchFn<Post, GetPosts> {
    fetch_fn(move |query: GetPosts| {
        let community = community.clone();
        async move { Ok::<_, anyhow::Error>(community.get_posts(query).await?) }
    })
}

fn comments_fetcher(community: Community) -> FetchFn<Comment, GetComments> {
    fetch_fn(move |query: GetComments| {
        let community = community.clone();
        async move { Ok::<_, anyhow::Error>(community.get_comments(query).await?) }
    })
}

fn post_key() -> KeyFn<Post, String> {
    key_fn(|post: &Post| post.ap_id().to_string())
}

fn comment_key() -> KeyFn<Comment, String> {
    key_fn(|comment: &Comment| comment.ap_id().to_string())
}

/// Single-community streams, obtained from [`Community::stream`].
#[derive(Debug, Clone)]
pub struct CommunityStream {
    community: Community,
}

impl CommunityStream {
    /// New posts, keyed by activity-pub id.  `query` is sent on every cycle.
    pub fn posts(&self, options: StreamOptions, query: GetPosts) -> Poller<Post, String, GetPosts> {
        Poller::with_args(posts_fetcher(self.community.clone()), post_key(), newest_posts(query))
            .with_options(options)
    }

    /// New comments, keyed by activity-pub id.
    pub fn comments(&self, options: StreamOptions, query: GetComments) -> Poller<Comment, String, GetComments> {
        Poller::with_args(
            comments_fetcher(self.community.clone()),
            comment_key(),
            newest_comments(query),
        )
        .with_options(options)
    }
}

/// Anything a multi-community content stream can deliver.
#[derive(Debug, Clone)]
pub enum Content {
    Post(Post),
    Comment(Comment),
}

impl Content {
    /// De-duplication key.  Prefixed so a post and a comment can never
    /// collide.
    pub fn key(&self) -> String {
        match self {
            Content::Post(post) => format!("post_{}", post.ap_id()),
            Content::Comment(comment) => format!("comment_{}", comment.ap_id()),
        }
    }

    /// Raw `published` timestamp as sent by the server.
    pub fn published(&self) -> &str {
        match self {
            Content::Post(post) => &post.view().post.published,
            Content::Comment(comment) => &comment.view().comment.published,
        }
    }

    pub fn community_name(&self) -> &str {
        match self {
            Content::Post(post) => &post.view().community.name,
            Content::Comment(comment) => &comment.view().community.name,
        }
    }
}

impl From<Post> for Content {
    fn from(post: Post) -> Self {
        Content::Post(post)
    }
}

impl From<Comment> for Content {
    fn from(comment: Comment) -> Self {
        Content::Comment(comment)
    }
}

/// Streams over several communities at once, obtained from
/// [`Lemmy::multi_communities_stream`].
///
/// Every community gets its own poller; results are merged into a single
/// callback.
#[derive(Debug, Clone)]
pub struct MultiCommunityStream {
    communities: Vec<Community>,
}

impl MultiCommunityStream {
    pub fn new(communities: Vec<Community>) -> Self {
        Self { communities }
    }

    pub fn communities(&self) -> &[Community] {
        &self.communities
    }

    /// Merge session over the posts of every community, for callers that
    /// want to pick a [`SourceErrorPolicy`](crate::stream::SourceErrorPolicy)
    /// or a filter.
    pub fn posts(&self, query: GetPosts) -> std::result::Result<Merge<Post, String, GetPosts>, StreamError> {
        let fetchers = self.communities.iter().cloned().map(posts_fetcher).collect();
        let keys = vec![post_key(); self.communities.len()];
        Merge::with_args(fetchers, keys, newest_posts(query))
    }

    pub fn comments(&self, query: GetComments) -> std::result::Result<Merge<Comment, String, GetComments>, StreamError> {
        let fetchers = self.communities.iter().cloned().map(comments_fetcher).collect();
        let keys = vec![comment_key(); self.communities.len()];
        Merge::with_args(fetchers, keys, newest_comments(query))
    }

    /// Posts and comments of every community: one source per community for
    /// posts, then one per community for comments.
    pub fn content(&self) -> std::result::Result<Merge<Content, String>, StreamError> {
        let mut fetchers: Vec<FetchFn<Content>> = Vec::with_capacity(self.communities.len() * 2);
        for community in &self.communities {
            let community = community.clone();
            fetchers.push(fetch_fn(move |()| {
                let community = community.clone();
                async move {
                    let posts = community.get_posts(newest_posts(GetPosts::default())).await?;
                    Ok::<_, anyhow::Error>(posts.into_iter().map(Content::from).collect())
                }
            }));
        }
        for community in &self.communities {
            let community = community.clone();
            fetchers.push(fetch_fn(move |()| {
                let community = community.clone();
                async move {
                    let comments = community
                        .get_comments(newest_comments(GetComments::default()))
                        .await?;
                    Ok::<_, anyhow::Error>(comments.into_iter().map(Content::from).collect())
                }
            }));
        }
        let keys = vec![key_fn(Content::key); fetchers.len()];
        Merge::new(fetchers, keys)
    }

    /// Call `callback` for every new post.  Returns the number delivered
    /// once `options.limit` is reached.
    pub async fn posts_apply<C>(&self, callback: C, options: StreamOptions) -> std::result::Result<usize, StreamError>
    where
        C: FnMut(Post),
    {
        self.posts(GetPosts::default())?
            .with_options(options)
            .apply(callback)
            .await
    }

    pub async fn comments_apply<C>(&self, callback: C, options: StreamOptions) -> std::result::Result<usize, StreamError>
    where
        C: FnMut(Comment),
    {
        self.comments(GetComments::default())?
            .with_options(options)
            .apply(callback)
            .await
    }

    /// Call `callback` for every new post or comment.
    pub async fn content_apply<C>(&self, callback: C, options: StreamOptions) -> std::result::Result<usize, StreamError>
    where
        C: FnMut(Content),
    {
        self.content()?.with_options(options).apply(callback).await
    }
}
