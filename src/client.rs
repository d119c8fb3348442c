//! The Lemmy HTTP client.
//!
//! One [`Lemmy`] talks to one instance.  It is handed around as
//! `Arc<Lemmy>` so that models and stream workers can keep calling it.

use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{
    CommentReportView, CommunityResponse, CreateCommunity, GetCommunity, GetCommunityResponse,
    GetPersonDetails, GetPersonDetailsResponse, GetPost, GetPostResponse, GetSiteResponse,
    ListCommentReports, ListCommentReportsResponse, ListCommunities, ListCommunitiesResponse,
    ListPostReports, ListPostReportsResponse, Login, LoginResponse, PostReportView,
};
use crate::config::ClientConfig;
use crate::endpoints::{Endpoint, API_BASE};
use crate::error::{ClientError, Result};
use crate::models::{Community, MultiCommunityStream, Post};

/// A community, looked up by id or by name, or one already fetched.
#[derive(Debug, Clone)]
pub enum CommunityRef {
    Id(i32),
    Name(String),
    /// Used as is, without another request.
    Resolved(Community),
}

impl From<i32> for CommunityRef {
    fn from(id: i32) -> Self {
        CommunityRef::Id(id)
    }
}

impl From<&str> for CommunityRef {
    fn from(name: &str) -> Self {
        CommunityRef::Name(name.to_string())
    }
}

impl From<String> for CommunityRef {
    fn from(name: String) -> Self {
        CommunityRef::Name(name)
    }
}

impl From<Community> for CommunityRef {
    fn from(community: Community) -> Self {
        CommunityRef::Resolved(community)
    }
}

impl From<&Community> for CommunityRef {
    fn from(community: &Community) -> Self {
        CommunityRef::Resolved(community.clone())
    }
}

impl fmt::Display for CommunityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunityRef::Id(id) => write!(f, "#{id}"),
            CommunityRef::Name(name) => write!(f, "c/{name}"),
            CommunityRef::Resolved(community) => write!(f, "c/{}", community.name()),
        }
    }
}

/// A post, looked up by its own id or by the id of one of its comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRef {
    Id(i32),
    Comment(i32),
}

/// Shape of Lemmy's error replies.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for one Lemmy instance.
///
/// ```ignore
/// let config = ClientConfig::new("http://127.0.0.1:8536")?
///     .with_credentials("lemmy", "lemmylemmy")
///     .with_user_agent("custom user-agent (by u/USERNAME)");
/// let lemmy = Lemmy::new(config)?;
/// let community = lemmy.get_community("test").await?;
/// ```
pub struct Lemmy {
    config: ClientConfig,
    http: reqwest::Client,
    api_base: Url,
    session: OnceCell<LoginResponse>,
}

impl fmt::Debug for Lemmy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lemmy")
            .field("url", &self.config.lemmy_url.as_str())
            .field("username", &self.config.username)
            .field("logged_in", &self.session.initialized())
            .finish()
    }
}

impl Lemmy {
    pub fn new(config: ClientConfig) -> Result<Arc<Self>> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        let api_base = config.lemmy_url.join(API_BASE)?;
        Ok(Arc::new(Self {
            config,
            http,
            api_base,
            session: OnceCell::new(),
        }))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Log in, or return the session from an earlier login.
    ///
    /// Only the first successful call reaches the server.
    pub async fn login(&self) -> Result<&LoginResponse> {
        self.session
            .get_or_try_init(|| async {
                let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
                else {
                    return Err(ClientError::MissingCredentials);
                };
                info!(username = %username, url = %self.config.lemmy_url, "logging in");
                let form = Login {
                    username_or_email: username.clone(),
                    password: password.clone(),
                };
                let response: LoginResponse = self.post(Endpoint::Login, &form).await?;
                if response.jwt.is_none() {
                    warn!(username = %username, "login returned no session token");
                    return Err(ClientError::LoginRejected);
                }
                Ok(response)
            })
            .await
    }

    /// Session token, logging in if needed.
    pub async fn token(&self) -> Result<String> {
        self.login()
            .await?
            .jwt
            .clone()
            .ok_or(ClientError::LoginRejected)
    }

    /// Session token when credentials are configured, `None` otherwise.
    /// For requests that work anonymously.
    pub async fn token_optional(&self) -> Result<Option<String>> {
        if !self.config.has_credentials() {
            return Ok(None);
        }
        self.token().await.map(Some)
    }

    /// Fetch a community.  A [`CommunityRef::Resolved`] is returned without
    /// a request.
    pub async fn get_community(self: &Arc<Self>, community: impl Into<CommunityRef>) -> Result<Community> {
        let mut query = GetCommunity::default();
        match community.into() {
            CommunityRef::Id(id) => query.id = Some(id),
            CommunityRef::Name(name) => query.name = Some(name),
            CommunityRef::Resolved(community) => return Ok(community),
        }
        query.auth = self.token_optional().await?;
        let response: GetCommunityResponse = self.get(Endpoint::Community, &query).await?;
        Ok(Community::new(self.clone(), response.community_view))
    }

    /// Create a community.  `name` ends up in the URL, `title` is the display
    /// name; everything else comes from `options`.
    pub async fn create_community(
        self: &Arc<Self>,
        name: &str,
        title: &str,
        options: CreateCommunity,
    ) -> Result<Community> {
        let form = CreateCommunity {
            name: name.to_string(),
            title: title.to_string(),
            auth: Some(self.token().await?),
            ..options
        };
        let response: CommunityResponse = self.post(Endpoint::Community, &form).await?;
        info!(community = name, id = response.community_view.community.id, "community created");
        Ok(Community::new(self.clone(), response.community_view))
    }

    pub async fn list_communities(self: &Arc<Self>, query: ListCommunities) -> Result<Vec<Community>> {
        let query = ListCommunities {
            auth: self.token_optional().await?,
            ..query
        };
        let response: ListCommunitiesResponse = self.get(Endpoint::ListCommunities, &query).await?;
        Ok(response
            .communities
            .into_iter()
            .map(|view| Community::new(self.clone(), view))
            .collect())
    }

    pub async fn get_post(self: &Arc<Self>, post: PostRef) -> Result<Post> {
        let mut query = GetPost {
            auth: self.token_optional().await?,
            ..Default::default()
        };
        match post {
            PostRef::Id(id) => query.id = Some(id),
            PostRef::Comment(id) => query.comment_id = Some(id),
        }
        let response: GetPostResponse = self.get(Endpoint::Post, &query).await?;
        let community = Community::new(self.clone(), response.community_view);
        Ok(Post::new(self.clone(), response.post_view).with_community(community))
    }

    /// Post reports visible to the logged-in moderator.
    pub async fn list_post_reports(&self, query: ListPostReports) -> Result<Vec<PostReportView>> {
        let query = ListPostReports {
            auth: Some(self.token().await?),
            ..query
        };
        let response: ListPostReportsResponse = self.get(Endpoint::ListPostReports, &query).await?;
        Ok(response.post_reports)
    }

    /// Comment reports visible to the logged-in moderator.
    pub async fn list_comment_reports(&self, query: ListCommentReports) -> Result<Vec<CommentReportView>> {
        let query = ListCommentReports {
            auth: Some(self.token().await?),
            ..query
        };
        let response: ListCommentReportsResponse =
            self.get(Endpoint::ListCommentReports, &query).await?;
        Ok(response.comment_reports)
    }

    pub async fn get_site(&self) -> Result<GetSiteResponse> {
        #[derive(Serialize)]
        struct GetSite {
            #[serde(skip_serializing_if = "Option::is_none")]
            auth: Option<String>,
        }
        let query = GetSite {
            auth: self.token_optional().await?,
        };
        self.get(Endpoint::Site, &query).await
    }

    pub async fn get_person_details(&self, query: GetPersonDetails) -> Result<GetPersonDetailsResponse> {
        let query = GetPersonDetails {
            auth: self.token_optional().await?,
            ..query
        };
        self.get(Endpoint::PersonDetails, &query).await
    }

    /// Resolve every community up front and bundle them for
    /// multi-community streaming.  Communities passed as [`Community`] are
    /// not fetched again.
    pub async fn multi_communities_stream<I, C>(self: &Arc<Self>, communities: I) -> Result<MultiCommunityStream>
    where
        I: IntoIterator<Item = C>,
        C: Into<CommunityRef>,
    {
        let mut resolved = Vec::new();
        for community in communities {
            resolved.push(self.get_community(community).await?);
        }
        Ok(MultiCommunityStream::new(resolved))
    }

    // -- transport -----------------------------------------------------------

    /// GET `endpoint` with `query` encoded in the URL.
    pub async fn get<Q, R>(&self, endpoint: Endpoint, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::GET, endpoint)?.query(query);
        self.send(endpoint, request).await
    }

    /// POST `body` as JSON to `endpoint`.
    pub async fn post<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::POST, endpoint)?.json(body);
        self.send(endpoint, request).await
    }

    /// PUT `body` as JSON to `endpoint`.
    pub async fn put<B, R>(&self, endpoint: Endpoint, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.request(Method::PUT, endpoint)?.json(body);
        self.send(endpoint, request).await
    }

    fn request(&self, method: Method, endpoint: Endpoint) -> Result<RequestBuilder> {
        let url = self.api_base.join(endpoint.relative())?;
        let mut request = self.http.request(method, url);
        if let Some(jwt) = self.session.get().and_then(|s| s.jwt.as_deref()) {
            request = request.bearer_auth(jwt);
        }
        Ok(request)
    }

    async fn send<R: DeserializeOwned>(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<R> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(endpoint = endpoint.relative(), %status, bytes = body.len(), "response received");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            warn!(endpoint = endpoint.relative(), %status, error = %message, "request rejected");
            return Err(ClientError::Api { status, message });
        }
        Ok(serde_json::from_str(&body)?)
    }
}
