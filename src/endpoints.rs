//! Lemmy v3 endpoint table.

/// Prefix shared by every endpoint.
pub const API_BASE: &str = "/api/v3/";

/// The endpoints this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Site,
    Community,
    ListCommunities,
    Post,
    GetPosts,
    Comment,
    GetComments,
    PersonDetails,
    CreatePostReport,
    ResolvePostReport,
    ListPostReports,
    CreateCommentReport,
    ResolveCommentReport,
    ListCommentReports,
}

impl Endpoint {
    /// Path relative to [`API_BASE`].
    pub fn relative(self) -> &'static str {
        match self {
            Endpoint::Login => "user/login",
            Endpoint::Site => "site",
            Endpoint::Community => "community",
            Endpoint::ListCommunities => "community/list",
            Endpoint::Post => "post",
            Endpoint::GetPosts => "post/list",
            Endpoint::Comment => "comment",
            Endpoint::GetComments => "comment/list",
            Endpoint::PersonDetails => "user",
            Endpoint::CreatePostReport => "post/report",
            Endpoint::ResolvePostReport => "post/report/resolve",
            Endpoint::ListPostReports => "post/report/list",
            Endpoint::CreateCommentReport => "comment/report",
            Endpoint::ResolveCommentReport => "comment/report/resolve",
            Endpoint::ListCommentReports => "comment/report/list",
        }
    }

    /// Absolute path, e.g. `/api/v3/post/list`.
    pub fn path(self) -> String {
        format!("{API_BASE}{}", self.relative())
    }
}
