//! Serde mirrors of the Lemmy v3 JSON schema.
//!
//! Request forms implement [`Default`] and leave out `None` fields when
//! serialized, so callers only set what they need:
//!
//! ```ignore
//! let query = GetPosts { sort: Some(SortType::New), limit: Some(20), ..Default::default() };
//! ```
//!
//! The `auth` field of each form is filled in by the client.

pub mod auth;
pub mod comment;
pub mod community;
pub mod listing;
pub mod person;
pub mod post;
pub mod report;
pub mod site;

pub use auth::{Login, LoginResponse};
pub use comment::{
    Comment, CommentAggregates, CommentResponse, CommentView, CreateComment, GetComments,
    GetCommentsResponse,
};
pub use community::{
    Community, CommunityAggregates, CommunityModeratorView, CommunityResponse, CommunityView,
    CreateCommunity, GetCommunity, GetCommunityResponse, ListCommunities, ListCommunitiesResponse,
    SubscribedType,
};
pub use listing::{CommentSortType, ListingType, SortType};
pub use person::{GetPersonDetails, GetPersonDetailsResponse, Person, PersonAggregates, PersonView};
pub use post::{
    CreatePost, GetPost, GetPostResponse, GetPosts, GetPostsResponse, Post, PostAggregates,
    PostResponse, PostView,
};
pub use report::{
    CommentReport, CommentReportResponse, CommentReportView, CreateCommentReport, CreatePostReport,
    ListCommentReports, ListCommentReportsResponse, ListPostReports, ListPostReportsResponse,
    PostReport, PostReportResponse, PostReportView, ResolveCommentReport, ResolvePostReport,
};
pub use site::{GetSiteResponse, Site, SiteView};
