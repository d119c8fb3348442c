//! JSON fixtures shaped like Lemmy v3 responses.

#![allow(dead_code)]

use std::sync::Arc;

use livescroll_lemmy::{ClientConfig, Lemmy};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const PUBLISHED: &str = "2023-06-20T12:34:56.123456";

pub fn anonymous(server: &MockServer) -> Arc<Lemmy> {
    Lemmy::new(ClientConfig::new(&server.uri()).unwrap()).unwrap()
}

pub fn authenticated(server: &MockServer) -> Arc<Lemmy> {
    let config = ClientConfig::new(&server.uri())
        .unwrap()
        .with_credentials("lemmy", "lemmylemmy")
        .with_user_agent("livescroll tests");
    Lemmy::new(config).unwrap()
}

pub fn person(id: i32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "banned": false,
        "published": PUBLISHED,
        "actor_id": format!("http://lemmy.test/u/{name}"),
        "local": true,
        "deleted": false,
        "bot_account": false,
        "instance_id": 1
    })
}

pub fn community(id: i32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "title": format!("The {name} community"),
        "removed": false,
        "published": PUBLISHED,
        "deleted": false,
        "nsfw": false,
        "actor_id": format!("http://lemmy.test/c/{name}"),
        "local": true,
        "hidden": false,
        "posting_restricted_to_mods": false,
        "instance_id": 1
    })
}

pub fn community_view(id: i32, name: &str) -> Value {
    json!({
        "community": community(id, name),
        "subscribed": "NotSubscribed",
        "blocked": false,
        "counts": {
            "id": id,
            "community_id": id,
            "subscribers": 1,
            "posts": 0,
            "comments": 0,
            "users_active_day": 0,
            "users_active_week": 0,
            "users_active_month": 0,
            "users_active_half_year": 0
        }
    })
}

pub fn post(id: i32, name: &str, community_id: i32) -> Value {
    json!({
        "id": id,
        "name": name,
        "creator_id": 1,
        "community_id": community_id,
        "removed": false,
        "locked": false,
        "published": PUBLISHED,
        "deleted": false,
        "nsfw": false,
        "ap_id": format!("http://lemmy.test/post/{id}"),
        "local": true,
        "language_id": 0,
        "featured_community": false,
        "featured_local": false
    })
}

pub fn post_view(id: i32, name: &str, community_name: &str) -> Value {
    json!({
        "post": post(id, name, 1),
        "creator": person(1, "lemmy"),
        "community": community(1, community_name),
        "creator_banned_from_community": false,
        "counts": {
            "id": id,
            "post_id": id,
            "comments": 0,
            "score": 1,
            "upvotes": 1,
            "downvotes": 0
        },
        "subscribed": "NotSubscribed",
        "saved": false,
        "read": false,
        "creator_blocked": false,
        "unread_comments": 0
    })
}

pub fn comment(id: i32, content: &str, post_id: i32) -> Value {
    json!({
        "id": id,
        "creator_id": 1,
        "post_id": post_id,
        "content": content,
        "removed": false,
        "published": PUBLISHED,
        "deleted": false,
        "ap_id": format!("http://lemmy.test/comment/{id}"),
        "local": true,
        "path": format!("0.{id}"),
        "distinguished": false,
        "language_id": 0
    })
}

fn comment_counts(id: i32) -> Value {
    json!({
        "id": id,
        "comment_id": id,
        "score": 1,
        "upvotes": 1,
        "downvotes": 0,
        "child_count": 0
    })
}

pub fn comment_view(id: i32, content: &str, post_id: i32, community_name: &str) -> Value {
    json!({
        "comment": comment(id, content, post_id),
        "creator": person(1, "lemmy"),
        "post": post(post_id, "A post", 1),
        "community": community(1, community_name),
        "counts": comment_counts(id),
        "creator_banned_from_community": false,
        "subscribed": "NotSubscribed",
        "saved": false,
        "creator_blocked": false
    })
}

pub fn post_report_view(id: i32, post_id: i32, reason: &str, resolved: bool) -> Value {
    json!({
        "post_report": {
            "id": id,
            "creator_id": 2,
            "post_id": post_id,
            "original_post_name": "A post",
            "reason": reason,
            "resolved": resolved,
            "resolver_id": if resolved { Some(1) } else { None },
            "published": PUBLISHED
        },
        "post": post(post_id, "A post", 1),
        "community": community(1, "test"),
        "creator": person(2, "reporter"),
        "post_creator": person(1, "lemmy"),
        "creator_banned_from_community": false,
        "counts": {
            "id": post_id,
            "post_id": post_id,
            "comments": 0,
            "score": 1,
            "upvotes": 1,
            "downvotes": 0
        }
    })
}

pub fn comment_report_view(id: i32, comment_id: i32, reason: &str, resolved: bool) -> Value {
    json!({
        "comment_report": {
            "id": id,
            "creator_id": 2,
            "comment_id": comment_id,
            "original_comment_text": "hello",
            "reason": reason,
            "resolved": resolved,
            "resolver_id": if resolved { Some(1) } else { None },
            "published": PUBLISHED
        },
        "comment": comment(comment_id, "hello", 5),
        "post": post(5, "A post", 1),
        "community": community(1, "test"),
        "creator": person(2, "reporter"),
        "comment_creator": person(1, "lemmy"),
        "counts": comment_counts(comment_id),
        "creator_banned_from_community": false
    })
}
