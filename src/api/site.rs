use serde::{Deserialize, Serialize};

use super::person::PersonView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: i32,
    pub name: String,
    pub sidebar: Option<String>,
    pub published: String,
    pub updated: Option<String>,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub actor_id: String,
    pub last_refreshed_at: Option<String>,
    pub inbox_url: Option<String>,
    pub public_key: Option<String>,
    pub instance_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteView {
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetSiteResponse {
    pub site_view: SiteView,
    #[serde(default)]
    pub admins: Vec<PersonView>,
    pub version: String,
}
