//! Client configuration.
//!
//! [`ClientConfig`] holds everything needed to reach one Lemmy instance:
//! where it lives, who to log in as, and how to identify ourselves.

use std::env;
use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_USER_AGENT: &str = concat!("livescroll-lemmy/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for a [`Lemmy`](crate::Lemmy) client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the instance, e.g. `http://127.0.0.1:8536`.
    ///
    /// The API lives at `/api/v3/` on this host.  Any path in the URL is
    /// dropped, so `https://host/lemmy` talks to `https://host/api/v3/`.
    pub lemmy_url: Url,
    /// Username or email.  Without credentials only anonymous reads work.
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Anonymous configuration for the instance at `lemmy_url`.
    pub fn new(lemmy_url: &str) -> Result<Self> {
        Ok(Self {
            lemmy_url: Url::parse(lemmy_url)?,
            username: None,
            password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build from `LEMMY_URL`, `LEMMY_USERNAME`, `LEMMY_PASSWORD` and
    /// `LEMMY_USER_AGENT`.  Only `LEMMY_URL` is required.
    pub fn from_env() -> Result<Self> {
        let url = env::var("LEMMY_URL")
            .map_err(|_| ClientError::Config("LEMMY_URL is not set".to_string()))?;
        let mut config = Self::new(&url)?;
        if let (Ok(username), Ok(password)) = (env::var("LEMMY_USERNAME"), env::var("LEMMY_PASSWORD")) {
            config = config.with_credentials(username, password);
        }
        if let Ok(user_agent) = env::var("LEMMY_USER_AGENT") {
            config = config.with_user_agent(user_agent);
        }
        Ok(config)
    }

    /// Whether both username and password are set.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}
