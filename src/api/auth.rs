use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Login {
    pub username_or_email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session token.  Absent when the account still needs email
    /// verification or admin approval.
    pub jwt: Option<String>,
    #[serde(default)]
    pub registration_created: bool,
    #[serde(default)]
    pub verify_email_sent: bool,
}
