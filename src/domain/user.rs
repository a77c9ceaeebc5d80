use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub img_url: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub verified: bool,
    pub created_at: String,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            "(unknown)"
        } else {
            &self.username
        }
    }
}

/// Response of `GET /users/{id}/profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub user: User,
    pub is_followed: bool,
    pub posts_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
}

/// Response of `GET /users/{id}/is_followed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FollowState {
    pub is_followed: bool,
}
