use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Identity decoded from the bearer token payload.
///
/// Display only: the signature is never checked client side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub img_url: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }
}

/// Claims carried in the middle segment of the token.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Claims {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default, rename = "imgUrl")]
    pub img_url: Option<String>,
    pub exp: i64,
}

impl Claims {
    pub fn into_session(self) -> Option<Session> {
        let expiry = DateTime::<Utc>::from_timestamp(self.exp, 0)?;
        Some(Session {
            user_id: self.user_id,
            username: self.username,
            email: self.email,
            role: self.role,
            img_url: self.img_url,
            expiry,
        })
    }
}
