//! The process-wide bearer token slot.
//!
//! Components receive an `Arc<dyn SessionStore>` instead of reading the token
//! file themselves, so tests can substitute [`MemorySessionStore`].

pub mod file;

use std::sync::Mutex;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::session::Claims;
use crate::domain::Session;

pub use file::FileSessionStore;

pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;

    /// Replace the whole token.
    fn set_token(&self, token: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// The decoded session, or `None` when there is no usable token.
    fn session(&self) -> Option<Session> {
        self.token().and_then(|t| decode_token(&t, Utc::now()))
    }
}

/// Decode the payload segment of a `header.payload.signature` token.
///
/// Any malformed or expired token yields `None`: the client falls back to the
/// logged-out state rather than failing.
pub fn decode_token(token: &str, now: DateTime<Utc>) -> Option<Session> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!("Token does not have three segments");
        return None;
    };

    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Token payload is not base64url: {}", e);
            return None;
        }
    };

    let claims: Claims = match serde_json::from_slice(&bytes) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Token payload is not valid claims JSON: {}", e);
            return None;
        }
    };

    let session = claims.into_session()?;
    if session.is_expired_at(now) {
        tracing::debug!("Token for {} expired at {}", session.username, session.expiry);
        return None;
    }
    Some(session)
}

/// Volatile store, used by tests and `AppContext::in_memory`.
#[derive(Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_token(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_valid_token() {
        let exp = now().timestamp() + 3600;
        let session = decode_token(&token_for(3, "alice", exp), now()).unwrap();
        assert_eq!(session.user_id, 3);
        assert_eq!(session.username, "alice");
        assert_eq!(session.email, "alice@example.com");
        assert_eq!(session.role, "user");
        assert_eq!(session.expiry.timestamp(), exp);
    }

    #[test]
    fn test_expired_token_is_no_session() {
        let exp = now().timestamp() - 1;
        assert!(decode_token(&token_for(3, "alice", exp), now()).is_none());
    }

    #[test]
    fn test_malformed_tokens_are_no_session() {
        assert!(decode_token("", now()).is_none());
        assert!(decode_token("only.two", now()).is_none());
        assert!(decode_token("a.b.c.d", now()).is_none());
        assert!(decode_token("a.!!!notbase64.c", now()).is_none());
        let not_json = format!("a.{}.c", URL_SAFE_NO_PAD.encode("hello"));
        assert!(decode_token(&not_json, now()).is_none());
        let missing_user = make_token(serde_json::json!({"exp": now().timestamp() + 60}));
        assert!(decode_token(&missing_user, now()).is_none());
    }

    #[test]
    fn test_padded_payload_accepted() {
        let exp = now().timestamp() + 3600;
        let token = token_for(3, "alice", exp);
        let parts: Vec<&str> = token.split('.').collect();
        let padded = format!("{}.{}==.{}", parts[0], parts[1], parts[2]);
        assert!(decode_token(&padded, now()).is_some());
    }

    #[test]
    fn test_memory_store_set_and_clear() {
        let store = MemorySessionStore::new();
        assert!(store.token().is_none());
        store.set_token("abc").unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));
        // Not a decodable token.
        assert!(store.session().is_none());
        store.clear().unwrap();
        assert!(store.token().is_none());
    }
}
