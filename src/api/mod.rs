pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app::ApiError;
use crate::domain::{Comment, NewPost, Post, Profile, User};
use crate::query::FeedQuery;

pub use http::HttpBackend;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The `{data: ...}` wrapper around every backend response.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Posts from followed users.
    Home,
    /// Posts from everyone.
    Explore,
}

impl FeedKind {
    pub fn path(self) -> &'static str {
        match self {
            FeedKind::Home => "/users/feed",
            FeedKind::Explore => "/users/explore",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            FeedKind::Home => "Your Feed",
            FeedKind::Explore => "Explore",
        }
    }

    pub fn empty_message(self) -> &'static str {
        match self {
            FeedKind::Home => "No posts found.",
            FeedKind::Explore => "No posts found. Be the first to post something!",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// The REST surface of the social backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn feed(&self, kind: FeedKind, query: &FeedQuery) -> ApiResult<Vec<Post>>;
    async fn post(&self, post_id: i64) -> ApiResult<Post>;
    async fn create_post(&self, post: &NewPost) -> ApiResult<Post>;
    async fn comments(&self, post_id: i64) -> ApiResult<Vec<Comment>>;
    async fn add_comment(&self, post_id: i64, content: &str) -> ApiResult<Comment>;
    async fn follow(&self, user_id: i64) -> ApiResult<()>;
    async fn unfollow(&self, user_id: i64) -> ApiResult<()>;
    async fn profile(&self, user_id: i64) -> ApiResult<Profile>;
    async fn is_followed(&self, user_id: i64) -> ApiResult<bool>;
    async fn user_posts(&self, user_id: i64) -> ApiResult<Vec<Post>>;
    /// Returns the bearer token.
    async fn login(&self, credentials: &Credentials) -> ApiResult<String>;
    async fn register(&self, registration: &Registration) -> ApiResult<User>;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory backend for tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct FakeBackend {
        pub posts: Mutex<Vec<Post>>,
        pub comments: Mutex<HashMap<i64, Vec<Comment>>>,
        pub followed: Mutex<Vec<i64>>,
        pub fail_with: Mutex<Option<ApiError>>,
        pub token: Mutex<Option<String>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn with_posts(n: usize) -> Self {
            let backend = Self::default();
            *backend.posts.lock().unwrap() = (1..=n as i64).map(post).collect();
            backend
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> ApiResult<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    pub fn post(id: i64) -> Post {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": format!("Post {}", id),
            "content": format!("Content {}", id),
            "user_id": 100 + id,
            "user": {"id": 100 + id, "username": format!("user{}", id)},
        }))
        .unwrap()
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn feed(&self, kind: FeedKind, query: &FeedQuery) -> ApiResult<Vec<Post>> {
            self.record(format!(
                "{}?{}",
                kind.path(),
                crate::query::encode_request(query)
            ))?;
            let posts = self.posts.lock().unwrap();
            Ok(posts
                .iter()
                .skip(query.offset as usize)
                .take(query.limit as usize)
                .cloned()
                .collect())
        }

        async fn post(&self, post_id: i64) -> ApiResult<Post> {
            self.record(format!("/posts/{}", post_id))?;
            self.posts
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == post_id)
                .cloned()
                .ok_or(ApiError::NotFound(None))
        }

        async fn create_post(&self, new: &NewPost) -> ApiResult<Post> {
            self.record("POST /posts".into())?;
            let mut created = post(999);
            created.title = new.title.clone();
            created.content = new.content.clone();
            created.tags = new.tags.clone();
            self.posts.lock().unwrap().insert(0, created.clone());
            Ok(created)
        }

        async fn comments(&self, post_id: i64) -> ApiResult<Vec<Comment>> {
            self.record(format!("/posts/{}/comments", post_id))?;
            Ok(self
                .comments
                .lock()
                .unwrap()
                .get(&post_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn add_comment(&self, post_id: i64, content: &str) -> ApiResult<Comment> {
            self.record(format!("POST /posts/{}/comments", post_id))?;
            let mut comments = self.comments.lock().unwrap();
            let list = comments.entry(post_id).or_default();
            let comment: Comment = serde_json::from_value(serde_json::json!({
                "id": list.len() as i64 + 1,
                "post_id": post_id,
                "content": content,
            }))
            .unwrap();
            list.push(comment.clone());
            Ok(comment)
        }

        async fn follow(&self, user_id: i64) -> ApiResult<()> {
            self.record(format!("PUT /users/{}/follow", user_id))?;
            self.followed.lock().unwrap().push(user_id);
            Ok(())
        }

        async fn unfollow(&self, user_id: i64) -> ApiResult<()> {
            self.record(format!("PUT /users/{}/unfollow", user_id))?;
            self.followed.lock().unwrap().retain(|id| *id != user_id);
            Ok(())
        }

        async fn profile(&self, user_id: i64) -> ApiResult<Profile> {
            self.record(format!("/users/{}/profile", user_id))?;
            let mut profile = Profile::default();
            profile.user.id = user_id;
            profile.user.username = format!("user{}", user_id);
            profile.is_followed = self.followed.lock().unwrap().contains(&user_id);
            Ok(profile)
        }

        async fn is_followed(&self, user_id: i64) -> ApiResult<bool> {
            self.record(format!("/users/{}/is_followed", user_id))?;
            Ok(self.followed.lock().unwrap().contains(&user_id))
        }

        async fn user_posts(&self, user_id: i64) -> ApiResult<Vec<Post>> {
            self.record(format!("/users/{}/posts", user_id))?;
            Ok(self
                .posts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.author_id() == user_id)
                .cloned()
                .collect())
        }

        async fn login(&self, credentials: &Credentials) -> ApiResult<String> {
            self.record(format!("POST /auth/login {}", credentials.email))?;
            self.token
                .lock()
                .unwrap()
                .clone()
                .ok_or(ApiError::Unauthorized(None))
        }

        async fn register(&self, registration: &Registration) -> ApiResult<User> {
            self.record(format!("POST /auth/register {}", registration.username))?;
            Ok(User {
                id: 1,
                username: registration.username.clone(),
                email: registration.email.clone(),
                ..Default::default()
            })
        }
    }
}
