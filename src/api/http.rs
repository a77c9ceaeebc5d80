use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::api::{ApiResult, Backend, Credentials, Envelope, FeedKind, Registration};
use crate::app::{ApiError, PlazaError, Result};
use crate::domain::{Comment, FollowState, NewPost, Post, Profile, User};
use crate::query::{encode_request, FeedQuery};
use crate::session::SessionStore;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// reqwest-backed [`Backend`].
///
/// The bearer token is read from the session store on every request so a
/// login or logout takes effect immediately.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
}

impl HttpBackend {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self> {
        Self::with_timeout(base_url, session, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<dyn SessionStore>,
        timeout: Duration,
    ) -> Result<Self> {
        // Validate early so a typo in the config surfaces at startup.
        Url::parse(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("plaza/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlazaError::Api(ApiError::Transport(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str, query: Option<&str>) -> ApiResult<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.set_query(Some(query));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match self.session.token() {
            Some(token) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => builder.header(AUTHORIZATION, value),
                Err(_) => {
                    tracing::warn!("Stored token is not a valid header value, sending anonymously");
                    builder
                }
            },
            None => builder,
        }
    }

    async fn execute(&self, builder: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::warn!("Request failed: {}", e);
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status.as_u16(), &body);
            tracing::debug!("Backend returned {}: {}", status, err);
            return Err(err);
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<T> {
        let response = self.execute(builder).await?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    /// Lists may come back as `{"data": null}`.
    async fn fetch_list<T: DeserializeOwned>(&self, builder: RequestBuilder) -> ApiResult<Vec<T>> {
        Ok(self
            .fetch::<Option<Vec<T>>>(builder)
            .await?
            .unwrap_or_default())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.endpoint(path, None)?;
        self.fetch(self.request(Method::GET, url)).await
    }
}

#[derive(serde::Serialize)]
struct FollowBody {
    user_id: i64,
}

#[derive(serde::Serialize)]
struct CommentBody<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[async_trait]
impl Backend for HttpBackend {
    async fn feed(&self, kind: FeedKind, query: &FeedQuery) -> ApiResult<Vec<Post>> {
        let qs = encode_request(query);
        let url = self.endpoint(kind.path(), Some(&qs))?;
        self.fetch_list(self.request(Method::GET, url)).await
    }

    async fn post(&self, post_id: i64) -> ApiResult<Post> {
        self.get(&format!("/posts/{}", post_id)).await
    }

    async fn create_post(&self, post: &NewPost) -> ApiResult<Post> {
        let url = self.endpoint("/posts", None)?;
        self.fetch(self.request(Method::POST, url).json(post)).await
    }

    async fn comments(&self, post_id: i64) -> ApiResult<Vec<Comment>> {
        let url = self.endpoint(&format!("/posts/{}/comments", post_id), None)?;
        self.fetch_list(self.request(Method::GET, url)).await
    }

    async fn add_comment(&self, post_id: i64, content: &str) -> ApiResult<Comment> {
        let url = self.endpoint(&format!("/posts/{}/comments", post_id), None)?;
        self.fetch(self.request(Method::POST, url).json(&CommentBody { content }))
            .await
    }

    async fn follow(&self, user_id: i64) -> ApiResult<()> {
        let url = self.endpoint(&format!("/users/{}/follow", user_id), None)?;
        self.execute(self.request(Method::PUT, url).json(&FollowBody { user_id }))
            .await?;
        Ok(())
    }

    async fn unfollow(&self, user_id: i64) -> ApiResult<()> {
        let url = self.endpoint(&format!("/users/{}/unfollow", user_id), None)?;
        self.execute(self.request(Method::PUT, url).json(&FollowBody { user_id }))
            .await?;
        Ok(())
    }

    async fn profile(&self, user_id: i64) -> ApiResult<Profile> {
        self.get(&format!("/users/{}/profile", user_id)).await
    }

    async fn is_followed(&self, user_id: i64) -> ApiResult<bool> {
        let state: Option<FollowState> = self.get(&format!("/users/{}/is_followed", user_id)).await?;
        Ok(state.map(|s| s.is_followed).unwrap_or(false))
    }

    async fn user_posts(&self, user_id: i64) -> ApiResult<Vec<Post>> {
        let url = self.endpoint(&format!("/users/{}/posts", user_id), None)?;
        self.fetch_list(self.request(Method::GET, url)).await
    }

    async fn login(&self, credentials: &Credentials) -> ApiResult<String> {
        let url = self.endpoint("/auth/login", None)?;
        let response: LoginResponse = self
            .fetch(self.client.post(url).json(credentials))
            .await?;
        Ok(response.token)
    }

    async fn register(&self, registration: &Registration) -> ApiResult<User> {
        let url = self.endpoint("/auth/register", None)?;
        self.fetch(self.client.post(url).json(registration)).await
    }
}
