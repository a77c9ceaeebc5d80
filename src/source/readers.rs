//! Single-resource readers: a post, its comments, and a user's profile.
//!
//! Same request/cache discipline as [`FeedSource`](super::FeedSource), keyed
//! by id instead of by query.

use std::sync::Arc;

use crate::api::{ApiResult, Backend};
use crate::domain::{Comment, Post, Profile};
use crate::source::cache::RequestCache;

pub struct PostReader {
    backend: Arc<dyn Backend>,
    cache: RequestCache<i64, Post>,
}

impl PostReader {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: RequestCache::new(),
        }
    }

    pub async fn get(&self, post_id: i64) -> ApiResult<Arc<Post>> {
        let backend = self.backend.clone();
        self.cache
            .get(post_id, move || async move { backend.post(post_id).await })
            .await
    }

    pub fn invalidate(&self, post_id: i64) {
        self.cache.invalidate(&post_id);
    }
}

pub struct CommentsReader {
    backend: Arc<dyn Backend>,
    cache: RequestCache<i64, Vec<Comment>>,
}

impl CommentsReader {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            cache: RequestCache::new(),
        }
    }

    pub async fn list(&self, post_id: i64) -> ApiResult<Arc<Vec<Comment>>> {
        let backend = self.backend.clone();
        self.cache
            .get(post_id, move || async move { backend.comments(post_id).await })
            .await
    }

    /// Manual "try again": fetch even if a list is cached.
    pub async fn reload(&self, post_id: i64) -> ApiResult<Arc<Vec<Comment>>> {
        let backend = self.backend.clone();
        self.cache
            .refresh(post_id, move || async move { backend.comments(post_id).await })
            .await
    }

    pub fn invalidate(&self, post_id: i64) {
        self.cache.invalidate(&post_id);
    }
}

/// Profile aggregate, follow state and authored posts of one user.
pub struct ProfileReader {
    backend: Arc<dyn Backend>,
    profiles: RequestCache<i64, Profile>,
    follow_state: RequestCache<i64, bool>,
    posts: RequestCache<i64, Vec<Post>>,
}

impl ProfileReader {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            profiles: RequestCache::new(),
            follow_state: RequestCache::new(),
            posts: RequestCache::new(),
        }
    }

    pub async fn profile(&self, user_id: i64) -> ApiResult<Arc<Profile>> {
        let backend = self.backend.clone();
        self.profiles
            .get(user_id, move || async move { backend.profile(user_id).await })
            .await
    }

    pub async fn is_followed(&self, user_id: i64) -> ApiResult<bool> {
        let backend = self.backend.clone();
        let followed = self
            .follow_state
            .get(user_id, move || async move { backend.is_followed(user_id).await })
            .await?;
        Ok(*followed)
    }

    pub async fn posts(&self, user_id: i64) -> ApiResult<Arc<Vec<Post>>> {
        let backend = self.backend.clone();
        self.posts
            .get(user_id, move || async move { backend.user_posts(user_id).await })
            .await
    }

    /// Forget everything cached about `user_id`.
    pub fn invalidate_user(&self, user_id: i64) {
        tracing::debug!("Invalidating cached profile data for user {}", user_id);
        self.profiles.invalidate(&user_id);
        self.follow_state.invalidate(&user_id);
        self.posts.invalidate(&user_id);
    }

    pub fn invalidate_posts(&self) {
        self.posts.clear();
        self.profiles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;

    #[tokio::test]
    async fn test_comments_are_cached_per_post() {
        let backend = Arc::new(FakeBackend::default());
        let reader = CommentsReader::new(backend.clone());

        let (a, b) = tokio::join!(reader.list(1), reader.list(1));
        assert!(a.unwrap().is_empty());
        assert!(b.unwrap().is_empty());
        reader.list(2).await.unwrap();
        assert_eq!(
            backend.calls(),
            vec!["/posts/1/comments", "/posts/2/comments"]
        );

        reader.reload(1).await.unwrap();
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_post_lookup_and_not_found() {
        let backend = Arc::new(FakeBackend::with_posts(2));
        let reader = PostReader::new(backend.clone());
        assert_eq!(reader.get(2).await.unwrap().title, "Post 2");
        assert!(reader.get(5).await.is_err());
        // Failure was not cached.
        assert!(reader.get(5).await.is_err());
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_user_refetches_follow_state() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let reader = ProfileReader::new(backend.clone());

        assert!(!reader.is_followed(102).await.unwrap());
        backend.followed.lock().unwrap().push(102);
        // Still cached.
        assert!(!reader.is_followed(102).await.unwrap());

        reader.invalidate_user(102);
        assert!(reader.is_followed(102).await.unwrap());

        let posts = reader.posts(102).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 2);
        let profile = reader.profile(102).await.unwrap();
        assert!(profile.is_followed);
    }
}
