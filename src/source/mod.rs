pub mod cache;
pub mod feed;
pub mod readers;

use std::sync::Arc;

use crate::api::{ApiResult, Backend, FeedKind};
use crate::domain::{Comment, NewPost, Post};

pub use cache::RequestCache;
pub use feed::{FeedItem, FeedPage, FeedSource, PageSource};
pub use readers::{CommentsReader, PostReader, ProfileReader};

/// Every cached reader, plus the mutations that invalidate them.
pub struct Sources {
    backend: Arc<dyn Backend>,
    pub home: Arc<FeedSource>,
    pub explore: Arc<FeedSource>,
    pub posts: PostReader,
    pub comments: CommentsReader,
    pub profiles: ProfileReader,
}

impl Sources {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            home: Arc::new(FeedSource::new(backend.clone(), FeedKind::Home)),
            explore: Arc::new(FeedSource::new(backend.clone(), FeedKind::Explore)),
            posts: PostReader::new(backend.clone()),
            comments: CommentsReader::new(backend.clone()),
            profiles: ProfileReader::new(backend.clone()),
            backend,
        }
    }

    pub fn feed(&self, kind: FeedKind) -> Arc<FeedSource> {
        match kind {
            FeedKind::Home => self.home.clone(),
            FeedKind::Explore => self.explore.clone(),
        }
    }

    fn invalidate_feeds(&self) {
        self.home.invalidate();
        self.explore.invalidate();
    }

    pub async fn create_post(&self, post: &NewPost) -> ApiResult<Post> {
        let created = self.backend.create_post(post).await?;
        tracing::info!("Created post {}", created.id);
        self.invalidate_feeds();
        self.profiles.invalidate_posts();
        Ok(created)
    }

    /// Comment counts are part of every post snapshot, so feeds go too.
    pub async fn add_comment(&self, post_id: i64, content: &str) -> ApiResult<Comment> {
        let comment = self.backend.add_comment(post_id, content).await?;
        self.comments.invalidate(post_id);
        self.posts.invalidate(post_id);
        self.invalidate_feeds();
        Ok(comment)
    }

    pub async fn follow(&self, user_id: i64) -> ApiResult<()> {
        self.backend.follow(user_id).await?;
        tracing::info!("Followed user {}", user_id);
        self.profiles.invalidate_user(user_id);
        self.invalidate_feeds();
        Ok(())
    }

    pub async fn unfollow(&self, user_id: i64) -> ApiResult<()> {
        self.backend.unfollow(user_id).await?;
        tracing::info!("Unfollowed user {}", user_id);
        self.profiles.invalidate_user(user_id);
        self.invalidate_feeds();
        Ok(())
    }
}
