use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::api::{ApiResult, Backend, FeedKind};
use crate::app::ApiError;
use crate::domain::{Comment, Post};
use crate::query::{encode_request, FeedQuery};
use crate::source::cache::RequestCache;

/// What the feed controller needs from a list item.
pub trait FeedItem: Clone + Send + Sync + 'static {
    fn item_id(&self) -> i64;
}

impl FeedItem for Post {
    fn item_id(&self) -> i64 {
        self.id
    }
}

impl FeedItem for Comment {
    fn item_id(&self) -> i64 {
        self.id
    }
}

/// One fetched page. Pages are never concatenated here.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    /// The backend does not report totals yet.
    pub total: Option<u64>,
}

impl<T> FeedPage<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A pure page fetcher keyed by the whole query.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn load(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<T>>>;

    /// Fetch again even when a settled page is cached.
    async fn reload(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<T>>>;
}

/// Home or explore feed pages, deduplicated and memoised per query.
pub struct FeedSource {
    backend: Arc<dyn Backend>,
    kind: FeedKind,
    cache: RequestCache<FeedQuery, FeedPage<Post>>,
}

impl FeedSource {
    pub fn new(backend: Arc<dyn Backend>, kind: FeedKind) -> Self {
        Self {
            backend,
            kind,
            cache: RequestCache::new(),
        }
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Drop every cached page, e.g. after a mutation changed the feed.
    pub fn invalidate(&self) {
        tracing::debug!("Invalidating {:?} feed pages", self.kind);
        self.cache.clear();
    }

    fn fetcher(
        &self,
        query: &FeedQuery,
    ) -> impl FnOnce() -> BoxFuture<'static, ApiResult<FeedPage<Post>>> {
        let backend = self.backend.clone();
        let kind = self.kind;
        let query = query.clone();
        move || {
            async move {
                tracing::info!("Fetching {}?{}", kind.path(), encode_request(&query));
                let posts = backend.feed(kind, &query).await?;
                Ok::<_, ApiError>(FeedPage::new(posts))
            }
            .boxed()
        }
    }
}

#[async_trait]
impl PageSource<Post> for FeedSource {
    async fn load(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<Post>>> {
        self.cache.get(query.clone(), self.fetcher(query)).await
    }

    async fn reload(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<Post>>> {
        self.cache.refresh(query.clone(), self.fetcher(query)).await
    }
}
