//! Draft/committed query state for one feed view.
//!
//! `committed` mirrors the address bar and keys the fetch; filter controls
//! edit `draft` until it is submitted. Fetches run on spawned tasks and
//! report back over a channel; a result is applied only while its query is
//! still the committed one.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::api::ApiResult;
use crate::app::ApiError;
use crate::feed::location::{Location, Navigator};
use crate::feed::presentation::FeedView;
use crate::query::{decode, encode, FeedQuery, SortOrder};
use crate::source::{FeedItem, FeedPage, PageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Nothing mounted yet.
    Idle,
    Pending,
    Failed,
    Ready,
}

struct Fetched<T> {
    seq: u64,
    query: FeedQuery,
    outcome: ApiResult<Arc<FeedPage<T>>>,
}

pub struct FeedController<T: FeedItem> {
    source: Arc<dyn PageSource<T>>,
    committed: FeedQuery,
    draft: FeedQuery,
    status: FetchStatus,
    error: Option<ApiError>,
    items: Vec<T>,
    /// Query of the last applied page.
    rendered: Option<FeedQuery>,
    /// Index in `items` where the rendered page starts.
    base: usize,
    page_len: usize,
    mounted: Option<u64>,
    /// Last issued request.
    seq: u64,
    /// Last applied request.
    applied: u64,
    tx: mpsc::UnboundedSender<Fetched<T>>,
    rx: mpsc::UnboundedReceiver<Fetched<T>>,
}

impl<T: FeedItem> FeedController<T> {
    pub fn new(source: Arc<dyn PageSource<T>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            committed: FeedQuery::default(),
            draft: FeedQuery::default(),
            status: FetchStatus::Idle,
            error: None,
            items: Vec::new(),
            rendered: None,
            base: 0,
            page_len: 0,
            mounted: None,
            seq: 0,
            applied: 0,
            tx,
            rx,
        }
    }

    pub fn committed(&self) -> &FeedQuery {
        &self.committed
    }

    pub fn draft(&self) -> &FeedQuery {
        &self.draft
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn view(&self) -> FeedView<'_, T> {
        FeedView {
            committed: &self.committed,
            draft: &self.draft,
            status: self.status,
            items: &self.items,
            current: self
                .rendered
                .as_ref()
                .is_some_and(|r| r.same_filters(&self.committed)),
            page_len: self.page_len,
            error: self.error.as_ref(),
        }
    }

    /// Seed both queries from `location` and fetch.
    ///
    /// Runs once per navigation entry; calling it again for the entry that
    /// is already mounted is a no-op, so re-rendering never resets filters.
    pub fn mount(&mut self, location: &Location) -> bool {
        if self.mounted == Some(location.id) {
            return false;
        }
        self.mounted = Some(location.id);
        self.committed = FeedQuery::from_patch(&decode(&location.query));
        self.draft = self.committed.clone();
        self.items.clear();
        self.rendered = None;
        self.base = 0;
        self.page_len = 0;
        tracing::debug!("Mounted feed at {}", location);
        self.fetch(false);
        true
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.draft.set_search(search);
        self.draft.offset = 0;
    }

    /// Stage a tag; takes effect on the next submit.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let added = self.draft.add_tag(tag);
        if added {
            self.draft.offset = 0;
        }
        added
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.draft.sort = sort;
        self.draft.offset = 0;
    }

    /// Remove a tag chip and submit in the same step.
    pub fn remove_tag(&mut self, tag: &str, nav: &mut Navigator) -> bool {
        if !self.draft.remove_tag(tag) {
            return false;
        }
        self.draft.offset = 0;
        self.submit(nav);
        true
    }

    pub fn clear_tags(&mut self, nav: &mut Navigator) {
        self.draft.clear_tags();
        self.draft.offset = 0;
        self.submit(nav);
    }

    /// Commit a snapshot of the draft, rewrite the address bar and fetch.
    pub fn submit(&mut self, nav: &mut Navigator) {
        self.committed = self.draft.clone();
        nav.replace_query(encode(&self.committed));
        self.fetch(false);
    }

    pub fn load_more(&mut self, nav: &mut Navigator) {
        self.draft.offset = self.draft.offset.saturating_add(self.draft.limit);
        self.submit(nav);
    }

    /// Fetch the committed page again, bypassing the cache.
    pub fn refresh(&mut self) {
        self.fetch(true);
    }

    fn fetch(&mut self, reload: bool) {
        self.seq += 1;
        self.status = FetchStatus::Pending;
        self.error = None;

        let seq = self.seq;
        let query = self.committed.clone();
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = if reload {
                source.reload(&query).await
            } else {
                source.load(&query).await
            };
            // The controller may be gone; nothing to report to then.
            let _ = tx.send(Fetched {
                seq,
                query,
                outcome,
            });
        });
    }

    /// Apply every result that has already arrived. Returns whether anything
    /// visible changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(fetched) = self.rx.try_recv() {
            changed |= self.apply(fetched);
        }
        changed
    }

    /// Wait for the next result and apply it.
    pub async fn settle(&mut self) -> bool {
        match self.rx.recv().await {
            Some(fetched) => self.apply(fetched),
            None => false,
        }
    }

    /// Wait until the latest request has been applied.
    pub async fn settle_all(&mut self) {
        while self.status == FetchStatus::Pending {
            match self.rx.recv().await {
                Some(fetched) => {
                    self.apply(fetched);
                }
                None => break,
            }
        }
    }

    fn apply(&mut self, fetched: Fetched<T>) -> bool {
        if fetched.query != self.committed {
            tracing::debug!("Discarding stale result for ?{}", encode(&fetched.query));
            return false;
        }
        if fetched.seq < self.applied {
            tracing::debug!("Discarding superseded result #{}", fetched.seq);
            return false;
        }
        self.applied = fetched.seq;
        let latest = fetched.seq == self.seq;

        match fetched.outcome {
            Ok(page) => {
                self.merge(&fetched.query, &page);
                if latest {
                    self.status = FetchStatus::Ready;
                }
            }
            Err(e) => {
                tracing::warn!("Feed request ?{} failed: {}", encode(&fetched.query), e);
                if latest {
                    self.status = FetchStatus::Failed;
                    self.error = Some(e);
                }
            }
        }
        true
    }

    /// Append the next page, replace the current one, or start over.
    fn merge(&mut self, query: &FeedQuery, page: &FeedPage<T>) {
        match &self.rendered {
            Some(prev) if prev.same_filters(query) && query.offset > prev.offset => {
                self.base = self.items.len();
            }
            Some(prev) if prev == query => {
                self.items.truncate(self.base);
            }
            _ => {
                self.items.clear();
                self.base = 0;
            }
        }

        let mut seen: HashSet<i64> = self.items.iter().map(FeedItem::item_id).collect();
        for item in &page.items {
            if seen.insert(item.item_id()) {
                self.items.push(item.clone());
            }
        }
        self.page_len = page.len();
        self.rendered = Some(query.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::oneshot;

    use crate::api::fake::{post, FakeBackend};
    use crate::api::FeedKind;
    use crate::domain::Post;
    use crate::feed::presentation::{present, FeedBody};
    use crate::source::FeedSource;

    /// Page source whose responses are released by the test.
    #[derive(Default)]
    struct Gated {
        gates: Mutex<HashMap<FeedQuery, oneshot::Receiver<Vec<Post>>>>,
    }

    impl Gated {
        fn gate(&self, query: &FeedQuery) -> oneshot::Sender<Vec<Post>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(query.clone(), rx);
            tx
        }
    }

    #[async_trait]
    impl PageSource<Post> for Gated {
        async fn load(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<Post>>> {
            let gate = self.gates.lock().unwrap().remove(query);
            let items = match gate {
                Some(rx) => rx.await.map_err(|_| ApiError::Transport("closed".into()))?,
                None => Vec::new(),
            };
            Ok(Arc::new(FeedPage::new(items)))
        }

        async fn reload(&self, query: &FeedQuery) -> ApiResult<Arc<FeedPage<Post>>> {
            self.load(query).await
        }
    }

    fn explore(backend: &Arc<FakeBackend>) -> FeedController<Post> {
        FeedController::new(Arc::new(FeedSource::new(backend.clone(), FeedKind::Explore)))
    }

    fn ids(c: &FeedController<Post>) -> Vec<i64> {
        c.items().iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_mount_seeds_both_queries_from_address() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let nav = Navigator::new("/explore?tags=art,music&sort=asc");
        let mut c = explore(&backend);

        assert!(c.mount(nav.current()));
        assert_eq!(c.committed().tags(), ["art", "music"]);
        assert_eq!(c.committed().sort, SortOrder::Ascending);
        assert_eq!(c.draft(), c.committed());
        assert_eq!(encode(c.committed()), "sort=asc&tags=art%2Cmusic");

        c.settle_all().await;
        assert_eq!(
            backend.calls(),
            vec!["/users/explore?limit=10&sort=asc&tags=art%2Cmusic"]
        );

        // Same navigation entry: nothing happens.
        assert!(!c.mount(nav.current()));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_drafts_do_not_fetch_until_submit() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let mut nav = Navigator::new("/explore");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        c.set_search("rust");
        c.add_tag("Async");
        assert_eq!(c.committed(), &FeedQuery::default());
        assert_eq!(nav.current().query, "");
        assert_eq!(backend.calls().len(), 1);

        c.submit(&mut nav);
        assert_eq!(nav.current().query, "tags=async&search=rust");
        c.settle_all().await;
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_snapshots_draft() {
        let backend = Arc::new(FakeBackend::with_posts(1));
        let mut nav = Navigator::new("/explore");
        let mut c = explore(&backend);
        c.mount(nav.current());

        c.set_search("rust");
        c.submit(&mut nav);
        c.set_search("go");
        c.add_tag("later");

        assert_eq!(c.committed().search(), Some("rust"));
        assert!(c.committed().tags().is_empty());
        assert_eq!(c.draft().search(), Some("go"));
    }

    #[tokio::test]
    async fn test_remove_tag_updates_address_and_refetches() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let mut nav = Navigator::new("/explore?tags=art,music");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        assert!(c.remove_tag("music", &mut nav));
        assert_eq!(nav.current().query, "tags=art");
        c.settle_all().await;
        assert_eq!(
            backend.calls().last().map(String::as_str),
            Some("/users/explore?limit=10&tags=art")
        );

        c.clear_tags(&mut nav);
        assert_eq!(nav.current().query, "");
        assert!(!c.remove_tag("missing", &mut nav));
    }

    #[tokio::test]
    async fn test_late_result_for_old_query_is_discarded() {
        let source = Arc::new(Gated::default());
        let mut nav = Navigator::new("/explore");
        let mut c: FeedController<Post> = FeedController::new(source.clone());

        let qa = FeedQuery::default();
        let mut qb = FeedQuery::default();
        qb.add_tag("b");
        let release_a = source.gate(&qa);
        let release_b = source.gate(&qb);

        c.mount(nav.current());
        c.add_tag("b");
        c.submit(&mut nav);

        release_b.send(vec![post(2)]).unwrap();
        assert!(c.settle().await);
        assert_eq!(c.status(), FetchStatus::Ready);

        release_a.send(vec![post(1)]).unwrap();
        assert!(!c.settle().await);
        assert_eq!(ids(&c), vec![2]);
        assert_eq!(c.committed(), &qb);
    }

    #[tokio::test]
    async fn test_early_result_for_old_query_keeps_pending() {
        let source = Arc::new(Gated::default());
        let mut nav = Navigator::new("/explore");
        let mut c: FeedController<Post> = FeedController::new(source.clone());

        let mut qb = FeedQuery::default();
        qb.set_search("b");
        let release_a = source.gate(&FeedQuery::default());
        let release_b = source.gate(&qb);

        c.mount(nav.current());
        c.set_search("b");
        c.submit(&mut nav);

        release_a.send(vec![post(1)]).unwrap();
        assert!(!c.settle().await);
        assert_eq!(c.status(), FetchStatus::Pending);
        assert!(c.items().is_empty());

        release_b.send(vec![post(2)]).unwrap();
        c.settle_all().await;
        assert_eq!(ids(&c), vec![2]);
    }

    #[tokio::test]
    async fn test_load_more_accumulates_and_hides_control_on_short_page() {
        let backend = Arc::new(FakeBackend::with_posts(13));
        let mut nav = Navigator::new("/explore");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        assert!(matches!(
            present(&c.view()),
            FeedBody::Items { load_more: true, .. }
        ));

        c.load_more(&mut nav);
        assert_eq!(nav.current().query, "offset=10");
        // Rendered items stay visible while the next page loads.
        assert!(matches!(
            present(&c.view()),
            FeedBody::Items {
                inline_skeleton: true,
                ..
            }
        ));

        c.settle_all().await;
        assert_eq!(ids(&c), (1..=13).collect::<Vec<_>>());
        assert!(matches!(
            present(&c.view()),
            FeedBody::Items { load_more: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_refresh_bypasses_cache_and_replaces_page() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let nav = Navigator::new("/explore");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        backend.posts.lock().unwrap().retain(|p| p.id != 2);
        c.refresh();
        c.settle_all().await;
        assert_eq!(ids(&c), vec![1, 3]);
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_then_try_again() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        *backend.fail_with.lock().unwrap() = Some(ApiError::Status {
            status: 500,
            message: Some("database unavailable".into()),
        });
        let nav = Navigator::new("/explore");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        assert_eq!(c.status(), FetchStatus::Failed);
        assert_eq!(
            present(&c.view()),
            FeedBody::Failed {
                message: "database unavailable".into()
            }
        );

        *backend.fail_with.lock().unwrap() = None;
        c.refresh();
        c.settle_all().await;
        assert_eq!(c.status(), FetchStatus::Ready);
        assert_eq!(c.items().len(), 3);
    }

    #[tokio::test]
    async fn test_new_navigation_entry_remounts() {
        let backend = Arc::new(FakeBackend::with_posts(3));
        let mut nav = Navigator::new("/explore?sort=asc");
        let mut c = explore(&backend);
        c.mount(nav.current());
        c.settle_all().await;

        nav.push("/users/1");
        nav.back();
        // Back restores the entry that was already mounted.
        assert!(!c.mount(nav.current()));

        nav.push("/explore?tags=x");
        assert!(c.mount(nav.current()));
        assert_eq!(c.committed().tags(), ["x"]);
        assert_eq!(c.committed().sort, SortOrder::Descending);
    }
}
