//! Structured feed query shared by the address bar, the filter draft and the
//! request cache key.

pub mod codec;

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use codec::{decode, encode, encode_request, QueryPatch};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    /// Newest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }

    pub fn from_param(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortOrder::Ascending),
            "desc" => Some(SortOrder::Descending),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Ascending => "Oldest first",
            SortOrder::Descending => "Most recent",
        }
    }
}

/// Feed filtering, sorting and pagination parameters.
///
/// Tags behave as a set: they are lower-cased, never duplicated, and compared
/// without regard to order, while insertion order is kept for display.
/// An empty search string is stored as `None`.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort: SortOrder,
    tags: Vec<String>,
    search: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            sort: SortOrder::Descending,
            tags: Vec::new(),
            search: None,
            since: None,
            until: None,
        }
    }
}

impl FeedQuery {
    /// Defaults with the fields present in `patch` layered on top.
    pub fn from_patch(patch: &QueryPatch) -> Self {
        let mut query = Self::default();
        query.apply(patch);
        query
    }

    /// Overwrite every field carried by `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: &QueryPatch) {
        if let Some(limit) = patch.limit.as_deref().and_then(|s| s.parse::<u32>().ok()) {
            if limit > 0 {
                self.limit = limit;
            }
        }
        if let Some(offset) = patch.offset.as_deref().and_then(|s| s.parse::<u32>().ok()) {
            self.offset = offset;
        }
        if let Some(sort) = patch.sort {
            self.sort = sort;
        }
        if let Some(tags) = &patch.tags {
            self.tags.clear();
            for tag in tags {
                self.add_tag(tag);
            }
        }
        if let Some(search) = &patch.search {
            self.set_search(search.clone());
        }
        if let Some(since) = patch.since.as_deref().and_then(parse_timestamp) {
            self.since = Some(since);
        }
        if let Some(until) = patch.until.as_deref().and_then(parse_timestamp) {
            self.until = Some(until);
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Add a tag, or each piece of a comma separated list. Returns false
    /// when nothing new was added.
    pub fn add_tag(&mut self, input: &str) -> bool {
        let mut added = false;
        for tag in input.split(',') {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() || self.tags.contains(&tag) {
                continue;
            }
            self.tags.push(tag);
            added = true;
        }
        added
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim().to_lowercase();
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        self.search = if search.is_empty() { None } else { Some(search) };
    }

    /// The query for the page following this one.
    pub fn next_page(&self) -> Self {
        let mut next = self.clone();
        next.offset = self.offset.saturating_add(self.limit);
        next
    }

    /// Same filters, sort and page size; only the offset may differ.
    pub fn same_filters(&self, other: &FeedQuery) -> bool {
        self.limit == other.limit
            && self.sort == other.sort
            && self.search == other.search
            && self.since == other.since
            && self.until == other.until
            && self.sorted_tags() == other.sorted_tags()
    }

    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    fn sorted_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl PartialEq for FeedQuery {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset && self.same_filters(other)
    }
}

impl Eq for FeedQuery {}

impl Hash for FeedQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.limit.hash(state);
        self.offset.hash(state);
        self.sort.hash(state);
        self.sorted_tags().hash(state);
        self.search.hash(state);
        self.since.hash(state);
        self.until.hash(state);
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(q: &FeedQuery) -> u64 {
        let mut hasher = DefaultHasher::new();
        q.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_defaults() {
        let q = FeedQuery::default();
        assert_eq!(q.limit, 10);
        assert_eq!(q.offset, 0);
        assert_eq!(q.sort, SortOrder::Descending);
        assert!(q.tags().is_empty());
        assert_eq!(q.search(), None);
    }

    #[test]
    fn test_tags_are_lowercased_and_unique() {
        let mut q = FeedQuery::default();
        assert!(q.add_tag("Art"));
        assert!(!q.add_tag("art"));
        assert!(!q.add_tag("   "));
        assert!(q.add_tag("music"));
        assert_eq!(q.tags(), ["art", "music"]);
    }

    #[test]
    fn test_comma_separated_tags_are_split() {
        let mut q = FeedQuery::default();
        assert!(q.add_tag("Rock, roll,,"));
        assert!(!q.add_tag("roll,rock"));
        assert_eq!(q.tags(), ["rock", "roll"]);
    }

    #[test]
    fn test_tag_order_ignored_for_equality_and_hash() {
        let mut a = FeedQuery::default();
        a.add_tag("art");
        a.add_tag("music");
        let mut b = FeedQuery::default();
        b.add_tag("music");
        b.add_tag("art");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(b.tags(), ["music", "art"]);
    }

    #[test]
    fn test_empty_search_is_absent() {
        let mut q = FeedQuery::default();
        q.set_search("rust");
        assert_eq!(q.search(), Some("rust"));
        q.set_search("");
        assert_eq!(q.search(), None);
        assert_eq!(q, FeedQuery::default());
    }

    #[test]
    fn test_next_page_advances_by_limit() {
        let mut q = FeedQuery::default();
        q.offset = 10;
        let next = q.next_page();
        assert_eq!(next.offset, 20);
        assert!(next.same_filters(&q));
        assert_ne!(next, q);
    }

    #[test]
    fn test_apply_ignores_invalid_numbers() {
        let patch = QueryPatch {
            limit: Some("0".into()),
            offset: Some("abc".into()),
            ..Default::default()
        };
        let q = FeedQuery::from_patch(&patch);
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
    }

    #[test]
    fn test_sort_toggle() {
        assert_eq!(SortOrder::Descending.toggled(), SortOrder::Ascending);
        assert_eq!(SortOrder::from_param("asc"), Some(SortOrder::Ascending));
        assert_eq!(SortOrder::from_param("popular"), None);
    }
}
