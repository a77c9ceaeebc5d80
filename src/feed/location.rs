//! In-process address bar: a history of `path?query` locations.

use std::fmt;

/// One history entry. `id` identifies the navigation, not the contents:
/// replacing the query keeps it, pushing a new location mints a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: u64,
    pub path: String,
    pub query: String,
}

impl Location {
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    pub fn route(&self) -> Route {
        Route::parse(&self.path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Split `href` into path and query, normalising an empty path to `/`.
fn split_href(href: &str) -> (String, String) {
    let href = href.trim();
    let (path, query) = match href.split_once('?') {
        Some((path, query)) => (path, query),
        None => (href, ""),
    };
    let path = if path.is_empty() { "/" } else { path };
    (path.to_string(), query.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Explore,
    Profile(i64),
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Route::Home,
            "/explore" => Route::Explore,
            _ => trimmed
                .strip_prefix("/users/")
                .and_then(|id| id.parse().ok())
                .map(Route::Profile)
                .unwrap_or(Route::NotFound),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Explore => "/explore".to_string(),
            Route::Profile(id) => format!("/users/{}", id),
            Route::NotFound => "/404".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Navigator {
    entries: Vec<Location>,
    index: usize,
    next_id: u64,
}

impl Navigator {
    pub fn new(href: &str) -> Self {
        let (path, query) = split_href(href);
        Self {
            entries: vec![Location { id: 1, path, query }],
            index: 0,
            next_id: 2,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    /// Navigate to `href`, dropping any forward history.
    pub fn push(&mut self, href: &str) -> &Location {
        let (path, query) = split_href(href);
        let id = self.next_id;
        self.next_id += 1;
        self.entries.truncate(self.index + 1);
        self.entries.push(Location { id, path, query });
        self.index = self.entries.len() - 1;
        tracing::debug!("Navigated to {}", self.current());
        self.current()
    }

    /// Rewrite the current entry's query string in place.
    pub fn replace_query(&mut self, query: impl Into<String>) {
        let current = &mut self.entries[self.index];
        current.query = query.into();
        tracing::debug!("Address is now {}", current);
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.index += 1;
        true
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new("/")
    }
}
