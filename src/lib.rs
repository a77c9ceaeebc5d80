//! # Plaza
//!
//! A terminal client for the plaza social network: home and explore feeds
//! with bookmarkable filters, comments, follows and profiles.
//!
//! ## Architecture
//!
//! ```text
//! Navigator → FeedController → PageSource (RequestCache) → Backend → REST API
//!                 │
//!                 └→ present() → TUI / CLI
//! ```
//!
//! The query string of the current location is the source of truth for a
//! feed's filters. Edits go to a draft; submitting commits the draft, writes
//! it back to the location and fetches. Results for anything but the latest
//! committed query are dropped.
//!
//! ## Quick Start
//!
//! ```bash
//! plaza login alice@example.com
//! plaza feed --explore --query "tags=art,music&sort=asc"
//! plaza tui --location "/explore?tags=art"
//! ```

/// Backend REST surface.
///
/// - [`Backend`](api::Backend): async trait over every endpoint
/// - [`HttpBackend`](api::HttpBackend): reqwest implementation
pub mod api;

/// Application context and error handling.
///
/// [`AppContext`](app::AppContext) wires the config, the session store, the
/// backend and the cached sources together.
pub mod app;

/// Login, signup and logout flows.
pub mod auth;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/plaza/config.toml`:
/// API endpoint, colors and keybindings.
pub mod config;

/// Posts, comments, users, profiles and the decoded session.
pub mod domain;

/// Feed query state: the controller, its presentation and the navigator
/// holding the address history.
pub mod feed;

/// Form validation.
pub mod forms;

/// Structured feed queries and their query-string codec.
pub mod query;

/// Bearer token storage.
pub mod session;

/// Cached readers over the backend.
///
/// - [`RequestCache`](source::RequestCache): content-addressed, shares in-flight requests
/// - [`FeedSource`](source::FeedSource): feed pages keyed by the whole query
pub mod source;

/// Terminal user interface built with ratatui.
///
/// Feed, profile and comments views. Keybindings: `/` search, `+`/`-` tags,
/// `o` sort, `s` apply, `L` load more, `R` refresh, `[`/`]` back and forward,
/// `q` quits.
pub mod tui;
