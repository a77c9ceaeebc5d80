//! What the feed screen shows, derived purely from controller state.

use crate::app::ApiError;
use crate::feed::controller::FetchStatus;
use crate::query::FeedQuery;

/// Snapshot of the controller handed to the presentation layer.
#[derive(Debug)]
pub struct FeedView<'a, T> {
    pub committed: &'a FeedQuery,
    pub draft: &'a FeedQuery,
    pub status: FetchStatus,
    /// Accumulated items; may belong to an older query while pending.
    pub items: &'a [T],
    /// Whether `items` were fetched for the committed query or its earlier
    /// pages.
    pub current: bool,
    /// Size of the most recently applied page.
    pub page_len: usize,
    pub error: Option<&'a ApiError>,
}

#[derive(Debug, PartialEq)]
pub enum FeedBody<'a, T> {
    /// Placeholder rows for a first page that has nothing to show yet.
    Skeleton,
    Failed { message: String },
    Empty,
    Items {
        items: &'a [T],
        /// Placeholder rows appended while the next page loads.
        inline_skeleton: bool,
        load_more: bool,
    },
}

pub fn present<'a, T>(view: &FeedView<'a, T>) -> FeedBody<'a, T> {
    match view.status {
        FetchStatus::Idle => FeedBody::Skeleton,
        FetchStatus::Pending if view.committed.is_first_page() => {
            if view.items.is_empty() || !view.current {
                FeedBody::Skeleton
            } else {
                FeedBody::Items {
                    items: view.items,
                    inline_skeleton: true,
                    load_more: false,
                }
            }
        }
        // Past the first page the full skeleton never shows; rows rendered
        // for other filters are hidden.
        FetchStatus::Pending => FeedBody::Items {
            items: if view.current { view.items } else { &[] },
            inline_skeleton: true,
            load_more: false,
        },
        FetchStatus::Failed => FeedBody::Failed {
            message: view
                .error
                .map(ApiError::user_message)
                .unwrap_or_else(|| crate::app::error::GENERIC_FAILURE.to_string()),
        },
        FetchStatus::Ready if view.items.is_empty() => FeedBody::Empty,
        // A full page only suggests more data; the backend reports no total.
        FetchStatus::Ready => FeedBody::Items {
            items: view.items,
            inline_skeleton: false,
            load_more: view.page_len >= view.committed.limit as usize,
        },
    }
}
