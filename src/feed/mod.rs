pub mod controller;
pub mod location;
pub mod presentation;

pub use controller::{FeedController, FetchStatus};
pub use location::{Location, Navigator, Route};
pub use presentation::{present, FeedBody, FeedView};
