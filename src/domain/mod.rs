pub mod post;
pub mod session;
pub mod user;

pub use post::{Comment, NewPost, Post};
pub use session::Session;
pub use user::{FollowState, Profile, User};
