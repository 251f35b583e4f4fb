pub mod post_service;

pub use post_service::{POST_ALL, POST_BY_ID, PostService};
