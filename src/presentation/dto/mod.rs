pub mod post_dto;

pub use post_dto::{AvatarSource, CreatePostFormView, HomeScreenView, PostCardView, PostDetailView};
