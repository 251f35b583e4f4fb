pub mod create_post;
pub mod home_screen;
pub mod post_card;
pub mod post_detail;

pub use create_post::{CreatePostForm, FormStatus, SubmitOutcome};
pub use home_screen::HomeScreen;
pub use post_card::{DeleteOutcome, PostCard};
pub use post_detail::PostDetailScreen;
