pub mod post_api;
pub mod ui;

pub use post_api::PostApi;
pub use ui::{KeyboardController, NoopKeyboard, UserNotifier};
