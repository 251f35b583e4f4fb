use crate::common::mocks::{RecordingKeyboard, RecordingNotifier};
use postfeed_lib::application::ports::PostApi;
use postfeed_lib::domain::entities::{Post, User};
use postfeed_lib::infrastructure::api::InMemoryPostApi;
use postfeed_lib::presentation::components::HomeScreen;
use postfeed_lib::shared::{AppConfig, Platform};
use postfeed_lib::AppState;
use std::sync::Arc;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

pub fn test_config(platform: Platform) -> AppConfig {
    let mut config = AppConfig::default();
    config.platform = platform;
    config
}

pub fn alice() -> User {
    User::new(ALICE).with_name("Alice")
}

pub fn bob() -> User {
    User::new(BOB)
        .with_name("Bob")
        .with_image("https://images.example.com/bob.png")
}

pub fn post_by(author: User, title: &str) -> Post {
    Post::new(title.to_string(), format!("{title} body"), author)
}

pub struct Harness {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub keyboard: Arc<RecordingKeyboard>,
}

pub fn harness_with_api(api: Arc<dyn PostApi>, platform: Platform) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let keyboard = Arc::new(RecordingKeyboard::default());
    let state = AppState::new(
        test_config(platform),
        api,
        notifier.clone(),
        keyboard.clone(),
    );
    Harness {
        state,
        notifier,
        keyboard,
    }
}

/// alice でサインイン済みのインメモリ API を使う
pub fn signed_in_harness(platform: Platform) -> (Harness, Arc<InMemoryPostApi>) {
    let api = Arc::new(InMemoryPostApi::signed_in(alice()));
    let harness = harness_with_api(api.clone(), platform);
    (harness, api)
}

/// 指定回数の取得が完了するまで待つ
pub async fn wait_for_revision(screen: &mut HomeScreen, revision: u64) {
    let wait = async {
        while screen.revision() < revision {
            screen.changed().await.unwrap();
        }
    };
    tokio::time::timeout(std::time::Duration::from_secs(5), wait)
        .await
        .expect("home screen did not refetch in time");
}
