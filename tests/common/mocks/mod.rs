use async_trait::async_trait;
use mockall::mock;
use postfeed_lib::application::ports::{KeyboardController, PostApi, UserNotifier};
use postfeed_lib::domain::entities::{NewPost, Post};
use postfeed_lib::infrastructure::api::InMemoryPostApi;
use postfeed_lib::shared::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

mock! {
    pub PostApiPort {}

    #[async_trait]
    impl PostApi for PostApiPort {
        async fn all(&self) -> Result<Vec<Post>, AppError>;
        async fn by_id(&self, id: &str) -> Result<Option<Post>, AppError>;
        async fn create(&self, input: &NewPost) -> Result<Post, AppError>;
        async fn delete(&self, id: &str) -> Result<(), AppError>;
    }
}

/// アラートと通知を記録する
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, String)>>,
    notices: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts().into_iter().map(|(_, message)| message).collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserNotifier for RecordingNotifier {
    async fn alert(&self, title: &str, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    fn notice(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingKeyboard {
    dismissed: AtomicUsize,
}

impl RecordingKeyboard {
    pub fn dismiss_count(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }
}

impl KeyboardController for RecordingKeyboard {
    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

/// `create` が `release` されるまで完了しない API
pub struct GatedPostApi {
    pub inner: Arc<InMemoryPostApi>,
    gate: Semaphore,
}

impl GatedPostApi {
    pub fn new(inner: Arc<InMemoryPostApi>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
        }
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl PostApi for GatedPostApi {
    async fn all(&self) -> Result<Vec<Post>, AppError> {
        self.inner.all().await
    }

    async fn by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.inner.by_id(id).await
    }

    async fn create(&self, input: &NewPost) -> Result<Post, AppError> {
        self.gate
            .acquire()
            .await
            .map_err(|err| AppError::Internal(err.to_string()))?
            .forget();
        self.inner.create(input).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete(id).await
    }
}
