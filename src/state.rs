use crate::application::ports::{KeyboardController, NoopKeyboard, PostApi, UserNotifier};
use crate::application::services::PostService;
use crate::infrastructure::api::HttpPostApi;
use crate::shared::{AppConfig, AppError, Platform};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// セッション単位のクライアント状態。各コンポーネントへ参照で渡す
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub post_service: Arc<PostService>,
    pub notifier: Arc<dyn UserNotifier>,
    pub keyboard: Arc<dyn KeyboardController>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        api: Arc<dyn PostApi>,
        notifier: Arc<dyn UserNotifier>,
        keyboard: Arc<dyn KeyboardController>,
    ) -> Self {
        let stale_time = Duration::from_millis(config.cache.stale_time_ms);
        Self {
            post_service: Arc::new(PostService::new(api, stale_time)),
            config,
            notifier,
            keyboard,
        }
    }

    /// 設定から HTTP クライアントを組み立てる
    pub fn from_config(
        config: AppConfig,
        notifier: Arc<dyn UserNotifier>,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;
        let api = HttpPostApi::new(&config.api, config.platform)?;
        info!(
            api = %api.base_url(),
            platform = %config.platform,
            "client state initialized"
        );
        Ok(Self::new(config, Arc::new(api), notifier, Arc::new(NoopKeyboard)))
    }

    pub fn with_keyboard(mut self, keyboard: Arc<dyn KeyboardController>) -> Self {
        self.keyboard = keyboard;
        self
    }

    pub fn platform(&self) -> Platform {
        self.config.platform
    }
}
