use crate::domain::entities::{NewPost, Post};
use crate::presentation::dto::CreatePostFormView;
use crate::shared::{AppError, FieldErrors};
use crate::state::AppState;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const CREATE_UNAUTHORIZED_MESSAGE: &str = "You must be logged in to create a post";
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create post";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Post),
    /// 送信中の再送信
    Ignored,
    Unauthorized,
    Invalid(FieldErrors),
    Failed(AppError),
}

#[derive(Debug, Default)]
struct FormState {
    title: String,
    content: String,
    title_error: Option<String>,
    content_error: Option<String>,
    status: FormStatus,
}

/// 投稿作成フォーム
///
/// `idle -> submitting -> idle` を辿る。成功時は入力を空にし一覧の再取得を待つ。
/// 失敗時は入力を保持し、フィールドエラーはフィールドごとに先頭メッセージを表示する。
pub struct CreatePostForm {
    state: AppState,
    form: RwLock<FormState>,
}

impl CreatePostForm {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
            form: RwLock::new(FormState::default()),
        }
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        self.form.write().await.title = title.into();
    }

    pub async fn set_content(&self, content: impl Into<String>) {
        self.form.write().await.content = content.into();
    }

    pub async fn status(&self) -> FormStatus {
        self.form.read().await.status
    }

    pub async fn view(&self) -> CreatePostFormView {
        let form = self.form.read().await;
        CreatePostFormView {
            title: form.title.clone(),
            content: form.content.clone(),
            title_error: form.title_error.clone(),
            content_error: form.content_error.clone(),
            is_submitting: form.status == FormStatus::Submitting,
        }
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let input = {
            let mut form = self.form.write().await;
            if form.status == FormStatus::Submitting {
                return SubmitOutcome::Ignored;
            }
            form.status = FormStatus::Submitting;
            form.title_error = None;
            form.content_error = None;
            NewPost::new(form.title.clone(), form.content.clone())
        };

        let service = &self.state.post_service;
        match service.create_post(&input).await {
            Ok(post) => {
                {
                    let mut form = self.form.write().await;
                    form.title.clear();
                    form.content.clear();
                }
                if self.state.platform().has_soft_keyboard() {
                    self.state.keyboard.dismiss();
                }
                service.invalidate_all_and_wait().await;
                self.finish().await;
                info!(post_id = %post.id, "create form submitted");
                SubmitOutcome::Created(post)
            }
            Err(err) if err.is_unauthorized() => {
                self.finish().await;
                self.state
                    .notifier
                    .alert("Error", CREATE_UNAUTHORIZED_MESSAGE)
                    .await;
                SubmitOutcome::Unauthorized
            }
            Err(err) => {
                if let Some(fields) = err.field_errors()
                    && (fields.first("title").is_some() || fields.first("content").is_some())
                {
                    let fields = fields.clone();
                    let mut form = self.form.write().await;
                    form.title_error = fields.first("title").map(str::to_string);
                    form.content_error = fields.first("content").map(str::to_string);
                    form.status = FormStatus::Idle;
                    return SubmitOutcome::Invalid(fields);
                }

                self.finish().await;
                warn!(error = %err, "failed to create post");
                self.state.notifier.notice(CREATE_FAILED_MESSAGE);
                SubmitOutcome::Failed(err)
            }
        }
    }

    async fn finish(&self) {
        self.form.write().await.status = FormStatus::Idle;
    }
}
