use crate::domain::entities::Post;
use crate::presentation::dto::PostCardView;
use crate::shared::AppError;
use crate::state::AppState;
use tracing::warn;

pub const DELETE_UNAUTHORIZED_MESSAGE: &str = "Only the author can delete their post";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete post";

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted,
    Unauthorized,
    Failed(AppError),
}

/// 一覧の 1 行と削除操作
pub struct PostCard {
    post: Post,
    state: AppState,
}

impl PostCard {
    pub fn new(post: Post, state: &AppState) -> Self {
        Self {
            post,
            state: state.clone(),
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn view(&self) -> PostCardView {
        PostCardView::from(&self.post)
    }

    /// 成否に関わらず `post.all` を無効化する。削除できた投稿の詳細は破棄する
    pub async fn delete(&self) -> DeleteOutcome {
        let service = &self.state.post_service;
        let result = service.delete_post(&self.post.id).await;

        service.invalidate_all().await;
        if result.is_ok() {
            service.forget_detail(&self.post.id).await;
        } else {
            service.invalidate_detail(&self.post.id).await;
        }

        match result {
            Ok(()) => DeleteOutcome::Deleted,
            Err(err) if err.is_unauthorized() => {
                self.state
                    .notifier
                    .alert("Error", DELETE_UNAUTHORIZED_MESSAGE)
                    .await;
                DeleteOutcome::Unauthorized
            }
            Err(err) => {
                warn!(post_id = %self.post.id, error = %err, "failed to delete post");
                self.state.notifier.notice(DELETE_FAILED_MESSAGE);
                DeleteOutcome::Failed(err)
            }
        }
    }
}
