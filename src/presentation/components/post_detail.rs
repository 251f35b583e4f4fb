use crate::domain::entities::Post;
use crate::infrastructure::cache::QueryHandle;
use crate::presentation::dto::{PostCardView, PostDetailView};
use crate::shared::AppError;
use crate::state::AppState;

/// `/post/{id}` の詳細画面
pub struct PostDetailScreen {
    id: String,
    post: QueryHandle<Option<Post>>,
}

impl PostDetailScreen {
    pub async fn mount(state: &AppState, id: &str) -> Self {
        let post = state.post_service.watch_by_id(id).await;
        Self {
            id: id.to_string(),
            post,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn view(&self) -> PostDetailView {
        let current = self.post.current();
        match (current.data, current.error) {
            (Some(Some(post)), _) => PostDetailView::Found {
                post: PostCardView::from(&post),
            },
            (Some(None), _) => PostDetailView::NotFound,
            (None, Some(err)) => PostDetailView::Error {
                message: err.to_string(),
            },
            (None, None) => PostDetailView::Loading,
        }
    }

    pub async fn changed(&mut self) -> Result<(), AppError> {
        self.post.changed().await
    }

    pub async fn settled(&mut self) -> Result<PostDetailView, AppError> {
        self.post.settled().await?;
        Ok(self.view())
    }
}
