use super::post_card::PostCard;
use crate::domain::entities::Post;
use crate::infrastructure::cache::QueryHandle;
use crate::presentation::dto::{HomeScreenView, PostCardView};
use crate::shared::AppError;
use crate::state::AppState;
use tracing::debug;

/// 投稿一覧画面
pub struct HomeScreen {
    state: AppState,
    posts: QueryHandle<Vec<Post>>,
}

impl HomeScreen {
    /// マウント時に `post.all` を購読する
    pub async fn mount(state: &AppState) -> Self {
        let posts = state.post_service.watch_all().await;
        Self {
            state: state.clone(),
            posts,
        }
    }

    pub fn view(&self) -> HomeScreenView {
        let current = self.posts.current();
        HomeScreenView {
            // サーバーの順序のまま
            posts: current
                .data
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(PostCardView::from)
                .collect(),
            is_loading: current.is_loading(),
            is_refreshing: current.is_fetching && current.data.is_some(),
            error: current.error.as_ref().map(ToString::to_string),
        }
    }

    pub fn cards(&self) -> Vec<PostCard> {
        self.posts
            .data()
            .unwrap_or_default()
            .into_iter()
            .map(|post| PostCard::new(post, &self.state))
            .collect()
    }

    pub fn card(&self, id: &str) -> Option<PostCard> {
        self.posts
            .data()
            .unwrap_or_default()
            .into_iter()
            .find(|post| post.id == id)
            .map(|post| PostCard::new(post, &self.state))
    }

    /// 再取得を予約するだけで完了は待たない
    pub async fn refresh(&self) -> bool {
        debug!("home screen refresh requested");
        self.state.post_service.invalidate_all().await
    }

    /// 表示状態が変わるまで待つ
    pub async fn changed(&mut self) -> Result<(), AppError> {
        self.posts.changed().await
    }

    /// 進行中の取得が終わった時点の表示
    pub async fn settled(&mut self) -> Result<HomeScreenView, AppError> {
        self.posts.settled().await?;
        Ok(self.view())
    }

    pub fn revision(&self) -> u64 {
        self.posts.current().revision
    }
}
