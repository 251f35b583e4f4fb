use crate::application::ports::PostApi;
use crate::domain::entities::{NewPost, Post};
use crate::infrastructure::cache::{Fetcher, QueryCache, QueryHandle, QueryKey, QueryState};
use crate::shared::AppError;
use futures::FutureExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const POST_ALL: &str = "post.all";
pub const POST_BY_ID: &str = "post.byId";

/// 投稿 API とクエリキャッシュを束ねるサービス
pub struct PostService {
    api: Arc<dyn PostApi>,
    list_cache: QueryCache<Vec<Post>>,
    detail_cache: QueryCache<Option<Post>>,
}

impl PostService {
    pub fn new(api: Arc<dyn PostApi>, stale_time: Duration) -> Self {
        Self {
            api,
            list_cache: QueryCache::new(stale_time),
            detail_cache: QueryCache::new(stale_time),
        }
    }

    pub fn all_key() -> QueryKey {
        QueryKey::new(POST_ALL)
    }

    pub fn by_id_key(id: &str) -> QueryKey {
        QueryKey::with_input(POST_BY_ID, json!({ "id": id }))
    }

    /// `post.all` を購読する
    pub async fn watch_all(&self) -> QueryHandle<Vec<Post>> {
        let api = Arc::clone(&self.api);
        let fetcher: Fetcher<Vec<Post>> = Arc::new(move || {
            let api = Arc::clone(&api);
            async move { api.all().await }.boxed()
        });
        self.list_cache.query(Self::all_key(), fetcher).await
    }

    /// `post.byId` を購読する
    pub async fn watch_by_id(&self, id: &str) -> QueryHandle<Option<Post>> {
        let api = Arc::clone(&self.api);
        let post_id = id.to_string();
        let fetcher: Fetcher<Option<Post>> = Arc::new(move || {
            let api = Arc::clone(&api);
            let post_id = post_id.clone();
            async move { api.by_id(&post_id).await }.boxed()
        });
        self.detail_cache.query(Self::by_id_key(id), fetcher).await
    }

    /// キャッシュには触れない。無効化は呼び出し側が決める
    pub async fn create_post(&self, input: &NewPost) -> Result<Post, AppError> {
        match self.api.create(input).await {
            Ok(post) => {
                info!(post_id = %post.id, "post created");
                Ok(post)
            }
            Err(err) => {
                debug!(error = %err, "post.create rejected");
                Err(err)
            }
        }
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), AppError> {
        match self.api.delete(id).await {
            Ok(()) => {
                info!(post_id = %id, "post deleted");
                Ok(())
            }
            Err(err) => {
                debug!(post_id = %id, error = %err, "post.delete rejected");
                Err(err)
            }
        }
    }

    /// `post.all` の再取得を予約する。購読者がいなければ `false`
    pub async fn invalidate_all(&self) -> bool {
        self.list_cache.invalidate(&Self::all_key()).await
    }

    pub async fn invalidate_all_and_wait(&self) -> Option<QueryState<Vec<Post>>> {
        let state = self.list_cache.invalidate_and_wait(&Self::all_key()).await;
        if let Some(err) = state.as_ref().and_then(|state| state.error.as_ref()) {
            warn!(error = %err, "post.all refetch failed after invalidation");
        }
        state
    }

    pub async fn invalidate_detail(&self, id: &str) -> bool {
        self.detail_cache.invalidate(&Self::by_id_key(id)).await
    }

    /// 削除済み投稿の詳細エントリを破棄する。再取得はしない
    pub async fn forget_detail(&self, id: &str) -> bool {
        self.detail_cache.remove(&Self::by_id_key(id)).await
    }

    pub async fn invalidate_all_details(&self) -> usize {
        self.detail_cache.invalidate_path(POST_BY_ID).await
    }

    pub async fn cached_all(&self) -> Option<QueryState<Vec<Post>>> {
        self.list_cache.current_value(&Self::all_key()).await
    }

    pub async fn cached_detail(&self, id: &str) -> Option<QueryState<Option<Post>>> {
        self.detail_cache.current_value(&Self::by_id_key(id)).await
    }

    /// サインアウト時などにキャッシュを破棄する
    pub async fn clear_cache(&self) {
        self.list_cache.clear().await;
        self.detail_cache.clear().await;
    }
}
