use crate::application::ports::PostApi;
use crate::domain::entities::{NewPost, Post, User};
use crate::shared::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// `post.all` が返す最大件数
pub const FEED_LIMIT: usize = 10;

/// 呼び出し回数のスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiCallCounts {
    pub all: usize,
    pub by_id: usize,
    pub create: usize,
    pub delete: usize,
}

#[derive(Default)]
struct CallCounters {
    all: AtomicUsize,
    by_id: AtomicUsize,
    create: AtomicUsize,
    delete: AtomicUsize,
}

/// プロセス内で完結する `PostApi`（オフライン実行・テスト用）
///
/// サーバーと同じ規則を適用する:
/// 作成・削除にはサインインが必要、削除は投稿者のみ、一覧は新しい順で最大 10 件。
#[derive(Default)]
pub struct InMemoryPostApi {
    // 先頭が最新
    posts: RwLock<Vec<Post>>,
    viewer: RwLock<Option<User>>,
    calls: CallCounters,
}

impl InMemoryPostApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            viewer: RwLock::new(Some(user)),
            ..Self::default()
        }
    }

    pub async fn sign_in(&self, user: User) {
        *self.viewer.write().await = Some(user);
    }

    pub async fn sign_out(&self) {
        *self.viewer.write().await = None;
    }

    /// 既存投稿の投入。渡した順を新しい順として扱う
    pub async fn seed(&self, posts: Vec<Post>) {
        let mut stored = self.posts.write().await;
        let mut posts = posts;
        posts.append(&mut stored);
        *stored = posts;
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn call_counts(&self) -> ApiCallCounts {
        ApiCallCounts {
            all: self.calls.all.load(Ordering::SeqCst),
            by_id: self.calls.by_id.load(Ordering::SeqCst),
            create: self.calls.create.load(Ordering::SeqCst),
            delete: self.calls.delete.load(Ordering::SeqCst),
        }
    }

    async fn require_viewer(&self) -> Result<User, AppError> {
        self.viewer
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::unauthorized("UNAUTHORIZED"))
    }
}

#[async_trait]
impl PostApi for InMemoryPostApi {
    async fn all(&self) -> Result<Vec<Post>, AppError> {
        self.calls.all.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.read().await;
        Ok(posts.iter().take(FEED_LIMIT).cloned().collect())
    }

    async fn by_id(&self, id: &str) -> Result<Option<Post>, AppError> {
        self.calls.by_id.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|post| post.id == id).cloned())
    }

    async fn create(&self, input: &NewPost) -> Result<Post, AppError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let author = self.require_viewer().await?;
        input.validate().map_err(AppError::validation)?;

        let post = Post::new(input.title.clone(), input.content.clone(), author);
        self.posts.write().await.insert(0, post.clone());
        debug!(post_id = %post.id, "in-memory post stored");
        Ok(post)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.calls.delete.fetch_add(1, Ordering::SeqCst);
        let viewer = self.require_viewer().await?;

        let mut posts = self.posts.write().await;
        let Some(index) = posts.iter().position(|post| post.id == id) else {
            return Ok(());
        };
        if !posts[index].is_authored_by(&viewer.id) {
            return Err(AppError::unauthorized(
                "Only the author is allowed to delete the post",
            ));
        }
        posts.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ErrorCode;

    #[tokio::test]
    async fn test_create_requires_sign_in() {
        let api = InMemoryPostApi::new();
        let err = api
            .create(&NewPost::new("Hello", "World"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert!(api.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_validates_fields() {
        let api = InMemoryPostApi::signed_in(User::new("alice"));
        let err = api.create(&NewPost::new("", "World")).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::BadRequest));
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.first("title"), Some("Title is required"));
        assert!(fields.first("content").is_none());
    }

    #[tokio::test]
    async fn test_all_is_newest_first_and_limited() {
        let api = InMemoryPostApi::signed_in(User::new("alice"));
        for i in 0..12 {
            api.create(&NewPost::new(format!("t{i}"), "c")).await.unwrap();
        }
        let posts = api.all().await.unwrap();
        assert_eq!(posts.len(), FEED_LIMIT);
        assert_eq!(posts[0].title, "t11");
        assert_eq!(api.len().await, 12);
        assert_eq!(api.call_counts().create, 12);
    }

    #[tokio::test]
    async fn test_delete_only_by_author() {
        let api = InMemoryPostApi::signed_in(User::new("alice"));
        let post = api.create(&NewPost::new("mine", "c")).await.unwrap();

        api.sign_in(User::new("bob")).await;
        let err = api.delete(&post.id).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(api.len().await, 1);

        api.sign_in(User::new("alice")).await;
        api.delete(&post.id).await.unwrap();
        assert!(api.by_id(&post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_keeps_given_order_before_existing() {
        let api = InMemoryPostApi::signed_in(User::new("alice"));
        api.create(&NewPost::new("old", "c")).await.unwrap();
        api.seed(vec![
            Post::new("a".into(), "c".into(), User::new("x")),
            Post::new("b".into(), "c".into(), User::new("x")),
        ])
        .await;

        let titles: Vec<String> = api
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|post| post.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "old"]);
    }
}
