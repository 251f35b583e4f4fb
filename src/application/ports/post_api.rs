use crate::domain::entities::{NewPost, Post};
use crate::shared::AppError;
use async_trait::async_trait;

/// 投稿 API（`post.*` プロシージャ）へのポート
///
/// 全ての呼び出しはネットワーク往復であり、自動リトライは行わない。
/// 失敗は `AppError::Rpc`（コード + フィールドエラー）またはネットワーク系エラー。
#[async_trait]
pub trait PostApi: Send + Sync {
    /// `post.all`: サーバーが決めた順序の投稿一覧
    async fn all(&self) -> Result<Vec<Post>, AppError>;

    /// `post.byId`
    async fn by_id(&self, id: &str) -> Result<Option<Post>, AppError>;

    /// `post.create`
    async fn create(&self, input: &NewPost) -> Result<Post, AppError>;

    /// `post.delete`（投稿者本人のみ）
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}
