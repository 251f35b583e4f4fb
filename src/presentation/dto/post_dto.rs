use crate::domain::entities::Post;
use serde::{Deserialize, Serialize};

/// アバター画像の参照先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "uri", rename_all = "snake_case")]
pub enum AvatarSource {
    Remote(String),
    /// 画像 URL が無いときの空の枠
    Placeholder,
}

impl AvatarSource {
    pub fn uri(&self) -> &str {
        match self {
            AvatarSource::Remote(uri) => uri,
            AvatarSource::Placeholder => "",
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, AvatarSource::Placeholder)
    }
}

// 一覧の 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCardView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_name: Option<String>,
    pub avatar: AvatarSource,
    pub href: String,
}

impl From<&Post> for PostCardView {
    fn from(post: &Post) -> Self {
        let avatar = match post.author.avatar_url() {
            Some(url) => AvatarSource::Remote(url.to_string()),
            None => AvatarSource::Placeholder,
        };
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            content: post.content.clone(),
            author_name: post.author.name.clone(),
            avatar,
            href: format!("/post/{}", post.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HomeScreenView {
    pub posts: Vec<PostCardView>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PostDetailView {
    Loading,
    NotFound,
    Found { post: PostCardView },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatePostFormView {
    pub title: String,
    pub content: String,
    pub title_error: Option<String>,
    pub content_error: Option<String>,
    pub is_submitting: bool,
}
