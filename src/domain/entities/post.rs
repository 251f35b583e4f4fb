use super::user::User;
use crate::shared::FieldErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 256;
pub const CONTENT_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: User,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(title: String, content: String, author: User) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            content,
            author,
            created_at: Some(Utc::now()),
        }
    }

    pub fn new_with_id(
        id: String,
        title: String,
        content: String,
        author: User,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            content,
            author,
            created_at: Some(created_at),
        }
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author.id == user_id
    }
}

/// `post.create` の入力
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// サーバー側と同じ規則で検証し、フィールド単位のエラーを返す
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.title.trim().is_empty() {
            errors.push("title", "Title is required");
        } else if self.title.chars().count() > TITLE_MAX_LEN {
            errors.push(
                "title",
                format!("Title must be at most {TITLE_MAX_LEN} characters"),
            );
        }

        if self.content.trim().is_empty() {
            errors.push("content", "Content is required");
        } else if self.content.chars().count() > CONTENT_MAX_LEN {
            errors.push(
                "content",
                format!("Content must be at most {CONTENT_MAX_LEN} characters"),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
