use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use super::ArticleSlug;
use super::AuthorName;

const MAX_COMMENT_GRAPHEMES: usize = 2000;

#[derive(Debug, Clone)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn parse(content: String) -> Result<Self, String> {
        let content = content.trim().to_string();
        if content.is_empty() {
            return Err("Comment cannot be empty".to_string());
        }
        if content.graphemes(true).count() > MAX_COMMENT_GRAPHEMES {
            return Err(format!(
                "Comment cannot be longer than {MAX_COMMENT_GRAPHEMES} characters"
            ));
        }
        Ok(Self(content))
    }
}

impl AsRef<str> for CommentBody {
    fn as_ref(&self) -> &str { &self.0 }
}

pub struct NewComment {
    pub article: ArticleSlug,
    pub author: AuthorName,
    pub content: CommentBody,
}

/// A stored comment, as kept in the comment store and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub article: String,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        new_comment: NewComment,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            article: new_comment.article.as_ref().to_string(),
            author: new_comment.author.as_ref().to_string(),
            content: new_comment.content.as_ref().to_string(),
            created_at: now,
        }
    }

    pub fn belongs_to(
        &self,
        article: &ArticleSlug,
    ) -> bool {
        self.article == article.as_ref()
    }
}
