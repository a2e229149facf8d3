use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;

use super::error_chain_fmt;
use super::json_error;
use crate::domain::ArticleSlug;
use crate::domain::AuthorName;
use crate::domain::Comment;
use crate::domain::CommentBody;
use crate::domain::NewComment;
use crate::store::CommentStore;
use crate::store::Update;

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    author: String,
    #[serde(default)]
    content: String,
}

#[derive(thiserror::Error)]
pub enum CommentError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for CommentError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CommentError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::ValidationError(msg) => json_error(self.status_code(), msg),
            Self::UnexpectedError(_) => json_error(
                self.status_code(),
                "Something went wrong. Please try again later.",
            ),
        }
    }
}

/// `GET /api/comments/{slug}`: the article's comments, oldest first
#[tracing::instrument(name = "Listing comments", skip(store))]
pub async fn list_comments(
    slug: web::Path<String>,
    store: web::Data<CommentStore>,
) -> Result<HttpResponse, CommentError> {
    let article = ArticleSlug::parse(slug.into_inner()).map_err(CommentError::ValidationError)?;

    let mut comments: Vec<Comment> = store
        .load()
        .await
        .context("Failed to load comments")?
        .into_iter()
        .filter(|c| c.belongs_to(&article))
        .collect();
    comments.sort_by_key(|c| c.created_at);

    Ok(HttpResponse::Ok().json(comments))
}

/// `POST /api/comments/{slug}`: 201 with the stored comment
#[tracing::instrument(name = "Adding comment", skip(form, store))]
pub async fn post_comment(
    slug: web::Path<String>,
    form: web::Json<CommentForm>,
    store: web::Data<CommentStore>,
) -> Result<HttpResponse, CommentError> {
    let new_comment = parse_comment(slug.into_inner(), form.into_inner())
        .map_err(CommentError::ValidationError)?;
    let comment = Comment::new(new_comment, Utc::now());

    store
        .update(|comments| {
            comments.push(comment.clone());
            Update::Changed(())
        })
        .await
        .context("Failed to store comment")?;

    Ok(HttpResponse::Created().json(comment))
}

fn parse_comment(
    slug: String,
    form: CommentForm,
) -> Result<NewComment, String> {
    Ok(NewComment {
        article: ArticleSlug::parse(slug)?,
        author: AuthorName::parse(form.author)?,
        content: CommentBody::parse(form.content)?,
    })
}
