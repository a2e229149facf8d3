mod comments;
mod contact;
mod health_check;
mod subscriptions;
mod subscriptions_confirm;

pub use comments::*;
pub use contact::*;
pub use health_check::*;
pub use subscriptions::*;
pub use subscriptions_confirm::*;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;

/// Print an error followed by every `source` in its chain. Used as the `Debug`
/// impl of our error types, so that `{:?}` in logs shows the root cause.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Body of every JSON API response: exactly one of the two keys is set
#[derive(Serialize)]
pub struct ApiMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn json_message(
    status: StatusCode,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiMessage {
        message: Some(message.to_string()),
        error: None,
    })
}

pub fn json_error(
    status: StatusCode,
    error: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ApiMessage {
        message: None,
        error: Some(error.to_string()),
    })
}
