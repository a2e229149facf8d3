use actix_web::http::header::USER_AGENT;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;

use super::error_chain_fmt;
use super::json_error;
use super::json_message;
use crate::configuration::NewsletterSettings;
use crate::domain::RequestMetadata;
use crate::domain::SubscriberEmail;
use crate::domain::SubscriberRecord;
use crate::domain::SubscriptionToken;
use crate::email_client::EmailClient;
use crate::startup::AppBaseUrl;
use crate::store::StoreError;
use crate::store::SubscriberStore;
use crate::store::Update;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    email: Option<String>,
}

impl TryFrom<SubscribeRequest> for SubscriberEmail {
    type Error = String;
    fn try_from(value: SubscribeRequest) -> Result<Self, Self::Error> {
        match value.email {
            Some(email) if !email.trim().is_empty() => SubscriberEmail::parse(email),
            _ => Err("Email is required".to_string()),
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::ValidationError(msg) => json_error(self.status_code(), msg),
            // the cause chain goes to the logs, not to the visitor
            Self::UnexpectedError(_) => json_error(
                self.status_code(),
                "Something went wrong. Please try again later.",
            ),
        }
    }
}

/// What intake did with the submitted address
enum Intake {
    /// A pending record now holds this token; it still has to be mailed out
    Pending(SubscriptionToken),
    /// Only possible with deduplication enabled
    AlreadyConfirmed,
}

/// `POST /api/subscribe`
///
/// Appends a pending record for the submitted email, then mails the
/// confirmation link. Responds with JSON either way.
///
/// # Request example
///
/// ```sh
///     curl --json '{"email": "john@foo.com"}' http://127.0.0.1:8000/api/subscribe
/// ```
///
/// Unless `newsletter.deduplicate_emails` is set, the store is not checked for
/// the address first: subscribing twice leaves two pending records behind.
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(body, request, store, email_client, base_url, newsletter),
    fields(subscriber_email = tracing::field::Empty)
)]
pub async fn subscribe(
    body: web::Json<SubscribeRequest>,
    request: HttpRequest,
    store: web::Data<SubscriberStore>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<AppBaseUrl>,
    newsletter: web::Data<NewsletterSettings>,
) -> Result<HttpResponse, SubscribeError> {
    let email: SubscriberEmail = body.0.try_into().map_err(SubscribeError::ValidationError)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&email));

    let intake = register_subscriber(
        &store,
        &email,
        request_metadata(&request),
        newsletter.deduplicate_emails,
    )
    .await
    .context("Failed to store the new subscriber")?;

    let token = match intake {
        Intake::Pending(token) => token,
        Intake::AlreadyConfirmed => {
            tracing::info!("subscriber is already confirmed, not sending anything");
            return Ok(json_message(StatusCode::OK, "You are already subscribed."));
        }
    };

    send_confirmation_email(&email_client, &email, &base_url.0, &token)
        .await
        .context("Failed to send a confirmation email")?;

    Ok(json_message(
        StatusCode::OK,
        "Please check your email to confirm your subscription.",
    ))
}

/// Client address (honouring `Forwarded`/`X-Forwarded-For`) and user agent
fn request_metadata(request: &HttpRequest) -> RequestMetadata {
    RequestMetadata {
        ip_address: request
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
        user_agent: request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

/// Store logic only; independent of the web framework.
///
/// With `deduplicate` set, an existing record for the same (normalized) email
/// is reused: a confirmed one short-circuits, a pending one gets a fresh
/// token. Otherwise the new record is appended unconditionally.
#[tracing::instrument(name = "Saving new subscriber in the store", skip(store, email, metadata))]
async fn register_subscriber(
    store: &SubscriberStore,
    email: &SubscriberEmail,
    metadata: RequestMetadata,
    deduplicate: bool,
) -> Result<Intake, StoreError> {
    let token = SubscriptionToken::generate();
    let now = Utc::now();

    store
        .update(|records| {
            if deduplicate {
                if let Some(existing) = records.iter_mut().find(|r| r.same_email(email)) {
                    if existing.confirmed {
                        return Update::Unchanged(Intake::AlreadyConfirmed);
                    }
                    tracing::info!("reissuing token for pending subscriber");
                    existing.reissue_token(&token);
                    return Update::Changed(Intake::Pending(token));
                }
            }
            records.push(SubscriberRecord::pending(email, &token, metadata, now));
            Update::Changed(Intake::Pending(token))
        })
        .await
}

#[tracing::instrument(
    name = "Sending confirmation email to new subscriber",
    skip(email_client, email, base_url, token)
)]
async fn send_confirmation_email(
    email_client: &EmailClient,
    email: &SubscriberEmail,
    base_url: &str,
    token: &SubscriptionToken,
) -> Result<(), reqwest::Error> {
    let confirm_link = format!(
        "{}/api/confirm?token={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(token.as_ref())
    );
    let html_body = format!(
        "Thanks for subscribing to FootballDecoded!<br />\
        Click <a href=\"{confirm_link}\">here</a> to confirm your subscription."
    );
    let text_body = format!(
        "Thanks for subscribing to FootballDecoded!\nVisit {confirm_link} to confirm your subscription."
    );
    email_client
        .send_email(
            email,
            "Confirm your FootballDecoded subscription",
            &html_body,
            &text_body,
        )
        .await
}
