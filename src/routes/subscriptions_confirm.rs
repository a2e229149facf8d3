use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::web::Query;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Deserialize;
use tera::Tera;

use super::error_chain_fmt;
use crate::domain::SubscriptionToken;
use crate::domain::TokenValidationError;
use crate::domain::Transition;
use crate::startup::AppBaseUrl;
use crate::store::StoreError;
use crate::store::SubscriberStore;
use crate::store::Update;

const TEMPLATE_NAME: &str = "confirmation.html";

/// The template is compiled into the binary; a broken template fails on first
/// use (and in the tests), not at startup.
static TEMPLATES: Lazy<Result<Tera, tera::Error>> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_template(
        TEMPLATE_NAME,
        include_str!("../../templates/confirmation.html"),
    )?;
    Ok(tera)
});

#[derive(Deserialize)]
pub struct Parameters {
    token: Option<String>,
}

/// Every page `GET /api/confirm` can answer with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPage {
    Confirmed,
    AlreadyConfirmed,
    InvalidToken,
    NotFound,
    ServerError,
}

impl ConfirmationPage {
    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Confirmed | Self::AlreadyConfirmed => StatusCode::OK,
            Self::InvalidToken => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// (title, heading, message, accent colour)
    fn copy(self) -> (&'static str, &'static str, &'static str, &'static str) {
        // tokens do not expire, so none of this copy may claim they do
        match self {
            Self::Confirmed => (
                "Subscription confirmed",
                "You're in!",
                "Your subscription is confirmed. New articles will land in your inbox.",
                "#22c55e",
            ),
            Self::AlreadyConfirmed => (
                "Already confirmed",
                "Already confirmed",
                "This subscription was already confirmed. There is nothing else to do.",
                "#38bdf8",
            ),
            Self::InvalidToken => (
                "Invalid link",
                "Invalid confirmation link",
                "This confirmation link is not valid. Please use the link from your email.",
                "#f59e0b",
            ),
            Self::NotFound => (
                "Unknown link",
                "We couldn't find that subscription",
                "This confirmation link does not match any subscription. Try subscribing again.",
                "#f59e0b",
            ),
            Self::ServerError => (
                "Something went wrong",
                "Something went wrong",
                "We couldn't confirm your subscription right now. Please try again later.",
                "#ef4444",
            ),
        }
    }

    /// The one place confirmation HTML is produced
    pub fn render(
        self,
        home_url: &str,
    ) -> HttpResponse {
        let (title, heading, message, accent) = self.copy();
        let mut context = tera::Context::new();
        context.insert("title", title);
        context.insert("heading", heading);
        context.insert("message", message);
        context.insert("accent", accent);
        context.insert("home_url", home_url);

        let rendered = match TEMPLATES.as_ref() {
            Ok(tera) => tera.render(TEMPLATE_NAME, &context),
            Err(e) => Err(tera::Error::msg(format!("{e:?}"))),
        };

        match rendered {
            Ok(html) => HttpResponse::build(self.status_code())
                .content_type(ContentType::html())
                .body(html),
            Err(e) => {
                tracing::error!(error.cause_chain = ?e, "failed to render confirmation page");
                HttpResponse::build(self.status_code())
                    .content_type(ContentType::plaintext())
                    .body(message)
            }
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error(transparent)]
    InvalidToken(#[from] TokenValidationError),
    #[error("No subscriber holds this token")]
    UnknownToken,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ConfirmError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ConfirmError {
    fn page(&self) -> ConfirmationPage {
        match self {
            Self::InvalidToken(_) => ConfirmationPage::InvalidToken,
            Self::UnknownToken => ConfirmationPage::NotFound,
            Self::UnexpectedError(_) => ConfirmationPage::ServerError,
        }
    }
}

impl ResponseError for ConfirmError {
    fn status_code(&self) -> StatusCode { self.page().status_code() }

    // error pages link home via a relative url, since `AppBaseUrl` is not
    // reachable from here
    fn error_response(&self) -> HttpResponse { self.page().render("/") }
}

/// `GET /api/confirm?token=...`
///
/// Looks the token up with a linear scan and flips the matching record to
/// confirmed, clearing its token. Presenting the same token again is answered
/// with "already confirmed" and changes nothing.
///
/// Status codes: 400 missing/blank/over-long token, 404 unknown token, 200
/// confirmed/already confirmed, 500 store failure. The body is always HTML.
#[tracing::instrument(name = "Confirming new subscriber", skip(params, store, base_url))]
pub async fn confirm(
    params: Query<Parameters>,
    store: web::Data<SubscriberStore>,
    base_url: web::Data<AppBaseUrl>,
) -> Result<HttpResponse, ConfirmError> {
    let token = SubscriptionToken::parse(params.0.token.as_deref().unwrap_or_default())?;

    let transition = confirm_subscriber(&store, &token)
        .await
        .context("Failed to confirm subscriber")?
        .ok_or(ConfirmError::UnknownToken)?;

    let page = match transition {
        Transition::Confirmed => ConfirmationPage::Confirmed,
        Transition::AlreadyConfirmed => ConfirmationPage::AlreadyConfirmed,
    };
    Ok(page.render(&base_url.0))
}

/// `None` if no record holds `token`. The scan and the state change happen
/// under a single store lock.
#[tracing::instrument(name = "Changing status of subscriber", skip(store, token))]
async fn confirm_subscriber(
    store: &SubscriberStore,
    token: &SubscriptionToken,
) -> Result<Option<Transition>, StoreError> {
    let now = Utc::now();
    store
        .update(|records| match records.iter_mut().find(|r| r.matches_token(token)) {
            None => Update::Unchanged(None),
            Some(record) => match record.confirm(now) {
                t @ Transition::Confirmed => Update::Changed(Some(t)),
                t @ Transition::AlreadyConfirmed => Update::Unchanged(Some(t)),
            },
        })
        .await
}
