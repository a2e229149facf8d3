use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use htmlescape::encode_minimal;
use serde::Deserialize;

use super::error_chain_fmt;
use super::json_error;
use super::json_message;
use crate::domain::ContactMessage;
use crate::domain::DomainPolicy;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;

#[derive(Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    message: String,
}

impl TryFrom<ContactForm> for ContactMessage {
    type Error = String;
    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        ContactMessage::parse(form.name, form.email, form.subject, form.message)
    }
}

/// Where contact form messages end up
pub struct ContactRecipient(pub SubscriberEmail);

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("{0}")]
    ValidationError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for ContactError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
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
                "Your message could not be sent. Please try again later.",
            ),
        }
    }
}

/// `POST /api/contact`
///
/// Validates the form (including the sender's domain against the configured
/// allow/deny lists) and forwards it to the site owner through the email API.
/// Nothing is stored.
#[tracing::instrument(
    name = "Forwarding contact message",
    skip(form, email_client, recipient, policy),
    fields(sender_email = %form.email)
)]
pub async fn contact(
    form: web::Json<ContactForm>,
    email_client: web::Data<EmailClient>,
    recipient: web::Data<ContactRecipient>,
    policy: web::Data<DomainPolicy>,
) -> Result<HttpResponse, ContactError> {
    let msg: ContactMessage = form.0.try_into().map_err(ContactError::ValidationError)?;
    policy
        .check(&msg.email)
        .map_err(ContactError::ValidationError)?;

    let subject = match &msg.subject {
        Some(subject) => format!("[Contact] {subject}"),
        None => format!("[Contact] Message from {}", msg.name.as_ref()),
    };
    let text_body = format!(
        "From: {} <{}>\n\n{}",
        msg.name.as_ref(),
        msg.email,
        msg.message
    );
    let html_body = format!(
        "<p>From: {} &lt;{}&gt;</p><p>{}</p>",
        encode_minimal(msg.name.as_ref()),
        encode_minimal(msg.email.as_ref()),
        encode_minimal(&msg.message).replace('\n', "<br />")
    );

    email_client
        .send_email(&recipient.0, &subject, &html_body, &text_body)
        .await
        .context("Failed to forward contact message")?;

    Ok(json_message(
        StatusCode::OK,
        "Thanks for reaching out! I'll get back to you soon.",
    ))
}

