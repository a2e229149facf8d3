use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::SubscriberEmail;
use super::SubscriptionToken;

/// Where an intake request came from. Both fields are best-effort.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One entry of the subscriber store, as it is laid out on disk.
///
/// Fields are plain strings rather than parsed domain types, since the file is
/// human-editable and a record that no longer parses should still be exported
/// and rewritten as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRecord {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// The token this record was confirmed with. Only kept so that a repeated
    /// confirmation can be told apart from an unknown token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_token: Option<String>,
}

/// Result of applying a confirmation to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Confirmed,
    AlreadyConfirmed,
}

impl SubscriberRecord {
    pub fn pending(
        email: &SubscriberEmail,
        token: &SubscriptionToken,
        metadata: RequestMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.as_ref().to_string(),
            subscribed_at: now,
            confirmed: false,
            confirmation_token: Some(token.as_ref().to_string()),
            confirmed_at: None,
            ip_address: metadata.ip_address,
            user_agent: metadata.user_agent,
            redeemed_token: None,
        }
    }

    /// True if `token` is either the outstanding token or the one this record
    /// was confirmed with.
    pub fn matches_token(
        &self,
        token: &SubscriptionToken,
    ) -> bool {
        let token = Some(token.as_ref());
        self.confirmation_token.as_deref() == token || self.redeemed_token.as_deref() == token
    }

    /// `pending -> confirmed`. Confirmed is terminal: calling this again
    /// changes nothing.
    pub fn confirm(
        &mut self,
        now: DateTime<Utc>,
    ) -> Transition {
        if self.confirmed {
            return Transition::AlreadyConfirmed;
        }
        self.confirmed = true;
        self.confirmed_at = Some(now);
        self.redeemed_token = self.confirmation_token.take();
        Transition::Confirmed
    }

    /// Issue a new token to a pending record, invalidating the previous one.
    /// `subscribed_at` keeps the original intake time.
    pub fn reissue_token(
        &mut self,
        token: &SubscriptionToken,
    ) {
        self.confirmation_token = Some(token.as_ref().to_string());
    }

    pub fn same_email(
        &self,
        email: &SubscriberEmail,
    ) -> bool {
        self.email.trim().to_lowercase() == email.normalized()
    }
}
