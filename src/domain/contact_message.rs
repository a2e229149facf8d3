use unicode_segmentation::UnicodeSegmentation;

use super::AuthorName;
use super::SubscriberEmail;

const MAX_SUBJECT_GRAPHEMES: usize = 200;
const MAX_MESSAGE_GRAPHEMES: usize = 5000;

/// A validated contact form submission. Never persisted; only forwarded by
/// email.
#[derive(Debug)]
pub struct ContactMessage {
    pub name: AuthorName,
    pub email: SubscriberEmail,
    pub subject: Option<String>,
    pub message: String,
}

impl ContactMessage {
    pub fn parse(
        name: String,
        email: String,
        subject: Option<String>,
        message: String,
    ) -> Result<Self, String> {
        let name = AuthorName::parse(name)?;
        let email = SubscriberEmail::parse(email)?;

        let subject = subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(s) = &subject {
            if s.graphemes(true).count() > MAX_SUBJECT_GRAPHEMES {
                return Err(format!(
                    "Subject cannot be longer than {MAX_SUBJECT_GRAPHEMES} characters"
                ));
            }
        }

        let message = message.trim().to_string();
        if message.is_empty() {
            return Err("Message cannot be empty".to_string());
        }
        if message.graphemes(true).count() > MAX_MESSAGE_GRAPHEMES {
            return Err(format!(
                "Message cannot be longer than {MAX_MESSAGE_GRAPHEMES} characters"
            ));
        }

        Ok(Self {
            name,
            email,
            subject,
            message,
        })
    }
}

/// Which sender domains may use the contact form.
///
/// A blocked domain is always rejected. If `allowed` is non-empty, only the
/// listed domains get through. Entries match the domain itself and any of its
/// subdomains, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DomainPolicy {
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl DomainPolicy {
    pub fn new(
        allowed: Vec<String>,
        blocked: Vec<String>,
    ) -> Self {
        let clean = |v: Vec<String>| -> Vec<String> {
            v.into_iter()
                .map(|d| d.trim().trim_start_matches('@').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect()
        };
        Self {
            allowed: clean(allowed),
            blocked: clean(blocked),
        }
    }

    pub fn check(
        &self,
        email: &SubscriberEmail,
    ) -> Result<(), String> {
        let domain = email.domain();
        if self.blocked.iter().any(|d| covers(d, &domain)) {
            return Err(format!("Emails from {domain} are not accepted"));
        }
        if !self.allowed.is_empty() && !self.allowed.iter().any(|d| covers(d, &domain)) {
            return Err(format!("Emails from {domain} are not accepted"));
        }
        Ok(())
    }
}

fn covers(
    entry: &str,
    domain: &str,
) -> bool {
    domain == entry
        || domain
            .strip_suffix(entry)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
