use validator::ValidateEmail;

#[derive(Clone, Debug, PartialEq, Eq)]
/// A syntactically valid email address. Used for subscribers, contact form
/// senders, and the addresses handed to the email client.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    /// Surrounding whitespace is dropped before validation; case is kept as
    /// submitted.
    pub fn parse(email: String) -> Result<Self, String> {
        let email = email.trim().to_string();
        ValidateEmail::validate_email(&email)
            .then(|| Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }

    /// Lowercased form, used whenever two addresses are compared
    pub fn normalized(&self) -> String { self.0.to_lowercase() }

    /// Everything after the `@`, lowercased
    pub fn domain(&self) -> String {
        self.0
            .rsplit_once('@')
            .map(|(_, domain)| domain.to_lowercase())
            .unwrap_or_default()
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
