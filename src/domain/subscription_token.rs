use rand::distributions::Alphanumeric;
use rand::thread_rng;
use rand::Rng;

const TOKEN_LENGTH: usize = 25;
const MAX_TOKEN_LENGTH: usize = 256;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("Confirmation token is missing")]
    Empty,
    #[error("Confirmation token is too long")]
    TooLong,
}

/// Opaque, single-use confirmation token issued at intake.
///
/// Tokens handed out by `generate` are always 25 alphanumeric characters, but
/// `parse` only rejects what can never be a token. The store is edited by
/// hand, so any other string is looked up as-is and simply may not match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionToken(String);

impl SubscriptionToken {
    pub fn generate() -> Self {
        let mut rng = thread_rng();
        let token = std::iter::repeat_with(|| rng.sample(Alphanumeric))
            .map(char::from)
            .take(TOKEN_LENGTH)
            .collect();
        Self(token)
    }

    pub fn parse(token: &str) -> Result<Self, TokenValidationError> {
        let token = token.trim();
        if token.is_empty() {
            Err(TokenValidationError::Empty)
        } else if token.len() > MAX_TOKEN_LENGTH {
            Err(TokenValidationError::TooLong)
        } else {
            Ok(Self(token.to_string()))
        }
    }
}

impl AsRef<str> for SubscriptionToken {
    fn as_ref(&self) -> &str { &self.0 }
}
