use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

/// A human-supplied display name (comment authors, contact form senders).
///
/// Rejects empty/whitespace names, names longer than 256 graphemes, and a few
/// characters that are troublesome when echoed back into HTML or emails.
///
/// Must be instantiated with `AuthorName::parse`; the field is private so the
/// checks can't be bypassed.
#[derive(Debug, Clone)]
pub struct AuthorName(String);

impl AuthorName {
    pub fn parse(name: String) -> Result<Self, String> {
        let name = name.trim().to_string();
        let empty = name.is_empty();
        let too_long = name.graphemes(true).count() > 256;
        let bad_chars: HashSet<char> = r#"/()"<>\{}"#.chars().collect();
        let bad = name.chars().any(|c| bad_chars.contains(&c));
        match !empty && !too_long && !bad {
            true => Ok(Self(name)),
            false => Err(format!("Invalid name: {name:?}")),
        }
    }
}

impl AsRef<str> for AuthorName {
    fn as_ref(&self) -> &str { &self.0 }
}
