/// URL slug of a blog article, e.g. `xg-models-explained`. Used as the key
/// of an article's comment thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSlug(String);

impl ArticleSlug {
    pub fn parse(slug: String) -> Result<Self, String> {
        let valid_chars = slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        let ok = !slug.is_empty()
            && slug.len() <= 200
            && valid_chars
            && !slug.starts_with('-')
            && !slug.ends_with('-');
        match ok {
            true => Ok(Self(slug)),
            false => Err(format!("Invalid article slug: {slug:?}")),
        }
    }
}

impl AsRef<str> for ArticleSlug {
    fn as_ref(&self) -> &str { &self.0 }
}
