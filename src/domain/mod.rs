mod article_slug;
mod author_name;
mod comment;
mod contact_message;
mod subscriber_email;
mod subscriber_record;
mod subscription_token;
// allow external `use` statements to skip `subscriber_email` etc
pub use article_slug::ArticleSlug;
pub use author_name::AuthorName;
pub use comment::Comment;
pub use comment::CommentBody;
pub use comment::NewComment;
pub use contact_message::ContactMessage;
pub use contact_message::DomainPolicy;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_record::RequestMetadata;
pub use subscriber_record::SubscriberRecord;
pub use subscriber_record::Transition;
pub use subscription_token::SubscriptionToken;
pub use subscription_token::TokenValidationError;
