use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::DomainPolicy;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;

/// Global configuration, loaded from `configuration/*.yaml`. See
/// `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub store: StoreSettings,
    pub email_client: EmailClientSettings,
    pub newsletter: NewsletterSettings,
    pub contact: ContactSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Public address of the site, used to build confirmation links
    pub base_url: String,
}

/// Location of the JSON files backing the subscriber and comment stores.
/// Relative paths are resolved against the working directory.
#[derive(Deserialize, Clone)]
pub struct StoreSettings {
    pub subscribers_path: PathBuf,
    pub comments_path: PathBuf,
}

/// Transactional email API
#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<EmailClient, anyhow::Error> {
        let sender = self.sender().map_err(anyhow::Error::msg)?;
        EmailClient::new(
            &self.base_url,
            sender,
            self.authorization_token.clone(),
            self.timeout(),
        )
    }
}

#[derive(Deserialize, Clone)]
pub struct NewsletterSettings {
    /// When false (the default), every intake appends a new pending record,
    /// even for an email that is already in the store.
    #[serde(default)]
    pub deduplicate_emails: bool,
}

/// Contact form
#[derive(Deserialize, Clone)]
pub struct ContactSettings {
    /// Where contact form messages are delivered
    pub recipient: String,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub blocked_domains: Vec<String>,
}

impl ContactSettings {
    pub fn recipient(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.recipient.clone())
    }

    pub fn domain_policy(&self) -> DomainPolicy {
        DomainPolicy::new(self.allowed_domains.clone(), self.blocked_domains.clone())
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!(
                "{e} is not a supported environment; use either `local` or `production`"
            )),
        }
    }
}

/// Load yaml configuration files at `<working dir>/configuration`:
/// `base.yaml`, then `{APP_ENVIRONMENT}.yaml` (default `local`), then `APP_`
/// env vars.
///
/// `APP_STORE__SUBSCRIBERS_PATH=/data/subscribers.json` ->
/// `Settings.store.subscribers_path`
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    tracing::debug!("loading config for {env} env");

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are always strings; `serde-aux` takes care of the numbers
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
