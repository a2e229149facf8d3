use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use crate::configuration::NewsletterSettings;
use crate::configuration::Settings;
use crate::domain::DomainPolicy;
use crate::domain::SubscriberEmail;
use crate::email_client::EmailClient;
use crate::routes::confirm;
use crate::routes::contact;
use crate::routes::health_check;
use crate::routes::json_error;
use crate::routes::list_comments;
use crate::routes::post_comment;
use crate::routes::subscribe;
use crate::routes::ContactRecipient;
use crate::store::CommentStore;
use crate::store::SubscriberStore;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener and wire every dependency out of `cfg`. Port 0 asks
    /// the OS for a random free port (used by the tests).
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(&addr).with_context(|| format!("Failed to bind {addr}"))?;
        let port = listener.local_addr()?.port();

        let email_client = cfg.email_client.client()?;
        let recipient = cfg
            .contact
            .recipient()
            .map_err(anyhow::Error::msg)
            .context("Invalid contact.recipient")?;

        let server = run(
            listener,
            AppState {
                subscribers: SubscriberStore::new(&cfg.store.subscribers_path),
                comments: CommentStore::new(&cfg.store.comments_path),
                email_client,
                base_url: cfg.application.base_url,
                newsletter: cfg.newsletter,
                contact_recipient: recipient,
                domain_policy: cfg.contact.domain_policy(),
            },
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Wrapper for top-level application `base_url` (because raw `String`s may
/// conflict with one another when passed around by `Data`)
pub struct AppBaseUrl(pub String);

/// Everything the handlers need, built once and shared by every worker
pub struct AppState {
    pub subscribers: SubscriberStore,
    pub comments: CommentStore,
    pub email_client: EmailClient,
    pub base_url: String,
    pub newsletter: NewsletterSettings,
    pub contact_recipient: SubscriberEmail,
    pub domain_policy: DomainPolicy,
}

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    state: AppState,
) -> Result<Server, anyhow::Error> {
    // `Data` is an `Arc`: created once here, so that every worker shares the
    // same store (and therefore the same store lock)
    let subscribers = Data::new(state.subscribers);
    let comments = Data::new(state.comments);
    let email_client = Data::new(state.email_client);
    let base_url = Data::new(AppBaseUrl(state.base_url));
    let newsletter = Data::new(state.newsletter);
    let recipient = Data::new(ContactRecipient(state.contact_recipient));
    let policy = Data::new(state.domain_policy);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(json_config())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .route("/subscribe", web::post().to(subscribe))
                    .route("/confirm", web::get().to(confirm))
                    .route("/contact", web::post().to(contact))
                    .route("/comments/{slug}", web::get().to(list_comments))
                    .route("/comments/{slug}", web::post().to(post_comment)),
            )
            .app_data(subscribers.clone())
            .app_data(comments.clone())
            .app_data(email_client.clone())
            .app_data(base_url.clone())
            .app_data(newsletter.clone())
            .app_data(recipient.clone())
            .app_data(policy.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other
/// API failure
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let resp = json_error(StatusCode::BAD_REQUEST, &err.to_string());
            InternalError::from_response(err, resp).into()
        })
}
