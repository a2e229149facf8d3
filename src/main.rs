use footballdecoded::configuration::get_configuration;
use footballdecoded::startup::Application;
use footballdecoded::telemetry::get_subscriber;
use footballdecoded::telemetry::init_subscriber;

/// Initialise telemetry, load config, and start the server
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("footballdecoded", "info", std::io::stdout);
    init_subscriber(subscriber)?;

    let cfg = get_configuration()?;
    tracing::info!(
        subscribers = ?cfg.store.subscribers_path,
        comments = ?cfg.store.comments_path,
        deduplicate_emails = cfg.newsletter.deduplicate_emails,
        "starting server on {}:{}",
        cfg.application.host,
        cfg.application.port,
    );

    let app = Application::build(cfg).await?;
    app.run_until_stopped().await?;
    Ok(())
}
