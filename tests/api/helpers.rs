use footballdecoded::configuration::get_configuration;
use footballdecoded::configuration::Settings;
use footballdecoded::domain::SubscriberRecord;
use footballdecoded::startup::Application;
use footballdecoded::store::SubscriberStore;
use footballdecoded::telemetry::get_subscriber;
use footballdecoded::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

/// Init the tracing subscriber once for the whole test binary.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).unwrap();
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).unwrap();
        }
    };
});

pub struct ConfirmationLinks {
    pub html: reqwest::Url,
    pub text: reqwest::Url,
}

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    pub email_server: MockServer,
    /// Same file the server uses; read it to check side effects
    pub subscribers: SubscriberStore,
    pub client: reqwest::Client,
    // dropped (and deleted) together with the app
    _store_dir: TempDir,
}

impl TestApp {
    pub async fn post_subscriptions(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/subscribe", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn subscribe(
        &self,
        email: &str,
    ) -> reqwest::Response {
        self.post_subscriptions(&serde_json::json!({ "email": email }))
            .await
    }

    pub async fn get_confirm(
        &self,
        query: &str,
    ) -> reqwest::Response {
        self.client
            .get(format!("{}/api/confirm{query}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_contact(
        &self,
        body: &Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/contact", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_comments(
        &self,
        slug: &str,
    ) -> reqwest::Response {
        self.client
            .get(format!("{}/api/comments/{slug}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_comment(
        &self,
        slug: &str,
        body: &Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/api/comments/{slug}", self.addr))
            .json(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn stored_subscribers(&self) -> Vec<SubscriberRecord> {
        self.subscribers.load().await.unwrap()
    }

    /// Write the subscriber store directly, bypassing the API
    pub fn seed_subscribers(
        &self,
        json: &str,
    ) {
        let path = self.subscribers.path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, json).unwrap();
    }

    /// Extract the confirmation links embedded in a request to the email API.
    /// The links point at the configured `base_url`, whose port is swapped for
    /// the one the test app was bound to.
    pub fn get_confirmation_links(
        &self,
        email_request: &wiremock::Request,
    ) -> ConfirmationLinks {
        let body: Value = serde_json::from_slice(&email_request.body).unwrap();

        let get_link = |s: &str| {
            let links: Vec<_> = linkify::LinkFinder::new()
                .links(s)
                .filter(|l| *l.kind() == linkify::LinkKind::Url)
                .collect();
            assert_eq!(links.len(), 1);
            let mut link = reqwest::Url::parse(links[0].as_str()).unwrap();
            assert_eq!(link.host_str().unwrap(), "127.0.0.1");
            link.set_port(Some(self.port)).unwrap();
            link
        };

        ConfirmationLinks {
            html: get_link(body["html"].as_str().unwrap()),
            text: get_link(body["text"].as_str().unwrap()),
        }
    }

    pub async fn mock_email_ok(
        &self,
        expected: u64,
    ) {
        Mock::given(path("/emails"))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(expected)
            .mount(&self.email_server)
            .await;
    }
}

pub async fn spawn_app() -> TestApp { spawn_app_with(|_| {}).await }

/// Spawn the app on a random port, with a fresh store directory and a mock
/// email API. `customise` may adjust the configuration before the app is
/// built.
pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let store_dir = TempDir::new().unwrap();

    let cfg = {
        let mut cfg = get_configuration().expect("read configuration");
        // port 0 is reserved by the OS; the server gets a random free port
        cfg.application.port = 0;
        cfg.application.host = "127.0.0.1".to_string();
        cfg.application.base_url = "http://127.0.0.1".to_string();
        cfg.store.subscribers_path = store_dir.path().join("subscribers.json");
        cfg.store.comments_path = store_dir.path().join("comments.json");
        cfg.email_client.base_url = email_server.uri();
        customise(&mut cfg);
        cfg
    };

    let subscribers = SubscriberStore::new(&cfg.store.subscribers_path);
    let app = Application::build(cfg).await.expect("build app");
    let port = app.get_port();
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr: format!("http://127.0.0.1:{port}"),
        port,
        email_server,
        subscribers,
        client: reqwest::Client::new(),
        _store_dir: store_dir,
    }
}
