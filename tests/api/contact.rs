use serde_json::json;
use serde_json::Value;
use wiremock::matchers::any;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;

fn form(email: &str) -> Value {
    json!({
        "name": "John",
        "email": email,
        "subject": "Collaboration",
        "message": "Loved the <b>pressing</b> analysis.\nCan we talk?",
    })
}

#[tokio::test]
async fn contact_ok() {
    let app = spawn_app().await;
    app.mock_email_ok(1).await;

    let resp = app.post_contact(&form("john@club.org")).await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_string());

    let email_reqs = app.email_server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&email_reqs[0].body).unwrap();
    assert_eq!(sent["to"], "hello@footballdecoded.com");
    assert_eq!(sent["subject"], "[Contact] Collaboration");
    assert!(sent["text"].as_str().unwrap().contains("john@club.org"));
    // user input is escaped in the html part
    let html = sent["html"].as_str().unwrap();
    assert!(html.contains("&lt;b&gt;pressing&lt;"));
    assert!(!html.contains("<b>"));
    assert!(html.contains("<br />"));
}

#[tokio::test]
async fn contact_invalid() {
    let app = spawn_app().await;
    app.mock_email_ok(0).await;

    for (body, msg) in [
        (json!({}), "empty form"),
        (json!({ "name": "John", "email": "john@club.org", "message": " " }), "empty message"),
        (json!({ "name": "", "email": "john@club.org", "message": "hi" }), "empty name"),
        (json!({ "name": "John", "email": "nope", "message": "hi" }), "invalid email"),
        (form("bot@mailinator.com"), "blocked domain"),
        (form("bot@eu.mailinator.com"), "blocked subdomain"),
    ] {
        let resp = app.post_contact(&body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string(), "{msg}");
    }
}

#[tokio::test]
async fn contact_allow_list() {
    let app = spawn_app_with(|cfg| cfg.contact.allowed_domains = vec!["club.org".to_string()]).await;
    app.mock_email_ok(1).await;

    assert_eq!(app.post_contact(&form("coach@club.org")).await.status().as_u16(), 200);
    assert_eq!(app.post_contact(&form("coach@gmail.com")).await.status().as_u16(), 400);
}

#[tokio::test]
async fn contact_delivery_failure() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let resp = app.post_contact(&form("john@club.org")).await;
    assert_eq!(resp.status().as_u16(), 500);
}
