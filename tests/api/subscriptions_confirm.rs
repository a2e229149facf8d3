use crate::helpers::spawn_app;

const PENDING_T1: &str =
    r#"[{"email":"a@x.com","subscribedAt":"2024-01-01T00:00:00Z","confirmed":false,"confirmationToken":"T1"}]"#;

async fn is_html(resp: reqwest::Response) -> String {
    let content_type = resp.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"), "{content_type}");
    resp.text().await.unwrap()
}

#[tokio::test]
async fn confirmation_no_token() {
    let app = spawn_app().await;

    for query in ["", "?token=", "?token=%20%20", "?other=1"] {
        let resp = app.get_confirm(query).await;
        assert_eq!(resp.status().as_u16(), 400, "{query}");
        let body = is_html(resp).await;
        assert!(body.contains("Invalid confirmation link"), "{query}");
    }
}

#[tokio::test]
async fn confirmation_over_long_token() {
    let app = spawn_app().await;
    let resp = app.get_confirm(&format!("?token={}", "a".repeat(257))).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body = is_html(resp).await;
    assert!(body.contains("Invalid confirmation link"));
}

/// Tokens are opaque: a hand-edited store may hold tokens that are not
/// alphanumeric, and those must still confirm.
#[tokio::test]
async fn confirm_non_alphanumeric_token() {
    let app = spawn_app().await;
    app.seed_subscribers(
        r#"[{"email":"a@x.com","subscribedAt":"2024-01-01T00:00:00Z","confirmed":false,"confirmationToken":"3f2a-9b1c"}]"#,
    );

    let resp = app.get_confirm("?token=3f2a-9b1c").await;
    assert_eq!(resp.status().as_u16(), 200);
    let stored = app.stored_subscribers().await;
    assert!(stored[0].confirmed);
    assert!(stored[0].confirmation_token.is_none());

    // unknown rather than malformed
    let resp = app.get_confirm("?token=0000-ffff").await;
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn confirmation_unknown_token() {
    let app = spawn_app().await;
    app.seed_subscribers(PENDING_T1);

    let resp = app.get_confirm("?token=T2").await;
    assert_eq!(resp.status().as_u16(), 404);
    let body = is_html(resp).await;
    assert!(!body.to_lowercase().contains("expire"));

    // untouched
    let stored = app.stored_subscribers().await;
    assert!(!stored[0].confirmed);
    assert_eq!(stored[0].confirmation_token.as_deref(), Some("T1"));
}

#[tokio::test]
async fn confirmation_against_empty_store() {
    let app = spawn_app().await;
    let resp = app.get_confirm("?token=T1").await;
    assert_eq!(resp.status().as_u16(), 404);
    // a miss does not create the store file
    assert!(!app.subscribers.path().exists());
}

/// Store holds one pending record with token `T1`; confirming with `T1` flips
/// it and drops the `confirmationToken` field.
#[tokio::test]
async fn confirm_seeded_record() {
    let app = spawn_app().await;
    app.seed_subscribers(PENDING_T1);

    let resp = app.get_confirm("?token=T1").await;
    assert_eq!(resp.status().as_u16(), 200);
    let body = is_html(resp).await;
    assert!(body.contains("Your subscription is confirmed"));

    let raw = std::fs::read_to_string(app.subscribers.path()).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &stored[0];
    assert_eq!(record["email"], "a@x.com");
    assert_eq!(record["confirmed"], true);
    assert!(record.get("confirmationToken").is_none());
    assert!(record["confirmedAt"].is_string());
}

#[tokio::test]
async fn confirm_twice_is_idempotent() {
    let app = spawn_app().await;
    app.seed_subscribers(PENDING_T1);

    let first = app.get_confirm("?token=T1").await;
    assert_eq!(first.status().as_u16(), 200);
    let after_first = app.stored_subscribers().await;

    let second = app.get_confirm("?token=T1").await;
    assert_eq!(second.status().as_u16(), 200);
    let body = is_html(second).await;
    assert!(body.contains("Already confirmed"));

    assert_eq!(app.stored_subscribers().await, after_first);
}

#[tokio::test]
async fn confirm_via_emailed_link() {
    let app = spawn_app().await;
    app.mock_email_ok(1).await;

    app.subscribe("foo@bar.com").await;
    let email_reqs = app.email_server.received_requests().await.unwrap();
    let links = app.get_confirmation_links(&email_reqs[0]);

    let resp = app.client.get(links.html).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let stored = app.stored_subscribers().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].email, "foo@bar.com");
    assert!(stored[0].confirmed);
    assert!(stored[0].confirmation_token.is_none());
}

#[tokio::test]
async fn confirm_only_touches_matching_record() {
    let app = spawn_app().await;
    app.mock_email_ok(2).await;

    app.subscribe("a@x.com").await;
    app.subscribe("b@x.com").await;
    let email_reqs = app.email_server.received_requests().await.unwrap();
    let links = app.get_confirmation_links(&email_reqs[1]);

    app.client
        .get(links.text)
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let stored = app.stored_subscribers().await;
    let a = stored.iter().find(|r| r.email == "a@x.com").unwrap();
    let b = stored.iter().find(|r| r.email == "b@x.com").unwrap();
    assert!(!a.confirmed);
    assert!(a.confirmation_token.is_some());
    assert!(b.confirmed);
}

#[tokio::test]
async fn confirm_on_corrupt_store_is_500() {
    let app = spawn_app().await;
    app.seed_subscribers("not json");

    let resp = app.get_confirm("?token=T1").await;
    assert_eq!(resp.status().as_u16(), 500);
    let body = is_html(resp).await;
    assert!(body.contains("Something went wrong"));
}
