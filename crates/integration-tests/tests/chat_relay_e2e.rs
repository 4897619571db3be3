mod support;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chat_client::{ChatSession, RelayClient, ResponseMode, SendOutcome};
use serde_json::{Value, json};
use shared::llm::{APOLOGY_MESSAGE, OpenRouterGateway, SYSTEM_PROMPT, WELCOME_MESSAGE};
use shared::models::{Role, Turn};
use tower::ServiceExt;

use support::provider_mock::{ProviderMock, ProviderReply};
use support::{TEST_API_KEY, TEST_MODEL, TestRelay, provider_config, relay_router};

#[tokio::test]
async fn batch_widget_round_trip_through_relay() {
    let provider = ProviderMock::start(vec![ProviderReply::message("2 + 2 = 4.")]).await;
    let relay = TestRelay::start(&provider.url, false).await;
    let transport = RelayClient::new(relay.chat_url.clone(), None).expect("client should build");

    let mut session =
        ChatSession::with_turns(vec![Turn::assistant("Hi!")], ResponseMode::Batch);
    session.set_draft("2+2?");
    let outcome = session.send(&transport).await;

    relay.stop().await;
    let seen_bodies = provider.seen_bodies().await;
    let seen_headers = provider.seen_headers().await;
    provider.stop().await;

    assert_eq!(outcome, SendOutcome::Replied);
    assert_eq!(
        session.turns(),
        &[
            Turn::assistant("Hi!"),
            Turn::user("2+2?"),
            Turn::assistant("2 + 2 = 4."),
        ]
    );
    assert!(!session.is_busy());
    assert_eq!(session.draft(), "");

    assert_eq!(seen_bodies.len(), 1);
    assert_eq!(seen_bodies[0]["model"], TEST_MODEL);
    assert_eq!(seen_bodies[0]["stream"], false);
    assert_eq!(
        seen_bodies[0]["messages"],
        json!([
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "assistant", "content": "Hi!"},
            {"role": "user", "content": "2+2?"}
        ])
    );
    assert_eq!(
        seen_headers[0]
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok()),
        Some(format!("Bearer {TEST_API_KEY}").as_str())
    );
}

#[tokio::test]
async fn streaming_widget_appends_deltas_in_order() {
    let provider =
        ProviderMock::start(vec![ProviderReply::deltas(&["2 + 2", " = ", "4 ✓"])]).await;
    let relay = TestRelay::start(&provider.url, false).await;
    let transport = RelayClient::new(relay.chat_url.clone(), None).expect("client should build");

    let mut session = ChatSession::new(ResponseMode::Streaming);
    session.set_draft("2+2?");
    let mut seen_chunks = Vec::new();
    let outcome = session
        .send_with(&transport, |chunk| seen_chunks.push(chunk.to_string()))
        .await;

    relay.stop().await;
    let seen_bodies = provider.seen_bodies().await;
    provider.stop().await;

    assert_eq!(outcome, SendOutcome::Replied);
    assert_eq!(seen_chunks, vec!["2 + 2", " = ", "4 ✓"]);
    assert_eq!(
        session.turns(),
        &[
            Turn::assistant(WELCOME_MESSAGE),
            Turn::user("2+2?"),
            Turn::assistant("2 + 2 = 4 ✓"),
        ]
    );
    assert_eq!(seen_bodies[0]["stream"], true);
}

#[tokio::test]
async fn provider_failure_leaves_one_apology_and_a_reusable_session() {
    let provider = ProviderMock::start(vec![
        ProviderReply::failure(StatusCode::SERVICE_UNAVAILABLE),
        ProviderReply::message("Back again."),
    ])
    .await;
    let relay = TestRelay::start(&provider.url, false).await;
    let transport = RelayClient::new(relay.chat_url.clone(), None).expect("client should build");

    let mut session = ChatSession::new(ResponseMode::Batch);
    session.set_draft("2+2?");
    let first = session.send(&transport).await;

    assert_eq!(first, SendOutcome::Failed);
    assert!(!session.is_busy());
    let apologies = session
        .turns()
        .iter()
        .filter(|turn| turn.role == Role::Assistant && turn.content == APOLOGY_MESSAGE)
        .count();
    assert_eq!(apologies, 1);
    assert_eq!(
        session.turns().last().map(|turn| turn.content.as_str()),
        Some(APOLOGY_MESSAGE)
    );

    session.set_draft("still there?");
    let second = session.send(&transport).await;

    relay.stop().await;
    provider.stop().await;

    assert_eq!(second, SendOutcome::Replied);
    assert_eq!(
        session.turns().last().map(|turn| turn.content.as_str()),
        Some("Back again.")
    );
}

#[tokio::test]
async fn provider_stream_abort_ends_in_one_apology() {
    let provider = ProviderMock::start(vec![ProviderReply::aborted_after("2 + 2")]).await;
    let relay = TestRelay::start(&provider.url, true).await;
    let transport = RelayClient::new(relay.chat_url.clone(), None).expect("client should build");

    let mut session =
        ChatSession::with_turns(vec![Turn::assistant("Hi!")], ResponseMode::Streaming);
    session.set_draft("2+2?");
    let outcome = session.send(&transport).await;

    relay.stop().await;
    let seen_bodies = provider.seen_bodies().await;
    provider.stop().await;

    assert_eq!(outcome, SendOutcome::Failed);
    assert!(!session.is_busy());
    assert_eq!(seen_bodies.len(), 1);
    assert_eq!(seen_bodies[0]["stream"], true);

    let turns = session.turns();
    assert_eq!(turns.len(), 4);
    assert_eq!(&turns[..2], &[Turn::assistant("Hi!"), Turn::user("2+2?")]);
    // The relayed prefix may or may not reach the client before the abort.
    assert_eq!(turns[2].role, Role::Assistant);
    assert!("2 + 2".starts_with(turns[2].content.as_str()));
    assert_eq!(turns[3], Turn::assistant(APOLOGY_MESSAGE));
}

#[tokio::test]
async fn relay_reports_unreachable_provider_as_bad_gateway() {
    let gateway = OpenRouterGateway::new(provider_config("http://127.0.0.1:9/chat/completions"))
        .expect("gateway should build");
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat?stream=false")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!([{"role": "user", "content": "2+2?"}]).to_string(),
        ))
        .expect("request should build");

    let response = relay_router(gateway, true)
        .oneshot(request)
        .await
        .expect("request should complete");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let value: Value = serde_json::from_slice(&body).expect("body should be json");
    assert_eq!(value["error"]["code"], "upstream_unavailable");
    assert!(
        !value.to_string().contains(TEST_API_KEY),
        "error body must not leak the provider key"
    );
}
