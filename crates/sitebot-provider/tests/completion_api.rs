use sitebot_provider::{Completion, CompletionClient, DEFAULT_MODEL};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-test",
        "choices": [{
            "message": {"role": "assistant", "content": text}
        }]
    })
}

fn client_for(server: &MockServer) -> CompletionClient {
    CompletionClient::with_base(Some("sk-or-test".to_string()), server.uri(), DEFAULT_MODEL)
}

#[tokio::test]
async fn identical_prompts_hit_upstream_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-or-test"))
        .and(body_partial_json(serde_json::json!({
            "model": DEFAULT_MODEL,
            "max_tokens": 400
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("  The answer.  ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.complete("what do you sell?").await;
    let second = client.complete("what do you sell?").await;

    assert_eq!(first, "The answer.");
    assert_eq!(first, second);
}

#[tokio::test]
async fn different_prompts_are_separate_cache_entries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("reply")))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.complete("prompt a").await;
    client.complete("prompt b").await;
}

#[tokio::test]
async fn auth_failure_maps_to_fixed_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete("hello there").await;
    assert!(reply.contains("authentication failed"));
}

#[tokio::test]
async fn rate_limit_message_is_cached_for_that_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let first = client.complete("rate limited prompt").await;
    let second = client.complete("rate limited prompt").await;

    assert!(first.contains("Rate limit exceeded"));
    assert_eq!(first, second);
}

#[tokio::test]
async fn unknown_status_previews_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete("anything at all").await;
    assert_eq!(reply, "API Error 503: upstream exploded");
}

#[tokio::test]
async fn missing_key_never_calls_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("nope")))
        .expect(0)
        .mount(&server)
        .await;

    let client = CompletionClient::with_base(None, server.uri(), DEFAULT_MODEL);
    let reply = client.complete("are you there?").await;
    assert!(reply.contains("API key not set"));
}

#[tokio::test]
async fn malformed_success_body_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let reply = client.complete("hm").await;
    assert_eq!(reply, "API Error 200: not json");
}
