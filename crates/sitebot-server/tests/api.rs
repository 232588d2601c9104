use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitebot_core::Settings;
use sitebot_provider::StubCompletion;
use sitebot_server::{create_router, AppState};

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body>\
             <p>Acme builds industrial-grade rocket skates for discerning coyotes.</p>\
             <p>Questions? Mail sales@acme.example or ring +1 555 123 4567 today.</p>\
             </body></html>",
        ))
        .mount(&server)
        .await;
    server
}

fn test_app() -> Router {
    let state = AppState::with_completion(
        Settings::default(),
        Arc::new(StubCompletion::new("stubbed answer")),
    );
    create_router(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let resp = app.clone().oneshot(request).await.expect("response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body");
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = request(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn full_visitor_flow_over_http() {
    let site = mock_site().await;
    let app = test_app();

    // Register a chatbot for the mock site.
    let (status, bot) = request(
        &app,
        "POST",
        "/api/chatbots",
        Some(serde_json::json!({
            "company_name": "Acme",
            "website_url": site.uri(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bot["slug"], "acme");
    assert_eq!(bot["ready"], true);
    assert_eq!(bot["page_count"], 1);
    assert_eq!(bot["contact_info"]["emails"][0], "sales@acme.example");
    let chatbot_id = bot["chatbot_id"].as_str().expect("chatbot id").to_string();
    assert!(bot["embed_code"]
        .as_str()
        .expect("embed code")
        .contains(&chatbot_id));

    // Open a session and make the chatbot current.
    let (status, session) = request(&app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = session["session_id"].as_str().expect("session id");

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/sessions/{session_id}/select"),
        Some(serde_json::json!({ "slug": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // A greeting is answered without the model; two more questions trip
    // the lead form.
    let messages_uri = format!("/api/sessions/{session_id}/messages");
    let (_, reply) = request(
        &app,
        "POST",
        &messages_uri,
        Some(serde_json::json!({ "text": "hello" })),
    )
    .await;
    assert!(reply["reply"].as_str().expect("reply").contains("Acme"));
    assert_eq!(reply["capture_started"], false);

    let (_, reply) = request(
        &app,
        "POST",
        &messages_uri,
        Some(serde_json::json!({ "text": "what do you sell?" })),
    )
    .await;
    assert_eq!(reply["reply"], "stubbed answer");

    let (_, reply) = request(
        &app,
        "POST",
        &messages_uri,
        Some(serde_json::json!({ "text": "do you deliver abroad?" })),
    )
    .await;
    assert_eq!(reply["capture_started"], true);
    assert_eq!(reply["form_prompt"], "May I know your name?");

    // Chat is refused while the form is open.
    let (status, blocked) = request(
        &app,
        "POST",
        &messages_uri,
        Some(serde_json::json!({ "text": "one more thing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(blocked["form_pending"], true);

    // Walk the form: name, an invalid email (retried), then skip the phone.
    let lead_uri = format!("/api/sessions/{session_id}/lead");
    let (_, step) = request(
        &app,
        "POST",
        &lead_uri,
        Some(serde_json::json!({ "action": "submit", "value": "Jo" })),
    )
    .await;
    assert_eq!(step["state"], "ask_email");

    let (status, step) = request(
        &app,
        "POST",
        &lead_uri,
        Some(serde_json::json!({ "action": "submit", "value": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["state"], "ask_email");
    assert!(step["error"].as_str().expect("error").contains("valid email"));

    let (_, step) = request(
        &app,
        "POST",
        &lead_uri,
        Some(serde_json::json!({ "action": "submit", "value": "jo@example.com" })),
    )
    .await;
    assert_eq!(step["state"], "ask_phone");

    let (_, step) = request(
        &app,
        "POST",
        &lead_uri,
        Some(serde_json::json!({ "action": "skip" })),
    )
    .await;
    assert_eq!(step["captured"], true);
    assert_eq!(step["lead_id"], 1);

    // The lead is queryable, and chat has resumed.
    let (_, leads) = request(
        &app,
        "GET",
        &format!("/api/leads?chatbot_id={chatbot_id}"),
        None,
    )
    .await;
    assert_eq!(leads.as_array().expect("leads").len(), 1);
    assert_eq!(leads[0]["name"], "Jo");
    assert_eq!(leads[0]["phone"], "Not provided");

    let (_, reply) = request(
        &app,
        "POST",
        &messages_uri,
        Some(serde_json::json!({ "text": "as I was saying" })),
    )
    .await;
    assert_eq!(reply["form_pending"], false);

    // The stored config is retrievable by chatbot id.
    let (status, config) = request(&app, "GET", &format!("/api/chatbots/{chatbot_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["company_name"], "Acme");
}

#[tokio::test]
async fn unknown_ids_yield_not_found() {
    let app = test_app();

    let (status, _) = request(&app, "GET", "/api/chatbots/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "POST",
        "/api/sessions/nope/messages",
        Some(serde_json::json!({ "text": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_chatbot_fields_are_rejected() {
    let app = test_app();
    let (status, _) = request(
        &app,
        "POST",
        "/api/chatbots",
        Some(serde_json::json!({ "company_name": "  ", "website_url": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_chatbot_clears_the_sessions_pointing_at_it() {
    let site = mock_site().await;
    let app = test_app();

    let (_, bot) = request(
        &app,
        "POST",
        "/api/chatbots",
        Some(serde_json::json!({
            "company_name": "Acme",
            "website_url": site.uri(),
        })),
    )
    .await;
    let chatbot_id = bot["chatbot_id"].as_str().expect("chatbot id").to_string();

    let (_, session) = request(&app, "POST", "/api/sessions", None).await;
    let session_id = session["session_id"].as_str().expect("session id");
    request(
        &app,
        "POST",
        &format!("/api/sessions/{session_id}/select"),
        Some(serde_json::json!({ "slug": "acme" })),
    )
    .await;

    let (status, _) = request(&app, "DELETE", &format!("/api/chatbots/{chatbot_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The session no longer has a current chatbot to talk to.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/sessions/{session_id}/messages"),
        Some(serde_json::json!({ "text": "anyone home?" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Deleting again is a 404; the stored config survives.
    let (status, _) = request(&app, "DELETE", &format!("/api/chatbots/{chatbot_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = request(&app, "GET", &format!("/api/chatbots/{chatbot_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lead_action_without_an_open_form_conflicts() {
    let site = mock_site().await;
    let app = test_app();

    request(
        &app,
        "POST",
        "/api/chatbots",
        Some(serde_json::json!({
            "company_name": "Acme",
            "website_url": site.uri(),
        })),
    )
    .await;
    let (_, session) = request(&app, "POST", "/api/sessions", None).await;
    let session_id = session["session_id"].as_str().expect("session id");
    request(
        &app,
        "POST",
        &format!("/api/sessions/{session_id}/select"),
        Some(serde_json::json!({ "slug": "acme" })),
    )
    .await;

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/sessions/{session_id}/lead"),
        Some(serde_json::json!({ "action": "skip" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
