//! Integration tests for the HTTP surface.
//!
//! These tests drive the axum router in-process with `tower::ServiceExt`:
//! 1. Inbound messages produce descriptors and channel deliveries
//! 2. Operator endpoints read, patch and reset conversations
//! 3. Errors map to the documented status codes

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use huntred_flow::adapters::channels::Delivery;
use huntred_flow::adapters::http::{
    app_router, operator_payload, sign, ConversationAppState, SIGNATURE_HEADER,
};
use huntred_flow::adapters::{
    CatalogFlowRepository, InMemoryConversationStore, RecordingChannel, YamlFlowSource,
};
use huntred_flow::application::{
    ChannelRegistry, FlowManager, FlowPolicy, InboundMessageHandler, ResponseDispatcher,
    RetryPolicy,
};
use huntred_flow::domain::foundation::{BusinessUnitId, PersonId};
use huntred_flow::ports::StoreError;

const SECRET: &str = "a-long-enough-shared-secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: Arc<InMemoryConversationStore>,
    channel: RecordingChannel,
}

async fn test_app(signing_secret: Option<&str>) -> TestApp {
    let source = YamlFlowSource::new(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("flows"));
    let flows = Arc::new(CatalogFlowRepository::from_source(&source).await.unwrap());
    let store = Arc::new(InMemoryConversationStore::new());
    let manager = Arc::new(FlowManager::new(store.clone(), flows, FlowPolicy::default()));

    let channel = RecordingChannel::new("whatsapp").with_profile(
        BusinessUnitId::new("huntred").unwrap(),
        PersonId::new("5215512345678").unwrap(),
        json!({"name": "Ana", "has_profile": true}),
    );
    let registry = ChannelRegistry::new().with(Arc::new(channel.clone()));
    let dispatcher = ResponseDispatcher::new(Arc::new(registry), RetryPolicy::no_retry());

    let inbound = Arc::new(InboundMessageHandler::new(manager, Some(Arc::new(dispatcher))));
    let mut state = ConversationAppState::new(inbound);
    if let Some(secret) = signing_secret {
        state = state.with_signing_secret(secret);
    }

    TestApp {
        router: app_router(state, Duration::from_secs(5)),
        store,
        channel,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn message(person_id: &str, text: &str) -> Value {
    json!({"person_id": person_id, "text": text})
}

// =============================================================================
// Inbound messages
// =============================================================================

#[tokio::test]
async fn health_check_responds() {
    let app = test_app(None).await;
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn inbound_message_returns_descriptor() {
    let app = test_app(None).await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("p-1", "hola"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["current_state"], "greeting");
    assert_eq!(body["intent"], "greeting");
    assert!(body.get("delivery").is_none());
    assert!(app.channel.deliveries().is_empty());
}

#[tokio::test]
async fn inbound_message_with_channel_seeds_profile_and_delivers() {
    let app = test_app(None).await;
    let mut body = message("5215512345678", "hola");
    body["channel"] = json!("whatsapp");
    send(
        &app.router,
        json_request(Method::POST, "/api/business-units/huntred/messages", &body),
    )
    .await;

    let mut menu = message("5215512345678", "opciones");
    menu["channel"] = json!("whatsapp");
    let (status, response) = send(
        &app.router,
        json_request(Method::POST, "/api/business-units/huntred/messages", &menu),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["current_state"], "main_menu");
    assert_eq!(response["delivery"]["delivered"], true);
    assert_eq!(response["delivery"]["channel"], "whatsapp");

    let deliveries = app.channel.deliveries();
    assert_eq!(deliveries.len(), 2);
    assert!(matches!(&deliveries[0], Delivery::Message { text, .. } if text.contains("huntred")));
    assert!(matches!(&deliveries[1], Delivery::Options { options, .. } if options.len() == 3));

    let request = Request::get("/api/business-units/huntred/conversations/5215512345678")
        .body(Body::empty())
        .unwrap();
    let (_, view) = send(&app.router, request).await;
    assert_eq!(view["context"]["name"], "Ana");
    assert_eq!(view["context"]["has_profile"], true);
}

#[tokio::test]
async fn unknown_channel_is_reported_in_response() {
    let app = test_app(None).await;
    let mut body = message("p-1", "hola");
    body["channel"] = json!("telegram");
    let (status, response) = send(
        &app.router,
        json_request(Method::POST, "/api/business-units/huntred/messages", &body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["delivery"]["delivered"], false);
}

#[tokio::test]
async fn invalid_person_id_is_bad_request() {
    let app = test_app(None).await;
    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("   ", "hola"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app(None).await;
    let request = Request::post("/api/business-units/huntred/messages")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn storage_outage_is_service_unavailable() {
    let app = test_app(None).await;
    app.store
        .fail_with(Some(StoreError::Unavailable("connection refused".into())))
        .await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("p-1", "hola"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "STORAGE_UNAVAILABLE");
}

// =============================================================================
// Request signing
// =============================================================================

#[tokio::test]
async fn signed_requests_are_accepted() {
    let app = test_app(Some(SECRET)).await;
    let body = message("p-1", "hola").to_string();
    let signature = sign(SECRET.as_bytes(), body.as_bytes()).unwrap();

    let request = Request::post("/api/business-units/huntred/messages")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();
    let (status, response) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["current_state"], "greeting");
}

#[tokio::test]
async fn unsigned_or_tampered_requests_are_rejected() {
    let app = test_app(Some(SECRET)).await;
    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("p-1", "hola"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let signature = sign(SECRET.as_bytes(), message("p-1", "hola").to_string().as_bytes()).unwrap();
    let request = Request::post("/api/business-units/huntred/messages")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(message("p-1", "mi perfil").to_string()))
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn operator_endpoints_require_a_signature() {
    let app = test_app(Some(SECRET)).await;
    let context_uri = "/api/business-units/huntred/conversations/5215599999999/context";
    let patch = json!({"updates": {"has_profile": true}});

    let (status, _) = send(&app.router, json_request(Method::PATCH, context_uri, &patch)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let reset_uri = "/api/business-units/huntred/conversations/5215599999999/reset";
    let request = Request::post(reset_uri).body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::get("/api/business-units/huntred/conversations/5215599999999")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.is_empty().await);

    // A signature is bound to the conversation it was issued for.
    let other_reset = "/api/business-units/huntred/conversations/5215500000000/reset";
    let signature = sign(SECRET.as_bytes(), &operator_payload(other_reset, b"")).unwrap();
    let request = Request::post(reset_uri)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let body = patch.to_string();
    let signature = sign(SECRET.as_bytes(), &operator_payload(context_uri, body.as_bytes())).unwrap();
    let request = Request::patch(context_uri)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!app.store.is_empty().await);
}

// =============================================================================
// Operator endpoints
// =============================================================================

#[tokio::test]
async fn operator_writes_to_unconfigured_units_store_nothing() {
    let app = test_app(None).await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::PATCH,
            "/api/business-units/acme/conversations/p-1/context",
            &json!({"updates": {"has_profile": true}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let request = Request::post("/api/business-units/acme/conversations/p-1/reset")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        json_request(
            Method::PATCH,
            "/api/business-units/%2E%2E/conversations/p-1/context",
            &json!({"updates": {"has_profile": true}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/acme/messages",
            &json!({"person_id": "p-1", "text": "hola", "channel": "whatsapp"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let app = test_app(None).await;
    let request = Request::get("/api/business-units/huntred/conversations/nobody")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn patch_context_then_reset() {
    let app = test_app(None).await;
    send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("p-2", "hola"),
        ),
    )
    .await;

    let (status, body) = send(
        &app.router,
        json_request(
            Method::PATCH,
            "/api/business-units/huntred/conversations/p-2/context",
            &json!({"updates": {"has_profile": true, "city": "Monterrey"}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, descriptor) = send(
        &app.router,
        json_request(
            Method::POST,
            "/api/business-units/huntred/messages",
            &message("p-2", "mi perfil"),
        ),
    )
    .await;
    assert_eq!(descriptor["current_state"], "profile");

    let request = Request::post("/api/business-units/huntred/conversations/p-2/reset")
        .body(Body::empty())
        .unwrap();
    let (status, view) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["current_state"], "initial");
    assert_eq!(view["context"]["city"], "Monterrey");
    assert_eq!(view["business_unit"], "huntred");
}
