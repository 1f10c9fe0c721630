// Upstream client and HTTP surface tests

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mockito::Matcher;
use phishlens::analysis;
use phishlens::config::{AppConfig, GeminiConfig, GeoConfig};
use phishlens::dispatch::AnalysisPayload;
use phishlens::error::TriageError;
use phishlens::gemini::GeminiClient;
use phishlens::geo::tiles::tile_url;
use phishlens::geo::GeoClient;
use phishlens::models::report::Verdict;
use phishlens::quiz;
use phishlens::server::{create_router, create_router_with_state, AppState, SessionStore};
use phishlens::session::{DashboardState, Event};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn gemini_config(base_url: &str) -> GeminiConfig {
    GeminiConfig {
        api_base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        model: "gemini-2.5-flash".to_string(),
        timeout_seconds: 5,
    }
}

fn report_json() -> Value {
    json!({
        "verdict": "Malicious",
        "confidence": 92,
        "explanation": "Credential-harvesting email impersonating a bank.",
        "recommendedActions": ["Delete the email"],
        "preventiveMeasures": ["Enable multi-factor authentication"],
        "technical": {
            "tactics": ["spoofing"],
            "authentication": "SPF fail, DKIM missing, DMARC fail"
        },
        "sender": {
            "address": "alerts@secure-bank.example",
            "country": "Netherlands",
            "anonymized": true
        },
        "headers": {
            "from": "alerts@secure-bank.example",
            "replyTo": "collect@mailbox.example",
            "returnPath": "bounce@mailbox.example",
            "originatingIp": "203.0.113.9"
        },
        "indicators": ["Lookalike domain"],
        "codeSnippet": "<a href=\"http://attacker.example\">Verify now</a>"
    })
}

fn candidate_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 100, "candidatesTokenCount": 200, "totalTokenCount": 300 }
    })
    .to_string()
}

#[tokio::test]
async fn test_analyze_binds_report_from_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(&report_json().to_string()))
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let report = analysis::analyze(
        &client,
        AnalysisPayload::Text("Subject: test".to_string()),
    )
    .await
    .unwrap();

    assert_eq!(report.verdict, Verdict::Malicious);
    assert_eq!(report.headers.originating_ip, "203.0.113.9");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_http_error_surfaces_as_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(503)
        .with_body(r#"{"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let result = analysis::analyze(
        &client,
        AnalysisPayload::Text("Subject: test".to_string()),
    )
    .await;

    assert!(matches!(result, Err(TriageError::Upstream(_))));
}

#[tokio::test]
async fn test_non_json_candidate_text_fails_closed() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body("I could not produce JSON, sorry."))
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let result = analysis::analyze(
        &client,
        AnalysisPayload::Text("Subject: test".to_string()),
    )
    .await;

    assert!(matches!(result, Err(TriageError::MalformedReply(_))));
}

#[tokio::test]
async fn test_quiz_scenario_round_trip() {
    let scenario = json!({
        "sender": "hr@yourcompany.example",
        "subject": "Updated holiday schedule",
        "body": "The revised schedule is attached.",
        "isPhishing": false,
        "explanation": "Internal sender, no links, no urgency."
    });

    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(&scenario.to_string()))
        .create_async()
        .await;

    let client = GeminiClient::new(&gemini_config(&server.url())).unwrap();
    let scenario = quiz::next_scenario(&client).await.unwrap();
    assert_eq!(scenario.subject, "Updated holiday schedule");
    assert!(!scenario.is_phishing);
}

#[tokio::test]
async fn test_geo_lookup_consumes_expected_fields() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/json/203.0.113.9")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "status": "success",
                "lat": 52.37,
                "lon": 4.89,
                "city": "Amsterdam",
                "countryCode": "NL",
                "org": "Example BV"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let geo = GeoClient::new(&GeoConfig {
        base_url: server.url(),
        timeout_seconds: 5,
    })
    .unwrap();

    let location = geo.lookup("203.0.113.9").await.unwrap();
    assert_eq!(location.lat, 52.37);
    assert_eq!(location.lon, 4.89);
    assert_eq!(location.city, "Amsterdam");
    assert_eq!(location.country_code, "NL");
    assert_eq!(location.org, "Example BV");
}

#[tokio::test]
async fn test_geo_lookup_fail_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/json/not-an-ip")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "status": "fail", "message": "invalid query" }).to_string())
        .create_async()
        .await;

    let geo = GeoClient::new(&GeoConfig {
        base_url: server.url(),
        timeout_seconds: 5,
    })
    .unwrap();

    assert!(matches!(
        geo.lookup("not-an-ip").await,
        Err(TriageError::Geo(_))
    ));
}

// Geolocation failure must not prevent the analyst view from rendering;
// only the map degrades to its default centered/zoomed fallback.
#[tokio::test]
async fn test_geo_failure_degrades_only_the_map() {
    let mut server = mockito::Server::new_async().await;
    let _gemini_mock = server
        .mock("POST", "/models/gemini-2.5-flash:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate_body(&report_json().to_string()))
        .create_async()
        .await;
    let _geo_mock = server
        .mock("GET", "/json/203.0.113.9")
        .with_status(500)
        .create_async()
        .await;

    let mut config = AppConfig::default();
    config.gemini.api_key = "test-key".to_string();
    config.gemini.api_base_url = server.url();
    config.gemini.timeout_seconds = 5;
    config.geo.base_url = server.url();
    let gemini = GeminiClient::new(&config.gemini).unwrap();
    let geo = GeoClient::new(&config.geo).unwrap();
    let app = create_router(config, gemini, geo).unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let artifact = json!({
        "fileName": "mail.eml",
        "mimeType": "text/plain",
        "content": { "kind": "text", "data": "Subject: test" }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/analyze", session_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(artifact.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["report"]["verdict"], "Malicious");
    assert!(body["origin"].is_null());
    assert_eq!(body["map"]["lat"], 20.0);
    assert_eq!(body["map"]["lon"], 0.0);
    assert_eq!(body["map"]["zoom"], 2);

    // The session's view shows the ready report despite the lookup failure.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = body_json(response).await;
    assert_eq!(view["analysis"]["state"], "ready");
}

// ---- HTTP surface ----

fn test_router() -> axum::Router {
    let mut config = AppConfig::default();
    config.gemini.api_key = "test-key".to_string();
    let gemini = GeminiClient::new(&config.gemini).unwrap();
    let geo = GeoClient::new(&config.geo).unwrap();
    create_router(config, gemini, geo).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_credential_presence() {
    let app = test_router();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["credential"]["status"], "ok");
}

#[tokio::test]
async fn test_tile_route_redirects_to_rotated_host() {
    let app = test_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/tiles/3/4/5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert_eq!(location, tile_url(3, 4, 5));
}

#[tokio::test]
async fn test_session_lifecycle_and_gating() {
    let app = test_router();

    // Create a session.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    // A binary artifact delivered as raw text dispatches to nothing; the
    // submission is rejected before any upstream call.
    let artifact = json!({
        "fileName": "invoice.pdf",
        "mimeType": "application/pdf",
        "content": { "kind": "text", "data": "raw bytes" }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/analyze", session_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(artifact.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "missing_input");

    // A guess with no outstanding round is rejected the same way.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/quiz/guess", session_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "guess": true }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The failed submissions left the view in its pre-submission state.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/v1/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["analysis"]["state"], "idle");
    assert_eq!(view["score"], 0);

    // Delete the session; reads now miss.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// A duplicate submission while a flow is in flight is rejected as busy
// without touching the session's state; the two flows gate independently.
#[tokio::test]
async fn test_in_flight_submission_is_rejected_as_busy() {
    let mut config = AppConfig::default();
    config.gemini.api_key = "test-key".to_string();
    let gemini = GeminiClient::new(&config.gemini).unwrap();
    let geo = GeoClient::new(&config.geo).unwrap();

    // Seed a session with both flows already in flight.
    let session_id = Uuid::new_v4();
    let sessions: SessionStore = Arc::new(parking_lot::Mutex::new(HashMap::new()));
    sessions.lock().insert(
        session_id,
        DashboardState::default()
            .apply(Event::AnalysisStarted)
            .apply(Event::RoundStarted),
    );

    let app = create_router_with_state(AppState {
        config,
        gemini: Arc::new(gemini),
        geo: Arc::new(geo),
        sessions: sessions.clone(),
    });

    let artifact = json!({
        "fileName": "mail.eml",
        "mimeType": "text/plain",
        "content": { "kind": "text", "data": "Subject: test" }
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/analyze", session_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(artifact.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "busy");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/quiz/round", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "busy");

    // The rejections left both flows exactly as they were.
    let expected = DashboardState::default()
        .apply(Event::AnalysisStarted)
        .apply(Event::RoundStarted);
    assert_eq!(sessions.lock().get(&session_id), Some(&expected));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/v1/sessions/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let view = body_json(response).await;
    assert_eq!(view["analysis"]["state"], "in_flight");
}

#[tokio::test]
async fn test_view_intents_update_the_state_record() {
    let app = test_router();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let session_id = body_json(response).await["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{}/view", session_id))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "mode": "training", "quizOpen": true }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["mode"], "training");
    assert_eq!(view["quizOpen"], true);
}
