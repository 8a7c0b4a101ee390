//! Integration tests for the HTTP transport against a mock backend

use greenchoice_cli::api::{normalize, HttpTransport, QuestionRequest, Transport};
use greenchoice_cli::ChatError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_posts_question_without_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/question"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "question": "Is glass recyclable?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "Yes." })))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .post_question(&QuestionRequest::new("Is glass recyclable?", &[]))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_json());
    assert_eq!(normalize(&response).unwrap().output, "Yes.");
}

#[tokio::test]
async fn test_posts_cleaned_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/question"))
        .and(body_json(json!({
            "question": "Which bin?",
            "answers": ["Blue", "Green"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "Green" })))
        .expect(1)
        .mount(&server)
        .await;

    let choices = vec![" Blue ".to_string(), "  ".to_string(), "Green".to_string()];
    let response = transport(&server)
        .post_question(&QuestionRequest::new("Which bin?", &choices))
        .await
        .unwrap();

    assert_eq!(normalize(&response).unwrap().output, "Green");
}

#[tokio::test]
async fn test_plain_text_reply_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/question"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"output\":\"x\"}", "text/plain"))
        .mount(&server)
        .await;

    let response = transport(&server)
        .post_question(&QuestionRequest::new("hi", &[]))
        .await
        .unwrap();

    assert!(!response.is_json());
    assert_eq!(normalize(&response).unwrap().output, "{\"output\":\"x\"}");
}

#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/question"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let response = transport(&server)
        .post_question(&QuestionRequest::new("hi", &[]))
        .await
        .unwrap();

    assert_eq!(response.status, 503);
    assert!(!response.is_success());
    assert_eq!(response.body, "overloaded");
}

#[tokio::test]
async fn test_endpoint_with_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/question"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "output": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = format!("{}/", server.uri());
    let transport = HttpTransport::new(&endpoint, Duration::from_secs(5)).unwrap();
    let response = transport
        .post_question(&QuestionRequest::new("hi", &[]))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_health_reads_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "GreenChoice API running" })),
        )
        .mount(&server)
        .await;

    let message = transport(&server).health().await.unwrap();
    assert_eq!(message, "GreenChoice API running");
}

#[tokio::test]
async fn test_health_reports_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = transport(&server).health().await.unwrap_err();
    assert!(matches!(err, ChatError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let transport = HttpTransport::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    let err = transport
        .post_question(&QuestionRequest::new("hi", &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Network(_)));
}

#[test]
fn test_invalid_endpoint_is_rejected() {
    let err = HttpTransport::new("not a url", Duration::from_secs(1)).unwrap_err();
    assert!(matches!(err, ChatError::Config(_)));
}
