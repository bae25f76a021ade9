use base64::prelude::*;
use genai_gateway::artifact_store::ArtifactStore;
use genai_gateway::gemini_client::{GeminiClient, GenerationError};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-1.5-flash";
const IMAGE_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new("google-key".to_string(), server.uri(), MODEL.to_string())
}

fn generate_path() -> String {
    format!("/models/{MODEL}:generateContent")
}

#[tokio::test]
async fn test_describe_image_returns_text_and_removes_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .and(header("x-goog-api-key", "google-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "A tabby cat asleep on a windowsill." }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let image = store.write("1700000000000-abcd1234.jpg", IMAGE_BYTES).await.unwrap();

    let text = client(&server)
        .generate_from_image(&store, &image, "Describe this photo")
        .await
        .unwrap();

    assert_eq!(text, "A tabby cat asleep on a windowsill.");
    assert!(!image.exists());
}

#[tokio::test]
async fn test_request_carries_prompt_image_and_fixed_config() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }]
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let image = store.write("upload.png", IMAGE_BYTES).await.unwrap();

    client(&server)
        .generate_from_image(&store, &image, "What is in the picture?")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None, "key must not travel in the URL");
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["text"], "What is in the picture?");
    assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
    assert_eq!(parts[1]["inlineData"]["data"], BASE64_STANDARD.encode(IMAGE_BYTES));

    let config = &body["generationConfig"];
    assert_eq!(config["temperature"].as_f64(), Some(1.0));
    assert!((config["topP"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    assert_eq!(config["topK"], 64);
    assert_eq!(config["maxOutputTokens"], 8192);
    assert_eq!(config["responseMimeType"], "text/plain");
}

#[tokio::test]
async fn test_api_error_still_removes_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let image = store.write("broken.jpg", IMAGE_BYTES).await.unwrap();

    let err = client(&server)
        .generate_from_image(&store, &image, "Describe")
        .await
        .unwrap_err();

    match err {
        GenerationError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "internal");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(!image.exists());
}

#[tokio::test]
async fn test_blocked_prompt_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(generate_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let image = store.write("blocked.jpg", IMAGE_BYTES).await.unwrap();

    let err = client(&server)
        .generate_from_image(&store, &image, "Describe")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::EmptyResponse(Some(ref r)) if r == "SAFETY"));
    assert!(!image.exists());
}

#[tokio::test]
async fn test_missing_input_file_is_read_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());

    let err = client(&server)
        .generate_from_image(&store, &dir.path().join("gone.jpg"), "Describe")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::ReadInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_error_does_not_expose_key() {
    // Nothing listens on port 1
    let client = GeminiClient::new(
        "secret-google-key".to_string(),
        "http://127.0.0.1:1".to_string(),
        MODEL.to_string(),
    );
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    let image = store.write("offline.jpg", IMAGE_BYTES).await.unwrap();

    let err = client
        .generate_from_image(&store, &image, "Describe")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Http(_)));
    let message = err.to_string();
    assert!(!message.contains("secret-google-key"), "{message}");
    assert!(!image.exists());
}
