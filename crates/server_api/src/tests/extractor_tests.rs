use super::*;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn spawn_completion_server(reply: serde_json::Value) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                |State((captured, reply)): State<(Captured, serde_json::Value)>,
                 headers: HeaderMap,
                 Json(body): Json<serde_json::Value>| async move {
                    captured.bodies.lock().await.push(body);
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    captured.auth.lock().await.push(auth);
                    Json(reply)
                },
            ),
        )
        .with_state((captured.clone(), reply));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}/v1"), captured)
}

fn sample_request() -> ContractRequest {
    ContractRequest {
        client_name: "Jane Doe".into(),
        client_email: "jane@example.com".into(),
        payment_amount: "500".into(),
        requirements: "NDA".into(),
        description: "Design work".into(),
    }
}

#[test]
fn prompt_lists_every_field_and_formats_amount() {
    let prompt = requirements_prompt(&sample_request(), 500.0);
    assert!(prompt.starts_with("Extract the requirements for a Solidity smart contract"));
    assert!(prompt.contains("Client Name: Jane Doe\n"));
    assert!(prompt.contains("Client Email: jane@example.com\n"));
    assert!(prompt.contains("Payment Amount: 500.00 ETH\n"));
    assert!(prompt.contains("User Requirements: NDA\n"));
    assert!(prompt.ends_with("Description: Design work"));
}

#[tokio::test]
async fn returns_first_choice_content() {
    let (base_url, captured) = spawn_completion_server(serde_json::json!({
        "choices": [
            { "message": { "role": "assistant", "content": "- sign the NDA" } },
            { "message": { "role": "assistant", "content": "ignored" } }
        ]
    }))
    .await;

    let extractor = ChatCompletionExtractor::new(ChatCompletionConfig {
        base_url: format!("{base_url}/"),
        api_key: "test-key".into(),
        model: "test-model".into(),
    });
    let requirements = extractor
        .extract(&sample_request(), 500.0)
        .await
        .expect("extract");
    assert_eq!(requirements, "- sign the NDA");

    let bodies = captured.bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "test-model");
    assert_eq!(bodies[0]["messages"][0]["role"], "user");
    assert_eq!(captured.auth.lock().await[0], "Bearer test-key");
}

#[tokio::test]
async fn empty_choices_is_an_error() {
    let (base_url, _captured) = spawn_completion_server(serde_json::json!({ "choices": [] })).await;
    let extractor = ChatCompletionExtractor::new(ChatCompletionConfig {
        base_url,
        api_key: "test-key".into(),
        model: "test-model".into(),
    });
    let err = extractor
        .extract(&sample_request(), 0.0)
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn missing_api_key_fails_without_network() {
    let extractor = ChatCompletionExtractor::new(ChatCompletionConfig::default());
    let err = extractor
        .extract(&sample_request(), 0.0)
        .await
        .expect_err("should fail");
    assert!(err.to_string().contains("API key"));
}
