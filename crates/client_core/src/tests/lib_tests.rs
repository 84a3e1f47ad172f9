use super::*;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub(crate) content_type: Option<String>,
    pub(crate) body: String,
}

#[derive(Clone, Default)]
pub(crate) struct Captured(Arc<Mutex<Vec<CapturedRequest>>>);

impl Captured {
    pub(crate) async fn requests(&self) -> Vec<CapturedRequest> {
        self.0.lock().await.clone()
    }
}

/// Local stand-in for the contract backend answering every POST with the
/// given status and body.
pub(crate) async fn spawn_contract_server(status: u16, reply: &'static str) -> (String, Captured) {
    let captured = Captured::default();
    let status = StatusCode::from_u16(status).expect("status");
    let app = Router::new()
        .route(
            GENERATE_CONTRACT_ROUTE,
            post(
                move |State(captured): State<Captured>, headers: HeaderMap, body: Bytes| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.0.lock().await.push(CapturedRequest {
                        content_type,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    });
                    (status, reply)
                },
            ),
        )
        .with_state(captured.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), captured)
}

/// A loopback address with nothing listening on it.
pub(crate) async fn unreachable_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}

pub(crate) fn jane() -> ContractRequest {
    ContractRequest {
        client_name: "Jane Doe".into(),
        client_email: "jane@example.com".into(),
        payment_amount: "500".into(),
        requirements: "NDA".into(),
        description: "Design work".into(),
    }
}

#[test]
fn endpoint_resolves_against_server_root() {
    let client = ContractClient::new("http://localhost:8080/app/page").expect("client");
    assert_eq!(
        client.endpoint().as_str(),
        "http://localhost:8080/generate_contract"
    );
}

#[test]
fn rejects_unparseable_server_url() {
    let err = ContractClient::new("not a url").expect_err("should fail");
    assert!(matches!(err, SubmitError::InvalidServerUrl(_)));
}

#[tokio::test]
async fn posts_json_and_returns_body_text() {
    let (server_url, captured) = spawn_contract_server(200, "Contract generated successfully").await;
    let client = ContractClient::new(&server_url).expect("client");

    let text = client.generate_contract(&jane()).await.expect("response");
    assert_eq!(text, "Contract generated successfully");

    let requests = captured.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        requests[0].body,
        r#"{"clientName":"Jane Doe","clientEmail":"jane@example.com","paymentAmount":"500","requirements":"NDA","description":"Design work"}"#
    );
}

#[tokio::test]
async fn error_statuses_still_return_body_text() {
    let (server_url, _captured) = spawn_contract_server(500, "Internal error").await;
    let client = ContractClient::new(&server_url).expect("client");
    let text = client.generate_contract(&jane()).await.expect("response");
    assert_eq!(text, "Internal error");
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let client = ContractClient::new(&unreachable_server_url().await).expect("client");
    let err = client
        .generate_contract(&jane())
        .await
        .expect_err("should fail");
    assert!(matches!(err, SubmitError::Transport(_)));
}
