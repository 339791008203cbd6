use homellm_proxy::{
    client::ProxyClient,
    config::ProxyConfig,
    models::{ActionSlot, FormInput},
    orchestrator::{ActionError, ActionState, ClientState, Orchestrator},
    routes::{router, AppState},
    store::{FileStore, MemoryStore},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D];

/// Runs the proxy on an ephemeral port in front of `upstream`.
async fn spawn_proxy(upstream: &MockServer) -> SocketAddr {
    let config = ProxyConfig { api_base: upstream.uri(), ..ProxyConfig::default() };
    let app = router(AppState::new(&config).unwrap(), &config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn complete_form() -> FormInput {
    FormInput {
        issue_type: "water-quality".into(),
        recipient: "water-utility".into(),
        location: "88 River Rd".into(),
        city: "Flint".into(),
        state: "MI".into(),
        evidence: "Brown water from every tap since March".into(),
        desired_outcome: "Replace the lead service line".into(),
        sender_name: "Jordan Lee".into(),
        sender_email: "jordan@example.com".into(),
        ..FormInput::default()
    }
}

fn orchestrator(proxy: SocketAddr, api_key: &str) -> Orchestrator<ProxyClient, MemoryStore> {
    let mut state = ClientState::hydrate(MemoryStore::new()).unwrap();
    state.set_api_key(api_key).unwrap();
    let mut o = Orchestrator::new(ProxyClient::new(&format!("http://{}", proxy)), state);
    o.form = complete_form();
    o
}

#[tokio::test]
async fn email_with_png_attachment_reaches_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "text": "Dear Sir..." }],
            "usage": { "input_tokens": 10, "output_tokens": 20 }
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    let proxy = spawn_proxy(&upstream).await;

    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("tap.png");
    std::fs::write(&photo, PNG_BYTES).unwrap();

    let mut o = orchestrator(proxy, "sk-ant-validformat");
    assert_eq!(o.attach_files(&[photo]).await.unwrap(), 1);
    assert_eq!(o.slot(ActionSlot::GenerateEmail), &ActionState::Idle);

    o.generate_email().await.unwrap();

    assert_eq!(o.slot(ActionSlot::GenerateEmail), &ActionState::Success);
    assert_eq!(o.generated_email(), Some("Dear Sir..."));
    assert_eq!(o.last_usage().map(|u| (u.input_tokens, u.output_tokens)), Some((10, 20)));

    let requests = upstream.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let content = sent["messages"][0]["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    assert_eq!(content[0]["type"], "image");
    assert_eq!(content[0]["source"]["media_type"], "image/png");
    assert_eq!(content[1]["type"], "text");
    assert!(content[1]["text"].as_str().unwrap().contains("Brown water from every tap since March"));
}

#[tokio::test]
async fn missing_api_key_never_leaves_idle() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&upstream).await;
    let proxy = spawn_proxy(&upstream).await;

    let mut o = orchestrator(proxy, "");
    let err = o.generate_email().await.unwrap_err();

    assert!(matches!(err, ActionError::Validation(_)));
    assert_eq!(o.slot(ActionSlot::GenerateEmail), &ActionState::Idle);
    assert!(o.notice().unwrap().contains("API key"));
    assert_eq!(o.generated_email(), None);
}

#[tokio::test]
async fn upstream_overload_is_relayed_to_the_action() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529).set_body_json(json!({ "error": { "message": "overloaded" } })))
        .expect(1)
        .mount(&upstream)
        .await;
    let proxy = spawn_proxy(&upstream).await;

    let mut o = orchestrator(proxy, "sk-ant-validformat");
    o.generate_email().await.unwrap_err();

    assert_eq!(
        o.slot(ActionSlot::GenerateEmail),
        &ActionState::Failed { message: "overloaded".into(), status: Some(529) }
    );
    assert_eq!(o.notice(), Some("overloaded"));
}

#[tokio::test]
async fn drafts_persist_across_sessions() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [{ "text": "Saved body" }] })))
        .mount(&upstream)
        .await;
    let proxy = spawn_proxy(&upstream).await;
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("homellm.json");

    let draft_id = {
        let mut state = ClientState::hydrate(FileStore::open(&store_path).unwrap()).unwrap();
        state.set_api_key("sk-ant-validformat").unwrap();
        let mut o = Orchestrator::new(ProxyClient::new(&format!("http://{}", proxy)), state);
        o.form = complete_form();
        o.generate_email().await.unwrap();
        o.save_current_draft().unwrap()
    };

    let state = ClientState::hydrate(FileStore::open(&store_path).unwrap()).unwrap();
    assert_eq!(state.api_key(), "sk-ant-validformat");
    let mut o = Orchestrator::new(ProxyClient::new(&format!("http://{}", proxy)), state);
    o.load_draft(&draft_id).unwrap();
    assert_eq!(o.generated_email(), Some("Saved body"));
    assert_eq!(o.form.city, "Flint");
    assert!(o.full_email().unwrap().starts_with("Subject: "));
}
