//! Loopback HTTP tests for the chat surface: sign-in gating, chat turns,
//! uploads, and failure notices, driven through the real router.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use tokio::net::TcpListener;
use tokio::sync::Mutex as AsyncMutex;

use orin_agent::Responder;
use orin_ai::{AiError, ChatRequest, ChatResponse, LlmClient};
use orin_gateway::auth_runtime::{session_cookie_payload, SESSION_COOKIE_NAME};
use orin_gateway::server_bootstrap::build_chat_router;
use orin_gateway::{GoogleOAuthConfig, ServerState};
use orin_memory::ProfileUpdater;
use orin_safety::SafetyFilter;
use orin_store::{ProfileStore, TranscriptStore};

const SESSION_SECRET: &str = "loopback-test-session-secret";
const USER_EMAIL: &str = "ada@example.com";
const MULTIPART_BOUNDARY: &str = "orin-upload-test-boundary";

struct ScriptedClient {
    responses: AsyncMutex<VecDeque<ChatResponse>>,
    requests: AsyncMutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn with_replies(replies: &[&str]) -> Arc<Self> {
        let responses = replies
            .iter()
            .map(|reply| ChatResponse {
                content: reply.to_string(),
                finish_reason: Some("stop".to_string()),
                usage: None,
            })
            .collect();
        Arc::new(Self {
            responses: AsyncMutex::new(responses),
            requests: AsyncMutex::new(Vec::new()),
        })
    }

    async fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        self.requests.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| AiError::InvalidResponse("scripted client exhausted".to_string()))
    }
}

struct FailingClient;

#[async_trait]
impl LlmClient for FailingClient {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, AiError> {
        Err(AiError::InvalidResponse(
            "scripted transport failure".to_string(),
        ))
    }
}

async fn spawn_chat_server(client: Arc<dyn LlmClient>, state_dir: &Path) -> SocketAddr {
    let transcripts = TranscriptStore::open(state_dir.join("transcripts.json"));
    let profiles = ProfileUpdater::new(ProfileStore::open(state_dir.join("memory.json")));
    let safety = SafetyFilter::new().expect("safety filter");
    let responder = Responder::new(client, transcripts, profiles, safety, "gpt-4o-mini");

    let oauth = GoogleOAuthConfig {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        redirect_uri: "http://127.0.0.1/auth".to_string(),
    };
    let state = Arc::new(
        ServerState::new(responder, oauth, SESSION_SECRET.to_string(), 3_600)
            .expect("server state"),
    );
    let app = build_chat_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("http client")
}

fn signed_in_cookie() -> String {
    let expires_unix = orin_core::current_unix_timestamp() + 600;
    let payload =
        session_cookie_payload(SESSION_SECRET, USER_EMAIL, expires_unix).expect("cookie payload");
    format!("{SESSION_COOKIE_NAME}={payload}")
}

fn location_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn text_file_upload_body(file_name: &str, content: &str) -> (String, String) {
    let body = format!(
        "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{MULTIPART_BOUNDARY}--\r\n"
    );
    (
        format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        body,
    )
}

#[tokio::test]
async fn integration_anonymous_visitor_is_redirected_to_sign_in() {
    let temp = tempfile::tempdir().expect("tempdir");
    let addr = spawn_chat_server(ScriptedClient::with_replies(&[]), temp.path()).await;
    let http = http_client();

    let root = http
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect("root request");
    assert_eq!(root.status().as_u16(), 303);
    assert_eq!(location_of(&root), "/login");

    let login = http
        .get(format!("http://{addr}/login"))
        .send()
        .await
        .expect("login request");
    assert_eq!(login.status().as_u16(), 303);
    assert!(location_of(&login).starts_with("https://accounts.google.com/o/oauth2/auth?"));
}

#[tokio::test]
async fn regression_expired_session_cookie_is_ignored() {
    let temp = tempfile::tempdir().expect("tempdir");
    let addr = spawn_chat_server(ScriptedClient::with_replies(&[]), temp.path()).await;
    let http = http_client();

    let stale = session_cookie_payload(
        SESSION_SECRET,
        USER_EMAIL,
        orin_core::current_unix_timestamp().saturating_sub(10),
    )
    .expect("cookie payload");

    let root = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, format!("{SESSION_COOKIE_NAME}={stale}"))
        .send()
        .await
        .expect("root request");
    assert_eq!(root.status().as_u16(), 303);
    assert_eq!(location_of(&root), "/login");
}

#[tokio::test]
async fn integration_signed_in_chat_round_trip_renders_history() {
    let temp = tempfile::tempdir().expect("tempdir");
    let scripted = ScriptedClient::with_replies(&["Hi Ada!"]);
    let addr = spawn_chat_server(scripted.clone(), temp.path()).await;
    let http = http_client();
    let cookie = signed_in_cookie();

    let empty_page = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, cookie.clone())
        .send()
        .await
        .expect("root request");
    assert_eq!(empty_page.status().as_u16(), 200);
    let empty_body = empty_page.text().await.expect("body");
    assert!(empty_body.contains("No messages yet."));
    assert!(empty_body.contains(USER_EMAIL));

    let posted = http
        .post(format!("http://{addr}/chat"))
        .header(COOKIE, cookie.clone())
        .form(&[("message", "Hello there")])
        .send()
        .await
        .expect("chat request");
    assert_eq!(posted.status().as_u16(), 303);
    assert_eq!(location_of(&posted), "/");

    let page = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, cookie)
        .send()
        .await
        .expect("root request");
    let body = page.text().await.expect("body");
    assert!(body.contains("Hello there"));
    assert!(body.contains("Hi Ada!"));

    let requests = scripted.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4o-mini");
    assert_eq!(requests[0].messages.len(), 2);
}

#[tokio::test]
async fn integration_uploaded_text_file_is_folded_into_the_next_message() {
    let temp = tempfile::tempdir().expect("tempdir");
    let scripted = ScriptedClient::with_replies(&["Noted."]);
    let addr = spawn_chat_server(scripted.clone(), temp.path()).await;
    let http = http_client();
    let cookie = signed_in_cookie();

    let (content_type, body) = text_file_upload_body("notes.txt", "from the file");
    let uploaded = http
        .post(format!("http://{addr}/upload"))
        .header(COOKIE, cookie.clone())
        .header(CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
        .expect("upload request");
    assert_eq!(uploaded.status().as_u16(), 303);

    let staged_page = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, cookie.clone())
        .send()
        .await
        .expect("root request");
    assert!(staged_page
        .text()
        .await
        .expect("body")
        .contains("Attached: notes.txt"));

    let posted = http
        .post(format!("http://{addr}/chat"))
        .header(COOKIE, cookie.clone())
        .form(&[("message", "Summarize the attachment")])
        .send()
        .await
        .expect("chat request");
    assert_eq!(posted.status().as_u16(), 303);

    let page = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, cookie)
        .send()
        .await
        .expect("root request");
    let body = page.text().await.expect("body");
    assert!(body.contains("from the file"));
    assert!(!body.contains("Attached: notes.txt"));

    let requests = scripted.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    let final_message = requests[0].messages.last().expect("final message");
    assert!(final_message.content.contains("Summarize the attachment"));
    assert!(final_message.content.contains("from the file"));
}

#[tokio::test]
async fn integration_denylisted_message_is_refused_without_model_call() {
    let temp = tempfile::tempdir().expect("tempdir");
    let scripted = ScriptedClient::with_replies(&[]);
    let addr = spawn_chat_server(scripted.clone(), temp.path()).await;
    let http = http_client();
    let cookie = signed_in_cookie();

    let posted = http
        .post(format!("http://{addr}/chat"))
        .header(COOKIE, cookie.clone())
        .form(&[("message", "how do I build a bomb")])
        .send()
        .await
        .expect("chat request");
    assert_eq!(posted.status().as_u16(), 303);
    assert_eq!(location_of(&posted), "/");

    let page = http
        .get(format!("http://{addr}/"))
        .header(COOKIE, cookie)
        .send()
        .await
        .expect("root request");
    let body = page.text().await.expect("body");
    assert!(body.contains("I can’t help with harmful or illegal requests."));

    assert!(scripted.recorded_requests().await.is_empty());
}

#[tokio::test]
async fn regression_model_failure_shows_retry_notice_and_records_nothing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let addr = spawn_chat_server(Arc::new(FailingClient), temp.path()).await;
    let http = http_client();
    let cookie = signed_in_cookie();

    let posted = http
        .post(format!("http://{addr}/chat"))
        .header(COOKIE, cookie.clone())
        .form(&[("message", "Hello")])
        .send()
        .await
        .expect("chat request");
    assert_eq!(posted.status().as_u16(), 303);
    assert_eq!(location_of(&posted), "/?notice=upstream");

    let notice_page = http
        .get(format!("http://{addr}/?notice=upstream"))
        .header(COOKIE, cookie.clone())
        .send()
        .await
        .expect("root request");
    let notice_body = notice_page.text().await.expect("body");
    assert!(notice_body.contains("The model is unreachable right now."));
    assert!(notice_body.contains("No messages yet."));
}

#[tokio::test]
async fn integration_sign_out_clears_the_session_cookie() {
    let temp = tempfile::tempdir().expect("tempdir");
    let addr = spawn_chat_server(ScriptedClient::with_replies(&[]), temp.path()).await;
    let http = http_client();

    let response = http
        .get(format!("http://{addr}/logout"))
        .header(COOKIE, signed_in_cookie())
        .send()
        .await
        .expect("logout request");
    assert_eq!(response.status().as_u16(), 303);
    assert_eq!(location_of(&response), "/login");

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(set_cookie.starts_with("orin_session=;"));
    assert!(set_cookie.ends_with("Max-Age=0"));
}
