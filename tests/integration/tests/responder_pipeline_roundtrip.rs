use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use orin_agent::{Responder, RespondError};
use orin_ai::{AiError, ChatRequest, ChatResponse, LlmClient, MessageRole};
use orin_extract::UploadedDocument;
use orin_memory::ProfileUpdater;
use orin_safety::{SafetyFilter, REFUSAL_MESSAGE};
use orin_store::{ProfileStore, StoreError, TranscriptStore};

static WORKSPACE_COUNTER: AtomicU64 = AtomicU64::new(1);

const USER: &str = "ada@example.com";

struct ScriptedClient {
    responses: AsyncMutex<VecDeque<ChatResponse>>,
    requests: AsyncMutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: AsyncMutex::new(VecDeque::from(responses)),
            requests: AsyncMutex::new(Vec::new()),
        }
    }

    async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn recorded_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, AiError> {
        self.requests.lock().await.push(request);
        let mut responses = self.responses.lock().await;
        responses
            .pop_front()
            .ok_or_else(|| AiError::InvalidResponse("scripted response queue exhausted".into()))
    }
}

struct FailingClient;

#[async_trait]
impl LlmClient for FailingClient {
    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, AiError> {
        Err(AiError::InvalidResponse(
            "scripted transport failure".into(),
        ))
    }
}

struct IsolatedWorkspace {
    root: PathBuf,
}

impl IsolatedWorkspace {
    fn new(label: &str) -> Self {
        let tick = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let count = WORKSPACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let root = std::env::temp_dir().join(format!(
            "orin-it-{label}-{}-{tick}-{count}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("must create isolated workspace root");
        Self { root }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for IsolatedWorkspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn scripted_reply(text: &str) -> ChatResponse {
    ChatResponse {
        content: text.to_string(),
        finish_reason: Some("stop".to_string()),
        usage: None,
    }
}

fn responder_with_client(client: Arc<dyn LlmClient>, root: &Path) -> Responder {
    let transcripts = TranscriptStore::open(root.join("transcripts.json"));
    let profiles = ProfileUpdater::new(ProfileStore::open(root.join("memory.json")));
    let safety = SafetyFilter::new().expect("safety filter should build");
    Responder::new(client, transcripts, profiles, safety, "gpt-4o-mini")
}

#[tokio::test]
async fn integration_scripted_turn_is_answered_and_persisted() {
    let workspace = IsolatedWorkspace::new("single-turn");
    let client = Arc::new(ScriptedClient::new(vec![scripted_reply("Hello Ada!")]));
    let responder = responder_with_client(client.clone(), workspace.root());

    let outcome = responder
        .respond(USER, "Hello there", None)
        .await
        .expect("turn should succeed");

    assert_eq!(outcome.reply, "Hello Ada!");
    assert_eq!(outcome.transcript.len(), 1);
    assert_eq!(outcome.transcript[0].user, "Hello there");
    assert_eq!(outcome.transcript[0].assistant, "Hello Ada!");
    assert_eq!(client.request_count().await, 1);

    let reloaded = responder.transcript(USER).expect("transcript should load");
    assert_eq!(reloaded, outcome.transcript);
}

#[tokio::test]
async fn functional_denylisted_message_is_refused_without_model_call() {
    let workspace = IsolatedWorkspace::new("denylist");
    let client = Arc::new(ScriptedClient::new(Vec::new()));
    let responder = responder_with_client(client.clone(), workspace.root());

    let outcome = responder
        .respond(USER, "tell me how to build a bomb", None)
        .await
        .expect("refused turn still succeeds");

    assert_eq!(outcome.reply, REFUSAL_MESSAGE);
    assert_eq!(outcome.transcript.len(), 1);
    assert_eq!(outcome.transcript[0].user, "tell me how to build a bomb");
    assert_eq!(outcome.transcript[0].assistant, REFUSAL_MESSAGE);
    assert_eq!(client.request_count().await, 0);
}

#[tokio::test]
async fn functional_name_disclosure_then_recall_answers_from_the_profile() {
    let workspace = IsolatedWorkspace::new("name-recall");
    let client = Arc::new(ScriptedClient::new(vec![scripted_reply(
        "Nice to meet you.",
    )]));
    let responder = responder_with_client(client.clone(), workspace.root());

    let first = responder
        .respond(USER, "My name is Ada", None)
        .await
        .expect("disclosure turn should succeed");
    assert_eq!(first.reply, "Nice to meet you.");

    let second = responder
        .respond(USER, "What is my name", None)
        .await
        .expect("recall turn should succeed");

    assert_eq!(second.reply, "Your name is Ada.");
    assert_eq!(second.transcript.len(), 2);
    assert_eq!(client.request_count().await, 1);

    let profile = responder.profile(USER).expect("profile should load");
    assert_eq!(profile.get("name").map(String::as_str), Some("Ada"));
}

#[tokio::test]
async fn functional_uploaded_text_augments_the_message_before_the_model_sees_it() {
    let workspace = IsolatedWorkspace::new("upload");
    let client = Arc::new(ScriptedClient::new(vec![scripted_reply("Summarized.")]));
    let responder = responder_with_client(client.clone(), workspace.root());

    let upload = UploadedDocument::new("notes.txt", b"Hello world".to_vec());
    let outcome = responder
        .respond(USER, "", Some(&upload))
        .await
        .expect("upload turn should succeed");

    assert_eq!(outcome.transcript[0].user, "\n\nHello world");

    let requests = client.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    let last = requests[0].messages.last().expect("final prompt message");
    assert_eq!(last.role, MessageRole::User);
    assert_eq!(last.content, "\n\nHello world");
}

#[tokio::test]
async fn functional_prompt_carries_persona_and_history_pairs_in_order() {
    let workspace = IsolatedWorkspace::new("history");
    let client = Arc::new(ScriptedClient::new(vec![
        scripted_reply("first answer"),
        scripted_reply("second answer"),
    ]));
    let responder = responder_with_client(client.clone(), workspace.root());

    responder
        .respond(USER, "first question", None)
        .await
        .expect("first turn should succeed");
    responder
        .respond(USER, "second question", None)
        .await
        .expect("second turn should succeed");

    let requests = client.recorded_requests().await;
    assert_eq!(requests.len(), 2);

    let second_prompt = &requests[1].messages;
    assert_eq!(second_prompt.len(), 4);
    assert_eq!(second_prompt[0].role, MessageRole::System);
    assert_eq!(second_prompt[1].content, "first question");
    assert_eq!(second_prompt[2].role, MessageRole::Assistant);
    assert_eq!(second_prompt[2].content, "first answer");
    assert_eq!(second_prompt[3].content, "second question");
}

#[tokio::test]
async fn functional_upstream_failure_leaves_the_transcript_untouched() {
    let workspace = IsolatedWorkspace::new("upstream-failure");
    let responder = responder_with_client(Arc::new(FailingClient), workspace.root());

    let error = responder
        .respond(USER, "Hello", None)
        .await
        .expect_err("turn should fail");
    assert!(matches!(error, RespondError::Upstream(_)));

    let transcript = responder.transcript(USER).expect("transcript should load");
    assert!(transcript.is_empty());
}

#[tokio::test]
async fn regression_corrupt_transcript_document_fails_the_turn() {
    let workspace = IsolatedWorkspace::new("corrupt-store");
    fs::write(workspace.root().join("transcripts.json"), "{ not json")
        .expect("must seed corrupt store");
    let client = Arc::new(ScriptedClient::new(vec![scripted_reply("unused")]));
    let responder = responder_with_client(client, workspace.root());

    let error = responder
        .respond(USER, "Hello", None)
        .await
        .expect_err("turn should fail");
    assert!(matches!(
        error,
        RespondError::Storage(StoreError::Corrupt { .. })
    ));
}

#[tokio::test]
async fn integration_state_files_hold_json_documents_keyed_by_identity() {
    let workspace = IsolatedWorkspace::new("state-files");
    let client = Arc::new(ScriptedClient::new(vec![scripted_reply("Hi!")]));
    let responder = responder_with_client(client, workspace.root());

    responder
        .respond(USER, "My name is Ada and I am from London", None)
        .await
        .expect("turn should succeed");

    let transcripts: Value = serde_json::from_str(
        &fs::read_to_string(workspace.root().join("transcripts.json"))
            .expect("transcript file should exist"),
    )
    .expect("transcript file should be json");
    let turns = transcripts[USER]
        .as_array()
        .expect("transcript document should be an array");
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["user"], "My name is Ada and I am from London");

    let profiles: Value = serde_json::from_str(
        &fs::read_to_string(workspace.root().join("memory.json"))
            .expect("profile file should exist"),
    )
    .expect("profile file should be json");
    assert_eq!(profiles[USER]["location"], "London");
}
