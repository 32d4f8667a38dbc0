//! Chat turn orchestration: screening, memory capture, attachment text, and
//! model completion, with every finished turn appended to the transcript.

use std::sync::Arc;

use thiserror::Error;

use orin_ai::{AiError, ChatMessage, ChatRequest, LlmClient};
use orin_extract::{extract_text, UploadedDocument};
use orin_memory::{detect_intent, ProfileUpdater, UserIntent, PROFILE_ATTR_NAME};
use orin_safety::SafetyFilter;
use orin_store::{StoreError, Transcript, TranscriptStore, Turn, UserProfile};

/// System prompt sent ahead of every model-bound conversation.
pub const ASSISTANT_PERSONA: &str = "You are Orin, an intelligent AI assistant.";
/// Model used when the operator does not configure one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
/// Enumerates supported `RespondError` values.
pub enum RespondError {
    #[error("store failure: {0}")]
    Storage(#[from] StoreError),
    #[error("model completion failed: {0}")]
    Upstream(#[from] AiError),
}

#[derive(Debug, Clone, PartialEq)]
/// Public struct `TurnOutcome` used across Orin components.
pub struct TurnOutcome {
    pub reply: String,
    pub transcript: Transcript,
}

/// Public struct `Responder` used across Orin components.
///
/// Owns the per-turn pipeline. A turn is screened against the denylist first,
/// then mined for profile disclosures, then augmented with attachment text,
/// and only after that answered, either from the profile shortcut or by the
/// configured model. Nothing is appended to the transcript when the model
/// call fails, so a retried turn cannot leave a half-written pair behind.
pub struct Responder {
    client: Arc<dyn LlmClient>,
    transcripts: TranscriptStore,
    profiles: ProfileUpdater,
    safety: SafetyFilter,
    model: String,
}

impl Responder {
    pub fn new(
        client: Arc<dyn LlmClient>,
        transcripts: TranscriptStore,
        profiles: ProfileUpdater,
        safety: SafetyFilter,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            transcripts,
            profiles,
            safety,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    /// Runs one chat turn for `identity` and returns the reply plus the
    /// transcript as persisted after the turn.
    pub async fn respond(
        &self,
        identity: &str,
        message: &str,
        upload: Option<&UploadedDocument>,
    ) -> Result<TurnOutcome, RespondError> {
        if let Some(refusal) = self.safety.screen(message) {
            tracing::info!(identity = identity, "message refused by safety filter");
            let transcript = self.transcripts.append(
                identity,
                Turn {
                    user: message.to_string(),
                    assistant: refusal.to_string(),
                },
            )?;
            return Ok(TurnOutcome {
                reply: refusal.to_string(),
                transcript,
            });
        }

        // Disclosures are captured from the raw message, before attachment
        // text is folded in.
        let profile = self.profiles.update(identity, message)?;

        let augmented = match upload {
            Some(document) => format!("{message}\n\n{}", extract_text(document)),
            None => message.to_string(),
        };

        let history = self.transcripts.load(identity)?;

        let reply = match (detect_intent(&augmented), profile.get(PROFILE_ATTR_NAME)) {
            (Some(UserIntent::AskOwnName), Some(name)) => format!("Your name is {name}."),
            _ => {
                let request = ChatRequest {
                    model: self.model.clone(),
                    messages: build_prompt(&history, &augmented),
                };
                let response = self.client.complete(request).await?;
                if let Some(usage) = response.usage.as_ref() {
                    tracing::debug!(
                        total_tokens = usage.total_tokens,
                        "chat completion usage"
                    );
                }
                response.content
            }
        };

        let transcript = self.transcripts.append(
            identity,
            Turn {
                user: augmented,
                assistant: reply.clone(),
            },
        )?;

        Ok(TurnOutcome { reply, transcript })
    }

    /// Loads the persisted transcript for `identity`.
    pub fn transcript(&self, identity: &str) -> Result<Transcript, RespondError> {
        Ok(self.transcripts.load(identity)?)
    }

    /// Loads the remembered profile for `identity`.
    pub fn profile(&self, identity: &str) -> Result<UserProfile, RespondError> {
        Ok(self.profiles.load(identity)?)
    }
}

/// Builds the model prompt: persona, then prior turns as user/assistant
/// pairs in stored order, then the current message.
pub fn build_prompt(history: &[Turn], message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(ASSISTANT_PERSONA));
    for turn in history {
        messages.push(ChatMessage::user(turn.user.as_str()));
        messages.push(ChatMessage::assistant(turn.assistant.as_str()));
    }
    messages.push(ChatMessage::user(message));
    messages
}
