pub mod client;
pub mod context;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{AssistantClient, AssistantError};
pub use context::build_context;

use crate::core::chat::Role;
use crate::core::note::Note;
use crate::storage::KeyValueStore;
use crate::store::Store;

/// Canned prompts offered as one-click actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    Summarize,
    Brainstorm,
    Generate,
    Schedule,
    Analyze,
}

impl QuickAction {
    pub const ALL: [QuickAction; 5] = [
        Self::Summarize,
        Self::Brainstorm,
        Self::Generate,
        Self::Schedule,
        Self::Analyze,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Brainstorm => "brainstorm",
            Self::Generate => "generate",
            Self::Schedule => "schedule",
            Self::Analyze => "analyze",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == s)
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Summarize => "Summarize my tasks and upcoming priorities.",
            Self::Brainstorm => "Help me brainstorm ideas for my current projects.",
            Self::Generate => "Generate a daily productivity schedule based on my tasks.",
            Self::Schedule => "Help me prioritize and schedule my tasks for optimal productivity.",
            Self::Analyze => "Analyze my task patterns and give insights.",
        }
    }
}

/// Run one chat turn against `store`: record the user message, ask the
/// model with the current task/note context, then record the reply in the
/// transcript and the persisted history.
///
/// Without an API key nothing is recorded. On a failed request an error line
/// goes into the transcript instead and no history entry is written. Callers
/// wanting one request at a time must not start a second turn before this one
/// resolves.
pub async fn chat<S: KeyValueStore>(
    client: &AssistantClient,
    store: &mut Store<S>,
    message: &str,
) -> Result<String, AssistantError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AssistantError::Validation);
    }
    if !client.has_api_key() {
        return Err(AssistantError::Configuration);
    }

    store.push_message(Role::User, message);
    let context = build_context(store.tasks(), store.notes());

    match client.send_chat(message, &context).await {
        Ok(reply) => {
            store.push_message(Role::Assistant, reply.clone());
            if let Err(e) = store.append_history(message, &reply) {
                log::error!("Reply not added to history: {}", e);
            }
            Ok(reply)
        }
        Err(e) => {
            log::error!("Chat failed: {}", e);
            store.push_message(
                Role::Assistant,
                format!("Error: {}. Please check your API key and try again.", e),
            );
            Err(e)
        }
    }
}

/// The message sent when the user asks for a summary of one note.
pub fn summarize_note_prompt(note: &Note) -> String {
    format!("Summarize this note: \"{}\"", note.text)
}

/// Ask the model to summarize the note with `id`. `Ok(None)` if there is no
/// such note.
pub async fn summarize_note<S: KeyValueStore>(
    client: &AssistantClient,
    store: &mut Store<S>,
    id: i64,
) -> Result<Option<String>, AssistantError> {
    let Some(prompt) = store.note(id).map(summarize_note_prompt) else {
        return Ok(None);
    };
    chat(client, store, &prompt).await.map(Some)
}

/// Send the prompt of history entry `id` again as a new turn. `Ok(None)` if
/// there is no such entry.
pub async fn resend_history<S: KeyValueStore>(
    client: &AssistantClient,
    store: &mut Store<S>,
    id: i64,
) -> Result<Option<String>, AssistantError> {
    let Some(prompt) = store.history_entry(id).map(|h| h.prompt.clone()) else {
        return Ok(None);
    };
    chat(client, store, &prompt).await.map(Some)
}
