use super::resolve_gemini_config;
use crate::db::Database;
use crate::llm::gemini::{self, CHAT_MODEL};
use crate::llm::stream::StreamAccumulator;
use crate::llm::{ChatMessage, Citation, GenerateRequest, GenerationOptions};
use crate::prompts;
use serde::Serialize;
use std::sync::Mutex;
use tauri::{Emitter, State};

const CHAT_GREETING: &str = "Hello! I am Market Mentor AI. Ask me any question about the market, and I will provide a deep, multi-layered analysis connecting macroeconomic trends, sector dynamics, and company fundamentals to give you a comprehensive research perspective.";
const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub id: String,
    pub role: String,
    pub content: String,
    pub sources: Vec<Citation>,
    pub created_at: String,
    // Greeting and apology turns are shown but never replayed as context.
    #[serde(skip)]
    display_only: bool,
}

impl ChatTurn {
    fn new(role: &str, content: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: role.to_string(),
            content: content.to_string(),
            sources: Vec::new(),
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            display_only: false,
        }
    }

    fn reply(id: String, content: &str, sources: Vec<Citation>) -> Self {
        let mut turn = Self::new("model", content);
        turn.id = id;
        turn.sources = sources;
        turn
    }

    fn notice(content: &str) -> Self {
        let mut turn = Self::new("model", content);
        turn.display_only = true;
        turn
    }
}

/// One conversation per app process, seeded with the greeting. Resetting
/// (or restarting) discards prior context; that is accepted, not guarded
/// against.
pub struct ChatState {
    turns: Mutex<Vec<ChatTurn>>,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            turns: Mutex::new(vec![ChatTurn::notice(CHAT_GREETING)]),
        }
    }

    fn snapshot(&self) -> Vec<ChatTurn> {
        self.turns.lock().unwrap().clone()
    }

    fn push(&self, turn: ChatTurn) {
        self.turns.lock().unwrap().push(turn);
    }

    fn reset(&self) {
        *self.turns.lock().unwrap() = vec![ChatTurn::notice(CHAT_GREETING)];
    }

    /// Prior turns replayed as request context.
    fn context(&self) -> Vec<ChatMessage> {
        self.turns
            .lock()
            .unwrap()
            .iter()
            .filter(|turn| !turn.display_only)
            .map(|turn| ChatMessage {
                role: turn.role.clone(),
                content: turn.content.clone(),
            })
            .collect()
    }
}

impl Default for ChatState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Serialize)]
struct ChatStreamEvent {
    message_id: String,
    content: String,
    sources: Vec<Citation>,
    done: bool,
}

#[tauri::command]
pub async fn send_chat_message(
    app: tauri::AppHandle,
    db: State<'_, Database>,
    chat: State<'_, ChatState>,
    content: String,
) -> Result<ChatTurn, String> {
    if content.trim().is_empty() {
        return Err("Message cannot be empty.".into());
    }
    let config = resolve_gemini_config(&db)?;

    chat.push(ChatTurn::new("user", &content));
    let request = GenerateRequest {
        model: CHAT_MODEL.to_string(),
        messages: chat.context(),
    };
    let options = GenerationOptions {
        system_instruction: Some(prompts::CHAT_SYSTEM_INSTRUCTION.to_string()),
        grounding: true,
        thinking_budget: None,
    };

    let reply_id = uuid::Uuid::new_v4().to_string();
    let mut acc = StreamAccumulator::new();
    acc.begin();

    let result = gemini::generate_stream(&config, &request, &options, |chunk| {
        if acc.apply(&chunk) {
            let _ = app.emit(
                "chat-stream",
                ChatStreamEvent {
                    message_id: reply_id.clone(),
                    content: acc.text().to_string(),
                    sources: acc.citations().to_vec(),
                    done: false,
                },
            );
        }
    })
    .await;

    match result {
        Ok(_) => {
            let sources = acc.citations().to_vec();
            let content = acc.settle();
            let turn = ChatTurn::reply(reply_id, &content, sources);
            chat.push(turn.clone());
            let _ = app.emit(
                "chat-stream",
                ChatStreamEvent {
                    message_id: turn.id.clone(),
                    content: turn.content.clone(),
                    sources: turn.sources.clone(),
                    done: true,
                },
            );
            Ok(turn)
        }
        Err(e) => {
            acc.fail();
            log::error!("chat stream failed: {}", e);
            // Whatever streamed stays on screen; the apology is its own turn.
            if !acc.text().is_empty() {
                chat.push(ChatTurn::reply(
                    reply_id,
                    acc.text(),
                    acc.citations().to_vec(),
                ));
            }
            let apology = ChatTurn::notice(CHAT_APOLOGY);
            chat.push(apology.clone());
            let _ = app.emit(
                "chat-stream",
                ChatStreamEvent {
                    message_id: apology.id.clone(),
                    content: apology.content.clone(),
                    sources: Vec::new(),
                    done: true,
                },
            );
            Ok(apology)
        }
    }
}

#[tauri::command]
pub fn get_chat_messages(chat: State<'_, ChatState>) -> Vec<ChatTurn> {
    chat.snapshot()
}

#[tauri::command]
pub fn reset_chat(chat: State<'_, ChatState>) -> Vec<ChatTurn> {
    chat.reset();
    chat.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_shows_greeting_but_replays_no_context() {
        let state = ChatState::new();
        let turns = state.snapshot();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, CHAT_GREETING);
        assert!(state.context().is_empty());
    }

    #[test]
    fn context_replays_user_and_model_turns_in_order() {
        let state = ChatState::new();
        state.push(ChatTurn::new("user", "What moved the Nifty today?"));
        state.push(ChatTurn::reply(
            "r1".into(),
            "Banks led the rally.",
            Vec::new(),
        ));
        state.push(ChatTurn::new("user", "Which bank?"));

        let context = state.context();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].role, "user");
        assert_eq!(context[1].role, "model");
        assert_eq!(context[2].content, "Which bank?");
    }

    #[test]
    fn apology_turns_are_excluded_from_context() {
        let state = ChatState::new();
        state.push(ChatTurn::new("user", "hello"));
        state.push(ChatTurn::notice(CHAT_APOLOGY));

        let context = state.context();
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].content, "hello");
    }

    #[test]
    fn reset_discards_prior_turns() {
        let state = ChatState::new();
        state.push(ChatTurn::new("user", "hello"));
        state.reset();
        assert_eq!(state.snapshot().len(), 1);
        assert!(state.context().is_empty());
    }
}
