pub mod analyze;
pub mod chat;
pub mod settings;
pub mod sheets;

use crate::db::Database;
use crate::llm::gemini::{GeminiConfig, DEFAULT_BASE_URL};

/// Resolve the Gemini transport config from persisted settings.
pub(crate) fn resolve_gemini_config(db: &Database) -> Result<GeminiConfig, String> {
    let api_key = db
        .get_setting("gemini_api_key")
        .ok()
        .flatten()
        .ok_or("Gemini API key not configured")?;
    let base_url = db
        .get_setting("gemini_base_url")
        .ok()
        .flatten()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    Ok(GeminiConfig { api_key, base_url })
}
