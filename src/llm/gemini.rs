use super::{Citation, GenerateRequest, GenerationOptions, LlmError, StreamChunk};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Model used for the one-shot and streaming analysis surfaces.
pub const ANALYSIS_MODEL: &str = "gemini-2.5-pro";
/// Model used for the chat session.
pub const CHAT_MODEL: &str = "gemini-2.5-flash";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
}

// ── Request wire types ──

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<RequestContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
    include_thoughts: bool,
}

// ── Response wire types ──

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

fn build_request(request: &GenerateRequest, options: &GenerationOptions) -> GeminiRequest {
    let contents = request
        .messages
        .iter()
        .map(|m| RequestContent {
            role: Some(m.role.clone()),
            parts: vec![RequestPart {
                text: m.content.clone(),
            }],
        })
        .collect();

    GeminiRequest {
        contents,
        system_instruction: options.system_instruction.as_ref().map(|text| RequestContent {
            role: None,
            parts: vec![RequestPart { text: text.clone() }],
        }),
        tools: if options.grounding {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        },
        generation_config: options.thinking_budget.map(|budget| GenerationConfig {
            thinking_config: ThinkingConfig {
                thinking_budget: budget,
                include_thoughts: true,
            },
        }),
    }
}

/// Flatten one response payload into a chunk: non-thought part texts become
/// the text delta, thought parts the thinking delta, grounding chunks the
/// citations. A citation missing its title falls back to the URI.
fn chunk_from_response(response: GeminiResponse) -> StreamChunk {
    let mut chunk = StreamChunk::default();
    let Some(candidate) = response.candidates.into_iter().next() else {
        return chunk;
    };

    if let Some(content) = candidate.content {
        let mut text = String::new();
        let mut thought = String::new();
        for part in content.parts {
            let Some(part_text) = part.text else { continue };
            if part.thought {
                thought.push_str(&part_text);
            } else {
                text.push_str(&part_text);
            }
        }
        if !text.is_empty() {
            chunk.text = Some(text);
        }
        if !thought.is_empty() {
            chunk.thought = Some(thought);
        }
    }

    if let Some(metadata) = candidate.grounding_metadata {
        for grounding in metadata.grounding_chunks {
            let Some(web) = grounding.web else { continue };
            let Some(uri) = web.uri else { continue };
            let title = web.title.unwrap_or_else(|| uri.clone());
            chunk.citations.push(Citation { uri, title });
        }
    }

    chunk
}

pub async fn generate(
    config: &GeminiConfig,
    request: &GenerateRequest,
    options: &GenerationOptions,
) -> Result<String, LlmError> {
    let client = Client::new();
    let body = build_request(request, options);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url, request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let data: GeminiResponse = resp.json().await?;
    let chunk = chunk_from_response(data);
    Ok(chunk.text.unwrap_or_default())
}

pub async fn generate_stream(
    config: &GeminiConfig,
    request: &GenerateRequest,
    options: &GenerationOptions,
    mut on_chunk: impl FnMut(StreamChunk) + Send,
) -> Result<String, LlmError> {
    let client = Client::new();
    let body = build_request(request, options);

    let resp = client
        .post(format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            config.base_url, request.model
        ))
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", &config.api_key)
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let text = resp.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            status,
            message: text,
        });
    }

    let mut full_content = String::new();
    let mut stream = resp.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line = buffer[..pos].trim().to_string();
            buffer = buffer[pos + 1..].to_string();

            if let Some(data) = line.strip_prefix("data: ") {
                if let Ok(parsed) = serde_json::from_str::<GeminiResponse>(data) {
                    let chunk = chunk_from_response(parsed);
                    if let Some(text) = &chunk.text {
                        full_content.push_str(text);
                    }
                    on_chunk(chunk);
                }
            }
        }
    }

    Ok(full_content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    fn request(messages: Vec<ChatMessage>) -> GenerateRequest {
        GenerateRequest {
            model: ANALYSIS_MODEL.to_string(),
            messages,
        }
    }

    #[test]
    fn build_request_wires_grounding_and_thinking() {
        let req = request(vec![ChatMessage {
            role: "user".into(),
            content: "hello".into(),
        }]);
        let options = GenerationOptions {
            system_instruction: Some("be brief".into()),
            grounding: true,
            thinking_budget: Some(32768),
        };
        let json = serde_json::to_value(build_request(&req, &options)).unwrap();

        assert!(json["tools"][0]["googleSearch"].is_object());
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            32768
        );
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "be brief"
        );
    }

    #[test]
    fn build_request_omits_optional_blocks() {
        let req = request(vec![ChatMessage {
            role: "user".into(),
            content: "hello".into(),
        }]);
        let json = serde_json::to_value(build_request(&req, &GenerationOptions::default())).unwrap();

        assert!(json.get("tools").is_none());
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn chunk_from_response_splits_text_and_thought() {
        let payload = r###"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "planning the table", "thought": true},
                        {"text": "## Report"}
                    ]
                },
                "groundingMetadata": {
                    "groundingChunks": [
                        {"web": {"uri": "https://example.com/a", "title": "Example"}},
                        {"web": {"uri": "https://example.com/b"}}
                    ]
                }
            }]
        }"###;
        let parsed: GeminiResponse = serde_json::from_str(payload).unwrap();
        let chunk = chunk_from_response(parsed);

        assert_eq!(chunk.text.as_deref(), Some("## Report"));
        assert_eq!(chunk.thought.as_deref(), Some("planning the table"));
        assert_eq!(chunk.citations.len(), 2);
        assert_eq!(chunk.citations[0].title, "Example");
        // Missing title falls back to the URI.
        assert_eq!(chunk.citations[1].title, "https://example.com/b");
    }

    #[test]
    fn chunk_from_response_handles_empty_payload() {
        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        let chunk = chunk_from_response(parsed);
        assert!(chunk.text.is_none());
        assert!(chunk.thought.is_none());
        assert!(chunk.citations.is_empty());
    }
}
