use super::resolve_gemini_config;
use crate::db::models::AnalysisRecord;
use crate::db::Database;
use crate::llm::gemini::{self, GeminiConfig, ANALYSIS_MODEL};
use crate::llm::stream::StreamAccumulator;
use crate::llm::{ChatMessage, GenerateRequest, GenerationOptions};
use crate::prompts;
use crate::video;
use serde::Serialize;
use tauri::{Emitter, State};

/// Extended reasoning budget for the streamed analysis reports.
const ANALYSIS_THINKING_BUDGET: u32 = 32768;

#[derive(Clone, Serialize)]
struct AnalysisStreamEvent {
    surface: String,
    text: String,
    thinking: String,
    done: bool,
}

fn user_request(model: &str, prompt: String) -> GenerateRequest {
    GenerateRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: prompt,
        }],
    }
}

#[tauri::command]
pub async fn analyze_video(
    db: State<'_, Database>,
    video_url: String,
) -> Result<AnalysisRecord, String> {
    if video_url.trim().is_empty() {
        return Err("Please provide a valid YouTube video URL.".into());
    }
    let canonical = video::canonical_video_url(&video_url).ok_or(
        "Invalid YouTube URL format. Please use a valid link (e.g., from the share button or browser address bar).",
    )?;

    let config = resolve_gemini_config(&db)?;
    let request = user_request(ANALYSIS_MODEL, prompts::video_analysis_prompt(&canonical));
    let options = GenerationOptions {
        grounding: true,
        ..Default::default()
    };

    let report = gemini::generate(&config, &request, &options)
        .await
        .map_err(|e| {
            log::error!("video analysis request failed: {}", e);
            "Failed to analyze the video. The model may have been unable to access the content, or the URL is invalid/private. Please try a different URL."
                .to_string()
        })?;

    let record = video::finalize_report(&canonical, &report)?;
    db.append_analysis(&record).map_err(|e| e.to_string())?;
    Ok(record)
}

#[tauri::command]
pub fn get_analysis_history(db: State<'_, Database>) -> Result<Vec<AnalysisRecord>, String> {
    db.load_history().map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn analyze_company(
    app: tauri::AppHandle,
    db: State<'_, Database>,
    company_name: String,
) -> Result<String, String> {
    if company_name.trim().is_empty() {
        return Err("Please enter a company name.".into());
    }
    let config = resolve_gemini_config(&db)?;
    let request = user_request(ANALYSIS_MODEL, prompts::company_analysis_prompt(&company_name));

    stream_analysis(
        &app,
        "company",
        &config,
        &request,
        "Failed to start company analysis stream.",
    )
    .await
}

#[tauri::command]
pub async fn analyze_brokerage_reports(
    app: tauri::AppHandle,
    db: State<'_, Database>,
) -> Result<String, String> {
    let config = resolve_gemini_config(&db)?;
    let request = user_request(ANALYSIS_MODEL, prompts::BROKERAGE_ANALYSIS_PROMPT.to_string());

    stream_analysis(
        &app,
        "brokerage",
        &config,
        &request,
        "Failed to start brokerage reports analysis stream.",
    )
    .await
}

#[tauri::command]
pub fn get_brokerage_description() -> &'static str {
    prompts::BROKERAGE_PROMPT_DESCRIPTION
}

/// Drive one streamed analysis: fold chunks into the accumulator, emit one
/// snapshot event per chunk that changed something, and settle into the
/// final report text. On failure the partial text stays with the UI; only
/// the error line changes.
async fn stream_analysis(
    app: &tauri::AppHandle,
    surface: &str,
    config: &GeminiConfig,
    request: &GenerateRequest,
    failure_message: &str,
) -> Result<String, String> {
    let options = GenerationOptions {
        grounding: true,
        thinking_budget: Some(ANALYSIS_THINKING_BUDGET),
        ..Default::default()
    };

    let mut acc = StreamAccumulator::new();
    acc.begin();

    let result = gemini::generate_stream(config, request, &options, |chunk| {
        if acc.apply(&chunk) {
            let _ = app.emit(
                "analysis-stream",
                AnalysisStreamEvent {
                    surface: surface.to_string(),
                    text: acc.text().to_string(),
                    thinking: acc.thinking().to_string(),
                    done: false,
                },
            );
        }
    })
    .await;

    match result {
        Ok(_) => {
            let report = acc.settle();
            let _ = app.emit(
                "analysis-stream",
                AnalysisStreamEvent {
                    surface: surface.to_string(),
                    text: report.clone(),
                    thinking: String::new(),
                    done: true,
                },
            );
            Ok(report)
        }
        Err(e) => {
            acc.fail();
            log::error!("{} analysis stream failed: {}", surface, e);
            Err(failure_message.to_string())
        }
    }
}
