//! Google Sheets export client.
//!
//! Credentials live in the settings table; the OAuth consent flow and the
//! picker UI run in the webview against the vendor SDKs. The backend caches
//! the resulting bearer token, lists spreadsheets for the picker surface,
//! and owns the header-ensure + append logic.

use crate::db::Database;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Scopes the webview consent flow must request.
pub const SHEETS_SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.metadata.readonly";

const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

const CLIENT_ID_KEY: &str = "google_client_id";
const API_KEY_KEY: &str = "google_api_key";

/// Exported rows live on the first sheet; the header occupies this range.
const HEADER_RANGE: &str = "Sheet1!A1:C1";

const APPEND_FALLBACK_MESSAGE: &str = "Failed to write to Google Sheet.";
const LIST_FALLBACK_MESSAGE: &str = "Failed to list spreadsheets from Google Drive.";

#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Google Sheets integration is not configured. Please provide your credentials.")]
    NotConfigured,
    #[error("Client ID and API Key cannot be empty.")]
    EmptyCredentials,
    #[error("Not authorized with Google. Please sign in again.")]
    NotAuthorized,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetsConfig {
    pub client_id: String,
    pub api_key: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpreadsheetInfo {
    pub id: String,
    pub name: String,
}

// ── Credentials ──

pub fn load_config(db: &Database) -> Result<SheetsConfig, SheetsError> {
    let client_id = db.get_setting(CLIENT_ID_KEY).ok().flatten();
    let api_key = db.get_setting(API_KEY_KEY).ok().flatten();
    match (client_id, api_key) {
        (Some(client_id), Some(api_key)) if !client_id.is_empty() && !api_key.is_empty() => {
            Ok(SheetsConfig { client_id, api_key })
        }
        _ => Err(SheetsError::NotConfigured),
    }
}

/// Persist fresh credentials and drop any cached token so the next
/// operation re-authorizes against them.
pub fn set_config(
    db: &Database,
    session: &SheetsSession,
    client_id: &str,
    api_key: &str,
) -> Result<(), SheetsError> {
    let client_id = client_id.trim();
    let api_key = api_key.trim();
    if client_id.is_empty() || api_key.is_empty() {
        return Err(SheetsError::EmptyCredentials);
    }
    db.set_setting(CLIENT_ID_KEY, client_id)?;
    db.set_setting(API_KEY_KEY, api_key)?;
    session.clear();
    Ok(())
}

// ── Token cache ──

struct CachedToken {
    access_token: String,
    expires_at: u64,
}

/// Holds the bearer token minted by the webview consent flow for the
/// lifetime of the app process.
pub struct SheetsSession {
    token: Mutex<Option<CachedToken>>,
}

impl SheetsSession {
    pub fn new() -> Self {
        Self {
            token: Mutex::new(None),
        }
    }

    pub fn store_token(&self, access_token: String, expires_in_secs: u64) {
        let mut cache = self.token.lock().unwrap();
        *cache = Some(CachedToken {
            access_token,
            expires_at: now_secs() + expires_in_secs,
        });
    }

    pub fn clear(&self) {
        let mut cache = self.token.lock().unwrap();
        *cache = None;
    }

    /// The cached token, if present and not within the refresh margin of
    /// its expiry.
    fn access_token(&self) -> Result<String, SheetsError> {
        let cache = self.token.lock().unwrap();
        if let Some(cached) = cache.as_ref() {
            // Treat tokens as stale 60s before expiry.
            if now_secs() + 60 < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }
        Err(SheetsError::NotAuthorized)
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token().is_ok()
    }
}

impl Default for SheetsSession {
    fn default() -> Self {
        Self::new()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// ── Wire types ──

#[derive(Deserialize, Default)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<SpreadsheetInfo>,
}

/// The remote error payload carries `{"error": {"message": ...}}` when the
/// API rejected the call with something actionable.
fn remote_error_message(body: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(body).ok()?;
    parsed["error"]["message"].as_str().map(|s| s.to_string())
}

fn api_error(status: u16, body: &str, fallback: &str) -> SheetsError {
    SheetsError::Api {
        status,
        message: remote_error_message(body).unwrap_or_else(|| fallback.to_string()),
    }
}

fn needs_header(existing: &ValueRange) -> bool {
    existing.values.is_empty()
}

fn header_row() -> Vec<String> {
    ["Company Name", "Date of Analysis", "Summary"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ── Sheets API ──

async fn values_get(
    client: &Client,
    config: &SheetsConfig,
    token: &str,
    spreadsheet_id: &str,
    range: &str,
) -> Result<ValueRange, SheetsError> {
    let resp = client
        .get(format!("{}/{}/values/{}", SHEETS_BASE_URL, spreadsheet_id, range))
        .query(&[("key", config.api_key.as_str())])
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(api_error(status, &body, APPEND_FALLBACK_MESSAGE));
    }

    Ok(resp.json().await?)
}

async fn values_append(
    client: &Client,
    config: &SheetsConfig,
    token: &str,
    spreadsheet_id: &str,
    row: Vec<String>,
) -> Result<(), SheetsError> {
    let resp = client
        .post(format!(
            "{}/{}/values/{}:append",
            SHEETS_BASE_URL, spreadsheet_id, HEADER_RANGE
        ))
        .query(&[
            ("valueInputOption", "USER_ENTERED"),
            ("key", config.api_key.as_str()),
        ])
        .header("Authorization", format!("Bearer {}", token))
        .json(&AppendBody { values: vec![row] })
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(api_error(status, &body, APPEND_FALLBACK_MESSAGE));
    }

    Ok(())
}

/// Append one summary row, inserting the header row first when the sheet
/// has never been written to.
pub async fn append_summary_row(
    db: &Database,
    session: &SheetsSession,
    spreadsheet_id: &str,
    row: Vec<String>,
) -> Result<(), SheetsError> {
    let config = load_config(db)?;
    let token = session.access_token()?;
    let client = Client::new();

    let existing = values_get(&client, &config, &token, spreadsheet_id, HEADER_RANGE).await?;
    if needs_header(&existing) {
        values_append(&client, &config, &token, spreadsheet_id, header_row()).await?;
    }
    values_append(&client, &config, &token, spreadsheet_id, row).await
}

/// Spreadsheets the signed-in user can export to, most recently modified
/// first. The webview renders these as the picker list.
pub async fn list_spreadsheets(
    db: &Database,
    session: &SheetsSession,
) -> Result<Vec<SpreadsheetInfo>, SheetsError> {
    let config = load_config(db)?;
    let token = session.access_token()?;
    let client = Client::new();

    let resp = client
        .get(DRIVE_FILES_URL)
        .query(&[
            ("q", "mimeType='application/vnd.google-apps.spreadsheet'"),
            ("orderBy", "modifiedTime desc"),
            ("fields", "files(id,name)"),
            ("pageSize", "50"),
            ("key", config.api_key.as_str()),
        ])
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(api_error(status, &body, LIST_FALLBACK_MESSAGE));
    }

    let list: FileList = resp.json().await?;
    Ok(list.files)
}

// ── Export row building ──

/// The paragraph under the mandated `### Executive Summary` heading, which
/// the company template requires the model to reproduce exactly.
pub fn extract_executive_summary(report: &str) -> Option<String> {
    let mut lines = report.lines();
    lines.find(|line| line.trim() == "### Executive Summary")?;

    let mut summary = Vec::new();
    for line in lines {
        if line.trim_start().starts_with('#') {
            break;
        }
        if !line.trim().is_empty() {
            summary.push(line.trim());
        }
    }
    if summary.is_empty() {
        None
    } else {
        Some(summary.join(" "))
    }
}

/// Row for the export sheet: company, analysis date, executive summary
/// (whole report as a last resort when the heading is missing).
pub fn build_summary_row(company_name: &str, report: &str) -> Vec<String> {
    let summary = extract_executive_summary(report)
        .unwrap_or_else(|| report.trim().to_string());
    vec![
        company_name.to_string(),
        chrono::Local::now().format("%Y-%m-%d").to_string(),
        summary,
    ]
}
