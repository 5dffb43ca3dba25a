use crate::db::Database;
use crate::sheets::{self, SheetsSession, SpreadsheetInfo};
use serde::Serialize;
use tauri::State;

#[derive(Serialize)]
pub struct SheetsStatus {
    configured: bool,
    authorized: bool,
    scopes: &'static str,
    client_id: Option<String>,
}

/// Everything the webview needs to drive the consent flow and the picker.
#[tauri::command]
pub fn get_sheets_status(
    db: State<'_, Database>,
    session: State<'_, SheetsSession>,
) -> SheetsStatus {
    let config = sheets::load_config(&db).ok();
    SheetsStatus {
        configured: config.is_some(),
        authorized: session.is_authorized(),
        scopes: sheets::SHEETS_SCOPES,
        client_id: config.map(|c| c.client_id),
    }
}

#[tauri::command]
pub fn set_sheets_config(
    db: State<'_, Database>,
    session: State<'_, SheetsSession>,
    client_id: String,
    api_key: String,
) -> Result<(), String> {
    sheets::set_config(&db, &session, &client_id, &api_key).map_err(|e| e.to_string())
}

/// Cache the bearer token minted by the consent flow in the webview.
#[tauri::command]
pub fn store_sheets_token(
    session: State<'_, SheetsSession>,
    access_token: String,
    expires_in: u64,
) -> Result<(), String> {
    if access_token.is_empty() {
        return Err("Authentication failed: no access token received.".into());
    }
    session.store_token(access_token, expires_in);
    Ok(())
}

#[tauri::command]
pub async fn list_spreadsheets(
    db: State<'_, Database>,
    session: State<'_, SheetsSession>,
) -> Result<Vec<SpreadsheetInfo>, String> {
    sheets::list_spreadsheets(&db, &session).await.map_err(|e| {
        log::error!("listing spreadsheets failed: {}", e);
        e.to_string()
    })
}

#[tauri::command]
pub async fn export_company_summary(
    db: State<'_, Database>,
    session: State<'_, SheetsSession>,
    spreadsheet_id: String,
    company_name: String,
    report: String,
) -> Result<(), String> {
    let row = sheets::build_summary_row(&company_name, &report);
    sheets::append_summary_row(&db, &session, &spreadsheet_id, row)
        .await
        .map_err(|e| {
            log::error!("spreadsheet export failed: {}", e);
            e.to_string()
        })
}
