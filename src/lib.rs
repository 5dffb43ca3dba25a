mod commands;
mod db;
mod llm;
mod prompts;
mod sheets;
mod video;

use commands::chat::ChatState;
use db::Database;
use sheets::SheetsSession;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let app_dir = app.path().app_data_dir()?;
            let database =
                Database::new(&app_dir).expect("Failed to initialize database");
            app.manage(database);
            app.manage(ChatState::new());
            app.manage(SheetsSession::new());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::analyze::analyze_video,
            commands::analyze::get_analysis_history,
            commands::analyze::analyze_company,
            commands::analyze::analyze_brokerage_reports,
            commands::analyze::get_brokerage_description,
            commands::chat::send_chat_message,
            commands::chat::get_chat_messages,
            commands::chat::reset_chat,
            commands::settings::get_settings,
            commands::settings::set_setting,
            commands::settings::delete_setting,
            commands::sheets::get_sheets_status,
            commands::sheets::set_sheets_config,
            commands::sheets::store_sheets_token,
            commands::sheets::list_spreadsheets,
            commands::sheets::export_company_summary,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
