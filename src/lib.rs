// 機能モジュール構造
pub mod features;
pub mod shared;

use features::auth::service::AuthService;
use features::auth::session::SessionManager;
use features::auth::storage::StoreSessionStorage;
use features::{
    assistant::commands as assistant_commands, assistant::service::AssistantService,
    auth::commands as auth_commands, dashboard::commands as dashboard_commands,
    dashboard::service::DashboardService, invoices::commands as invoice_commands,
    invoices::service::InvoiceService, requests::commands as request_commands,
    requests::service::RequestService, subscriptions::commands as subscription_commands,
    subscriptions::service::SubscriptionService,
};
use log::info;
use shared::api_client::ApiClient;
use shared::config::environment::{initialize_logging_system, load_environment_variables};
use shared::inflight::InflightRegistry;
use shared::tasks::ViewTaskRegistry;
use std::sync::Arc;
use tauri::Manager;

/// ビューのアンマウント時に実行中タスクをキャンセルするコマンド
///
/// # 引数
/// * `view` - ビュー名（例: `subscriptions`, `requests`, `dashboard`）
#[tauri::command]
fn cancel_view_tasks(tasks: tauri::State<'_, Arc<ViewTaskRegistry>>, view: String) {
    tasks.cancel_view(&view);
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_store::Builder::default().build())
        .setup(|app| {
            // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
            load_environment_variables();

            // ログシステムを初期化（.envファイル読み込み後）
            initialize_logging_system();

            info!("アプリケーション初期化を開始します...");

            // セッションストアを初期化し、最初の描画前に一度だけ復元する
            let storage = StoreSessionStorage::new(app.handle().clone());
            let session = Arc::new(SessionManager::new(Box::new(storage)));
            if let Err(e) = session.restore() {
                // 復元失敗は未認証として起動を継続する
                log::error!("セッションの復元に失敗しました: {e}");
            }

            // APIクライアントを初期化し、401/403の一元処理を登録する
            let api = match ApiClient::new() {
                Ok(client) => Arc::new(client),
                Err(e) => {
                    log::error!("APIクライアントの初期化に失敗しました: {e}");
                    return Err(format!("APIクライアントの初期化に失敗しました: {e}").into());
                }
            };
            api.set_auth_observer(session.clone());

            // 各サービスを初期化して管理下に置く
            app.manage(AuthService::new(api.clone(), session.clone()));
            app.manage(SubscriptionService::new(api.clone()));
            app.manage(RequestService::new(api.clone()));
            app.manage(DashboardService::new(api.clone()));
            app.manage(InvoiceService::new(api.clone()));
            app.manage(AssistantService::new(api.clone()));
            app.manage(session);
            app.manage(InflightRegistry::new());
            app.manage(Arc::new(ViewTaskRegistry::new()));

            info!("アプリケーション初期化が完了しました");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // 認証コマンド
            auth_commands::login,
            auth_commands::signup,
            auth_commands::logout,
            auth_commands::get_auth_state,
            auth_commands::check_route_access,
            // サブスクリプションコマンド
            subscription_commands::fetch_subscriptions,
            subscription_commands::create_subscription,
            subscription_commands::update_subscription,
            subscription_commands::delete_subscription,
            // リクエストコマンド
            request_commands::fetch_requests,
            request_commands::create_request,
            request_commands::decide_request,
            // ダッシュボードコマンド
            dashboard_commands::fetch_dashboard_summary,
            dashboard_commands::trigger_scan,
            dashboard_commands::export_report,
            // 請求書コマンド
            invoice_commands::upload_invoice,
            // アシスタントコマンド
            assistant_commands::send_chat_message,
            // タスク管理コマンド
            cancel_view_tasks,
        ])
        .run(tauri::generate_context!())
        .expect("Tauriアプリケーションの実行中にエラーが発生しました");
}
