/// ダッシュボード関連のTauriコマンド
use crate::features::auth::session::SessionManager;
use crate::features::dashboard::models::DashboardSummary;
use crate::features::dashboard::service::DashboardService;
use crate::features::subscriptions::models::Subscription;
use crate::shared::inflight::InflightRegistry;
use crate::shared::tasks::{run_cancellable, ViewTaskRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tauri::State;

/// ダッシュボードのタスクが属するビュー名
const VIEW: &str = "dashboard";

/// ダッシュボードサマリーを取得するコマンド
#[tauri::command]
pub async fn fetch_dashboard_summary(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, DashboardService>,
    tasks: State<'_, Arc<ViewTaskRegistry>>,
) -> Result<DashboardSummary, String> {
    let snapshot = session.require()?;
    let cancel = tasks.token_for(VIEW);
    run_cancellable(&cancel, service.summary(&snapshot.token))
        .await
        .map_err(Into::into)
}

/// インストール済みソフトウェアのスキャンを実行するコマンド
///
/// # 戻り値
/// スキャン反映後の最新一覧
#[tauri::command]
pub async fn trigger_scan(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, DashboardService>,
    inflight: State<'_, InflightRegistry>,
    tasks: State<'_, Arc<ViewTaskRegistry>>,
) -> Result<Vec<Subscription>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("dashboard:scan")?;
    let cancel = tasks.token_for(VIEW);
    service
        .trigger_scan(&snapshot.token, &cancel)
        .await
        .map_err(Into::into)
}

/// 支出レポートをCSVとしてエクスポートするコマンド
///
/// # 引数
/// * `destination` - 保存先のファイルパス
///
/// # 戻り値
/// 書き込んだバイト数
#[tauri::command]
pub async fn export_report(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, DashboardService>,
    inflight: State<'_, InflightRegistry>,
    destination: PathBuf,
) -> Result<usize, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("dashboard:export")?;
    service
        .export_report(&snapshot.token, &destination)
        .await
        .map_err(Into::into)
}
