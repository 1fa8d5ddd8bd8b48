/// 請求書関連のTauriコマンド
use crate::features::auth::session::SessionManager;
use crate::features::invoices::service::InvoiceService;
use crate::features::subscriptions::models::Subscription;
use crate::shared::inflight::InflightRegistry;
use crate::shared::tasks::ViewTaskRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tauri::State;

/// 請求書処理のタスクが属するビュー名
const VIEW: &str = "invoices";

/// 請求書ファイルをアップロードするコマンド
///
/// アップロード後は取り込み完了をポーリングで待ち、最新一覧を返します。
///
/// # 引数
/// * `file_path` - アップロードする請求書ファイルのパス
#[tauri::command]
pub async fn upload_invoice(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, InvoiceService>,
    inflight: State<'_, InflightRegistry>,
    tasks: State<'_, Arc<ViewTaskRegistry>>,
    file_path: PathBuf,
) -> Result<Vec<Subscription>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("invoices:upload")?;
    let cancel = tasks.token_for(VIEW);
    service
        .upload_invoice(&snapshot.token, &file_path, &cancel)
        .await
        .map_err(Into::into)
}
