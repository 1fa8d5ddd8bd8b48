/// 従業員リクエスト関連のTauriコマンド
use crate::features::auth::session::SessionManager;
use crate::features::requests::models::{Decision, EmployeeRequest, NewRequest};
use crate::features::requests::service::RequestService;
use crate::shared::inflight::InflightRegistry;
use crate::shared::tasks::{run_cancellable, ViewTaskRegistry};
use std::sync::Arc;
use tauri::State;

/// 一覧取得タスクが属するビュー名
const VIEW: &str = "requests";

/// リクエスト一覧を取得するコマンド
#[tauri::command]
pub async fn fetch_requests(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, RequestService>,
    tasks: State<'_, Arc<ViewTaskRegistry>>,
) -> Result<Vec<EmployeeRequest>, String> {
    let snapshot = session.require()?;
    let cancel = tasks.token_for(VIEW);
    run_cancellable(&cancel, service.list(&snapshot.token))
        .await
        .map_err(Into::into)
}

/// リクエストを作成するコマンド
#[tauri::command]
pub async fn create_request(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, RequestService>,
    inflight: State<'_, InflightRegistry>,
    request: NewRequest,
) -> Result<Vec<EmployeeRequest>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("requests:create")?;
    service
        .create(&snapshot.token, &request)
        .await
        .map_err(Into::into)
}

/// リクエストを承認・却下するコマンド
///
/// # 引数
/// * `id` - 対象リクエストのID
/// * `decision` - "approve" または "reject"
/// * `note` - 却下理由（却下時のみ意味を持つ）
#[tauri::command]
pub async fn decide_request(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, RequestService>,
    inflight: State<'_, InflightRegistry>,
    id: i64,
    decision: Decision,
    note: Option<String>,
) -> Result<Vec<EmployeeRequest>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin(&format!("requests:{id}"))?;
    service
        .decide(
            &snapshot.token,
            snapshot.role,
            id,
            decision,
            note.as_deref(),
        )
        .await
        .map_err(Into::into)
}
