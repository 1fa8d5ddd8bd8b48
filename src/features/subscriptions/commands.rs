/// サブスクリプション関連のTauriコマンド
///
/// ディスパッチ時点のセッションスナップショットを使用し、
/// 変更系は実行中ガードで二重送信を防ぎます。
use crate::features::auth::session::SessionManager;
use crate::features::subscriptions::models::{Subscription, SubscriptionForm};
use crate::features::subscriptions::service::SubscriptionService;
use crate::shared::inflight::InflightRegistry;
use crate::shared::tasks::{run_cancellable, ViewTaskRegistry};
use std::sync::Arc;
use tauri::State;

/// 一覧取得タスクが属するビュー名
const VIEW: &str = "subscriptions";

/// サブスクリプション一覧を取得するコマンド
///
/// ビューのアンマウント時にキャンセルされます。
#[tauri::command]
pub async fn fetch_subscriptions(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, SubscriptionService>,
    tasks: State<'_, Arc<ViewTaskRegistry>>,
) -> Result<Vec<Subscription>, String> {
    let snapshot = session.require()?;
    let cancel = tasks.token_for(VIEW);
    run_cancellable(&cancel, service.list(&snapshot.token))
        .await
        .map_err(Into::into)
}

/// サブスクリプションを作成するコマンド
///
/// # 戻り値
/// 作成後に再取得した一覧
#[tauri::command]
pub async fn create_subscription(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, SubscriptionService>,
    inflight: State<'_, InflightRegistry>,
    form: SubscriptionForm,
) -> Result<Vec<Subscription>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("subscriptions:create")?;
    service.create(&snapshot.token, &form).await.map_err(Into::into)
}

/// サブスクリプションを更新するコマンド
#[tauri::command]
pub async fn update_subscription(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, SubscriptionService>,
    inflight: State<'_, InflightRegistry>,
    id: i64,
    form: SubscriptionForm,
) -> Result<Vec<Subscription>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin(&format!("subscriptions:{id}"))?;
    service
        .update(&snapshot.token, id, &form)
        .await
        .map_err(Into::into)
}

/// サブスクリプションを削除するコマンド
///
/// # 引数
/// * `confirmed` - ユーザーが確認ダイアログで削除を承認したかどうか
///
/// # 戻り値
/// 削除後の一覧、または確認されなかった場合は`None`
#[tauri::command]
pub async fn delete_subscription(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, SubscriptionService>,
    inflight: State<'_, InflightRegistry>,
    id: i64,
    confirmed: bool,
) -> Result<Option<Vec<Subscription>>, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin(&format!("subscriptions:{id}"))?;
    service
        .delete(&snapshot.token, id, confirmed)
        .await
        .map_err(Into::into)
}
