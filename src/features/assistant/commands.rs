/// アシスタント関連のTauriコマンド
use crate::features::assistant::models::ChatResponse;
use crate::features::assistant::service::AssistantService;
use crate::features::auth::session::SessionManager;
use crate::shared::inflight::InflightRegistry;
use std::sync::Arc;
use tauri::State;

/// チャットメッセージを送信するコマンド
///
/// # 引数
/// * `message` - ユーザーの質問
/// * `context` - 画面の文脈（任意）
#[tauri::command]
pub async fn send_chat_message(
    session: State<'_, Arc<SessionManager>>,
    service: State<'_, AssistantService>,
    inflight: State<'_, InflightRegistry>,
    message: String,
    context: Option<String>,
) -> Result<ChatResponse, String> {
    let snapshot = session.require()?;
    let _ticket = inflight.begin("assistant:chat")?;
    service
        .send_message(&snapshot.token, &message, context.as_deref())
        .await
        .map_err(Into::into)
}
