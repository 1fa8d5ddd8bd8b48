/// 認証関連のTauriコマンド
use crate::features::auth::guard::{evaluate_protected_route, RouteDecision};
use crate::features::auth::models::{AuthState, Role, SignupResponse};
use crate::features::auth::service::AuthService;
use crate::features::auth::session::SessionManager;
use crate::shared::errors::AppError;
use std::sync::Arc;
use tauri::State;

/// ログイン失敗をユーザー向けメッセージに変換する
///
/// 資格情報不一致の場合はサーバーの詳細（「Invalid credentials」など）を
/// そのまま表示します。それ以外は通常の変換に従います。
fn login_failure_message(error: AppError) -> String {
    match error {
        AppError::Authentication(detail) if !detail.is_empty() => detail,
        other => other.into(),
    }
}

/// ログインコマンド
///
/// # 引数
/// * `username` - ユーザー名
/// * `password` - パスワード
///
/// # 戻り値
/// ログイン後の認証状態
#[tauri::command]
pub async fn login(
    auth_service: State<'_, AuthService>,
    session: State<'_, Arc<SessionManager>>,
    username: String,
    password: String,
) -> Result<AuthState, String> {
    auth_service
        .login(&username, &password)
        .await
        .map_err(login_failure_message)?;
    Ok(session.auth_state())
}

/// サインアップコマンド
///
/// # 引数
/// * `username` - ユーザー名
/// * `password` - パスワード
/// * `role` - 希望する役割（"admin" または "employee"）
#[tauri::command]
pub async fn signup(
    auth_service: State<'_, AuthService>,
    username: String,
    password: String,
    role: String,
) -> Result<SignupResponse, String> {
    let role = Role::parse(&role)?;
    auth_service.signup(&username, &password, role).await.map_err(Into::into)
}

/// ログアウトコマンド
#[tauri::command]
pub fn logout(auth_service: State<'_, AuthService>) -> Result<(), String> {
    auth_service.logout().map_err(Into::into)
}

/// 現在の認証状態を取得するコマンド
#[tauri::command]
pub fn get_auth_state(session: State<'_, Arc<SessionManager>>) -> AuthState {
    session.auth_state()
}

/// 保護されたルートへのアクセス可否を判定するコマンド
#[tauri::command]
pub fn check_route_access(session: State<'_, Arc<SessionManager>>) -> RouteDecision {
    let snapshot = session.snapshot();
    evaluate_protected_route(snapshot.as_ref())
}
