/// 認証サービス
///
/// ログイン・サインアップ・ログアウトのビジネスロジック。
/// APIサーバーとの通信はApiClient、セッション状態はSessionManagerに委譲します。
use crate::features::auth::models::{Role, SignupRequest, SignupResponse, TokenResponse};
use crate::features::auth::session::SessionManager;
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;

/// 認証サービス
pub struct AuthService {
    api: Arc<ApiClient>,
    session: Arc<SessionManager>,
}

impl AuthService {
    /// 新しいAuthServiceを作成する
    ///
    /// # 引数
    /// * `api` - APIクライアント
    /// * `session` - セッションストア
    pub fn new(api: Arc<ApiClient>, session: Arc<SessionManager>) -> Self {
        Self { api, session }
    }

    /// ログインする
    ///
    /// 資格情報をフォームエンコードで送信し、成功時にセッションを確立します。
    /// 失敗時はセッション状態を一切変更しません。
    ///
    /// # 引数
    /// * `username` - ユーザー名
    /// * `password` - パスワード
    ///
    /// # 戻り値
    /// サーバーが発行した役割
    pub async fn login(&self, username: &str, password: &str) -> AppResult<Role> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "ユーザー名とパスワードを入力してください",
            ));
        }

        log::info!("ログインを開始します: username={username}");

        let response: TokenResponse = self
            .api
            .post_form("/token", &[("username", username), ("password", password)])
            .await
            .map_err(|e| match e {
                // 資格情報不一致はサーバー側で400として返される
                // （ExternalServiceのメッセージは「status=コード: 詳細」形式）
                AppError::ExternalService(msg) if msg.starts_with("status=400") => {
                    let detail = msg
                        .split_once(": ")
                        .map(|(_, detail)| detail.to_string())
                        .unwrap_or(msg);
                    AppError::Authentication(detail)
                }
                other => other,
            })?;

        self.session
            .establish(username, response.role, &response.access_token)?;

        log::info!("ログインに成功しました: username={username}, role={}", response.role.as_str());
        Ok(response.role)
    }

    /// アカウントを登録する
    ///
    /// 登録のみを行い、セッションは確立しません。
    ///
    /// # 引数
    /// * `username` - ユーザー名
    /// * `password` - パスワード
    /// * `role` - 希望する役割
    pub async fn signup(&self, username: &str, password: &str, role: Role) -> AppResult<SignupResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::validation(
                "ユーザー名とパスワードを入力してください",
            ));
        }

        log::info!("サインアップを開始します: username={username}, role={}", role.as_str());

        let body = SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let endpoint = format!("/signup?role={}", role.as_str());
        self.api.post(&endpoint, &body, None).await
    }

    /// ログアウトする
    ///
    /// ネットワーク呼び出しは行わず、ローカルのセッションを破棄するだけです。
    pub fn logout(&self) -> AppResult<()> {
        log::info!("ログアウトします");
        self.session.clear()
    }
}
