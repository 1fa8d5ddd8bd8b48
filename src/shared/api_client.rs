use crate::shared::config::environment::ApiConfig;
/// 汎用APIクライアント
///
/// APIサーバーとの通信を行う汎用的なクライアント。
/// すべてのリソース呼び出し（サブスクリプション、リクエスト、エクスポートなど）が
/// この単一インスタンスを経由します。
use crate::shared::errors::{AppError, AppResult};
use log::{debug, info, warn};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// 認証失敗（401/403）の通知を受け取るオブザーバー
///
/// HTTP層は認証失敗を一箇所で観測し、登録されたオブザーバーに通知します。
/// 各呼び出し元でのアドホックな401処理は行いません。
pub trait AuthFailureObserver: Send + Sync {
    /// 認証失敗を通知する
    ///
    /// # 引数
    /// * `status` - HTTPステータスコード（401または403）
    /// * `endpoint` - 失敗したエンドポイント
    fn on_auth_failure(&self, status: u16, endpoint: &str);
}

/// APIクライアント設定
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ApiClientConfig {
    /// 環境設定からAPIクライアント設定を作成
    pub fn from_env() -> Self {
        let api_config = ApiConfig::from_env();
        Self {
            base_url: api_config.base_url,
            timeout_seconds: api_config.timeout_seconds,
        }
    }
}

/// APIサーバーからのエラーレスポンス（FastAPI形式）
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    detail: String,
}

/// 汎用APIクライアント
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
    auth_observer: RwLock<Option<Arc<dyn AuthFailureObserver>>>,
}

impl ApiClient {
    /// 新しいAPIクライアントを作成
    pub fn new() -> AppResult<Self> {
        let config = ApiClientConfig::from_env();
        Self::new_with_config(config)
    }

    /// 設定を指定してAPIクライアントを作成
    pub fn new_with_config(config: ApiClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self {
            client,
            config,
            auth_observer: RwLock::new(None),
        })
    }

    /// 認証失敗オブザーバーを登録する
    ///
    /// # 引数
    /// * `observer` - 401/403を観測するオブザーバー（通常はセッションストア）
    pub fn set_auth_observer(&self, observer: Arc<dyn AuthFailureObserver>) {
        let mut slot = self
            .auth_observer
            .write()
            .expect("認証オブザーバーのロック取得に失敗しました");
        *slot = Some(observer);
    }

    /// GETリクエストを送信
    pub async fn get<T>(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        debug!("GETリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.get(&url);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        self.parse_json_response(response, "GET", endpoint).await
    }

    /// GETリクエストを送信し、レスポンスボディをバイト列として取得
    ///
    /// CSVエクスポートなど、JSONでないレスポンスに使用します。
    pub async fn get_bytes(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<Vec<u8>> {
        debug!("GETリクエスト送信（バイナリ）: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.get(&url);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response, endpoint).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Network(format!("レスポンス読み取りエラー: {e}")))?;

        info!(
            "GETリクエスト成功（バイナリ）: endpoint={endpoint}, size={}",
            bytes.len()
        );
        Ok(bytes.to_vec())
    }

    /// POSTリクエストを送信
    pub async fn post<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        auth_token: Option<&str>,
    ) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug!("POSTリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.post(&url).json(body);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        self.parse_json_response(response, "POST", endpoint).await
    }

    /// フォームエンコードのPOSTリクエストを送信
    ///
    /// 認証エンドポイント（/token）はJSONではなく
    /// application/x-www-form-urlencoded形式を要求します。
    pub async fn post_form<T>(&self, endpoint: &str, form: &[(&str, &str)]) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        debug!("POSTリクエスト送信（フォーム）: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        self.parse_json_response(response, "POST", endpoint).await
    }

    /// マルチパートのPOSTリクエストを送信（ファイルアップロード）
    ///
    /// # 引数
    /// * `endpoint` - アップロード先エンドポイント
    /// * `file_name` - ファイル名
    /// * `file_data` - ファイルのバイト列
    /// * `auth_token` - 認証トークン
    pub async fn post_multipart(
        &self,
        endpoint: &str,
        file_name: &str,
        file_data: Vec<u8>,
        auth_token: Option<&str>,
    ) -> AppResult<()> {
        info!("マルチパートPOSTリクエスト送信: endpoint={endpoint}, file_name={file_name}");

        let part = reqwest::multipart::Part::bytes(file_data).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.post(&url).multipart(form);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response, endpoint).await);
        }

        info!("マルチパートPOSTリクエスト成功: endpoint={endpoint}");
        Ok(())
    }

    /// PUTリクエストを送信
    pub async fn put<B, T>(
        &self,
        endpoint: &str,
        body: &B,
        auth_token: Option<&str>,
    ) -> AppResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug!("PUTリクエスト送信: endpoint={endpoint}");

        let url = format!("{}{endpoint}", self.config.base_url);
        let mut request = self.client.put(&url).json(body);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        self.parse_json_response(response, "PUT", endpoint).await
    }

    /// DELETEリクエストを送信
    ///
    /// DELETEリクエストは通常レスポンスボディがないため、成功ステータスのみチェックします。
    pub async fn delete(&self, endpoint: &str, auth_token: Option<&str>) -> AppResult<()> {
        let url = format!("{}{endpoint}", self.config.base_url);
        debug!("DELETEリクエスト送信: endpoint={endpoint}, url={url}");

        let mut request = self.client.delete(&url);

        if let Some(token) = auth_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("APIサーバーへの接続に失敗しました: {e}")))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response, endpoint).await);
        }

        info!("DELETEリクエスト成功: endpoint={endpoint}");
        Ok(())
    }

    /// 成功レスポンスをJSONとして解析する
    async fn parse_json_response<T>(
        &self,
        response: Response,
        method: &str,
        endpoint: &str,
    ) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(self.error_from_response(response, endpoint).await);
        }

        let result: T = response
            .json()
            .await
            .map_err(|e| AppError::Network(format!("レスポンス解析エラー: {e}")))?;

        info!("{method}リクエスト成功: endpoint={endpoint}");
        Ok(result)
    }

    /// エラーレスポンスをAppErrorに変換する
    ///
    /// 401/403は登録済みオブザーバーへ通知した上で認証エラーとして伝播します。
    /// リダイレクトやリトライはここでは行いません。
    async fn error_from_response(&self, response: Response, endpoint: &str) -> AppError {
        let status = response.status();
        let status_code = status.as_u16();

        let response_text = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        // FastAPI形式のエラーボディ（{"detail": ...}）の解析を試行
        let detail = serde_json::from_str::<ErrorResponse>(&response_text)
            .map(|e| e.detail)
            .unwrap_or_else(|_| response_text.clone());

        if status_code == 401 || status_code == 403 {
            warn!("認証失敗を検出: status={status_code}, endpoint={endpoint}, detail={detail}");
            self.notify_auth_failure(status_code, endpoint);
            return AppError::Authentication(format!(
                "status={status_code}, endpoint={endpoint}: {detail}"
            ));
        }

        warn!("APIサーバーエラー: status={status_code}, endpoint={endpoint}, detail={detail}");
        AppError::ExternalService(format!("status={status_code}: {detail}"))
    }

    /// 登録済みオブザーバーに認証失敗を通知する
    fn notify_auth_failure(&self, status: u16, endpoint: &str) {
        let observer = self
            .auth_observer
            .read()
            .expect("認証オブザーバーのロック取得に失敗しました")
            .clone();

        if let Some(observer) = observer {
            observer.on_auth_failure(status, endpoint);
        } else {
            debug!("認証オブザーバーが未登録のため通知をスキップしました");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{MockApiServer, MockRoute};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client_for(server: &MockApiServer) -> ApiClient {
        ApiClient::new_with_config(ApiClientConfig {
            base_url: server.base_url(),
            timeout_seconds: 5,
        })
        .expect("テスト用APIクライアントの作成に失敗しました")
    }

    struct RecordingObserver {
        notified: AtomicUsize,
    }

    impl AuthFailureObserver for RecordingObserver {
        fn on_auth_failure(&self, _status: u16, _endpoint: &str) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_get_parses_json_and_sends_bearer_token() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "GET",
            "/subscriptions",
            200,
            r#"[{"id": 1, "name": "Figma", "cost": 12.5, "category": "Design", "renewal_date": "2025-01-01T00:00:00"}]"#,
        )])
        .await;

        let client = client_for(&server);
        let result: Vec<serde_json::Value> = client
            .get("/subscriptions", Some("token-abc"))
            .await
            .expect("GETリクエストが失敗しました");

        assert_eq!(result.len(), 1);
        assert_eq!(result[0]["name"], "Figma");

        let captured = server.captured();
        assert_eq!(
            captured[0].authorization.as_deref(),
            Some("Bearer token-abc")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_notifies_observer_and_maps_to_authentication_error() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "GET",
            "/subscriptions",
            401,
            r#"{"detail": "Invalid token"}"#,
        )])
        .await;

        let client = client_for(&server);
        let observer = Arc::new(RecordingObserver {
            notified: AtomicUsize::new(0),
        });
        client.set_auth_observer(observer.clone());

        let result: AppResult<Vec<serde_json::Value>> =
            client.get("/subscriptions", Some("expired")).await;

        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert_eq!(observer.notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forbidden_notifies_observer() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "PUT",
            "/requests/1/approve",
            403,
            r#"{"detail": "RBAC Enforcement: Admin privileges required."}"#,
        )])
        .await;

        let client = client_for(&server);
        let observer = Arc::new(RecordingObserver {
            notified: AtomicUsize::new(0),
        });
        client.set_auth_observer(observer.clone());

        let result: AppResult<serde_json::Value> = client
            .put("/requests/1/approve", &serde_json::json!({}), Some("t"))
            .await;

        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert_eq!(observer.notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_maps_to_external_service_with_detail() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "GET",
            "/subscriptions",
            500,
            r#"{"detail": "boom"}"#,
        )])
        .await;

        let client = client_for(&server);
        let result: AppResult<Vec<serde_json::Value>> = client.get("/subscriptions", None).await;

        match result {
            Err(AppError::ExternalService(msg)) => assert!(msg.contains("boom")),
            other => panic!("想定外の結果: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_post_form_sends_urlencoded_body() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "POST",
            "/token",
            200,
            r#"{"access_token": "jwt", "token_type": "bearer", "role": "admin"}"#,
        )])
        .await;

        let client = client_for(&server);
        let _: serde_json::Value = client
            .post_form("/token", &[("username", "alice"), ("password", "pw")])
            .await
            .expect("フォームPOSTが失敗しました");

        let captured = server.captured();
        let body = captured[0].body_text();
        assert!(body.contains("username=alice"));
        assert!(body.contains("password=pw"));
        assert!(captured[0]
            .content_type
            .as_deref()
            .unwrap_or_default()
            .contains("application/x-www-form-urlencoded"));
    }

    #[tokio::test]
    async fn test_delete_checks_status_only() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "DELETE",
            "/subscriptions/3",
            200,
            r#"{"message": "Deleted successfully"}"#,
        )])
        .await;

        let client = client_for(&server);
        client
            .delete("/subscriptions/3", Some("t"))
            .await
            .expect("DELETEリクエストが失敗しました");

        assert_eq!(server.request_count(), 1);
    }

    #[tokio::test]
    async fn test_multipart_upload_sends_file_part() {
        let server =
            MockApiServer::start(vec![MockRoute::new("POST", "/upload-invoice", 200, "{}")]).await;

        let client = client_for(&server);
        client
            .post_multipart(
                "/upload-invoice",
                "invoice.pdf",
                b"%PDF-1.4 dummy".to_vec(),
                Some("t"),
            )
            .await
            .expect("マルチパートPOSTが失敗しました");

        let captured = server.captured();
        assert!(captured[0]
            .content_type
            .as_deref()
            .unwrap_or_default()
            .contains("multipart/form-data"));
        assert!(captured[0].body_text().contains("invoice.pdf"));
    }
}
