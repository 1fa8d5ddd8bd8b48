/// 請求書アップロードのビジネスロジック
///
/// アップロード後はサーバー側の取り込み処理が非同期に進むため、
/// 一覧が変化するまで指数バックオフでポーリングします。
use crate::features::subscriptions::models::Subscription;
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::tasks::poll_with_backoff;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 取り込み完了を待つポーリングの初回待機時間
const PROCESS_POLL_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// 取り込み完了を待つポーリングの最大試行回数（1秒、2秒、4秒、8秒）
const PROCESS_POLL_MAX_ATTEMPTS: u32 = 4;

/// 請求書サービス
pub struct InvoiceService {
    api: Arc<ApiClient>,
    poll_initial_delay: Duration,
    poll_max_attempts: u32,
}

impl InvoiceService {
    /// 新しいInvoiceServiceを作成する
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            poll_initial_delay: PROCESS_POLL_INITIAL_DELAY,
            poll_max_attempts: PROCESS_POLL_MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    fn with_poll_settings(api: Arc<ApiClient>, delay: Duration, attempts: u32) -> Self {
        Self {
            api,
            poll_initial_delay: delay,
            poll_max_attempts: attempts,
        }
    }

    /// 請求書ファイルをアップロードし、取り込み完了を待つ
    ///
    /// # 引数
    /// * `file_path` - アップロードする請求書ファイルのパス
    /// * `cancel` - キャンセルトークン
    ///
    /// # 戻り値
    /// 取り込み反映後の最新一覧
    pub async fn upload_invoice(
        &self,
        token: &str,
        file_path: &Path,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Subscription>> {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::validation("ファイル名を取得できませんでした"))?
            .to_string();

        let file_data = tokio::fs::read(file_path).await?;
        if file_data.is_empty() {
            return Err(AppError::validation("空のファイルはアップロードできません"));
        }

        let baseline: Vec<Subscription> = self.api.get("/subscriptions", Some(token)).await?;

        log::info!("請求書をアップロードします: file_name={file_name}");
        self.api
            .post_multipart("/upload-invoice", &file_name, file_data, Some(token))
            .await?;

        self.poll_for_processing(token, &baseline, cancel).await
    }

    /// 取り込み結果が一覧に反映されるのを待つ
    ///
    /// 最大試行回数に達した場合は最新の一覧をそのまま返します。
    async fn poll_for_processing(
        &self,
        token: &str,
        baseline: &[Subscription],
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Subscription>> {
        let baseline_ids: HashSet<i64> = baseline.iter().map(|s| s.id).collect();
        let baseline_len = baseline.len();

        let api = Arc::clone(&self.api);
        let owned_token = token.to_string();
        let polled = poll_with_backoff(
            cancel,
            self.poll_initial_delay,
            self.poll_max_attempts,
            move || {
                let api = Arc::clone(&api);
                let token = owned_token.clone();
                let baseline_ids = baseline_ids.clone();
                async move {
                    let latest: Vec<Subscription> = api.get("/subscriptions", Some(&token)).await?;
                    let changed = latest.len() != baseline_len
                        || latest.iter().any(|s| !baseline_ids.contains(&s.id));
                    if changed {
                        Ok(Some(latest))
                    } else {
                        Ok(None)
                    }
                }
            },
        )
        .await?;

        match polled {
            Some(latest) => {
                log::info!("請求書の取り込みを検出しました: count={}", latest.len());
                Ok(latest)
            }
            None => {
                log::warn!("請求書の取り込みを検出できませんでした");
                self.api.get("/subscriptions", Some(token)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::api_client::ApiClientConfig;
    use crate::shared::testing::{MockApiServer, MockRoute};
    use std::io::Write;

    const ONE_ITEM: &str = r#"[{"id": 1, "name": "Figma", "cost": 10.0, "category": "Design", "renewal_date": "2026-04-01"}]"#;
    const TWO_ITEMS: &str = r#"[{"id": 1, "name": "Figma", "cost": 10.0, "category": "Design", "renewal_date": "2026-04-01"}, {"id": 9, "name": "Zoom", "cost": 14.0, "category": "Communication", "renewal_date": "2026-06-01"}]"#;

    fn service_for(server: &MockApiServer) -> InvoiceService {
        let api = Arc::new(
            ApiClient::new_with_config(ApiClientConfig {
                base_url: server.base_url(),
                timeout_seconds: 5,
            })
            .unwrap(),
        );
        InvoiceService::with_poll_settings(api, Duration::from_millis(5), 3)
    }

    fn invoice_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("invoice.pdf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4 dummy invoice").unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_sends_multipart_and_polls_until_processed() {
        let server = MockApiServer::start(vec![
            MockRoute::with_sequence(
                "GET",
                "/subscriptions",
                vec![(200, ONE_ITEM.to_string()), (200, TWO_ITEMS.to_string())],
            ),
            MockRoute::new("POST", "/upload-invoice", 200, r#"{"status": "processing"}"#),
        ])
        .await;
        let service = service_for(&server);
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let latest = service
            .upload_invoice("t", &invoice_file(&dir), &cancel)
            .await
            .unwrap();

        assert_eq!(latest.len(), 2);
        let captured = server.captured();
        let upload = captured
            .iter()
            .find(|r| r.path == "/upload-invoice")
            .unwrap();
        assert!(upload
            .content_type
            .as_deref()
            .unwrap_or_default()
            .contains("multipart/form-data"));
        assert!(upload.body_text().contains("invoice.pdf"));
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file_without_network() {
        let server = MockApiServer::start(vec![]).await;
        let service = service_for(&server);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::File::create(&path).unwrap();
        let cancel = CancellationToken::new();

        let result = service.upload_invoice("t", &path, &cancel).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_returns_latest_list_when_processing_not_detected() {
        let server = MockApiServer::start(vec![
            MockRoute::new("GET", "/subscriptions", 200, ONE_ITEM),
            MockRoute::new("POST", "/upload-invoice", 200, r#"{"status": "processing"}"#),
        ])
        .await;
        let service = service_for(&server);
        let dir = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();

        let latest = service
            .upload_invoice("t", &invoice_file(&dir), &cancel)
            .await
            .unwrap();

        // 変化は検出されなかったが、最新の一覧は返る
        assert_eq!(latest.len(), 1);
    }
}
