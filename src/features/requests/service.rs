/// 従業員リクエストのビジネスロジック
///
/// 作成・判定の完了後は必ず一覧を再取得します。
use crate::features::auth::models::Role;
use crate::features::requests::models::{Decision, EmployeeRequest, NewRequest};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;

/// リクエストサービス
pub struct RequestService {
    api: Arc<ApiClient>,
}

impl RequestService {
    /// 新しいRequestServiceを作成する
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// リクエスト一覧を取得する
    ///
    /// サーバーが役割に応じて絞り込みます（従業員は自分の分のみ）。
    pub async fn list(&self, token: &str) -> AppResult<Vec<EmployeeRequest>> {
        self.api.get("/requests", Some(token)).await
    }

    /// リクエストを作成する
    ///
    /// 詳細が空の場合はネットワーク呼び出しを行いません。
    ///
    /// # 戻り値
    /// 再取得した最新の一覧
    pub async fn create(
        &self,
        token: &str,
        request: &NewRequest,
    ) -> AppResult<Vec<EmployeeRequest>> {
        request.validate()?;

        log::info!("リクエストを作成します: kind={:?}", request.kind);
        let _: EmployeeRequest = self.api.post("/requests", request, Some(token)).await?;

        self.list(token).await
    }

    /// リクエストを承認または却下する
    ///
    /// 管理者のみ実行可能です。却下時のコメントはクエリパラメータで送信され、
    /// 未指定の場合は空文字列になります。判定の成否にかかわらず一覧を再取得し、
    /// サーバー側の最新状態を反映します。
    ///
    /// # 引数
    /// * `role` - 実行者の役割
    /// * `id` - 対象リクエストのID
    /// * `decision` - 承認または却下
    /// * `note` - 却下理由（却下時のみ意味を持つ）
    ///
    /// # 戻り値
    /// 再取得した最新の一覧
    pub async fn decide(
        &self,
        token: &str,
        role: Role,
        id: i64,
        decision: Decision,
        note: Option<&str>,
    ) -> AppResult<Vec<EmployeeRequest>> {
        if !role.is_admin() {
            return Err(AppError::authentication(
                "この操作には管理者権限が必要です",
            ));
        }

        let endpoint = match decision {
            Decision::Approve => format!("/requests/{id}/approve"),
            Decision::Reject => {
                let note = urlencoding::encode(note.unwrap_or_default()).into_owned();
                format!("/requests/{id}/reject?note={note}")
            }
        };

        log::info!(
            "リクエストを判定します: id={id}, decision={}",
            decision.as_path_segment()
        );

        // 判定エンドポイントはメッセージのみを返すため、ボディは読み捨てて
        // 再取得した一覧を正とする
        let outcome: AppResult<serde_json::Value> = self
            .api
            .put(&endpoint, &serde_json::json!({}), Some(token))
            .await;

        // 判定が失敗してもサーバー側の状態を取り直す
        let refreshed = self.list(token).await;

        match outcome {
            Ok(_) => refreshed,
            Err(e) => {
                log::warn!("リクエスト判定に失敗しました: id={id}, error={e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::requests::models::RequestKind;
    use crate::shared::api_client::ApiClientConfig;
    use crate::shared::testing::{MockApiServer, MockRoute};
    use serde_json::json;

    const LIST_BODY: &str = r#"[{"id": 1, "type": "leave", "details": {"days": 2}, "status": "Pending", "admin_note": null, "requester_id": 5}]"#;

    fn service_for(server: &MockApiServer) -> RequestService {
        let api = Arc::new(
            ApiClient::new_with_config(ApiClientConfig {
                base_url: server.base_url(),
                timeout_seconds: 5,
            })
            .unwrap(),
        );
        RequestService::new(api)
    }

    #[tokio::test]
    async fn test_create_posts_then_refetches() {
        let server = MockApiServer::start(vec![
            MockRoute::new(
                "POST",
                "/requests",
                200,
                r#"{"id": 2, "type": "food", "details": {"item": "bento"}, "status": "Pending", "admin_note": null, "requester_id": 5}"#,
            ),
            MockRoute::new("GET", "/requests", 200, LIST_BODY),
        ])
        .await;
        let service = service_for(&server);

        let request = NewRequest {
            kind: RequestKind::Food,
            details: json!({"item": "bento"}),
        };
        let list = service.create("t", &request).await.unwrap();

        assert_eq!(list.len(), 1);
        let captured = server.captured();
        assert_eq!(captured[0].method, "POST");
        assert!(captured[0].body_text().contains("\"type\":\"food\""));
    }

    #[tokio::test]
    async fn test_create_with_empty_details_skips_network() {
        let server = MockApiServer::start(vec![]).await;
        let service = service_for(&server);

        let request = NewRequest {
            kind: RequestKind::Food,
            details: json!({}),
        };
        let result = service.create("t", &request).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_approve_puts_to_approve_endpoint() {
        let server = MockApiServer::start(vec![
            MockRoute::new(
                "PUT",
                "/requests/1/approve",
                200,
                r#"{"message": "Request approved successfully"}"#,
            ),
            MockRoute::new("GET", "/requests", 200, LIST_BODY),
        ])
        .await;
        let service = service_for(&server);

        service
            .decide("t", Role::Admin, 1, Decision::Approve, None)
            .await
            .unwrap();

        let captured = server.captured();
        assert_eq!(captured[0].path, "/requests/1/approve");
        assert!(captured[0].query.is_none());
    }

    #[tokio::test]
    async fn test_reject_sends_encoded_note_as_query() {
        let server = MockApiServer::start(vec![
            MockRoute::new(
                "PUT",
                "/requests/1/reject",
                200,
                r#"{"message": "Request rejected"}"#,
            ),
            MockRoute::new("GET", "/requests", 200, LIST_BODY),
        ])
        .await;
        let service = service_for(&server);

        service
            .decide("t", Role::Admin, 1, Decision::Reject, Some("budget limits"))
            .await
            .unwrap();

        let captured = server.captured();
        assert_eq!(captured[0].path, "/requests/1/reject");
        assert_eq!(captured[0].query.as_deref(), Some("note=budget%20limits"));
    }

    #[tokio::test]
    async fn test_reject_without_note_sends_empty_string() {
        let server = MockApiServer::start(vec![
            MockRoute::new(
                "PUT",
                "/requests/1/reject",
                200,
                r#"{"message": "Request rejected"}"#,
            ),
            MockRoute::new("GET", "/requests", 200, LIST_BODY),
        ])
        .await;
        let service = service_for(&server);

        service
            .decide("t", Role::Admin, 1, Decision::Reject, None)
            .await
            .unwrap();

        let captured = server.captured();
        assert_eq!(captured[0].query.as_deref(), Some("note="));
    }

    #[tokio::test]
    async fn test_non_admin_decision_is_rejected_without_network() {
        let server = MockApiServer::start(vec![]).await;
        let service = service_for(&server);

        let result = service
            .decide("t", Role::Employee, 1, Decision::Approve, None)
            .await;

        assert!(matches!(result, Err(AppError::Authentication(_))));
        assert_eq!(server.request_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_decision_still_refetches_list() {
        let server = MockApiServer::start(vec![
            MockRoute::new(
                "PUT",
                "/requests/1/approve",
                500,
                r#"{"detail": "internal error"}"#,
            ),
            MockRoute::new("GET", "/requests", 200, LIST_BODY),
        ])
        .await;
        let service = service_for(&server);

        let result = service
            .decide("t", Role::Admin, 1, Decision::Approve, None)
            .await;

        assert!(matches!(result, Err(AppError::ExternalService(_))));
        // 失敗時も一覧の再取得が行われている
        let captured = server.captured();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[1].method, "GET");
        assert_eq!(captured[1].path, "/requests");
    }
}
