/// アシスタントチャットのビジネスロジック
use crate::features::assistant::models::{ChatRequest, ChatResponse};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::{AppError, AppResult};
use std::sync::Arc;

/// アシスタントサービス
pub struct AssistantService {
    api: Arc<ApiClient>,
}

impl AssistantService {
    /// 新しいAssistantServiceを作成する
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// チャットメッセージを送信する
    ///
    /// # 引数
    /// * `message` - ユーザーの質問
    /// * `context` - 画面の文脈（任意）
    ///
    /// # 戻り値
    /// アシスタントの回答
    pub async fn send_message(
        &self,
        token: &str,
        message: &str,
        context: Option<&str>,
    ) -> AppResult<ChatResponse> {
        if message.trim().is_empty() {
            return Err(AppError::validation("メッセージを入力してください"));
        }

        let request = ChatRequest {
            message: message.to_string(),
            context: context.map(|c| c.to_string()),
        };

        log::info!("チャットメッセージを送信します");
        self.api.post("/chat", &request, Some(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::api_client::ApiClientConfig;
    use crate::shared::testing::{MockApiServer, MockRoute};

    fn service_for(server: &MockApiServer) -> AssistantService {
        let api = Arc::new(
            ApiClient::new_with_config(ApiClientConfig {
                base_url: server.base_url(),
                timeout_seconds: 5,
            })
            .unwrap(),
        );
        AssistantService::new(api)
    }

    #[tokio::test]
    async fn test_send_message_posts_to_chat() {
        let server = MockApiServer::start(vec![MockRoute::new(
            "POST",
            "/chat",
            200,
            r#"{"response": "合計は30ドルです"}"#,
        )])
        .await;
        let service = service_for(&server);

        let reply = service
            .send_message("t", "今月の支出は？", Some("subscriptions: 2件"))
            .await
            .unwrap();

        assert_eq!(reply.response, "合計は30ドルです");
        let captured = server.captured();
        assert!(captured[0].body_text().contains("subscriptions"));
        assert_eq!(captured[0].authorization.as_deref(), Some("Bearer t"));
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_without_network() {
        let server = MockApiServer::start(vec![]).await;
        let service = service_for(&server);

        let result = service.send_message("t", "   ", None).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(server.request_count(), 0);
    }
}
