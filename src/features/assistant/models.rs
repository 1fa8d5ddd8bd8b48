use serde::{Deserialize, Serialize};

/// チャット（/chat）の送信ボディ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// ユーザーの質問
    pub message: String,
    /// 画面の文脈（表示中の一覧の要約など）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// チャット（/chat）のレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// アシスタントの回答
    pub response: String,
}
