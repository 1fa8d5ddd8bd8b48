use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// 従業員リクエストの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// ソフトウェア購入
    Software,
    /// 休暇
    Leave,
    /// 食事
    Food,
    /// 備品・日用品
    Grocery,
}

/// リクエストの状態
///
/// サーバーは先頭大文字（`Pending`など）で返します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// 審査待ち
    Pending,
    /// 承認済み
    Approved,
    /// 却下済み
    Rejected,
}

/// 従業員リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRequest {
    /// リクエストID
    pub id: i64,
    /// 種別
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// 種別ごとの詳細（自由形式のJSONオブジェクト）
    pub details: serde_json::Value,
    /// 状態
    pub status: RequestStatus,
    /// 管理者コメント（却下理由など）
    #[serde(default)]
    pub admin_note: Option<String>,
    /// 申請者のユーザーID
    pub requester_id: i64,
}

/// リクエスト作成の送信ボディ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRequest {
    /// 種別
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// 種別ごとの詳細
    pub details: serde_json::Value,
}

impl NewRequest {
    /// 作成内容を検証する
    ///
    /// 詳細は空でないJSONオブジェクトである必要があります。
    pub fn validate(&self) -> AppResult<()> {
        match self.details.as_object() {
            Some(map) if !map.is_empty() => Ok(()),
            _ => Err(AppError::validation(
                "リクエストの詳細を入力してください",
            )),
        }
    }
}

/// 承認・却下の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// 承認
    Approve,
    /// 却下
    Reject,
}

impl Decision {
    /// エンドポイントのパスセグメントを取得する
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}
