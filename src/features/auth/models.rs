use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// ユーザーの役割
///
/// セッションの有効期間中は不変です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 組織管理者（リクエストの承認・却下が可能）
    Admin,
    /// 一般従業員
    Employee,
}

impl Role {
    /// 役割を文字列として取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    /// 文字列から役割を解析する
    ///
    /// # 引数
    /// * `value` - 役割文字列（"admin" または "employee"）
    ///
    /// # 戻り値
    /// 役割、または不明な値の場合はバリデーションエラー
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(AppError::validation(format!("不明な役割です: {other}"))),
        }
    }

    /// 管理者かどうかを判定する
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// セッション情報（認証済みアイデンティティと資格情報）
///
/// セッションはトークンが空でない場合にのみ存在します。
/// プロセス全体で同時に有効なセッションは最大1つです。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// ベアラートークン（不透明な文字列）
    pub token: String,
    /// ユーザー名
    pub username: String,
    /// 役割
    pub role: Role,
}

/// 認証状態（フロントエンドへ公開される読み取り専用ビュー）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    /// ユーザー名
    pub username: Option<String>,
    /// 役割
    pub role: Option<Role>,
    /// 認証済みフラグ
    pub is_authenticated: bool,
    /// ローディング状態（復元完了まではtrue）
    pub is_loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            username: None,
            role: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

/// 認証エンドポイント（/token）のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// アクセストークン
    pub access_token: String,
    /// トークンタイプ（通常は"bearer"）
    pub token_type: String,
    /// サーバーが発行した役割
    pub role: Role,
}

/// サインアップ（/signup）のリクエストボディ
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupRequest {
    /// ユーザー名
    pub username: String,
    /// パスワード
    pub password: String,
}

/// サインアップ（/signup）のレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    /// ユーザーID
    pub id: i64,
    /// ユーザー名
    pub username: String,
    /// 役割
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("employee").unwrap(), Role::Employee);
        assert!(matches!(
            Role::parse("superuser"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, r#""admin""#);

        let role: Role = serde_json::from_str(r#""employee""#).unwrap();
        assert_eq!(role, Role::Employee);
    }

    #[test]
    fn test_default_auth_state_is_loading() {
        let state = AuthState::default();
        assert!(!state.is_authenticated);
        assert!(state.is_loading);
        assert!(state.username.is_none());
    }
}
