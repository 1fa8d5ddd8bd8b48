/// 認証機能モジュール
///
/// ログイン・サインアップ・セッション管理・ルートガードを提供します。
pub mod commands;
pub mod guard;
pub mod models;
pub mod service;
pub mod session;
pub mod storage;

pub use models::{AuthState, Role, Session};
pub use service::AuthService;
pub use session::SessionManager;
