/// セッション永続化モジュール
///
/// Tauri Storeプラグインを使用して、セッショントークンと認証済み
/// アイデンティティをリロードをまたいで保存・取得します。
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tauri::AppHandle;
use tauri_plugin_store::StoreExt;

/// ストレージのキー定義
pub struct SessionStorageKeys;

impl SessionStorageKeys {
    /// セッショントークンのキー
    pub const SESSION_TOKEN: &'static str = "session_token";
    /// ユーザー名のキー
    pub const USERNAME: &'static str = "username";
    /// 役割のキー
    pub const ROLE: &'static str = "role";
    /// 最終ログイン日時のキー
    pub const LAST_LOGIN: &'static str = "last_login";
}

/// 永続化されるセッション情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    /// セッショントークン
    pub token: String,
    /// ユーザー名
    pub username: String,
    /// 役割（文字列のまま保存し、復元時に解析する）
    pub role: String,
    /// 最終ログイン日時（RFC3339形式）
    pub last_login: String,
}

/// セッション永続化の抽象
///
/// 本体はTauri Storeプラグインに保存しますが、セッションストアを
/// Tauriランタイムなしでテストできるようにトレイトで切り出しています。
pub trait SessionStorage: Send + Sync {
    /// セッション情報を保存する
    fn save(&self, session: &StoredSession) -> Result<(), String>;

    /// セッション情報を読み込む（存在しない場合はNone）
    fn load(&self) -> Result<Option<StoredSession>, String>;

    /// セッション情報をすべて削除する（ログアウト時）
    fn clear(&self) -> Result<(), String>;
}

/// Tauri Storeプラグインによるセッション永続化
#[derive(Clone)]
pub struct StoreSessionStorage {
    /// Tauriアプリハンドル
    app_handle: Arc<AppHandle>,
    /// ストアファイル名
    store_name: String,
}

impl StoreSessionStorage {
    /// 新しいStoreSessionStorageを作成する
    ///
    /// # 引数
    /// * `app_handle` - Tauriアプリハンドル
    pub fn new(app_handle: AppHandle) -> Self {
        Self {
            app_handle: Arc::new(app_handle),
            store_name: "secure.json".to_string(),
        }
    }

    fn store(&self) -> Result<Arc<tauri_plugin_store::Store<tauri::Wry>>, String> {
        self.app_handle
            .store(&self.store_name)
            .map_err(|e| format!("ストアの取得に失敗しました: {e}"))
    }

    fn read_string(
        store: &tauri_plugin_store::Store<tauri::Wry>,
        key: &str,
    ) -> Option<String> {
        store
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }
}

impl SessionStorage for StoreSessionStorage {
    fn save(&self, session: &StoredSession) -> Result<(), String> {
        let store = self.store()?;

        store.set(SessionStorageKeys::SESSION_TOKEN, session.token.clone());
        store.set(SessionStorageKeys::USERNAME, session.username.clone());
        store.set(SessionStorageKeys::ROLE, session.role.clone());
        store.set(SessionStorageKeys::LAST_LOGIN, session.last_login.clone());

        store
            .save()
            .map_err(|e| format!("ストアの保存に失敗しました: {e}"))?;

        log::info!("セッション情報を保存しました: username={}", session.username);
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredSession>, String> {
        let store = self.store()?;

        let token = Self::read_string(&store, SessionStorageKeys::SESSION_TOKEN);
        let username = Self::read_string(&store, SessionStorageKeys::USERNAME);
        let role = Self::read_string(&store, SessionStorageKeys::ROLE);
        let last_login = Self::read_string(&store, SessionStorageKeys::LAST_LOGIN)
            .unwrap_or_default();

        match (token, username, role) {
            (Some(token), Some(username), Some(role)) => Ok(Some(StoredSession {
                token,
                username,
                role,
                last_login,
            })),
            _ => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), String> {
        let store = self.store()?;

        store.delete(SessionStorageKeys::SESSION_TOKEN);
        store.delete(SessionStorageKeys::USERNAME);
        store.delete(SessionStorageKeys::ROLE);
        store.delete(SessionStorageKeys::LAST_LOGIN);

        store
            .save()
            .map_err(|e| format!("ストアの保存に失敗しました: {e}"))?;

        log::info!("セッション情報を削除しました");
        Ok(())
    }
}

/// テスト用のインメモリ実装
#[cfg(test)]
pub struct MemorySessionStorage {
    slot: std::sync::Mutex<Option<StoredSession>>,
    fail_on_save: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemorySessionStorage {
    pub fn new() -> Self {
        Self {
            slot: std::sync::Mutex::new(None),
            fail_on_save: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(session)),
            fail_on_save: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn stored(&self) -> Option<StoredSession> {
        self.slot.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SessionStorage for MemorySessionStorage {
    fn save(&self, session: &StoredSession) -> Result<(), String> {
        if self.fail_on_save.load(std::sync::atomic::Ordering::SeqCst) {
            return Err("保存失敗（テスト用）".to_string());
        }
        *self.slot.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredSession>, String> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<(), String> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
