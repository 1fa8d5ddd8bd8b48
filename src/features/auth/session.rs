/// セッションストア
///
/// プロセス全体で単一のセッションを保持し、ログイン・ログアウト・復元を
/// 一元管理します。各リソース呼び出しはディスパッチ時点のスナップショットを
/// 読み取るため、処理中のログイン・ログアウトと競合しません。
use crate::features::auth::models::{AuthState, Role, Session};
use crate::features::auth::storage::{SessionStorage, StoredSession};
use crate::shared::api_client::AuthFailureObserver;
use crate::shared::errors::{AppError, AppResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// プロセス全体のセッション管理
pub struct SessionManager {
    /// 現在のセッション（最大1つ）
    session: RwLock<Option<Session>>,
    /// 復元が完了したかどうか
    restored: AtomicBool,
    /// 永続ストレージ
    storage: Box<dyn SessionStorage>,
}

impl SessionManager {
    /// 新しいSessionManagerを作成する
    ///
    /// # 引数
    /// * `storage` - セッション永続化の実装
    pub fn new(storage: Box<dyn SessionStorage>) -> Self {
        Self {
            session: RwLock::new(None),
            restored: AtomicBool::new(false),
            storage,
        }
    }

    /// 永続ストレージからセッションを復元する
    ///
    /// アプリケーション起動時、最初の描画より前に一度だけ同期的に実行します。
    /// トークンが保存されていればセッションを有効化し、なければ未認証とします。
    ///
    /// # 戻り値
    /// 処理結果
    pub fn restore(&self) -> AppResult<()> {
        if self.restored.swap(true, Ordering::SeqCst) {
            log::warn!("セッション復元は既に実行済みです");
            return Ok(());
        }

        let stored = self
            .storage
            .load()
            .map_err(AppError::storage)?;

        let Some(stored) = stored else {
            log::info!("保存されたセッションはありません");
            return Ok(());
        };

        // セッションはトークンが空でない場合にのみ存在する
        if stored.token.is_empty() {
            log::warn!("空のトークンが保存されていたため破棄します");
            self.storage.clear().map_err(AppError::storage)?;
            return Ok(());
        }

        let role = match Role::parse(&stored.role) {
            Ok(role) => role,
            Err(_) => {
                // 解析できない役割は破損データとして扱い、セッションを確立しない
                log::warn!("保存された役割が不正のため破棄します: role={}", stored.role);
                self.storage.clear().map_err(AppError::storage)?;
                return Ok(());
            }
        };

        let session = Session {
            token: stored.token,
            username: stored.username,
            role,
        };

        let mut slot = self
            .session
            .write()
            .map_err(|_| AppError::concurrency("セッションのロック取得に失敗しました"))?;
        *slot = Some(session);

        log::info!("セッションを復元しました");
        Ok(())
    }

    /// 新しいセッションを確立する
    ///
    /// 永続化に成功した場合のみセッションを公開します。
    /// 失敗した場合は状態を一切変更しません。
    ///
    /// # 引数
    /// * `username` - ユーザー名
    /// * `role` - サーバーが発行した役割
    /// * `token` - ベアラートークン
    pub fn establish(&self, username: &str, role: Role, token: &str) -> AppResult<()> {
        if token.is_empty() {
            return Err(AppError::authentication(
                "サーバーから空のトークンが返されました",
            ));
        }

        let stored = StoredSession {
            token: token.to_string(),
            username: username.to_string(),
            role: role.as_str().to_string(),
            last_login: chrono::Utc::now().to_rfc3339(),
        };

        // 先に永続化してから公開する
        self.storage.save(&stored).map_err(AppError::storage)?;

        let mut slot = self
            .session
            .write()
            .map_err(|_| AppError::concurrency("セッションのロック取得に失敗しました"))?;

        if let Some(previous) = slot.as_ref() {
            log::warn!(
                "既存のセッションを置き換えます: previous={}, next={username}",
                previous.username
            );
        }

        *slot = Some(Session {
            token: token.to_string(),
            username: username.to_string(),
            role,
        });

        log::info!("セッションを確立しました: username={username}, role={}", role.as_str());
        Ok(())
    }

    /// セッションを破棄する（ログアウト）
    ///
    /// 永続ストレージを削除し、「セッションなし」を公開します。
    /// ネットワーク呼び出しは行いません。冪等です。
    pub fn clear(&self) -> AppResult<()> {
        self.storage.clear().map_err(AppError::storage)?;

        let mut slot = self
            .session
            .write()
            .map_err(|_| AppError::concurrency("セッションのロック取得に失敗しました"))?;
        *slot = None;

        log::info!("セッションを破棄しました");
        Ok(())
    }

    /// 現在のセッションの不変スナップショットを取得する
    ///
    /// リソース呼び出しはこのスナップショットをディスパッチ時に読み取ります。
    pub fn snapshot(&self) -> Option<Session> {
        self.session
            .read()
            .ok()
            .and_then(|slot| slot.clone())
    }

    /// 認証済みかどうかを判定する
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_some()
    }

    /// セッションのスナップショットを取得する（未認証ならエラー）
    ///
    /// 保護されたリソース呼び出しのディスパッチ時に使用します。
    pub fn require(&self) -> AppResult<Session> {
        self.snapshot()
            .ok_or_else(|| AppError::authentication("ログインが必要です"))
    }

    /// フロントエンド向けの認証状態を取得する
    pub fn auth_state(&self) -> AuthState {
        let session = self.snapshot();
        AuthState {
            username: session.as_ref().map(|s| s.username.clone()),
            role: session.as_ref().map(|s| s.role),
            is_authenticated: session.is_some(),
            is_loading: !self.restored.load(Ordering::SeqCst),
        }
    }
}

impl AuthFailureObserver for SessionManager {
    /// HTTP層で401/403を観測した際の一元的な処理
    ///
    /// 現在のセッションを強制的に破棄し、フロントエンドの次の
    /// ルート評価でログイン画面へ誘導されるようにします。
    fn on_auth_failure(&self, status: u16, endpoint: &str) {
        if !self.is_authenticated() {
            return;
        }

        log::warn!("認証失敗によりセッションを強制破棄します: status={status}, endpoint={endpoint}");

        if let Err(e) = self.clear() {
            log::error!("強制ログアウトに失敗しました: {e}");
        }
    }
}
