/// 多重送信ガード
///
/// 同一エンティティに対するミューテーションを同時に1件までに制限します。
/// 実行中のキーに対する2回目の送信は、ネットワーク呼び出しを行わずに
/// 即座に並行処理エラーとなります（ダブルクリックによる二重作成の防止）。
use crate::shared::errors::{AppError, AppResult};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 実行中ミューテーションのレジストリ
#[derive(Default)]
pub struct InflightRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

/// 実行中ミューテーションのチケット
///
/// ドロップ時にレジストリからキーを解放します。
pub struct InflightTicket {
    key: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl InflightRegistry {
    /// 新しいレジストリを作成する
    pub fn new() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// ミューテーションを開始する
    ///
    /// # 引数
    /// * `key` - エンティティキー（例: `subscriptions:create`, `subscriptions:3`）
    ///
    /// # 戻り値
    /// 成功時はチケット、同一キーが実行中の場合は並行処理エラー
    pub fn begin(&self, key: &str) -> AppResult<InflightTicket> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| AppError::concurrency("実行中リストのロック取得に失敗しました"))?;

        if !active.insert(key.to_string()) {
            log::warn!("多重送信を検出しました: key={key}");
            return Err(AppError::concurrency(
                "同じ操作が実行中です。完了をお待ちください",
            ));
        }

        log::debug!("ミューテーション開始: key={key}");
        Ok(InflightTicket {
            key: key.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    /// 指定キーのミューテーションが実行中かどうかを判定する
    pub fn is_inflight(&self, key: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(key))
            .unwrap_or(false)
    }
}

impl Drop for InflightTicket {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.key);
            log::debug!("ミューテーション完了: key={}", self.key);
        }
    }
}
