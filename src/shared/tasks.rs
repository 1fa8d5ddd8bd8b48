/// ビュー単位のキャンセル可能タスク管理
///
/// 各ビューの一覧取得はビューのライフタイムに紐づくタスクとして実行され、
/// ビューのアンマウント時に協調的にキャンセルされます。
/// アンマウント後のビューに結果が届くことはありません。
use crate::shared::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// ビュー名とキャンセルトークンの対応表
#[derive(Default)]
pub struct ViewTaskRegistry {
    tokens: Mutex<HashMap<String, CancellationToken>>,
}

impl ViewTaskRegistry {
    /// 新しいレジストリを作成する
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// 指定ビューのキャンセルトークンを取得する（未登録なら作成）
    ///
    /// # 引数
    /// * `view` - ビュー名（例: `inventory`, `requests`, `dashboard`）
    pub fn token_for(&self, view: &str) -> CancellationToken {
        let mut tokens = self
            .tokens
            .lock()
            .expect("タスクレジストリのロック取得に失敗しました");
        tokens
            .entry(view.to_string())
            .or_insert_with(CancellationToken::new)
            .clone()
    }

    /// 指定ビューの実行中タスクをキャンセルする
    ///
    /// ビューのアンマウント時にフロントエンドから呼び出されます。
    pub fn cancel_view(&self, view: &str) {
        let mut tokens = self
            .tokens
            .lock()
            .expect("タスクレジストリのロック取得に失敗しました");
        if let Some(token) = tokens.remove(view) {
            log::debug!("ビューのタスクをキャンセルします: view={view}");
            token.cancel();
        }
    }
}

/// フューチャーをキャンセルトークンと競争させて実行する
///
/// # 引数
/// * `token` - キャンセルトークン
/// * `future` - 実行するフューチャー
///
/// # 戻り値
/// フューチャーの結果、またはキャンセルされた場合は`AppError::Canceled`
pub async fn run_cancellable<F, T>(token: &CancellationToken, future: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tokio::select! {
        _ = token.cancelled() => Err(AppError::Canceled),
        result = future => result,
    }
}

/// 指数バックオフでポーリングする
///
/// 各試行の前に待機し、待機時間は試行ごとに2倍になります。
/// 固定時間の待機ではなく、完了を検出した時点で打ち切ります。
///
/// # 引数
/// * `token` - キャンセルトークン
/// * `initial_delay` - 初回の待機時間
/// * `max_attempts` - 最大試行回数
/// * `poll` - 1回分のポーリング処理（完了したら`Some`を返す）
///
/// # 戻り値
/// 検出した結果、または試行回数を使い切った場合は`None`
pub async fn poll_with_backoff<F, Fut, T>(
    token: &CancellationToken,
    initial_delay: Duration,
    max_attempts: u32,
    mut poll: F,
) -> AppResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let mut delay = initial_delay;

    for attempt in 1..=max_attempts {
        tokio::select! {
            _ = token.cancelled() => return Err(AppError::Canceled),
            _ = tokio::time::sleep(delay) => {}
        }

        log::debug!("ポーリング試行: attempt={attempt}/{max_attempts}");
        if let Some(result) = run_cancellable(token, poll()).await? {
            return Ok(Some(result));
        }

        delay *= 2;
    }

    log::warn!("ポーリングが最大試行回数に達しました: max_attempts={max_attempts}");
    Ok(None)
}
