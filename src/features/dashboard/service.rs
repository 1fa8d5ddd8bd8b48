/// ダッシュボードのビジネスロジック
///
/// 支出の集計・予測、バックグラウンドスキャン、CSVエクスポートを提供します。
use crate::features::dashboard::models::{DashboardSummary, ForecastRow, SpendSummary};
use crate::features::subscriptions::models::Subscription;
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use crate::shared::tasks::poll_with_backoff;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 翌月予測の係数
const FORECAST_FACTOR: f64 = 1.1;

/// スキャン完了を待つポーリングの初回待機時間
const SCAN_POLL_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// スキャン完了を待つポーリングの最大試行回数
const SCAN_POLL_MAX_ATTEMPTS: u32 = 4;

/// ダッシュボードサービス
pub struct DashboardService {
    api: Arc<ApiClient>,
    poll_initial_delay: Duration,
    poll_max_attempts: u32,
}

impl DashboardService {
    /// 新しいDashboardServiceを作成する
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            poll_initial_delay: SCAN_POLL_INITIAL_DELAY,
            poll_max_attempts: SCAN_POLL_MAX_ATTEMPTS,
        }
    }

    #[cfg(test)]
    fn with_poll_settings(api: Arc<ApiClient>, delay: Duration, attempts: u32) -> Self {
        Self {
            api,
            poll_initial_delay: delay,
            poll_max_attempts: attempts,
        }
    }

    /// サブスクリプション一覧からダッシュボードサマリーを計算する
    ///
    /// # 引数
    /// * `token` - 認証トークン
    pub async fn summary(&self, token: &str) -> AppResult<DashboardSummary> {
        let subscriptions: Vec<Subscription> = self.api.get("/subscriptions", Some(token)).await?;
        Ok(build_summary(&subscriptions))
    }

    /// インストール済みソフトウェアのスキャンを実行する
    ///
    /// スキャンを起動した後、一覧が変化するまで指数バックオフでポーリングします。
    /// 固定時間の待機は行いません。
    ///
    /// # 引数
    /// * `cancel` - キャンセルトークン
    ///
    /// # 戻り値
    /// スキャン反映後の最新一覧
    pub async fn trigger_scan(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Subscription>> {
        let baseline: Vec<Subscription> = self.api.get("/subscriptions", Some(token)).await?;

        log::info!("スキャンを開始します");
        let _: serde_json::Value = self
            .api
            .post("/scan", &serde_json::json!({}), Some(token))
            .await?;

        let api = Arc::clone(&self.api);
        let owned_token = token.to_string();
        let polled = poll_with_backoff(
            cancel,
            self.poll_initial_delay,
            self.poll_max_attempts,
            move || {
                let api = Arc::clone(&api);
                let token = owned_token.clone();
                let baseline = baseline.clone();
                async move {
                    let latest: Vec<Subscription> = api.get("/subscriptions", Some(&token)).await?;
                    if lists_differ(&baseline, &latest) {
                        Ok(Some(latest))
                    } else {
                        Ok(None)
                    }
                }
            },
        )
        .await?;

        match polled {
            Some(latest) => {
                log::info!("スキャン結果を検出しました: count={}", latest.len());
                Ok(latest)
            }
            None => {
                // 変化を検出できなくても最新の状態を返す
                log::warn!("スキャンによる変化を検出できませんでした");
                self.api.get("/subscriptions", Some(token)).await
            }
        }
    }

    /// 支出レポートをCSVとしてエクスポートする
    ///
    /// # 引数
    /// * `destination` - 保存先のファイルパス
    ///
    /// # 戻り値
    /// 書き込んだバイト数
    pub async fn export_report(&self, token: &str, destination: &Path) -> AppResult<usize> {
        let bytes = self.api.get_bytes("/export", Some(token)).await?;
        let size = bytes.len();

        tokio::fs::write(destination, bytes).await?;

        log::info!(
            "レポートをエクスポートしました: path={}, size={size}",
            destination.display()
        );
        Ok(size)
    }
}

/// サマリーと予測行を計算する
fn build_summary(subscriptions: &[Subscription]) -> DashboardSummary {
    let total_spend: f64 = subscriptions.iter().map(|s| s.cost).sum();

    let forecast_rows: Vec<ForecastRow> = subscriptions
        .iter()
        .map(|s| ForecastRow {
            id: s.id,
            name: s.name.clone(),
            cost: s.cost,
            forecast: s.cost * FORECAST_FACTOR,
        })
        .collect();

    DashboardSummary {
        summary: SpendSummary {
            total_spend,
            forecast_total: total_spend * FORECAST_FACTOR,
            active_count: subscriptions.len(),
        },
        forecast_rows,
    }
}

/// 一覧の内容が変化したかどうかを判定する
fn lists_differ(baseline: &[Subscription], latest: &[Subscription]) -> bool {
    if baseline.len() != latest.len() {
        return true;
    }
    let baseline_ids: std::collections::HashSet<i64> = baseline.iter().map(|s| s.id).collect();
    latest.iter().any(|s| !baseline_ids.contains(&s.id))
}
