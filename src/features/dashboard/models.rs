use serde::{Deserialize, Serialize};

/// 支出サマリー
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendSummary {
    /// 月額コストの合計
    pub total_spend: f64,
    /// 予測合計（翌月）
    pub forecast_total: f64,
    /// 有効なサブスクリプション数
    pub active_count: usize,
}

/// サブスクリプションごとの予測行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    /// サブスクリプションID
    pub id: i64,
    /// サービス名
    pub name: String,
    /// 現在の月額コスト
    pub cost: f64,
    /// 翌月の予測コスト
    pub forecast: f64,
}

/// ダッシュボード表示用のサマリーレスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// 集計値
    pub summary: SpendSummary,
    /// サブスクリプションごとの予測
    pub forecast_rows: Vec<ForecastRow>,
}
