/// ダッシュボード機能モジュール
///
/// 支出の集計・予測、スキャン、CSVエクスポートを提供します。
pub mod commands;
pub mod models;
pub mod service;

pub use models::{DashboardSummary, ForecastRow, SpendSummary};
pub use service::DashboardService;
