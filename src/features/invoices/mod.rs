/// 請求書アップロード機能モジュール
pub mod commands;
pub mod service;

pub use service::InvoiceService;
