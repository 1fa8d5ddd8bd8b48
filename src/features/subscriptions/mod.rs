/// サブスクリプション管理機能モジュール
pub mod commands;
pub mod models;
pub mod service;

pub use models::{Category, Subscription, SubscriptionForm};
pub use service::SubscriptionService;
