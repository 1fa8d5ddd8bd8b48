/// アシスタントチャット機能モジュール
pub mod commands;
pub mod models;
pub mod service;

pub use models::{ChatRequest, ChatResponse};
pub use service::AssistantService;
