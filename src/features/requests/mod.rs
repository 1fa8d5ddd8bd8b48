/// 従業員リクエスト機能モジュール
pub mod commands;
pub mod models;
pub mod service;

pub use models::{Decision, EmployeeRequest, NewRequest, RequestKind, RequestStatus};
pub use service::RequestService;
