/// 機能横断で共有されるモジュール
pub mod api_client;
pub mod config;
pub mod errors;
pub mod inflight;
pub mod tasks;

#[cfg(test)]
pub mod testing;
