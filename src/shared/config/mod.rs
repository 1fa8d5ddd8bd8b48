/// 設定関連のモジュール
pub mod environment;

pub use environment::{
    get_environment, initialize_logging_system, load_environment_variables, ApiConfig, Environment,
    EnvironmentConfig,
};
