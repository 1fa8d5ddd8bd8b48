use thiserror::Error;

/// アプリケーション全体で使用される統一エラー型
#[derive(Debug, Error)]
pub enum AppError {
    /// 認証関連のエラー（認証情報の誤り、無効・期限切れトークン）
    #[error("認証エラー: {0}")]
    Authentication(String),

    /// バリデーション関連のエラー（送信前にクライアント側で検出）
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// ネットワーク関連のエラー（リクエスト送信自体の失敗）
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// APIサーバーからの非2xxレスポンス（401/403を除く）
    #[error("外部サービスエラー: {0}")]
    ExternalService(String),

    /// 設定関連のエラー
    #[error("設定エラー: {0}")]
    Configuration(String),

    /// 永続ストレージ関連のエラー
    #[error("ストレージエラー: {0}")]
    Storage(String),

    /// 並行処理関連のエラー（同一エンティティへの多重送信など）
    #[error("並行処理エラー: {0}")]
    Concurrency(String),

    /// ビューのアンマウントなどによる協調的キャンセル
    #[error("処理がキャンセルされました")]
    Canceled,

    /// I/O関連のエラー
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    /// JSON解析エラー
    #[error("JSON解析エラー: {0}")]
    Json(#[from] serde_json::Error),
}

/// エラーの重要度を表す列挙型
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// 低重要度（ユーザー入力エラーなど）
    Low,
    /// 中重要度（外部サービス一時的エラーなど）
    Medium,
    /// 高重要度（設定エラーなど）
    High,
    /// 最重要（認証エラーなど）
    Critical,
}

impl AppError {
    /// ユーザーに表示するためのフレンドリーなメッセージを取得
    ///
    /// # 戻り値
    /// ユーザーに表示可能なエラーメッセージ
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Authentication(_) => "認証に失敗しました。再度ログインしてください",
            AppError::Validation(msg) => msg,
            AppError::Network(_) => "APIサーバーとの通信でエラーが発生しました",
            AppError::ExternalService(_) => "操作に失敗しました。しばらくしてから再試行してください",
            AppError::Configuration(_) => "設定エラーが発生しました",
            AppError::Storage(_) => "ローカルストレージの操作でエラーが発生しました",
            AppError::Concurrency(msg) => msg,
            AppError::Canceled => "処理がキャンセルされました",
            AppError::Io(_) => "ファイル操作でエラーが発生しました",
            AppError::Json(_) => "データ形式の解析でエラーが発生しました",
        }
    }

    /// エラーの詳細情報を取得
    ///
    /// # 戻り値
    /// エラーの詳細情報（ログ出力用）
    pub fn details(&self) -> String {
        format!("{self}")
    }

    /// エラーの重要度を取得
    ///
    /// # 戻り値
    /// エラーの重要度レベル
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Authentication(_) => ErrorSeverity::Critical,
            AppError::Validation(_) => ErrorSeverity::Low,
            AppError::Network(_) => ErrorSeverity::Medium,
            AppError::ExternalService(_) => ErrorSeverity::Medium,
            AppError::Configuration(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::High,
            AppError::Concurrency(_) => ErrorSeverity::Low,
            AppError::Canceled => ErrorSeverity::Low,
            AppError::Io(_) => ErrorSeverity::Medium,
            AppError::Json(_) => ErrorSeverity::Medium,
        }
    }

    /// 認証エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 認証エラーメッセージ
    ///
    /// # 戻り値
    /// 認証エラー
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        AppError::Authentication(message.into())
    }

    /// バリデーションエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - バリデーションエラーメッセージ
    ///
    /// # 戻り値
    /// バリデーションエラー
    pub fn validation<S: Into<String>>(message: S) -> Self {
        AppError::Validation(message.into())
    }

    /// ネットワークエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - ネットワークエラーメッセージ
    ///
    /// # 戻り値
    /// ネットワークエラー
    pub fn network<S: Into<String>>(message: S) -> Self {
        AppError::Network(message.into())
    }

    /// 外部サービスエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - エラーメッセージ
    ///
    /// # 戻り値
    /// 外部サービスエラー
    pub fn external_service<S: Into<String>>(message: S) -> Self {
        AppError::ExternalService(message.into())
    }

    /// ストレージエラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - ストレージエラーメッセージ
    ///
    /// # 戻り値
    /// ストレージエラー
    pub fn storage<S: Into<String>>(message: S) -> Self {
        AppError::Storage(message.into())
    }

    /// 並行処理エラーを作成するヘルパー関数
    ///
    /// # 引数
    /// * `message` - 並行処理エラーメッセージ
    ///
    /// # 戻り値
    /// 並行処理エラー
    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        AppError::Concurrency(message.into())
    }
}

/// AppErrorからStringへの変換（Tauriコマンドでの使用のため）
impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.user_message().to_string()
    }
}

/// reqwest::ErrorからAppErrorへの変換
impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Network(error.to_string())
    }
}

/// Result型のエイリアス（アプリケーション全体で使用）
pub type AppResult<T> = Result<T, AppError>;
