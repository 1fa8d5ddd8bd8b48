/// テスト用ループバックAPIサーバー
///
/// 実APIサーバーの代わりに127.0.0.1の空きポートで起動し、
/// 受信したリクエストを記録しつつ、あらかじめ用意したレスポンスを返します。
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// 記録されたリクエスト
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// HTTPメソッド
    pub method: String,
    /// リクエストパス（クエリを除く）
    pub path: String,
    /// クエリ文字列
    pub query: Option<String>,
    /// Authorizationヘッダーの値
    pub authorization: Option<String>,
    /// Content-Typeヘッダーの値
    pub content_type: Option<String>,
    /// リクエストボディ
    pub body: Vec<u8>,
}

impl CapturedRequest {
    /// ボディをUTF-8文字列として取得する
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

/// モックルート定義
///
/// 同一ルートに複数レスポンスを登録した場合は呼び出し順に返し、
/// 以降は最後のレスポンスを繰り返します。
pub struct MockRoute {
    method: String,
    path: String,
    responses: Vec<(u16, String)>,
    hits: AtomicUsize,
}

impl MockRoute {
    /// 単一レスポンスのルートを作成する
    pub fn new(method: &str, path: &str, status: u16, body: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            responses: vec![(status, body.to_string())],
            hits: AtomicUsize::new(0),
        }
    }

    /// 呼び出し順にレスポンスを返すルートを作成する
    pub fn with_sequence(method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        assert!(!responses.is_empty(), "レスポンスを1件以上登録してください");
        Self {
            method: method.to_string(),
            path: path.to_string(),
            responses,
            hits: AtomicUsize::new(0),
        }
    }

    fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }

    fn respond(&self) -> (u16, String) {
        let index = self.hits.fetch_add(1, Ordering::SeqCst);
        let clamped = index.min(self.responses.len() - 1);
        self.responses[clamped].clone()
    }
}

/// テスト用APIサーバー
pub struct MockApiServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockApiServer {
    /// サーバーを起動する
    ///
    /// # 引数
    /// * `routes` - モックルートの一覧
    ///
    /// # 戻り値
    /// 起動済みサーバー
    pub async fn start(routes: Vec<MockRoute>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("ループバックポートのバインドに失敗しました");
        let addr = listener
            .local_addr()
            .expect("ローカルアドレスの取得に失敗しました");

        let requests: Arc<Mutex<Vec<CapturedRequest>>> = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let accept_requests = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(stream);
                let requests = Arc::clone(&accept_requests);
                let routes = Arc::clone(&routes);

                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let requests = Arc::clone(&requests);
                        let routes = Arc::clone(&routes);
                        async move { handle_request(req, requests, routes).await }
                    });

                    let _ = http1::Builder::new().serve_connection(io, service).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// サーバーのベースURLを取得する
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// 記録されたリクエストの一覧を取得する
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// 記録されたリクエスト数を取得する
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn handle_request(
    req: Request<Incoming>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    routes: Arc<Vec<MockRoute>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body_bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };

    let captured = CapturedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(|q| q.to_string()),
        authorization: parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        content_type: parts
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        body: body_bytes.to_vec(),
    };
    requests.lock().unwrap().push(captured);

    let (status, body) = routes
        .iter()
        .find(|r| r.matches(parts.method.as_str(), parts.uri.path()))
        .map(|r| r.respond())
        .unwrap_or((404, r#"{"detail": "Not Found"}"#.to_string()));

    let response = Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("モックレスポンスの構築に失敗しました");

    Ok(response)
}
