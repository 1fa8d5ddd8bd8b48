/// ルートガード
///
/// 保護されたビューへのアクセス可否をセッションの有無だけで判定します。
/// 役割はビュー内部の表示制御にのみ使用し、ルート判定では参照しません。
use crate::features::auth::models::Session;

/// ルート評価の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// ビューを描画する
    Render,
    /// ログイン画面へリダイレクトする
    RedirectToLogin,
}

/// 保護されたルートへのアクセス可否を判定する
///
/// # 引数
/// * `session` - 現在のセッションのスナップショット
///
/// # 戻り値
/// セッションが存在すれば`Render`、なければ`RedirectToLogin`
pub fn evaluate_protected_route(session: Option<&Session>) -> RouteDecision {
    match session {
        Some(_) => RouteDecision::Render,
        None => RouteDecision::RedirectToLogin,
    }
}
