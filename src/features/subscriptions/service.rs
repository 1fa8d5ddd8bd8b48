/// サブスクリプション管理のビジネスロジック
///
/// 作成・更新・削除の完了後は必ず一覧を再取得し、
/// クライアント側での部分的なリスト編集は行いません。
use crate::features::subscriptions::models::{Subscription, SubscriptionForm};
use crate::shared::api_client::ApiClient;
use crate::shared::errors::AppResult;
use std::sync::Arc;

/// サブスクリプションサービス
pub struct SubscriptionService {
    api: Arc<ApiClient>,
}

impl SubscriptionService {
    /// 新しいSubscriptionServiceを作成する
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// サブスクリプション一覧を取得する
    ///
    /// # 引数
    /// * `token` - 認証トークン
    pub async fn list(&self, token: &str) -> AppResult<Vec<Subscription>> {
        self.api.get("/subscriptions", Some(token)).await
    }

    /// サブスクリプションを作成する
    ///
    /// フォームの検証に失敗した場合はネットワーク呼び出しを行いません。
    ///
    /// # 戻り値
    /// 再取得した最新の一覧
    pub async fn create(
        &self,
        token: &str,
        form: &SubscriptionForm,
    ) -> AppResult<Vec<Subscription>> {
        let payload = form.validate()?;

        log::info!("サブスクリプションを作成します: name={}", payload.name);
        let _: Subscription = self.api.post("/subscriptions", &payload, Some(token)).await?;

        self.list(token).await
    }

    /// サブスクリプションを更新する
    ///
    /// # 引数
    /// * `id` - 更新対象のID
    /// * `form` - 入力フォーム
    ///
    /// # 戻り値
    /// 再取得した最新の一覧
    pub async fn update(
        &self,
        token: &str,
        id: i64,
        form: &SubscriptionForm,
    ) -> AppResult<Vec<Subscription>> {
        let payload = form.validate()?;

        log::info!("サブスクリプションを更新します: id={id}");
        let endpoint = format!("/subscriptions/{id}");
        let _: Subscription = self.api.put(&endpoint, &payload, Some(token)).await?;

        self.list(token).await
    }

    /// サブスクリプションを削除する
    ///
    /// 確認済みでない場合は何もせず`None`を返します（ネットワーク呼び出しなし）。
    ///
    /// # 引数
    /// * `id` - 削除対象のID
    /// * `confirmed` - ユーザーが削除を確認したかどうか
    ///
    /// # 戻り値
    /// 削除後の一覧、または確認されなかった場合は`None`
    pub async fn delete(
        &self,
        token: &str,
        id: i64,
        confirmed: bool,
    ) -> AppResult<Option<Vec<Subscription>>> {
        if !confirmed {
            log::debug!("削除が確認されなかったため中止します: id={id}");
            return Ok(None);
        }

        log::info!("サブスクリプションを削除します: id={id}");
        let endpoint = format!("/subscriptions/{id}");
        self.api.delete(&endpoint, Some(token)).await?;

        Ok(Some(self.list(token).await?))
    }
}
