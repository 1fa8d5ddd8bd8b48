use crate::shared::errors::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};

/// サブスクリプションのカテゴリ
///
/// サーバーが未知のカテゴリを返した場合は`Other`として扱います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    SaaS,
    Cloud,
    DevTools,
    Design,
    Communication,
    #[serde(other)]
    Other,
}

impl Category {
    /// カテゴリを文字列として取得する
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SaaS => "SaaS",
            Category::Cloud => "Cloud",
            Category::DevTools => "DevTools",
            Category::Design => "Design",
            Category::Communication => "Communication",
            Category::Other => "Other",
        }
    }

    fn fallback() -> Self {
        Category::Other
    }
}

/// ソフトウェアサブスクリプション
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// サブスクリプションID
    pub id: i64,
    /// サービス名
    pub name: String,
    /// 月額コスト
    pub cost: f64,
    /// カテゴリ（サーバー側では省略可能。null・欠落は`Other`として扱う）
    #[serde(default = "Category::fallback", deserialize_with = "nullable_category")]
    pub category: Category,
    /// 次回更新日
    pub renewal_date: String,
}

fn nullable_category<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Category>::deserialize(deserializer)?.unwrap_or(Category::Other))
}

/// サブスクリプションの入力フォーム
///
/// コストはユーザー入力のまま文字列で受け取り、検証時に数値へ変換します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionForm {
    /// サービス名
    pub name: String,
    /// 月額コスト（未検証の入力文字列）
    pub cost: String,
    /// カテゴリ
    pub category: Category,
    /// 次回更新日（YYYY-MM-DD形式）
    pub renewal_date: String,
}

/// 検証済みのサブスクリプション送信ペイロード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPayload {
    pub name: String,
    pub cost: f64,
    pub category: Category,
    pub renewal_date: String,
}

impl SubscriptionForm {
    /// フォーム入力を検証し、送信可能なペイロードへ変換する
    ///
    /// 検証に失敗した場合、ネットワーク呼び出しは行われません。
    ///
    /// # 戻り値
    /// 検証済みペイロード、または最初の検証エラー
    pub fn validate(&self) -> AppResult<SubscriptionPayload> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("サービス名を入力してください"));
        }

        let cost = validate_cost(&self.cost)?;

        let renewal_date = self.renewal_date.trim();
        if chrono::NaiveDate::parse_from_str(renewal_date, "%Y-%m-%d").is_err() {
            return Err(AppError::validation(
                "更新日はYYYY-MM-DD形式で入力してください",
            ));
        }

        Ok(SubscriptionPayload {
            name: name.to_string(),
            cost,
            category: self.category,
            renewal_date: renewal_date.to_string(),
        })
    }
}

/// コスト入力を検証する
///
/// 有限かつ非負の数値のみを受け付けます。
pub fn validate_cost(input: &str) -> AppResult<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("コストを入力してください"));
    }

    let cost: f64 = trimmed
        .parse()
        .map_err(|_| AppError::validation("コストは数値で入力してください"))?;

    if !cost.is_finite() {
        return Err(AppError::validation("コストは有限の数値で入力してください"));
    }
    if cost < 0.0 {
        return Err(AppError::validation("コストは0以上で入力してください"));
    }

    Ok(cost)
}
