//! OpenCode Zen provider.
//!
//! Pay-as-you-go: month-to-date spend from the model-usage monitor. The
//! token normally comes from the OpenCode database read during resolution.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;

/// OpenCode Zen monthly cost.
pub struct OpenCodeZenProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenCodeZenProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    fn token(bag: &CredentialBag) -> Option<String> {
        if let Some(token) = bag.database_token() {
            return Some(token.to_string());
        }
        ["zen", "opencode"]
            .into_iter()
            .map(|ns| bag.get_nested_field(ns, "access"))
            .find(|t| !t.is_empty())
    }
}

/// Total cost from a model-usage body: `total.cost` when positive, else the
/// sum of `data[].cost`, else a flat `cost`.
fn total_cost(body: &Value) -> f64 {
    let cost_of = |v: &Value| v.get("cost").and_then(Value::as_f64).unwrap_or(0.0);

    let total = body.get("total").map_or(0.0, cost_of);
    if total > 0.0 {
        return total;
    }
    let summed: f64 = body
        .get("data")
        .and_then(Value::as_array)
        .map_or(0.0, |rows| rows.iter().map(cost_of).sum());
    if summed > 0.0 {
        return summed;
    }
    cost_of(body)
}

fn month_window(today: NaiveDate) -> (String, String) {
    let start = today.with_day(1).unwrap_or(today);
    (
        start.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    )
}

#[async_trait]
impl UsageProvider for OpenCodeZenProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenCodeZen
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let token = Self::token(bag).ok_or_else(|| BarError::AuthNotConfigured {
            provider: self.name().to_string(),
            reason: "token not found in database or auth.json".to_string(),
        })?;

        let (start, end) = month_window(Utc::now().date_naive());
        let request = self
            .client
            .get(join_url(&self.base_url, "/api/monitor/usage/model-usage"))
            .bearer_auth(&token)
            .query(&[("start", start.as_str()), ("end", end.as_str())]);
        let body: Value = send_json(self.name(), request).await?;

        Ok(UsageReport::pay_as_you_go(self.name(), total_cost(&body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_float_eq;
    use serde_json::json;

    #[test]
    fn prefers_positive_total() {
        let body = json!({"total": {"cost": 12.5}, "data": [{"cost": 1.0}]});
        assert_float_eq!(total_cost(&body), 12.5);
    }

    #[test]
    fn sums_rows_when_total_is_zero() {
        let body = json!({"total": {"cost": 0}, "data": [{"cost": 1.25}, {"cost": 2.0}, {}]});
        assert_float_eq!(total_cost(&body), 3.25);
    }

    #[test]
    fn falls_back_to_flat_cost() {
        assert_float_eq!(total_cost(&json!({"cost": 4.75})), 4.75);
        assert_float_eq!(total_cost(&json!({})), 0.0);
    }

    #[test]
    fn window_starts_on_the_first() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        assert_eq!(
            month_window(today),
            ("2026-03-01".to_string(), "2026-03-17".to_string())
        );
    }

    #[test]
    fn token_prefers_database() {
        use crate::core::credentials::{CredentialSource, DATABASE_TOKEN_KEY};
        let mut bag = CredentialBag::new();
        bag.insert_if_absent("zen", json!({"access": "from-auth"}), CredentialSource::AuthFile);
        assert_eq!(OpenCodeZenProvider::token(&bag).as_deref(), Some("from-auth"));
        bag.insert_if_absent(DATABASE_TOKEN_KEY, "from-db", CredentialSource::Database);
        assert_eq!(OpenCodeZenProvider::token(&bag).as_deref(), Some("from-db"));
    }
}
