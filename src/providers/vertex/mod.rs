//! Vertex AI provider.
//!
//! Sums `generate_content/total_token_count` from Cloud Monitoring for the
//! project named in the Application Default Credentials file.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::core::availability::google_adc_path;
use crate::core::cli_runner::{CLI_TIMEOUT, run_text_command};
use crate::core::credentials::{CredentialBag, LinkedAccounts};
use crate::core::http::send_json;
use crate::core::models::{DailyUsage, UsageReport};
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::gemini::TokenRefresher;
use crate::providers::join_url;

const TOKEN_METRIC_FILTER: &str =
    r#"metric.type="aiplatform.googleapis.com/generate_content/total_token_count""#;
const MONTH_ALIGNMENT: &str = "2592000s";
const DAY_ALIGNMENT: &str = "86400s";
const HISTORY_DAYS: i64 = 7;

/// Contents of an ADC file we care about.
#[derive(Debug, Default, Deserialize)]
struct AdcFile {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    project_id: String,
    #[serde(default)]
    quota_project_id: String,
}

impl AdcFile {
    fn project(&self) -> Option<&str> {
        [self.project_id.as_str(), self.quota_project_id.as_str()]
            .into_iter()
            .find(|p| !p.is_empty())
    }

    fn as_refreshable(&self) -> Option<LinkedAccounts> {
        (self.kind == "authorized_user").then(|| LinkedAccounts {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
            ..LinkedAccounts::default()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeSeriesPage {
    #[serde(default)]
    time_series: Vec<TimeSeries>,
    #[serde(default)]
    next_page_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct TimeSeries {
    #[serde(default)]
    points: Vec<Point>,
}

#[derive(Debug, Default, Deserialize)]
struct Point {
    #[serde(default)]
    interval: Interval,
    #[serde(default)]
    value: PointValue,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Interval {
    #[serde(default)]
    end_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointValue {
    /// int64 travels as a JSON string.
    #[serde(default)]
    int64_value: Option<Value>,
}

impl PointValue {
    fn tokens(&self) -> i64 {
        match &self.int64_value {
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Vertex AI token usage.
pub struct VertexProvider {
    client: reqwest::Client,
    base_url: String,
    refresher: TokenRefresher,
    adc_file: Option<PathBuf>,
}

impl VertexProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, oauth_base: &str) -> Self {
        Self {
            refresher: TokenRefresher::new(client.clone(), oauth_base),
            client,
            base_url: base_url.to_string(),
            adc_file: None,
        }
    }

    /// Read credentials from `path` instead of the discovered ADC file.
    #[must_use]
    pub fn with_adc_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.adc_file = Some(path.into());
        self
    }

    fn load_adc(&self) -> Result<AdcFile> {
        let path = self
            .adc_file
            .clone()
            .or_else(google_adc_path)
            .ok_or_else(|| BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "no Application Default Credentials file".to_string(),
            })?;
        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| BarError::AuthNotConfigured {
            provider: self.name().to_string(),
            reason: format!("unreadable ADC file {}: {e}", path.display()),
        })
    }

    /// Access token and project id.
    async fn authorize(&self) -> Result<(String, String)> {
        let adc = self.load_adc()?;
        let project = adc
            .project()
            .ok_or_else(|| BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "could not determine GCP project id from credentials".to_string(),
            })?
            .to_string();

        let token = match adc.as_refreshable() {
            Some(linked) => self.refresher.refresh(self.name(), Some(&linked)).await?,
            None => {
                run_text_command(
                    "gcloud",
                    &["auth", "application-default", "print-access-token"],
                    CLI_TIMEOUT,
                )
                .await?
            }
        };
        Ok((token, project))
    }

    /// Every point of the token metric in `[start, end]`, across pages.
    async fn list_points(
        &self,
        token: &str,
        project: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        alignment: &str,
    ) -> Result<Vec<Point>> {
        let url = join_url(&self.base_url, &format!("/v3/projects/{project}/timeSeries"));
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end = end.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut points = Vec::new();
        let mut page_token = String::new();
        loop {
            let request = {
                let mut query = vec![
                    ("filter", TOKEN_METRIC_FILTER),
                    ("interval.startTime", start.as_str()),
                    ("interval.endTime", end.as_str()),
                    ("aggregation.alignmentPeriod", alignment),
                    ("aggregation.perSeriesAligner", "ALIGN_SUM"),
                    ("aggregation.crossSeriesReducer", "REDUCE_SUM"),
                ];
                if !page_token.is_empty() {
                    query.push(("pageToken", page_token.as_str()));
                }
                self.client.get(&url).bearer_auth(token).query(&query)
            };
            let page: TimeSeriesPage = send_json(self.name(), request).await?;

            points.extend(page.time_series.into_iter().flat_map(|s| s.points));
            if page.next_page_token.is_empty() {
                return Ok(points);
            }
            page_token = page.next_page_token;
        }
    }
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// Bucket points into the last [`HISTORY_DAYS`] days by end time, newest first.
fn daily_history(points: &[Point], now: DateTime<Utc>) -> Vec<DailyUsage> {
    let mut by_day: HashMap<String, i64> = HashMap::new();
    for point in points {
        let Some(end) = point
            .interval
            .end_time
            .as_deref()
            .and_then(crate::util::time::parse_rfc3339)
        else {
            continue;
        };
        *by_day.entry(end.format("%Y-%m-%d").to_string()).or_default() += point.value.tokens();
    }

    (0..HISTORY_DAYS)
        .map(|offset| {
            let date = (now - Duration::days(offset)).format("%Y-%m-%d").to_string();
            #[allow(clippy::cast_precision_loss)]
            let tokens = by_day.get(&date).copied().unwrap_or(0) as f64;
            DailyUsage::new(date, tokens)
        })
        .collect()
}

#[async_trait]
impl UsageProvider for VertexProvider {
    fn id(&self) -> ProviderId {
        ProviderId::VertexAi
    }

    async fn fetch(&self, _bag: &CredentialBag) -> Result<UsageReport> {
        let (token, project) = self.authorize().await?;
        let now = Utc::now();
        let points = self
            .list_points(&token, &project, month_start(now), now, MONTH_ALIGNMENT)
            .await?;
        let total: i64 = points.iter().map(|p| p.value.tokens()).sum();

        tracing::debug!(project = %project, total, "vertex month-to-date tokens");
        Ok(UsageReport::tokens(self.name(), total))
    }

    async fn fetch_history(&self, _bag: &CredentialBag) -> Result<Vec<DailyUsage>> {
        let (token, project) = self.authorize().await?;
        let now = Utc::now();
        let points = self
            .list_points(
                &token,
                &project,
                now - Duration::days(HISTORY_DAYS),
                now,
                DAY_ALIGNMENT,
            )
            .await?;
        Ok(daily_history(&points, now))
    }
}
