//! Core data models.
//!
//! These types represent the normalized usage report every provider produces,
//! whatever its billing model. JSON uses camelCase and omits every optional
//! field that is not populated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Billing Kind
// =============================================================================

/// How a backend bills its users. Determines which field group a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BillingKind {
    /// Fixed entitlement that refreshes on a schedule.
    QuotaBased,
    /// Raw token counts.
    TokensBased,
    /// Money spent.
    PayAsYouGo,
}

impl BillingKind {
    /// Wire label (`quota-based`, `tokens-based`, `pay-as-you-go`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::QuotaBased => "quota-based",
            Self::TokensBased => "tokens-based",
            Self::PayAsYouGo => "pay-as-you-go",
        }
    }
}

impl std::fmt::Display for BillingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Sub Account
// =============================================================================

/// One identity inside a multi-identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubAccount {
    /// Zero-based position, stable within one fetch.
    pub index: usize,
    pub label: String,
    pub remaining: i64,
    pub entitlement: i64,
    pub remaining_percent: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_breakdown: Option<BTreeMap<String, i64>>,
}

impl SubAccount {
    /// Build a sub-account from remaining/entitlement; percent is derived.
    #[must_use]
    pub fn new(index: usize, label: impl Into<String>, remaining: i64, entitlement: i64) -> Self {
        let remaining_percent = if entitlement > 0 {
            #[allow(clippy::cast_precision_loss)]
            let pct = remaining as f64 / entitlement as f64 * 100.0;
            pct
        } else {
            0.0
        };
        Self {
            index,
            label: label.into(),
            remaining,
            entitlement,
            remaining_percent,
            model_breakdown: None,
        }
    }

    /// Attach a per-model breakdown.
    #[must_use]
    pub fn with_breakdown(mut self, breakdown: BTreeMap<String, i64>) -> Self {
        self.model_breakdown = Some(breakdown);
        self
    }
}

// =============================================================================
// Daily Usage
// =============================================================================

/// Usage recorded for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    /// ISO date, `YYYY-MM-DD`.
    pub date: String,
    pub included_requests: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billed_amount: Option<f64>,
}

impl DailyUsage {
    #[must_use]
    pub fn new(date: impl Into<String>, included_requests: f64) -> Self {
        Self {
            date: date.into(),
            included_requests,
            billed_amount: None,
        }
    }
}

// =============================================================================
// Forecast
// =============================================================================

/// Confidence tier of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(s)
    }
}

/// Month-end projection attached to a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_monthly_usage: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_extra_cost: Option<f64>,

    pub confidence: Confidence,
}

impl Forecast {
    /// A forecast that could not be computed.
    #[must_use]
    pub const fn insufficient() -> Self {
        Self {
            predicted_monthly_usage: None,
            predicted_extra_cost: None,
            confidence: Confidence::Low,
        }
    }
}

// =============================================================================
// Usage Report
// =============================================================================

/// Normalized usage for one provider.
///
/// Exactly one of the quota / tokens / pay-as-you-go groups is populated,
/// matching `billing_kind`. Use the constructors rather than building the
/// struct by hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub name: String,
    pub billing_kind: BillingKind,

    // Quota group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entitlement: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overage_permitted: Option<bool>,

    // Tokens group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<i64>,

    // Pay-as-you-go group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<SubAccount>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<DailyUsage>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Forecast>,
}

impl UsageReport {
    fn empty(name: impl Into<String>, billing_kind: BillingKind) -> Self {
        Self {
            name: name.into(),
            billing_kind,
            remaining: None,
            entitlement: None,
            usage_percent: None,
            refresh_label: None,
            overage_permitted: None,
            tokens_used: None,
            cost: None,
            accounts: None,
            error: None,
            history: None,
            forecast: None,
        }
    }

    /// Quota-based report. `usage_percent` is derived from the two counts.
    #[must_use]
    pub fn quota(name: impl Into<String>, remaining: i64, entitlement: i64) -> Self {
        let usage_percent = if entitlement > 0 {
            #[allow(clippy::cast_precision_loss)]
            let pct = (entitlement - remaining) as f64 / entitlement as f64 * 100.0;
            pct
        } else {
            0.0
        };
        Self {
            remaining: Some(remaining),
            entitlement: Some(entitlement),
            usage_percent: Some(usage_percent),
            overage_permitted: Some(false),
            ..Self::empty(name, BillingKind::QuotaBased)
        }
    }

    /// Tokens-based report.
    #[must_use]
    pub fn tokens(name: impl Into<String>, tokens_used: i64) -> Self {
        Self {
            tokens_used: Some(tokens_used),
            ..Self::empty(name, BillingKind::TokensBased)
        }
    }

    /// Pay-as-you-go report.
    #[must_use]
    pub fn pay_as_you_go(name: impl Into<String>, cost: f64) -> Self {
        Self {
            cost: Some(cost),
            ..Self::empty(name, BillingKind::PayAsYouGo)
        }
    }

    /// Quota-based report aggregating several identities.
    ///
    /// Headline counts are the sums over all accounts.
    #[must_use]
    pub fn multi_account(name: impl Into<String>, accounts: Vec<SubAccount>) -> Self {
        let remaining: i64 = accounts.iter().map(|a| a.remaining).sum();
        let entitlement: i64 = accounts.iter().map(|a| a.entitlement).sum();
        Self {
            accounts: Some(accounts),
            ..Self::quota(name, remaining, entitlement)
        }
    }

    /// Error report: carries only name, kind and the message.
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        billing_kind: BillingKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(name, billing_kind)
        }
    }

    /// Override the derived usage percentage (backends that report it directly).
    #[must_use]
    pub fn with_usage_percent(mut self, pct: f64) -> Self {
        self.usage_percent = Some(pct);
        self
    }

    #[must_use]
    pub fn with_refresh_label(mut self, label: impl Into<String>) -> Self {
        self.refresh_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_overage_permitted(mut self, permitted: bool) -> Self {
        self.overage_permitted = Some(permitted);
        self
    }

    /// Whether the fetch for this report failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this report aggregates several identities.
    #[must_use]
    pub fn is_multi_account(&self) -> bool {
        self.accounts.as_ref().is_some_and(|a| !a.is_empty())
    }
}

// =============================================================================
// Robot Output Envelope
// =============================================================================

/// Schema version for robot output.
pub const SCHEMA_VERSION: &str = "opencodebar.v1";

/// Envelope for `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotOutput<T> {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub command: String,
    pub data: T,
    pub errors: Vec<String>,
}

impl<T> RobotOutput<T> {
    /// Wrap `data` for `command`, stamped now.
    pub fn new(command: impl Into<String>, data: T, errors: Vec<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            command: command.into(),
            data,
            errors,
        }
    }
}

/// Catalog entry as listed by `opencodebar providers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderListing {
    pub name: String,
    pub cli_name: String,
    pub billing_kind: BillingKind,
    pub available: bool,
}
