//! Contract tests for the JSON output shape.
//!
//! Scripts key on these field names; renaming any of them is a breaking
//! change and must bump the schema version.

use opencodebar::core::models::{
    BillingKind, Confidence, Forecast, ProviderListing, SCHEMA_VERSION, UsageReport,
};
use opencodebar::cli::OutputFormat;
use opencodebar::render;
use opencodebar::test_utils::{make_test_history_week, make_test_multi_account_report};
use opencodebar::{assert_json_valid, assert_no_ansi_codes};
use serde_json::Value;

fn usage_json(reports: &[UsageReport], errors: Vec<String>) -> Value {
    let out = render::render_usage(reports, errors, OutputFormat::Json, false, true).unwrap();
    assert_no_ansi_codes!(out);
    assert_json_valid!(out)
}

fn keys(value: &Value) -> Vec<&str> {
    let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

#[test]
fn envelope_fields() {
    let json = usage_json(&[], Vec::new());
    assert_eq!(
        keys(&json),
        vec!["command", "data", "errors", "generatedAt", "schemaVersion"]
    );
    assert_eq!(json["schemaVersion"], SCHEMA_VERSION);
    assert_eq!(json["command"], "usage");
    assert_eq!(json["data"], serde_json::json!([]));
    assert!(
        chrono::DateTime::parse_from_rfc3339(json["generatedAt"].as_str().unwrap()).is_ok()
    );
}

#[test]
fn quota_report_omits_other_groups() {
    let report = UsageReport::quota("GitHub Copilot", 120, 300)
        .with_refresh_label("Monthly")
        .with_overage_permitted(true);
    let json = usage_json(&[report], Vec::new());
    let entry = &json["data"][0];

    assert_eq!(
        keys(entry),
        vec![
            "billingKind",
            "entitlement",
            "name",
            "overagePermitted",
            "refreshLabel",
            "remaining",
            "usagePercent",
        ]
    );
    assert_eq!(entry["billingKind"], "quota-based");
    assert_eq!(entry["usagePercent"], 60.0);
}

#[test]
fn tokens_and_pay_as_you_go_reports() {
    let reports = vec![
        UsageReport::tokens("Vertex AI", 4000),
        UsageReport::pay_as_you_go("OpenRouter", 2.25),
    ];
    let json = usage_json(&reports, Vec::new());

    assert_eq!(keys(&json["data"][0]), vec!["billingKind", "name", "tokensUsed"]);
    assert_eq!(json["data"][0]["billingKind"], "tokens-based");
    assert_eq!(keys(&json["data"][1]), vec!["billingKind", "cost", "name"]);
    assert_eq!(json["data"][1]["billingKind"], "pay-as-you-go");
}

#[test]
fn failed_report_and_errors_array() {
    let failed = UsageReport::failed(
        "Claude",
        BillingKind::QuotaBased,
        "request timeout after 15s for Claude",
    );
    let json = usage_json(
        &[failed],
        vec!["Claude: request timeout after 15s for Claude".to_string()],
    );

    assert_eq!(keys(&json["data"][0]), vec!["billingKind", "error", "name"]);
    assert_eq!(json["errors"][0], "Claude: request timeout after 15s for Claude");
}

#[test]
fn multi_account_fields() {
    let json = usage_json(&[make_test_multi_account_report()], Vec::new());
    let account = &json["data"][0]["accounts"][0];

    assert_eq!(
        keys(account),
        vec!["entitlement", "index", "label", "remaining", "remainingPercent"]
    );
    assert_eq!(account["index"], 0);
    assert_eq!(json["data"][0]["accounts"][1]["remaining"], 90);
}

#[test]
fn history_and_forecast_fields() {
    let mut report = UsageReport::quota("GitHub Copilot", 40, 100);
    report.history = Some(make_test_history_week());
    report.forecast = Some(Forecast {
        predicted_monthly_usage: Some(211.72),
        predicted_extra_cost: Some(4.47),
        confidence: Confidence::High,
    });
    let json = usage_json(&[report], Vec::new());
    let entry = &json["data"][0];

    assert_eq!(keys(&entry["history"][0]), vec!["date", "includedRequests"]);
    assert_eq!(entry["history"][0]["date"], "2026-03-02");
    assert_eq!(
        keys(&entry["forecast"]),
        vec!["confidence", "predictedExtraCost", "predictedMonthlyUsage"]
    );
    assert_eq!(entry["forecast"]["confidence"], "High");
}

#[test]
fn insufficient_forecast_keeps_only_confidence() {
    let mut report = UsageReport::quota("GitHub Copilot", 40, 100);
    report.forecast = Some(Forecast::insufficient());
    let json = usage_json(&[report], Vec::new());
    assert_eq!(keys(&json["data"][0]["forecast"]), vec!["confidence"]);
}

#[test]
fn providers_envelope() {
    let listings = vec![ProviderListing {
        name: "Google AI Studio".to_string(),
        cli_name: "googleaistudio".to_string(),
        billing_kind: BillingKind::QuotaBased,
        available: true,
    }];
    let out = render::render_providers(&listings, OutputFormat::Json, true, true).unwrap();
    let json = assert_json_valid!(out);

    assert_eq!(json["command"], "providers");
    assert_eq!(
        keys(&json["data"][0]),
        vec!["available", "billingKind", "cliName", "name"]
    );
    assert!(out.contains('\n'));
}
