//! Backend response bodies and on-disk credential layouts.

use std::path::{Path, PathBuf};

use opencodebar::core::resolver::{CredentialLocations, CredentialResolver};
use serde_json::{Value, json};
use tempfile::TempDir;

// =============================================================================
// Home Directory Layouts
// =============================================================================

pub const AUTH_FILE: &str = ".local/share/opencode/auth.json";
pub const LINKED_FILE: &str = ".config/opencode/antigravity-accounts.json";
pub const DATABASE_FILE: &str = ".local/share/opencode/opencode.db";

/// Fresh home directory containing `files` (relative path, content).
pub fn home_with(files: &[(&str, &str)]) -> TempDir {
    let home = TempDir::new().unwrap();
    for (rel, content) in files {
        write_file(&home.path().join(rel), content);
    }
    home
}

pub fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Resolver rooted at `home` with an empty environment.
pub fn resolver_for(home: &Path) -> CredentialResolver {
    CredentialResolver::new(CredentialLocations::under_home(home, None)).with_env(|_| None)
}

/// Create an OpenCode database with one control account.
pub fn create_opencode_db(home: &Path, token: &str, active: bool) -> PathBuf {
    let path = home.join(DATABASE_FILE);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE control_account (
            access_token TEXT,
            active INTEGER NOT NULL DEFAULT 0,
            time_updated INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO control_account (access_token, active, time_updated) VALUES (?1, ?2, ?3)",
        rusqlite::params![token, i64::from(active), 1_700_000_000_i64],
    )
    .unwrap();
    path
}

/// An `authorized_user` ADC file.
pub fn authorized_user_adc(project: &str) -> String {
    json!({
        "type": "authorized_user",
        "client_id": "adc-client",
        "client_secret": "adc-secret",
        "refresh_token": "adc-refresh",
        "quota_project_id": project,
    })
    .to_string()
}

// =============================================================================
// Response Bodies
// =============================================================================

pub fn openrouter_credits(total_usage: f64) -> Value {
    json!({ "data": { "total_credits": 50.0, "total_usage": total_usage } })
}

pub fn claude_usage(utilization: f64, resets_at: &str) -> Value {
    json!({
        "five_hour": { "utilization": 12.0, "resets_at": resets_at },
        "seven_day": { "utilization": utilization, "resets_at": resets_at },
    })
}

pub fn gemini_quota(fractions: &[f64]) -> Value {
    let buckets: Vec<Value> = fractions
        .iter()
        .enumerate()
        .map(|(i, f)| {
            json!({
                "displayName": format!("model-{i}"),
                "remainingFraction": f,
                "resetTime": "2030-01-02T00:00:00Z",
            })
        })
        .collect();
    json!({ "buckets": buckets })
}

pub fn token_response(access_token: &str) -> Value {
    json!({ "access_token": access_token, "expires_in": 3599, "token_type": "Bearer" })
}

pub fn copilot_user(remaining: i64, entitlement: i64, reset: &str) -> Value {
    json!({
        "login": "octocat",
        "copilot_plan": "individual",
        "quota_reset_date_utc": reset,
        "quota_snapshots": {
            "premium_interactions": {
                "entitlement": entitlement,
                "remaining": remaining,
                "percent_remaining": 0.0,
                "overage_permitted": true,
                "unlimited": false,
            }
        }
    })
}

pub fn chatgpt_usage(used_percent: f64, reset_at: i64) -> Value {
    json!({
        "plan_type": "plus",
        "rate_limit": {
            "primary_window": { "used_percent": used_percent, "reset_at": reset_at }
        }
    })
}

pub fn zen_usage(total: f64, rows: &[f64]) -> Value {
    let data: Vec<Value> = rows.iter().map(|c| json!({ "model": "glm", "cost": c })).collect();
    json!({ "total": { "cost": total }, "data": data })
}

/// One page of Cloud Monitoring time series.
pub fn time_series_page(points: &[(&str, &str)], next_page_token: &str) -> Value {
    let points: Vec<Value> = points
        .iter()
        .map(|(end, value)| {
            json!({
                "interval": { "startTime": end, "endTime": end },
                "value": { "int64Value": value },
            })
        })
        .collect();
    json!({
        "timeSeries": [{ "points": points }],
        "nextPageToken": next_page_token,
    })
}
