//! Test utilities for opencodebar.
//!
//! Provides shared helpers, test data factories, and assertion macros
//! for use across all test modules.
//!
//! # Usage
//!
//! ```rust,ignore
//! use opencodebar::test_utils::*;
//!
//! let report = make_test_quota_report("GitHub Copilot", 40, 100);
//! let dir = TestDir::new();
//! dir.create_file(".local/share/opencode/auth.json", &make_test_auth_json());
//! ```

#![allow(clippy::missing_panics_doc)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::credentials::{CredentialBag, CredentialSource};
use crate::core::models::{DailyUsage, SubAccount, UsageReport};

// =============================================================================
// Model Factories
// =============================================================================

/// Quota report with a monthly refresh label.
#[must_use]
pub fn make_test_quota_report(name: &str, remaining: i64, entitlement: i64) -> UsageReport {
    UsageReport::quota(name, remaining, entitlement).with_refresh_label("Monthly: in 12d (04/01)")
}

/// Two-identity report shaped like the Antigravity provider's output.
#[must_use]
pub fn make_test_multi_account_report() -> UsageReport {
    UsageReport::multi_account(
        "Antigravity",
        vec![
            SubAccount::new(0, "Claude: in 5h (14:00)", 58, 100),
            SubAccount::new(1, "Gemini", 90, 100),
        ],
    )
}

/// One week of history, Monday 2026-03-02 through Sunday 2026-03-08.
///
/// With 40/100 remaining and 10 weekdays plus 4 weekend days left this
/// projects to about 211.72 requests and $4.47 of overage at $0.04.
#[must_use]
pub fn make_test_history_week() -> Vec<DailyUsage> {
    [
        ("2026-03-02", 12.0),
        ("2026-03-03", 15.0),
        ("2026-03-04", 8.0),
        ("2026-03-05", 2.0),
        ("2026-03-06", 1.0),
        ("2026-03-07", 14.0),
        ("2026-03-08", 11.0),
    ]
    .into_iter()
    .map(|(date, requests)| DailyUsage::new(date, requests))
    .collect()
}

/// Bag holding `pairs` as environment-sourced text entries.
#[must_use]
pub fn make_test_credential_bag(pairs: &[(&str, &str)]) -> CredentialBag {
    let mut bag = CredentialBag::new();
    for (key, value) in pairs {
        bag.insert_if_absent(*key, *value, CredentialSource::Environment);
    }
    bag
}

/// An `auth.json` with nested OAuth entries and a flat API key.
#[must_use]
pub fn make_test_auth_json() -> String {
    r#"{
  "github-copilot": {"type": "oauth", "access": "gho_test", "refresh": "ghr_test"},
  "anthropic": {"type": "oauth", "access": "sk-ant-oat-test"},
  "openrouter.key": "sk-or-test"
}"#
    .to_string()
}

/// A linked-accounts file with one refreshable Google identity.
#[must_use]
pub fn make_test_linked_accounts_json() -> String {
    r#"{
  "client_id": "client-test",
  "client_secret": "secret-test",
  "refresh_token": "1//refresh-test",
  "email": "dev@example.com"
}"#
    .to_string()
}

/// Sample config TOML.
#[must_use]
pub fn make_test_config_toml() -> String {
    r#"[general]
timeout_seconds = 30

[forecast]
enabled = true
overage_rate = 0.04

[providers]
disabled = ["vertex"]

[output]
format = "human"
pretty = false
"#
    .to_string()
}

// =============================================================================
// Temp Directory Utilities
// =============================================================================

/// A temporary directory for tests with automatic cleanup.
///
/// # Examples
///
/// ```rust,ignore
/// use opencodebar::test_utils::TestDir;
///
/// let dir = TestDir::new();
/// dir.create_file("config.toml", "[general]\ntimeout_seconds = 30");
/// assert!(dir.file_path("config.toml").exists());
/// ```
pub struct TestDir {
    inner: tempfile::TempDir,
}

impl TestDir {
    /// Create a new isolated temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tempfile::tempdir().expect("Failed to create temp directory"),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Create a file with `content`, creating parent directories as needed.
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.inner.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        let mut file = fs::File::create(&path).expect("Failed to create test file");
        file.write_all(content.as_bytes())
            .expect("Failed to write test file");
    }

    /// Read a file from the temporary directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.inner.path().join(name))
    }

    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Assertion Macros
// =============================================================================

/// Assert that a string contains a substring.
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack: &str = &$haystack;
        let needle: &str = &$needle;
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}', but it didn't.\nActual: {}",
            needle,
            haystack
        );
    };
}

/// Assert that a string does not contain a substring.
#[macro_export]
macro_rules! assert_not_contains {
    ($haystack:expr, $needle:expr) => {
        let haystack: &str = &$haystack;
        let needle: &str = &$needle;
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain '{}', but it did.\nActual: {}",
            needle,
            haystack
        );
    };
}

/// Assert that a string is valid JSON and return the parsed value.
#[macro_export]
macro_rules! assert_json_valid {
    ($json:expr) => {{
        let json_str: &str = &$json;
        match serde_json::from_str::<serde_json::Value>(json_str) {
            Ok(value) => value,
            Err(e) => panic!("Invalid JSON: {}\nContent: {}", e, json_str),
        }
    }};
}

/// Assert that a string has no ANSI escape codes.
#[macro_export]
macro_rules! assert_no_ansi_codes {
    ($text:expr) => {
        let text: &str = &$text;
        assert!(
            !$crate::test_utils::has_ansi_codes(text),
            "Expected no ANSI codes, but found some.\nActual: {:?}",
            text
        );
    };
}

/// Assert two floats are equal within an epsilon.
///
/// ```rust,ignore
/// use opencodebar::assert_float_eq;
///
/// assert_float_eq!(70.0, 70.0000001);
/// assert_float_eq!(70.0, 70.05, 0.1); // Custom epsilon
/// ```
#[macro_export]
macro_rules! assert_float_eq {
    ($left:expr, $right:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = f64::EPSILON * 100.0;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
    ($left:expr, $right:expr, $epsilon:expr) => {
        let left: f64 = $left;
        let right: f64 = $right;
        let epsilon: f64 = $epsilon;
        assert!(
            (left - right).abs() < epsilon,
            "Float equality assertion failed: {} != {} (epsilon: {})",
            left,
            right,
            epsilon
        );
    };
}

// =============================================================================
// Test Helpers
// =============================================================================

/// Check if a string contains ANSI escape sequences.
#[must_use]
pub fn has_ansi_codes(text: &str) -> bool {
    text.contains('\x1b')
}

/// Strip ANSI escape codes from a string.
#[must_use]
pub fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                while let Some(next) = chars.next() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

// =============================================================================
// Tests
// =============================================================================
