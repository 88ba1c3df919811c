//! JSON output.
//!
//! Every payload is wrapped in a [`RobotOutput`] envelope so scripts can key
//! on `schemaVersion` and `command`.

use serde::Serialize;

use crate::core::models::{ProviderListing, RobotOutput, UsageReport};
use crate::error::Result;

/// Render any serializable value as compact JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json<T: Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string(output)?)
}

/// Render any serializable value as indented JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_json_pretty<T: Serialize>(output: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

fn render<T: Serialize>(output: &T, pretty: bool) -> Result<String> {
    if pretty {
        render_json_pretty(output)
    } else {
        render_json(output)
    }
}

/// Render usage reports inside the `usage` envelope.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_usage_json(
    reports: &[UsageReport],
    errors: Vec<String>,
    pretty: bool,
) -> Result<String> {
    render(&RobotOutput::new("usage", reports, errors), pretty)
}

/// Render the provider catalog inside the `providers` envelope.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn render_providers_json(listings: &[ProviderListing], pretty: bool) -> Result<String> {
    render(&RobotOutput::new("providers", listings, Vec::new()), pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{BillingKind, SCHEMA_VERSION};

    #[test]
    fn usage_envelope() {
        let reports = vec![
            UsageReport::quota("GitHub Copilot", 120, 300),
            UsageReport::failed("Claude", BillingKind::QuotaBased, "boom"),
        ];
        let json = render_usage_json(&reports, vec!["Claude: boom".to_string()], false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["command"], "usage");
        assert_eq!(value["data"][0]["remaining"], 120);
        assert_eq!(value["data"][1]["error"], "boom");
        assert!(value["data"][1].get("remaining").is_none());
        assert_eq!(value["errors"][0], "Claude: boom");
    }

    #[test]
    fn pretty_output_is_indented() {
        let json = render_usage_json(&[], Vec::new(), true).unwrap();
        assert!(json.contains("\n  "));
    }

    #[test]
    fn providers_envelope() {
        let listings = vec![ProviderListing {
            name: "Vertex AI".to_string(),
            cli_name: "vertex".to_string(),
            billing_kind: BillingKind::TokensBased,
            available: false,
        }];
        let value: serde_json::Value =
            serde_json::from_str(&render_providers_json(&listings, false).unwrap()).unwrap();
        assert_eq!(value["command"], "providers");
        assert_eq!(value["data"][0]["cliName"], "vertex");
        assert_eq!(value["data"][0]["billingKind"], "tokens-based");
    }
}
