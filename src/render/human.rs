//! Human-readable output.
//!
//! Renders reports as an aligned table with `colored` highlights. Cells are
//! padded before they are painted so ANSI codes never skew column widths.

use colored::{ColoredString, Colorize};

use crate::core::models::{BillingKind, ProviderListing, SubAccount, UsageReport};
use crate::util::format::{format_cost, format_percent, format_tokens};

const HEADERS: [&str; 4] = ["Provider", "Refresh", "Use", "Key Metrics"];
const COLUMN_GAP: &str = "   ";

/// How a cell is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Bold,
    Dim,
    Usage(u8),
    Warning,
    Error,
}

#[derive(Debug)]
struct Cell {
    text: String,
    tone: Tone,
}

impl Cell {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Tone::Plain)
    }
}

type Row = [Cell; 4];

fn paint(text: &str, tone: Tone, no_color: bool) -> String {
    if no_color {
        return text.to_string();
    }
    let painted: ColoredString = match tone {
        Tone::Plain => return text.to_string(),
        Tone::Bold => text.bold(),
        Tone::Dim => text.dimmed(),
        Tone::Usage(pct) if pct >= 90 => text.red(),
        Tone::Usage(pct) if pct >= 75 => text.yellow(),
        Tone::Usage(_) => text.green(),
        Tone::Warning => text.yellow(),
        Tone::Error => text.red(),
    };
    painted.to_string()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn usage_tone(pct: f64) -> Tone {
    Tone::Usage(pct.clamp(0.0, 255.0) as u8)
}

fn dash_if_empty(s: Option<&str>) -> String {
    s.filter(|s| !s.is_empty()).unwrap_or("-").to_string()
}

fn quota_metric(remaining: i64, entitlement: i64) -> String {
    if entitlement > 0 {
        format!("{remaining}/{entitlement} remaining")
    } else {
        "unlimited".to_string()
    }
}

fn account_row(account: &SubAccount) -> Row {
    let pct = if account.entitlement > 0 {
        (account.entitlement - account.remaining) * 100 / account.entitlement
    } else {
        0
    };
    #[allow(clippy::cast_precision_loss)]
    let pct = pct as f64;
    [
        Cell::new("  ↳", Tone::Dim),
        Cell::plain(account.label.clone()),
        Cell::new(format_percent(pct), usage_tone(pct)),
        Cell::plain(quota_metric(account.remaining, account.entitlement)),
    ]
}

fn report_rows(report: &UsageReport) -> Vec<Row> {
    if let Some(error) = &report.error {
        return vec![[
            Cell::new(report.name.clone(), Tone::Bold),
            Cell::new("(unavailable)", Tone::Warning),
            Cell::plain("-"),
            Cell::new(format!("⚠  {error}"), Tone::Error),
        ]];
    }

    match report.billing_kind {
        BillingKind::QuotaBased => {
            if let Some(accounts) = report.accounts.as_ref().filter(|a| !a.is_empty()) {
                let mut rows = vec![[
                    Cell::new(report.name.clone(), Tone::Bold),
                    Cell::plain(""),
                    Cell::plain(""),
                    Cell::plain(""),
                ]];
                rows.extend(accounts.iter().map(account_row));
                return rows;
            }
            let pct = report.usage_percent.unwrap_or(0.0);
            vec![[
                Cell::new(report.name.clone(), Tone::Bold),
                Cell::plain(dash_if_empty(report.refresh_label.as_deref())),
                Cell::new(format_percent(pct.trunc()), usage_tone(pct)),
                Cell::plain(quota_metric(
                    report.remaining.unwrap_or(0),
                    report.entitlement.unwrap_or(0),
                )),
            ]]
        }
        BillingKind::TokensBased => vec![[
            Cell::new(report.name.clone(), Tone::Bold),
            Cell::plain(dash_if_empty(report.refresh_label.as_deref())),
            Cell::plain("-"),
            Cell::plain(format!(
                "{} tokens used",
                format_tokens(report.tokens_used.unwrap_or(0))
            )),
        ]],
        BillingKind::PayAsYouGo => vec![[
            Cell::new(report.name.clone(), Tone::Bold),
            Cell::plain("-"),
            Cell::plain("-"),
            Cell::plain(format!("{} spent", format_cost(report.cost.unwrap_or(0.0)))),
        ]],
    }
}

/// Display order: multi-account reports first, then by name.
#[must_use]
pub fn display_order(reports: &[UsageReport]) -> Vec<&UsageReport> {
    let mut ordered: Vec<&UsageReport> = reports.iter().collect();
    ordered.sort_by(|a, b| {
        b.is_multi_account()
            .cmp(&a.is_multi_account())
            .then_with(|| a.name.cmp(&b.name))
    });
    ordered
}

fn render_table(rows: &[Row], no_color: bool) -> String {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.text.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| paint(&format!("{h:<w$}"), Tone::Bold, no_color))
        .collect();
    out.push_str(header.join(COLUMN_GAP).trim_end());
    out.push('\n');

    let divider: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    out.push_str(&paint(&divider.join(COLUMN_GAP), Tone::Dim, no_color));
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| paint(&format!("{:<w$}", cell.text), cell.tone, no_color))
            .collect();
        out.push_str(cells.join(COLUMN_GAP).trim_end());
        out.push('\n');
    }
    out
}

fn forecast_lines(reports: &[&UsageReport], no_color: bool) -> Vec<String> {
    reports
        .iter()
        .filter_map(|r| r.forecast.as_ref().map(|f| (r, f)))
        .map(|(report, forecast)| {
            let body = match (forecast.predicted_monthly_usage, forecast.predicted_extra_cost) {
                (Some(total), Some(extra)) => format!(
                    "~{total:.0} by month end, {} overage",
                    format_cost(extra)
                ),
                (Some(total), None) => format!("~{total:.0} by month end"),
                (None, _) => "not enough history".to_string(),
            };
            format!(
                "  {} {body} ({} confidence)",
                paint(&format!("{}:", report.name), Tone::Bold, no_color),
                forecast.confidence.to_string().to_lowercase()
            )
        })
        .collect()
}

/// Render usage reports for human consumption.
#[must_use]
pub fn render_usage(reports: &[UsageReport], no_color: bool) -> String {
    if reports.is_empty() {
        return paint(
            "No providers with credentials were found.",
            Tone::Dim,
            no_color,
        ) + "\n";
    }

    let ordered = display_order(reports);
    let rows: Vec<Row> = ordered.iter().flat_map(|r| report_rows(r)).collect();
    let mut out = render_table(&rows, no_color);

    let forecasts = forecast_lines(&ordered, no_color);
    if !forecasts.is_empty() {
        out.push('\n');
        out.push_str(&paint("Forecast", Tone::Bold, no_color));
        out.push('\n');
        for line in forecasts {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Render the provider catalog.
#[must_use]
pub fn render_providers(listings: &[ProviderListing], no_color: bool) -> String {
    let name_width = listings
        .iter()
        .map(|l| l.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Provider".len());
    let cli_width = listings
        .iter()
        .map(|l| l.cli_name.len())
        .max()
        .unwrap_or(0)
        .max("Name".len());
    let kind_width = "pay-as-you-go".len();

    let mut out = paint(
        &format!(
            "{:<name_width$}{COLUMN_GAP}{:<cli_width$}{COLUMN_GAP}{:<kind_width$}{COLUMN_GAP}Credentials",
            "Provider", "Name", "Billing"
        ),
        Tone::Bold,
        no_color,
    );
    out.push('\n');

    for listing in listings {
        let status = if listing.available {
            paint("found", Tone::Usage(0), no_color)
        } else {
            paint("missing", Tone::Dim, no_color)
        };
        out.push_str(&format!(
            "{:<name_width$}{COLUMN_GAP}{:<cli_width$}{COLUMN_GAP}{:<kind_width$}{COLUMN_GAP}{status}\n",
            listing.name,
            listing.cli_name,
            listing.billing_kind.label(),
        ));
    }
    out
}
