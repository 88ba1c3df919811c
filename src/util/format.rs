//! Number formatting for the usage table.

/// Whole-number percentage, `60%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.0}%")
}

/// US dollars with cents, `$3.50`.
#[must_use]
pub fn format_cost(value: f64) -> String {
    format!("${value:.2}")
}

const TOKEN_SCALES: [(i64, &str); 2] = [(1_000_000, "M"), (1_000, "K")];

/// Token count with one truncated decimal above a thousand (`1.5M`, `12.5K`).
#[must_use]
pub fn format_tokens(value: i64) -> String {
    let magnitude = value.unsigned_abs();
    let sign = if value < 0 { "-" } else { "" };

    TOKEN_SCALES
        .iter()
        .find(|(scale, _)| magnitude >= scale.unsigned_abs())
        .map_or_else(
            || value.to_string(),
            |&(scale, suffix)| {
                let scale = scale.unsigned_abs();
                let tenths = magnitude % scale / (scale / 10);
                format!("{sign}{}.{tenths}{suffix}", magnitude / scale)
            },
        )
}
