//! Month-end usage forecasting.
//!
//! Projects the rest of the month from a short daily history: a weighted
//! average of the newest days, scaled down (or up) on weekends by the ratio
//! observed in the history. History is ordered newest first.

use chrono::{Datelike, Days, NaiveDate, Utc, Weekday};

use crate::core::models::{BillingKind, Confidence, DailyUsage, Forecast, UsageReport};
use crate::core::provider::ProviderId;

/// Weights applied to the newest seven days, newest first.
pub const RECENCY_WEIGHTS: [f64; 7] = [1.5, 1.5, 1.2, 1.2, 1.2, 1.0, 1.0];

/// Lower bound for the weekend/weekday ratio.
pub const MIN_WEEKEND_RATIO: f64 = 0.1;

/// Default price of one unit beyond the entitlement, in USD.
pub const DEFAULT_OVERAGE_RATE: f64 = 0.04;

/// Calendar days left in the month after today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemainingDays {
    pub weekdays: u32,
    pub weekends: u32,
}

impl RemainingDays {
    /// Days strictly after `today` through the last day of its month.
    #[must_use]
    pub fn after(today: NaiveDate) -> Self {
        let mut counts = Self::default();
        let mut day = today;
        while let Some(next) = day.checked_add_days(Days::new(1)) {
            if next.month() != today.month() {
                break;
            }
            if is_weekend(next) {
                counts.weekends += 1;
            } else {
                counts.weekdays += 1;
            }
            day = next;
        }
        counts
    }
}

/// Every intermediate value of a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBreakdown {
    pub weighted_average: f64,
    pub weekday_mean: f64,
    pub weekend_mean: f64,
    pub weekend_ratio: f64,
    pub remaining: RemainingDays,
    pub projected_future: f64,
    pub current_total: f64,
    pub predicted_total: f64,
    /// `None` when no overage rate applies.
    pub extra_cost: Option<f64>,
    pub confidence: Confidence,
}

/// Forecast calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastEngine {
    overage_rate: Option<f64>,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::new(DEFAULT_OVERAGE_RATE)
    }
}

impl ForecastEngine {
    #[must_use]
    pub const fn new(overage_rate: f64) -> Self {
        Self {
            overage_rate: Some(overage_rate),
        }
    }

    /// Engine that projects usage but never prices it.
    #[must_use]
    pub const fn unpriced() -> Self {
        Self { overage_rate: None }
    }

    #[must_use]
    pub const fn overage_rate(&self) -> Option<f64> {
        self.overage_rate
    }

    /// Engine for one provider. The configured rate replaces the list price
    /// of providers that bill overage; the rest stay unpriced.
    #[must_use]
    pub const fn for_provider(self, id: ProviderId) -> Self {
        match id.overage_rate() {
            Some(_) => self,
            None => Self::unpriced(),
        }
    }

    /// Forecast relative to today's UTC date.
    #[must_use]
    pub fn predict(&self, history: &[DailyUsage], report: &UsageReport) -> Forecast {
        self.predict_on(history, report, Utc::now().date_naive())
    }

    /// Forecast relative to an explicit `today`.
    #[must_use]
    pub fn predict_on(
        &self,
        history: &[DailyUsage],
        report: &UsageReport,
        today: NaiveDate,
    ) -> Forecast {
        self.project(history, report, RemainingDays::after(today))
            .map_or_else(Forecast::insufficient, |b| Forecast {
                predicted_monthly_usage: Some(b.predicted_total),
                predicted_extra_cost: b.extra_cost,
                confidence: b.confidence,
            })
    }

    /// Full projection, or `None` with fewer than two history points.
    #[must_use]
    pub fn project(
        &self,
        history: &[DailyUsage],
        report: &UsageReport,
        remaining: RemainingDays,
    ) -> Option<ForecastBreakdown> {
        if history.len() < 2 {
            return None;
        }

        let (weighted_sum, weight_sum) = history
            .iter()
            .zip(RECENCY_WEIGHTS)
            .fold((0.0, 0.0), |(sum, weights), (day, w)| {
                (day.included_requests.mul_add(w, sum), weights + w)
            });
        let weighted_average = weighted_sum / weight_sum;

        let (weekday_mean, weekend_mean) = day_type_means(history);
        let weekend_ratio = if weekday_mean > 0.0 {
            (weekend_mean / weekday_mean).max(MIN_WEEKEND_RATIO)
        } else {
            MIN_WEEKEND_RATIO
        };

        let projected_future = (weighted_average * weekend_ratio)
            .mul_add(f64::from(remaining.weekends), weighted_average * f64::from(remaining.weekdays));

        let current_total = usage_to_date(report);
        let predicted_total = current_total + projected_future;

        #[allow(clippy::cast_precision_loss)]
        let entitlement = report.entitlement.unwrap_or(0) as f64;
        let extra_cost = self
            .overage_rate
            .map(|rate| (predicted_total - entitlement).max(0.0) * rate);

        Some(ForecastBreakdown {
            weighted_average,
            weekday_mean,
            weekend_mean,
            weekend_ratio,
            remaining,
            projected_future,
            current_total,
            predicted_total,
            extra_cost,
            confidence: confidence_for(history.len()),
        })
    }
}

/// Confidence tier for a history of `points` days.
#[must_use]
pub const fn confidence_for(points: usize) -> Confidence {
    match points {
        0..=2 => Confidence::Low,
        3 => Confidence::Medium,
        _ => Confidence::High,
    }
}

/// Units consumed so far this month, in the report's own billing unit.
#[allow(clippy::cast_precision_loss)]
fn usage_to_date(report: &UsageReport) -> f64 {
    match report.billing_kind {
        BillingKind::QuotaBased => {
            let entitlement = report.entitlement.unwrap_or(0);
            (entitlement - report.remaining.unwrap_or(0)) as f64
        }
        BillingKind::TokensBased => report.tokens_used.unwrap_or(0) as f64,
        BillingKind::PayAsYouGo => report.cost.unwrap_or(0.0),
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mean usage on weekdays and on weekend days. Unparseable dates are ignored.
fn day_type_means(history: &[DailyUsage]) -> (f64, f64) {
    let mut weekday = (0.0, 0u32);
    let mut weekend = (0.0, 0u32);

    for day in history {
        let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") else {
            continue;
        };
        let bucket = if is_weekend(date) {
            &mut weekend
        } else {
            &mut weekday
        };
        bucket.0 += day.included_requests;
        bucket.1 += 1;
    }

    let mean = |(sum, count): (f64, u32)| {
        if count == 0 {
            0.0
        } else {
            sum / f64::from(count)
        }
    };
    (mean(weekday), mean(weekend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_float_eq;

    fn day(date: &str, requests: f64) -> DailyUsage {
        DailyUsage::new(date, requests)
    }

    /// One week, Monday 2026-03-02 through Sunday 2026-03-08.
    fn golden_week() -> Vec<DailyUsage> {
        vec![
            day("2026-03-02", 12.0),
            day("2026-03-03", 15.0),
            day("2026-03-04", 8.0),
            day("2026-03-05", 2.0),
            day("2026-03-06", 1.0),
            day("2026-03-07", 14.0),
            day("2026-03-08", 11.0),
        ]
    }

    fn copilot_report() -> UsageReport {
        UsageReport::quota("GitHub Copilot", 40, 100)
    }

    #[test]
    fn golden_fixture() {
        let history = golden_week();
        let remaining = RemainingDays {
            weekdays: 10,
            weekends: 4,
        };
        let b = ForecastEngine::default()
            .project(&history, &copilot_report(), remaining)
            .unwrap();

        let weighted_sum = 12.0 * 1.5 + 15.0 * 1.5 + 8.0 * 1.2 + 2.0 * 1.2 + 1.0 * 1.2 + 14.0 + 11.0;
        let avg = weighted_sum / 8.6;
        assert_float_eq!(b.weighted_average, avg, 1e-9);
        assert_float_eq!(b.weekday_mean, 7.6, 1e-9);
        assert_float_eq!(b.weekend_mean, 12.5, 1e-9);

        let ratio = 12.5 / 7.6;
        assert_float_eq!(b.weekend_ratio, ratio, 1e-9);

        let projected = avg * 10.0 + avg * ratio * 4.0;
        assert_float_eq!(b.projected_future, projected, 1e-9);
        assert_float_eq!(b.current_total, 60.0, 1e-9);
        assert_float_eq!(b.predicted_total, 60.0 + projected, 1e-9);
        assert_float_eq!(b.extra_cost.unwrap(), (60.0 + projected - 100.0) * 0.04, 1e-9);
        assert_eq!(b.confidence, Confidence::High);

        assert_float_eq!(b.predicted_total, 211.7166, 1e-3);
        assert_float_eq!(b.extra_cost.unwrap(), 4.4687, 1e-3);
    }

    #[test]
    fn fewer_than_two_points_is_low_without_numbers() {
        let engine = ForecastEngine::default();
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        for history in [vec![], vec![day("2026-03-09", 5.0)]] {
            let forecast = engine.predict_on(&history, &copilot_report(), today);
            assert_eq!(forecast, Forecast::insufficient());
        }
    }

    #[test]
    fn weekday_only_history_floors_ratio() {
        let history = vec![day("2026-03-02", 10.0), day("2026-03-03", 10.0)];
        let b = ForecastEngine::default()
            .project(&history, &copilot_report(), RemainingDays::default())
            .unwrap();
        assert_float_eq!(b.weekend_ratio, MIN_WEEKEND_RATIO);
    }

    #[test]
    fn weekend_only_history_uses_floor() {
        let history = vec![day("2026-03-07", 10.0), day("2026-03-08", 20.0)];
        let b = ForecastEngine::default()
            .project(&history, &copilot_report(), RemainingDays::default())
            .unwrap();
        assert_float_eq!(b.weekday_mean, 0.0);
        assert_float_eq!(b.weekend_ratio, MIN_WEEKEND_RATIO);
    }

    #[test]
    fn unparseable_dates_are_ignored_for_day_types() {
        let history = vec![
            day("2026-03-02", 10.0),
            day("yesterday", 1000.0),
            day("2026-03-07", 5.0),
        ];
        let b = ForecastEngine::default()
            .project(&history, &copilot_report(), RemainingDays::default())
            .unwrap();
        assert_float_eq!(b.weekday_mean, 10.0);
        assert_float_eq!(b.weekend_mean, 5.0);
        // Still part of the weighted average.
        assert!(b.weighted_average > 100.0);
    }

    #[test]
    fn only_first_seven_points_are_weighted() {
        let mut history: Vec<DailyUsage> = (0..7).map(|_| day("x", 1.0)).collect();
        history.push(day("x", 1_000.0));
        let b = ForecastEngine::default()
            .project(&history, &copilot_report(), RemainingDays::default())
            .unwrap();
        assert_float_eq!(b.weighted_average, 1.0);
    }

    #[test]
    fn no_extra_cost_within_entitlement() {
        let history = vec![day("2026-03-02", 1.0), day("2026-03-03", 1.0)];
        let b = ForecastEngine::default()
            .project(
                &history,
                &copilot_report(),
                RemainingDays {
                    weekdays: 2,
                    weekends: 0,
                },
            )
            .unwrap();
        assert_float_eq!(b.predicted_total, 62.0);
        assert_eq!(b.extra_cost, Some(0.0));
    }

    #[test]
    fn overage_rate_is_configurable() {
        let history = vec![day("2026-03-02", 50.0), day("2026-03-03", 50.0)];
        let remaining = RemainingDays {
            weekdays: 1,
            weekends: 0,
        };
        let b = ForecastEngine::new(0.10)
            .project(&history, &copilot_report(), remaining)
            .unwrap();
        // 60 used + 50 projected = 110 → 10 over at $0.10.
        assert_float_eq!(b.extra_cost.unwrap(), 1.0, 1e-9);
    }

    #[test]
    fn tokens_report_projects_from_tokens_used_without_pricing() {
        let history = vec![day("2026-03-02", 500.0), day("2026-03-03", 500.0)];
        let remaining = RemainingDays {
            weekdays: 2,
            weekends: 0,
        };
        let b = ForecastEngine::default()
            .for_provider(ProviderId::VertexAi)
            .project(&history, &UsageReport::tokens("Vertex AI", 4_000), remaining)
            .unwrap();
        assert_float_eq!(b.current_total, 4_000.0);
        assert_float_eq!(b.predicted_total, 5_000.0);
        assert_eq!(b.extra_cost, None);
    }

    #[test]
    fn configured_rate_applies_only_to_billing_providers() {
        let engine = ForecastEngine::new(0.10);
        assert_eq!(engine.for_provider(ProviderId::Copilot).overage_rate(), Some(0.10));
        assert_eq!(engine.for_provider(ProviderId::Claude).overage_rate(), None);
    }

    #[test]
    fn unpriced_forecast_has_usage_but_no_cost() {
        let history = vec![day("2026-03-02", 10.0), day("2026-03-03", 10.0)];
        let today = NaiveDate::from_ymd_opt(2026, 3, 30).unwrap();
        let forecast = ForecastEngine::unpriced().predict_on(
            &history,
            &UsageReport::quota("Claude", 10, 100),
            today,
        );
        // 90 used + one weekday (Tuesday 31st) at 10.
        assert_float_eq!(forecast.predicted_monthly_usage.unwrap(), 100.0, 1e-9);
        assert_eq!(forecast.predicted_extra_cost, None);
    }

    #[test]
    fn confidence_tiers() {
        assert_eq!(confidence_for(2), Confidence::Low);
        assert_eq!(confidence_for(3), Confidence::Medium);
        assert_eq!(confidence_for(4), Confidence::High);
        assert_eq!(confidence_for(30), Confidence::High);
    }

    #[test]
    fn remaining_days_in_march() {
        // Tuesday 2026-03-17: 18th..31st = 14 days, of which 4 are weekend days.
        let today = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        assert_eq!(
            RemainingDays::after(today),
            RemainingDays {
                weekdays: 10,
                weekends: 4
            }
        );
    }

    #[test]
    fn remaining_days_on_last_day_is_zero() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(RemainingDays::after(today), RemainingDays::default());
    }

    #[test]
    fn predict_on_golden_date_matches_project() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        let engine = ForecastEngine::default();
        let forecast = engine.predict_on(&golden_week(), &copilot_report(), today);
        assert_eq!(forecast.confidence, Confidence::High);
        assert_float_eq!(forecast.predicted_monthly_usage.unwrap(), 211.7166, 1e-3);
    }
}
