//! Fee income, cost thresholds and bonus per emitted DT.

use crate::emission::{EmissionClock, EmissionSnapshot};
use crate::error::EconomicsError;
use serde::Serialize;

pub const DEFAULT_TAKE_RATE: f64 = 0.002;
pub const DEFAULT_HIGH_RATE: f64 = 0.3;
pub const DEFAULT_LOW_RATE: f64 = 0.5;

/// A derived figure that may be undefined (zero release at startup).
pub type Metric = Result<f64, EconomicsError>;

/// Printed and persisted in place of a figure that cannot be computed.
pub const UNDEFINED: &str = "undefined";

pub fn format_metric(metric: &Metric) -> String {
    match metric {
        Ok(v) => format!("{v:.4}"),
        Err(_) => UNDEFINED.to_string(),
    }
}

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Economics {
    pub take_rate: f64,
    /// Utilization fraction for the "high" cost threshold.
    pub high_rate: f64,
    /// Utilization fraction for the "low" cost threshold.
    pub low_rate: f64,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            take_rate: DEFAULT_TAKE_RATE,
            high_rate: DEFAULT_HIGH_RATE,
            low_rate: DEFAULT_LOW_RATE,
        }
    }
}

impl Economics {
    /// Exchange fee income on `fiat_amount` of traded volume.
    pub fn income(&self, fiat_amount: f64) -> f64 {
        self.take_rate * fiat_amount
    }

    /// Fiat cost per emitted DT at the given utilization `rate`.
    pub fn operating_cost(&self, daily_release: f64, fiat_amount: f64, rate: f64) -> Metric {
        if !is_positive(daily_release) {
            return Err(EconomicsError::ZeroRelease);
        }
        if !is_positive(rate) {
            return Err(EconomicsError::ZeroRate);
        }
        Ok(self.income(fiat_amount) / daily_release / rate)
    }

    pub fn high_cost(&self, daily_release: f64, fiat_amount: f64) -> Metric {
        self.operating_cost(daily_release, fiat_amount, self.high_rate)
    }

    pub fn low_cost(&self, daily_release: f64, fiat_amount: f64) -> Metric {
        self.operating_cost(daily_release, fiat_amount, self.low_rate)
    }

    /// Fiat income per DT released to date.
    pub fn bonus(&self, total_release: f64, fiat_amount: f64) -> Metric {
        if !is_positive(total_release) {
            return Err(EconomicsError::ZeroRelease);
        }
        Ok(self.income(fiat_amount) / total_release)
    }

    /// Projects cumulative bonus per DT from `start_day` through `end_day`
    /// inclusive, assuming `avg_fiat_volume` is traded every day.
    pub fn project_by_volume(
        &self,
        clock: &EmissionClock,
        avg_fiat_volume: f64,
        start_day: u32,
        end_day: u32,
    ) -> Result<Projection, EconomicsError> {
        if start_day == 0 || end_day < start_day {
            return Err(EconomicsError::InvalidRange);
        }
        let start_period = clock.emission_period(start_day);
        let daily_income = self.income(avg_fiat_volume);
        let start_bonus = self.bonus(clock.daily_release(start_period), avg_fiat_volume)?;

        let mut total_release = clock.total_release(start_day, start_period);
        let mut total_bonus = 0.0;
        for day in start_day..=end_day {
            if day != start_day {
                total_release += clock.daily_release(clock.emission_period(day));
            }
            if !is_positive(total_release) {
                return Err(EconomicsError::ZeroRelease);
            }
            total_bonus += daily_income / total_release;
        }

        let days = f64::from(end_day - start_day + 1);
        Ok(Projection {
            start_bonus,
            total_release,
            total_bonus,
            daily_bonus: total_bonus / days,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Projection {
    /// Fee income per DT emitted on the first day.
    pub start_bonus: f64,
    /// DT released through the last day.
    pub total_release: f64,
    /// Bonus per DT accumulated over the whole range.
    pub total_bonus: f64,
    pub daily_bonus: f64,
}

/// The figures persisted once a day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyFigures {
    pub total_amount: f64,
    pub total_release: f64,
    pub high_cost: Metric,
    pub low_cost: Metric,
    pub bonus: Metric,
}

impl DailyFigures {
    pub fn compute(snapshot: &EmissionSnapshot, fiat_amount: f64, economics: &Economics) -> Self {
        Self {
            total_amount: fiat_amount,
            total_release: snapshot.total_release,
            high_cost: economics.high_cost(snapshot.today_release, fiat_amount),
            low_cost: economics.low_cost(snapshot.today_release, fiat_amount),
            bonus: economics.bonus(snapshot.total_release, fiat_amount),
        }
    }
}
