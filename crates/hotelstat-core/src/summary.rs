use chrono::{Datelike, NaiveDate};
use hotelstat_parser::{Series, SeriesKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
            Direction::Stable => "stable",
        }
    }
}

/// Headline figures for one series: averages, extremes and the change from
/// the first to the latest observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub region: String,
    pub kind: SeriesKind,
    pub observations: usize,
    pub first_month: NaiveDate,
    pub first_value: f64,
    pub last_month: NaiveDate,
    pub last_value: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub direction: Direction,
}

impl SeriesSummary {
    pub fn from_series(series: &Series) -> Option<Self> {
        let first = series.first()?;
        let last = series.last()?;

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for value in series.values() {
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }

        let direction = if last.value > first.value {
            Direction::Increasing
        } else if last.value < first.value {
            Direction::Decreasing
        } else {
            Direction::Stable
        };

        Some(Self {
            region: series.region().to_string(),
            kind: series.kind(),
            observations: series.len(),
            first_month: first.timestamp,
            first_value: first.value,
            last_month: last.timestamp,
            last_value: last.value,
            mean: sum / series.len() as f64,
            min,
            max,
            direction,
        })
    }

    /// This series' mean as a percentage of `other`'s mean.
    pub fn relative_to(&self, other: &SeriesSummary) -> Option<f64> {
        if other.mean == 0.0 {
            return None;
        }
        Some(self.mean / other.mean * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthStats {
    /// Calendar month, 1 to 12.
    pub month: u32,
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Distribution of each calendar month's values across the years of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyProfile {
    pub region: String,
    pub months: Vec<MonthStats>,
}

impl MonthlyProfile {
    pub fn from_series(series: &Series) -> Self {
        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); 12];
        for observation in series.observations() {
            buckets[observation.timestamp.month0() as usize].push(observation.value);
        }

        let months = buckets
            .into_iter()
            .zip(1u32..)
            .map(|(mut values, month)| {
                values.sort_by(f64::total_cmp);
                let count = values.len();
                let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
                MonthStats {
                    month,
                    count,
                    mean,
                    median: median(&values),
                    min: values.first().copied(),
                    max: values.last().copied(),
                }
            })
            .collect();

        Self {
            region: series.region().to_string(),
            months,
        }
    }

    pub fn month(&self, month: u32) -> Option<&MonthStats> {
        self.months.iter().find(|stats| stats.month == month)
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}
