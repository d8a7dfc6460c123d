//! Additive seasonal decomposition of monthly series.
//!
//! `observed = trend + seasonal + residual`, with the trend estimated by a
//! centered moving average over one period and the seasonal component by
//! averaging the detrended values of each calendar month.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::align::AlignedSeries;

pub const PERIOD: usize = 12;
/// A series must be strictly longer than this to be decomposed.
pub const MIN_HISTORY: usize = 2 * PERIOD;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decomposition {
    start: NaiveDate,
    observed: Vec<f64>,
    trend: Vec<Option<f64>>,
    seasonal: Vec<f64>,
    residual: Vec<Option<f64>>,
    seasonal_indices: [f64; PERIOD],
}

impl Decomposition {
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn observed(&self) -> &[f64] {
        &self.observed
    }

    pub fn trend(&self) -> &[Option<f64>] {
        &self.trend
    }

    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }

    pub fn residual(&self) -> &[Option<f64>] {
        &self.residual
    }

    /// Normalized seasonal effect per calendar month, January first.
    pub fn seasonal_indices(&self) -> &[f64; PERIOD] {
        &self.seasonal_indices
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// `trend + seasonal + residual` at `index`, where the trend is defined.
    pub fn reconstructed(&self, index: usize) -> Option<f64> {
        let trend = (*self.trend.get(index)?)?;
        let residual = (*self.residual.get(index)?)?;
        Some(trend + self.seasonal[index] + residual)
    }

    pub fn trend_range(&self) -> Option<(f64, f64)> {
        value_range(self.trend.iter().flatten().copied())
    }

    pub fn seasonal_range(&self) -> Option<(f64, f64)> {
        value_range(self.seasonal.iter().copied())
    }

    pub fn residual_range(&self) -> Option<(f64, f64)> {
        value_range(self.residual.iter().flatten().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DecompositionSkipped {
    InsufficientHistory { points: usize, required: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DecompositionOutcome {
    Decomposed(Decomposition),
    Skipped(DecompositionSkipped),
}

impl DecompositionOutcome {
    pub fn decomposition(&self) -> Option<&Decomposition> {
        match self {
            DecompositionOutcome::Decomposed(decomposition) => Some(decomposition),
            DecompositionOutcome::Skipped(_) => None,
        }
    }

    pub fn is_decomposed(&self) -> bool {
        matches!(self, DecompositionOutcome::Decomposed(_))
    }
}

pub fn decompose(aligned: &AlignedSeries) -> DecompositionOutcome {
    let observed = aligned.values();
    let n = observed.len();
    if n <= MIN_HISTORY {
        debug!(
            region = aligned.region().as_str(),
            points = n,
            "Too little history to decompose"
        );
        return DecompositionOutcome::Skipped(DecompositionSkipped::InsufficientHistory {
            points: n,
            required: MIN_HISTORY + 1,
        });
    }

    let trend = centered_moving_average(observed, PERIOD);

    let mut sums = [0.0_f64; PERIOD];
    let mut counts = [0usize; PERIOD];
    for (idx, (value, trend_value)) in observed.iter().zip(&trend).enumerate() {
        if let Some(trend_value) = trend_value {
            let position = aligned.calendar_position(idx);
            sums[position] += value - trend_value;
            counts[position] += 1;
        }
    }

    // n > 2 * PERIOD leaves at least PERIOD consecutive trend points, so every
    // calendar month has a count.
    let mut seasonal_indices = [0.0_f64; PERIOD];
    for position in 0..PERIOD {
        if counts[position] > 0 {
            seasonal_indices[position] = sums[position] / counts[position] as f64;
        }
    }
    let offset = seasonal_indices.iter().sum::<f64>() / PERIOD as f64;
    for index in seasonal_indices.iter_mut() {
        *index -= offset;
    }

    let seasonal: Vec<f64> = (0..n)
        .map(|idx| seasonal_indices[aligned.calendar_position(idx)])
        .collect();

    let residual = observed
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((value, trend_value), seasonal_value)| {
            trend_value.map(|trend_value| value - trend_value - seasonal_value)
        })
        .collect();

    DecompositionOutcome::Decomposed(Decomposition {
        start: aligned.start(),
        observed: observed.to_vec(),
        trend,
        seasonal,
        residual,
        seasonal_indices,
    })
}

/// Mean of `window` points around each index: `window / 2` before it and the
/// rest after it. Indices whose window runs off either end are `None`.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut averages = vec![None; n];
    if window == 0 || n < window {
        return averages;
    }

    let before = window / 2;
    let after = window - before - 1;
    for (idx, slot) in averages.iter_mut().enumerate().take(n - after).skip(before) {
        let sum: f64 = values[idx - before..=idx + after].iter().sum();
        *slot = Some(sum / window as f64);
    }

    averages
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |range, value| match range {
        None => Some((value, value)),
        Some((low, high)) => Some((low.min(value), high.max(value))),
    })
}
