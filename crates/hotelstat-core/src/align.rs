use chrono::{Datelike, Months, NaiveDate};
use hotelstat_parser::{Region, Series, SeriesKind};
use serde::Serialize;

use crate::error::AlignmentError;

/// A series laid out on a contiguous monthly grid with no missing points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSeries {
    region: Region,
    kind: SeriesKind,
    start: NaiveDate,
    values: Vec<f64>,
    imputed: Vec<bool>,
}

impl AlignedSeries {
    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.month_at(self.values.len().saturating_sub(1))
            .unwrap_or(self.start)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `true` at every grid point that had no observation and was filled in.
    pub fn imputed(&self) -> &[bool] {
        &self.imputed
    }

    pub fn imputed_count(&self) -> usize {
        self.imputed.iter().filter(|flag| **flag).count()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn month_at(&self, index: usize) -> Option<NaiveDate> {
        let offset = u32::try_from(index).ok()?;
        self.start.checked_add_months(Months::new(offset))
    }

    pub fn months(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).filter_map(|idx| self.month_at(idx))
    }

    /// Zero-based calendar month (January = 0) of grid point `index`.
    pub fn calendar_position(&self, index: usize) -> usize {
        (self.start.month0() as usize + index) % 12
    }
}

/// Reindexes `series` onto one point per month from its first to its last
/// observation.
pub fn align(series: &Series) -> Result<AlignedSeries, AlignmentError> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Err(AlignmentError::InsufficientData);
    };

    let start_index = month_index(first.timestamp);
    let span = month_index(last.timestamp) - start_index;
    let mut grid: Vec<Option<f64>> = vec![None; span as usize + 1];
    for observation in series.observations() {
        let slot = (month_index(observation.timestamp) - start_index) as usize;
        grid[slot] = Some(observation.value);
    }

    let imputed = grid.iter().map(Option::is_none).collect();
    let values = fill_missing(&grid)?;

    Ok(AlignedSeries {
        region: series.region().clone(),
        kind: series.kind(),
        start: first.timestamp,
        values,
        imputed,
    })
}

/// Fills interior gaps by linear interpolation, then anything left at the
/// edges with the mean of the known points.
pub fn fill_missing(grid: &[Option<f64>]) -> Result<Vec<f64>, AlignmentError> {
    let known: Vec<f64> = grid.iter().flatten().copied().collect();
    if known.is_empty() {
        return Err(AlignmentError::InsufficientData);
    }
    let mean = known.iter().sum::<f64>() / known.len() as f64;

    Ok(interpolate_gaps(grid)
        .into_iter()
        .map(|value| value.unwrap_or(mean))
        .collect())
}

/// Linear interpolation by position between the nearest known neighbours.
/// Leading and trailing gaps are left untouched.
pub fn interpolate_gaps(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut filled = values.to_vec();
    let mut previous: Option<(usize, f64)> = None;

    for (idx, value) in values.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        if let Some((prev_idx, prev_value)) = previous {
            let span = (idx - prev_idx) as f64;
            for gap in prev_idx + 1..idx {
                let weight = (gap - prev_idx) as f64 / span;
                filled[gap] = Some(prev_value + (value - prev_value) * weight);
            }
        }
        previous = Some((idx, value));
    }

    filled
}

fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_index_counts_across_years() {
        let dec = NaiveDate::from_ymd_opt(2019, 12, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert_eq!(month_index(feb) - month_index(dec), 2);
    }

    #[test]
    fn fill_missing_uses_mean_at_edges() {
        let grid = [None, Some(2.0), None, Some(6.0), None];
        let filled = fill_missing(&grid).unwrap();
        assert_eq!(filled, vec![4.0, 2.0, 4.0, 6.0, 4.0]);
    }

    #[test]
    fn fill_missing_rejects_empty_grid() {
        assert_eq!(
            fill_missing(&[None, None]),
            Err(AlignmentError::InsufficientData)
        );
    }
}
