use chrono::{Datelike, NaiveDate};

use hotelstat_core::align::align;
use hotelstat_core::decompose::{
    centered_moving_average, decompose, DecompositionOutcome, DecompositionSkipped, PERIOD,
};
use hotelstat_core::parser::{Region, Series, SeriesKind};

const PATTERN: [f64; 12] = [
    -12.0, -9.0, -4.0, 1.0, 5.0, 9.0, 14.0, 12.0, 6.0, -2.0, -8.0, -12.0,
];

fn monthly_series(start: NaiveDate, len: usize, value: impl Fn(usize, NaiveDate) -> f64) -> Series {
    let region = Region::new("France").expect("valid region");
    let points = (0..len).map(|idx| {
        let date = start
            .checked_add_months(chrono::Months::new(idx as u32))
            .expect("month in range");
        (date, value(idx, date))
    });
    Series::from_points(region, SeriesKind::Rate, points)
}

fn start(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid month")
}

#[test]
fn one_year_is_insufficient_history() {
    let series = monthly_series(start(2020, 1), 12, |idx, _| idx as f64);
    let aligned = align(&series).expect("alignment failed");

    assert_eq!(
        decompose(&aligned),
        DecompositionOutcome::Skipped(DecompositionSkipped::InsufficientHistory {
            points: 12,
            required: 25,
        })
    );
}

#[test]
fn exactly_two_years_is_still_skipped() {
    let series = monthly_series(start(2020, 1), 24, |idx, _| idx as f64);
    let aligned = align(&series).expect("alignment failed");
    assert!(!decompose(&aligned).is_decomposed());
}

#[test]
fn moving_average_is_centered_with_six_before_and_five_after() {
    let values: Vec<f64> = (0..30).map(|v| v as f64).collect();
    let trend = centered_moving_average(&values, PERIOD);

    assert!(trend[..6].iter().all(Option::is_none));
    assert!(trend[25..].iter().all(Option::is_none));
    for (idx, value) in trend.iter().enumerate().take(25).skip(6) {
        let expected = idx as f64 - 0.5;
        assert!((value.expect("defined") - expected).abs() < 1e-12);
    }
}

#[test]
fn moving_average_of_short_input_is_undefined() {
    assert_eq!(centered_moving_average(&[1.0, 2.0, 3.0], 12), vec![None; 3]);
}

#[test]
fn constant_level_with_pattern_recovers_pattern() {
    let series = monthly_series(start(2019, 4), 40, |_, date| {
        100.0 + PATTERN[date.month0() as usize]
    });
    let aligned = align(&series).expect("alignment failed");
    let outcome = decompose(&aligned);
    let decomposition = outcome.decomposition().expect("expected decomposition");

    for trend in decomposition.trend().iter().flatten() {
        assert!((trend - 100.0).abs() < 1e-9);
    }
    for (idx, expected) in PATTERN.iter().enumerate() {
        assert!((decomposition.seasonal_indices()[idx] - expected).abs() < 1e-9);
    }
    for residual in decomposition.residual().iter().flatten() {
        assert!(residual.abs() < 1e-9);
    }
}

#[test]
fn decomposition_invariants_hold_on_noisy_trend() {
    let series = monthly_series(start(2011, 1), 157, |idx, date| {
        let wobble = ((idx * 7919) % 13) as f64 * 0.37;
        55.0 + 0.08 * idx as f64 + PATTERN[date.month0() as usize] + wobble
    });
    let aligned = align(&series).expect("alignment failed");
    let outcome = decompose(&aligned);
    let decomposition = outcome.decomposition().expect("expected decomposition");
    let n = aligned.len();

    assert_eq!(decomposition.len(), n);
    assert_eq!(decomposition.trend().len(), n);
    assert_eq!(decomposition.seasonal().len(), n);
    assert_eq!(decomposition.residual().len(), n);

    assert!(decomposition.trend()[..6].iter().all(Option::is_none));
    assert!(decomposition.trend()[n - 5..].iter().all(Option::is_none));
    assert!(decomposition.trend()[6..n - 5].iter().all(Option::is_some));
    assert_eq!(
        decomposition.residual().iter().map(Option::is_some).collect::<Vec<_>>(),
        decomposition.trend().iter().map(Option::is_some).collect::<Vec<_>>()
    );

    let seasonal_sum: f64 = decomposition.seasonal_indices().iter().sum();
    assert!(seasonal_sum.abs() < 1e-9);

    for idx in 0..n - PERIOD {
        assert_eq!(decomposition.seasonal()[idx], decomposition.seasonal()[idx + PERIOD]);
    }
    for idx in 0..n {
        if let Some(rebuilt) = decomposition.reconstructed(idx) {
            assert!((aligned.values()[idx] - rebuilt).abs() < 1e-9);
        }
    }
}

#[test]
fn ranges_cover_components() {
    let series = monthly_series(start(2018, 1), 36, |_, date| {
        20.0 + PATTERN[date.month0() as usize]
    });
    let aligned = align(&series).expect("alignment failed");
    let outcome = decompose(&aligned);
    let decomposition = outcome.decomposition().expect("expected decomposition");

    let (low, high) = decomposition.seasonal_range().expect("seasonal range");
    assert!((low + 12.0).abs() < 1e-9);
    assert!((high - 14.0).abs() < 1e-9);
    assert!(decomposition.trend_range().is_some());
}
