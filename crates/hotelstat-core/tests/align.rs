use chrono::NaiveDate;

use hotelstat_core::align::{align, interpolate_gaps};
use hotelstat_core::error::AlignmentError;
use hotelstat_core::parser::{Region, Series, SeriesKind};

fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("valid month")
}

fn series(points: &[(NaiveDate, f64)]) -> Series {
    let region = Region::new("Marne").expect("valid region");
    Series::from_points(region, SeriesKind::Rate, points.iter().copied())
}

#[test]
fn contiguous_series_aligns_unchanged() {
    let points: Vec<(NaiveDate, f64)> = (1..=12)
        .map(|m| (month(2022, m), 40.0 + m as f64))
        .collect();
    let input = series(&points);

    let aligned = align(&input).expect("alignment failed");

    assert_eq!(aligned.len(), input.len());
    let expected: Vec<f64> = input.values().collect();
    assert_eq!(aligned.values(), expected.as_slice());
    assert_eq!(aligned.imputed_count(), 0);
    assert_eq!(aligned.start(), month(2022, 1));
    assert_eq!(aligned.end(), month(2022, 12));
}

#[test]
fn interior_gaps_are_linearly_interpolated() {
    let input = series(&[(month(2021, 11), 10.0), (month(2022, 2), 40.0)]);

    let aligned = align(&input).expect("alignment failed");

    assert_eq!(aligned.values(), &[10.0, 20.0, 30.0, 40.0]);
    assert_eq!(aligned.imputed(), &[false, true, true, false]);
    let months: Vec<NaiveDate> = aligned.months().collect();
    assert_eq!(
        months,
        vec![month(2021, 11), month(2021, 12), month(2022, 1), month(2022, 2)]
    );
    assert_eq!(aligned.calendar_position(0), 10);
    assert_eq!(aligned.calendar_position(2), 0);
}

#[test]
fn interpolating_a_complete_grid_is_a_no_op() {
    let input = series(&[
        (month(2020, 1), 5.0),
        (month(2020, 4), 11.0),
        (month(2020, 5), 3.0),
    ]);
    let aligned = align(&input).expect("alignment failed");

    let grid: Vec<Option<f64>> = aligned.values().iter().copied().map(Some).collect();
    assert_eq!(interpolate_gaps(&grid), grid);
}

#[test]
fn edge_gaps_survive_interpolation() {
    let grid = [None, Some(1.0), None, Some(3.0), None];
    assert_eq!(
        interpolate_gaps(&grid),
        vec![None, Some(1.0), Some(2.0), Some(3.0), None]
    );
}

#[test]
fn single_observation_aligns_to_one_point() {
    let aligned = align(&series(&[(month(2019, 6), 7.5)])).expect("alignment failed");
    assert_eq!(aligned.values(), &[7.5]);
    assert_eq!(aligned.end(), month(2019, 6));
}

#[test]
fn empty_series_has_insufficient_data() {
    let empty = Series::empty(Region::new("France").unwrap(), SeriesKind::Rate);
    assert_eq!(align(&empty), Err(AlignmentError::InsufficientData));
}
