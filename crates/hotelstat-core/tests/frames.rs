use chrono::NaiveDate;
use polars::prelude::DataType;

use hotelstat_core::align::align;
use hotelstat_core::decompose::decompose;
use hotelstat_core::frames::{decomposition_frame, series_frame, write_parquet};
use hotelstat_core::parser::{Region, Series, SeriesKind};

fn monthly(len: usize) -> Series {
    let start = NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid month");
    Series::from_points(
        Region::new("Grand Est Hotels").expect("valid region"),
        SeriesKind::Count,
        (0..len).filter_map(|idx| {
            let date = start.checked_add_months(chrono::Months::new(idx as u32))?;
            Some((date, 600.0 + (idx % 12) as f64))
        }),
    )
}

#[test]
fn series_frame_has_one_row_per_observation() {
    let df = series_frame(&monthly(5)).expect("build frame");

    assert_eq!(df.height(), 5);
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, vec!["date", "value", "status", "region"]);
    assert_eq!(df.column("date").expect("date column").dtype(), &DataType::Date);
}

#[test]
fn decomposition_frame_nulls_components_when_skipped() {
    let aligned = align(&monthly(10)).expect("align");
    let outcome = decompose(&aligned);
    assert!(!outcome.is_decomposed());

    let df = decomposition_frame(&aligned, &outcome).expect("build frame");

    assert_eq!(df.height(), 10);
    assert_eq!(df.column("trend").expect("trend").null_count(), 10);
    assert_eq!(df.column("seasonal").expect("seasonal").null_count(), 10);
    assert_eq!(df.column("observed").expect("observed").null_count(), 0);
}

#[test]
fn decomposition_frame_keeps_trend_edges_null() {
    let aligned = align(&monthly(36)).expect("align");
    let outcome = decompose(&aligned);
    assert!(outcome.is_decomposed());

    let df = decomposition_frame(&aligned, &outcome).expect("build frame");

    assert_eq!(df.height(), 36);
    assert_eq!(df.column("trend").expect("trend").null_count(), 11);
    assert_eq!(df.column("residual").expect("residual").null_count(), 11);
    assert_eq!(df.column("seasonal").expect("seasonal").null_count(), 0);
}

#[test]
fn frames_can_be_written_as_parquet() {
    let dir = std::env::temp_dir().join(format!("hotelstat-frames-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join("series.parquet");

    let df = series_frame(&monthly(24)).expect("build frame");
    write_parquet(&df, &path).expect("write parquet");

    let written = std::fs::metadata(&path).expect("parquet metadata");
    assert!(written.len() > 0);
    std::fs::remove_dir_all(&dir).expect("clean temp dir");
}
