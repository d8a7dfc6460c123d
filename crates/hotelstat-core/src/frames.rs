use std::fs::File;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use hotelstat_parser::Series;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::{
    Column, DataFrame, DataType, NamedFrom, PolarsResult, Series as PolarsSeries,
};

use crate::align::AlignedSeries;
use crate::decompose::DecompositionOutcome;
use crate::error::Result;

// 1970-01-01 counted from 0001-01-01 as day 1.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// One row per observation: `date`, `value`, `status`, `region`.
pub fn series_frame(series: &Series) -> PolarsResult<DataFrame> {
    let observations = series.observations();
    let values: Vec<f64> = observations.iter().map(|obs| obs.value).collect();
    let statuses: Vec<&str> = observations.iter().map(|obs| obs.status.as_str()).collect();
    let regions: Vec<&str> = vec![series.region().as_str(); observations.len()];

    DataFrame::new(vec![
        date_column("date", observations.iter().map(|obs| obs.timestamp))?,
        PolarsSeries::new("value".into(), values).into(),
        PolarsSeries::new("status".into(), statuses).into(),
        PolarsSeries::new("region".into(), regions).into(),
    ])
}

/// One row per grid month with the aligned value and, when the series was
/// long enough, its trend, seasonal and residual components (null otherwise).
pub fn decomposition_frame(
    aligned: &AlignedSeries,
    outcome: &DecompositionOutcome,
) -> PolarsResult<DataFrame> {
    let len = aligned.len();
    let (trend, seasonal, residual): (Vec<Option<f64>>, Vec<Option<f64>>, Vec<Option<f64>>) =
        match outcome.decomposition() {
            Some(decomposition) => (
                decomposition.trend().to_vec(),
                decomposition.seasonal().iter().copied().map(Some).collect(),
                decomposition.residual().to_vec(),
            ),
            None => (vec![None; len], vec![None; len], vec![None; len]),
        };

    DataFrame::new(vec![
        date_column("date", aligned.months())?,
        PolarsSeries::new("observed".into(), aligned.values().to_vec()).into(),
        PolarsSeries::new("imputed".into(), aligned.imputed().to_vec()).into(),
        PolarsSeries::new("trend".into(), trend).into(),
        PolarsSeries::new("seasonal".into(), seasonal).into(),
        PolarsSeries::new("residual".into(), residual).into(),
    ])
}

pub fn write_parquet(df: &DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut clone = df.clone();
    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut clone)?;
    Ok(())
}

fn date_column(name: &str, dates: impl Iterator<Item = NaiveDate>) -> PolarsResult<Column> {
    let days: Vec<i32> = dates
        .map(|date| date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(PolarsSeries::new(name.into(), days)
        .cast(&DataType::Date)?
        .into())
}
