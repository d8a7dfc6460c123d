use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Observation, Region, Series, SeriesKind, TabularRecord};

/// Turns extracted rows into a series for `region`.
///
/// Rows whose date or value does not parse are dropped without error; an
/// empty result is a valid outcome.
pub fn normalize_records(records: &[TabularRecord], region: &Region, kind: SeriesKind) -> Series {
    let mut observations = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        let timestamp = record.date().and_then(parse_month);
        let value = record.value().and_then(parse_decimal);

        let (Some(timestamp), Some(value)) = (timestamp, value) else {
            debug!(
                region = region.as_str(),
                line_index = record.line_index(),
                date = record.date().unwrap_or_default(),
                value = record.value().unwrap_or_default(),
                "Dropping malformed row"
            );
            dropped += 1;
            continue;
        };

        observations.push(Observation {
            timestamp,
            value,
            status: record
                .status()
                .map(|raw| raw.replace('"', ""))
                .unwrap_or_default(),
            region: region.clone(),
        });
    }

    let parsed = observations.len();
    let series = Series::from_observations(region.clone(), kind, observations);

    debug!(
        region = region.as_str(),
        kind = kind.as_str(),
        parsed,
        dropped,
        duplicates = parsed - series.len(),
        "Normalized series"
    );

    series
}

/// Parses a decimal-comma number such as `"3,5"`. Non-finite results are rejected.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned = strip_quotes(raw).replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parses a `YYYY-MM` month into its first day. The year must have exactly
/// four digits and the month two.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let cleaned = strip_quotes(raw);
    let (year, month) = cleaned.split_once('-')?;
    if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

fn all_digits(text: &str) -> bool {
    text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Quote-free, trimmed form of a date or value cell.
fn strip_quotes(raw: &str) -> String {
    raw.replace('"', "").trim().to_string()
}
