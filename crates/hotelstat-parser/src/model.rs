use std::collections::{BTreeMap, HashMap};
use std::fmt;

use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DATE_COLUMN: &str = "date";
pub const STATUS_COLUMN: &str = "status";

/// Which measure a series carries. Decides the name of the value column.
///
/// Deserializes from `count`/`rate` or the value-column names, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum SeriesKind {
    Count,
    Rate,
}

impl SeriesKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesKind::Count => "count",
            SeriesKind::Rate => "rate",
        }
    }

    pub fn value_column(&self) -> &'static str {
        match self {
            SeriesKind::Count => "hotel_count",
            SeriesKind::Rate => "occupancy_rate",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SeriesKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SeriesKind::try_from(value.as_str())
    }
}

impl TryFrom<&str> for SeriesKind {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "count" | "hotel_count" => Ok(SeriesKind::Count),
            "rate" | "occupancy_rate" => Ok(SeriesKind::Rate),
            other => Err(format!("unknown series kind '{other}'")),
        }
    }
}

/// Non-empty label attached to every observation of a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Region(String);

impl Region {
    pub fn new(label: impl Into<String>) -> Result<Self, String> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err("region label must not be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Region {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Region::new(value)
    }
}

impl TryFrom<&str> for Region {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Region::new(value)
    }
}

impl From<Region> for String {
    fn from(value: Region) -> Self {
        value.0
    }
}

/// Bytes of a downloaded archive plus the location they came from.
#[derive(Debug, Clone)]
pub struct RawArchive {
    origin: String,
    bytes: Bytes,
}

impl RawArchive {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_hash(&self) -> String {
        blake3::hash(&self.bytes).to_hex().to_string()
    }
}

/// One data row of the extracted file, keyed by column name.
///
/// The first three positions are named `date`, the kind's value column and
/// `status`; anything after that is kept as `col_<n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRecord {
    line_index: usize,
    value_column: &'static str,
    fields: HashMap<String, String>,
}

impl TabularRecord {
    pub fn from_fields<I, S>(line_index: usize, kind: SeriesKind, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let value_column = kind.value_column();
        let fields = fields
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let name = match idx {
                    0 => DATE_COLUMN.to_string(),
                    1 => value_column.to_string(),
                    2 => STATUS_COLUMN.to_string(),
                    n => format!("col_{n}"),
                };
                (name, raw.into())
            })
            .collect();

        Self {
            line_index,
            value_column,
            fields,
        }
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn value_column(&self) -> &'static str {
        self.value_column
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn date(&self) -> Option<&str> {
        self.get(DATE_COLUMN)
    }

    pub fn value(&self) -> Option<&str> {
        self.get(self.value_column)
    }

    pub fn status(&self) -> Option<&str> {
        self.get(STATUS_COLUMN)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDate,
    pub value: f64,
    pub status: String,
    pub region: Region,
}

/// Observations of one region, strictly increasing by month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    region: Region,
    kind: SeriesKind,
    observations: Vec<Observation>,
}

impl Series {
    pub fn empty(region: Region, kind: SeriesKind) -> Self {
        Self {
            region,
            kind,
            observations: Vec::new(),
        }
    }

    /// Builds a series from observations in input order.
    ///
    /// Timestamps are snapped to the first of their month, non-finite values
    /// are dropped, and when two observations share a month the later one wins.
    pub fn from_observations<I>(region: Region, kind: SeriesKind, observations: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut by_month: BTreeMap<NaiveDate, Observation> = BTreeMap::new();
        for mut observation in observations {
            if !observation.value.is_finite() {
                continue;
            }
            observation.timestamp = month_start(observation.timestamp);
            observation.region = region.clone();
            by_month.insert(observation.timestamp, observation);
        }

        Self {
            region,
            kind,
            observations: by_month.into_values().collect(),
        }
    }

    /// Convenience constructor for `(month, value)` pairs with an empty status.
    pub fn from_points<I>(region: Region, kind: SeriesKind, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let observations: Vec<Observation> = points
            .into_iter()
            .map(|(timestamp, value)| Observation {
                timestamp,
                value,
                status: String::new(),
                region: region.clone(),
            })
            .collect();
        Self::from_observations(region, kind, observations)
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.observations.iter().map(|obs| obs.value)
    }

    pub fn get(&self, month: NaiveDate) -> Option<&Observation> {
        let month = month_start(month);
        self.observations
            .binary_search_by_key(&month, |obs| obs.timestamp)
            .ok()
            .map(|idx| &self.observations[idx])
    }
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
