use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use hotelstat_parser::{Region, SeriesKind};
use serde::{Deserialize, Serialize};

use crate::catalog::{default_catalog, BdmQuery};
use crate::error::{CoreError, Result};
use crate::fetch::FetchSettings;
use crate::pipeline::SeriesSpec;

pub const CONFIG_ENV: &str = "HOTELSTAT_CONFIG";
pub const TIMEOUT_ENV: &str = "HOTELSTAT_FETCH_TIMEOUT_SECS";

/// Run configuration, usually read from a TOML file:
///
/// ```toml
/// [fetch]
/// timeout_secs = 20
///
/// [[series]]
/// region = "Marne"
/// kind = "rate"
/// bdm_series = "010598981"
/// ```
///
/// An empty `series` list means the built-in catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fetch: FetchSettings,
    pub series: Vec<SeriesEntry>,
}

/// One configured series. Exactly one of `url` and `bdm_series` must be set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub region: Region,
    pub kind: SeriesKind,
    pub url: Option<String>,
    pub bdm_series: Option<String>,
    pub start_year: Option<i32>,
}

impl SeriesEntry {
    pub fn resolve(&self, today: NaiveDate) -> Result<SeriesSpec> {
        let url = match (&self.url, &self.bdm_series) {
            (Some(url), None) => url.clone(),
            (None, Some(id)) => {
                let mut query = BdmQuery::new(id.clone(), today);
                if let Some(start_year) = self.start_year {
                    query = query.with_start_year(start_year);
                }
                query.url()
            }
            (Some(_), Some(_)) => {
                return Err(CoreError::Validation(format!(
                    "series '{}' sets both url and bdm_series",
                    self.region
                )))
            }
            (None, None) => {
                return Err(CoreError::Validation(format!(
                    "series '{}' needs either url or bdm_series",
                    self.region
                )))
            }
        };

        Ok(SeriesSpec {
            region: self.region.clone(),
            kind: self.kind,
            url,
        })
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies environment-style overrides through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            self.fetch.timeout_secs = raw.trim().parse().map_err(|err| {
                CoreError::Validation(format!("{TIMEOUT_ENV} must be a whole number: {err}"))
            })?;
        }
        Ok(())
    }

    /// Resolves every entry, rejecting repeated `(region, kind)` pairs since
    /// they would share output names.
    pub fn resolve_series(&self, today: NaiveDate) -> Result<Vec<SeriesSpec>> {
        if self.series.is_empty() {
            return Ok(default_catalog(today));
        }

        let mut seen = HashSet::new();
        for entry in &self.series {
            if !seen.insert((entry.region.as_str(), entry.kind)) {
                return Err(CoreError::Validation(format!(
                    "series '{}' ({}) is configured more than once",
                    entry.region, entry.kind
                )));
            }
        }
        self.series.iter().map(|entry| entry.resolve(today)).collect()
    }
}
