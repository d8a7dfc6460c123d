use chrono::{Datelike, NaiveDate};
use hotelstat_parser::{Region, SeriesKind};

use crate::pipeline::SeriesSpec;

pub const BDM_BASE_URL: &str = "https://bdm.insee.fr/series";
pub const DEFAULT_START_YEAR: i32 = 2011;

/// Series published in the built-in catalog: `(region, kind, BDM id)`.
pub const DEFAULT_SERIES: &[(&str, SeriesKind, &str)] = &[
    ("Marne", SeriesKind::Rate, "010598981"),
    ("France", SeriesKind::Rate, "010599344"),
    ("Grand Est Hotels", SeriesKind::Count, "010609578"),
];

/// CSV export request against the INSEE macro-economic database (BDM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdmQuery {
    pub series_id: String,
    pub start_year: i32,
    pub end: NaiveDate,
}

impl BdmQuery {
    pub fn new(series_id: impl Into<String>, end: NaiveDate) -> Self {
        Self {
            series_id: series_id.into(),
            start_year: DEFAULT_START_YEAR,
            end,
        }
    }

    pub fn with_start_year(mut self, start_year: i32) -> Self {
        self.start_year = start_year;
        self
    }

    pub fn url(&self) -> String {
        format!(
            "{BDM_BASE_URL}/{id}/csv?lang=fr&ordre=antechronologique&transposition=donneescolonne\
             &periodeDebut=1&anneeDebut={start}&periodeFin={end_month}&anneeFin={end_year}\
             &revision=sansrevisions",
            id = self.series_id,
            start = self.start_year,
            end_month = self.end.month(),
            end_year = self.end.year(),
        )
    }
}

/// Marne and France occupancy rates plus the Grand Est hotel count, requested
/// up to `today`.
pub fn default_catalog(today: NaiveDate) -> Vec<SeriesSpec> {
    DEFAULT_SERIES
        .iter()
        .filter_map(|(label, kind, id)| {
            let region = Region::new(*label).ok()?;
            Some(SeriesSpec {
                region,
                kind: *kind,
                url: BdmQuery::new(*id, today).url(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bdm_url_covers_requested_range() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 19).unwrap();
        let url = BdmQuery::new("010598981", end).url();
        assert_eq!(
            url,
            "https://bdm.insee.fr/series/010598981/csv?lang=fr&ordre=antechronologique\
             &transposition=donneescolonne&periodeDebut=1&anneeDebut=2011&periodeFin=3\
             &anneeFin=2024&revision=sansrevisions"
        );
    }

    #[test]
    fn default_catalog_lists_all_series() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let catalog = default_catalog(today);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog[2].kind, SeriesKind::Count);
        assert!(catalog[1].url.contains("/010599344/"));
        assert!(catalog.iter().all(|spec| spec.url.contains("anneeFin=2025")));
    }
}
