use hotelstat_parser::{
    normalize_records, ExtractionError, RawArchive, Region, Series, SeriesKind, TableExtractor,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::align::{align, AlignedSeries};
use crate::decompose::{decompose, DecompositionOutcome};
use crate::error::{AlignmentError, FetchError};
use crate::fetch::ArchiveSource;

/// What to load: a region label, the measure it carries and where its
/// archive lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSpec {
    pub region: Region,
    pub kind: SeriesKind,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    FetchFailed,
    CorruptArchive,
    NoTabularEntry,
    UndecodableText,
    InsufficientData,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailableReason::FetchFailed => "fetch_failed",
            UnavailableReason::CorruptArchive => "corrupt_archive",
            UnavailableReason::NoTabularEntry => "no_tabular_entry",
            UnavailableReason::UndecodableText => "undecodable_text",
            UnavailableReason::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unavailable {
    pub reason: UnavailableReason,
    pub detail: String,
}

impl From<&FetchError> for Unavailable {
    fn from(err: &FetchError) -> Self {
        Self {
            reason: UnavailableReason::FetchFailed,
            detail: err.to_string(),
        }
    }
}

impl From<&ExtractionError> for Unavailable {
    fn from(err: &ExtractionError) -> Self {
        let reason = match err {
            ExtractionError::InvalidArchive { .. } | ExtractionError::Io { .. } => {
                UnavailableReason::CorruptArchive
            }
            ExtractionError::NoTabularEntry { .. } => UnavailableReason::NoTabularEntry,
            ExtractionError::UndecodableText { .. } => UnavailableReason::UndecodableText,
        };
        Self {
            reason,
            detail: err.to_string(),
        }
    }
}

impl From<AlignmentError> for Unavailable {
    fn from(err: AlignmentError) -> Self {
        let reason = match err {
            AlignmentError::InsufficientData => UnavailableReason::InsufficientData,
        };
        Self {
            reason,
            detail: err.to_string(),
        }
    }
}

/// Everything produced for one series that made it through alignment.
#[derive(Debug, Clone)]
pub struct SeriesReport {
    pub spec: SeriesSpec,
    pub archive_hash: String,
    pub entry: String,
    pub encoding: &'static str,
    pub dropped_rows: usize,
    pub series: Series,
    pub aligned: AlignedSeries,
    pub decomposition: DecompositionOutcome,
}

#[derive(Debug, Clone)]
pub enum SeriesOutcome {
    Available(Box<SeriesReport>),
    Unavailable {
        spec: SeriesSpec,
        unavailable: Unavailable,
    },
}

impl SeriesOutcome {
    pub fn spec(&self) -> &SeriesSpec {
        match self {
            SeriesOutcome::Available(report) => &report.spec,
            SeriesOutcome::Unavailable { spec, .. } => spec,
        }
    }

    pub fn region(&self) -> &Region {
        &self.spec().region
    }

    pub fn report(&self) -> Option<&SeriesReport> {
        match self {
            SeriesOutcome::Available(report) => Some(report.as_ref()),
            SeriesOutcome::Unavailable { .. } => None,
        }
    }

    pub fn unavailable(&self) -> Option<&Unavailable> {
        match self {
            SeriesOutcome::Available(_) => None,
            SeriesOutcome::Unavailable { unavailable, .. } => Some(unavailable),
        }
    }

    fn unavailable_with(spec: &SeriesSpec, unavailable: Unavailable) -> Self {
        warn!(
            region = spec.region.as_str(),
            url = spec.url.as_str(),
            reason = unavailable.reason.as_str(),
            detail = unavailable.detail.as_str(),
            "Series unavailable"
        );
        SeriesOutcome::Unavailable {
            spec: spec.clone(),
            unavailable,
        }
    }
}

/// Outcomes of a batch, in the order the series were requested.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<SeriesOutcome>,
}

impl BatchReport {
    pub fn available(&self) -> impl Iterator<Item = &SeriesReport> {
        self.outcomes.iter().filter_map(SeriesOutcome::report)
    }

    pub fn unavailable(&self) -> impl Iterator<Item = (&SeriesSpec, &Unavailable)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            SeriesOutcome::Available(_) => None,
            SeriesOutcome::Unavailable { spec, unavailable } => Some((spec, unavailable)),
        })
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_unavailable(&self) -> bool {
        self.available().next().is_none()
    }
}

/// Extracts, normalizes, aligns and decomposes an archive that is already in
/// memory.
pub fn process_archive(
    archive: &RawArchive,
    spec: &SeriesSpec,
    extractor: &TableExtractor,
) -> SeriesOutcome {
    let archive_hash = archive.content_hash();

    let table = match extractor.extract(archive, spec.kind) {
        Ok(table) => table,
        Err(err) => return SeriesOutcome::unavailable_with(spec, Unavailable::from(&err)),
    };

    let series = normalize_records(&table.records, &spec.region, spec.kind);

    let aligned = match align(&series) {
        Ok(aligned) => aligned,
        Err(err) => return SeriesOutcome::unavailable_with(spec, Unavailable::from(err)),
    };

    let decomposition = decompose(&aligned);

    info!(
        region = spec.region.as_str(),
        archive_hash = archive_hash.as_str(),
        entry = table.entry.as_str(),
        observations = series.len(),
        grid_points = aligned.len(),
        imputed = aligned.imputed_count(),
        decomposed = decomposition.is_decomposed(),
        "Processed series"
    );

    SeriesOutcome::Available(Box::new(SeriesReport {
        spec: spec.clone(),
        archive_hash,
        entry: table.entry,
        encoding: table.encoding,
        dropped_rows: table.dropped_rows,
        series,
        aligned,
        decomposition,
    }))
}

/// Fetches one series and runs it through the pipeline. Never panics on bad
/// input; every failure becomes [`SeriesOutcome::Unavailable`].
pub fn process_series<S>(source: &S, spec: &SeriesSpec, extractor: &TableExtractor) -> SeriesOutcome
where
    S: ArchiveSource + ?Sized,
{
    match source.fetch(&spec.url) {
        Ok(archive) => process_archive(&archive, spec, extractor),
        Err(err) => SeriesOutcome::unavailable_with(spec, Unavailable::from(&err)),
    }
}

/// Processes every series independently and in parallel.
pub fn run_batch<S>(source: &S, specs: &[SeriesSpec], extractor: &TableExtractor) -> BatchReport
where
    S: ArchiveSource + ?Sized,
{
    let outcomes: Vec<SeriesOutcome> = specs
        .par_iter()
        .map(|spec| process_series(source, spec, extractor))
        .collect();

    let report = BatchReport { outcomes };
    info!(
        requested = report.len(),
        available = report.available().count(),
        "Batch complete"
    );
    report
}
