use std::io::{Cursor, Read};

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use tracing::debug;
use zip::ZipArchive;

use crate::errors::ExtractionError;
use crate::model::{RawArchive, SeriesKind, TabularRecord};

pub const DEFAULT_PREAMBLE_LINES: usize = 4;
pub const DEFAULT_DELIMITER: u8 = b';';
pub const DEFAULT_ENTRY_MARKERS: &[&str] = &["valeurs", "donnees"];

const DELIMITED_SUFFIX: &str = ".csv";
const MIN_FIELDS: usize = 3;

/// Rows pulled out of the data entry of an archive.
#[derive(Debug, Clone)]
pub struct ExtractedTable {
    pub entry: String,
    pub encoding: &'static str,
    pub records: Vec<TabularRecord>,
    pub dropped_rows: usize,
}

/// Finds, decodes and splits the delimited data file inside a zip export.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    markers: Vec<String>,
    preamble_lines: usize,
    delimiter: u8,
    primary: &'static Encoding,
    fallback: &'static Encoding,
}

impl Default for TableExtractor {
    fn default() -> Self {
        Self {
            markers: DEFAULT_ENTRY_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
            preamble_lines: DEFAULT_PREAMBLE_LINES,
            delimiter: DEFAULT_DELIMITER,
            primary: UTF_8,
            fallback: WINDOWS_1252,
        }
    }
}

impl TableExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers
            .into_iter()
            .map(|marker| marker.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_preamble_lines(mut self, lines: usize) -> Self {
        self.preamble_lines = lines;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encodings(mut self, primary: &'static Encoding, fallback: &'static Encoding) -> Self {
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    pub fn extract(
        &self,
        archive: &RawArchive,
        kind: SeriesKind,
    ) -> Result<ExtractedTable, ExtractionError> {
        let invalid = |source| ExtractionError::InvalidArchive {
            origin: archive.origin().to_string(),
            source,
        };

        let mut zip = ZipArchive::new(Cursor::new(archive.bytes())).map_err(invalid)?;

        let mut names = Vec::with_capacity(zip.len());
        for idx in 0..zip.len() {
            let file = zip.by_index(idx).map_err(invalid)?;
            if !file.is_dir() {
                names.push(file.name().to_string());
            }
        }

        let entry = self
            .select_entry(&names)
            .ok_or_else(|| ExtractionError::NoTabularEntry {
                origin: archive.origin().to_string(),
            })?
            .to_string();

        let mut bytes = Vec::new();
        {
            let mut file = zip.by_name(&entry).map_err(invalid)?;
            file.read_to_end(&mut bytes)
                .map_err(|source| ExtractionError::Io {
                    entry: entry.clone(),
                    source,
                })?;
        }

        let (text, encoding) = self.decode(&entry, &bytes)?;
        let (records, dropped_rows) = self.parse_rows(&text, kind);

        debug!(
            origin = archive.origin(),
            entry = entry.as_str(),
            encoding = encoding.name(),
            rows = records.len(),
            dropped = dropped_rows,
            "Extracted tabular entry"
        );

        Ok(ExtractedTable {
            entry,
            encoding: encoding.name(),
            records,
            dropped_rows,
        })
    }

    /// Picks the data entry: the first delimited-text name carrying a marker
    /// token, otherwise the first delimited-text name at all.
    pub fn select_entry<'a>(&self, names: &'a [String]) -> Option<&'a str> {
        let mut delimited = names
            .iter()
            .filter(|name| name.to_ascii_lowercase().ends_with(DELIMITED_SUFFIX))
            .peekable();
        let first = delimited.peek().copied().map(String::as_str);

        delimited
            .find(|name| {
                let lower = name.to_ascii_lowercase();
                self.markers.iter().any(|marker| lower.contains(marker.as_str()))
            })
            .map(|name| name.as_str())
            .or(first)
    }

    pub fn decode(
        &self,
        entry: &str,
        bytes: &[u8],
    ) -> Result<(String, &'static Encoding), ExtractionError> {
        for encoding in [self.primary, self.fallback] {
            let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
            if !had_errors {
                let text = text.trim_start_matches('\u{feff}').to_string();
                return Ok((text, encoding));
            }
            debug!(entry, encoding = encoding.name(), "Entry failed to decode");
        }

        Err(ExtractionError::UndecodableText {
            entry: entry.to_string(),
            primary: self.primary.name(),
            fallback: self.fallback.name(),
        })
    }

    /// Splits decoded text into records, returning them with the number of
    /// rows that were discarded after the preamble.
    pub fn parse_rows(&self, text: &str, kind: SeriesKind) -> (Vec<TabularRecord>, usize) {
        let body = skip_lines(text, self.preamble_lines);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(body.as_bytes());

        let mut records = Vec::new();
        let mut dropped = 0usize;

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(err) => {
                    debug!(error = %err, "Skipping unreadable row");
                    dropped += 1;
                    continue;
                }
            };

            let line_index = self.preamble_lines
                + record
                    .position()
                    .map(|pos| pos.line() as usize)
                    .unwrap_or_default();

            if record.len() < MIN_FIELDS {
                debug!(line_index, fields = record.len(), "Skipping short row");
                dropped += 1;
                continue;
            }

            records.push(TabularRecord::from_fields(line_index, kind, record.iter()));
        }

        (records, dropped)
    }
}

fn skip_lines(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}
