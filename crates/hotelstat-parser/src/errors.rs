use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("archive from {origin} could not be opened: {source}")]
    InvalidArchive {
        origin: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("archive from {origin} does not contain a delimited-text entry")]
    NoTabularEntry { origin: String },

    #[error("entry '{entry}' could not be read: {source}")]
    Io {
        entry: String,
        #[source]
        source: std::io::Error,
    },

    #[error("entry '{entry}' is neither {primary} nor {fallback} text")]
    UndecodableText {
        entry: String,
        primary: &'static str,
        fallback: &'static str,
    },
}
