use std::io;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The compressed input could not be read or decompressed.
    #[error("Failed to decode dump stream: {0}")]
    Decode(#[source] Arc<io::Error>),

    /// The XML is not well-formed. No resync is attempted.
    #[error("Malformed XML at byte {position}: {reason}")]
    Parse { position: usize, reason: String },

    /// A link's hostname has no entry in the domain count table.
    #[error("Hostname `{0}` is missing from the domain count table")]
    MissingKey(String),

    #[error("Io Error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client Error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Splits quick-xml failures into the decode/parse halves of the taxonomy.
    ///
    /// Everything below the XML reader is file I/O plus decompression, so an
    /// I/O error surfacing through quick-xml means the stream itself is bad.
    pub(crate) fn from_xml(err: quick_xml::Error, position: usize) -> Self {
        match err {
            quick_xml::Error::Io(io_err) => Error::Decode(io_err),
            other => Error::Parse {
                position,
                reason: other.to_string(),
            },
        }
    }
}
