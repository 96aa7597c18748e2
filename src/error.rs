//! Error types for the data preparation pipeline.
//!
//! Every failure aborts the whole run: there is no partial dataset.

use std::io;
use std::path::PathBuf;

/// Structural or content problems found while reading the source log.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Source bytes are not valid in the configured encoding.
    #[error("source is not valid {encoding}: {message}")]
    Encoding {
        encoding: &'static str,
        message: String,
    },

    /// A column the pipeline reads or prunes is absent from the header.
    #[error("missing expected column `{0}`")]
    MissingColumn(String),

    /// The CSV reader rejected a row (wrong field count, bad quoting, ...).
    #[error("malformed row at line {line}: {message}")]
    Malformed { line: u64, message: String },

    #[error("line {line}: column {column} has unparseable date `{value}` (expected YYYY-MM-DD)")]
    InvalidDate {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: unknown status `{value}`")]
    UnknownStatus { line: u64, value: String },
}

/// Errors returned by [`crate::pipeline::prepare`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot read source {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl PipelineError {
    pub fn is_io(&self) -> bool {
        matches!(self, PipelineError::Io { .. })
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, PipelineError::Parse(_))
    }
}

/// Alias for Result with [`PipelineError`]
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = PipelineError::Io {
            path: PathBuf::from("dados/156_2024.csv"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_io());
        assert!(!err.is_parse());
        assert!(err.to_string().contains("dados/156_2024.csv"));
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err: PipelineError = ParseError::UnknownStatus {
            line: 7,
            value: "DESCONHECIDO".to_string(),
        }
        .into();
        assert!(err.is_parse());
        assert_eq!(err.to_string(), "line 7: unknown status `DESCONHECIDO`");
    }
}
