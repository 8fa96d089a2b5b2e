//! Error types for the Diplo atlas core

use thiserror::Error;

/// Top-level error type for the Diplo atlas core
#[derive(Debug, Error)]
pub enum DiploError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors raised while reading an upstream table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Table I/O error: {0}")]
    Io(String),

    #[error("Malformed CSV in {table}: {message}")]
    Csv { table: &'static str, message: String },

    #[error("Missing column in {table}: {column}")]
    MissingColumn { table: &'static str, column: String },

    #[error("Table {0} has no header row")]
    EmptyTable(&'static str),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err.to_string())
    }
}

/// Errors for a single malformed query-string value
///
/// `decode` never surfaces these; the affected field falls back to its default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid year for {key}: {value}")]
    InvalidYear { key: &'static str, value: String },

    #[error("Invalid interval for {key}: {value}")]
    InvalidInterval { key: &'static str, value: String },

    #[error("Month mask must be 12 characters of 0/1, got {0:?}")]
    InvalidMonthMask(String),

    #[error("Unknown value for {key}: {value}")]
    UnknownVariant { key: &'static str, value: String },

    #[error("Invalid percent-encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type alias for Diplo core operations
pub type DiploResult<T> = Result<T, DiploError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_display() {
        let err = LoadError::Io("file missing".to_string());
        assert!(format!("{}", err).contains("file missing"));

        let err = LoadError::MissingColumn {
            table: "Prefecture.csv",
            column: "_jp".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Prefecture.csv"));
        assert!(msg.contains("_jp"));

        assert!(format!("{}", LoadError::EmptyTable("Island.csv")).contains("no header"));
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::InvalidYear {
            key: "publicationYearFrom",
            value: "19x0".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("publicationYearFrom"));
        assert!(msg.contains("19x0"));

        let err = CodecError::InvalidMonthMask("101".to_string());
        assert!(format!("{}", err).contains("101"));
    }

    #[test]
    fn test_error_conversions() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let load: LoadError = io.into();
        assert!(matches!(load, LoadError::Io(_)));

        let top: DiploError = load.into();
        assert!(matches!(top, DiploError::Load(_)));

        let top: DiploError = CodecError::InvalidMonthMask(String::new()).into();
        assert!(matches!(top, DiploError::Codec(_)));
        assert!(format!("{}", top).contains("Codec error"));
    }
}
