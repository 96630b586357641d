//! Error type shared by every stage of the verification pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the object identification and matching pipeline.
///
/// Every variant is fatal for the current run; callers are expected to
/// report it and stop.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration for '{key}': {reason}")]
    Config { key: String, reason: String },

    #[error(
        "Dimension mismatch in {context}: expected {expected:?}, got {actual:?}"
    )]
    DimensionMismatch {
        context: &'static str,
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("Border size {border} too large for a {nx} x {ny} grid")]
    BorderTooLarge { border: usize, nx: usize, ny: usize },

    #[error("{context}: field has {nt} time slices, expected a constant-time slice")]
    NotConstTimeSlice { context: &'static str, nt: usize },

    #[error("{context}: object field has not been split")]
    NotSplit { context: &'static str },

    #[error("{context}: empty object")]
    EmptyObject { context: &'static str },

    #[error("No objects left after sifting {n_objects} objects")]
    NoObjectsLeft { n_objects: usize },

    #[error("Engine stage '{requested}' cannot run in state '{current}'")]
    InvalidState {
        requested: &'static str,
        current: String,
    },

    #[error("Failed to access file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode or encode file '{path}': {reason}")]
    Format { path: PathBuf, reason: String },
}

impl Error {
    pub(crate) fn config(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = Error::config("conv_radius", "must be non-negative");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'conv_radius': must be non-negative"
        );
    }

    #[test]
    fn test_io_error_message_names_file() {
        let err = Error::Io {
            path: PathBuf::from("/data/fcst.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert!(err.to_string().contains("/data/fcst.json"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_border_error_message() {
        let err = Error::BorderTooLarge {
            border: 3,
            nx: 5,
            ny: 5,
        };
        assert_eq!(err.to_string(), "Border size 3 too large for a 5 x 5 grid");
    }
}
