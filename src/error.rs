// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for Kilpi
//!
//! Only reading and writing the target document are fatal. Everything that
//! can go wrong while fetching external resources for SRI hashing is
//! recoverable: the caller logs it and leaves that element untouched.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for Kilpi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Kilpi
#[derive(Error, Debug)]
pub enum Error {
    /// Target document could not be read (or is not UTF-8)
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Remediated document could not be written back
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// External resource answered with a non-success status
    #[error("Fetching {url} for SRI returned status {status}")]
    SriFetch { url: String, status: u16 },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a read error for a path
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    /// Create a write error for a path
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }

    /// Create an SRI fetch error
    pub fn sri_fetch(url: impl Into<String>, status: u16) -> Self {
        Error::SriFetch {
            url: url.into(),
            status,
        }
    }

    /// Check if this error must abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Read { .. } | Error::Write { .. })
    }

    /// Check if this is a network error
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::SriFetch { .. })
    }

    /// Get the document path if available
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Read { path, .. } | Error::Write { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::SriFetch { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_is_fatal() {
        let err = Error::read(
            "site/index.html",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );

        assert!(err.is_fatal());
        assert!(!err.is_network());
        assert_eq!(err.path(), Some(Path::new("site/index.html")));
        assert!(err.to_string().contains("site/index.html"));
    }

    #[test]
    fn test_sri_fetch_error_is_recoverable() {
        let err = Error::sri_fetch("https://cdn.example.com/app.js", 404);

        assert!(!err.is_fatal());
        assert!(err.is_network());
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_url_error_conversion() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::Url(_)));
        assert!(!err.is_fatal());
    }
}
