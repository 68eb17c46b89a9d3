// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Target document loading and atomic write-back

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// An HTML document read from disk
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    content: String,
    hash: String,
}

impl Document {
    /// Read a document. Non-UTF-8 content is a read failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::read(path, e))?;
        let hash = content_hash(&bytes);
        let content = String::from_utf8(bytes)
            .map_err(|e| Error::read(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;

        tracing::debug!(
            path = %path.display(),
            bytes = content.len(),
            hash = %hash,
            "Loaded document"
        );

        Ok(Self {
            path: path.to_path_buf(),
            content,
            hash,
        })
    }

    /// Build a document from in-memory content
    pub fn from_content(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = content_hash(content.as_bytes());
        Self {
            path: path.into(),
            content,
            hash,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Hex SHA-256 of the original bytes
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Replace the file on disk with `content`
    pub fn save(&self, content: &str) -> Result<()> {
        write_atomic(&self.path, content.as_bytes())?;
        tracing::debug!(path = %self.path.display(), bytes = content.len(), "Wrote document");
        Ok(())
    }
}

/// Hex-encoded SHA-256 of `bytes`
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write through a temp file in the same directory, then rename over `path`.
///
/// Readers see either the old or the new content, never a truncated file.
/// Existing permissions are carried over.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| Error::write(path, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::write(path, e))?;

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| Error::write(path, e))?;
    }

    tmp.persist(path).map_err(|e| Error::write(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        let a = content_hash(b"<html></html>");
        let b = content_hash(b"<html></html>");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"<html> </html>"));
        assert_eq!(
            content_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_load_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<html><head></head></html>").unwrap();

        let first = Document::load(&path).unwrap();
        let second = Document::load(&path).unwrap();
        let memory = Document::from_content(&path, "<html><head></head></html>");

        assert_eq!(first.hash(), second.hash());
        assert_eq!(first.hash(), memory.hash());
        assert_eq!(first.content(), memory.content());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::load(dir.path().join("nope.html")).unwrap_err();

        assert!(matches!(err, Error::Read { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.html");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = Document::load(&path).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_save_replaces_content_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "old").unwrap();

        let doc = Document::load(&path).unwrap();
        doc.save("new content").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_save_into_missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::from_content(dir.path().join("gone/index.html"), "x");

        let err = doc.save("y").unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
