// Copyright (c) 2025 - Cowboy AI, Inc.
//! Local Asset Sources
//!
//! A directory on the synthesizing machine that is packaged into a
//! deployment artifact. The digest covers every file's relative path and
//! contents, so any change to the directory changes the digest.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset directory not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory packaged as an artifact, identified by content digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetSource {
    path: PathBuf,
    digest: String,
}

impl AssetSource {
    /// Hash every regular file below `path`
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(AssetError::Missing(path.to_path_buf()));
        }

        let mut files = Vec::new();
        collect_files(path, &mut files)?;
        files.sort();

        let mut hasher = Sha256::new();
        for file in &files {
            let relative = file.strip_prefix(path).unwrap_or(file);
            let contents = fs::read(file).map_err(|source| AssetError::Io {
                path: file.clone(),
                source,
            })?;
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update((contents.len() as u64).to_le_bytes());
            hasher.update(&contents);
        }

        Ok(Self {
            path: path.to_path_buf(),
            digest: hex(&hasher.finalize()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hex SHA-256 over relative paths and contents
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), AssetError> {
    let io_err = |source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err)?;
        if file_type.is_dir() {
            collect_files(&path, out)?;
        } else if file_type.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_tracks_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.py"), "print('v1')").unwrap();
        let first = AssetSource::from_dir(dir.path()).unwrap();
        assert_eq!(first.digest().len(), 64);
        assert_eq!(first, AssetSource::from_dir(dir.path()).unwrap());

        fs::write(dir.path().join("index.py"), "print('v2')").unwrap();
        let second = AssetSource::from_dir(dir.path()).unwrap();
        assert_ne!(first.digest(), second.digest());
    }

    #[test]
    fn test_digest_includes_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/a.json"), "[]").unwrap();
        let nested = AssetSource::from_dir(dir.path()).unwrap();

        fs::rename(dir.path().join("data/a.json"), dir.path().join("a.json")).unwrap();
        let moved = AssetSource::from_dir(dir.path()).unwrap();
        assert_ne!(nested.digest(), moved.digest());
    }

    #[test]
    fn test_missing_directory() {
        assert!(matches!(
            AssetSource::from_dir("/definitely/not/here"),
            Err(AssetError::Missing(_))
        ));
    }
}
