//! Media host: where image binaries actually live.
//!
//! The gallery never stores or proxies image bytes. A `MediaHost` takes the
//! file, returns a public URL, and only that URL is persisted.

pub mod cloudinary;

use bytes::Bytes;
use std::{
    future::Future,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("media host rejected upload: {status} {body}")]
    Rejected { status: u16, body: String },
    #[error("media host response is missing `secure_url`")]
    MissingUrl,
    #[error("could not read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file picked for upload: its name (for the extension check) and bytes.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name.
    pub async fn read(path: &Path) -> Result<Self, MediaError> {
        let bytes = fs::read(path).await.map_err(|source| read_error(path, source))?;
        Ok(Self::new(Self::name_of(path), bytes))
    }

    /// The name `read` would give the file at `path`.
    pub fn name_of(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Size on disk, without reading the contents.
    pub async fn size_of(path: &Path) -> Result<u64, MediaError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|source| read_error(path, source))?;
        Ok(metadata.len())
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn read_error(path: &Path, source: std::io::Error) -> MediaError {
    MediaError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Stores an image and hands back its public URL.
pub trait MediaHost {
    fn upload(&self, file: &UploadFile) -> impl Future<Output = Result<String, MediaError>> + Send;
}
