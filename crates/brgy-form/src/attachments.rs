//! # Attachment Encoding
//!
//! File handles chosen by the user are only read at submission time. Files
//! are read one at a time, in order, and base64-encoded into
//! [`EvidenceAttachment`]s. The first failure aborts the whole batch.

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;

use brgy_core::{EvidenceAttachment, FileHandle};

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("failed to read {filename} ({path}): {source}")]
    Read {
        filename: String,
        path: PathBuf,
        source: io::Error,
    },

    #[error("{filename} is {size} bytes, over the {limit}-byte limit")]
    TooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },
}

/// Reads the bytes behind a [`FileHandle`].
#[async_trait]
pub trait AttachmentReader: Send + Sync {
    async fn read(&self, handle: &FileHandle) -> Result<Vec<u8>, AttachmentError>;
}

/// Reads attachments from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsAttachmentReader {
    max_bytes: Option<u64>,
}

impl FsAttachmentReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject files larger than `limit` bytes before reading them.
    pub fn with_max_bytes(limit: u64) -> Self {
        Self {
            max_bytes: Some(limit),
        }
    }
}

#[async_trait]
impl AttachmentReader for FsAttachmentReader {
    async fn read(&self, handle: &FileHandle) -> Result<Vec<u8>, AttachmentError> {
        let read_err = |source: io::Error| AttachmentError::Read {
            filename: handle.filename.clone(),
            path: handle.path.clone(),
            source,
        };
        if let Some(limit) = self.max_bytes {
            let size = tokio::fs::metadata(&handle.path).await.map_err(read_err)?.len();
            if size > limit {
                return Err(AttachmentError::TooLarge {
                    filename: handle.filename.clone(),
                    size,
                    limit,
                });
            }
        }
        tokio::fs::read(&handle.path).await.map_err(read_err)
    }
}

/// Read and encode `handles` sequentially, preserving order.
pub async fn encode_attachments(
    reader: &dyn AttachmentReader,
    handles: &[FileHandle],
) -> Result<Vec<EvidenceAttachment>, AttachmentError> {
    let mut encoded = Vec::with_capacity(handles.len());
    for handle in handles {
        let bytes = reader.read(handle).await?;
        tracing::debug!(filename = %handle.filename, bytes = bytes.len(), "encoded attachment");
        encoded.push(EvidenceAttachment {
            filename: handle.filename.clone(),
            content_type: handle.content_type.clone(),
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        });
    }
    Ok(encoded)
}
