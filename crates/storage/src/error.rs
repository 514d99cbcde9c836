// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from processor state operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to encode value: {0}")]
    Serialization(#[source] CodecError),
    #[error("failed to decode value for key {key:?}: {source}")]
    Deserialization {
        key: Vec<u8>,
        #[source]
        source: CodecError,
    },
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("corrupted log {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },
    #[error("state store is closed")]
    Closed,
    #[error("state store is locked by another owner: {}", path.display())]
    Locked { path: PathBuf },
    #[error("invalid store name: {0:?}")]
    InvalidName(String),
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Storage(e.into())
    }
}
