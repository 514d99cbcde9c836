// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit of data flowing through a pipeline

use serde::{Deserialize, Serialize};

/// An immutable wrapper around one payload.
///
/// Records carry no identity beyond their payload. Stages hand them off by
/// value, so exactly one stage owns a given record at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record<T> {
    data: T,
}

impl<T> Record<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Borrow the payload
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consume the record, returning its payload
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> From<T> for Record<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
