// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Bounded buffers connecting pipeline stages
//!
//! A buffer sits between a source and the processor/sink loop. Writers block
//! while it is full, readers block until a batch is ready, and both give up
//! after a caller-supplied timeout.

mod blocking;

pub use blocking::BlockingBuffer;

use std::time::Duration;
use thiserror::Error;
use tp_core::Record;

/// Errors from constructing a buffer
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("invalid buffer config: {0}")]
    InvalidConfig(#[from] tp_core::ConfigError),
}

/// A write that could not find room before its deadline.
///
/// The rejected record travels back to the caller, which decides whether to
/// retry, drop, or escalate.
#[derive(Debug, Error)]
#[error("timed out after {timeout:?} waiting for buffer capacity")]
pub struct WriteTimeout<T> {
    record: Record<T>,
    timeout: Duration,
}

impl<T> WriteTimeout<T> {
    pub fn new(record: Record<T>, timeout: Duration) -> Self {
        Self { record, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reclaim the record that was not enqueued
    pub fn into_record(self) -> Record<T> {
        self.record
    }
}

/// Holding area between a producer and a consumer
pub trait Buffer<T>: Send + Sync {
    /// Enqueue a record, waiting up to `timeout` for capacity.
    fn write(&self, record: Record<T>, timeout: Duration) -> Result<(), WriteTimeout<T>>;

    /// Dequeue the oldest records, waiting up to `timeout` for a full batch.
    ///
    /// Returns whatever is available when the batch fills or the timeout
    /// elapses; the result may be empty and never exceeds the batch size.
    fn read(&self, timeout: Duration) -> Vec<Record<T>>;
}
