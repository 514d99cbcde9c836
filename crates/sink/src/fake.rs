// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake bulk sink for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::policy::StatusCode;
use crate::request::{BatchRequest, BatchResponse, BulkRequest, ItemResponse};
use crate::BulkSink;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Per-item failure reported by the fake sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeFailure {
    pub status: u16,
    pub reason: String,
}

impl FakeFailure {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FakeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.reason)
    }
}

impl StatusCode for FakeFailure {
    fn status(&self) -> Option<u16> {
        Some(self.status)
    }
}

/// Whole-request error raised by the fake sink
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FakeSinkError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rejected with status {status}: {reason}")]
    Rejected { status: u16, reason: String },
}

impl StatusCode for FakeSinkError {
    fn status(&self) -> Option<u16> {
        match self {
            FakeSinkError::Transport(_) => None,
            FakeSinkError::Rejected { status, .. } => Some(*status),
        }
    }
}

/// One scripted reaction to a submission
#[derive(Debug, Clone)]
pub enum FakeStep {
    /// Accept every item
    AcceptAll,
    /// Respond with these outcomes, in request order
    Respond(Vec<ItemResponse<FakeFailure>>),
    /// Raise an error for the whole request
    Fail(FakeSinkError),
}

struct FakeState<I> {
    script: VecDeque<FakeStep>,
    requests: Vec<Vec<I>>,
}

/// Fake sink that replays a script and records every submitted request.
///
/// Once the script runs out, every further submission is accepted.
#[derive(Clone)]
pub struct FakeBulkSink<I> {
    inner: Arc<Mutex<FakeState<I>>>,
}

impl<I> Default for FakeBulkSink<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> FakeBulkSink<I> {
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    pub fn with_script(script: impl IntoIterator<Item = FakeStep>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                script: script.into_iter().collect(),
                requests: Vec::new(),
            })),
        }
    }

    /// Queue another scripted step
    pub fn push_step(&self, step: FakeStep) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .script
            .push_back(step);
    }

    /// Number of submissions so far
    pub fn attempts(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .requests
            .len()
    }
}

impl<I: Clone> FakeBulkSink<I> {
    /// Items of every submitted request, in submission order
    pub fn requests(&self) -> Vec<Vec<I>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .requests
            .clone()
    }
}

#[async_trait]
impl<I> BulkSink for FakeBulkSink<I>
where
    I: Clone + Send + Sync + 'static,
{
    type Request = BatchRequest<I>;
    type Failure = FakeFailure;
    type Error = FakeSinkError;

    async fn submit(
        &self,
        request: &BatchRequest<I>,
    ) -> Result<BatchResponse<FakeFailure>, FakeSinkError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.requests.push(request.items().to_vec());
        match state.script.pop_front().unwrap_or(FakeStep::AcceptAll) {
            FakeStep::AcceptAll => Ok(BatchResponse::all_success(request.len())),
            FakeStep::Respond(items) => Ok(BatchResponse::new(items)),
            FakeStep::Fail(error) => Err(error),
        }
    }

    fn new_request(&self) -> BatchRequest<I> {
        BatchRequest::new()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
