// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Reliable bulk delivery to unreliable sinks
//!
//! A sink integration implements [`BulkSink`]; [`BulkRetry`] wraps it and
//! resubmits only the items that failed in a retryable way, backing off
//! exponentially between attempts. Items that cannot be delivered are handed
//! to a [`FailureObserver`] exactly once.

mod observer;
mod policy;
mod request;
mod retry;
pub mod traced;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use observer::{FailureCause, FailureObserver, LogFailures};
pub use policy::{AlwaysRetry, Disposition, RetryPolicy, StatusCode, StatusPolicy};
pub use request::{BatchRequest, BatchResponse, BulkRequest, ItemResponse};
pub use retry::{BulkRetry, DeliveryError, DeliveryReport};
pub use traced::TracedBulkSink;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBulkSink, FakeFailure, FakeSinkError, FakeStep};

use async_trait::async_trait;

/// Item type carried by a sink's requests
pub type ItemOf<S> = <<S as BulkSink>::Request as BulkRequest>::Item;

/// A downstream system that accepts batched writes
#[async_trait]
pub trait BulkSink: Send + Sync {
    type Request: BulkRequest;
    /// Per-item failure reported inside a structured response
    type Failure: Send + Sync;
    /// Failure of the submission call as a whole
    type Error: std::error::Error + Send + Sync;

    /// Submit a batch. The response must hold one outcome per request item,
    /// in request order.
    async fn submit(
        &self,
        request: &Self::Request,
    ) -> Result<BatchResponse<Self::Failure>, Self::Error>;

    /// Create an empty request, used to assemble retry batches
    fn new_request(&self) -> Self::Request;
}
