// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced sink wrapper for consistent observability

use crate::request::{BatchResponse, BulkRequest};
use crate::BulkSink;
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds a span and timing to every submission of any BulkSink
#[derive(Clone)]
pub struct TracedBulkSink<S> {
    inner: S,
}

impl<S> TracedBulkSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: BulkSink> BulkSink for TracedBulkSink<S> {
    type Request = S::Request;
    type Failure = S::Failure;
    type Error = S::Error;

    async fn submit(
        &self,
        request: &Self::Request,
    ) -> Result<BatchResponse<Self::Failure>, Self::Error> {
        let span = tracing::info_span!("bulk.submit", items = request.len());

        async {
            tracing::debug!("submitting");

            let start = std::time::Instant::now();
            let result = self.inner.submit(request).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(response) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    failures = response.failure_count(),
                    "submitted"
                ),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "submit failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn new_request(&self) -> Self::Request {
        self.inner.new_request()
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
