// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Partial-failure-aware bulk delivery with exponential backoff
//!
//! Each delivery is a loop carrying the current request and a backoff
//! cursor:
//!
//! ```text
//! submit ─┬─ error ───── retryable + delay left ──► wait ──► resubmit same request
//!         │              otherwise ──────────────► report every item, stop
//!         └─ response ── terminal items ─────────► report each
//!                        retryable items ─┬─ none ──────────► done
//!                                         ├─ delay left ────► wait ──► submit reduced request
//!                                         └─ exhausted ─────► report each, stop
//! ```

use crate::observer::{FailureCause, FailureObserver};
use crate::policy::{Disposition, RetryPolicy};
use crate::request::{BulkRequest, ItemResponse};
use crate::{BulkSink, ItemOf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tp_core::BackoffConfig;
use tracing::Instrument;

/// Abnormal end of a delivery.
///
/// Items that were not yet resolved when this is returned have not been
/// reported to the observer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("delivery interrupted during backoff")]
    Interrupted,
    #[error("sink returned {actual} item responses for a request of {expected} items")]
    MisalignedResponse { expected: usize, actual: usize },
}

/// Summary of a completed delivery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Submission calls made, including the first
    pub attempts: u32,
    /// Items the sink accepted
    pub delivered: usize,
    /// Items reported to the failure observer
    pub failed: usize,
}

impl DeliveryReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Retry engine wrapping a [`BulkSink`]
pub struct BulkRetry<S, P, O> {
    sink: S,
    policy: P,
    observer: O,
    backoff: BackoffConfig,
    cancel: CancellationToken,
}

impl<S, P, O> BulkRetry<S, P, O>
where
    S: BulkSink,
    P: RetryPolicy<S::Failure, S::Error>,
    O: FailureObserver<ItemOf<S>, S::Failure, S::Error>,
{
    pub fn new(sink: S, policy: P, observer: O, backoff: BackoffConfig) -> Self {
        Self {
            sink,
            policy,
            observer,
            backoff,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort deliveries waiting on backoff when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that interrupts this engine's deliveries
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Deliver `request`, retrying retryable failures until every item
    /// succeeds, fails terminally, or the backoff sequence runs out.
    pub async fn execute(&self, request: S::Request) -> Result<DeliveryReport, DeliveryError> {
        let span = tracing::info_span!("bulk.deliver", items = request.len());
        self.deliver(request).instrument(span).await
    }

    async fn deliver(&self, request: S::Request) -> Result<DeliveryReport, DeliveryError> {
        let mut backoff = self.backoff.sequence();
        let mut report = DeliveryReport::default();
        let mut request = request;

        loop {
            report.attempts += 1;

            let response = match self.sink.submit(&request).await {
                Ok(response) => response,
                Err(error) => {
                    match self.policy.classify_error(&error) {
                        Disposition::Retryable => {
                            if let Some(delay) = backoff.next() {
                                tracing::warn!(
                                    attempt = report.attempts,
                                    delay_ms = delay.as_millis() as u64,
                                    items = request.len(),
                                    error = %error,
                                    "bulk request failed, retrying"
                                );
                                self.wait(delay).await?;
                                continue;
                            }
                            tracing::error!(
                                attempts = report.attempts,
                                items = request.len(),
                                error = %error,
                                "bulk request failed, retries exhausted"
                            );
                        }
                        Disposition::Terminal => tracing::error!(
                            items = request.len(),
                            error = %error,
                            "bulk request failed with non-retryable error"
                        ),
                    }

                    let error = Arc::new(error);
                    for item in request.into_items() {
                        report.failed += 1;
                        self.observer
                            .on_failure(item, FailureCause::Request(Arc::clone(&error)));
                    }
                    return Ok(Self::finish(report));
                }
            };

            if response.len() != request.len() {
                tracing::error!(
                    expected = request.len(),
                    actual = response.len(),
                    "misaligned bulk response"
                );
                return Err(DeliveryError::MisalignedResponse {
                    expected: request.len(),
                    actual: response.len(),
                });
            }

            let mut retry = self.sink.new_request();
            let mut pending = Vec::new();
            for (item, outcome) in request.into_items().into_iter().zip(response.into_items()) {
                match outcome {
                    ItemResponse::Success => report.delivered += 1,
                    ItemResponse::Failure(failure) => {
                        match self.policy.classify_failure(&failure) {
                            Disposition::Terminal => {
                                report.failed += 1;
                                self.observer.on_failure(item, FailureCause::Item(failure));
                            }
                            Disposition::Retryable => {
                                retry.push(item);
                                pending.push(failure);
                            }
                        }
                    }
                }
            }

            if retry.is_empty() {
                return Ok(Self::finish(report));
            }

            match backoff.next() {
                Some(delay) => {
                    tracing::warn!(
                        attempt = report.attempts,
                        delay_ms = delay.as_millis() as u64,
                        retryable = retry.len(),
                        "bulk items failed, retrying"
                    );
                    self.wait(delay).await?;
                    request = retry;
                }
                None => {
                    tracing::error!(
                        attempts = report.attempts,
                        retryable = retry.len(),
                        "bulk items failed, retries exhausted"
                    );
                    for (item, failure) in retry.into_items().into_iter().zip(pending) {
                        report.failed += 1;
                        self.observer.on_failure(item, FailureCause::Item(failure));
                    }
                    return Ok(Self::finish(report));
                }
            }
        }
    }

    async fn wait(&self, delay: Duration) -> Result<(), DeliveryError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::warn!("delivery interrupted during backoff");
                Err(DeliveryError::Interrupted)
            }
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    fn finish(report: DeliveryReport) -> DeliveryReport {
        tracing::info!(
            attempts = report.attempts,
            delivered = report.delivered,
            failed = report.failed,
            "bulk delivery finished"
        );
        report
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
