// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reporting of items that could not be delivered

use std::fmt;
use std::sync::Arc;

/// Why an item was abandoned
#[derive(Debug)]
pub enum FailureCause<F, E> {
    /// The item's own failure from a structured response
    Item(F),
    /// The submission call failed as a whole; shared by every item in it
    Request(Arc<E>),
}

impl<F: fmt::Display, E: fmt::Display> fmt::Display for FailureCause<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Item(failure) => write!(f, "item failed: {}", failure),
            FailureCause::Request(error) => write!(f, "request failed: {}", error),
        }
    }
}

/// Receives every terminally failed item exactly once, with its original payload.
///
/// Observers may be called from several deliveries at once.
pub trait FailureObserver<I, F, E>: Send + Sync {
    fn on_failure(&self, item: I, cause: FailureCause<F, E>);
}

impl<I, F, E, T> FailureObserver<I, F, E> for T
where
    T: Fn(I, FailureCause<F, E>) + Send + Sync,
{
    fn on_failure(&self, item: I, cause: FailureCause<F, E>) {
        self(item, cause)
    }
}

/// Logs each abandoned item at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailures;

impl<I, F, E> FailureObserver<I, F, E> for LogFailures
where
    I: fmt::Debug,
    F: fmt::Display,
    E: fmt::Display,
{
    fn on_failure(&self, item: I, cause: FailureCause<F, E>) {
        tracing::error!(?item, %cause, "item has failure");
    }
}
