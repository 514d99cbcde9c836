// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retryable vs. terminal classification

use std::collections::BTreeSet;

/// How a failed item or request is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Resubmit after the next backoff delay
    Retryable,
    /// Report to the failure observer and never resubmit
    Terminal,
}

/// Sink-specific classification of failures
pub trait RetryPolicy<F, E>: Send + Sync {
    /// Classify a failed item from a structured response
    fn classify_failure(&self, failure: &F) -> Disposition;

    /// Classify an error raised by the submission call itself
    fn classify_error(&self, error: &E) -> Disposition;
}

/// Treats every failure as retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<F, E> RetryPolicy<F, E> for AlwaysRetry {
    fn classify_failure(&self, _failure: &F) -> Disposition {
        Disposition::Retryable
    }

    fn classify_error(&self, _error: &E) -> Disposition {
        Disposition::Retryable
    }
}

/// Failures that may carry an HTTP-style status code
pub trait StatusCode {
    /// `None` when the failure never reached the server (e.g. transport I/O)
    fn status(&self) -> Option<u16>;
}

/// Status-code classification for HTTP bulk APIs.
///
/// Statuses in the terminal set are never retried. Everything else,
/// including failures without a status, is retried.
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    terminal: BTreeSet<u16>,
}

/// Bad request, not found, conflict
const DEFAULT_TERMINAL_STATUSES: [u16; 3] = [400, 404, 409];

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_STATUSES)
    }
}

impl StatusPolicy {
    pub fn new(terminal: impl IntoIterator<Item = u16>) -> Self {
        Self {
            terminal: terminal.into_iter().collect(),
        }
    }

    pub fn classify_status(&self, status: Option<u16>) -> Disposition {
        match status {
            Some(status) if self.terminal.contains(&status) => Disposition::Terminal,
            _ => Disposition::Retryable,
        }
    }
}

impl<F: StatusCode, E: StatusCode> RetryPolicy<F, E> for StatusPolicy {
    fn classify_failure(&self, failure: &F) -> Disposition {
        self.classify_status(failure.status())
    }

    fn classify_error(&self, error: &E) -> Disposition {
        self.classify_status(error.status())
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
