// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff sequence
//!
//! Delays follow `initial + 10ms * (floor(e^(0.8 * n)) - 1)` for the n-th
//! term, which starts at `initial` and grows roughly 2.2x per step once the
//! exponential term dominates. Terms are produced lazily, saturate instead of
//! overflowing, and never decrease.

use std::time::Duration;

const GROWTH_FACTOR: f64 = 0.8;
const STEP_MILLIS: u64 = 10;

/// A lazily generated, non-decreasing sequence of retry delays.
///
/// The sequence is a one-shot cursor: each retry consumes one term and the
/// cursor is never rewound. `None` as the retry limit makes it unbounded.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_millis: u64,
    max_delay: Option<Duration>,
    remaining: Option<u32>,
    consumed: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max_retries: Option<u32>, max_delay: Option<Duration>) -> Self {
        Self {
            initial_millis: u64::try_from(initial.as_millis()).unwrap_or(u64::MAX),
            max_delay,
            remaining: max_retries,
            consumed: 0,
        }
    }

    /// Number of terms handed out so far
    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Whether another term is available
    pub fn has_next(&self) -> bool {
        self.remaining != Some(0)
    }

    fn delay_for(&self, term: u32) -> Duration {
        // Float-to-int casts saturate, so huge exponents clamp to u64::MAX
        let growth = (GROWTH_FACTOR * f64::from(term)).exp() as u64;
        let millis = self
            .initial_millis
            .saturating_add(STEP_MILLIS.saturating_mul(growth.saturating_sub(1)));
        let delay = Duration::from_millis(millis);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        match self.remaining.as_mut() {
            Some(0) => return None,
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        let delay = self.delay_for(self.consumed);
        self.consumed = self.consumed.saturating_add(1);
        Some(delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => (n as usize, Some(n as usize)),
            None => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
