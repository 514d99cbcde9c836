// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory blocking buffer

use crate::{Buffer, BufferError, WriteTimeout};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tp_core::{BufferConfig, Record};

/// Bounded FIFO buffer backed by a mutex and two condition variables.
///
/// All size changes happen under one lock, so the size observed by any
/// caller is always within `[0, capacity]`. Any number of writers and readers
/// may share it.
pub struct BlockingBuffer<T> {
    queue: Mutex<VecDeque<Record<T>>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
    batch_size: usize,
}

impl<T> BlockingBuffer<T> {
    /// Create a buffer holding at most `capacity` records, read `batch_size` at a time
    pub fn new(capacity: usize, batch_size: usize) -> Result<Self, BufferError> {
        Self::from_config(&BufferConfig::new(capacity, batch_size))
    }

    pub fn from_config(config: &BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        Ok(Self {
            queue: Mutex::new(VecDeque::with_capacity(config.capacity)),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity: config.capacity,
            batch_size: config.batch_size,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Record<T>>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Wait on `condvar` until notified or `deadline` passes.
///
/// Always hands the guard back; the flag is true when the deadline had
/// already passed and no wait happened. A `None` deadline (timeout too large
/// to represent) waits without a bound.
fn wait_until<'a, Q>(
    condvar: &Condvar,
    guard: MutexGuard<'a, Q>,
    deadline: Option<Instant>,
) -> (MutexGuard<'a, Q>, bool) {
    match deadline {
        Some(deadline) => {
            let now = Instant::now();
            if now >= deadline {
                return (guard, true);
            }
            let guard = condvar
                .wait_timeout(guard, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
            (guard, false)
        }
        None => (condvar.wait(guard).unwrap_or_else(|e| e.into_inner()), false),
    }
}

impl<T: Send> Buffer<T> for BlockingBuffer<T> {
    fn write(&self, record: Record<T>, timeout: Duration) -> Result<(), WriteTimeout<T>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.lock();

        while queue.len() >= self.capacity {
            let (guard, expired) = wait_until(&self.not_full, queue, deadline);
            queue = guard;
            if expired {
                tracing::debug!(
                    capacity = self.capacity,
                    timeout_ms = timeout.as_millis() as u64,
                    "buffer write timed out"
                );
                return Err(WriteTimeout::new(record, timeout));
            }
        }

        queue.push_back(record);
        tracing::trace!(size = queue.len(), "buffer write");
        drop(queue);
        self.not_empty.notify_one();
        Ok(())
    }

    fn read(&self, timeout: Duration) -> Vec<Record<T>> {
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.lock();

        while queue.len() < self.batch_size {
            let (guard, expired) = wait_until(&self.not_empty, queue, deadline);
            queue = guard;
            if expired {
                break;
            }
        }

        let take = queue.len().min(self.batch_size);
        let batch: Vec<_> = queue.drain(..take).collect();
        let remaining = queue.len();
        drop(queue);

        if !batch.is_empty() {
            tracing::trace!(records = batch.len(), remaining, "buffer read");
            self.not_full.notify_all();
        }
        if remaining > 0 {
            // Another reader may be waiting on what is left
            self.not_empty.notify_one();
        }
        batch
    }
}

#[cfg(test)]
#[path = "blocking_tests.rs"]
mod tests;
