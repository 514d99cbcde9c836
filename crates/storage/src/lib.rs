// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tp-storage: durable key-value state for pipeline processors
//!
//! Every mutation is appended to a checksummed JSON-lines log and fsync'd
//! before it becomes visible. On open the log is replayed into an ordered
//! in-memory map; readers work on immutable snapshots of that map.
//!
//! ```text
//! put/remove/clear → LogOp → LogWriter → disk (<name>.log)
//!                                             ↓
//!                            open → replay → snapshot (BTreeMap)
//! ```

mod codec;
mod error;
mod log;
mod store;

pub use codec::{Codec, CodecError, FnCodec, JsonCodec};
pub use error::StateError;
pub use store::DurableState;

use std::collections::BTreeMap;

/// Durable key-value state owned by a processor.
///
/// Keys are raw bytes ordered lexicographically. Values are stored in
/// encoded form and decoded on read.
pub trait ProcessorState<T>: Send + Sync {
    /// Insert or replace the value for `key`; durable when this returns
    fn put(&self, key: &[u8], value: &T) -> Result<(), StateError>;

    /// Insert or replace several entries as one durable write
    fn put_all<I, K>(&self, entries: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<Vec<u8>>;

    fn get(&self, key: &[u8]) -> Result<Option<T>, StateError>;

    /// Every entry, from a single snapshot
    fn get_all(&self) -> Result<BTreeMap<Vec<u8>, T>, StateError>;

    /// Apply `f` to every entry in key order and collect the results
    fn iterate<R, F>(&self, f: F) -> Result<Vec<R>, StateError>
    where
        F: FnMut(&[u8], T) -> R;

    /// Apply `f` to the entries at positions `[start, end)` in key order.
    ///
    /// Positions are reached by walking from the first entry, so the cost
    /// grows with `start`.
    fn iterate_range<R, F>(&self, start: usize, end: usize, f: F) -> Result<Vec<R>, StateError>
    where
        F: FnMut(&[u8], T) -> R;

    fn size(&self) -> Result<u64, StateError>;

    /// Delete `key`, returning whether it was present
    fn remove(&self, key: &[u8]) -> Result<bool, StateError>;

    /// Remove every entry
    fn clear(&self) -> Result<(), StateError>;

    /// Release the log and the directory lock. Repeated calls are no-ops.
    fn close(&self) -> Result<(), StateError>;
}
