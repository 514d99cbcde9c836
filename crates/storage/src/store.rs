// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log-backed implementation of [`ProcessorState`]

use crate::codec::{Codec, JsonCodec};
use crate::error::StateError;
use crate::log::{self, Entries, LogOp, LogWriter};
use crate::ProcessorState;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tp_core::StateConfig;

/// Writer-side resources, present while the store is open
struct Engine {
    log: LogWriter,
    lock: File,
    ops_since_compaction: u64,
}

/// Durable state store for one named processor.
///
/// Files live in `dir` as `<name>.log` and `<name>.lock`. The lock is held
/// exclusively from `open` until `close` or drop, so at most one store
/// instance owns a name at a time.
pub struct DurableState<T, C = JsonCodec> {
    name: String,
    log_path: PathBuf,
    codec: C,
    compact_after: u64,
    snapshot: RwLock<Arc<Entries>>,
    engine: Mutex<Option<Engine>>,
    closed: AtomicBool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> DurableState<T, JsonCodec>
where
    T: Serialize + DeserializeOwned,
{
    /// Open `name` in `dir` with JSON values and default tuning
    pub fn open(dir: &Path, name: &str) -> Result<Self, StateError> {
        Self::open_with(dir, name, JsonCodec, &StateConfig::default())
    }
}

impl<T, C> DurableState<T, C>
where
    C: Codec<T>,
{
    /// Open or create `name` in `dir`, replaying its log
    pub fn open_with(
        dir: &Path,
        name: &str,
        codec: C,
        config: &StateConfig,
    ) -> Result<Self, StateError> {
        validate_name(name)?;
        std::fs::create_dir_all(dir)?;

        let lock_path = dir.join(format!("{}.lock", name));
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.try_lock_exclusive()
            .map_err(|_| StateError::Locked { path: lock_path })?;

        let log_path = dir.join(format!("{}.log", name));
        let replay = log::replay(&log_path)?;
        let writer = LogWriter::open(&log_path, replay.next_sequence)?;

        tracing::info!(
            store = name,
            entries = replay.entries.len(),
            operations = replay.operations,
            truncated = replay.truncated,
            "opened state store"
        );

        Ok(Self {
            name: name.to_string(),
            log_path,
            codec,
            compact_after: config.compact_after.max(1),
            snapshot: RwLock::new(Arc::new(replay.entries)),
            engine: Mutex::new(Some(Engine {
                log: writer,
                lock,
                ops_since_compaction: replay.operations,
            })),
            closed: AtomicBool::new(false),
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StateError> {
        if self.is_closed() {
            return Err(StateError::Closed);
        }
        Ok(())
    }

    /// Current entry map; later writes are not visible through it
    fn read_snapshot(&self) -> Result<Arc<Entries>, StateError> {
        self.ensure_open()?;
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        Ok(Arc::clone(&snapshot))
    }

    fn lock_engine(&self) -> MutexGuard<'_, Option<Engine>> {
        self.engine.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn decode(&self, key: &[u8], bytes: &[u8]) -> Result<T, StateError> {
        self.codec
            .decode(bytes)
            .map_err(|source| StateError::Deserialization {
                key: key.to_vec(),
                source,
            })
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, StateError> {
        self.codec.encode(value).map_err(StateError::Serialization)
    }

    /// Log `op`, then publish it to readers
    fn commit(&self, op: LogOp) -> Result<(), StateError> {
        let mut guard = self.lock_engine();
        let engine = guard.as_mut().ok_or(StateError::Closed)?;
        self.commit_locked(engine, op)
    }

    fn commit_locked(&self, engine: &mut Engine, op: LogOp) -> Result<(), StateError> {
        engine.log.append(&op)?;
        engine.ops_since_compaction += 1;

        let clears = matches!(op, LogOp::Clear);
        {
            let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
            op.apply(Arc::make_mut(&mut snapshot));
        }

        // The change is durable from here on; compaction only shrinks the log
        if clears || engine.ops_since_compaction >= self.compact_after {
            if let Err(e) = self.compact(engine) {
                engine.ops_since_compaction = 0;
                tracing::warn!(store = %self.name, error = %e, "log compaction failed");
            }
        }
        Ok(())
    }

    fn compact(&self, engine: &mut Engine) -> Result<(), StateError> {
        let entries = Arc::clone(&self.snapshot.read().unwrap_or_else(|e| e.into_inner()));
        let replaced = engine.ops_since_compaction;

        engine.log = log::rewrite(&self.log_path, &entries, engine.log.next_sequence())?;
        engine.ops_since_compaction = 0;

        tracing::info!(
            store = %self.name,
            entries = entries.len(),
            replaced,
            "compacted state log"
        );
        Ok(())
    }
}

impl<T, C> ProcessorState<T> for DurableState<T, C>
where
    C: Codec<T>,
{
    fn put(&self, key: &[u8], value: &T) -> Result<(), StateError> {
        self.ensure_open()?;
        let value = self.encode(value)?;
        self.commit(LogOp::Put {
            key: key.to_vec(),
            value,
        })
    }

    fn put_all<I, K>(&self, entries: I) -> Result<(), StateError>
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<Vec<u8>>,
    {
        self.ensure_open()?;
        let entries = entries
            .into_iter()
            .map(|(key, value)| Ok((key.into(), self.encode(&value)?)))
            .collect::<Result<Vec<_>, StateError>>()?;
        if entries.is_empty() {
            return Ok(());
        }
        self.commit(LogOp::Batch { entries })
    }

    fn get(&self, key: &[u8]) -> Result<Option<T>, StateError> {
        let snapshot = self.read_snapshot()?;
        snapshot
            .get(key)
            .map(|bytes| self.decode(key, bytes))
            .transpose()
    }

    fn get_all(&self) -> Result<BTreeMap<Vec<u8>, T>, StateError> {
        let snapshot = self.read_snapshot()?;
        snapshot
            .iter()
            .map(|(key, bytes)| Ok((key.clone(), self.decode(key, bytes)?)))
            .collect()
    }

    fn iterate<R, F>(&self, mut f: F) -> Result<Vec<R>, StateError>
    where
        F: FnMut(&[u8], T) -> R,
    {
        let snapshot = self.read_snapshot()?;
        snapshot
            .iter()
            .map(|(key, bytes)| Ok(f(key, self.decode(key, bytes)?)))
            .collect()
    }

    fn iterate_range<R, F>(&self, start: usize, end: usize, mut f: F) -> Result<Vec<R>, StateError>
    where
        F: FnMut(&[u8], T) -> R,
    {
        let snapshot = self.read_snapshot()?;
        if start >= end {
            return Ok(Vec::new());
        }
        snapshot
            .iter()
            .skip(start)
            .take(end - start)
            .map(|(key, bytes)| Ok(f(key, self.decode(key, bytes)?)))
            .collect()
    }

    fn size(&self) -> Result<u64, StateError> {
        Ok(self.read_snapshot()?.len() as u64)
    }

    fn remove(&self, key: &[u8]) -> Result<bool, StateError> {
        let mut guard = self.lock_engine();
        let engine = guard.as_mut().ok_or(StateError::Closed)?;
        if !self.read_snapshot()?.contains_key(key) {
            return Ok(false);
        }
        self.commit_locked(engine, LogOp::Remove { key: key.to_vec() })?;
        Ok(true)
    }

    fn clear(&self) -> Result<(), StateError> {
        self.commit(LogOp::Clear)
    }

    fn close(&self) -> Result<(), StateError> {
        let mut guard = self.lock_engine();
        self.closed.store(true, Ordering::Release);

        let Some(engine) = guard.take() else {
            return Ok(());
        };
        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Arc::default();
        engine.lock.unlock()?;

        tracing::info!(store = %self.name, "closed state store");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), StateError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(StateError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
