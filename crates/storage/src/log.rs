// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only operation log with checksum verification
//!
//! Each line holds one [`LogOp`] with a sequence number and a CRC32 of the
//! serialized operation. A line that fails to parse, fails its checksum, or
//! lacks a terminating newline marks a torn write; replay stops there and
//! the tail is cut off. Intact entries after such a line mean the damage is
//! not a torn write, and replay refuses to discard them.

use crate::error::StateError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Live entries, keyed by raw bytes
pub(crate) type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// A single mutation of the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum LogOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Batch { entries: Vec<(Vec<u8>, Vec<u8>)> },
    Remove { key: Vec<u8> },
    Clear,
}

impl LogOp {
    pub(crate) fn apply(self, entries: &mut Entries) {
        match self {
            LogOp::Put { key, value } => {
                entries.insert(key, value);
            }
            LogOp::Batch { entries: batch } => entries.extend(batch),
            LogOp::Remove { key } => {
                entries.remove(&key);
            }
            LogOp::Clear => entries.clear(),
        }
    }

    fn checksum(&self) -> Result<u32, serde_json::Error> {
        Ok(crc32fast::hash(&serde_json::to_vec(self)?))
    }
}

#[derive(Serialize)]
struct EntryRef<'a> {
    sequence: u64,
    op: &'a LogOp,
    checksum: u32,
}

#[derive(Debug, Deserialize)]
struct LogEntry {
    sequence: u64,
    op: LogOp,
    checksum: u32,
}

impl LogEntry {
    fn verify(&self) -> bool {
        self.op
            .checksum()
            .map(|sum| sum == self.checksum)
            .unwrap_or(false)
    }
}

fn to_line(sequence: u64, op: &LogOp) -> Result<Vec<u8>, StateError> {
    let entry = EntryRef {
        sequence,
        op,
        checksum: op.checksum()?,
    };
    let mut line = serde_json::to_vec(&entry)?;
    line.push(b'\n');
    Ok(line)
}

/// Durable appender for one log file
pub(crate) struct LogWriter {
    file: File,
    next_sequence: u64,
}

impl LogWriter {
    pub(crate) fn open(path: &Path, next_sequence: u64) -> Result<Self, StateError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            next_sequence,
        })
    }

    /// Append `op` and fsync before returning its sequence number
    pub(crate) fn append(&mut self, op: &LogOp) -> Result<u64, StateError> {
        let sequence = self.next_sequence;
        let line = to_line(sequence, op)?;

        self.file.write_all(&line)?;
        self.file.sync_all()?;

        self.next_sequence += 1;
        Ok(sequence)
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}

/// Outcome of replaying a log file
#[derive(Debug, Default)]
pub(crate) struct Replay {
    pub(crate) entries: Entries,
    /// Valid operations applied
    pub(crate) operations: u64,
    pub(crate) next_sequence: u64,
    /// Bytes cut from a torn tail
    pub(crate) truncated: u64,
}

/// Rebuild the entry map from `path`, truncating any torn tail.
///
/// A missing file replays as empty. A damaged line followed by intact
/// entries is not a torn write, and neither is a checksum-valid entry whose
/// sequence does not increase; both fail with [`StateError::Corrupted`]
/// and leave the file untouched.
pub(crate) fn replay(path: &Path) -> Result<Replay, StateError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replay::default()),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    let mut replay = Replay::default();
    let mut last_sequence: Option<u64> = None;
    let mut valid_position: u64 = 0;
    let mut line_number: u64 = 0;
    let mut line = String::new();

    let torn = loop {
        line.clear();
        let read = match reader.read_line(&mut line) {
            Ok(0) => break None,
            Ok(n) => n as u64,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                line_number += 1;
                break Some(format!("line {} is not valid UTF-8", line_number));
            }
            Err(e) => return Err(e.into()),
        };
        line_number += 1;

        if !line.ends_with('\n') {
            break Some(format!("line {} is incomplete", line_number));
        }
        let text = line.trim_end();
        if text.is_empty() {
            valid_position += read;
            continue;
        }

        let entry: LogEntry = match serde_json::from_str(text) {
            Ok(entry) => entry,
            Err(e) => break Some(format!("line {}: {}", line_number, e)),
        };
        if !entry.verify() {
            break Some(format!("checksum mismatch at line {}", line_number));
        }
        if let Some(last) = last_sequence {
            if entry.sequence <= last {
                return Err(StateError::Corrupted {
                    path: path.to_path_buf(),
                    reason: format!(
                        "sequence {} follows {} at line {}",
                        entry.sequence, last, line_number
                    ),
                });
            }
        }

        last_sequence = Some(entry.sequence);
        entry.op.apply(&mut replay.entries);
        replay.operations += 1;
        valid_position += read;
    };

    replay.next_sequence = last_sequence.map(|s| s + 1).unwrap_or(0);

    if let Some(reason) = torn {
        if let Some(later) = next_intact_line(&mut reader, line_number)? {
            return Err(StateError::Corrupted {
                path: path.to_path_buf(),
                reason: format!("{}, but line {} is intact", reason, later),
            });
        }

        let len = std::fs::metadata(path)?.len();
        tracing::warn!(
            path = %path.display(),
            position = valid_position,
            discarded = len.saturating_sub(valid_position),
            %reason,
            "truncating torn log tail"
        );
        truncate(path, valid_position)?;
        replay.truncated = len.saturating_sub(valid_position);
    }

    Ok(replay)
}

/// Line number of the first complete, checksum-valid entry left in `reader`
fn next_intact_line(
    reader: &mut BufReader<File>,
    mut line_number: u64,
) -> Result<Option<u64>, StateError> {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            // Invalid UTF-8 is consumed; keep scanning
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {}
            Err(e) => return Err(e.into()),
        }
        line_number += 1;

        if !line.ends_with('\n') {
            continue;
        }
        let intact = serde_json::from_str::<LogEntry>(line.trim_end())
            .map(|entry| entry.verify())
            .unwrap_or(false);
        if intact {
            return Ok(Some(line_number));
        }
    }
}

fn truncate(path: &Path, position: u64) -> Result<(), StateError> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(position)?;
    file.sync_all()?;
    Ok(())
}

/// Replace the log at `path` with one `Put` per live entry.
///
/// The new log is written beside the old one and renamed over it, so a
/// crash leaves either the old or the new log intact. The returned writer
/// is opened on the new file before the rename; nothing can fail after it.
pub(crate) fn rewrite(
    path: &Path,
    entries: &Entries,
    next_sequence: u64,
) -> Result<LogWriter, StateError> {
    let temp_path = compact_path(path);
    let writer = match write_compacted(&temp_path, entries, next_sequence) {
        Ok(writer) => writer,
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    std::fs::rename(&temp_path, path)?;
    if let Err(e) = sync_parent(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to sync log directory");
    }
    Ok(writer)
}

fn write_compacted(
    temp_path: &Path,
    entries: &Entries,
    next_sequence: u64,
) -> Result<LogWriter, StateError> {
    // Leftover from an interrupted compaction
    match std::fs::remove_file(temp_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let file = OpenOptions::new()
        .create_new(true)
        .append(true)
        .open(temp_path)?;

    let mut sequence = next_sequence;
    {
        let mut out = io::BufWriter::new(&file);
        for (key, value) in entries {
            let op = LogOp::Put {
                key: key.clone(),
                value: value.clone(),
            };
            out.write_all(&to_line(sequence, &op)?)?;
            sequence += 1;
        }
        out.flush()?;
    }
    file.sync_all()?;

    Ok(LogWriter {
        file,
        next_sequence: sequence,
    })
}

/// Persist a rename by syncing the directory that holds `path`
fn sync_parent(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

fn compact_path(path: &Path) -> PathBuf {
    path.with_extension("log.compact.tmp")
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
