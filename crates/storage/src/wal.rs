// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL event write-ahead log.
//!
//! Every committed job event is appended and fsynced before it is applied
//! to the in-memory state. Recovery loads the latest snapshot and replays
//! the entries after its sequence number.
//!
//! Each entry is a single line of JSON: `{"seq":N,"event":{...}}\n`

use rpk_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in Wal operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization helper for writing entries without cloning the event.
#[derive(Serialize)]
struct WalRecordRef<'a> {
    seq: u64,
    event: &'a Event,
}

#[derive(Deserialize)]
struct WalRecord {
    seq: u64,
    event: Event,
}

/// A single WAL entry with sequence number
#[derive(Debug, Clone)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only JSONL log of job events.
///
/// `append` only buffers; an event is durable once `flush` returns.
pub struct Wal {
    file: File,
    path: PathBuf,
    /// Highest sequence number assigned so far
    write_seq: u64,
    /// Serialized entries waiting for the next flush (without trailing newline)
    write_buffer: Vec<Vec<u8>>,
}

impl Wal {
    /// Open or create a WAL at the given path.
    ///
    /// `floor_seq` is the sequence covered by the loaded snapshot; new
    /// entries are numbered above both it and anything already in the file,
    /// so a truncated log never reuses a sequence number.
    ///
    /// A log with an unparseable line is rotated to `.bak` and rewritten
    /// with the valid prefix.
    pub fn open(path: &Path, floor_seq: u64) -> Result<Self, WalError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = Self::open_append(path)?;
        let (valid_lines, max_seq, corrupt) = Self::scan(&file)?;

        if corrupt {
            drop(file);

            let bak_path = crate::snapshot::rotate_bak_path(path);
            warn!(
                path = %path.display(),
                bak = %bak_path.display(),
                valid_entries = valid_lines.len(),
                "corrupt WAL detected, rotating to .bak and keeping valid entries",
            );
            std::fs::rename(path, &bak_path)?;

            {
                let mut clean = File::create(path)?;
                for line in &valid_lines {
                    clean.write_all(line.as_bytes())?;
                    clean.write_all(b"\n")?;
                }
                clean.sync_all()?;
            }
            file = Self::open_append(path)?;
        }

        Ok(Self {
            file,
            path: path.to_owned(),
            write_seq: max_seq.max(floor_seq),
            write_buffer: Vec::new(),
        })
    }

    fn open_append(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
    }

    /// Read the valid prefix of the log.
    ///
    /// Returns `(lines, max_seq, corrupt)` where `corrupt` is true if a line
    /// failed to parse (as opposed to a clean EOF).
    fn scan(file: &File) -> Result<(Vec<String>, u64, bool), WalError> {
        let mut reader = BufReader::new(file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;

        let mut lines = Vec::new();
        let mut max_seq = 0u64;
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => return Ok((lines, max_seq, false)),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    return Ok((lines, max_seq, true))
                }
                Err(e) => return Err(e.into()),
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<WalRecord>(trimmed) {
                Ok(record) => {
                    max_seq = max_seq.max(record.seq);
                    lines.push(trimmed.to_string());
                }
                Err(_) => return Ok((lines, max_seq, true)),
            }
        }
    }

    /// Buffer an event and return its sequence number.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let json_bytes = serde_json::to_vec(&WalRecordRef { seq, event })?;
        self.write_buffer.push(json_bytes);
        self.write_seq = seq;
        Ok(seq)
    }

    /// Write buffered entries with a single fsync.
    ///
    /// This is the durability point for every appended event.
    pub fn flush(&mut self) -> Result<(), WalError> {
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        for mut json_bytes in self.write_buffer.drain(..) {
            json_bytes.push(b'\n');
            self.file.write_all(&json_bytes)?;
        }
        self.file.sync_all()?;
        Ok(())
    }

    /// Highest sequence number assigned so far.
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Drop entries below `seq`, keeping `seq` itself and everything after.
    ///
    /// Called after a checkpoint. Rewrites through a temp file and an atomic rename.
    pub fn truncate_before(&mut self, seq: u64) -> Result<(), WalError> {
        self.flush()?;

        let (lines, _, _) = Self::scan(&self.file)?;
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            for line in &lines {
                let record: WalRecord = serde_json::from_str(line)?;
                if record.seq >= seq {
                    tmp_file.write_all(line.as_bytes())?;
                    tmp_file.write_all(b"\n")?;
                }
            }
            tmp_file.sync_all()?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        self.file = Self::open_append(&self.path)?;
        Ok(())
    }

    /// All entries with a sequence number above `seq`, in log order.
    ///
    /// Replay stops at the first unparseable line.
    pub fn entries_after(&self, seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let mut reader = BufReader::new(self.file.try_clone()?);
        reader.seek(SeekFrom::Start(0))?;
        read_valid_prefix(reader, seq)
    }

    /// Read the entries of a log another process may be appending to.
    ///
    /// Never writes: a torn or corrupt tail ends the read instead of being
    /// rotated away. A missing log reads as empty.
    pub fn read_entries(path: &Path) -> Result<Vec<WalEntry>, WalError> {
        match File::open(path) {
            Ok(file) => read_valid_prefix(BufReader::new(file), 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_valid_prefix(mut reader: impl BufRead, seq: u64) -> Result<Vec<WalEntry>, WalError> {
    let mut entries = Vec::new();
    let mut line = String::new();
    let mut offset = 0u64;

    loop {
        line.clear();
        let bytes_read = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => break,
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if !trimmed.is_empty() {
            let record: WalRecord = match serde_json::from_str(trimmed) {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        offset,
                        error = %e,
                        "corrupt WAL entry during replay, stopping at corruption point",
                    );
                    break;
                }
            };
            if record.seq > seq {
                entries.push(WalEntry {
                    seq: record.seq,
                    event: record.event,
                });
            }
        }
        offset += bytes_read as u64;
    }

    Ok(entries)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
