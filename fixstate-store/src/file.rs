/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! File-backed store implementation.
//!
//! Each session owns three files in the store directory, named after the
//! session identity:
//!
//! - `<prefix>.seqnums`: `sender:target`, rewritten through a temp file and rename
//! - `<prefix>.body`: append-only records of `seq,len\n` followed by `len` raw bytes
//! - `<prefix>.session`: creation time of the current session period (RFC 3339)
//!
//! The body file is indexed in memory on open so resend lookups never scan it.

use crate::traits::{MessageStore, SequenceStore, check_forward};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use fixstate_core::error::StoreError;
use fixstate_core::types::SessionId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone)]
struct StorePaths {
    seqnums: PathBuf,
    body: PathBuf,
    session: PathBuf,
}

impl StorePaths {
    fn new(dir: &Path, session_id: &SessionId) -> Self {
        let prefix: String = session_id
            .to_string()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            seqnums: dir.join(format!("{prefix}.seqnums")),
            body: dir.join(format!("{prefix}.body")),
            session: dir.join(format!("{prefix}.session")),
        }
    }
}

#[derive(Debug)]
struct Inner {
    next_sender: u64,
    next_target: u64,
    messages: BTreeMap<u64, Bytes>,
    body: File,
    creation_time: SystemTime,
}

/// Message store persisted to plain files.
#[derive(Debug)]
pub struct FileStore {
    paths: StorePaths,
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Opens the store for a session, creating its files if needed.
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory or files cannot be accessed,
    /// or `StoreError::Corrupted` if existing files cannot be parsed.
    pub fn open(dir: impl AsRef<Path>, session_id: &SessionId) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let paths = StorePaths::new(dir, session_id);
        let inner = load(&paths)?;
        debug!(
            session = %session_id,
            sender = inner.next_sender,
            target = inner.next_target,
            messages = inner.messages.len(),
            "opened file store"
        );
        Ok(Self {
            paths,
            inner: Mutex::new(inner),
        })
    }

    fn set_counters(
        &self,
        inner: &mut Inner,
        sender: u64,
        target: u64,
    ) -> Result<(), StoreError> {
        write_seqnums(&self.paths.seqnums, sender, target)?;
        inner.next_sender = sender;
        inner.next_target = target;
        Ok(())
    }
}

fn load(paths: &StorePaths) -> Result<Inner, StoreError> {
    let (next_sender, next_target) = match fs::read_to_string(&paths.seqnums) {
        Ok(text) => parse_seqnums(&text)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            write_seqnums(&paths.seqnums, 1, 1)?;
            (1, 1)
        }
        Err(e) => return Err(e.into()),
    };

    let messages = match fs::read(&paths.body) {
        Ok(data) => parse_body(&data)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => return Err(e.into()),
    };
    let body = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.body)?;

    let creation_time = match fs::read_to_string(&paths.session) {
        Ok(text) => DateTime::parse_from_rfc3339(text.trim())
            .map(|dt| SystemTime::from(dt.with_timezone(&Utc)))
            .map_err(|e| StoreError::Corrupted {
                reason: format!("invalid creation time: {e}"),
            })?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => write_creation_time(&paths.session)?,
        Err(e) => return Err(e.into()),
    };

    Ok(Inner {
        next_sender,
        next_target,
        messages,
        body,
        creation_time,
    })
}

fn parse_seqnums(text: &str) -> Result<(u64, u64), StoreError> {
    let corrupted = || StoreError::Corrupted {
        reason: format!("invalid seqnums file: {text:?}"),
    };
    let (sender, target) = text.trim().split_once(':').ok_or_else(corrupted)?;
    let sender: u64 = sender.trim().parse().map_err(|_| corrupted())?;
    let target: u64 = target.trim().parse().map_err(|_| corrupted())?;
    if sender == 0 || target == 0 {
        return Err(corrupted());
    }
    Ok((sender, target))
}

fn parse_body(mut data: &[u8]) -> Result<BTreeMap<u64, Bytes>, StoreError> {
    let mut messages = BTreeMap::new();
    while !data.is_empty() {
        let newline = data
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| StoreError::Corrupted {
                reason: "truncated body record header".to_string(),
            })?;
        let header = std::str::from_utf8(&data[..newline]).map_err(|e| StoreError::Corrupted {
            reason: format!("body record header: {e}"),
        })?;
        let (seq, len) = header
            .split_once(',')
            .and_then(|(s, l)| Some((s.parse::<u64>().ok()?, l.parse::<usize>().ok()?)))
            .ok_or_else(|| StoreError::Corrupted {
                reason: format!("invalid body record header {header:?}"),
            })?;
        let rest = &data[newline + 1..];
        if rest.len() < len {
            return Err(StoreError::Corrupted {
                reason: format!("body record {seq} truncated"),
            });
        }
        messages.insert(seq, Bytes::copy_from_slice(&rest[..len]));
        data = &rest[len..];
    }
    Ok(messages)
}

fn write_seqnums(path: &Path, sender: u64, target: u64) -> Result<(), StoreError> {
    let tmp = path.with_extension("seqnums.tmp");
    fs::write(&tmp, format!("{sender}:{target}"))?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn write_creation_time(path: &Path) -> Result<SystemTime, StoreError> {
    let now = Utc::now();
    fs::write(path, now.to_rfc3339())?;
    Ok(SystemTime::from(now))
}

impl SequenceStore for FileStore {
    fn next_sender_msg_seq_num(&self) -> u64 {
        self.inner.lock().next_sender
    }

    fn next_target_msg_seq_num(&self) -> u64 {
        self.inner.lock().next_target
    }

    fn incr_next_sender_msg_seq_num(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let (sender, target) = (inner.next_sender + 1, inner.next_target);
        self.set_counters(&mut inner, sender, target)
    }

    fn incr_next_target_msg_seq_num(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let (sender, target) = (inner.next_sender, inner.next_target + 1);
        self.set_counters(&mut inner, sender, target)
    }

    fn set_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        check_forward(inner.next_sender, seq)?;
        let target = inner.next_target;
        self.set_counters(&mut inner, seq, target)
    }

    fn set_next_target_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        check_forward(inner.next_target, seq)?;
        let sender = inner.next_sender;
        self.set_counters(&mut inner, sender, seq)
    }

    fn force_next_sender_msg_seq_num(&self, seq: u64) -> Result<(), StoreError> {
        if seq == 0 {
            return Err(StoreError::InvalidSeqNum { value: seq });
        }
        let mut inner = self.inner.lock();
        let target = inner.next_target;
        self.set_counters(&mut inner, seq, target)
    }
}

impl MessageStore for FileStore {
    fn save_message(&self, seq_num: u64, message: &[u8]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let mut record = format!("{},{}\n", seq_num, message.len()).into_bytes();
        record.extend_from_slice(message);
        inner
            .body
            .write_all(&record)
            .and_then(|()| inner.body.flush())
            .map_err(|e| StoreError::StoreFailed {
                seq_num,
                reason: e.to_string(),
            })?;
        inner
            .messages
            .insert(seq_num, Bytes::copy_from_slice(message));
        Ok(())
    }

    fn get_messages(&self, begin: u64, end: u64) -> Result<Vec<(u64, Bytes)>, StoreError> {
        if begin > end {
            return Ok(Vec::new());
        }
        Ok(self
            .inner
            .lock()
            .messages
            .range(begin..=end)
            .map(|(seq, bytes)| (*seq, bytes.clone()))
            .collect())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.body = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.paths.body)?;
        inner.messages.clear();
        inner.creation_time = write_creation_time(&self.paths.session)?;
        self.set_counters(&mut inner, 1, 1)
    }

    fn refresh(&self) -> Result<(), StoreError> {
        let fresh = load(&self.paths)?;
        *self.inner.lock() = fresh;
        Ok(())
    }

    fn creation_time(&self) -> SystemTime {
        self.inner.lock().creation_time
    }
}
