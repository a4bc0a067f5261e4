//! Journal backends for ledger persistence.
//!
//! The in-memory ledger is authoritative while the process runs. A journal
//! records every admitted entry so the ledger can be rebuilt on restart.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, error, warn};

use crate::entry::LedgerEntry;
use crate::error::{LedgerError, LedgerResult};

/// Durable record of admitted ledger entries.
///
/// Implementations must be thread-safe. `record` is called while the ledger
/// holds its admission lock, so a failed write keeps the entry out of the
/// ledger.
pub trait LedgerJournal: Send + Sync {
    /// Persist one admitted entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn record(&self, entry: &LedgerEntry) -> LedgerResult<()>;

    /// Load every recorded entry, in admission order.
    ///
    /// # Errors
    ///
    /// Returns an error if the journal cannot be read or a record is invalid.
    fn load(&self) -> LedgerResult<Vec<LedgerEntry>>;

    /// Flush pending writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> LedgerResult<()> {
        Ok(())
    }
}

/// Journal that keeps records in memory. Useful for tests.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<LedgerEntry>>,
}

impl MemoryJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal pre-seeded with entries.
    #[must_use]
    pub fn with_entries(entries: Vec<LedgerEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl LedgerJournal for MemoryJournal {
    fn record(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| {
                warn!("MemoryJournal lock poisoned, recovering");
                e.into_inner()
            })
            .push(entry.clone());
        Ok(())
    }

    fn load(&self) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| {
                warn!("MemoryJournal lock poisoned, recovering");
                e.into_inner()
            })
            .clone())
    }
}

/// Append-only JSON-lines journal.
///
/// Each admitted entry is written as one JSON object followed by a newline
/// and flushed before `record` returns.
#[derive(Debug)]
pub struct JsonlJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlJournal {
    /// Open (or create) a journal file for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be created.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened ledger journal");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A journal file that can be cut back to an earlier length.
trait Truncate {
    fn current_len(&self) -> std::io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()>;
}

impl Truncate for File {
    fn current_len(&self) -> std::io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

/// Write one record line. A failed write is cut back off the file so a
/// fragment never prefixes the next record.
fn append_line<F: Write + Truncate>(file: &mut F, line: &[u8]) -> std::io::Result<()> {
    let len = file.current_len()?;
    if let Err(e) = file.write_all(line).and_then(|()| file.flush()) {
        if let Err(truncate_err) = file.truncate_to(len) {
            error!(len, error = %truncate_err, "Failed to roll back partial journal write");
        }
        return Err(e);
    }
    Ok(())
}

impl LedgerJournal for JsonlJournal {
    fn record(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(|e| {
            warn!("JsonlJournal lock poisoned, recovering");
            e.into_inner()
        });
        append_line(&mut *file, &line)?;
        Ok(())
    }

    fn load(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: LedgerEntry =
                serde_json::from_str(&line).map_err(|e| LedgerError::CorruptJournal {
                    line: index.saturating_add(1),
                    reason: e.to_string(),
                })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn flush(&self) -> LedgerResult<()> {
        let file = self.file.lock().unwrap_or_else(|e| {
            warn!("JsonlJournal lock poisoned, recovering");
            e.into_inner()
        });
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::{CapsuleUri, Telemetry};

    fn entry(utid: &str) -> LedgerEntry {
        let uri = CapsuleUri::parse("capsule://fusion/mhd64/solve").unwrap();
        LedgerEntry::from_telemetry(utid, &uri, &Telemetry::new())
    }

    #[test]
    fn test_memory_journal() {
        let journal = MemoryJournal::new();
        journal.record(&entry("a")).unwrap();
        journal.record(&entry("b")).unwrap();

        let loaded = journal.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].utid(), "b");
    }

    #[test]
    fn test_jsonl_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger").join("journal.jsonl");

        {
            let journal = JsonlJournal::open(&path).unwrap();
            journal.record(&entry("a")).unwrap();
            journal.record(&entry("b")).unwrap();
            journal.flush().unwrap();
        }

        let journal = JsonlJournal::open(&path).unwrap();
        journal.record(&entry("c")).unwrap();
        let utids: Vec<String> = journal
            .load()
            .unwrap()
            .iter()
            .map(|e| e.utid().to_string())
            .collect();
        assert_eq!(utids, ["a", "b", "c"]);
    }

    /// In-memory file that accepts `budget` bytes, then fails.
    struct ShortFile {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortFile {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.budget == 0 {
                return Err(std::io::Error::other("no space left on device"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget = self.budget.saturating_sub(n);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Truncate for ShortFile {
        fn current_len(&self) -> std::io::Result<u64> {
            Ok(u64::try_from(self.data.len()).unwrap())
        }

        fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
            self.data.truncate(usize::try_from(len).unwrap());
            Ok(())
        }
    }

    fn record_line(utid: &str) -> Vec<u8> {
        let mut line = serde_json::to_vec(&entry(utid)).unwrap();
        line.push(b'\n');
        line
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let first = record_line("a");
        let mut file = ShortFile {
            data: Vec::new(),
            budget: first.len().saturating_add(10),
        };

        append_line(&mut file, &first).unwrap();
        assert!(append_line(&mut file, &record_line("b")).is_err());
        assert_eq!(file.data, first);

        file.budget = usize::MAX;
        append_line(&mut file, &record_line("c")).unwrap();

        let text = String::from_utf8(file.data).unwrap();
        let utids: Vec<String> = text
            .lines()
            .map(|line| {
                serde_json::from_str::<LedgerEntry>(line)
                    .unwrap()
                    .utid()
                    .to_string()
            })
            .collect();
        assert_eq!(utids, ["a", "c"]);
    }

    #[test]
    fn test_jsonl_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let line = serde_json::to_string(&entry("a")).unwrap();
        std::fs::write(&path, format!("\n{line}\n\n")).unwrap();

        let journal = JsonlJournal::open(&path).unwrap();
        assert_eq!(journal.load().unwrap().len(), 1);
    }

    #[test]
    fn test_jsonl_reports_corrupt_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let line = serde_json::to_string(&entry("a")).unwrap();
        std::fs::write(&path, format!("{line}\nnot json\n")).unwrap();

        let journal = JsonlJournal::open(&path).unwrap();
        let err = journal.load().unwrap_err();
        assert!(matches!(err, LedgerError::CorruptJournal { line: 2, .. }));
    }
}
