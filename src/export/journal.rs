//! Rename journal and undo
//!
//! Every successful rename of a run is recorded as a `{from, to}` pair so the
//! run can be reverted later with `musren --undo <journal>`.

use super::json::{read_json, write_json_atomic, ExportMetadata, SCHEMA_VERSION};
use crate::error::Result;
use crate::types::FileTask;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenameJournal {
    pub version: String,
    pub metadata: ExportMetadata,
    pub renames: Vec<JournalEntry>,
}

/// Result of reverting a journal
#[derive(Debug, Default)]
pub struct UndoSummary {
    pub restored: usize,
    /// Entries left alone, with the reason
    pub skipped: Vec<(JournalEntry, String)>,
}

/// Renames performed in this run, in processing order
pub fn journal_entries(tasks: &[FileTask]) -> Vec<JournalEntry> {
    tasks
        .iter()
        .filter_map(|task| {
            let to = task.renamed_to.as_ref()?;
            (to != &task.path).then(|| JournalEntry {
                from: task.path.clone(),
                to: to.clone(),
            })
        })
        .collect()
}

pub fn write_journal(entries: Vec<JournalEntry>, output_path: &Path) -> Result<()> {
    let count = entries.len();
    let journal = RenameJournal {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata::now(),
        renames: entries,
    };
    write_json_atomic(&journal, output_path)?;
    info!("Recorded {} renames in {}", count, output_path.display());
    Ok(())
}

/// Move every journaled file back to its original name, newest first
///
/// Entries whose renamed file is gone, or whose original name is taken
/// again, are skipped rather than overwritten.
pub fn undo_journal(journal_path: &Path) -> Result<UndoSummary> {
    let journal: RenameJournal = read_json(journal_path)?;
    let mut summary = UndoSummary::default();

    for entry in journal.renames.into_iter().rev() {
        if !entry.to.exists() {
            warn!("Cannot restore {}: file no longer exists", entry.to.display());
            summary.skipped.push((entry, "renamed file no longer exists".to_string()));
            continue;
        }
        if entry.from.exists() {
            warn!("Cannot restore {}: original name is taken", entry.from.display());
            summary.skipped.push((entry, "original name is taken".to_string()));
            continue;
        }
        match std::fs::rename(&entry.to, &entry.from) {
            Ok(()) => {
                info!("Restored {} -> {}", entry.to.display(), entry.from.display());
                summary.restored += 1;
            }
            Err(e) => {
                warn!("Cannot restore {}: {}", entry.to.display(), e);
                summary.skipped.push((entry, e.to_string()));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_undo_restores_in_reverse_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("01.mp3");
        let b = dir.path().join("A - B.mp3");
        let c = dir.path().join("A - B (1).mp3");
        fs::write(&b, b"x").unwrap();
        fs::write(&c, b"y").unwrap();

        // 01.mp3 became "A - B.mp3", and a later file took "(1)"
        let journal_path = dir.path().join("journal.json");
        let entries = vec![
            JournalEntry { from: a.clone(), to: b.clone() },
            JournalEntry { from: dir.path().join("02.mp3"), to: c.clone() },
        ];
        write_journal(entries, &journal_path).unwrap();

        let summary = undo_journal(&journal_path).unwrap();
        assert_eq!(summary.restored, 2);
        assert!(summary.skipped.is_empty());
        assert_eq!(fs::read(&a).unwrap(), b"x");
        assert_eq!(fs::read(dir.path().join("02.mp3")).unwrap(), b"y");
    }

    #[test]
    fn test_undo_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("01.mp3");
        let to = dir.path().join("A - B.mp3");
        fs::write(&from, b"new file").unwrap();
        fs::write(&to, b"renamed").unwrap();

        let journal_path = dir.path().join("journal.json");
        let entry = JournalEntry {
            from: from.clone(),
            to: to.clone(),
        };
        write_journal(vec![entry], &journal_path).unwrap();

        let summary = undo_journal(&journal_path).unwrap();
        assert_eq!(summary.restored, 0);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(fs::read(&from).unwrap(), b"new file");
    }
}
