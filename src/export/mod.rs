//! JSON outputs: the run report and the rename journal

pub mod journal;
pub mod json;
pub mod report;

pub use journal::{journal_entries, undo_journal, write_journal, JournalEntry, UndoSummary};
pub use report::write_report;
