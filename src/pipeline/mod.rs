//! Pipeline orchestration
//!
//! Coordinates file discovery, per-file processing and the JSON outputs.
//! Files are processed one at a time, in discovery order.

pub mod orchestrator;
pub mod rename;

pub use orchestrator::Orchestrator;

use crate::config::Settings;
use crate::discovery::{self, DiscoveredFile};
use crate::error::Result;
use crate::export;
use crate::types::{FileTask, Outcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Append-only tally of processed files
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    renamed: usize,
    tagged_only: usize,
    skipped: usize,
    failed: usize,
    failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn record(&mut self, task: &FileTask) {
        match task.outcome {
            Outcome::Renamed => self.renamed += 1,
            Outcome::TaggedOnly => self.tagged_only += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => {
                self.failed += 1;
                let reason = task.reason.clone().unwrap_or_else(|| "unknown error".to_string());
                self.failures.push((task.path.clone(), reason));
            }
        }
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Renamed => self.renamed,
            Outcome::TaggedOnly => self.tagged_only,
            Outcome::Skipped => self.skipped,
            Outcome::Failed => self.failed,
        }
    }

    pub fn total(&self) -> usize {
        self.renamed + self.tagged_only + self.skipped + self.failed
    }

    /// Failed files with their reasons, in processing order
    pub fn failures(&self) -> &[(PathBuf, String)] {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Pipeline result summary
#[derive(Debug)]
pub struct PipelineResult {
    pub total_files: usize,
    pub summary: BatchSummary,
    /// Nothing was touched
    pub dry_run: bool,
}

/// Run the full rename pipeline
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    info!("Scanning for audio files...");
    let files = discovery::scan(&settings.input, settings.recursive)?;
    info!("Found {} audio files", files.len());

    if files.is_empty() {
        return Ok(PipelineResult {
            total_files: 0,
            summary: BatchSummary::default(),
            dry_run: settings.dry_run,
        });
    }

    if settings.dry_run {
        return Ok(run_dry_run(&files, settings));
    }

    let orchestrator = Orchestrator::from_settings(settings);

    let progress_bar = if settings.show_progress {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut summary = BatchSummary::default();
    let mut tasks = Vec::with_capacity(files.len());
    for task in orchestrator.process_batch(files.iter().map(|f| &f.path)) {
        summary.record(&task);
        if let Some(ref pb) = progress_bar {
            pb.inc(1);
            pb.set_message(
                task.final_path()
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .into_owned(),
            );
        }
        tasks.push(task);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Done");
    }

    if let Some(report_path) = &settings.report_path {
        export::write_report(&tasks, &summary, report_path)?;
    }
    if let Some(journal_path) = &settings.journal_path {
        export::write_journal(export::journal_entries(&tasks), journal_path)?;
    }

    info!(
        "Processed {} files in {:.2}s",
        tasks.len(),
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(PipelineResult {
        total_files: files.len(),
        summary,
        dry_run: false,
    })
}

/// Dry run mode - list the files that would be processed
fn run_dry_run(files: &[DiscoveredFile], settings: &Settings) -> PipelineResult {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let mut by_directory: HashMap<PathBuf, Vec<&DiscoveredFile>> = HashMap::new();
    for file in files {
        let dir = file.path.parent().unwrap_or(&file.path).to_path_buf();
        by_directory.entry(dir).or_default().push(file);
    }
    let mut directories: Vec<_> = by_directory.keys().cloned().collect();
    directories.sort();

    let mut by_format: HashMap<String, usize> = HashMap::new();
    for file in files {
        let format = format!("{:?}", file.format).to_uppercase();
        *by_format.entry(format).or_default() += 1;
    }
    let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();

    for dir in &directories {
        let dir_files = &by_directory[dir];
        println!("{}/ ({} files)", dir.display(), dir_files.len());
        for file in dir_files {
            let filename = file.path.file_name().and_then(|n| n.to_str()).unwrap_or("?");
            println!("  {}", filename);
        }
        println!();
    }

    println!("─────────────────────────────────────────");
    println!();
    println!(
        "Would process {} files ({:.1} MB):",
        files.len(),
        total_bytes as f64 / (1024.0 * 1024.0)
    );

    let mut formats: Vec<_> = by_format.iter().collect();
    formats.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (format, count) in formats {
        println!("  {} {} files", count, format);
    }
    println!();

    let options = &settings.pipeline;
    let enabled = |on: bool| if on { "on" } else { "off" };
    println!("Recognition: {}", enabled(options.enable_recognition));
    println!("Covers:      {}", enabled(options.enable_artwork));
    println!("Lyrics:      {}", enabled(options.enable_lyrics));
    println!("Renaming:    {}", enabled(options.enable_rename));
    println!();

    PipelineResult {
        total_files: files.len(),
        summary: BatchSummary::default(),
        dry_run: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TrackMetadata;

    fn task(name: &str, outcome: Outcome) -> FileTask {
        FileTask {
            path: PathBuf::from(name),
            original_tags: TrackMetadata::default(),
            recognition_attempted: false,
            recognition_result: None,
            reconciled: None,
            renamed_to: None,
            artwork_embedded: false,
            lyrics_embedded: false,
            outcome,
            reason: (outcome == Outcome::Failed).then(|| "rename failed: denied".to_string()),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts_and_failures() {
        let mut summary = BatchSummary::default();
        for (name, outcome) in [
            ("a", Outcome::Renamed),
            ("b", Outcome::Failed),
            ("c", Outcome::Renamed),
            ("d", Outcome::Skipped),
        ] {
            summary.record(&task(name, outcome));
        }

        assert_eq!(summary.total(), 4);
        assert_eq!(summary.count(Outcome::Renamed), 2);
        assert_eq!(summary.count(Outcome::TaggedOnly), 0);
        assert!(summary.has_failures());
        assert_eq!(
            summary.failures(),
            &[(PathBuf::from("b"), "rename failed: denied".to_string())]
        );
    }
}
