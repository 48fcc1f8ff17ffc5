//! Runtime configuration settings

use super::cli::{Cli, CollisionArg};
use crate::capabilities::Capabilities;
use crate::reconcile::ReconcileOptions;
use std::path::PathBuf;
use std::time::Duration;

/// How to handle a rename target that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail the file
    Skip,
    /// Append a numeric suffix until the name is free
    Suffix,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(arg: CollisionArg) -> Self {
        match arg {
            CollisionArg::Skip => CollisionPolicy::Skip,
            CollisionArg::Suffix => CollisionPolicy::Suffix,
        }
    }
}

/// Options consumed by the per-file pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub reconcile: ReconcileOptions,
    pub enable_recognition: bool,
    /// Recognize even files that already have artist/title
    pub force_recognition: bool,
    pub enable_tagging: bool,
    pub enable_rename: bool,
    pub enable_artwork: bool,
    /// Fetch a cover even for files that already carry one
    pub replace_artwork: bool,
    pub enable_lyrics: bool,
    /// Write a `.lrc` sidecar in addition to embedding lyrics
    pub write_lrc_files: bool,
    pub collision_policy: CollisionPolicy,
    pub recognition_timeout_ms: u64,
    pub http_timeout_ms: u64,
}

impl PipelineOptions {
    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_millis(self.recognition_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            reconcile: ReconcileOptions::default(),
            enable_recognition: false,
            force_recognition: false,
            enable_tagging: true,
            enable_rename: true,
            enable_artwork: false,
            replace_artwork: false,
            enable_lyrics: false,
            write_lrc_files: false,
            collision_policy: CollisionPolicy::Suffix,
            recognition_timeout_ms: 30_000,
            http_timeout_ms: 10_000,
        }
    }
}

/// Runtime settings for a musren run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Scan recursively
    pub recursive: bool,
    pub pipeline: PipelineOptions,
    /// Tools detected at startup
    pub capabilities: Capabilities,
    /// AcoustID API key
    pub acoustid_api_key: Option<String>,
    /// JSON report destination
    pub report_path: Option<PathBuf>,
    /// Rename journal destination
    pub journal_path: Option<PathBuf>,
    /// Show progress bars
    pub show_progress: bool,
    /// Dry run mode - show files without processing
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments and the startup capability probe
    pub fn from_cli(cli: &Cli, capabilities: Capabilities) -> Self {
        Self {
            input: cli.input.clone(),
            recursive: cli.recursive,
            pipeline: PipelineOptions {
                reconcile: ReconcileOptions {
                    acceptance_threshold: cli.threshold,
                    override_existing: cli.override_existing,
                    empty_as_absent: cli.empty_as_absent,
                },
                enable_recognition: cli.recognition,
                force_recognition: cli.force_recognition,
                enable_tagging: !cli.no_tags,
                enable_rename: !cli.no_rename,
                enable_artwork: cli.covers,
                replace_artwork: cli.replace_covers,
                enable_lyrics: cli.lyrics,
                write_lrc_files: cli.lrc_files,
                collision_policy: cli.collision.into(),
                recognition_timeout_ms: cli.timeout_ms,
                http_timeout_ms: cli.http_timeout_ms,
            },
            capabilities,
            acoustid_api_key: cli.api_key.clone().filter(|k| !k.trim().is_empty()),
            report_path: cli.report.clone(),
            journal_path: cli.journal.clone(),
            show_progress: !cli.quiet,
            dry_run: cli.dry_run,
        }
    }

    /// Check option values that clap cannot validate on its own
    pub fn validate(&self) -> crate::Result<()> {
        let threshold = self.pipeline.reconcile.acceptance_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(crate::MusrenError::ConfigError(format!(
                "--threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }
        if self.pipeline.recognition_timeout_ms == 0 {
            return Err(crate::MusrenError::ConfigError(
                "--timeout-ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            recursive: false,
            pipeline: PipelineOptions::default(),
            capabilities: Capabilities::default(),
            acoustid_api_key: None,
            report_path: None,
            journal_path: None,
            show_progress: true,
            dry_run: false,
        }
    }
}
