//! CLI argument parsing and configuration

use crate::reconcile::DEFAULT_ACCEPTANCE_THRESHOLD;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// musren - Rename and tag music files
///
/// Renames audio files to "Artist - Title" from their tags, optionally
/// recognizing untagged tracks with Chromaprint/AcoustID, and embeds album
/// covers and synchronized lyrics.
#[derive(Parser, Debug)]
#[command(name = "musren")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (file or directory)
    #[arg(value_name = "PATH", default_value = ".")]
    pub input: PathBuf,

    /// Recognize tracks without artist/title using acoustic fingerprints
    #[arg(short, long, default_value = "false")]
    pub recognition: bool,

    /// Fetch and embed album covers
    #[arg(short, long = "covers", default_value = "false")]
    pub covers: bool,

    /// Replace covers that files already have (by default they are kept)
    #[arg(long, default_value = "false")]
    pub replace_covers: bool,

    /// Fetch and embed synchronized lyrics
    #[arg(short, long, default_value = "false")]
    pub lyrics: bool,

    /// AcoustID API key
    #[arg(short = 'k', long, env = "ACOUSTID_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to the Chromaprint fpcalc binary (defaults to searching PATH)
    #[arg(long, value_name = "PATH")]
    pub fpcalc: Option<PathBuf>,

    /// Minimum recognition confidence (0.0 - 1.0) for using recognized values
    #[arg(long, value_name = "SCORE", default_value_t = DEFAULT_ACCEPTANCE_THRESHOLD)]
    pub threshold: f64,

    /// Replace existing tag values with recognized ones
    #[arg(long, default_value = "false")]
    pub override_existing: bool,

    /// Treat empty tag values as missing
    #[arg(long, default_value = "false")]
    pub empty_as_absent: bool,

    /// Recognize every file, even those that already have artist/title
    #[arg(long, default_value = "false")]
    pub force_recognition: bool,

    /// What to do when the target filename already exists
    #[arg(long, value_enum, default_value_t = CollisionArg::Suffix)]
    pub collision: CollisionArg,

    /// Do not rename files
    #[arg(long, default_value = "false")]
    pub no_rename: bool,

    /// Do not write recognized metadata back into the files
    #[arg(long, default_value = "false")]
    pub no_tags: bool,

    /// Also write lyrics next to each file as a .lrc file
    #[arg(long, default_value = "false")]
    pub lrc_files: bool,

    /// Recognition timeout in milliseconds (fingerprinting + lookup)
    #[arg(long, value_name = "MS", default_value = "30000")]
    pub timeout_ms: u64,

    /// Timeout for cover/lyrics requests in milliseconds
    #[arg(long, value_name = "MS", default_value = "10000")]
    pub http_timeout_ms: u64,

    /// Scan subdirectories recursively
    #[arg(short = 'R', long, default_value = "false")]
    pub recursive: bool,

    /// Write a JSON report of every processed file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Record renames to this JSON file so they can be undone
    #[arg(long, value_name = "FILE")]
    pub journal: Option<PathBuf>,

    /// Revert the renames recorded in a journal and exit
    #[arg(long, value_name = "FILE", conflicts_with = "journal")]
    pub undo: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - show files that would be processed without touching them
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

/// `--collision` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollisionArg {
    /// Leave the file alone and report it as failed
    Skip,
    /// Append " (1)", " (2)", ... until the name is free
    Suffix,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["musren"]).expect("defaults parse");
        assert_eq!(cli.input, PathBuf::from("."));
        assert_eq!(cli.collision, CollisionArg::Suffix);
        assert!(!cli.recognition && !cli.covers && !cli.lyrics);
        assert_eq!(cli.threshold, DEFAULT_ACCEPTANCE_THRESHOLD);
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["musren", "-rcl", "-vv", "--collision", "skip", "/music"])
            .expect("flags parse");
        assert!(cli.recognition && cli.covers && cli.lyrics);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.collision, CollisionArg::Skip);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_undo_conflicts_with_journal() {
        let result =
            Cli::try_parse_from(["musren", "--undo", "a.json", "--journal", "b.json"]);
        assert!(result.is_err());
    }
}
