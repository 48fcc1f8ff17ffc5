//! musren - Music library renamer and tagger
//!
//! A command-line utility that identifies audio files from their tags or an
//! acoustic fingerprint, reconciles the two sources field by field, renames
//! files to `Artist - Title.ext`, and optionally embeds cover art and synced
//! lyrics.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `capabilities`: Startup probe for external tools (fpcalc)
//! - `discovery`: File scanning
//! - `tags`: Tag reading and atomic tag writing via lofty
//! - `lookup`: AcoustID, MusicBrainz, cover art and lyrics services
//! - `reconcile`: Pure field-by-field metadata merge
//! - `pipeline`: Per-file state machine and batch orchestration
//! - `export`: JSON report and rename journal
//!
//! # Example
//!
//! ```no_run
//! use musren::{config::Settings, pipeline};
//!
//! let settings = Settings::default();
//! let result = pipeline::run(&settings).expect("Run failed");
//! println!("Processed {} files", result.total_files);
//! ```

pub mod capabilities;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod lookup;
pub mod pipeline;
pub mod reconcile;
pub mod tags;
pub mod types;

// Re-export key types at crate root
pub use error::{MusrenError, Result};
pub use reconcile::{reconcile, ReconcileOptions};
pub use types::{
    FileTask, Outcome, Provenance, RecognitionCandidate, ReconciledMetadata, TrackMetadata,
};
