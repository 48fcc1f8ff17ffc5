//! Remote lookups: fingerprint recognition, cover art and lyrics
//!
//! Every backend sits behind a trait from [`traits`] so the pipeline can run
//! against fakes. Failures here are never fatal to a file.

pub mod acoustid;
pub mod artwork;
pub mod fingerprint;
pub mod http;
pub mod lyrics;
pub mod musicbrainz;
pub mod traits;

pub use acoustid::AcoustIdRecognizer;
pub use artwork::RemoteArtwork;
pub use lyrics::LrcLib;
pub use musicbrainz::MusicBrainzClient;
pub use traits::{ArtworkFetcher, LyricsFetcher, Recognizer};
