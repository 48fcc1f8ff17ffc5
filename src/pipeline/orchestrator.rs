//! Per-file rename/embed state machine
//!
//! Each file goes READ_TAGS → [RECOGNIZE] → RECONCILE → [WRITE_TAGS] →
//! RENAME | TAG_ONLY → [EMBED_ARTWORK] → [EMBED_LYRICS] → DONE. A failing
//! read, tag write or rename ends the file as `Failed`; everything else
//! degrades to a warning. The orchestrator itself is immutable, so a batch can
//! be replayed by calling [`Orchestrator::process_batch`] again.

use super::rename;
use crate::config::{PipelineOptions, Settings};
use crate::error::{MusrenError, Result};
use crate::lookup::{
    AcoustIdRecognizer, ArtworkFetcher, LrcLib, LyricsFetcher, MusicBrainzClient, Recognizer,
    RemoteArtwork,
};
use crate::reconcile::reconcile;
use crate::tags::{LoftyTags, TagReader, TagWriter};
use crate::types::{FileTask, Outcome, RecognitionCandidate, ReconciledMetadata, TrackMetadata};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Drives files through the pipeline using pluggable collaborators
pub struct Orchestrator {
    options: PipelineOptions,
    reader: Box<dyn TagReader>,
    writer: Box<dyn TagWriter>,
    recognizer: Option<Box<dyn Recognizer>>,
    artwork: Option<Box<dyn ArtworkFetcher>>,
    lyrics: Option<Box<dyn LyricsFetcher>>,
}

/// What has happened to a file so far; turned into a [`FileTask`] at DONE
struct InProgress {
    path: PathBuf,
    original_tags: TrackMetadata,
    recognition_attempted: bool,
    recognition_result: Option<RecognitionCandidate>,
    reconciled: Option<ReconciledMetadata>,
    rename_ran: bool,
    renamed_to: Option<PathBuf>,
    artwork_embedded: bool,
    lyrics_embedded: bool,
    warnings: Vec<String>,
}

impl InProgress {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            original_tags: TrackMetadata::default(),
            recognition_attempted: false,
            recognition_result: None,
            reconciled: None,
            rename_ran: false,
            renamed_to: None,
            artwork_embedded: false,
            lyrics_embedded: false,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{}: {}", self.path.display(), message);
        self.warnings.push(message);
    }

    fn current_path(&self) -> &Path {
        self.renamed_to.as_deref().unwrap_or(&self.path)
    }

    /// Classify and freeze the record; the outcome is decided exactly once
    fn finish(self, failure: Option<MusrenError>, options: &PipelineOptions) -> FileTask {
        let (outcome, reason) = match failure {
            Some(e) => (Outcome::Failed, Some(e.summary_reason())),
            None if self.rename_ran => (Outcome::Renamed, None),
            None if options.enable_tagging => (Outcome::TaggedOnly, None),
            None => (Outcome::Skipped, None),
        };

        FileTask {
            path: self.path,
            original_tags: self.original_tags,
            recognition_attempted: self.recognition_attempted,
            recognition_result: self.recognition_result,
            reconciled: self.reconciled,
            renamed_to: self.renamed_to,
            artwork_embedded: self.artwork_embedded,
            lyrics_embedded: self.lyrics_embedded,
            outcome,
            reason,
            warnings: self.warnings,
        }
    }
}

impl Orchestrator {
    /// Orchestrator with tag access only; add remote collaborators with the
    /// `with_*` builders
    pub fn new(
        options: PipelineOptions,
        reader: Box<dyn TagReader>,
        writer: Box<dyn TagWriter>,
    ) -> Self {
        Self {
            options,
            reader,
            writer,
            recognizer: None,
            artwork: None,
            lyrics: None,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Box<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_artwork(mut self, fetcher: Box<dyn ArtworkFetcher>) -> Self {
        self.artwork = Some(fetcher);
        self
    }

    pub fn with_lyrics(mut self, fetcher: Box<dyn LyricsFetcher>) -> Self {
        self.lyrics = Some(fetcher);
        self
    }

    /// Build the real collaborators for every enabled feature
    pub fn from_settings(settings: &Settings) -> Self {
        let options = settings.pipeline.clone();
        let http_timeout = options.http_timeout();
        let mut orchestrator = Self::new(options, Box::new(LoftyTags), Box::new(LoftyTags));

        if orchestrator.options.enable_recognition {
            match &settings.acoustid_api_key {
                Some(key) => {
                    if !settings.capabilities.can_fingerprint() {
                        warn!("fpcalc was not found; recognition will fail for every file");
                    }
                    let fpcalc = settings.capabilities.fpcalc_command();
                    let recognizer = AcoustIdRecognizer::new(fpcalc, key.clone())
                        .with_musicbrainz(MusicBrainzClient::new(http_timeout));
                    orchestrator = orchestrator.with_recognizer(Box::new(recognizer));
                }
                None => warn!(
                    "Recognition needs an AcoustID API key (--api-key or ACOUSTID_API_KEY); continuing without it"
                ),
            }
        }
        if orchestrator.options.enable_artwork {
            let fetcher = RemoteArtwork::new(http_timeout);
            orchestrator = orchestrator.with_artwork(Box::new(fetcher));
        }
        if orchestrator.options.enable_lyrics {
            orchestrator = orchestrator.with_lyrics(Box::new(LrcLib::new(http_timeout)));
        }

        orchestrator
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Lazily process `paths` in order, one [`FileTask`] per path
    pub fn process_batch<'a, I>(&'a self, paths: I) -> impl Iterator<Item = FileTask> + 'a
    where
        I: IntoIterator + 'a,
        I::Item: AsRef<Path>,
        I::IntoIter: 'a,
    {
        paths.into_iter().map(move |path| self.process_file(path.as_ref()))
    }

    /// Run one file through every stage
    pub fn process_file(&self, path: &Path) -> FileTask {
        let mut record = InProgress::new(path);
        let failure = self.run_stages(&mut record).err();

        match &failure {
            Some(e) if e.is_recoverable() => {
                warn!("Failed {}: {}", path.display(), e.summary_reason())
            }
            Some(e) => error!("Failed {}: {}", path.display(), e),
            None => {}
        }

        let task = record.finish(failure, &self.options);
        debug!("{} -> {}", path.display(), task.outcome.label());
        task
    }

    fn run_stages(&self, record: &mut InProgress) -> Result<()> {
        let tags = self.reader.read_tags(&record.path)?;
        debug!("Read tags from {}: {:?}", record.path.display(), tags);
        record.original_tags = tags;

        let candidate = self.recognize(record);
        let reconciled = reconcile(
            &record.original_tags,
            candidate.as_ref(),
            &self.options.reconcile,
        );
        record.recognition_result = candidate;
        if reconciled.is_unresolved() {
            debug!("{}: artist and title unresolved", record.path.display());
        }
        record.reconciled = Some(reconciled.clone());

        if self.options.enable_tagging && reconciled.has_recognized_fields() {
            self.writer.write_tags(&record.path, &reconciled)?;
            info!("Tagged {}", record.path.display());
        }

        if self.options.enable_rename {
            if let Some((artist, title)) = reconciled.rename_identity() {
                let destination = rename::rename_file(
                    &record.path,
                    artist,
                    title,
                    self.options.collision_policy,
                )?;
                record.rename_ran = true;
                if destination != record.path {
                    info!("Renamed {} -> {}", record.path.display(), destination.display());
                    record.renamed_to = Some(destination);
                }
            }
        }

        self.embed_artwork(record, &reconciled);
        self.embed_lyrics(record, &reconciled);
        Ok(())
    }

    /// Recognition never fails the file; errors become warnings and no candidate
    fn recognize(&self, record: &mut InProgress) -> Option<RecognitionCandidate> {
        if !self.options.enable_recognition {
            return None;
        }
        let recognizer = self.recognizer.as_ref()?;

        let wanted = self.options.force_recognition
            || record
                .original_tags
                .lacks_identity(self.options.reconcile.empty_as_absent);
        if !wanted {
            debug!("{} already has artist/title, not recognizing", record.path.display());
            return None;
        }

        record.recognition_attempted = true;
        match recognizer.recognize(&record.path, self.options.recognition_timeout()) {
            Ok(Some(candidate)) => {
                debug!(
                    "{} matched by {} with confidence {:.2}",
                    record.path.display(),
                    recognizer.name(),
                    candidate.confidence_score
                );
                Some(candidate)
            }
            Ok(None) => {
                debug!("{}: no match from {}", record.path.display(), recognizer.name());
                None
            }
            Err(e) => {
                record.warn(format!("recognition failed: {}", e));
                None
            }
        }
    }

    fn embed_artwork(&self, record: &mut InProgress, metadata: &ReconciledMetadata) {
        if !self.options.enable_artwork {
            return;
        }
        let Some(fetcher) = &self.artwork else {
            return;
        };

        if !self.options.replace_artwork {
            match self.reader.has_front_cover(record.current_path()) {
                Ok(true) => {
                    debug!("{} already has a cover, keeping it", record.current_path().display());
                    return;
                }
                Ok(false) => {}
                Err(e) => {
                    record.warn(format!(
                        "could not check for an existing cover: {}",
                        e.summary_reason()
                    ));
                    return;
                }
            }
        }

        match fetcher.fetch_artwork(metadata) {
            Ok(Some(image)) => {
                let path = record.current_path().to_path_buf();
                match self.writer.embed_artwork(&path, &image) {
                    Ok(()) => {
                        info!("Embedded cover into {}", path.display());
                        record.artwork_embedded = true;
                    }
                    Err(e) => record.warn(format!("could not embed cover: {}", e.summary_reason())),
                }
            }
            Ok(None) => debug!("No cover found for {}", record.path.display()),
            Err(e) => record.warn(format!("cover lookup failed: {}", e)),
        }
    }

    fn embed_lyrics(&self, record: &mut InProgress, metadata: &ReconciledMetadata) {
        if !self.options.enable_lyrics {
            return;
        }
        let Some(fetcher) = &self.lyrics else {
            return;
        };

        let lrc = match fetcher.fetch_lyrics(metadata) {
            Ok(Some(lrc)) => lrc,
            Ok(None) => {
                debug!("No synced lyrics for {}", record.path.display());
                return;
            }
            Err(e) => {
                record.warn(format!("lyrics lookup failed: {}", e));
                return;
            }
        };

        let path = record.current_path().to_path_buf();
        match self.writer.embed_lyrics(&path, &lrc) {
            Ok(()) => {
                info!("Embedded lyrics into {}", path.display());
                record.lyrics_embedded = true;
            }
            Err(e) => record.warn(format!("could not embed lyrics: {}", e.summary_reason())),
        }

        if self.options.write_lrc_files {
            let sidecar = path.with_extension("lrc");
            match std::fs::write(&sidecar, &lrc) {
                Ok(()) => debug!("Wrote {}", sidecar.display()),
                Err(e) => record.warn(format!("could not write {}: {}", sidecar.display(), e)),
            }
        }
    }
}
