//! Integration tests for the musren pipeline
//!
//! These tests run the real pipeline on generated WAV files tagged with lofty.
//! Network features stay off; recognition is exercised through a fake.

use lofty::{Accessor, MimeType, Picture, PictureType, Probe, Tag, TagExt, TagType, TaggedFileExt};
use musren::config::{CollisionPolicy, Settings};
use musren::error::{FetchError, RecognitionError};
use musren::lookup::{ArtworkFetcher, Recognizer};
use musren::pipeline::{self, Orchestrator};
use musren::tags::{LoftyTags, TagReader};
use musren::types::CandidateSource;
use musren::{export, Outcome, Provenance, RecognitionCandidate, ReconciledMetadata};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Generate a short mono 16-bit sine WAV file
fn generate_sine_wav(path: &Path, frequency_hz: f32, duration_secs: f32) {
    use std::f32::consts::PI;

    let sample_rate = 8000;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let sample = (2.0 * PI * frequency_hz * t).sin() * 0.5;
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// Generate a WAV file carrying an ID3v2 artist/title
fn generate_tagged_wav(path: &Path, artist: &str, title: &str) {
    generate_sine_wav(path, 440.0, 0.25);
    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_artist(artist.to_string());
    tag.set_title(title.to_string());
    tag.save_to_path(path).expect("Failed to tag WAV");
}

/// Generate a tagged WAV that also carries a PNG front cover
fn generate_wav_with_cover(path: &Path, artist: &str, title: &str, png: &[u8]) {
    generate_sine_wav(path, 440.0, 0.25);
    let mut tag = Tag::new(TagType::Id3v2);
    tag.set_artist(artist.to_string());
    tag.set_title(title.to_string());
    tag.push_picture(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::Png),
        None,
        png.to_vec(),
    ));
    tag.save_to_path(path).expect("Failed to tag WAV");
}

fn create_test_settings(input: &Path) -> Settings {
    Settings {
        input: input.to_path_buf(),
        show_progress: false,
        ..Default::default()
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| !n.starts_with('.'))
        .collect();
    names.sort();
    names
}

/// Recognizes every file as the same track
struct FixedRecognizer;

impl Recognizer for FixedRecognizer {
    fn recognize(
        &self,
        _path: &Path,
        _timeout: Duration,
    ) -> Result<Option<RecognitionCandidate>, RecognitionError> {
        let mut candidate = RecognitionCandidate::new(0.87, CandidateSource::Fingerprint);
        candidate.artist = Some("Boards of Canada".to_string());
        candidate.title = Some("Roygbiv".to_string());
        candidate.album = Some("Music Has the Right to Children".to_string());
        candidate.track_number = Some(9);
        Ok(Some(candidate))
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Always offers the same JPEG
struct JpegArtwork;

impl ArtworkFetcher for JpegArtwork {
    fn fetch_artwork(
        &self,
        _metadata: &ReconciledMetadata,
    ) -> Result<Option<Vec<u8>>, FetchError> {
        Ok(Some(vec![0xFF, 0xD8, 0xFF, 0xE0, 9, 9, 9]))
    }
}

#[test]
fn test_pipeline_renames_tagged_files() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("track01.wav"), "Daft Punk", "Digital Love");
    generate_tagged_wav(&dir.path().join("track02.wav"), "AC/DC", "Thunderstruck");
    generate_sine_wav(&dir.path().join("untagged.wav"), 220.0, 0.25);

    let result = pipeline::run(&create_test_settings(dir.path())).expect("Pipeline failed");

    assert_eq!(result.total_files, 3);
    assert_eq!(result.summary.count(Outcome::Renamed), 2);
    assert_eq!(result.summary.count(Outcome::TaggedOnly), 1);
    assert!(!result.summary.has_failures());

    let names = file_names(dir.path());
    assert!(names.contains(&"Daft Punk - Digital Love.wav".to_string()), "{:?}", names);
    assert!(names.contains(&"untagged.wav".to_string()));
    #[cfg(not(windows))]
    assert!(names.contains(&"AC-DC - Thunderstruck.wav".to_string()), "{:?}", names);
}

#[test]
fn test_pipeline_corrupt_file_fails_alone() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("a.wav"), "Artist", "Song");
    fs::write(dir.path().join("b.flac"), b"this is not a flac file").unwrap();
    generate_tagged_wav(&dir.path().join("c.wav"), "Other", "Tune");

    let result = pipeline::run(&create_test_settings(dir.path())).expect("Pipeline failed");

    assert_eq!(result.summary.count(Outcome::Failed), 1);
    assert_eq!(result.summary.count(Outcome::Renamed), 2);
    let (failed_path, reason) = &result.summary.failures()[0];
    assert!(failed_path.ends_with("b.flac"));
    assert!(reason.contains("tag read failed"), "{}", reason);
    assert!(dir.path().join("b.flac").exists());
}

#[test]
fn test_pipeline_collision_suffix() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("01.wav"), "Artist", "Song");
    generate_tagged_wav(&dir.path().join("02.wav"), "Artist", "Song");

    let result = pipeline::run(&create_test_settings(dir.path())).expect("Pipeline failed");

    assert_eq!(result.summary.count(Outcome::Renamed), 2);
    assert_eq!(
        file_names(dir.path()),
        vec!["Artist - Song (1).wav".to_string(), "Artist - Song.wav".to_string()]
    );
}

#[test]
fn test_pipeline_collision_skip_fails_second_file() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("01.wav"), "Artist", "Song");
    generate_tagged_wav(&dir.path().join("02.wav"), "Artist", "Song");

    let mut settings = create_test_settings(dir.path());
    settings.pipeline.collision_policy = CollisionPolicy::Skip;
    let result = pipeline::run(&settings).expect("Pipeline failed");

    assert_eq!(result.summary.count(Outcome::Renamed), 1);
    assert_eq!(result.summary.count(Outcome::Failed), 1);
    assert!(dir.path().join("02.wav").exists());
}

#[test]
fn test_pipeline_writes_report_and_journal() {
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music");
    fs::create_dir(&music).unwrap();
    generate_tagged_wav(&music.join("01.wav"), "Air", "Alone in Kyoto");
    generate_sine_wav(&music.join("02.wav"), 330.0, 0.25);

    let mut settings = create_test_settings(&music);
    settings.report_path = Some(dir.path().join("report.json"));
    settings.journal_path = Some(dir.path().join("journal.json"));
    pipeline::run(&settings).expect("Pipeline failed");

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
    assert_eq!(report["summary"]["total"], 2);
    assert_eq!(report["summary"]["renamed"], 1);
    assert_eq!(report["files"][0]["outcome"], "Renamed");
    assert_eq!(report["files"][0]["metadata"]["artist"]["provenance"], "Original");
    assert_eq!(report["files"][1]["outcome"], "TaggedOnly");

    let journal: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("journal.json")).unwrap())
            .unwrap();
    assert_eq!(journal["renames"].as_array().unwrap().len(), 1);

    let undo = export::undo_journal(&dir.path().join("journal.json")).unwrap();
    assert_eq!(undo.restored, 1);
    assert!(music.join("01.wav").exists());
    assert!(!music.join("Air - Alone in Kyoto.wav").exists());
}

#[test]
fn test_recognized_metadata_is_written_then_renamed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unknown.wav");
    generate_sine_wav(&path, 440.0, 0.5);

    let mut settings = create_test_settings(dir.path());
    settings.pipeline.enable_recognition = true;
    let orchestrator = Orchestrator::new(
        settings.pipeline.clone(),
        Box::new(LoftyTags),
        Box::new(LoftyTags),
    )
    .with_recognizer(Box::new(FixedRecognizer));

    let task = orchestrator.process_file(&path);

    assert_eq!(task.outcome, Outcome::Renamed);
    let renamed = PathBuf::from(task.final_path());
    assert_eq!(renamed, dir.path().join("Boards of Canada - Roygbiv.wav"));
    let reconciled = task.reconciled.as_ref().unwrap();
    assert_eq!(reconciled.album.provenance, Provenance::Recognized);

    // Tags were written into the file before it moved
    let tags = LoftyTags.read_tags(&renamed).unwrap();
    assert_eq!(tags.artist.as_deref(), Some("Boards of Canada"));
    assert_eq!(tags.title.as_deref(), Some("Roygbiv"));
    assert_eq!(tags.track_number, Some(9));

    let tagged_file = Probe::open(&renamed).unwrap().read().unwrap();
    assert!(tagged_file.primary_tag().is_some());

    // No temp files left behind
    assert_eq!(file_names(dir.path()), vec!["Boards of Canada - Roygbiv.wav".to_string()]);
    assert!(!fs::read_dir(dir.path())
        .unwrap()
        .any(|e| e.unwrap().file_name().to_string_lossy().starts_with(".musren-")));
}

#[test]
fn test_placeholder_tags_are_not_used_for_renaming() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("01.wav"), "Unknown Artist", "Unknown Title");
    generate_tagged_wav(&dir.path().join("02.wav"), "Unknown Artist", "Unknown Title");

    let result = pipeline::run(&create_test_settings(dir.path())).expect("Pipeline failed");

    assert_eq!(result.summary.count(Outcome::Renamed), 0);
    assert_eq!(result.summary.count(Outcome::TaggedOnly), 2);
    assert_eq!(file_names(dir.path()), vec!["01.wav".to_string(), "02.wav".to_string()]);
}

#[test]
fn test_existing_cover_is_not_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("Moby - Porcelain.wav");
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&[7u8; 200]);
    generate_wav_with_cover(&path, "Moby", "Porcelain", &png);

    let mut settings = create_test_settings(dir.path());
    settings.pipeline.enable_artwork = true;
    let orchestrator = Orchestrator::new(
        settings.pipeline.clone(),
        Box::new(LoftyTags),
        Box::new(LoftyTags),
    )
    .with_artwork(Box::new(JpegArtwork));

    let task = orchestrator.process_file(&path);

    assert_eq!(task.outcome, Outcome::Renamed);
    assert!(!task.artwork_embedded);
    assert!(LoftyTags.has_front_cover(&path).unwrap());

    let tagged_file = Probe::open(&path).unwrap().read().unwrap();
    let pictures = tagged_file.primary_tag().unwrap().pictures();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].data(), png.as_slice());
}

#[test]
fn test_pipeline_dry_run_touches_nothing() {
    let dir = TempDir::new().unwrap();
    generate_tagged_wav(&dir.path().join("01.wav"), "Artist", "Song");

    let mut settings = create_test_settings(dir.path());
    settings.dry_run = true;
    let result = pipeline::run(&settings).expect("Pipeline failed");

    assert!(result.dry_run);
    assert_eq!(result.total_files, 1);
    assert_eq!(file_names(dir.path()), vec!["01.wav".to_string()]);
}

#[test]
fn test_pipeline_handles_empty_directory() {
    let dir = TempDir::new().unwrap();
    let result = pipeline::run(&create_test_settings(dir.path())).expect("Pipeline failed");
    assert_eq!(result.total_files, 0);
    assert_eq!(result.summary.total(), 0);
}

#[test]
fn test_handles_nonexistent_input_gracefully() {
    let settings = create_test_settings(Path::new("/definitely/not/a/real/music/dir"));
    assert!(pipeline::run(&settings).is_err());
}
