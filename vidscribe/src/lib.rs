//! Video transcript pipeline — URL or upload in, cached transcript with
//! CSV/TXT artifacts out.
//!
//! **vidscribe** handles the full flow: acquisition (yt-dlp for URLs,
//! verbatim ingest for uploads), audio demux and decoding (ffmpeg),
//! transcription (whisper.cpp), an embedded transcript cache keyed by the
//! provider's content id (sled), and CSV/plain-text artifact generation.
//!
//! Remote sources are transcribed at most once: a second run for the same
//! content id serves the stored transcript without touching the model.
//! Local uploads carry no durable identity and are always transcribed fresh.
//!
//! # Quick start
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> vidscribe::Result<()> {
//! let store = vidscribe::TranscriptStore::open("transcripts.db")?;
//! let pipeline = vidscribe::Pipeline::new(store, vidscribe::PipelineOptions::default());
//!
//! let run = pipeline.run_url("https://youtube.com/watch?v=abc123").await?;
//! std::fs::write(format!("{}.csv", run.title), &run.artifacts.csv)?;
//! println!("{}", run.artifacts.text);
//! # Ok(())
//! # }
//! ```

pub mod acquire;
pub mod artifact;
pub(crate) mod audio;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod store;
pub(crate) mod transcribe;
pub mod types;

pub use acquire::{MediaKind, Upload};
pub use artifact::Artifacts;
pub use config::{Language, Model, PipelineOptions};
pub use error::{Error, Result};
pub use identity::{ContentIdentity, TransientToken};
pub use store::TranscriptStore;
pub use types::{Segment, TimedLine, Transcript, TranscriptRecord};

use std::path::Path;

use tracing::{debug, info};

use crate::acquire::TempFileGuard;

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// Human-readable title: the provider title for remote sources, the
    /// upload's file stem for local ones.
    pub title: String,
    /// Cache key; `None` for local uploads, which are never deduplicated.
    pub identity: Option<ContentIdentity>,
    pub artifacts: Artifacts,
    /// Whether the transcript came from the store instead of the model.
    pub cache_hit: bool,
}

/// The transcript pipeline: acquisition, cache gate, transcription, storage,
/// artifact generation.
///
/// Owns its store handle and options — construct one at process start and
/// invoke it once per user action. Nothing here memoizes behind the caller's
/// back; every side effect (temp file removal included) is on an explicit
/// path.
pub struct Pipeline {
    store: TranscriptStore,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(store: TranscriptStore, options: PipelineOptions) -> Self {
        Self { store, options }
    }

    /// The underlying store, for read-only inspection.
    pub fn store(&self) -> &TranscriptStore {
        &self.store
    }

    /// Run the pipeline for a remote video URL.
    ///
    /// At most one transcription ever happens per content identity: a store
    /// hit short-circuits straight to artifact generation. The downloaded
    /// audio file is removed on every exit path — hit, miss, and error alike.
    #[cfg(feature = "download")]
    pub async fn run_url(&self, url: &str) -> Result<PipelineRun> {
        let work_dir = self.options.resolve_work_dir();
        let token = TransientToken::new();

        let source = acquire::fetch_remote(url, &token, &work_dir).await?;
        let _audio_cleanup = TempFileGuard(source.audio_path.clone());

        if let Some(run) = self.cached_run(&source.identity)? {
            return Ok(run);
        }

        let transcript = self.transcribe_path(&source.audio_path).await?;
        let record = self.persist(source.identity, source.title, &transcript)?;

        Ok(PipelineRun {
            title: record.title.clone(),
            identity: Some(record.identity.clone()),
            artifacts: artifact::build(&record.lines),
            cache_hit: false,
        })
    }

    /// Run the pipeline for a local upload.
    ///
    /// Uploads carry no durable identity, so the store is never consulted or
    /// populated: two identical uploads are transcribed independently. Video
    /// containers have their audio track demuxed first and the stored source
    /// video deleted; the intermediate audio is removed on every exit path.
    pub async fn run_local(&self, upload: &Upload) -> Result<PipelineRun> {
        let kind = upload.kind()?;
        let work_dir = self.options.resolve_work_dir();

        let saved = acquire::ingest_local(upload, &work_dir)?;
        let audio_path = if kind.is_video() {
            match acquire::extract_audio(&saved)? {
                Some(path) => path,
                None => return Err(Error::NoAudioTrack { path: saved }),
            }
        } else {
            saved
        };
        let _audio_cleanup = TempFileGuard(audio_path.clone());

        let transcript = self.transcribe_path(&audio_path).await?;

        let title = Path::new(&upload.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| upload.file_name.clone());

        Ok(PipelineRun {
            title,
            identity: None,
            artifacts: artifact::build(&transcript.to_lines()),
            cache_hit: false,
        })
    }

    /// Cache gate: serve a previously stored transcript if one exists for
    /// this identity. The caller drops its audio guard either way, so a hit
    /// means the fresh download is discarded untranscribed.
    fn cached_run(&self, identity: &ContentIdentity) -> Result<Option<PipelineRun>> {
        let Some(record) = self.store.find(identity)? else {
            return Ok(None);
        };

        info!(identity = %identity, "transcript cached, skipping transcription");
        Ok(Some(PipelineRun {
            title: record.title.clone(),
            identity: Some(record.identity.clone()),
            artifacts: artifact::build(&record.lines),
            cache_hit: true,
        }))
    }

    /// Decode and transcribe one audio file. Does not delete it — the caller
    /// owns the file's lifetime.
    async fn transcribe_path(&self, path: &Path) -> Result<Transcript> {
        let cache_dir = self.options.resolve_model_cache_dir();
        let model_path = model::ensure_model(&self.options.model, &cache_dir).await?;
        let samples = audio::load_audio(path)?;
        transcribe::transcribe_samples(&samples, &model_path, &self.options)
    }

    /// Persist a fresh transcript. If a concurrent run inserted the same
    /// identity first, honor the winner: return the stored record instead of
    /// failing the run.
    fn persist(
        &self,
        identity: ContentIdentity,
        title: String,
        transcript: &Transcript,
    ) -> Result<TranscriptRecord> {
        let record = TranscriptRecord::from_transcript(identity, title, transcript);
        match self.store.insert(&record) {
            Ok(()) => Ok(record),
            Err(Error::DuplicateIdentity(_)) => {
                debug!(identity = %record.identity, "lost insert race, using stored record");
                self.store.find(&record.identity)?.ok_or_else(|| {
                    Error::DuplicateIdentity(record.identity.as_str().to_string())
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline_with_temp_store(tmp: &tempfile::TempDir) -> Pipeline {
        let store = TranscriptStore::open(tmp.path().join("db")).unwrap();
        Pipeline::new(store, PipelineOptions::default())
    }

    fn sample_transcript() -> Transcript {
        Transcript {
            segments: vec![
                Segment {
                    start: 0.0,
                    end: 5.0,
                    text: "Hello ".into(),
                },
                Segment {
                    start: 5.0,
                    end: 8.0,
                    text: "world.".into(),
                },
            ],
            language: "en".into(),
            duration: 8.0,
            model: "base".into(),
        }
    }

    #[test]
    fn test_cached_run_miss() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = pipeline_with_temp_store(&tmp);
        let result = pipeline.cached_run(&ContentIdentity::new("abc123")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_cached_run_hit_serves_stored_record() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = pipeline_with_temp_store(&tmp);

        let identity = ContentIdentity::new("abc123");
        pipeline
            .persist(identity.clone(), "T".into(), &sample_transcript())
            .unwrap();

        let run = pipeline.cached_run(&identity).unwrap().unwrap();
        assert!(run.cache_hit);
        assert_eq!(run.title, "T");
        assert_eq!(run.identity, Some(identity));
        assert_eq!(
            run.artifacts.csv,
            b"start,text\n0:00:00,Hello \n0:00:05,world.\n"
        );
        assert_eq!(run.artifacts.text, "Hello world.");
    }

    #[test]
    fn test_persist_inserts_exactly_one_record() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = pipeline_with_temp_store(&tmp);

        let record = pipeline
            .persist(ContentIdentity::new("abc123"), "T".into(), &sample_transcript())
            .unwrap();

        assert_eq!(record.lines[0].start_secs, 0);
        assert_eq!(record.lines[0].text, "Hello ");
        assert_eq!(record.lines[1].start_secs, 5);
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_persist_race_falls_back_to_winner() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = pipeline_with_temp_store(&tmp);
        let identity = ContentIdentity::new("abc123");

        pipeline
            .persist(identity.clone(), "winner".into(), &sample_transcript())
            .unwrap();
        let record = pipeline
            .persist(identity, "loser".into(), &sample_transcript())
            .unwrap();

        assert_eq!(record.title, "winner");
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_run_local_rejects_unsupported_upload() {
        let tmp = tempfile::TempDir::new().unwrap();
        let pipeline = pipeline_with_temp_store(&tmp);
        let upload = Upload {
            file_name: "slides.pdf".into(),
            mime: None,
            bytes: vec![0u8; 16],
        };

        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let result = rt.block_on(pipeline.run_local(&upload));
        assert!(matches!(result, Err(Error::UnsupportedMedia(_))));
    }
}
