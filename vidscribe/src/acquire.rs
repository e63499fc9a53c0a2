//! Source acquisition: remote downloads via yt-dlp, verbatim ingest of local
//! uploads, and audio demux via ffmpeg.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
#[cfg(feature = "download")]
use crate::identity::{ContentIdentity, TransientToken};

/// Media types the pipeline accepts for local uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    WavAudio,
    MpegAudio,
    Mp4Video,
    MovVideo,
}

impl MediaKind {
    /// Resolve from a declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "audio/wav" | "audio/x-wav" => Some(MediaKind::WavAudio),
            "audio/mpeg" => Some(MediaKind::MpegAudio),
            "video/mp4" => Some(MediaKind::Mp4Video),
            "video/mov" | "video/quicktime" => Some(MediaKind::MovVideo),
            _ => None,
        }
    }

    /// Resolve from a file extension when no MIME type was declared.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "wav" => Some(MediaKind::WavAudio),
            "mp3" => Some(MediaKind::MpegAudio),
            "mp4" => Some(MediaKind::Mp4Video),
            "mov" => Some(MediaKind::MovVideo),
            _ => None,
        }
    }

    /// Whether the audio track needs to be demuxed out first.
    pub fn is_video(self) -> bool {
        matches!(self, MediaKind::Mp4Video | MediaKind::MovVideo)
    }
}

/// An uploaded file: original name, declared MIME type (if any), raw bytes.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Classify the upload. The declared MIME type wins; the file extension
    /// is the fallback. Anything else is rejected before any bytes touch
    /// disk.
    pub fn kind(&self) -> Result<MediaKind> {
        if let Some(mime) = &self.mime {
            return MediaKind::from_mime(mime).ok_or_else(|| Error::UnsupportedMedia(mime.clone()));
        }
        MediaKind::from_extension(Path::new(&self.file_name))
            .ok_or_else(|| Error::UnsupportedMedia(self.file_name.clone()))
    }
}

/// Provider metadata plus the downloaded audio for a remote source.
#[cfg(feature = "download")]
#[derive(Debug)]
pub struct RemoteSource {
    pub identity: ContentIdentity,
    pub title: String,
    pub duration: Option<f64>,
    pub audio_path: PathBuf,
}

#[cfg(feature = "download")]
#[derive(serde::Deserialize)]
struct ProviderInfo {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
fn validate_url(url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "invalid URL (must start with http:// or https://): {trimmed}"
        )))
    }
}

#[cfg(feature = "download")]
fn truncated_stderr(stderr: &[u8]) -> String {
    // Keep error messages readable, yt-dlp can dump pages of stderr
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}

/// Download the best available audio for `url` into `work_dir` as a WAV
/// named by `token`, and return it together with the provider metadata.
///
/// The provider's content id is mandatory — without it there is nothing to
/// key the transcript cache on. A missing title falls back to the id.
///
/// # Security
/// - URL is validated to start with http:// or https://
/// - Arguments are passed to yt-dlp via `.arg()` (no shell expansion)
/// - `--no-exec` prevents yt-dlp from running post-processing commands
#[cfg(feature = "download")]
pub async fn fetch_remote(
    url: &str,
    token: &TransientToken,
    work_dir: &Path,
) -> Result<RemoteSource> {
    validate_url(url)?;

    let check = tokio::process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await;
    if check.is_err() {
        return Err(Error::YtDlpNotFound);
    }

    std::fs::create_dir_all(work_dir)?;

    info!(%url, "probing source metadata");
    let probe = tokio::process::Command::new("yt-dlp")
        .args(["--dump-json", "--no-download", "--no-playlist", "--no-exec"])
        .arg(url)
        .output()
        .await?;

    if !probe.status.success() {
        return Err(Error::Acquisition(format!(
            "yt-dlp metadata probe failed: {}",
            truncated_stderr(&probe.stderr)
        )));
    }

    let provider: ProviderInfo = serde_json::from_slice(&probe.stdout)
        .map_err(|e| Error::Acquisition(format!("unreadable provider metadata: {e}")))?;
    let identity = ContentIdentity::new(
        provider
            .id
            .ok_or_else(|| Error::Acquisition("provider metadata has no content id".into()))?,
    );
    let title = provider
        .title
        .unwrap_or_else(|| identity.as_str().to_string());

    let output_template = work_dir
        .join(token.file_name("%(ext)s"))
        .to_str()
        .ok_or_else(|| Error::Acquisition("work directory path contains invalid UTF-8".into()))?
        .to_string();

    info!(identity = %identity, token = %token, "downloading audio");
    let output = tokio::process::Command::new("yt-dlp")
        .args([
            "--extract-audio",
            "--audio-format",
            "wav",
            "--audio-quality",
            "0",
            "--no-playlist",
            "--no-exec",
            "--output",
        ])
        .arg(&output_template)
        .arg(url)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Acquisition(format!(
            "yt-dlp failed: {}",
            truncated_stderr(&output.stderr)
        )));
    }

    // The output template pins the final name: <token>.wav inside work_dir
    let audio_path = work_dir.join(token.file_name("wav"));
    if !audio_path.exists() {
        return Err(Error::Acquisition(format!(
            "downloaded audio not found at {}",
            audio_path.display()
        )));
    }

    Ok(RemoteSource {
        identity,
        title,
        duration: provider.duration,
        audio_path,
    })
}

/// Persist an upload verbatim into `work_dir`, named after the upload's
/// original filename (final path component only — the upload names the file,
/// it does not pick the directory). An existing file of the same name is
/// overwritten; cross-upload filename collisions are an accepted limitation.
pub fn ingest_local(upload: &Upload, work_dir: &Path) -> Result<PathBuf> {
    let name = Path::new(&upload.file_name)
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("unusable file name: {}", upload.file_name)))?;

    std::fs::create_dir_all(work_dir)?;
    let path = work_dir.join(name);
    std::fs::write(&path, &upload.bytes)?;

    info!(path = %path.display(), bytes = upload.bytes.len(), "stored upload");
    Ok(path)
}

/// Demux the audio track of a video container into a sibling WAV.
///
/// Returns `None` when the container has no audio stream — never a
/// zero-length or garbage file. The input video is deleted in every outcome,
/// including errors: its audio has either been extracted or is not there.
pub fn extract_audio(video_path: &Path) -> Result<Option<PathBuf>> {
    let _cleanup = TempFileGuard(video_path.to_path_buf());

    if !has_audio_stream(video_path)? {
        info!(path = %video_path.display(), "video has no audio track");
        return Ok(None);
    }

    let audio_path = video_path.with_extension("wav");
    info!(from = %video_path.display(), to = %audio_path.display(), "extracting audio track");

    let output = std::process::Command::new("ffmpeg")
        .args(["-nostdin", "-y", "-i"])
        .arg(video_path)
        .args(["-vn", "-acodec", "pcm_s16le", "-ac", "1"])
        .arg(&audio_path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AudioDecode("ffmpeg not found — install with: apt install ffmpeg".into())
            } else {
                Error::AudioDecode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::AudioDecode(format!("ffmpeg demux failed: {stderr}")));
    }

    Ok(Some(audio_path))
}

/// Probe a container for at least one audio stream.
fn has_audio_stream(path: &Path) -> Result<bool> {
    let output = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AudioDecode("ffprobe not found — it ships with ffmpeg".into())
            } else {
                Error::AudioDecode(format!("failed to run ffprobe: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::AudioDecode(format!("ffprobe failed: {stderr}")));
    }

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

/// RAII guard that removes a file when dropped, on every exit path.
pub(crate) struct TempFileGuard(pub(crate) PathBuf);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_file(&self.0) {
                warn!(path = %self.0.display(), error = %e, "failed to remove temp file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_https() {
        assert!(validate_url("https://youtube.com/watch?v=abc").is_ok());
    }

    #[test]
    fn test_validate_url_http() {
        assert!(validate_url("http://example.com/video.mp4").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_no_scheme() {
        assert!(validate_url("youtube.com/watch?v=abc").is_err());
    }

    #[test]
    fn test_validate_url_rejects_file_scheme() {
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_validate_url_rejects_empty() {
        assert!(validate_url("").is_err());
    }

    #[test]
    fn test_validate_url_rejects_command() {
        assert!(validate_url("$(whoami)").is_err());
    }

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("audio/wav"), Some(MediaKind::WavAudio));
        assert_eq!(
            MediaKind::from_mime("audio/x-wav"),
            Some(MediaKind::WavAudio)
        );
        assert_eq!(
            MediaKind::from_mime("audio/mpeg"),
            Some(MediaKind::MpegAudio)
        );
        assert_eq!(MediaKind::from_mime("video/mp4"), Some(MediaKind::Mp4Video));
        assert_eq!(
            MediaKind::from_mime("video/quicktime"),
            Some(MediaKind::MovVideo)
        );
        assert_eq!(MediaKind::from_mime("image/png"), None);
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(
            MediaKind::from_extension(Path::new("talk.mp4")),
            Some(MediaKind::Mp4Video)
        );
        assert_eq!(
            MediaKind::from_extension(Path::new("talk.mp3")),
            Some(MediaKind::MpegAudio)
        );
        assert_eq!(MediaKind::from_extension(Path::new("talk.pdf")), None);
        assert_eq!(MediaKind::from_extension(Path::new("no_extension")), None);
    }

    #[test]
    fn test_upload_kind_prefers_declared_mime() {
        let upload = Upload {
            file_name: "talk.mp4".into(),
            mime: Some("audio/wav".into()),
            bytes: Vec::new(),
        };
        assert_eq!(upload.kind().unwrap(), MediaKind::WavAudio);
    }

    #[test]
    fn test_upload_kind_rejects_unsupported() {
        let upload = Upload {
            file_name: "notes.txt".into(),
            mime: None,
            bytes: Vec::new(),
        };
        assert!(matches!(
            upload.kind(),
            Err(Error::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn test_ingest_local_writes_bytes_verbatim() {
        let tmp = tempfile::TempDir::new().unwrap();
        let upload = Upload {
            file_name: "clip.wav".into(),
            mime: None,
            bytes: vec![1, 2, 3, 4],
        };
        let path = ingest_local(&upload, tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("clip.wav"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_ingest_local_overwrites_same_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let first = Upload {
            file_name: "clip.wav".into(),
            mime: None,
            bytes: b"first".to_vec(),
        };
        let second = Upload {
            file_name: "clip.wav".into(),
            mime: None,
            bytes: b"second".to_vec(),
        };
        ingest_local(&first, tmp.path()).unwrap();
        let path = ingest_local(&second, tmp.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_ingest_local_strips_directory_components() {
        let tmp = tempfile::TempDir::new().unwrap();
        let upload = Upload {
            file_name: "../escape.wav".into(),
            mime: None,
            bytes: b"audio".to_vec(),
        };
        let path = ingest_local(&upload, tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("escape.wav"));
    }

    #[test]
    fn test_temp_file_guard_removes_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("scratch.wav");
        std::fs::write(&path, b"audio").unwrap();
        {
            let _guard = TempFileGuard(path.clone());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_guard_tolerates_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let _guard = TempFileGuard(tmp.path().join("never_created.wav"));
    }
}
