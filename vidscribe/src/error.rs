use std::path::PathBuf;

/// All errors that can occur in vidscribe.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported media type: {0} — accepted: wav, mp3, mp4, mov")]
    UnsupportedMedia(String),

    #[cfg(feature = "download")]
    #[error("acquisition error: {0}")]
    Acquisition(String),

    #[cfg(feature = "download")]
    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("audio file not found: {path}")]
    AudioNotFound { path: PathBuf },

    #[error("no audio track in {path}")]
    NoAudioTrack { path: PathBuf },

    #[error("unsupported language: \"{0}\" — use Language::supported() to list valid codes")]
    UnsupportedLanguage(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("model error: {0}")]
    Model(String),

    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("store error: {0}")]
    Store(#[from] sled::Error),

    #[error("a transcript for \"{0}\" already exists")]
    DuplicateIdentity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let e = Error::InvalidInput("not a URL".into());
        assert_eq!(e.to_string(), "invalid input: not a URL");
    }

    #[test]
    fn test_error_display_unsupported_media() {
        let e = Error::UnsupportedMedia("image/png".into());
        let msg = e.to_string();
        assert!(msg.contains("image/png"));
        assert!(msg.contains("mp4"));
    }

    #[test]
    fn test_error_display_no_audio_track() {
        let e = Error::NoAudioTrack {
            path: PathBuf::from("/tmp/silent.mp4"),
        };
        assert!(e.to_string().contains("/tmp/silent.mp4"));
    }

    #[test]
    fn test_error_display_duplicate_identity() {
        let e = Error::DuplicateIdentity("abc123".into());
        assert!(e.to_string().contains("abc123"));
    }

    #[test]
    fn test_error_display_audio_not_found() {
        let e = Error::AudioNotFound {
            path: PathBuf::from("/tmp/audio.wav"),
        };
        assert!(e.to_string().contains("/tmp/audio.wav"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<String>("invalid json").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Json(_)));
    }
}
