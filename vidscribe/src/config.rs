use std::fmt;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// A validated language for whisper transcription.
///
/// Wraps a language code verified against whisper.cpp's supported list.
/// Accepts both short codes ("en", "de") and full names ("english", "german").
#[derive(Debug, Clone, Default)]
pub enum Language {
    /// Auto-detect language from audio.
    #[default]
    Auto,
    /// A validated language code (e.g. "en", "de", "ja").
    Code {
        /// Short code as whisper expects it.
        code: String,
        /// Whisper internal language ID.
        id: i32,
    },
}

impl Language {
    /// Create a language from a code or full name, validating against
    /// whisper.cpp. Returns an error if the language is not supported.
    pub fn new(lang: &str) -> Result<Self> {
        let lower = lang.to_lowercase();
        if lower == "auto" {
            return Ok(Language::Auto);
        }

        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                // Normalize full names to the short code
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language::Code { code, id })
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }

    /// Get the short language code (e.g. "en"), or None for Auto.
    pub fn code(&self) -> Option<&str> {
        match self {
            Language::Auto => None,
            Language::Code { code, .. } => Some(code),
        }
    }

    /// List all supported languages as (code, full_name) pairs.
    pub fn supported() -> Vec<(&'static str, &'static str)> {
        let max = whisper_rs::get_lang_max_id();
        (0..=max)
            .filter_map(|id| {
                let code = whisper_rs::get_lang_str(id)?;
                let name = whisper_rs::get_lang_str_full(id)?;
                Some((code, name))
            })
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Auto => write!(f, "auto"),
            Language::Code { code, .. } => write!(f, "{code}"),
        }
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone)]
pub enum Model {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
    /// User-provided .ggml file path.
    Custom(PathBuf),
}

impl Model {
    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> String {
        match self {
            Model::Tiny => "ggml-tiny.bin".into(),
            Model::TinyEn => "ggml-tiny.en.bin".into(),
            Model::Base => "ggml-base.bin".into(),
            Model::BaseEn => "ggml-base.en.bin".into(),
            Model::Small => "ggml-small.bin".into(),
            Model::SmallEn => "ggml-small.en.bin".into(),
            Model::Medium => "ggml-medium.bin".into(),
            Model::MediumEn => "ggml-medium.en.bin".into(),
            Model::LargeV2 => "ggml-large-v2.bin".into(),
            Model::LargeV3 => "ggml-large-v3.bin".into(),
            Model::LargeV3Turbo => "ggml-large-v3-turbo.bin".into(),
            Model::Custom(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model".into()),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        match self {
            Model::Tiny => "tiny",
            Model::TinyEn => "tiny.en",
            Model::Base => "base",
            Model::BaseEn => "base.en",
            Model::Small => "small",
            Model::SmallEn => "small.en",
            Model::Medium => "medium",
            Model::MediumEn => "medium.en",
            Model::LargeV2 => "large-v2",
            Model::LargeV3 => "large-v3",
            Model::LargeV3Turbo => "large-v3-turbo",
            Model::Custom(_) => "custom",
        }
    }

    /// Parse from a model name (e.g. CLI argument).
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "tiny" => Some(Model::Tiny),
            "tiny.en" => Some(Model::TinyEn),
            "base" => Some(Model::Base),
            "base.en" => Some(Model::BaseEn),
            "small" => Some(Model::Small),
            "small.en" => Some(Model::SmallEn),
            "medium" => Some(Model::Medium),
            "medium.en" => Some(Model::MediumEn),
            "large-v2" => Some(Model::LargeV2),
            "large-v3" => Some(Model::LargeV3),
            "large-v3-turbo" => Some(Model::LargeV3Turbo),
            _ => None,
        }
    }
}

/// Options for a [`Pipeline`](crate::Pipeline) instance.
///
/// Built once at process start and shared by every run. All paths the
/// pipeline touches (model cache, scratch dir) are resolved here, never from
/// hidden global state.
pub struct PipelineOptions {
    pub model: Model,
    pub language: Language,
    pub n_threads: Option<u32>,
    pub gpu: bool,
    pub gpu_device: u32,
    /// Where downloaded whisper models live. Defaults to the user cache dir.
    pub model_cache_dir: Option<PathBuf>,
    /// Scratch directory for downloaded/demuxed audio. Defaults to the
    /// system temp dir.
    pub work_dir: Option<PathBuf>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model: Model::Base,
            language: Language::Auto,
            n_threads: None,
            gpu: true,
            gpu_device: 0,
            model_cache_dir: None,
            work_dir: None,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set the language. Validates against whisper's supported languages.
    /// Accepts codes ("en", "de") or full names ("english", "german").
    pub fn language(mut self, lang: &str) -> Result<Self> {
        self.language = Language::new(lang)?;
        Ok(self)
    }

    pub fn n_threads(mut self, n: u32) -> Self {
        self.n_threads = Some(n);
        self
    }

    pub fn gpu(mut self, enabled: bool) -> Self {
        self.gpu = enabled;
        self
    }

    pub fn gpu_device(mut self, device: u32) -> Self {
        self.gpu_device = device;
        self
    }

    pub fn model_cache_dir(mut self, dir: PathBuf) -> Self {
        self.model_cache_dir = Some(dir);
        self
    }

    pub fn work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    /// Resolve the model cache directory, defaulting to
    /// `~/.cache/vidscribe/models`.
    pub fn resolve_model_cache_dir(&self) -> PathBuf {
        self.model_cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("vidscribe")
                .join("models")
        })
    }

    /// Resolve the scratch directory for intermediate media files.
    pub fn resolve_work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("vidscribe"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_parse_name_roundtrip() {
        for name in [
            "tiny",
            "tiny.en",
            "base",
            "base.en",
            "small",
            "small.en",
            "medium",
            "medium.en",
            "large-v2",
            "large-v3",
            "large-v3-turbo",
        ] {
            let model = Model::parse_name(name).expect("known model");
            assert_eq!(model.name(), name);
        }
    }

    #[test]
    fn test_model_parse_name_unknown() {
        assert!(Model::parse_name("enormous").is_none());
    }

    #[test]
    fn test_custom_model_filename() {
        let model = Model::Custom(PathBuf::from("/models/my-model.bin"));
        assert_eq!(model.filename(), "my-model.bin");
        assert_eq!(model.name(), "custom");
    }

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert!(matches!(opts.model, Model::Base));
        assert!(matches!(opts.language, Language::Auto));
        assert!(opts.gpu);
    }

    #[test]
    fn test_explicit_dirs_win() {
        let opts = PipelineOptions::new()
            .model_cache_dir(PathBuf::from("/tmp/models"))
            .work_dir(PathBuf::from("/tmp/scratch"));
        assert_eq!(opts.resolve_model_cache_dir(), PathBuf::from("/tmp/models"));
        assert_eq!(opts.resolve_work_dir(), PathBuf::from("/tmp/scratch"));
    }
}
