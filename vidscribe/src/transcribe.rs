use std::path::Path;

use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::WHISPER_SAMPLE_RATE;
use crate::config::{Language, PipelineOptions};
use crate::error::{Error, Result};
use crate::types::{Segment, Transcript};

/// Transcribe audio samples using whisper.cpp.
/// Samples must be 16kHz mono f32. Pure with respect to the filesystem:
/// deleting the source audio is the pipeline's job, not this function's.
pub fn transcribe_samples(
    samples: &[f32],
    model_path: &Path,
    options: &PipelineOptions,
) -> Result<Transcript> {
    info!(model = %model_path.display(), "loading whisper model");

    let mut ctx_params = WhisperContextParameters::new();
    ctx_params.use_gpu(options.gpu);
    ctx_params.gpu_device(options.gpu_device as i32);

    let ctx = WhisperContext::new_with_params(
        model_path
            .to_str()
            .ok_or_else(|| Error::Model("model path contains invalid UTF-8".into()))?,
        ctx_params,
    )?;

    let mut state = ctx.create_state()?;

    let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 5 });

    match &options.language {
        Language::Auto => params.set_detect_language(true),
        Language::Code { code, .. } => params.set_language(Some(code)),
    }

    if let Some(n) = options.n_threads {
        params.set_n_threads(n as i32);
    }

    // Keep whisper.cpp off our stderr
    params.set_print_progress(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    info!(samples = samples.len(), "running transcription");
    state.full(params, samples)?;

    let num_segments = state.full_n_segments();
    debug!(num_segments, "transcription complete");

    let mut segments = Vec::with_capacity(num_segments as usize);

    for i in 0..num_segments {
        let segment = state
            .get_segment(i)
            .ok_or_else(|| Error::Transcription(format!("segment {i} not found")))?;

        let text = segment
            .to_str_lossy()
            .map_err(|e| Error::Transcription(format!("segment text error: {e}")))?
            .into_owned();

        // Timestamps arrive in centiseconds
        segments.push(Segment {
            start: segment.start_timestamp() as f64 / 100.0,
            end: segment.end_timestamp() as f64 / 100.0,
            text,
        });
    }

    let duration = samples.len() as f64 / WHISPER_SAMPLE_RATE as f64;

    let detected_lang_id = state.full_lang_id_from_state();
    let language = whisper_rs::get_lang_str(detected_lang_id)
        .unwrap_or("unknown")
        .to_string();

    Ok(Transcript {
        segments,
        language,
        duration,
        model: options.model.name().to_string(),
    })
}
