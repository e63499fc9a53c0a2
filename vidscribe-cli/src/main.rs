use std::path::PathBuf;

use clap::Parser;
use vidscribe::{Model, Pipeline, PipelineOptions, TranscriptStore, Upload};

#[derive(Parser)]
#[command(
    name = "vidscribe",
    about = "Transcribe a video from URL or local file, with a transcript cache and CSV/TXT export"
)]
struct Cli {
    /// Video URL or local media file (wav, mp3, mp4, mov).
    #[arg(required_unless_present_any = ["list_models", "download_model", "list_languages"])]
    input: Option<String>,

    /// Directory to write <title>.csv and <title>.txt into.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Transcript store location.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Whisper model to use.
    #[arg(short, long, default_value = "base")]
    model: String,

    /// Language code (e.g. "en", "de") or "auto" for detection.
    #[arg(short, long, default_value = "auto")]
    language: String,

    /// Declared MIME type for a local file (otherwise inferred from the
    /// extension).
    #[arg(long)]
    mime: Option<String>,

    /// Disable GPU acceleration.
    #[arg(long)]
    no_gpu: bool,

    /// GPU device ID.
    #[arg(long, default_value = "0")]
    gpu_device: u32,

    /// Number of threads (default: auto).
    #[arg(long)]
    threads: Option<u32>,

    /// Model cache directory.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Scratch directory for downloaded and demuxed audio.
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// List available models.
    #[arg(long)]
    list_models: bool,

    /// Download a model without transcribing.
    #[arg(long)]
    download_model: Option<String>,

    /// List supported languages.
    #[arg(long)]
    list_languages: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vidscribe=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.list_languages {
        println!("{:<6} {}", "CODE", "LANGUAGE");
        println!("{:<6} {}", "----", "--------");
        for (code, name) in vidscribe::Language::supported() {
            println!("{code:<6} {name}");
        }
        return;
    }

    if cli.list_models {
        let models = [
            ("tiny", "75 MB"),
            ("tiny.en", "75 MB"),
            ("base", "142 MB"),
            ("base.en", "142 MB"),
            ("small", "466 MB"),
            ("small.en", "466 MB"),
            ("medium", "1.5 GB"),
            ("medium.en", "1.5 GB"),
            ("large-v2", "2.9 GB"),
            ("large-v3", "2.9 GB"),
            ("large-v3-turbo", "~1.6 GB"),
        ];
        println!("{:<16} {}", "MODEL", "SIZE");
        println!("{:<16} {}", "-----", "----");
        for (name, size) in models {
            println!("{name:<16} {size}");
        }

        let cache_dir = cli
            .cache_dir
            .unwrap_or_else(|| PipelineOptions::default().resolve_model_cache_dir());
        let cached = vidscribe::model::list_cached_models(&cache_dir);
        if !cached.is_empty() {
            println!("\nCached models in {}:", cache_dir.display());
            for path in cached {
                println!(
                    "  {}",
                    path.file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default()
                );
            }
        }
        return;
    }

    if let Some(model_name) = &cli.download_model {
        let model = match Model::parse_name(model_name) {
            Some(m) => m,
            None => {
                eprintln!("Unknown model: {model_name}");
                eprintln!("Use --list-models to see available models");
                std::process::exit(1);
            }
        };
        let cache_dir = cli
            .cache_dir
            .unwrap_or_else(|| PipelineOptions::default().resolve_model_cache_dir());
        match vidscribe::model::ensure_model(&model, &cache_dir).await {
            Ok(path) => println!("Model ready: {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let input = cli.input.unwrap();

    let model = match Model::parse_name(&cli.model) {
        Some(m) => m,
        None => {
            // Try as custom model path
            let path = PathBuf::from(&cli.model);
            if path.exists() {
                Model::Custom(path)
            } else {
                eprintln!("Unknown model: {}", cli.model);
                eprintln!("Use --list-models to see available models, or provide a path to a .ggml file");
                std::process::exit(1);
            }
        }
    };

    let mut opts = match PipelineOptions::new()
        .model(model)
        .gpu(!cli.no_gpu)
        .gpu_device(cli.gpu_device)
        .language(&cli.language)
    {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --list-languages to see supported languages");
            std::process::exit(1);
        }
    };

    if let Some(n) = cli.threads {
        opts = opts.n_threads(n);
    }
    if let Some(dir) = cli.cache_dir {
        opts = opts.model_cache_dir(dir);
    }
    if let Some(dir) = cli.work_dir {
        opts = opts.work_dir(dir);
    }

    let store_path = cli.store.unwrap_or_else(default_store_path);
    let store = match TranscriptStore::open(&store_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error opening store at {}: {e}", store_path.display());
            std::process::exit(1);
        }
    };
    let pipeline = Pipeline::new(store, opts);

    let is_url = input.starts_with("http://") || input.starts_with("https://");

    let result = if is_url {
        pipeline.run_url(&input).await
    } else {
        let upload = match read_upload(&input, cli.mime) {
            Ok(u) => u,
            Err(e) => {
                eprintln!("Error reading {input}: {e}");
                std::process::exit(1);
            }
        };
        pipeline.run_local(&upload).await
    };

    let run = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    eprintln!(
        "{}: {} segments{}",
        run.title,
        run.artifacts.table.len(),
        if run.cache_hit { " (from cache)" } else { "" }
    );

    let stem = sanitize_file_stem(&run.title);
    let csv_path = cli.out_dir.join(format!("{stem}.csv"));
    let txt_path = cli.out_dir.join(format!("{stem}.txt"));

    if let Err(e) = std::fs::create_dir_all(&cli.out_dir)
        .and_then(|_| std::fs::write(&csv_path, &run.artifacts.csv))
        .and_then(|_| std::fs::write(&txt_path, run.artifacts.text.as_bytes()))
    {
        eprintln!("Error writing artifacts: {e}");
        std::process::exit(1);
    }

    eprintln!(
        "Written {} and {}",
        csv_path.display(),
        txt_path.display()
    );
}

fn read_upload(input: &str, mime: Option<String>) -> std::io::Result<Upload> {
    let path = PathBuf::from(input);
    let bytes = std::fs::read(&path)?;
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string());
    Ok(Upload {
        file_name,
        mime,
        bytes,
    })
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidscribe")
        .join("transcripts")
}

/// Replace filesystem-hostile characters in a title so it can name a file.
fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
            {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "transcript".into()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_stem_passes_clean_titles() {
        assert_eq!(sanitize_file_stem("My Talk 2024"), "My Talk 2024");
    }

    #[test]
    fn test_sanitize_file_stem_replaces_separators() {
        assert_eq!(sanitize_file_stem("a/b\\c:d"), "a_b_c_d");
    }

    #[test]
    fn test_sanitize_file_stem_empty_title() {
        assert_eq!(sanitize_file_stem("   "), "transcript");
    }
}
