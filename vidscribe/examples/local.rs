//! Transcribe a local audio or video file and print the flattened text.
//!
//! Usage: cargo run --example local -- path/to/media.mp4

use std::path::Path;

#[tokio::main]
async fn main() -> vidscribe::Result<()> {
    let input = std::env::args().nth(1).expect("usage: local <media-file>");

    let store = vidscribe::TranscriptStore::open("transcripts.db")?;
    let pipeline = vidscribe::Pipeline::new(store, vidscribe::PipelineOptions::default());

    let upload = vidscribe::Upload {
        file_name: Path::new(&input)
            .file_name()
            .expect("input must be a file")
            .to_string_lossy()
            .into_owned(),
        mime: None,
        bytes: std::fs::read(&input)?,
    };

    let run = pipeline.run_local(&upload).await?;
    println!("{}", run.artifacts.text);

    Ok(())
}
