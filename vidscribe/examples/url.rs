//! Transcribe a remote video and print the CSV artifact.
//!
//! Usage: cargo run --example url -- https://youtube.com/watch?v=...
//!
//! Run it twice with the same URL: the second run is served from the
//! transcript store without invoking the model.

#[tokio::main]
async fn main() -> vidscribe::Result<()> {
    let url = std::env::args().nth(1).expect("usage: url <video-url>");

    let store = vidscribe::TranscriptStore::open("transcripts.db")?;
    let pipeline = vidscribe::Pipeline::new(store, vidscribe::PipelineOptions::default());

    let run = pipeline.run_url(&url).await?;
    eprintln!(
        "{} ({})",
        run.title,
        if run.cache_hit { "cached" } else { "fresh" }
    );
    print!("{}", String::from_utf8_lossy(&run.artifacts.csv));

    Ok(())
}
