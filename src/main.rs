use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yt_transcript_fetcher::cli::Cli;
use yt_transcript_fetcher::fetch::{self, TranscriptRecord};
use yt_transcript_fetcher::output;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli);

    let record = match cli.video_id.as_deref() {
        Some(video_id) => fetch::fetch_transcript(video_id, &cli.languages).await,
        None => TranscriptRecord::failure("No video ID provided"),
    };

    // Exit status is zero on every path; callers read the record's
    // `success` field, not the process status.
    output::print_record(&record)
}

fn init_tracing(cli: &Cli) {
    let default_filter = if cli.quiet {
        "off"
    } else if cli.verbose {
        "yt_transcript_fetcher=debug"
    } else {
        "yt_transcript_fetcher=info"
    };

    // Diagnostics go to stderr; stdout carries only the JSON record.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
