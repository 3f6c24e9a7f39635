use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "yt-transcript",
    about = "Fetch a YouTube video transcript and print it as a single JSON record",
    version,
    long_about = "Fetches the transcript for one video identifier from YouTube's caption delivery and prints exactly one line of JSON to stdout: {\"success\": ..., \"transcript\": ..., \"error\": ...}. Success is reported in the record, not the exit status."
)]
pub struct Cli {
    /// Video identifier in YouTube's addressing scheme (e.g. dQw4w9WgXcQ)
    #[arg(value_name = "VIDEO_ID")]
    pub video_id: Option<String>,

    /// Ordered language preference for the transcript, comma-separated
    #[arg(
        short,
        long,
        value_name = "LANGS",
        value_delimiter = ',',
        default_value = "en,hi"
    )]
    pub languages: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress diagnostics on stderr
    #[arg(short, long)]
    pub quiet: bool,
}
