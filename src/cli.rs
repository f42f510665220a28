use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "framereader",
    version,
    about = "Extracts burned-in on-screen text from video into a timestamped transcript"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract on-screen text from a video into a transcript
    Extract {
        /// Video source: local path, http(s) URL, or gs://bucket/object
        source: String,

        /// OCR language passed to tesseract (e.g. "eng", "eng+por")
        #[arg(short, long)]
        language: Option<String>,

        /// Override the configured worker count
        #[arg(long)]
        workers: Option<usize>,

        /// Emit the result as JSON instead of a plain transcript
        #[arg(long)]
        json: bool,

        /// Keep the working directory (video + frames) after the run
        #[arg(long)]
        keep_workdir: bool,
    },

    /// Verify that ffmpeg and tesseract are invokable
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract_with_flags() {
        let cli = Cli::try_parse_from([
            "framereader",
            "extract",
            "gs://bucket/clip.mp4",
            "--language",
            "por",
            "--workers",
            "2",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract {
                source,
                language,
                workers,
                json,
                keep_workdir,
            } => {
                assert_eq!(source, "gs://bucket/clip.mp4");
                assert_eq!(language.as_deref(), Some("por"));
                assert_eq!(workers, Some(2));
                assert!(json);
                assert!(!keep_workdir);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["framereader", "extract"]).is_err());
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from(["framereader", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check));
    }
}
