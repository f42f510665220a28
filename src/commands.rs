use std::process::Command;

use anyhow::Result;

use crate::config::Config;
use crate::error::PipelineError;
use crate::ocr::pool::CancelFlag;
use crate::pipeline;

pub struct ExtractArgs<'a> {
    pub source: &'a str,
    pub language: Option<&'a str>,
    pub workers: Option<usize>,
    pub json: bool,
    pub keep_workdir: bool,
}

/// Run one extraction and print the transcript.
pub fn run_extract(config: &Config, args: ExtractArgs<'_>) -> Result<(), PipelineError> {
    let mut config = config.clone();
    if let Some(workers) = args.workers {
        config.extraction.workers = workers;
    }
    if args.keep_workdir {
        config.workdir.keep = true;
    }
    let language = args
        .language
        .map(str::to_string)
        .unwrap_or_else(|| config.ocr.default_language.clone());

    // Ctrl-C drains the remaining frames as empty results instead of killing
    // the process mid-run, so a partial transcript is still emitted.
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::warn!("interrupt received, draining remaining frames");
            cancel.cancel();
        }) {
            tracing::warn!("could not install interrupt handler: {}", e);
        }
    }

    let outcome = pipeline::run(&config, args.source, &language, &cancel)?;

    if args.json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(body) => println!("{}", body),
            Err(e) => tracing::error!("could not serialize outcome: {}", e),
        }
    } else {
        for (timestamp, text) in &outcome.transcript {
            println!("{}  {}", timestamp, text);
        }
        println!();
        println!(
            "{} frames sampled, {} transcript entries, finished in {:.1}s",
            outcome.frames_sampled, outcome.entries, outcome.seconds_to_finish
        );
    }

    Ok(())
}

/// Verify the external tools are invokable before accepting any work.
pub fn run_check(config: &Config) -> Result<()> {
    let tools = [
        ("ffmpeg", config.extraction.ffmpeg_path.as_str(), "-version"),
        ("tesseract", config.ocr.tesseract_path.as_str(), "--version"),
    ];

    let mut all_ok = true;
    for (name, binary, version_flag) in tools {
        match Command::new(binary).arg(version_flag).output() {
            Ok(out) if out.status.success() => {
                // tesseract historically prints its version to stderr.
                let stdout = String::from_utf8_lossy(&out.stdout).to_string();
                let stderr = String::from_utf8_lossy(&out.stderr).to_string();
                let banner = stdout
                    .lines()
                    .chain(stderr.lines())
                    .next()
                    .unwrap_or("unknown version")
                    .to_string();
                println!("  {:<10} ok ({})", name, banner);
            }
            Ok(out) => {
                all_ok = false;
                println!(
                    "  {:<10} FAILED: {}",
                    name,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
            }
            Err(e) => {
                all_ok = false;
                println!("  {:<10} NOT FOUND: {} ({})", name, binary, e);
            }
        }
    }

    if all_ok {
        Ok(())
    } else {
        anyhow::bail!("one or more required tools are unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_check_reports_missing_tools() {
        let mut config = Config::default();
        config.extraction.ffmpeg_path = "definitely-not-a-real-binary".to_string();
        config.ocr.tesseract_path = "also-not-a-real-binary".to_string();
        assert!(run_check(&config).is_err());
    }

    #[test]
    fn test_run_extract_propagates_input_errors() {
        let config = Config::default();
        let err = run_extract(
            &config,
            ExtractArgs {
                source: "/no/such/clip.mp4",
                language: None,
                workers: None,
                json: false,
                keep_workdir: false,
            },
        )
        .unwrap_err();
        assert!(err.is_input_error());
    }
}
