//! Orchestrates one extraction request end to end:
//! fetch -> sample frames -> OCR fan-out -> fan-in -> merge.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::download::{self, Source};
use crate::error::PipelineError;
use crate::frames;
use crate::merge;
use crate::ocr::pool::{self, CancelFlag};
use crate::ocr::recognizer::{TesseractRecognizer, TextRecognizer};

/// Final product of one extraction run.
#[derive(Debug, Serialize)]
pub struct Outcome {
    /// Timestamp (`HH:MM:SS`) to on-screen text, ascending.
    pub transcript: BTreeMap<String, String>,
    pub frames_sampled: usize,
    pub entries: usize,
    pub seconds_to_finish: f64,
}

/// Per-request working directory, uniquely named so concurrent runs cannot
/// collide. Removed on drop unless `keep` is set.
struct Workdir {
    path: PathBuf,
    keep: bool,
}

impl Workdir {
    fn create(root: &Path, keep: bool) -> anyhow::Result<Self> {
        let path = root.join(format!("framereader-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self { path, keep })
    }
}

impl Drop for Workdir {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!("keeping working directory: {}", self.path.display());
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "failed to remove working directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Tesseract language codes: lowercase script names joined by `+`
/// (e.g. "eng", "chi_sim", "eng+por").
fn validate_language(code: &str) -> Result<(), PipelineError> {
    let valid = !code.is_empty()
        && code.split('+').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        });
    if valid {
        Ok(())
    } else {
        Err(PipelineError::InvalidLanguage(code.to_string()))
    }
}

/// Run one extraction request. Input validation happens before any work is
/// dispatched or any filesystem state is created.
pub fn run(
    config: &Config,
    locator: &str,
    language: &str,
    cancel: &CancelFlag,
) -> Result<Outcome, PipelineError> {
    let start = Instant::now();

    validate_language(language)?;
    let source = Source::parse(locator)?;

    let workdir = Workdir::create(&config.workdir.resolved_root(), config.workdir.keep)
        .map_err(PipelineError::Workdir)?;
    tracing::info!("working directory: {}", workdir.path.display());

    let video_path = download::fetch(&source, &workdir.path).map_err(PipelineError::Download)?;

    let frames_dir = workdir.path.join("frames");
    let jobs = frames::extract_frames(&config.extraction.ffmpeg_path, &video_path, &frames_dir)
        .map_err(PipelineError::FrameExtraction)?;
    tracing::info!("sampled {} frames from {}", jobs.len(), video_path.display());

    let recognizer: Arc<dyn TextRecognizer> =
        Arc::new(TesseractRecognizer::new(&config.ocr.tesseract_path));
    let results = pool::run_pool(
        &jobs,
        &frames_dir,
        language,
        config.extraction.worker_count(),
        recognizer,
        cancel,
    );
    debug_assert_eq!(results.len(), jobs.len());

    let transcript = merge::merge_results(&results);
    let entries = transcript.len();
    tracing::info!("{} raw results merged into {} entries", results.len(), entries);

    Ok(Outcome {
        transcript,
        frames_sampled: jobs.len(),
        entries,
        seconds_to_finish: start.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_language() {
        assert!(validate_language("eng").is_ok());
        assert!(validate_language("chi_sim").is_ok());
        assert!(validate_language("eng+por").is_ok());

        assert!(validate_language("").is_err());
        assert!(validate_language("ENG").is_err());
        assert!(validate_language("eng+").is_err());
        assert!(validate_language("en g").is_err());
        assert!(validate_language("eng; rm -rf /").is_err());
    }

    #[test]
    fn test_workdir_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let workdir = Workdir::create(tmp.path(), false).unwrap();
            assert!(workdir.path.is_dir());
            workdir.path.clone()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_workdir_kept_when_requested() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let workdir = Workdir::create(tmp.path(), true).unwrap();
            workdir.path.clone()
        };
        assert!(path.is_dir());
    }

    #[test]
    fn test_workdirs_are_unique() {
        let tmp = TempDir::new().unwrap();
        let a = Workdir::create(tmp.path(), true).unwrap();
        let b = Workdir::create(tmp.path(), true).unwrap();
        assert_ne!(a.path, b.path);
    }

    #[test]
    fn test_run_rejects_bad_language_before_any_work() {
        let config = Config::default();
        let err = run(&config, "gs://bucket/clip.mp4", "ENG", &CancelFlag::new()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_run_rejects_bad_source_before_any_work() {
        let config = Config::default();
        let err = run(&config, "/no/such/clip.mp4", "eng", &CancelFlag::new()).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_outcome_serializes_expected_fields() {
        let outcome = Outcome {
            transcript: BTreeMap::from([("00:00:01".to_string(), "hi".to_string())]),
            frames_sampled: 1,
            entries: 1,
            seconds_to_finish: 0.5,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["transcript"]["00:00:01"], "hi");
        assert_eq!(json["frames_sampled"], 1);
        assert_eq!(json["entries"], 1);
    }
}
