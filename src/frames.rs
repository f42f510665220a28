//! Frame sampling via ffmpeg and FrameSet construction.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static FRAME_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^frame_sec_(\d+)\.jpg$").expect("valid frame name regex"));

/// A single sampled frame awaiting OCR. `frame_id` is the file name inside
/// the frames directory; `second_offset` is the whole second it encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameJob {
    pub second_offset: u32,
    pub frame_id: String,
}

/// Parse the second offset out of a frame file name,
/// e.g. `frame_sec_12.jpg` -> 12.
pub fn parse_second_offset(frame_id: &str) -> Option<u32> {
    FRAME_NAME_RE
        .captures(frame_id)
        .and_then(|caps| caps[1].parse().ok())
}

/// Sample one frame per second of video into `frames_dir` and return the
/// ordered FrameSet.
///
/// The frames directory is recreated from scratch so stale frames from an
/// earlier run cannot leak into the transcript. A non-zero ffmpeg exit is a
/// pipeline-level failure, unlike per-frame OCR errors.
pub fn extract_frames(ffmpeg: &str, video_path: &Path, frames_dir: &Path) -> Result<Vec<FrameJob>> {
    if frames_dir.exists() {
        std::fs::remove_dir_all(frames_dir)
            .with_context(|| format!("failed to clear {}", frames_dir.display()))?;
    }
    std::fs::create_dir_all(frames_dir)
        .with_context(|| format!("failed to create {}", frames_dir.display()))?;

    let pattern = frames_dir.join("frame_sec_%d.jpg");
    let output = Command::new(ffmpeg)
        .arg("-i")
        .arg(video_path)
        .arg("-vf")
        .arg("fps=1")
        .arg(&pattern)
        .output()
        .with_context(|| format!("failed to run {}", ffmpeg))?;

    if !output.status.success() {
        anyhow::bail!(
            "ffmpeg exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    list_frame_jobs(frames_dir)
}

/// List the frame files in `frames_dir` and parse them into jobs, ordered by
/// second offset. Files that do not match the naming pattern are skipped.
pub fn list_frame_jobs(frames_dir: &Path) -> Result<Vec<FrameJob>> {
    let mut jobs = Vec::new();
    for entry in std::fs::read_dir(frames_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        match parse_second_offset(&name) {
            Some(second_offset) => jobs.push(FrameJob {
                second_offset,
                frame_id: name,
            }),
            None => tracing::warn!("ignoring unexpected file in frames dir: {}", name),
        }
    }
    jobs.sort_by_key(|j| j.second_offset);
    Ok(jobs)
}
