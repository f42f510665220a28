//! Source locator parsing and idempotent video fetch.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::PipelineError;

static GS_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^gs://([^/]+)/(.+)$").expect("valid gs locator regex"));

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Where the source video lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// `gs://bucket/object`, fetched over the public GCS HTTP endpoint.
    Gcs { bucket: String, object: String },
    /// Direct `http(s)://` URL.
    Http(Url),
    /// A file already on disk; no fetch needed.
    Local(PathBuf),
}

impl Source {
    /// Classify and validate a source locator. Anything that is not a
    /// well-formed `gs://` or `http(s)://` URL or an existing local file is
    /// an input error.
    pub fn parse(locator: &str) -> Result<Self, PipelineError> {
        if locator.trim().is_empty() {
            return Err(PipelineError::InvalidSource("empty locator".to_string()));
        }

        if locator.starts_with("gs://") {
            let caps = GS_URL_RE.captures(locator).ok_or_else(|| {
                PipelineError::InvalidSource(format!("malformed gs:// url: {}", locator))
            })?;
            return Ok(Self::Gcs {
                bucket: caps[1].to_string(),
                object: caps[2].to_string(),
            });
        }

        if locator.starts_with("http://") || locator.starts_with("https://") {
            let url = Url::parse(locator).map_err(|e| {
                PipelineError::InvalidSource(format!("malformed url {}: {}", locator, e))
            })?;
            return Ok(Self::Http(url));
        }

        let path = PathBuf::from(locator);
        if path.is_file() {
            Ok(Self::Local(path))
        } else {
            Err(PipelineError::InvalidSource(format!(
                "no such file: {}",
                locator
            )))
        }
    }

    /// File name the video will have inside the working directory.
    pub fn filename(&self) -> String {
        let name = match self {
            Self::Gcs { object, .. } => object.rsplit('/').next().unwrap_or(""),
            Self::Http(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or(""),
            Self::Local(path) => path
                .file_name()
                .map(|n| n.to_str().unwrap_or(""))
                .unwrap_or(""),
        };
        if name.is_empty() {
            "video".to_string()
        } else {
            name.to_string()
        }
    }
}

/// Materialize the source video inside `dest_dir`.
///
/// Idempotent: when the target file already exists the download is skipped,
/// so re-runs sharing a kept working directory do not re-fetch. Local sources
/// are used in place without copying.
pub fn fetch(source: &Source, dest_dir: &Path) -> Result<PathBuf> {
    match source {
        Source::Local(path) => Ok(path.clone()),
        Source::Gcs { bucket, object } => {
            let url = format!("https://storage.googleapis.com/{}/{}", bucket, object);
            fetch_url(&url, &dest_dir.join(source.filename()))
        }
        Source::Http(url) => fetch_url(url.as_str(), &dest_dir.join(source.filename())),
    }
}

fn fetch_url(url: &str, dest: &Path) -> Result<PathBuf> {
    if dest.exists() {
        tracing::info!("source already present, skipping download: {}", dest.display());
        return Ok(dest.to_path_buf());
    }

    tracing::info!("downloading {}", url);
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("server rejected {}", url))?;

    let mut file = std::fs::File::create(dest)
        .with_context(|| format!("failed to create {}", dest.display()))?;
    let bytes = response
        .copy_to(&mut file)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    tracing::info!("downloaded {} bytes to {}", bytes, dest.display());

    Ok(dest.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_gcs_locator() {
        let source = Source::parse("gs://my-bucket/videos/clip.mp4").unwrap();
        assert_eq!(
            source,
            Source::Gcs {
                bucket: "my-bucket".to_string(),
                object: "videos/clip.mp4".to_string(),
            }
        );
        assert_eq!(source.filename(), "clip.mp4");
    }

    #[test]
    fn test_parse_rejects_bucket_only_gcs_locator() {
        let err = Source::parse("gs://my-bucket").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_parse_http_locator() {
        let source = Source::parse("https://example.com/media/clip.mp4").unwrap();
        assert!(matches!(source, Source::Http(_)));
        assert_eq!(source.filename(), "clip.mp4");
    }

    #[test]
    fn test_http_locator_without_filename_gets_fallback() {
        let source = Source::parse("https://example.com/").unwrap();
        assert_eq!(source.filename(), "video");
    }

    #[test]
    fn test_parse_local_file() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        std::fs::write(&video, b"not really a video").unwrap();

        let source = Source::parse(video.to_str().unwrap()).unwrap();
        assert_eq!(source, Source::Local(video.clone()));
        assert_eq!(source.filename(), "clip.mp4");
    }

    #[test]
    fn test_parse_rejects_missing_local_file() {
        let err = Source::parse("/no/such/clip.mp4").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_parse_rejects_empty_locator() {
        assert!(Source::parse("  ").is_err());
    }

    #[test]
    fn test_fetch_local_uses_file_in_place() {
        let tmp = TempDir::new().unwrap();
        let video = tmp.path().join("clip.mp4");
        std::fs::write(&video, b"bytes").unwrap();

        let source = Source::Local(video.clone());
        let fetched = fetch(&source, tmp.path()).unwrap();
        assert_eq!(fetched, video);
    }

    #[test]
    fn test_fetch_skips_existing_download() {
        // Unreachable host, but the target file already exists so no request
        // is ever made.
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("clip.mp4"), b"cached").unwrap();

        let source = Source::parse("https://host.invalid/clip.mp4").unwrap();
        let fetched = fetch(&source, tmp.path()).unwrap();
        assert_eq!(fetched, tmp.path().join("clip.mp4"));
    }
}
