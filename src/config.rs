use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ocr::pool;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub ocr: OcrConfig,
    pub workdir: WorkdirConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// ffmpeg binary used for one-frame-per-second sampling.
    pub ffmpeg_path: String,
    /// Number of concurrent OCR workers. 0 means auto: half the logical
    /// cores, leaving headroom for the OCR processes themselves.
    pub workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// tesseract binary invoked once per frame.
    pub tesseract_path: String,
    /// Language passed to tesseract when the CLI does not override it.
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkdirConfig {
    /// Root for per-request working directories. Empty means the system
    /// temp directory.
    pub root: PathBuf,
    /// Keep working directories (video + frames) after a run.
    pub keep: bool,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig::default(),
            workdir: WorkdirConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            workers: 0,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            default_language: "eng".to_string(),
        }
    }
}

impl Default for WorkdirConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            keep: false,
        }
    }
}

impl ExtractionConfig {
    /// Resolve the effective worker count (`0` = auto).
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            pool::default_worker_count()
        } else {
            self.workers
        }
    }
}

impl WorkdirConfig {
    pub fn resolved_root(&self) -> PathBuf {
        if self.root.as_os_str().is_empty() {
            std::env::temp_dir()
        } else {
            self.root.clone()
        }
    }
}

// --- Config loading ---

impl Config {
    /// Load config: explicit path, then beside the executable, then the
    /// platform config directory, then built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(p) = path {
            let content = std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("Failed to read config file {}: {}", p.display(), e)
            })?;
            return Ok(toml::from_str(&content)?);
        }

        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(p) = exe_path.parent().map(|d| d.join("framereader.toml")) {
                if p.exists() {
                    let content = std::fs::read_to_string(&p)?;
                    return Ok(toml::from_str(&content)?);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("framereader").join("config.toml");
            if platform_config.exists() {
                let content = std::fs::read_to_string(&platform_config)?;
                return Ok(toml::from_str(&content)?);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}
