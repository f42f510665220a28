use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Boundary over the external OCR engine.
///
/// A failed call degrades to empty text; implementations must never let an
/// error escape past this boundary, so a single bad frame cannot abort the
/// worker pool.
pub trait TextRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize the text in a single frame image. Returns the empty string
    /// on failure or when the frame contains no readable text.
    fn read(&self, frame_path: &Path, language: &str) -> String;
}

/// Runs the `tesseract` CLI once per frame, writing recognized text to stdout.
pub struct TesseractRecognizer {
    binary: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn read(&self, frame_path: &Path, language: &str) -> String {
        let start = Instant::now();
        let output = Command::new(&self.binary)
            .arg(frame_path)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
                tracing::debug!(
                    "ocr {} done in {:.2}s ({} bytes)",
                    frame_path.display(),
                    start.elapsed().as_secs_f64(),
                    text.len()
                );
                text
            }
            Ok(out) => {
                tracing::warn!(
                    "tesseract failed on {}: {}",
                    frame_path.display(),
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                String::new()
            }
            Err(e) => {
                tracing::warn!("could not run tesseract on {}: {}", frame_path.display(), e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_degrades_to_empty_text() {
        let recognizer = TesseractRecognizer::new("definitely-not-a-real-binary");
        let text = recognizer.read(Path::new("frame_sec_1.jpg"), "eng");
        assert_eq!(text, "");
    }

    #[test]
    fn test_recognizer_name() {
        assert_eq!(TesseractRecognizer::new("tesseract").name(), "tesseract");
    }
}
