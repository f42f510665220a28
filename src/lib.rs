//! framereader: burned-in on-screen text extraction from video.
//!
//! The pipeline fetches a source video, samples one frame per second with an
//! external ffmpeg invocation, fans the frames out to a pool of tesseract OCR
//! workers, and merges the noisy per-frame output into a de-duplicated,
//! timestamp-keyed transcript.

pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod frames;
pub mod merge;
pub mod ocr;
pub mod pipeline;
