//! Turns the unordered per-frame OCR batch into a clean transcript.
//!
//! On-screen captions typically persist for several seconds, so consecutive
//! frames produce verbatim or near-verbatim repeats. The merge renders each
//! result as a `"HH:MM:SS <text>"` line, sorts descending by timestamp, and
//! scans the sorted sequence comparing each entry against its neighbor to
//! suppress restatements of the same caption.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ocr::pool::RawResult;

/// Maximum Levenshtein distance at which two normalized texts count as
/// restatements of the same caption.
const SIMILARITY_THRESHOLD: usize = 10;

/// Shortest usable rendered line: a full timestamp plus a following space.
const MIN_LINE_LEN: usize = 9;

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}:\d{2}:\d{2})").expect("valid timestamp regex"));

/// Format a whole-second offset as `HH:MM:SS`.
pub fn seconds_to_hhmmss(total: u32) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Replace line breaks and tabs with spaces and trim the ends. Idempotent.
pub fn normalize_text(input: &str) -> String {
    input
        .replace('\n', " ")
        .replace('\r', " ")
        .replace('\t', " ")
        .trim()
        .to_string()
}

fn extract_timestamp(line: &str) -> Option<&str> {
    TIMESTAMP_RE.find(line).map(|m| m.as_str())
}

fn format_line(result: &RawResult) -> String {
    format!("{} {}", seconds_to_hhmmss(result.second_offset), result.text)
}

/// Stable sort, descending by the embedded timestamp. `HH:MM:SS` compares
/// lexicographically the same as chronologically, so this is
/// reverse-chronological order. Lines without a timestamp sort last.
fn sort_by_timestamp_desc(lines: &mut [String]) {
    lines.sort_by(|a, b| {
        let ta = extract_timestamp(a).unwrap_or("");
        let tb = extract_timestamp(b).unwrap_or("");
        tb.cmp(ta)
    });
}

/// Neighbor used for the duplicate comparison: the next entry in the sorted
/// sequence, or two positions back for the last entry. None when the batch is
/// too small for either to exist.
fn neighbor_index(idx: usize, len: usize) -> Option<usize> {
    if idx + 1 < len {
        Some(idx + 1)
    } else if idx >= 2 {
        Some(idx - 2)
    } else {
        None
    }
}

fn text_portion(line: &str) -> &str {
    line.get(8..).unwrap_or("")
}

/// Merge the raw OCR batch into a unique timestamp -> text mapping.
///
/// An entry is dropped only when, against its neighbor, it simultaneously is
/// a prefix-repeat, has already been emitted verbatim, and falls within the
/// similarity threshold. The rule is deliberately permissive and must keep
/// this exact boolean structure: it errs toward a complete transcript at the
/// cost of some residual duplicates.
pub fn merge_results(results: &[RawResult]) -> BTreeMap<String, String> {
    let mut lines: Vec<String> = results.iter().map(format_line).collect();
    sort_by_timestamp_desc(&mut lines);

    let mut transcript = BTreeMap::new();
    // Scoped accumulator for the "already emitted" check, so the merge stays
    // a pure function of its input batch.
    let mut emitted: Vec<String> = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.len() < MIN_LINE_LEN {
            tracing::debug!("discarding short line: {:?}", line);
            continue;
        }
        let Some(timestamp) = extract_timestamp(line) else {
            continue;
        };
        let normalized = normalize_text(text_portion(line));
        if normalized.is_empty() {
            continue;
        }

        // Skipped entries above still serve as neighbors here: the comparison
        // runs against the sorted sequence, not against the kept output.
        let keep = match neighbor_index(idx, lines.len()) {
            None => true,
            Some(n) => {
                let neighbor = normalize_text(text_portion(&lines[n]));
                let is_prefix_repeat = normalized.starts_with(&neighbor);
                let already_emitted = emitted.iter().any(|e| e == &normalized);
                let similar =
                    strsim::levenshtein(&normalized, &neighbor) <= SIMILARITY_THRESHOLD;
                !is_prefix_repeat || !already_emitted || !similar
            }
        };

        if keep {
            emitted.push(normalized.clone());
            transcript.insert(timestamp.to_string(), normalized);
        }
    }

    transcript
}
