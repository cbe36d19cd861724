//! Session file probe
//!
//! Diagnostics for binary DAW session files (e.g. a Pro Tools session saved
//! after importing an export). Used to confirm that marker labels and
//! positions survived a round trip through another tool. Nothing here
//! understands the session format; it only searches bytes.

use serde::Serialize;
use std::ops::Range;

/// Bytes of context kept on each side of a label match
pub const CONTEXT_BYTES: usize = 50;

/// Default minimum run length for [`printable_strings`]
pub const DEFAULT_MIN_STRING_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "UTF-8")]
    Utf8,
    #[serde(rename = "UTF-16LE")]
    Utf16Le,
}

/// One occurrence of a label in the session bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMatch {
    pub label: String,
    pub encoding: TextEncoding,
    pub offset: usize,
    /// Surrounding bytes, lossily decoded for display
    pub context: String,
}

/// A run of printable ASCII
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintableString {
    pub offset: usize,
    pub text: String,
}

/// An aligned 32-bit integer that reads as a plausible sample position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplePosition {
    pub offset: usize,
    pub value: u32,
    pub big_endian: bool,
    pub seconds: f64,
}

/// First divergence between two files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Difference {
    /// Offset of the first differing byte within the common prefix, if any
    pub first_differing_offset: Option<usize>,
    /// `b.len() - a.len()`
    pub size_delta: i64,
}

/// Find every occurrence of each label, UTF-8 and UTF-16LE
pub fn find_labels(bytes: &[u8], labels: &[&str]) -> Vec<LabelMatch> {
    let mut matches = Vec::new();
    for label in labels {
        if label.is_empty() {
            continue;
        }
        let utf16: Vec<u8> = label.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();

        for (encoding, needle) in [
            (TextEncoding::Utf8, label.as_bytes()),
            (TextEncoding::Utf16Le, utf16.as_slice()),
        ] {
            for offset in occurrences(bytes, needle) {
                let start = offset.saturating_sub(CONTEXT_BYTES);
                let end = (offset + needle.len() + CONTEXT_BYTES).min(bytes.len());
                matches.push(LabelMatch {
                    label: label.to_string(),
                    encoding,
                    offset,
                    context: String::from_utf8_lossy(&bytes[start..end]).into_owned(),
                });
            }
        }
    }
    matches
}

/// Overlapping occurrences of `needle`
fn occurrences(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, w)| *w == needle)
        .map(|(i, _)| i)
        .collect()
}

/// Runs of printable ASCII (0x20..=0x7E) longer than `min_len - 1`
pub fn printable_strings(bytes: &[u8], min_len: usize) -> Vec<PrintableString> {
    let mut found = Vec::new();
    let mut start = None;

    for (i, &b) in bytes.iter().chain(std::iter::once(&0u8)).enumerate() {
        if (0x20..=0x7E).contains(&b) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            if i - s >= min_len {
                found.push(PrintableString {
                    offset: s,
                    text: String::from_utf8_lossy(&bytes[s..i]).into_owned(),
                });
            }
        }
    }
    found
}

/// Aligned u32 values (both byte orders) that land strictly inside `range_seconds`
pub fn candidate_sample_positions(
    bytes: &[u8],
    sample_rate_hz: u32,
    range_seconds: Range<f64>,
) -> Vec<SamplePosition> {
    if sample_rate_hz == 0 {
        return Vec::new();
    }
    let mut found = Vec::new();
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        let word = [chunk[0], chunk[1], chunk[2], chunk[3]];
        for (value, big_endian) in [(u32::from_le_bytes(word), false), (u32::from_be_bytes(word), true)] {
            if value == 0 {
                continue;
            }
            let seconds = value as f64 / sample_rate_hz as f64;
            if range_seconds.start < seconds && seconds < range_seconds.end {
                found.push(SamplePosition {
                    offset: i * 4,
                    value,
                    big_endian,
                    seconds,
                });
            }
        }
    }
    found
}

pub fn first_difference(a: &[u8], b: &[u8]) -> Difference {
    Difference {
        first_differing_offset: a.iter().zip(b.iter()).position(|(x, y)| x != y),
        size_delta: b.len() as i64 - a.len() as i64,
    }
}
