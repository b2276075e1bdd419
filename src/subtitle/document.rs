use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::{debug, warn};

use crate::timecode::Timecode;

/// SRT timestamp line pattern: `HH:MM:SS,mmm --> HH:MM:SS,mmm`
static TIMESTAMP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})").unwrap()
});

/// Minimum detector confidence before the guessed encoding is trusted as
/// the first decode candidate.
const DETECTOR_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// One block of a subtitle document: everything between two blank-line
/// delimiters. A block without a recognizable timestamp line stays in the
/// sequence (adjacency defines context for its neighbors) but carries no
/// time range of its own.
#[derive(Debug, Clone)]
pub struct SubtitleBlock {
    /// Position within the document, zero-based.
    pub index: usize,
    /// Parsed (start, end) pair when the block has a timestamp line.
    pub times: Option<(Timecode, Timecode)>,
    /// The raw block text, timestamp line included.
    pub text: String,
    /// The dialogue lines following the timestamp line.
    pub dialogue: String,
}

/// A subtitle-track document with its resolved text encoding.
///
/// Encodings are never guaranteed to be UTF-8: the raw bytes are run
/// through a statistical detector, and the decode falls back through
/// UTF-8, ISO-8859-1 and Windows-1252 until one succeeds. A document that
/// cannot be decoded at all yields zero blocks rather than an error, so a
/// keyword search downstream simply finds no matches.
#[derive(Debug, Clone)]
pub struct SubtitleDocument {
    /// Name of the encoding that decoded the document, if any did.
    pub encoding: Option<&'static str>,
    text: String,
}

impl SubtitleDocument {
    /// Read and decode a subtitle file. Unreadable files and undecodable
    /// content both produce an empty document.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read(path).await {
            Ok(raw) => Self::from_bytes(&raw),
            Err(e) => {
                warn!("Failed to read subtitle file {}: {}", path.display(), e);
                Self { encoding: None, text: String::new() }
            }
        }
    }

    /// Decode raw subtitle bytes through the detector-first fallback chain.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut candidates: Vec<&'static Encoding> = Vec::new();

        let (charset, confidence, _) = chardet::detect(raw);
        if confidence > DETECTOR_CONFIDENCE_THRESHOLD {
            if let Some(detected) =
                Encoding::for_label(chardet::charset2encoding(&charset).as_bytes())
            {
                debug!("Detected encoding {} (confidence {:.2})", detected.name(), confidence);
                candidates.push(detected);
            }
        }

        for label in ["utf-8", "iso-8859-1", "windows-1252"] {
            if let Some(enc) = Encoding::for_label(label.as_bytes()) {
                if !candidates.contains(&enc) {
                    candidates.push(enc);
                }
            }
        }

        for enc in candidates {
            let (text, _, had_errors) = enc.decode(raw);
            if !had_errors {
                return Self {
                    encoding: Some(enc.name()),
                    text: text.into_owned(),
                };
            }
            debug!("Failed to decode subtitle content as {}, trying next", enc.name());
        }

        warn!("Could not decode subtitle content with any candidate encoding");
        Self { encoding: None, text: String::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Segment the document into ordered blocks on the blank-line delimiter.
    pub fn blocks(&self) -> Vec<SubtitleBlock> {
        if self.is_empty() {
            return Vec::new();
        }

        let normalized = self.text.replace("\r\n", "\n");
        normalized
            .split("\n\n")
            .enumerate()
            .map(|(index, raw)| parse_block(index, raw))
            .collect()
    }
}

fn parse_block(index: usize, raw: &str) -> SubtitleBlock {
    let lines: Vec<&str> = raw.lines().collect();
    let timestamp_pos = lines.iter().position(|line| line.contains(" --> "));

    let times = timestamp_pos
        .and_then(|pos| TIMESTAMP_LINE.captures(lines[pos]))
        .and_then(|caps| {
            let start = Timecode::parse(&caps[1]).ok()?;
            let end = Timecode::parse(&caps[2]).ok()?;
            Some((start, end))
        });

    let dialogue = match timestamp_pos {
        Some(pos) => lines[pos + 1..].join("\n"),
        None => raw.trim().to_string(),
    };

    SubtitleBlock {
        index,
        times,
        text: raw.to_string(),
        dialogue,
    }
}

/// Shift every timed block forward by `offset_ms`. Used when stitching
/// per-chunk transcriptions back into one document.
pub fn shift_blocks(blocks: &mut [SubtitleBlock], offset_ms: u64) {
    for block in blocks.iter_mut() {
        if let Some((start, end)) = block.times {
            block.times = Some((
                start.shifted_by_millis(offset_ms),
                end.shifted_by_millis(offset_ms),
            ));
        }
    }
}

/// Render timed blocks back out as SRT text, renumbering from 1. Blocks
/// without a timestamp line are dropped.
pub fn render_blocks(blocks: &[SubtitleBlock]) -> String {
    let mut out = String::new();
    let mut seq = 0usize;
    for block in blocks {
        let Some((start, end)) = block.times else {
            continue;
        };
        seq += 1;
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            seq,
            start.to_srt(),
            end.to_srt(),
            block.dialogue.trim()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n\
                          2\n00:00:02,000 --> 00:00:05,000\nGeneral greeting\n\n\
                          3\n00:00:05,000 --> 00:00:08,000\nGoodbye";

    #[test]
    fn test_blocks_from_utf8() {
        let doc = SubtitleDocument::from_bytes(SAMPLE.as_bytes());
        assert_eq!(doc.encoding, Some("UTF-8"));

        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 3);

        let (start, end) = blocks[1].times.unwrap();
        assert_eq!(start.as_millis(), 2_000);
        assert_eq!(end.as_millis(), 5_000);
        assert_eq!(blocks[1].dialogue, "General greeting");
    }

    #[test]
    fn test_windows_1252_falls_back() {
        // "un caf\xE9 d\xE9cor\xE9" in Windows-1252; invalid as UTF-8, so
        // the decode has to walk the fallback chain regardless of what the
        // detector reports for such a short input.
        let raw = b"1\n00:00:00,000 --> 00:00:02,000\nun caf\xE9 d\xE9cor\xE9\n".to_vec();

        let doc = SubtitleDocument::from_bytes(&raw);
        assert!(doc.encoding.is_some());
        assert_ne!(doc.encoding, Some("UTF-8"));

        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].dialogue.contains("caf\u{e9}"));
        assert!(blocks[0].times.is_some());
    }

    #[test]
    fn test_block_without_timestamp_line() {
        let doc = SubtitleDocument::from_bytes(b"WEBVTT header junk\n\n1\n00:00:01,000 --> 00:00:02,000\nHi");
        let blocks = doc.blocks();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].times.is_none());
        assert_eq!(blocks[0].dialogue, "WEBVTT header junk");
        assert!(blocks[1].times.is_some());
    }

    #[test]
    fn test_empty_input_yields_no_blocks() {
        let doc = SubtitleDocument::from_bytes(b"");
        assert!(doc.blocks().is_empty());
    }

    #[test]
    fn test_crlf_delimiters() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        let doc = SubtitleDocument::from_bytes(crlf.as_bytes());
        assert_eq!(doc.blocks().len(), 3);
    }

    #[test]
    fn test_shift_and_render() {
        let doc = SubtitleDocument::from_bytes(SAMPLE.as_bytes());
        let mut blocks = doc.blocks();
        shift_blocks(&mut blocks, 10_000);

        let rendered = render_blocks(&blocks);
        assert!(rendered.starts_with("1\n00:00:10,000 --> 00:00:12,000\nHello there\n"));
        assert!(rendered.contains("3\n00:00:15,000 --> 00:00:18,000\nGoodbye"));
    }

    #[test]
    fn test_render_skips_untimed_blocks() {
        let doc = SubtitleDocument::from_bytes(b"stray header\n\n1\n00:00:01,000 --> 00:00:02,000\nHi\n");
        let rendered = render_blocks(&doc.blocks());
        assert!(!rendered.contains("stray header"));
        assert!(rendered.starts_with("1\n00:00:01,000"));
    }
}
