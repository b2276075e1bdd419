use tracing::debug;

use crate::subtitle::document::SubtitleBlock;
use crate::timecode::TimeRange;

/// Controls how much context surrounds each keyword match.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    /// How many blocks on each side widen the matched range. With the
    /// default of 1, a match takes its predecessor's start and its
    /// successor's end as the clip boundaries.
    pub context_blocks: usize,
    /// Extra lead time in seconds, clamped at zero when it would
    /// underflow the start of the media.
    pub lead_secs: i64,
    /// Extra trail time in seconds.
    pub trail_secs: i64,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            context_blocks: 1,
            lead_secs: 0,
            trail_secs: 0,
        }
    }
}

/// Scan ordered blocks for case-insensitive substring matches of `keyword`
/// and produce one time range per matching block.
///
/// The match is tested against the raw block text, timestamp line
/// included. A matching block without a recognizable timestamp line yields
/// nothing. Ranges are returned in document order; overlapping or duplicate
/// ranges from adjacent matches are deliberately left as-is.
pub fn select_ranges(
    blocks: &[SubtitleBlock],
    keyword: &str,
    options: &SelectionOptions,
) -> Vec<TimeRange> {
    let needle = keyword.to_lowercase();
    let mut ranges = Vec::new();

    for (i, block) in blocks.iter().enumerate() {
        if !block.text.to_lowercase().contains(&needle) {
            continue;
        }

        let Some((own_start, own_end)) = block.times else {
            debug!("Block {} matches but has no timestamp line, skipping", block.index);
            continue;
        };

        let mut start = own_start;
        let mut end = own_end;

        if options.context_blocks > 0 {
            if let Some(prev) = i
                .checked_sub(options.context_blocks)
                .and_then(|j| blocks.get(j))
            {
                if let Some((prev_start, _)) = prev.times {
                    start = prev_start;
                }
            }
            if let Some(next) = blocks.get(i + options.context_blocks) {
                if let Some((_, next_end)) = next.times {
                    end = next_end;
                }
            }
        }

        ranges.push(TimeRange::new(
            start.offset_by_secs(-options.lead_secs),
            end.offset_by_secs(options.trail_secs),
        ));
    }

    debug!("Selected {} range(s) for keyword \"{}\"", ranges.len(), keyword);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitle::document::SubtitleDocument;

    fn blocks_from(srt: &str) -> Vec<SubtitleBlock> {
        SubtitleDocument::from_bytes(srt.as_bytes()).blocks()
    }

    const THREE_BLOCKS: &str = "1\n00:00:00,000 --> 00:00:02,000\nsome lead-in\n\n\
                                2\n00:00:02,000 --> 00:00:05,000\nI ate an apple\n\n\
                                3\n00:00:05,000 --> 00:00:08,000\nand left";

    #[test]
    fn test_context_widening() {
        let blocks = blocks_from(THREE_BLOCKS);
        let ranges = select_ranges(&blocks, "apple", &SelectionOptions::default());

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start.to_srt(), "00:00:00,000");
        assert_eq!(ranges[0].end.to_srt(), "00:00:08,000");
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let blocks = blocks_from(THREE_BLOCKS);
        let ranges = select_ranges(&blocks, "APPLE", &SelectionOptions::default());
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_first_block_match_keeps_own_start() {
        let blocks = blocks_from(THREE_BLOCKS);
        let ranges = select_ranges(&blocks, "lead-in", &SelectionOptions::default());

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start.to_srt(), "00:00:00,000");
        // Successor still widens the end.
        assert_eq!(ranges[0].end.to_srt(), "00:00:05,000");
    }

    #[test]
    fn test_last_block_match_keeps_own_end() {
        let blocks = blocks_from(THREE_BLOCKS);
        let ranges = select_ranges(&blocks, "left", &SelectionOptions::default());

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start.to_srt(), "00:00:02,000");
        assert_eq!(ranges[0].end.to_srt(), "00:00:08,000");
    }

    #[test]
    fn test_no_match_yields_empty_list() {
        let blocks = blocks_from(THREE_BLOCKS);
        let ranges = select_ranges(&blocks, "banana", &SelectionOptions::default());
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_adjacent_matches_keep_overlapping_ranges() {
        let srt = "1\n00:00:00,000 --> 00:00:02,000\napple pie\n\n\
                   2\n00:00:02,000 --> 00:00:05,000\napple sauce\n\n\
                   3\n00:00:05,000 --> 00:00:08,000\nnothing";
        let blocks = blocks_from(srt);
        let ranges = select_ranges(&blocks, "apple", &SelectionOptions::default());

        // No dedup or merge: two overlapping ranges, in document order.
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].start.to_srt(), "00:00:00,000");
        assert_eq!(ranges[0].end.to_srt(), "00:00:05,000");
        assert_eq!(ranges[1].start.to_srt(), "00:00:00,000");
        assert_eq!(ranges[1].end.to_srt(), "00:00:08,000");
    }

    #[test]
    fn test_neighbor_without_timestamp_keeps_baseline() {
        let srt = "junk header\n\n\
                   1\n00:00:02,000 --> 00:00:05,000\napple\n\n\
                   more junk";
        let blocks = blocks_from(srt);
        let ranges = select_ranges(&blocks, "apple", &SelectionOptions::default());

        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start.to_srt(), "00:00:02,000");
        assert_eq!(ranges[0].end.to_srt(), "00:00:05,000");
    }

    #[test]
    fn test_matching_block_without_timestamp_is_skipped() {
        let blocks = blocks_from("apple appears here with no timing\n\n1\n00:00:01,000 --> 00:00:02,000\nplain");
        let ranges = select_ranges(&blocks, "apple", &SelectionOptions::default());
        assert!(ranges.is_empty());
    }

    #[test]
    fn test_lead_trail_padding_clamps() {
        let blocks = blocks_from(THREE_BLOCKS);
        let options = SelectionOptions {
            context_blocks: 0,
            lead_secs: 10,
            trail_secs: 2,
        };
        let ranges = select_ranges(&blocks, "apple", &options);

        assert_eq!(ranges.len(), 1);
        // 2s start minus 10s lead clamps to zero.
        assert_eq!(ranges[0].start.to_srt(), "00:00:00,000");
        assert_eq!(ranges[0].end.to_srt(), "00:00:07,000");
    }
}
