//! Timed-lyric synchronization
//!
//! Timestamps arrive as strings like `"01:23.45"` (or `"1:02:03"` for
//! very long tracks). The active line is the last one whose timestamp
//! is at or before the playback position; before the first line there
//! is no active line.

use mellow_core::LyricLine;

/// Parse a colon-separated timestamp into seconds
///
/// Each segment multiplies the running total by sixty, so `mm:ss`,
/// `hh:mm:ss` and a bare seconds value all work. Returns `None` for
/// anything non-numeric.
pub fn parse_timestamp(timestamp: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in timestamp.split(':') {
        let value: f64 = part.trim().parse().ok()?;
        total = total * 60.0 + value;
    }
    Some(total)
}

/// Index of the lyric line active at `elapsed` seconds
///
/// Lines with unparseable timestamps are skipped. `None` means the
/// position is before the first parseable line.
pub fn active_line(lyrics: &[LyricLine], elapsed: f64) -> Option<usize> {
    for (i, line) in lyrics.iter().enumerate().rev() {
        if let Some(time) = parse_timestamp(&line.time) {
            if time <= elapsed {
                return Some(i);
            }
        }
    }
    None
}

/// Remembers the active line so position updates only report changes
#[derive(Debug, Default)]
pub(crate) struct LyricTracker {
    current: Option<usize>,
}

impl LyricTracker {
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Record a new active line, returning it only when it differs
    /// from the previous one
    pub fn observe(&mut self, index: Option<usize>) -> Option<Option<usize>> {
        if index == self.current {
            None
        } else {
            self.current = index;
            Some(index)
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(time: &str, text: &str) -> LyricLine {
        LyricLine {
            time: time.to_string(),
            text: text.to_string(),
        }
    }

    fn sample() -> Vec<LyricLine> {
        vec![
            line("00:05.00", "first"),
            line("00:10.50", "second"),
            line("01:00", "third"),
        ]
    }

    #[test]
    fn parses_minute_second_timestamps() {
        assert_eq!(parse_timestamp("00:05.00"), Some(5.0));
        assert_eq!(parse_timestamp("01:23.45"), Some(83.45));
        assert_eq!(parse_timestamp("1:02:03"), Some(3723.0));
        assert_eq!(parse_timestamp("42"), Some(42.0));
    }

    #[test]
    fn rejects_non_numeric_timestamps() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("ab:cd"), None);
        assert_eq!(parse_timestamp("00:xx"), None);
    }

    #[test]
    fn no_active_line_before_the_first() {
        assert_eq!(active_line(&sample(), 0.0), None);
        assert_eq!(active_line(&sample(), 4.99), None);
    }

    #[test]
    fn active_line_is_last_at_or_before_position() {
        let lyrics = sample();
        assert_eq!(active_line(&lyrics, 5.0), Some(0));
        assert_eq!(active_line(&lyrics, 10.49), Some(0));
        assert_eq!(active_line(&lyrics, 10.5), Some(1));
        assert_eq!(active_line(&lyrics, 59.9), Some(1));
        assert_eq!(active_line(&lyrics, 60.0), Some(2));
        assert_eq!(active_line(&lyrics, 9999.0), Some(2));
    }

    #[test]
    fn scrubbing_is_monotonic_in_position() {
        let lyrics = sample();
        let mut last = None;
        for tenths in 0..700 {
            let index = active_line(&lyrics, f64::from(tenths) / 10.0);
            assert!(index >= last, "index went backwards at {tenths}");
            last = index;
        }
    }

    #[test]
    fn unparseable_lines_are_skipped() {
        let lyrics = vec![line("bad", "x"), line("00:05", "y")];
        assert_eq!(active_line(&lyrics, 6.0), Some(1));
        assert_eq!(active_line(&lyrics, 1.0), None);
    }

    #[test]
    fn tracker_reports_changes_only() {
        let mut tracker = LyricTracker::default();
        assert_eq!(tracker.observe(None), None);
        assert_eq!(tracker.observe(Some(0)), Some(Some(0)));
        assert_eq!(tracker.observe(Some(0)), None);
        assert_eq!(tracker.observe(Some(1)), Some(Some(1)));

        tracker.reset();
        assert_eq!(tracker.current(), None);
        assert_eq!(tracker.observe(Some(1)), Some(Some(1)));
    }
}
