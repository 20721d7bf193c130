// ============================================================
// Layer 3 — Caption Annotation
// ============================================================
// One line of a caption file describes one caption:
//
//   caption#token1 token2 ...#start_seconds#end_seconds
//
//   "a person walks#a/DET person/NOUN walk/VERB#0.0#0.0"
//
// Tokens are `word/POS` pairs produced by an upstream tagger.
// A 0.0/0.0 time tag means the caption covers the whole
// motion; any other pair selects a sub-clip of it.
//
// Reference: HumanML3D text annotation format

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// A `[start, end)` window in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f32,
    pub end:   f32,
}

impl TimeWindow {
    /// Frame range for this window, `frame = floor(time * fps)`,
    /// clamped to `[0, total_frames]`. An inverted window yields an
    /// empty range.
    pub fn frame_range(&self, fps: f32, total_frames: usize) -> (usize, usize) {
        let to_frame = |t: f32| ((t as f64 * fps as f64).max(0.0) as usize).min(total_frames);
        let start = to_frame(self.start);
        let end   = to_frame(self.end).max(start);
        (start, end)
    }
}

/// One caption attached to a motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionAnnotation {
    pub caption: String,
    pub tokens:  Vec<String>,
    /// `None` when the caption covers the whole motion.
    pub window:  Option<TimeWindow>,
}

impl CaptionAnnotation {
    /// Parse one `caption#tokens#start#end` line.
    /// NaN time tags are read as 0.0.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim().split('#').collect();
        if fields.len() < 4 {
            return Err(anyhow!(
                "expected 4 '#'-separated fields, found {} in {:?}",
                fields.len(),
                line
            ));
        }

        let caption = fields[0].to_string();
        let tokens  = fields[1].split(' ').map(str::to_string).collect();
        let start   = parse_tag(fields[2])?;
        let end     = parse_tag(fields[3])?;

        let window = if start == 0.0 && end == 0.0 {
            None
        } else {
            Some(TimeWindow { start, end })
        };

        Ok(Self { caption, tokens, window })
    }

    pub fn covers_whole_motion(&self) -> bool {
        self.window.is_none()
    }
}

fn parse_tag(raw: &str) -> Result<f32> {
    let value: f32 = raw
        .trim()
        .parse()
        .with_context(|| format!("invalid time tag {raw:?}"))?;
    Ok(if value.is_nan() { 0.0 } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_motion_caption() {
        let c = CaptionAnnotation::parse_line("a person walks#a/DET person/NOUN walks/VERB#0.0#0.0\n")
            .unwrap();
        assert_eq!(c.caption, "a person walks");
        assert_eq!(c.tokens, vec!["a/DET", "person/NOUN", "walks/VERB"]);
        assert!(c.covers_whole_motion());
    }

    #[test]
    fn test_nan_tags_become_whole_motion() {
        let c = CaptionAnnotation::parse_line("jump#jump/VERB#nan#NaN").unwrap();
        assert!(c.covers_whole_motion());
    }

    #[test]
    fn test_windowed_caption_frames() {
        let c = CaptionAnnotation::parse_line("a person turns#turn/VERB#1.0#2.0").unwrap();
        let w = c.window.unwrap();
        assert_eq!(w.frame_range(20.0, 50), (20, 40));
        // KIT runs at 12.5 fps: 1.0s → 12.5 → frame 12
        assert_eq!(w.frame_range(12.5, 50), (12, 25));
    }

    #[test]
    fn test_kit_half_frames_truncate() {
        let w = TimeWindow { start: 1.0, end: 3.0 };
        assert_eq!(w.frame_range(12.5, 199), (12, 37));
    }

    #[test]
    fn test_window_clamped_to_motion() {
        let w = TimeWindow { start: 2.0, end: 9.0 };
        assert_eq!(w.frame_range(20.0, 50), (40, 50));
        let inverted = TimeWindow { start: 2.0, end: 1.0 };
        assert_eq!(inverted.frame_range(20.0, 50), (40, 40));
    }

    #[test]
    fn test_malformed_lines() {
        assert!(CaptionAnnotation::parse_line("only a caption").is_err());
        assert!(CaptionAnnotation::parse_line("c#t/NOUN#abc#1.0").is_err());
    }
}
