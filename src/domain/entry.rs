// ============================================================
// Layer 3 — Dataset Entry and Load Report
// ============================================================
// A DatasetEntry is one indexed (motion, captions) unit.
// It is either a whole recording (named by its split id) or
// a sub-clip cut out by a time-tagged caption (named by a
// random letter prefix + '_' + id).
//
// Loading is lenient: a bad id is skipped, not fatal. Every
// skip decision is kept in a LoadReport so a caller can see
// exactly what was dropped and why.

use ndarray::Array2;
use std::fmt;

use crate::domain::caption::CaptionAnnotation;

/// One motion span together with the captions describing it.
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub name:     String,
    /// Shape `(frames, pose_dim)`.
    pub motion:   Array2<f32>,
    pub captions: Vec<CaptionAnnotation>,
}

impl DatasetEntry {
    pub fn new(name: impl Into<String>, motion: Array2<f32>, captions: Vec<CaptionAnnotation>) -> Self {
        Self { name: name.into(), motion, captions }
    }

    /// Number of frames.
    pub fn length(&self) -> usize {
        self.motion.nrows()
    }
}

// ─── Skip reasons ─────────────────────────────────────────────────────────────
/// Why a split id contributed nothing to the index.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The motion array contains at least one NaN.
    NanInMotion,
    /// Whole-motion length outside `[min, max)`.
    LengthOutOfBounds { length: usize, min: usize, max: usize },
    /// Motion width differs from the variant's pose dimension.
    PoseDimMismatch { found: usize, expected: usize },
    /// The id was already indexed earlier in the split.
    DuplicateId,
    /// Motion or caption file could not be read or decoded.
    Unreadable(String),
    /// A caption line could not be parsed.
    MalformedCaption(String),
    /// The file parsed fine but no caption produced an entry.
    NoUsableCaption,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NanInMotion => write!(f, "NaN detected in motion"),
            Self::LengthOutOfBounds { length, min, max } => {
                write!(f, "motion length {length} outside [{min}, {max})")
            }
            Self::PoseDimMismatch { found, expected } => {
                write!(f, "motion has {found} channels, expected {expected}")
            }
            Self::DuplicateId => write!(f, "id already indexed"),
            Self::Unreadable(msg) => write!(f, "unable to load: {msg}"),
            Self::MalformedCaption(msg) => write!(f, "malformed caption: {msg}"),
            Self::NoUsableCaption => write!(f, "no caption produced an entry"),
        }
    }
}

/// Outcome of indexing a split.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Ids read from the split file.
    pub ids_seen:         usize,
    /// Entries that made it into the index (whole motions + sub-clips).
    pub entries_indexed:  usize,
    /// Of `entries_indexed`, how many are sub-clips.
    pub subclips_indexed: usize,
    /// Sub-clips dropped for length. Counted, never logged.
    pub subclips_dropped: usize,
    /// Ids that produced nothing, with the reason.
    pub skipped:          Vec<(String, SkipReason)>,
}

impl LoadReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn reason_for(&self, id: &str) -> Option<&SkipReason> {
        self.skipped.iter().find(|(i, _)| i == id).map(|(_, r)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_length_is_frame_count() {
        let e = DatasetEntry::new("000001", Array2::zeros((50, 263)), Vec::new());
        assert_eq!(e.length(), 50);
    }

    #[test]
    fn test_reason_lookup() {
        let mut report = LoadReport::default();
        report.skipped.push(("000002".into(), SkipReason::NanInMotion));
        assert_eq!(report.reason_for("000002"), Some(&SkipReason::NanInMotion));
        assert!(report.reason_for("000003").is_none());
        assert_eq!(
            SkipReason::LengthOutOfBounds { length: 12, min: 40, max: 200 }.to_string(),
            "motion length 12 outside [40, 200)"
        );
    }
}
