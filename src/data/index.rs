// ============================================================
// Layer 4 — Motion-Text Index
// ============================================================
// Builds the list of trainable entries from a split once, at
// load time, and then only ever reads it.
//
// For every id in the split:
//
//   load motion ──► NaN? wrong width? length out of bounds? ──► skip id
//        │
//        ▼
//   parse captions ──► malformed line? ──► skip id
//        │
//        ├── 0.0/0.0 captions ──► one entry named <id>
//        └── windowed captions ──► one entry per in-bounds sub-clip,
//                                  named <letter>_<id>
//
// Entries are then sorted by length (stable). A visibility
// pointer into the sorted lengths hides every entry shorter
// than the current threshold, which lets a trainer widen the
// visible set step by step without rebuilding anything.
//
// Reference: Rust Book §8 (Collections)
//            slice::partition_point (binary search)

use anyhow::{ensure, Result};
use ndarray::{s, Array2};
use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;

use crate::data::loader::{parse_captions, MotionTextFiles};
use crate::domain::caption::CaptionAnnotation;
use crate::domain::entry::{DatasetEntry, LoadReport, SkipReason};
use crate::domain::variant::{DatasetVariant, MAX_CLIP_FRAMES};

/// Threshold applied right after construction.
pub const DEFAULT_VISIBILITY_THRESHOLD: usize = 20;

const PREFIX_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVW";

// ─── IdOutcome ────────────────────────────────────────────────────────────────
/// What indexing a single id produced.
#[derive(Debug)]
pub enum IdOutcome {
    Indexed {
        entries:          Vec<DatasetEntry>,
        subclips_dropped: usize,
    },
    /// Nothing indexed. Sub-clips dropped for length before the id was
    /// given up on are still counted.
    Skipped {
        reason:           SkipReason,
        subclips_dropped: usize,
    },
}

impl IdOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason, subclips_dropped: 0 }
    }
}

// ─── MotionTextIndex ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MotionTextIndex {
    /// Sorted ascending by length.
    entries:           Vec<DatasetEntry>,
    /// `entries[i].length()`, kept alongside for the binary search.
    lengths:           Vec<usize>,
    /// Upper bound for the visibility threshold.
    max_motion_length: usize,
    /// Shortest visible length, as last set.
    threshold:         usize,
    /// First visible entry; everything before it is hidden.
    pointer:           usize,
    /// What happened to every id of the split.
    report:            LoadReport,
}

impl MotionTextIndex {
    /// Index every id of a split. Per-id failures are recorded in the
    /// load report and never abort the load.
    pub fn build<R: Rng + ?Sized>(
        files:         &MotionTextFiles,
        ids:           &[String],
        variant:       DatasetVariant,
        print_warning: bool,
        rng:           &mut R,
    ) -> Result<Self> {
        let mut report = LoadReport { ids_seen: ids.len(), ..LoadReport::default() };
        let mut taken: HashSet<String> = HashSet::new();
        let mut entries: Vec<DatasetEntry> = Vec::new();

        for id in ids {
            match index_id(files, id, variant, &taken, rng) {
                IdOutcome::Indexed { entries: found, subclips_dropped } => {
                    report.subclips_dropped += subclips_dropped;
                    report.subclips_indexed += found.iter().filter(|e| e.name != *id).count();
                    for entry in found {
                        taken.insert(entry.name.clone());
                        entries.push(entry);
                    }
                }
                IdOutcome::Skipped { reason, subclips_dropped } => {
                    report.subclips_dropped += subclips_dropped;
                    if print_warning && reason != SkipReason::NoUsableCaption {
                        tracing::warn!("Skip the motion '{}': {}", id, reason);
                    }
                    report.skipped.push((id.clone(), reason));
                }
            }
        }

        report.entries_indexed = entries.len();
        tracing::info!(
            "Indexed {} entries ({} sub-clips) from {} ids, {} ids skipped",
            report.entries_indexed,
            report.subclips_indexed,
            report.ids_seen,
            report.skipped_count(),
        );

        let mut index = Self::from_entries(entries, variant.max_motion_length())?;
        index.report = report;
        Ok(index)
    }

    /// Wrap already-built entries. Sorts them by length and applies
    /// the default visibility threshold.
    pub fn from_entries(mut entries: Vec<DatasetEntry>, max_motion_length: usize) -> Result<Self> {
        entries.sort_by_key(DatasetEntry::length);
        let lengths = entries.iter().map(DatasetEntry::length).collect();

        let mut index = Self {
            entries,
            lengths,
            max_motion_length,
            threshold: 0,
            pointer: 0,
            report: LoadReport::default(),
        };
        index.set_visibility_threshold(DEFAULT_VISIBILITY_THRESHOLD.min(max_motion_length))?;
        Ok(index)
    }

    /// Hide every entry shorter than `length`. Returns the new pointer.
    ///
    /// `length` above the global maximum motion length is rejected.
    pub fn set_visibility_threshold(&mut self, length: usize) -> Result<usize> {
        ensure!(
            length <= self.max_motion_length,
            "visibility threshold {} exceeds max motion length {}",
            length,
            self.max_motion_length
        );
        self.pointer   = self.lengths.partition_point(|&l| l < length);
        self.threshold = length;
        tracing::info!("Pointer pointing at {}", self.pointer);
        Ok(self.pointer)
    }

    /// Number of visible entries.
    pub fn count(&self) -> usize {
        self.entries.len() - self.pointer
    }

    /// The `i`-th visible entry.
    pub fn visible(&self, i: usize) -> Option<&DatasetEntry> {
        self.entries.get(self.pointer.checked_add(i)?)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn max_motion_length(&self) -> usize {
        self.max_motion_length
    }

    /// Every entry, visible or not, shortest first.
    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

// ─── Per-id indexing ──────────────────────────────────────────────────────────
fn index_id<R: Rng + ?Sized>(
    files:   &MotionTextFiles,
    id:      &str,
    variant: DatasetVariant,
    taken:   &HashSet<String>,
    rng:     &mut R,
) -> IdOutcome {
    if taken.contains(id) {
        return IdOutcome::skipped(SkipReason::DuplicateId);
    }

    let motion = match files.load_motion(id) {
        Ok(m) => m,
        Err(e) => return IdOutcome::skipped(SkipReason::Unreadable(format!("{e:#}"))),
    };
    if let Some(reason) = check_motion(&motion, variant) {
        return IdOutcome::skipped(reason);
    }

    let captions = match files.read_caption_lines(id) {
        Ok(lines) => match parse_captions(&lines) {
            Ok(c) => c,
            Err(e) => return IdOutcome::skipped(SkipReason::MalformedCaption(format!("{e:#}"))),
        },
        Err(e) => return IdOutcome::skipped(SkipReason::Unreadable(format!("{e:#}"))),
    };

    let (entries, subclips_dropped) = split_by_captions(id, motion, captions, variant, taken, rng);
    if entries.is_empty() {
        return IdOutcome::Skipped { reason: SkipReason::NoUsableCaption, subclips_dropped };
    }
    IdOutcome::Indexed { entries, subclips_dropped }
}

fn check_motion(motion: &Array2<f32>, variant: DatasetVariant) -> Option<SkipReason> {
    if motion.iter().any(|v| v.is_nan()) {
        return Some(SkipReason::NanInMotion);
    }
    if motion.ncols() != variant.pose_dim() {
        return Some(SkipReason::PoseDimMismatch { found: motion.ncols(), expected: variant.pose_dim() });
    }
    if !variant.accepts_length(motion.nrows()) {
        return Some(SkipReason::LengthOutOfBounds {
            length: motion.nrows(),
            min:    variant.min_motion_len(),
            max:    MAX_CLIP_FRAMES,
        });
    }
    None
}

/// Turn one motion and its captions into entries.
///
/// Sub-clip entries come first, in caption order; the whole-motion
/// entry (if any caption covers the whole motion) comes last.
/// Returns the entries and the number of sub-clips dropped for length.
pub fn split_by_captions<R: Rng + ?Sized>(
    id:       &str,
    motion:   Array2<f32>,
    captions: Vec<CaptionAnnotation>,
    variant:  DatasetVariant,
    taken:    &HashSet<String>,
    rng:      &mut R,
) -> (Vec<DatasetEntry>, usize) {
    let mut entries: Vec<DatasetEntry> = Vec::new();
    let mut whole: Vec<CaptionAnnotation> = Vec::new();
    let mut dropped = 0;
    let mut local_taken: HashSet<String> = HashSet::new();

    for caption in captions {
        let Some(window) = caption.window else {
            whole.push(caption);
            continue;
        };

        let (start, end) = window.frame_range(variant.fps(), motion.nrows());
        if !variant.accepts_length(end - start) {
            dropped += 1;
            continue;
        }

        let name = fresh_subclip_name(id, |n| taken.contains(n) || local_taken.contains(n), rng);
        local_taken.insert(name.clone());
        let clip = motion.slice(s![start..end, ..]).to_owned();
        entries.push(DatasetEntry::new(name, clip, vec![caption]));
    }

    if !whole.is_empty() {
        entries.push(DatasetEntry::new(id, motion, whole));
    }

    (entries, dropped)
}

/// A random `<letter>_<id>` name not yet in use. Once every letter is
/// taken for this id, a counter is appended to the letter.
fn fresh_subclip_name<R, F>(id: &str, is_taken: F, rng: &mut R) -> String
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    let free: Vec<String> = PREFIX_LETTERS
        .iter()
        .map(|&c| format!("{}_{}", c as char, id))
        .filter(|n| !is_taken(n))
        .collect();
    if let Some(name) = free.choose(rng) {
        return name.clone();
    }

    let letter = PREFIX_LETTERS[rng.gen_range(0..PREFIX_LETTERS.len())] as char;
    let mut k = 1usize;
    loop {
        let name = format!("{letter}{k}_{id}");
        if !is_taken(&name) {
            return name;
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::fixtures::*;
    use rand::{rngs::StdRng, SeedableRng};

    const DIM: usize = 263;

    fn build(root: &std::path::Path, ids: &[&str]) -> MotionTextIndex {
        let files = MotionTextFiles::open(root).unwrap();
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(7);
        MotionTextIndex::build(&files, &ids, DatasetVariant::T2m, true, &mut rng).unwrap()
    }

    #[test]
    fn test_single_whole_motion_entry() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_motion(dir.path(), "000001", &ramp_motion(50, DIM));
        write_captions(dir.path(), "000001", &["a person walks#a/DET person/NOUN walks/VERB#0.0#0.0"]);

        let index = build(dir.path(), &["000001"]);
        assert_eq!(index.total(), 1);
        let e = &index.entries()[0];
        assert_eq!(e.name, "000001");
        assert_eq!(e.length(), 50);
        assert_eq!(e.captions.len(), 1);
    }

    #[test]
    fn test_short_subclip_excluded_silently() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_motion(dir.path(), "000001", &ramp_motion(50, DIM));
        write_captions(dir.path(), "000001", &["a person turns#turn/VERB#1.0#2.0"]);

        let index = build(dir.path(), &["000001"]);
        assert_eq!(index.total(), 0);
        assert_eq!(index.report().subclips_dropped, 1);
        assert_eq!(index.report().reason_for("000001"), Some(&SkipReason::NoUsableCaption));
    }

    #[test]
    fn test_dropped_subclips_summed_over_kept_and_skipped_ids() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_motion(dir.path(), "000001", &ramp_motion(50, DIM));
        write_captions(dir.path(), "000001", &["turns#turn/VERB#1.0#2.0", "hops#hop/VERB#0.5#1.0"]);
        write_motion(dir.path(), "000002", &ramp_motion(90, DIM));
        write_captions(dir.path(), "000002", &["walks#walk/VERB#0.0#0.0", "waves#wave/VERB#1.0#2.5"]);

        let index = build(dir.path(), &["000001", "000002"]);
        assert_eq!(index.total(), 1);
        assert_eq!(index.report().subclips_dropped, 3);
        assert_eq!(index.report().skipped_count(), 1);
    }

    #[test]
    fn test_subclip_entries_get_prefixed_names() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_motion(dir.path(), "000001", &ramp_motion(120, DIM));
        write_captions(
            dir.path(),
            "000001",
            &[
                "walks#walk/VERB#0.0#0.0",
                "turns#turn/VERB#1.0#4.0",
                "waves#wave/VERB#2.0#5.0",
            ],
        );

        let index = build(dir.path(), &["000001"]);
        assert_eq!(index.total(), 3);
        assert_eq!(index.report().subclips_indexed, 2);

        let clips: Vec<&DatasetEntry> = index.entries().iter().filter(|e| e.name != "000001").collect();
        for clip in &clips {
            assert_eq!(clip.length(), 60);
            assert_eq!(clip.captions.len(), 1);
            assert!(clip.name.ends_with("_000001"));
            assert_eq!(clip.name.len(), "A_000001".len());
        }
        // sub-clip [20, 80) starts at frame 20 of the ramp
        let turn = clips.iter().find(|c| c.captions[0].caption == "turns").unwrap();
        assert_eq!(turn.motion[[0, 0]], 20.0);
        assert_ne!(clips[0].name, clips[1].name);

        let whole = index.entries().iter().find(|e| e.name == "000001").unwrap();
        assert_eq!(whole.length(), 120);
        assert_eq!(whole.captions.len(), 1);
    }

    #[test]
    fn test_bad_ids_are_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());

        let mut nan = ramp_motion(60, DIM);
        nan[[3, 3]] = f32::NAN;
        write_motion(dir.path(), "nan", &nan);
        write_captions(dir.path(), "nan", &["x#x/NOUN#0.0#0.0"]);

        write_motion(dir.path(), "short", &ramp_motion(10, DIM));
        write_captions(dir.path(), "short", &["x#x/NOUN#0.0#0.0"]);

        write_motion(dir.path(), "long", &ramp_motion(200, DIM));
        write_captions(dir.path(), "long", &["x#x/NOUN#0.0#0.0"]);

        write_motion(dir.path(), "narrow", &ramp_motion(60, 12));
        write_captions(dir.path(), "narrow", &["x#x/NOUN#0.0#0.0"]);

        write_motion(dir.path(), "garbled", &ramp_motion(60, DIM));
        write_captions(dir.path(), "garbled", &["no separators here"]);

        write_motion(dir.path(), "good", &ramp_motion(60, DIM));
        write_captions(dir.path(), "good", &["x#x/NOUN#0.0#0.0"]);

        let index = build(
            dir.path(),
            &["nan", "short", "long", "narrow", "garbled", "missing", "good", "good"],
        );
        let report = index.report();
        assert_eq!(index.total(), 1);
        assert_eq!(report.ids_seen, 8);
        assert_eq!(report.reason_for("nan"), Some(&SkipReason::NanInMotion));
        assert!(matches!(report.reason_for("short"), Some(SkipReason::LengthOutOfBounds { length: 10, .. })));
        assert!(matches!(report.reason_for("long"), Some(SkipReason::LengthOutOfBounds { length: 200, .. })));
        assert!(matches!(report.reason_for("narrow"), Some(SkipReason::PoseDimMismatch { found: 12, .. })));
        assert!(matches!(report.reason_for("garbled"), Some(SkipReason::MalformedCaption(_))));
        assert!(matches!(report.reason_for("missing"), Some(SkipReason::Unreadable(_))));
        assert_eq!(report.reason_for("good"), Some(&SkipReason::DuplicateId));
    }

    fn entry(name: &str, len: usize) -> DatasetEntry {
        DatasetEntry::new(name, Array2::zeros((len, 4)), Vec::new())
    }

    #[test]
    fn test_entries_sorted_and_bounded() {
        let lens = [120, 45, 80, 45, 199, 60];
        let entries = lens.iter().enumerate().map(|(i, &l)| entry(&i.to_string(), l)).collect();
        let index = MotionTextIndex::from_entries(entries, 196).unwrap();

        assert_eq!(index.lengths(), &[45, 45, 60, 80, 120, 199]);
        // stable: the two 45-frame entries keep insertion order
        assert_eq!(index.entries()[0].name, "1");
        assert_eq!(index.entries()[1].name, "3");
    }

    #[test]
    fn test_visibility_threshold_counts() {
        let lens = [40, 40, 52, 64, 64, 100, 150, 199];
        let entries = lens.iter().enumerate().map(|(i, &l)| entry(&i.to_string(), l)).collect();
        let mut index = MotionTextIndex::from_entries(entries, 196).unwrap();
        assert_eq!(index.threshold(), DEFAULT_VISIBILITY_THRESHOLD);
        assert_eq!(index.count(), 8);

        for threshold in 0..=196 {
            index.set_visibility_threshold(threshold).unwrap();
            let expected = lens.iter().filter(|&&l| l >= threshold).count();
            assert_eq!(index.count(), expected, "threshold {threshold}");
        }

        index.set_visibility_threshold(64).unwrap();
        assert_eq!(index.pointer(), 3);
        assert_eq!(index.visible(0).unwrap().length(), 64);
        assert_eq!(index.visible(4).unwrap().length(), 199);
        assert!(index.visible(5).is_none());
    }

    #[test]
    fn test_threshold_above_max_is_rejected() {
        let mut index = MotionTextIndex::from_entries(vec![entry("a", 50)], 196).unwrap();
        index.set_visibility_threshold(100).unwrap();
        assert!(index.set_visibility_threshold(197).is_err());
        // a rejected call leaves the previous pointer in place
        assert_eq!(index.threshold(), 100);
        assert_eq!(index.count(), 0);
    }

    #[test]
    fn test_subclip_names_unique_when_letters_run_out() {
        let motion = ramp_motion(199, DIM);
        let captions: Vec<CaptionAnnotation> = (0..40)
            .map(|_| CaptionAnnotation::parse_line("c#c/NOUN#0.5#3.0").unwrap())
            .collect();
        let taken = HashSet::new();
        let mut rng = StdRng::seed_from_u64(1);

        let (entries, dropped) =
            split_by_captions("000042", motion, captions, DatasetVariant::T2m, &taken, &mut rng);
        assert_eq!(dropped, 0);
        assert_eq!(entries.len(), 40);
        let names: HashSet<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 40);
        assert!(entries.iter().all(|e| e.length() == 50));
    }
}
