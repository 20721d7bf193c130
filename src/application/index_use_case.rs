// ============================================================
// Layer 2 — IndexUseCase
// ============================================================
// Reads a split and builds the motion-text index without
// loading statistics or word vectors:
//
//   Step 1: Resolve the split file     (Layer 3 - domain)
//   Step 2: Read the split ids         (Layer 4 - data)
//   Step 3: Index motions + sub-clips  (Layer 4 - data)
//   Step 4: Move the visibility pointer, if asked

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::data::{dataset::DatasetOptions, index::MotionTextIndex, loader::MotionTextFiles};
use crate::domain::entry::LoadReport;
use crate::domain::variant::Split;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dataset:   DatasetOptions,
    /// Visibility threshold to apply after indexing.
    pub threshold: Option<usize>,
}

/// What the CLI prints after indexing.
#[derive(Debug, Clone)]
pub struct IndexSummary {
    pub split:     Split,
    pub report:    LoadReport,
    pub total:     usize,
    pub visible:   usize,
    pub threshold: usize,
    pub pointer:   usize,
    pub shortest:  Option<usize>,
    pub longest:   Option<usize>,
}

pub struct IndexUseCase {
    config: IndexConfig,
}

impl IndexUseCase {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<IndexSummary> {
        let opts  = &self.config.dataset;
        let split = Split::resolve(opts.is_train, opts.is_test)?;

        let files = MotionTextFiles::open(opts.root())?;
        let ids   = files.read_split(split)?;
        tracing::info!("Indexing {} ids of the {} split", ids.len(), opts.dataset_name);

        let mut index = MotionTextIndex::build(
            &files,
            &ids,
            opts.dataset_name,
            opts.print_warning,
            &mut rand::thread_rng(),
        )?;
        if let Some(threshold) = self.config.threshold {
            index.set_visibility_threshold(threshold)?;
        }

        Ok(IndexSummary {
            split,
            report:    index.report().clone(),
            total:     index.total(),
            visible:   index.count(),
            threshold: index.threshold(),
            pointer:   index.pointer(),
            shortest:  index.lengths().first().copied(),
            longest:   index.lengths().last().copied(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::fixtures::*;
    use crate::domain::entry::SkipReason;

    fn config(root: &std::path::Path, threshold: Option<usize>) -> IndexConfig {
        IndexConfig {
            dataset: DatasetOptions { data_root: Some(root.to_path_buf()), ..DatasetOptions::default() },
            threshold,
        }
    }

    #[test]
    fn test_summary_counts_kept_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_split(dir.path(), "train.txt", &["000001", "000002", "000003"]);
        write_motion(dir.path(), "000001", &ramp_motion(60, 263));
        write_captions(dir.path(), "000001", &["walks#walk/VERB#0.0#0.0"]);
        write_motion(dir.path(), "000002", &ramp_motion(20, 263));
        write_captions(dir.path(), "000002", &["hops#hop/VERB#0.0#0.0"]);
        write_motion(dir.path(), "000003", &ramp_motion(120, 263));
        write_captions(dir.path(), "000003", &["sits#sit/VERB#0.0#0.0"]);

        let summary = IndexUseCase::new(config(dir.path(), Some(100))).execute().unwrap();
        assert_eq!(summary.split, Split::Train);
        assert_eq!(summary.report.ids_seen, 3);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.visible, 1);
        assert_eq!(summary.threshold, 100);
        assert_eq!(summary.pointer, 1);
        assert_eq!((summary.shortest, summary.longest), (Some(60), Some(120)));
        assert!(matches!(
            summary.report.reason_for("000002"),
            Some(SkipReason::LengthOutOfBounds { length: 20, .. })
        ));
    }

    #[test]
    fn test_threshold_above_max_length_fails() {
        let dir = tempfile::tempdir().unwrap();
        dataset_dirs(dir.path());
        write_split(dir.path(), "train.txt", &["000001"]);
        write_motion(dir.path(), "000001", &ramp_motion(60, 263));
        write_captions(dir.path(), "000001", &["walks#walk/VERB#0.0#0.0"]);

        assert!(IndexUseCase::new(config(dir.path(), Some(500))).execute().is_err());
    }
}
