// ============================================================
// Layer 4 — Text2Motion Dataset
// ============================================================
// Ties the pieces of the data pipeline together and exposes
// them through Burn's Dataset trait:
//
//   DatasetOptions ──► MotionTextFiles + NormStats   (fatal if missing)
//                 ──► MotionTextIndex               (built once)
//                 ──► SampleMaterializer            (per access)
//
// The index is immutable after construction apart from the
// visibility pointer, which is moved on the main thread
// before a DataLoader is built. Workers only read.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

use anyhow::{ensure, Result};
use burn::data::dataset::Dataset;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::body_parts::JointPartSplitter;
use crate::data::index::MotionTextIndex;
use crate::data::loader::MotionTextFiles;
use crate::data::materializer::{MaterializerConfig, MotionTextSample, SampleMaterializer};
use crate::data::normalizer::NormStats;
use crate::domain::traits::{PartSplitter, SharedJointPolicy, WordVectorizer};
use crate::domain::variant::{DatasetVariant, Split};

// ─── DatasetOptions ───────────────────────────────────────────────────────────
/// Everything needed to construct a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetOptions {
    pub dataset_name:  DatasetVariant,
    /// `None` is required when `is_train` is set.
    pub is_test:       Option<bool>,
    pub is_train:      bool,
    pub max_text_len:  usize,
    pub unit_length:   usize,
    pub print_warning: bool,
    /// Overrides the variant's default dataset root.
    pub data_root:     Option<PathBuf>,
    /// Overrides the variant's default statistics directory.
    pub meta_dir:      Option<PathBuf>,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            dataset_name:  DatasetVariant::T2m,
            is_test:       None,
            is_train:      true,
            max_text_len:  20,
            unit_length:   4,
            print_warning: false,
            data_root:     None,
            meta_dir:      None,
        }
    }
}

impl DatasetOptions {
    pub fn root(&self) -> PathBuf {
        self.data_root.clone().unwrap_or_else(|| self.dataset_name.default_root())
    }

    pub fn meta(&self) -> PathBuf {
        self.meta_dir.clone().unwrap_or_else(|| self.dataset_name.default_meta_dir())
    }
}

// ─── Text2MotionDataset ───────────────────────────────────────────────────────
#[derive(Clone)]
pub struct Text2MotionDataset {
    variant:      DatasetVariant,
    split:        Split,
    index:        MotionTextIndex,
    materializer: SampleMaterializer,
}

impl Text2MotionDataset {
    /// Load stats, read the split and index it.
    pub fn new(opts: &DatasetOptions, vectorizer: Arc<dyn WordVectorizer>) -> Result<Self> {
        Self::with_rng(opts, vectorizer, &mut rand::thread_rng())
    }

    /// Same as `new`, drawing sub-clip name prefixes from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(
        opts:       &DatasetOptions,
        vectorizer: Arc<dyn WordVectorizer>,
        rng:        &mut R,
    ) -> Result<Self> {
        let variant = opts.dataset_name;
        let split   = Split::resolve(opts.is_train, opts.is_test)?;
        ensure!(opts.unit_length > 0, "unit_length must be positive");

        let files = MotionTextFiles::open(opts.root())?;
        let stats = NormStats::load(&opts.meta(), variant.pose_dim())?;

        let ids = files.read_split(split)?;
        tracing::info!("Read {} ids from '{}'", ids.len(), files.split_path(split).display());

        let index = MotionTextIndex::build(&files, &ids, variant, opts.print_warning, rng)?;

        let materializer = SampleMaterializer::new(
            MaterializerConfig {
                max_text_len:      opts.max_text_len,
                unit_length:       opts.unit_length,
                max_motion_length: variant.max_motion_length(),
            },
            Arc::new(stats),
            vectorizer,
            Arc::new(JointPartSplitter::for_variant(variant)),
        )?;

        Ok(Self { variant, split, index, materializer })
    }

    /// Assemble from parts already in memory.
    pub fn from_parts(
        variant:      DatasetVariant,
        split:        Split,
        index:        MotionTextIndex,
        materializer: SampleMaterializer,
    ) -> Self {
        Self { variant, split, index, materializer }
    }

    pub fn variant(&self) -> DatasetVariant {
        self.variant
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn index(&self) -> &MotionTextIndex {
        &self.index
    }

    /// Hide entries shorter than `length`.
    pub fn set_visibility_threshold(&mut self, length: usize) -> Result<usize> {
        self.index.set_visibility_threshold(length)
    }

    pub fn count(&self) -> usize {
        self.index.count()
    }

    /// Materialise the `i`-th visible entry with the given rng.
    pub fn sample_at<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> Result<MotionTextSample> {
        let entry = self.index.visible(i).ok_or_else(|| {
            anyhow::anyhow!("sample {} out of range ({} visible)", i, self.count())
        })?;
        self.materializer.materialize(entry, rng)
    }

    pub fn forward_transform(&self, motion: &Array2<f32>) -> Array2<f32> {
        self.materializer.stats().forward_transform(motion)
    }

    pub fn inv_transform(&self, motion: &Array2<f32>) -> Array2<f32> {
        self.materializer.stats().inv_transform(motion)
    }

    pub fn whole_to_parts(&self, motion: &Array2<f32>) -> Vec<Array2<f32>> {
        self.materializer.splitter().split(motion)
    }

    pub fn parts_to_whole(&self, parts: &[Array2<f32>], policy: SharedJointPolicy) -> Array2<f32> {
        self.materializer.splitter().merge(parts, policy)
    }
}

impl Dataset<MotionTextSample> for Text2MotionDataset {
    fn get(&self, index: usize) -> Option<MotionTextSample> {
        match self.sample_at(index, &mut rand::thread_rng()) {
            Ok(sample) => Some(sample),
            Err(e) => {
                tracing::warn!("Cannot materialise sample {}: {:#}", index, e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.count()
    }
}
