// ============================================================
// Layer 2 — SampleUseCase
// ============================================================
// Loads the full dataset (stats + word vectors + index) and
// materialises one visible sample. A seed makes the caption
// choice, length mode and crop reproducible.

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    dataset::{DatasetOptions, Text2MotionDataset},
    materializer::MotionTextSample,
};
use crate::infra::vectorizer::GloveVectorizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    pub dataset:      DatasetOptions,
    pub glove_dir:    PathBuf,
    pub glove_prefix: String,
    /// Position among the visible entries.
    pub index:        usize,
    pub seed:         Option<u64>,
    pub threshold:    Option<usize>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            dataset:      DatasetOptions::default(),
            glove_dir:    PathBuf::from("./glove"),
            glove_prefix: "our_vab".to_string(),
            index:        0,
            seed:         None,
            threshold:    None,
        }
    }
}

pub struct SampleUseCase {
    config: SampleConfig,
}

impl SampleUseCase {
    pub fn new(config: SampleConfig) -> Self {
        Self { config }
    }

    /// Returns the sample and the number of visible entries.
    pub fn execute(&self) -> Result<(MotionTextSample, usize)> {
        let cfg = &self.config;
        let vectorizer = GloveVectorizer::load(&cfg.glove_dir, &cfg.glove_prefix)?;
        let mut dataset = Text2MotionDataset::new(&cfg.dataset, Arc::new(vectorizer))?;
        if let Some(threshold) = cfg.threshold {
            dataset.set_visibility_threshold(threshold)?;
        }

        let sample = match cfg.seed {
            Some(seed) => dataset.sample_at(cfg.index, &mut StdRng::seed_from_u64(seed))?,
            None => dataset.sample_at(cfg.index, &mut rand::thread_rng())?,
        };
        if !sample.is_finite() {
            tracing::warn!("Sample '{}' contains non-finite values", sample.name);
        }
        Ok((sample, dataset.count()))
    }
}
