// ============================================================
// Layer 4 — Normalisation Statistics
// ============================================================
// Per-channel mean and standard deviation, loaded once and
// shared read-only by every sample.
//
//   forward:  (x - mean) / std
//   inverse:   x * std + mean
//
// Broadcasting a (pose_dim,) row over a (frames, pose_dim)
// array is handled by ndarray's arithmetic operators.

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::read_npy;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct NormStats {
    pub mean: Array1<f32>,
    pub std:  Array1<f32>,
}

impl NormStats {
    pub fn new(mean: Array1<f32>, std: Array1<f32>) -> Result<Self> {
        ensure!(
            mean.len() == std.len(),
            "mean has {} channels but std has {}",
            mean.len(),
            std.len()
        );
        Ok(Self { mean, std })
    }

    /// Load `mean.npy` and `std.npy` from `meta_dir` and check they
    /// match `pose_dim`.
    pub fn load(meta_dir: &Path, pose_dim: usize) -> Result<Self> {
        let mean_path = meta_dir.join("mean.npy");
        let std_path  = meta_dir.join("std.npy");

        let mean: Array1<f32> = read_npy(&mean_path)
            .with_context(|| format!("Cannot load mean from '{}'", mean_path.display()))?;
        let std: Array1<f32> = read_npy(&std_path)
            .with_context(|| format!("Cannot load std from '{}'", std_path.display()))?;

        ensure!(
            mean.len() == pose_dim,
            "mean.npy has {} channels, dataset pose_dim is {}",
            mean.len(),
            pose_dim
        );
        Self::new(mean, std)
    }

    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    pub fn forward_transform(&self, motion: &Array2<f32>) -> Array2<f32> {
        (motion - &self.mean) / &self.std
    }

    pub fn inv_transform(&self, motion: &Array2<f32>) -> Array2<f32> {
        motion * &self.std + &self.mean
    }
}
