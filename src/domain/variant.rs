// ============================================================
// Layer 3 — Dataset Variant
// ============================================================
// Each supported motion-capture corpus fixes a handful of
// constants: where it lives on disk, how many joints its
// skeleton has, its frame rate, the width of one pose vector
// and the shortest clip we are willing to train on.
//
//   variant | joints | fps  | pose_dim | min_len | max_len
//   --------+--------+------+----------+---------+--------
//   t2m     |   22   | 20.0 |   263    |   40    |  196
//   kit     |   21   | 12.5 |   251    |   24    |  196
//
// Reference: HumanML3D / KIT-ML dataset layouts

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Clips at or above this many frames never enter the index.
pub const MAX_CLIP_FRAMES: usize = 200;

/// Which corpus a dataset is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetVariant {
    T2m,
    Kit,
}

impl DatasetVariant {
    pub fn default_root(&self) -> PathBuf {
        match self {
            Self::T2m => PathBuf::from("/local_datasets/HumanML3D"),
            Self::Kit => PathBuf::from("./dataset/KIT-ML"),
        }
    }

    /// Directory holding `mean.npy` and `std.npy`.
    pub fn default_meta_dir(&self) -> PathBuf {
        match self {
            Self::T2m => PathBuf::from("checkpoints/t2m/Decomp_SP001_SM001_H512/meta"),
            Self::Kit => PathBuf::from("checkpoints/kit/VQVAEV3_CB1024_CMT_H1024_NRES3/meta"),
        }
    }

    pub fn joints_num(&self) -> usize {
        match self {
            Self::T2m => 22,
            Self::Kit => 21,
        }
    }

    pub fn fps(&self) -> f32 {
        match self {
            Self::T2m => 20.0,
            Self::Kit => 12.5,
        }
    }

    pub fn pose_dim(&self) -> usize {
        match self {
            Self::T2m => 263,
            Self::Kit => 251,
        }
    }

    /// Padded horizon every materialised sample is brought up to.
    pub fn max_motion_length(&self) -> usize {
        196
    }

    pub fn min_motion_len(&self) -> usize {
        match self {
            Self::T2m => 40,
            Self::Kit => 24,
        }
    }

    /// True when `len` lies in `[min_motion_len, MAX_CLIP_FRAMES)`.
    pub fn accepts_length(&self, len: usize) -> bool {
        len >= self.min_motion_len() && len < MAX_CLIP_FRAMES
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::T2m => "t2m",
            Self::Kit => "kit",
        }
    }
}

impl fmt::Display for DatasetVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t2m" => Ok(Self::T2m),
            "kit" => Ok(Self::Kit),
            other => bail!("Unknown dataset '{other}', expected 't2m' or 'kit'"),
        }
    }
}

// ─── Split ────────────────────────────────────────────────────────────────────
/// Which split-list file to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    /// Resolve the `is_train` / `is_test` flag pair.
    ///
    /// Training data must be requested with `is_test` left unset;
    /// otherwise `Some(true)` picks the test split and anything else
    /// falls back to validation.
    pub fn resolve(is_train: bool, is_test: Option<bool>) -> Result<Self> {
        if is_train {
            if is_test.is_some() {
                bail!("is_test must be unset when is_train is requested");
            }
            return Ok(Self::Train);
        }
        Ok(match is_test {
            Some(true) => Self::Test,
            _ => Self::Val,
        })
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Train => "train.txt",
            Self::Val => "val.txt",
            Self::Test => "test.txt",
        }
    }
}
