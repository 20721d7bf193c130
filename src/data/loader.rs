// ============================================================
// Layer 4 — Motion/Text File Loader
// ============================================================
// Resolves the on-disk layout of a dataset variant and reads
// its files. Nothing here decides what to keep: the indexer
// does that.
//
//   <root>/
//     train.txt | val.txt | test.txt   ← one id per line
//     new_joint_vecs/<id>.npy          ← (frames, pose_dim) f32
//     texts/<id>.txt                   ← caption#tokens#start#end
//   <meta>/
//     mean.npy, std.npy                ← (pose_dim,) f32
//
// Missing directories are fatal at construction; a single
// unreadable id is returned as an error for the caller to skip.
//
// Reference: ndarray-npy crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{ensure, Context, Result};
use ndarray::Array2;
use ndarray_npy::read_npy;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::caption::CaptionAnnotation;
use crate::domain::variant::Split;

/// Paths of one dataset on disk.
#[derive(Debug, Clone)]
pub struct MotionTextFiles {
    root:       PathBuf,
    motion_dir: PathBuf,
    text_dir:   PathBuf,
}

impl MotionTextFiles {
    /// Point at a dataset root. Fails if the root or its
    /// motion/text subdirectories are missing.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let motion_dir = root.join("new_joint_vecs");
        let text_dir   = root.join("texts");

        for dir in [&root, &motion_dir, &text_dir] {
            ensure!(dir.is_dir(), "Dataset directory '{}' does not exist", dir.display());
        }

        Ok(Self { root, motion_dir, text_dir })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.root.join(split.file_name())
    }

    /// Read the ids listed in a split file, one per line.
    /// Blank lines are ignored.
    pub fn read_split(&self, split: Split) -> Result<Vec<String>> {
        let path = self.split_path(split);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read split file '{}'", path.display()))?;

        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn load_motion(&self, id: &str) -> Result<Array2<f32>> {
        let path = self.motion_dir.join(format!("{id}.npy"));
        read_npy(&path).with_context(|| format!("Cannot decode motion '{}'", path.display()))
    }

    /// Raw caption lines for `id`, one per caption.
    pub fn read_caption_lines(&self, id: &str) -> Result<Vec<String>> {
        let path = self.text_dir.join(format!("{id}.txt"));
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read captions '{}'", path.display()))?;

        Ok(text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// Parse every caption line; the first malformed one aborts.
pub fn parse_captions(lines: &[String]) -> Result<Vec<CaptionAnnotation>> {
    lines.iter().map(|l| CaptionAnnotation::parse_line(l)).collect()
}

// ─── Test fixtures ────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod fixtures {
    use ndarray::{Array1, Array2};
    use ndarray_npy::write_npy;
    use std::{fs, path::Path};

    /// Create `<root>/{new_joint_vecs,texts}` and `<root>/meta`.
    pub fn dataset_dirs(root: &Path) {
        fs::create_dir_all(root.join("new_joint_vecs")).unwrap();
        fs::create_dir_all(root.join("texts")).unwrap();
        fs::create_dir_all(root.join("meta")).unwrap();
    }

    /// Frame `t`, channel `c` holds `t + c / 1000`.
    pub fn ramp_motion(frames: usize, dim: usize) -> Array2<f32> {
        Array2::from_shape_fn((frames, dim), |(t, c)| t as f32 + c as f32 / 1000.0)
    }

    pub fn write_motion(root: &Path, id: &str, motion: &Array2<f32>) {
        write_npy(root.join("new_joint_vecs").join(format!("{id}.npy")), motion).unwrap();
    }

    pub fn write_captions(root: &Path, id: &str, lines: &[&str]) {
        fs::write(root.join("texts").join(format!("{id}.txt")), lines.join("\n")).unwrap();
    }

    pub fn write_split(root: &Path, file: &str, ids: &[&str]) {
        fs::write(root.join(file), ids.join("\n")).unwrap();
    }

    pub fn write_stats(root: &Path, dim: usize) {
        write_npy(root.join("meta").join("mean.npy"), &Array1::<f32>::zeros(dim)).unwrap();
        write_npy(root.join("meta").join("std.npy"), &Array1::<f32>::ones(dim)).unwrap();
    }
}
