// ============================================================
// Layer 4 — Sample Materializer
// ============================================================
// Turns one indexed entry into one training sample, every time
// the sample is accessed:
//
//   1. pick one caption at random
//   2. wrap tokens in sos/eos, pad with unk (or crop), vectorize
//   3. pick a length mode: "single" (weight 2) or "double"
//      (weight 1) when unit_length < 10, else always "single"
//        single: (len // unit) * unit
//        double: (len // unit - 1) * unit
//   4. crop a random window of that length
//   5. z-normalise
//   6. zero-pad up to max_motion_length frames
//   7. split into six body parts, add a sinusoidal table per part
//
// All randomness comes from the caller's Rng, so a seeded rng
// reproduces a sample exactly.
//
// Reference: Guo et al. (2022) text-to-motion data pipeline

use anyhow::{anyhow, ensure, Result};
use ndarray::{s, Array2, ArrayView1, Axis};
use rand::{seq::SliceRandom, Rng};
use std::sync::Arc;

use crate::data::normalizer::NormStats;
use crate::data::position::PositionTables;
use crate::domain::entry::DatasetEntry;
use crate::domain::traits::{PartSplitter, WordVectorizer};

pub const SOS_TOKEN: &str = "sos/OTHER";
pub const EOS_TOKEN: &str = "eos/OTHER";
pub const PAD_TOKEN: &str = "unk/OTHER";

/// Units at or above this length always use the "single" mode.
const DOUBLE_MODE_MAX_UNIT: usize = 10;

// ─── LengthMode ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthMode {
    Single,
    Double,
}

impl LengthMode {
    /// Draw a mode: single twice as likely as double for short units.
    pub fn pick<R: Rng + ?Sized>(unit_length: usize, rng: &mut R) -> Self {
        if unit_length < DOUBLE_MODE_MAX_UNIT {
            *[Self::Single, Self::Single, Self::Double]
                .choose(rng)
                .unwrap_or(&Self::Single)
        } else {
            Self::Single
        }
    }

    /// Unit-aligned target length for a clip of `orig_len` frames.
    pub fn target_length(&self, orig_len: usize, unit_length: usize) -> usize {
        let units = orig_len / unit_length;
        match self {
            Self::Single => units * unit_length,
            Self::Double => units.saturating_sub(1) * unit_length,
        }
    }
}

// ─── Text padding ─────────────────────────────────────────────────────────────
/// Wrap `tokens` in sos/eos and pad with unk to `max_text_len + 2`,
/// or crop to `max_text_len` first when too long.
/// Returns the token sequence and the sentence length before padding.
pub fn pad_tokens(tokens: &[String], max_text_len: usize) -> (Vec<String>, usize) {
    let kept = &tokens[..tokens.len().min(max_text_len)];

    let mut out = Vec::with_capacity(max_text_len + 2);
    out.push(SOS_TOKEN.to_string());
    out.extend(kept.iter().cloned());
    out.push(EOS_TOKEN.to_string());
    let sent_len = out.len();

    out.resize(max_text_len + 2, PAD_TOKEN.to_string());
    (out, sent_len)
}

// ─── MotionTextSample ─────────────────────────────────────────────────────────
/// One materialised sample.
#[derive(Debug, Clone)]
pub struct MotionTextSample {
    /// `(max_text_len + 2, word_dim)`
    pub word_embeddings: Array2<f32>,
    /// `(max_text_len + 2, pos_dim)`
    pub pos_one_hots:    Array2<f32>,
    /// The caption text the tokens came from.
    pub caption:         String,
    /// Tokens before padding, sos/eos included.
    pub sent_len:        usize,
    /// Normalised and zero-padded, `(max_motion_length, pose_dim)`.
    pub motion:          Array2<f32>,
    /// Frames of real motion before the zero padding.
    pub m_length:        usize,
    /// Padded tokens joined with '_'.
    pub tokens:          String,
    /// Entry name: the motion id, or `<prefix>_<id>` for a sub-clip.
    pub name:            String,
    /// Six position-encoded body parts, `(max_motion_length, width_p)`.
    pub parts:           Vec<Array2<f32>>,
}

impl MotionTextSample {
    /// False when any motion or part value is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.motion.iter().all(|v| v.is_finite())
            && self.parts.iter().all(|p| p.iter().all(|v| v.is_finite()))
    }
}

// ─── SampleMaterializer ───────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy)]
pub struct MaterializerConfig {
    /// Caption tokens kept before sos/eos are added.
    pub max_text_len:      usize,
    /// Motion lengths are cut down to a multiple of this. Must be > 0.
    pub unit_length:       usize,
    /// Frames every sample is zero-padded to.
    pub max_motion_length: usize,
}

/// Turns indexed entries into samples. Shared read-only by every
/// DataLoader worker.

#[derive(Clone)]
pub struct SampleMaterializer {
    cfg:        MaterializerConfig,
    /// Per-channel mean/std used to normalise the cropped window.
    stats:      Arc<NormStats>,
    /// Maps `word/POS` tokens to word vectors and POS one-hots.
    vectorizer: Arc<dyn WordVectorizer>,
    /// Cuts the padded motion into the six body parts.
    splitter:   Arc<dyn PartSplitter>,
    /// One sinusoidal table per part width, built once.
    tables:     PositionTables,
}

impl SampleMaterializer {
    pub fn new(
        cfg:        MaterializerConfig,
        stats:      Arc<NormStats>,
        vectorizer: Arc<dyn WordVectorizer>,
        splitter:   Arc<dyn PartSplitter>,
    ) -> Result<Self> {
        ensure!(cfg.unit_length > 0, "unit_length must be positive");
        let tables = PositionTables::new(splitter.part_widths(), cfg.max_motion_length);
        Ok(Self { cfg, stats, vectorizer, splitter, tables })
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.cfg
    }

    pub fn stats(&self) -> &NormStats {
        &self.stats
    }

    pub fn splitter(&self) -> &dyn PartSplitter {
        self.splitter.as_ref()
    }

    /// Build one sample from `entry`. Fails only when the entry has
    /// no caption.
    pub fn materialize<R: Rng + ?Sized>(&self, entry: &DatasetEntry, rng: &mut R) -> Result<MotionTextSample> {
        let cfg = &self.cfg;

        // ── Caption and text vectors ──────────────────────────────────────────
        let annotation = entry
            .captions
            .choose(rng)
            .ok_or_else(|| anyhow!("entry '{}' has no caption", entry.name))?;
        let (tokens, sent_len) = pad_tokens(&annotation.tokens, cfg.max_text_len);
        let (word_embeddings, pos_one_hots) = self.vectorize(&tokens)?;

        // ── Unit-aligned random window ────────────────────────────────────────
        let orig_len = entry.length();
        let mode     = LengthMode::pick(cfg.unit_length, rng);
        let aligned_cap = cfg.max_motion_length / cfg.unit_length * cfg.unit_length;
        let m_length = mode.target_length(orig_len, cfg.unit_length).min(aligned_cap);

        let start  = rng.gen_range(0..=orig_len - m_length);
        let window = entry.motion.slice(s![start..start + m_length, ..]).to_owned();

        // ── Normalise and pad ─────────────────────────────────────────────────
        let normed = self.stats.forward_transform(&window);
        if normed.iter().any(|v| v.is_nan()) {
            tracing::warn!("Detected NaN in '{}' after normalisation", entry.name);
        }

        let mut motion = Array2::<f32>::zeros((cfg.max_motion_length, normed.ncols()));
        motion.slice_mut(s![..m_length, ..]).assign(&normed);

        // ── Body parts with position encoding ─────────────────────────────────
        let parts = self
            .splitter
            .split(&motion)
            .iter()
            .map(|p| self.tables.apply(p))
            .collect();

        Ok(MotionTextSample {
            word_embeddings,
            pos_one_hots,
            caption: annotation.caption.clone(),
            sent_len,
            motion,
            m_length,
            tokens: tokens.join("_"),
            name: entry.name.clone(),
            parts,
        })
    }

    fn vectorize(&self, tokens: &[String]) -> Result<(Array2<f32>, Array2<f32>)> {
        let vectors: Vec<_> = tokens.iter().map(|t| self.vectorizer.vectorize(t)).collect();
        let words: Vec<ArrayView1<f32>> = vectors.iter().map(|v| v.word.view()).collect();
        let pos: Vec<ArrayView1<f32>> = vectors.iter().map(|v| v.pos.view()).collect();
        Ok((ndarray::stack(Axis(0), &words)?, ndarray::stack(Axis(0), &pos)?))
    }
}


#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::data::position::PositionEncoder;
    use crate::domain::caption::CaptionAnnotation;
    use ndarray::Array1;
    use rand::{rngs::StdRng, SeedableRng};

    const WIDTH: usize = 3;
    const DIM: usize = WIDTH * 6;

    fn with_stats(unit_length: usize, stats: NormStats) -> Result<SampleMaterializer> {
        SampleMaterializer::new(
            MaterializerConfig { max_text_len: 5, unit_length, max_motion_length: 196 },
            Arc::new(stats),
            Arc::new(LenVectorizer),
            Arc::new(EvenSplitter { width: WIDTH }),
        )
    }

    fn materializer(unit_length: usize) -> SampleMaterializer {
        let stats = NormStats::new(Array1::from_elem(DIM, 1.0), Array1::from_elem(DIM, 2.0)).unwrap();
        with_stats(unit_length, stats).unwrap()
    }

    fn entry(len: usize, captions: &[&str]) -> DatasetEntry {
        let motion = Array2::from_shape_fn((len, DIM), |(t, _)| t as f32);
        let captions = captions.iter().map(|l| CaptionAnnotation::parse_line(l).unwrap()).collect();
        DatasetEntry::new("000001", motion, captions)
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pad_short_caption() {
        let (tokens, sent_len) = pad_tokens(&strings(&["a/DET", "man/NOUN"]), 5);
        assert_eq!(sent_len, 4);
        assert_eq!(
            tokens,
            strings(&["sos/OTHER", "a/DET", "man/NOUN", "eos/OTHER", "unk/OTHER", "unk/OTHER", "unk/OTHER"])
        );
    }

    #[test]
    fn test_crop_long_caption() {
        let long: Vec<String> = (0..9).map(|i| format!("w{i}/NOUN")).collect();
        let (tokens, sent_len) = pad_tokens(&long, 5);
        assert_eq!(sent_len, 7);
        assert_eq!(tokens.len(), 7);
        assert_eq!(tokens[5], "w4/NOUN");
        assert_eq!(tokens[6], EOS_TOKEN);
    }

    #[test]
    fn test_caption_of_exactly_max_len_is_cropped_branch() {
        let exact: Vec<String> = (0..5).map(|i| format!("w{i}/NOUN")).collect();
        let (tokens, sent_len) = pad_tokens(&exact, 5);
        assert_eq!(sent_len, 7);
        assert!(!tokens.contains(&PAD_TOKEN.to_string()));
    }

    #[test]
    fn test_length_modes() {
        assert_eq!(LengthMode::Single.target_length(50, 4), 48);
        assert_eq!(LengthMode::Double.target_length(50, 4), 44);
        assert_eq!(LengthMode::Double.target_length(3, 4), 0);

        let mut rng = StdRng::seed_from_u64(3);
        assert!((0..100).all(|_| LengthMode::pick(10, &mut rng) == LengthMode::Single));

        let doubles = (0..3000).filter(|_| LengthMode::pick(4, &mut rng) == LengthMode::Double).count();
        assert!((800..1200).contains(&doubles), "doubles = {doubles}");
    }

    #[test]
    fn test_sample_shapes_and_lengths() {
        let m = materializer(4);
        let e = entry(50, &["a person walks#a/DET person/NOUN walks/VERB#0.0#0.0"]);
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..50 {
            let s = m.materialize(&e, &mut rng).unwrap();
            assert!(s.m_length == 48 || s.m_length == 44, "m_length = {}", s.m_length);
            assert!(s.m_length <= e.length());
            assert_eq!(s.motion.dim(), (196, DIM));
            assert_eq!(s.word_embeddings.dim(), (7, 4));
            assert_eq!(s.pos_one_hots.dim(), (7, 2));
            assert_eq!(s.sent_len, 5);
            assert_eq!(s.caption, "a person walks");
            assert_eq!(s.name, "000001");
            assert_eq!(s.tokens, "sos/OTHER_a/DET_person/NOUN_walks/VERB_eos/OTHER_unk/OTHER_unk/OTHER");
            assert_eq!(s.parts.len(), 6);
            assert!(s.parts.iter().all(|p| p.dim() == (196, WIDTH)));
            assert!(s.is_finite());
            // padding rows stay zero in the full motion
            assert!(s.motion.slice(s![s.m_length.., ..]).iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_window_is_contiguous_and_normalised() {
        let m = materializer(4);
        let e = entry(50, &["x#x/NOUN#0.0#0.0"]);
        let mut rng = StdRng::seed_from_u64(5);
        let s = m.materialize(&e, &mut rng).unwrap();

        // frame t holds t, normalised as (t - 1) / 2
        let first = s.motion[[0, 0]] * 2.0 + 1.0;
        for t in 0..s.m_length {
            let expected = (first + t as f32 - 1.0) / 2.0;
            assert!((s.motion[[t, 0]] - expected).abs() < 1e-5);
        }
        assert!(first >= 0.0 && first as usize + s.m_length <= 50);
    }

    #[test]
    fn test_parts_carry_position_encoding() {
        let m = materializer(4);
        let e = entry(50, &["x#x/NOUN#0.0#0.0"]);
        let mut rng = StdRng::seed_from_u64(9);
        let s = m.materialize(&e, &mut rng).unwrap();

        let pe = PositionEncoder::new(WIDTH, 196);
        let raw = EvenSplitter { width: WIDTH }.split(&s.motion);
        for (encoded, raw) in s.parts.iter().zip(&raw) {
            let diff = encoded - raw;
            assert!(diff.iter().zip(pe.table().iter()).all(|(a, b)| (a - b).abs() < 1e-5));
        }
    }

    #[test]
    fn test_seeded_rng_reproduces_sample() {
        let m = materializer(4);
        let e = entry(90, &["walks#walk/VERB#0.0#0.0", "runs#run/VERB#0.0#0.0", "jumps#jump/VERB#0.0#0.0"]);

        let a = m.materialize(&e, &mut StdRng::seed_from_u64(21)).unwrap();
        let b = m.materialize(&e, &mut StdRng::seed_from_u64(21)).unwrap();
        assert_eq!(a.caption, b.caption);
        assert_eq!(a.m_length, b.m_length);
        assert_eq!(a.motion, b.motion);
    }

    #[test]
    fn test_large_unit_uses_single_mode() {
        let m = materializer(16);
        let e = entry(70, &["x#x/NOUN#0.0#0.0"]);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            assert_eq!(m.materialize(&e, &mut rng).unwrap().m_length, 64);
        }
    }

    #[test]
    fn test_entry_without_caption_fails() {
        let m = materializer(4);
        let e = DatasetEntry::new("empty", Array2::zeros((50, DIM)), Vec::new());
        assert!(m.materialize(&e, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_zero_unit_length_rejected() {
        let stats = NormStats::new(Array1::zeros(DIM), Array1::ones(DIM)).unwrap();
        assert!(with_stats(0, stats).is_err());
    }

    #[test]
    fn test_zero_std_channel_still_returns_sample() {
        let mut std = Array1::from_elem(DIM, 2.0);
        std[0] = 0.0;
        let m = with_stats(4, NormStats::new(Array1::from_elem(DIM, 1.0), std).unwrap()).unwrap();
        let e = entry(60, &["x#x/NOUN#0.0#0.0"]);

        let sample = m.materialize(&e, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(!sample.is_finite());
        assert_eq!(sample.motion.dim(), (196, DIM));
        // only the zero-std channel blows up
        assert!(sample.motion.column(1).iter().all(|v| v.is_finite()));
    }
}
