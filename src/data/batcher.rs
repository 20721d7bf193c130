// ============================================================
// Layer 4 — Motion-Text Batcher
// ============================================================
// Implements Burn's Batcher trait to stack materialised
// samples into tensors.
//
// Samples are first sorted by length, longest first (stable),
// because packed-sequence consumers downstream expect
// descending lengths. The default key is the motion length;
// BatchOrder::SentenceLength sorts on the caption length
// instead, for text encoders that pack the word sequences. Every array field is then flattened
// row-major and reshaped:
//
//   word_embeddings [N, S, word_dim]
//   pos_one_hots    [N, S, pos_dim]
//   motions         [N, T, pose_dim]
//   parts[p]        [N, T, width_p]     (six of them)
//   sent_lens       [N]
//   m_lengths       [N]
//
// Strings (captions, joined tokens, names) stay as Vec<String>
// in the same sorted order. `build_loader` puts the batcher
// behind burn's DataLoaderBuilder.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::{
        dataloader::{batcher::Batcher, DataLoader, DataLoaderBuilder},
        dataset::Dataset,
    },
    prelude::*,
    tensor::TensorData,
};
use ndarray::Array2;
use std::sync::Arc;

use crate::data::materializer::MotionTextSample;

// ─── BatchOrder ───────────────────────────────────────────────────────────────
/// Key the batch is sorted by, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchOrder {
    /// Frames of real motion.
    #[default]
    MotionLength,
    /// Caption tokens including sos/eos.
    SentenceLength,
}

impl BatchOrder {
    fn key(&self, sample: &MotionTextSample) -> usize {
        match self {
            Self::MotionLength => sample.m_length,
            Self::SentenceLength => sample.sent_len,
        }
    }
}

// ─── MotionTextBatch ──────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct MotionTextBatch<B: Backend> {
    /// `[N, max_text_len + 2, word_dim]` word vectors, sos/eos/unk included.
    pub word_embeddings: Tensor<B, 3>,
    /// `[N, max_text_len + 2, pos_dim]` POS one-hots.
    pub pos_one_hots:    Tensor<B, 3>,
    /// Caption text of each sample.
    pub captions:        Vec<String>,
    /// `[N]` caption length with sos/eos, before padding.
    pub sent_lens:       Tensor<B, 1, Int>,
    /// `[N, max_motion_length, pose_dim]` normalised, zero-padded motion.
    pub motions:         Tensor<B, 3>,
    /// `[N]` frames of real motion in each row of `motions`.
    pub m_lengths:       Tensor<B, 1, Int>,
    /// Padded tokens of each sample, joined with '_'.
    pub tokens:          Vec<String>,
    /// Entry names, motion id or sub-clip name.
    pub names:           Vec<String>,
    /// One `[N, T, width_p]` tensor per body part.
    pub parts:           Vec<Tensor<B, 3>>,
}

// ─── MotionTextBatcher ────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct MotionTextBatcher<B: Backend> {
    /// Device every batch tensor is created on.
    pub device: B::Device,
    /// Sort key, applied descending before stacking.
    pub order:  BatchOrder,
}

impl<B: Backend> MotionTextBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device, order: BatchOrder::default() }
    }

    pub fn with_order(mut self, order: BatchOrder) -> Self {
        self.order = order;
        self
    }

    /// Stack same-shaped 2D arrays into `[N, rows, cols]`.
    fn stack<'a>(&self, arrays: impl Iterator<Item = &'a Array2<f32>>) -> Tensor<B, 3> {
        let mut flat: Vec<f32> = Vec::new();
        let mut n = 0;
        let mut dims = (0, 0);
        for a in arrays {
            dims = a.dim();
            flat.extend(a.iter().copied());
            n += 1;
        }
        Tensor::<B, 1>::from_data(TensorData::new(flat, [n * dims.0 * dims.1]), &self.device)
            .reshape([n, dims.0, dims.1])
    }

    fn lengths(&self, values: impl Iterator<Item = usize>) -> Tensor<B, 1, Int> {
        let values: Vec<i64> = values.map(|v| v as i64).collect();
        let n = values.len();
        Tensor::<B, 1, Int>::from_data(TensorData::new(values, [n]), &self.device)
    }
}

impl<B: Backend> Batcher<MotionTextSample, MotionTextBatch<B>> for MotionTextBatcher<B> {
    fn batch(&self, mut items: Vec<MotionTextSample>) -> MotionTextBatch<B> {
        items.sort_by_key(|s| std::cmp::Reverse(self.order.key(s)));

        let num_parts = items.first().map(|s| s.parts.len()).unwrap_or(0);
        let parts = (0..num_parts)
            .map(|p| self.stack(items.iter().map(|s| &s.parts[p])))
            .collect();

        MotionTextBatch {
            word_embeddings: self.stack(items.iter().map(|s| &s.word_embeddings)),
            pos_one_hots:    self.stack(items.iter().map(|s| &s.pos_one_hots)),
            captions:        items.iter().map(|s| s.caption.clone()).collect(),
            sent_lens:       self.lengths(items.iter().map(|s| s.sent_len)),
            motions:         self.stack(items.iter().map(|s| &s.motion)),
            m_lengths:       self.lengths(items.iter().map(|s| s.m_length)),
            tokens:          items.iter().map(|s| s.tokens.clone()).collect(),
            names:           items.iter().map(|s| s.name.clone()).collect(),
            parts,
        }
    }
}

// ─── DataLoader ───────────────────────────────────────────────────────────────
/// Wrap a dataset in burn's DataLoader. The final partial batch is kept.
///
/// burn splits the dataset across workers, so at least one worker is
/// always used; `num_workers = 0` runs with one.
pub fn build_loader<B, D>(
    dataset:      D,
    batcher:      MotionTextBatcher<B>,
    batch_size:   usize,
    shuffle_seed: Option<u64>,
    num_workers:  usize,
) -> Arc<dyn DataLoader<MotionTextBatch<B>>>
where
    B: Backend,
    D: Dataset<MotionTextSample> + 'static,
{
    let mut builder = DataLoaderBuilder::new(batcher)
        .batch_size(batch_size)
        .num_workers(num_workers.max(1));
    if let Some(seed) = shuffle_seed {
        builder = builder.shuffle(seed);
    }
    builder.build(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::data::dataset::InMemDataset;

    type TestBackend = NdArray<f32>;

    fn sample(name: &str, m_length: usize, sent_len: usize) -> MotionTextSample {
        let fill = m_length as f32;
        MotionTextSample {
            word_embeddings: Array2::from_elem((4, 3), fill),
            pos_one_hots:    Array2::from_elem((4, 2), fill),
            caption:         format!("caption {name}"),
            sent_len,
            motion:          Array2::from_elem((8, 5), fill),
            m_length,
            tokens:          format!("tokens_{name}"),
            name:            name.to_string(),
            parts:           (1..=6).map(|w| Array2::from_elem((8, w), fill)).collect(),
        }
    }

    #[test]
    fn test_batch_sorted_by_motion_length_descending() {
        let batcher = MotionTextBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample("a", 40, 7), sample("b", 64, 5), sample("c", 52, 9), sample("d", 64, 3)]);

        assert_eq!(batch.names, vec!["b", "d", "c", "a"]);
        let lens: Vec<i64> = batch.m_lengths.to_data().to_vec().unwrap();
        assert_eq!(lens, vec![64, 64, 52, 40]);
        assert_eq!(batch.captions[2], "caption c");
        assert_eq!(batch.tokens[3], "tokens_a");
    }

    #[test]
    fn test_batch_sorted_by_sentence_length() {
        let batcher = MotionTextBatcher::<TestBackend>::new(Default::default()).with_order(BatchOrder::SentenceLength);
        let batch = batcher.batch(vec![sample("a", 40, 7), sample("b", 64, 5), sample("c", 52, 9)]);
        assert_eq!(batch.names, vec!["c", "a", "b"]);
        let lens: Vec<i64> = batch.sent_lens.to_data().to_vec().unwrap();
        assert_eq!(lens, vec![9, 7, 5]);
    }

    #[test]
    fn test_batch_shapes_and_rows_follow_order() {
        let batcher = MotionTextBatcher::<TestBackend>::new(Default::default());
        let batch = batcher.batch(vec![sample("a", 40, 7), sample("b", 64, 5)]);

        assert_eq!(batch.word_embeddings.dims(), [2, 4, 3]);
        assert_eq!(batch.pos_one_hots.dims(), [2, 4, 2]);
        assert_eq!(batch.motions.dims(), [2, 8, 5]);
        assert_eq!(batch.parts.len(), 6);
        for (p, part) in batch.parts.iter().enumerate() {
            assert_eq!(part.dims(), [2, 8, p + 1]);
        }

        // first row belongs to "b" (64 frames), filled with 64.0
        let motions: Vec<f32> = batch.motions.to_data().to_vec().unwrap();
        assert!(motions[..40].iter().all(|&v| v == 64.0));
        assert!(motions[40..].iter().all(|&v| v == 40.0));
    }

    #[test]
    fn test_loader_keeps_partial_batch() {
        let samples: Vec<_> = (0..5).map(|i| sample(&format!("s{i}"), 40 + 4 * i, 5)).collect();
        let loader = build_loader(
            InMemDataset::new(samples),
            MotionTextBatcher::<TestBackend>::new(Default::default()),
            3,
            None,
            0,
        );

        let sizes: Vec<usize> = loader.iter().map(|b| b.names.len()).collect();
        assert_eq!(sizes, vec![3, 2]);
    }

    #[test]
    fn test_loader_with_several_workers() {
        let samples: Vec<_> = (0..6).map(|i| sample(&format!("s{i}"), 40, 5)).collect();
        let loader = build_loader(
            InMemDataset::new(samples),
            MotionTextBatcher::<TestBackend>::new(Default::default()),
            2,
            None,
            2,
        );

        let total: usize = loader.iter().map(|b| b.names.len()).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_shuffled_loader_visits_every_sample() {
        let samples: Vec<_> = (0..7).map(|i| sample(&format!("s{i}"), 40, 5)).collect();
        let loader = build_loader(
            InMemDataset::new(samples),
            MotionTextBatcher::<TestBackend>::new(Default::default()),
            2,
            Some(42),
            0,
        );

        let mut names: Vec<String> = loader.iter().flat_map(|b| b.names).collect();
        names.sort();
        assert_eq!(names, (0..7).map(|i| format!("s{i}")).collect::<Vec<_>>());
    }
}
