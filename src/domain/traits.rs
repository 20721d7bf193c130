// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Two capabilities the data pipeline depends on but does not
// own:
//
//   WordVectorizer — maps a `word/POS` token to a word
//                    embedding and a part-of-speech one-hot
//   PartSplitter   — cuts a full-body pose sequence into six
//                    body-part channel groups and glues them
//                    back together
//
// The materialiser only ever sees these traits, so tests can
// plug in tiny fakes and production code plugs in the GloVe
// vectorizer and the joint-layout splitter.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

// ─── WordVectorizer ───────────────────────────────────────────────────────────
/// Embedding and POS one-hot for a single token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenVectors {
    pub word: Array1<f32>,
    pub pos:  Array1<f32>,
}

/// Anything that can turn a `word/POS` token into vectors.
///
/// Implementations must resolve unknown words to an "unknown"
/// fallback instead of failing.
pub trait WordVectorizer: Send + Sync {
    fn vectorize(&self, token: &str) -> TokenVectors;

    /// Width of the word embedding.
    fn word_dim(&self) -> usize;

    /// Width of the POS one-hot.
    fn pos_dim(&self) -> usize;
}

// ─── PartSplitter ─────────────────────────────────────────────────────────────
/// Number of body parts a pose is decomposed into.
pub const NUM_PARTS: usize = 6;

/// Body parts in decomposition order.
pub const PART_NAMES: [&str; NUM_PARTS] = ["Root", "R_Leg", "L_Leg", "Backbone", "R_Arm", "L_Arm"];

/// How a joint present in more than one part is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SharedJointPolicy {
    /// Mean of every copy.
    #[default]
    Avg,
    /// Take the backbone's copy.
    Backbone,
}

/// Anything that can decompose a `(frames, pose_dim)` motion into
/// the six body parts and recompose it.
pub trait PartSplitter: Send + Sync {
    /// Channel width of each part, in decomposition order.
    fn part_widths(&self) -> [usize; NUM_PARTS];

    fn split(&self, motion: &Array2<f32>) -> Vec<Array2<f32>>;

    fn merge(&self, parts: &[Array2<f32>], policy: SharedJointPolicy) -> Array2<f32>;
}
