// ============================================================
// Layer 6 — GloVe Word Vectorizer
// ============================================================
// Loads a pre-extracted GloVe vocabulary and maps `word/POS`
// tokens to (word embedding, POS one-hot) pairs.
//
// Files expected in the vectorizer directory:
//
//   <prefix>_data.npy    (vocab_size, dim) f32 embeddings
//   <prefix>_words.json  ["the", "a", ..., "unk", ...]
//
// POS one-hots have 15 slots. Words that belong to one of the
// motion-specific "VIP" lists (locations, body parts, objects,
// actions, descriptors) are tagged with that list instead of
// their grammatical tag. Words outside the vocabulary fall
// back to the `unk` vector tagged OTHER.
//
// Reference: Pennington et al. (2014) GloVe
//            Guo et al. (2022) text-to-motion word vectorizer

use anyhow::{ensure, Context, Result};
use ndarray::{Array1, Array2};
use ndarray_npy::read_npy;
use std::{collections::HashMap, fs, path::Path};

use crate::domain::traits::{TokenVectors, WordVectorizer};

pub const UNK_WORD: &str = "unk";

/// POS tags in one-hot order.
pub const POS_TAGS: [&str; 15] = [
    "VERB", "NOUN", "DET", "ADP", "NUM", "AUX", "PRON", "ADJ", "ADV",
    "Loc_VIP", "Body_VIP", "Obj_VIP", "Act_VIP", "Desc_VIP", "OTHER",
];

const LOC_LIST: &[&str] = &[
    "left", "right", "clockwise", "counterclockwise", "anticlockwise", "forward", "back",
    "backward", "up", "down", "straight", "curve",
];
const BODY_LIST: &[&str] = &[
    "arm", "chin", "foot", "feet", "face", "hand", "mouth", "leg", "waist", "eye", "knee",
    "shoulder", "thigh",
];
const OBJ_LIST: &[&str] = &[
    "stair", "dumbbell", "chair", "window", "floor", "car", "ball", "handrail", "baseball",
    "basketball",
];
const ACT_LIST: &[&str] = &[
    "walk", "run", "swing", "pick", "bring", "kick", "put", "squat", "throw", "hop", "dance",
    "jump", "turn", "stumble", "stop", "sit", "lift", "lower", "raise", "wash", "stand",
    "kneel", "stroll", "rub", "bend", "balance", "flap", "jog", "shuffle", "lean", "rotate",
    "spin", "spread", "climb",
];
const DESC_LIST: &[&str] = &[
    "slowly", "carefully", "fast", "careful", "slow", "quickly", "happy", "angry", "sad",
    "happily", "angrily", "sadly",
];

/// The VIP tag a word is promoted to, if any.
fn vip_tag(word: &str) -> Option<&'static str> {
    [
        ("Loc_VIP", LOC_LIST),
        ("Body_VIP", BODY_LIST),
        ("Obj_VIP", OBJ_LIST),
        ("Act_VIP", ACT_LIST),
        ("Desc_VIP", DESC_LIST),
    ]
    .into_iter()
    .find(|(_, words)| words.contains(&word))
    .map(|(tag, _)| tag)
}

/// One-hot over POS_TAGS; unknown tags map to OTHER.
pub fn pos_one_hot(tag: &str) -> Array1<f32> {
    let slot = POS_TAGS
        .iter()
        .position(|t| *t == tag)
        .unwrap_or(POS_TAGS.len() - 1);
    let mut v = Array1::zeros(POS_TAGS.len());
    v[slot] = 1.0;
    v
}

pub struct GloveVectorizer {
    vectors: Array2<f32>,
    lookup:  HashMap<String, usize>,
    unk:     usize,
}

impl GloveVectorizer {
    pub fn new(vectors: Array2<f32>, words: Vec<String>) -> Result<Self> {
        ensure!(
            vectors.nrows() == words.len(),
            "{} embeddings but {} words",
            vectors.nrows(),
            words.len()
        );
        let lookup: HashMap<String, usize> = words.into_iter().enumerate().map(|(i, w)| (w, i)).collect();
        let unk = *lookup
            .get(UNK_WORD)
            .with_context(|| format!("vocabulary has no '{UNK_WORD}' entry"))?;
        Ok(Self { vectors, lookup, unk })
    }

    /// Load `<dir>/<prefix>_data.npy` and `<dir>/<prefix>_words.json`.
    pub fn load(dir: &Path, prefix: &str) -> Result<Self> {
        let data_path  = dir.join(format!("{prefix}_data.npy"));
        let words_path = dir.join(format!("{prefix}_words.json"));

        let vectors: Array2<f32> = read_npy(&data_path)
            .with_context(|| format!("Cannot load embeddings '{}'", data_path.display()))?;
        let json = fs::read_to_string(&words_path)
            .with_context(|| format!("Cannot read vocabulary '{}'", words_path.display()))?;
        let words: Vec<String> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid vocabulary JSON '{}'", words_path.display()))?;

        let vectorizer = Self::new(vectors, words)?;
        tracing::info!(
            "Loaded {} word vectors of width {} from '{}'",
            vectorizer.vectors.nrows(),
            vectorizer.word_dim(),
            dir.display()
        );
        Ok(vectorizer)
    }

    pub fn vocab_size(&self) -> usize {
        self.vectors.nrows()
    }
}

impl WordVectorizer for GloveVectorizer {
    fn vectorize(&self, token: &str) -> TokenVectors {
        let (word, tag) = token.split_once('/').unwrap_or((token, "OTHER"));

        match self.lookup.get(word) {
            Some(&row) => TokenVectors {
                word: self.vectors.row(row).to_owned(),
                pos:  pos_one_hot(vip_tag(word).unwrap_or(tag)),
            },
            None => TokenVectors {
                word: self.vectors.row(self.unk).to_owned(),
                pos:  pos_one_hot("OTHER"),
            },
        }
    }

    fn word_dim(&self) -> usize {
        self.vectors.ncols()
    }

    fn pos_dim(&self) -> usize {
        POS_TAGS.len()
    }
}
