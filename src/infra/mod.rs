// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concrete implementations of capabilities the data pipeline
// only knows through traits:
//
//   vectorizer.rs — GloVe word vectors + POS one-hots,
//                   loaded from .npy / .json files.
//
// Reference: Rust Book §7 (Modules)

/// GloVe word vectorizer
pub mod vectorizer;
