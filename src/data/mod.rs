// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from dataset files on disk to tensor batches.
//
//   <root>/{train,val,test}.txt, new_joint_vecs/, texts/
//       │
//       ▼
//   MotionTextFiles     → split ids, .npy motions, caption lines
//       │
//       ▼
//   MotionTextIndex     → validated entries + caption sub-clips,
//       │                 sorted by length, visibility pointer
//       ▼
//   SampleMaterializer  → random caption, random crop, normalise,
//       │                 pad, body parts + position tables
//       ▼
//   Text2MotionDataset  → Burn's Dataset trait
//       │
//       ▼
//   MotionTextBatcher   → length-sorted tensor batches
//       │
//       ▼
//   DataLoader
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Dataset directory layout and file readers
pub mod loader;

/// Per-channel mean/std normalisation
pub mod normalizer;

/// Fixed sinusoidal position tables
pub mod position;

/// Whole-body ↔ six body-part conversion
pub mod body_parts;

/// Length-sorted index of motions and caption sub-clips
pub mod index;

/// One entry → one fixed-shape training sample
pub mod materializer;

/// Implements Burn's Dataset trait over the index
pub mod dataset;

/// Implements Burn's Batcher trait and builds the DataLoader
pub mod batcher;
