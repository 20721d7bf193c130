// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that define what the system works with:
// dataset variants, caption annotations, indexed entries,
// skip reasons, and the capabilities the pipeline consumes.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits (ndarray arrays
//     are the shared currency for motion data)
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Corpus constants and split selection
pub mod variant;

// One parsed line of a caption file
pub mod caption;

// Indexed entries and the load report
pub mod entry;

// Vectorizer and body-part splitter abstractions
pub mod traits;
