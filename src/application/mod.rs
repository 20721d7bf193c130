// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the data pipeline and the models
// together for one CLI command:
//
//   index_use_case       — build the index for a split and
//                          report what was kept or skipped
//   sample_use_case      — materialise one visible sample
//   reconstruct_use_case — run encoder → decoder on a batch
//
// Rules for this layer:
//   - No tensor math or array maths here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Index a split and summarise the load report
pub mod index_use_case;

// Materialise a single sample
pub mod sample_use_case;

// Forward pass through the temporal encoder/decoder
pub mod reconstruct_use_case;
