// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The temporal convolutional encoder/decoder pair that maps
// motion sequences to a downsampled latent sequence and back.
//
//   resnet.rs — residual stack of dilated 1D convolutions
//   model.rs  — TemporalEncoder (strided downsampling + learned
//               time embedding) and TemporalDecoder (nearest
//               upsampling back to the input length)
//
// No training loop lives here; the models are only run
// forward.
//
// Reference: Burn Book §3 (Building Blocks)
//            Zhang et al. (2023) T2M-GPT motion VQ-VAE

/// Dilated residual 1D convolution stack
pub mod resnet;

/// Temporal encoder and decoder
pub mod model;
