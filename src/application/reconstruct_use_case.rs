// ============================================================
// Layer 2 — ReconstructUseCase
// ============================================================
// Runs one batch through TemporalEncoder → TemporalDecoder and
// measures how far the output is from the input. The models
// are freshly initialised; nothing is trained or saved.
//
//   Step 1: Build encoder/decoder configs   (Layer 5 - ml)
//   Step 2: Get an input batch
//             dataset → DataLoader → first batch   (Layer 4)
//             or a random [batch, dim, frames] tensor
//   Step 3: Forward pass + MSE over the common length

use anyhow::{anyhow, ensure, Context, Result};
use burn::{
    backend::NdArray,
    data::dataloader::DataLoader,
    prelude::*,
    tensor::{Distribution, ElementConversion},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc};

use crate::data::{
    batcher::{build_loader, MotionTextBatcher},
    dataset::{DatasetOptions, Text2MotionDataset},
};
use crate::infra::vectorizer::GloveVectorizer;
use crate::ml::model::{TemporalDecoderConfig, TemporalEncoderConfig};

type AppBackend = NdArray<f32>;

/// Where the input batch comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconstructInput {
    Dataset {
        options:      DatasetOptions,
        glove_dir:    PathBuf,
        glove_prefix: String,
        threshold:    Option<usize>,
        shuffle_seed: Option<u64>,
        num_workers:  usize,
    },
    Random {
        channels: usize,
        frames:   usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructConfig {
    pub input:        ReconstructInput,
    pub batch_size:   usize,
    /// JSON file holding a `TemporalEncoderConfig`.
    pub model_config: Option<PathBuf>,
    pub width:        usize,
    pub depth:        usize,
    pub down_t:       usize,
    pub latent_width: usize,
}

/// Shapes and error of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructReport {
    pub input_shape:  [usize; 3],
    pub latent_shape: [usize; 3],
    pub output_shape: [usize; 3],
    pub mse:          f32,
    pub names:        Vec<String>,
}

pub struct ReconstructUseCase {
    config: ReconstructConfig,
}

impl ReconstructUseCase {
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ReconstructReport> {
        let device = Default::default();
        let (input, names) = self.input_batch(&device)?;
        let [_, channels, _] = input.dims();

        let enc_cfg = self.encoder_config(channels)?;
        let encoder = enc_cfg.init::<AppBackend>(&device);
        let decoder = TemporalDecoderConfig::mirror(&enc_cfg).init::<AppBackend>(&device);
        tracing::info!(
            "Encoder: width {}, depth {}, {} downsampling stages, latent width {}",
            enc_cfg.width,
            enc_cfg.depth,
            enc_cfg.down_t,
            enc_cfg.output_emb_width
        );

        let latent = encoder.forward(input.clone());
        let output = decoder.forward(latent.clone());

        Ok(ReconstructReport {
            input_shape:  input.dims(),
            latent_shape: latent.dims(),
            output_shape: output.dims(),
            mse:          mse_over_common_length(input, output),
            names,
        })
    }

    fn encoder_config(&self, channels: usize) -> Result<TemporalEncoderConfig> {
        let cfg = &self.config;
        let enc = match &cfg.model_config {
            Some(path) => TemporalEncoderConfig::load(path)
                .map_err(|e| anyhow!("Cannot load model config '{}': {:?}", path.display(), e))?,
            None => TemporalEncoderConfig::new()
                .with_width(cfg.width)
                .with_depth(cfg.depth)
                .with_down_t(cfg.down_t)
                .with_output_emb_width(cfg.latent_width)
                .with_input_emb_width(channels),
        };
        ensure!(
            enc.input_emb_width == channels,
            "model expects {} input channels but the batch has {}",
            enc.input_emb_width,
            channels
        );
        Ok(enc)
    }

    /// `[batch, channels, frames]` plus the sample names, if any.
    fn input_batch(&self, device: &<AppBackend as Backend>::Device) -> Result<(Tensor<AppBackend, 3>, Vec<String>)> {
        match &self.config.input {
            ReconstructInput::Random { channels, frames } => {
                let shape = [self.config.batch_size, *channels, *frames];
                Ok((Tensor::random(shape, Distribution::Normal(0.0, 1.0), device), Vec::new()))
            }
            ReconstructInput::Dataset { options, glove_dir, glove_prefix, threshold, shuffle_seed, num_workers } => {
                let vectorizer = GloveVectorizer::load(glove_dir, glove_prefix)?;
                let mut dataset = Text2MotionDataset::new(options, Arc::new(vectorizer))?;
                if let Some(threshold) = threshold {
                    dataset.set_visibility_threshold(*threshold)?;
                }
                ensure!(dataset.count() > 0, "no visible entries to reconstruct");

                let loader = build_loader(
                    dataset,
                    MotionTextBatcher::<AppBackend>::new(device.clone()),
                    self.config.batch_size,
                    *shuffle_seed,
                    *num_workers,
                );
                let batch = loader.iter().next().context("data loader produced no batch")?;
                // [N, T, D] → [N, D, T]
                Ok((batch.motions.swap_dims(1, 2), batch.names))
            }
        }
    }
}

/// Mean squared error over the frames both tensors have.
fn mse_over_common_length<B: Backend>(input: Tensor<B, 3>, output: Tensor<B, 3>) -> f32 {
    let [n, c, t_in] = input.dims();
    let t = t_in.min(output.dims()[2]);
    let diff = input.slice([0..n, 0..c, 0..t]) - output.slice([0..n, 0..c, 0..t]);
    diff.powf_scalar(2.0).mean().into_scalar().elem::<f32>()
}
