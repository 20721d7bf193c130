use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        Embedding, EmbeddingConfig, PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::resnet::{Resnet1d, Resnet1dConfig};

// #[derive(Config)] already generates Clone and Serialize/Deserialize,
// adding them again gives conflicting impls.
#[derive(Config, Debug)]
pub struct TemporalEncoderConfig {
    /// Channels of the raw motion signal.
    #[config(default = 3)]
    pub input_emb_width:      usize,
    /// Channels of the latent code.
    #[config(default = 512)]
    pub output_emb_width:     usize,
    #[config(default = 3)]
    pub down_t:               usize,
    #[config(default = 2)]
    pub stride_t:             usize,
    #[config(default = 512)]
    pub width:                usize,
    #[config(default = 3)]
    pub depth:                usize,
    #[config(default = 3)]
    pub dilation_growth_rate: usize,
    /// Rows of the learned time embedding.
    #[config(default = 1000)]
    pub max_seq_length:       usize,
}

impl TemporalEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TemporalEncoder<B> {
        let filter_t = self.stride_t * 2;
        let pad_t    = self.stride_t / 2;

        let stem = Conv1dConfig::new(self.input_emb_width, self.width, 3)
            .with_padding(PaddingConfig1d::Explicit(1))
            .init(device);

        let stages = (0..self.down_t)
            .map(|_| DownStage {
                conv: Conv1dConfig::new(self.width, self.width, filter_t)
                    .with_stride(self.stride_t)
                    .with_padding(PaddingConfig1d::Explicit(pad_t))
                    .init(device),
                res: Resnet1dConfig::new(self.width, self.depth)
                    .with_dilation_growth_rate(self.dilation_growth_rate)
                    .init(device),
            })
            .collect();

        let time_embedding = EmbeddingConfig::new(self.max_seq_length, self.width).init(device);
        let output = Conv1dConfig::new(self.width, self.output_emb_width, 3)
            .with_padding(PaddingConfig1d::Explicit(1))
            .init(device);

        TemporalEncoder {
            stem,
            stages,
            time_embedding,
            output,
            max_seq_length: self.max_seq_length,
        }
    }
}

/// Strided conv that shrinks time by `stride_t`, then a residual stack.
#[derive(Module, Debug)]
pub struct DownStage<B: Backend> {
    pub conv: Conv1d<B>,
    pub res:  Resnet1d<B>,
}

impl<B: Backend> DownStage<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.res.forward(self.conv.forward(x))
    }
}

#[derive(Module, Debug)]
pub struct TemporalEncoder<B: Backend> {
    pub stem:           Conv1d<B>,
    pub stages:         Vec<DownStage<B>>,
    pub time_embedding: Embedding<B>,
    pub output:         Conv1d<B>,
    pub max_seq_length: usize,
}

impl<B: Backend> TemporalEncoder<B> {
    /// x: [batch, input_emb_width, time] → [batch, output_emb_width, time']
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut features = relu(self.stem.forward(x));
        for stage in &self.stages {
            features = stage.forward(features);
        }

        // time' depends on the input length, so positions are rebuilt per call.
        let [batch_size, _, t_enc] = features.dims();
        let positions = Tensor::<B, 1, Int>::arange(0..t_enc as i64, &features.device())
            .clamp_max(self.max_seq_length as i64 - 1)
            .unsqueeze::<2>()
            .expand([batch_size, t_enc]);
        let time_emb = self.time_embedding.forward(positions); // [batch, time', width]

        let features = (features.swap_dims(1, 2) + time_emb).swap_dims(1, 2);
        self.output.forward(features)
    }
}

// ─── Decoder ──────────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct TemporalDecoderConfig {
    #[config(default = 3)]
    pub input_emb_width:      usize,
    #[config(default = 512)]
    pub output_emb_width:     usize,
    #[config(default = 3)]
    pub down_t:               usize,
    #[config(default = 512)]
    pub width:                usize,
    #[config(default = 3)]
    pub depth:                usize,
    #[config(default = 3)]
    pub dilation_growth_rate: usize,
}

impl TemporalDecoderConfig {
    /// Decoder matching an encoder's widths and stage count.
    pub fn mirror(enc: &TemporalEncoderConfig) -> Self {
        Self::new()
            .with_input_emb_width(enc.input_emb_width)
            .with_output_emb_width(enc.output_emb_width)
            .with_down_t(enc.down_t)
            .with_width(enc.width)
            .with_depth(enc.depth)
            .with_dilation_growth_rate(enc.dilation_growth_rate)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> TemporalDecoder<B> {
        let conv3 = |c_in: usize, c_out: usize| {
            Conv1dConfig::new(c_in, c_out, 3)
                .with_padding(PaddingConfig1d::Explicit(1))
                .init(device)
        };

        let stages = (0..self.down_t)
            .map(|_| UpStage {
                res: Resnet1dConfig::new(self.width, self.depth)
                    .with_dilation_growth_rate(self.dilation_growth_rate)
                    .with_reverse_dilation(true)
                    .init(device),
                conv: conv3(self.width, self.width),
            })
            .collect();

        TemporalDecoder {
            stem: conv3(self.output_emb_width, self.width),
            stages,
            post: conv3(self.width, self.width),
            output: conv3(self.width, self.input_emb_width),
        }
    }
}

/// Residual stack, nearest-neighbour 2x upsampling, then a conv.
#[derive(Module, Debug)]
pub struct UpStage<B: Backend> {
    pub res:  Resnet1d<B>,
    pub conv: Conv1d<B>,
}

impl<B: Backend> UpStage<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.conv.forward(upsample_nearest_2x(self.res.forward(x)))
    }
}

#[derive(Module, Debug)]
pub struct TemporalDecoder<B: Backend> {
    pub stem:   Conv1d<B>,
    pub stages: Vec<UpStage<B>>,
    pub post:   Conv1d<B>,
    pub output: Conv1d<B>,
}

impl<B: Backend> TemporalDecoder<B> {
    /// z: [batch, output_emb_width, time'] → [batch, input_emb_width, time' * 2^down_t]
    pub fn forward(&self, z: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut x = relu(self.stem.forward(z));
        for stage in &self.stages {
            x = stage.forward(x);
        }
        let x = relu(self.post.forward(x));
        self.output.forward(x)
    }
}

/// [b, c, t] → [b, c, 2t], every step repeated twice.
pub fn upsample_nearest_2x<B: Backend>(x: Tensor<B, 3>) -> Tensor<B, 3> {
    let [b, c, t] = x.dims();
    Tensor::stack::<4>(vec![x.clone(), x], 3).reshape([b, c, t * 2])
}
