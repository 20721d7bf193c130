use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::relu,
};

/// A stack of residual dilated 1D convolutions that keeps both the
/// channel count and the sequence length.
#[derive(Config, Debug)]
pub struct Resnet1dConfig {
    pub width: usize,
    pub depth: usize,
    #[config(default = 3)]
    pub dilation_growth_rate: usize,
    /// Largest dilation first (used on the decoder side).
    #[config(default = false)]
    pub reverse_dilation: bool,
}

impl Resnet1dConfig {
    /// Dilation of each block, in application order.
    pub fn dilations(&self) -> Vec<usize> {
        let mut dilations: Vec<usize> = (0..self.depth)
            .map(|d| self.dilation_growth_rate.pow(d as u32))
            .collect();
        if self.reverse_dilation {
            dilations.reverse();
        }
        dilations
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Resnet1d<B> {
        let blocks = self
            .dilations()
            .into_iter()
            .map(|dilation| ResConv1dBlock {
                // padding = dilation keeps the length for kernel 3
                dilated: Conv1dConfig::new(self.width, self.width, 3)
                    .with_dilation(dilation)
                    .with_padding(PaddingConfig1d::Explicit(dilation))
                    .init(device),
                pointwise: Conv1dConfig::new(self.width, self.width, 1).init(device),
            })
            .collect();
        Resnet1d { blocks }
    }
}

/// relu → dilated conv(k=3) → relu → conv(k=1), plus the input.
#[derive(Module, Debug)]
pub struct ResConv1dBlock<B: Backend> {
    pub dilated:   Conv1d<B>,
    pub pointwise: Conv1d<B>,
}

impl<B: Backend> ResConv1dBlock<B> {
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let h = self.dilated.forward(relu(x.clone()));
        let h = self.pointwise.forward(relu(h));
        x + h
    }
}

#[derive(Module, Debug)]
pub struct Resnet1d<B: Backend> {
    pub blocks: Vec<ResConv1dBlock<B>>,
}

impl<B: Backend> Resnet1d<B> {
    /// `[batch, width, time]` → same shape.
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.blocks.iter().fold(x, |h, block| block.forward(h))
    }
}
