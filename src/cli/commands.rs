// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `index`, `sample` and
// `reconstruct`, and all their configurable flags.
//
// Flags shared by several commands live in flattened Args
// structs. Every command's arguments convert with `From` into
// the matching application config, so the application layer
// never sees clap types.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::application::{
    index_use_case::IndexConfig,
    reconstruct_use_case::{ReconstructConfig, ReconstructInput},
    sample_use_case::SampleConfig,
};
use crate::data::dataset::DatasetOptions;
use crate::domain::variant::DatasetVariant;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index a split and report kept/skipped motions
    Index(IndexArgs),

    /// Materialise one sample and print its shapes
    Sample(SampleArgs),

    /// Run a batch through the temporal encoder and decoder
    Reconstruct(ReconstructArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitArg {
    Train,
    Val,
    Test,
}

/// Which dataset and split to read.
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset variant: t2m (HumanML3D) or kit (KIT-ML)
    #[arg(long, default_value = "t2m")]
    pub dataset: DatasetVariant,

    #[arg(long, value_enum, default_value_t = SplitArg::Train)]
    pub split: SplitArg,

    /// Dataset root; defaults to the variant's usual location
    #[arg(long)]
    pub data_root: Option<PathBuf>,

    /// Directory holding mean.npy and std.npy
    #[arg(long)]
    pub meta_dir: Option<PathBuf>,

    /// Caption tokens kept before sos/eos are added
    #[arg(long, default_value_t = 20)]
    pub max_text_len: usize,

    /// Motion lengths are rounded down to a multiple of this
    #[arg(long, default_value_t = 4)]
    pub unit_length: usize,

    /// Log every skipped motion
    #[arg(long)]
    pub print_warning: bool,
}

impl From<DatasetArgs> for DatasetOptions {
    fn from(a: DatasetArgs) -> Self {
        let (is_train, is_test) = match a.split {
            SplitArg::Train => (true, None),
            SplitArg::Val   => (false, Some(false)),
            SplitArg::Test  => (false, Some(true)),
        };
        DatasetOptions {
            dataset_name:  a.dataset,
            is_test,
            is_train,
            max_text_len:  a.max_text_len,
            unit_length:   a.unit_length,
            print_warning: a.print_warning,
            data_root:     a.data_root,
            meta_dir:      a.meta_dir,
        }
    }
}

/// Where the GloVe files are.
#[derive(Args, Debug, Clone)]
pub struct GloveArgs {
    #[arg(long, default_value = "./glove")]
    pub glove_dir: PathBuf,

    /// Files are <prefix>_data.npy and <prefix>_words.json
    #[arg(long, default_value = "our_vab")]
    pub glove_prefix: String,
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    /// Hide entries shorter than this many frames
    #[arg(long)]
    pub threshold: Option<usize>,
}

impl From<IndexArgs> for IndexConfig {
    fn from(a: IndexArgs) -> Self {
        IndexConfig { dataset: a.data.into(), threshold: a.threshold }
    }
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    #[command(flatten)]
    pub glove: GloveArgs,

    /// Position among the visible entries (shortest first)
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Seed for caption choice and cropping
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub threshold: Option<usize>,
}

impl From<SampleArgs> for SampleConfig {
    fn from(a: SampleArgs) -> Self {
        SampleConfig {
            dataset:      a.data.into(),
            glove_dir:    a.glove.glove_dir,
            glove_prefix: a.glove.glove_prefix,
            index:        a.index,
            seed:         a.seed,
            threshold:    a.threshold,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReconstructArgs {
    #[command(flatten)]
    pub data: DatasetArgs,

    #[command(flatten)]
    pub glove: GloveArgs,

    /// Use a random tensor instead of reading the dataset
    #[arg(long)]
    pub random: bool,

    /// Channels of the random input (defaults to the variant's pose dim)
    #[arg(long)]
    pub channels: Option<usize>,

    /// Frames of the random input
    #[arg(long, default_value_t = 64)]
    pub frames: usize,

    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 1)]
    pub num_workers: usize,

    /// Shuffle the data loader with this seed
    #[arg(long)]
    pub shuffle_seed: Option<u64>,

    #[arg(long)]
    pub threshold: Option<usize>,

    /// JSON encoder config; overrides the size flags below
    #[arg(long)]
    pub model_config: Option<PathBuf>,

    /// Hidden channels of the encoder/decoder
    #[arg(long, default_value_t = 512)]
    pub width: usize,

    /// Residual blocks per stage
    #[arg(long, default_value_t = 3)]
    pub depth: usize,

    /// Downsampling stages; time shrinks by 2^down_t
    #[arg(long, default_value_t = 3)]
    pub down_t: usize,

    /// Channels of the latent sequence
    #[arg(long, default_value_t = 512)]
    pub latent_width: usize,
}

impl From<ReconstructArgs> for ReconstructConfig {
    fn from(a: ReconstructArgs) -> Self {
        let input = if a.random {
            ReconstructInput::Random {
                channels: a.channels.unwrap_or_else(|| a.data.dataset.pose_dim()),
                frames:   a.frames,
            }
        } else {
            ReconstructInput::Dataset {
                options:      a.data.into(),
                glove_dir:    a.glove.glove_dir,
                glove_prefix: a.glove.glove_prefix,
                threshold:    a.threshold,
                shuffle_seed: a.shuffle_seed,
                num_workers:  a.num_workers,
            }
        };
        ReconstructConfig {
            input,
            batch_size:   a.batch_size,
            model_config: a.model_config,
            width:        a.width,
            depth:        a.depth,
            down_t:       a.down_t,
            latent_width: a.latent_width,
        }
    }
}
