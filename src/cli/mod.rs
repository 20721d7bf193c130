// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `index`       — index a split, print the load report
//   2. `sample`      — materialise one sample, print shapes
//   3. `reconstruct` — encoder → decoder on one batch, print
//                      shapes and reconstruction MSE
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, IndexArgs, ReconstructArgs, SampleArgs};

use crate::domain::traits::PART_NAMES;

#[derive(Parser, Debug)]
#[command(
    name = "bodypart-t2m",
    version = "0.1.0",
    about = "Index text-to-motion datasets, inspect samples, and run the temporal autoencoder."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case; this layer only routes and prints.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Index(args)       => Self::run_index(args),
            Commands::Sample(args)      => Self::run_sample(args),
            Commands::Reconstruct(args) => Self::run_reconstruct(args),
        }
    }

    fn run_index(args: IndexArgs) -> Result<()> {
        use crate::application::index_use_case::IndexUseCase;

        let summary = IndexUseCase::new(args.into()).execute()?;
        let report  = &summary.report;

        println!("Split:            {:?}", summary.split);
        println!("Ids read:         {}", report.ids_seen);
        println!("Entries indexed:  {} ({} sub-clips)", report.entries_indexed, report.subclips_indexed);
        println!("Sub-clips dropped: {}", report.subclips_dropped);
        println!("Ids skipped:      {}", report.skipped_count());
        for (id, reason) in &report.skipped {
            println!("  {id}: {reason}");
        }
        if let (Some(shortest), Some(longest)) = (summary.shortest, summary.longest) {
            println!("Lengths:          {shortest}..={longest} frames");
        }
        println!(
            "Visible:          {} of {} (threshold {}, pointer {})",
            summary.visible, summary.total, summary.threshold, summary.pointer
        );
        Ok(())
    }

    fn run_sample(args: SampleArgs) -> Result<()> {
        use crate::application::sample_use_case::SampleUseCase;

        let (sample, visible) = SampleUseCase::new(args.into()).execute()?;

        println!("Name:             {} ({} visible)", sample.name, visible);
        println!("Caption:          {}", sample.caption);
        println!("Tokens:           {}", sample.tokens);
        println!("Sentence length:  {}", sample.sent_len);
        println!("Word embeddings:  {:?}", sample.word_embeddings.dim());
        println!("POS one-hots:     {:?}", sample.pos_one_hots.dim());
        println!("Motion:           {:?} ({} real frames)", sample.motion.dim(), sample.m_length);
        for (name, part) in PART_NAMES.iter().zip(&sample.parts) {
            println!("  {:<9} {:?}", name, part.dim());
        }
        Ok(())
    }

    fn run_reconstruct(args: ReconstructArgs) -> Result<()> {
        use crate::application::reconstruct_use_case::ReconstructUseCase;

        let report = ReconstructUseCase::new(args.into()).execute()?;

        if !report.names.is_empty() {
            println!("Batch:            {}", report.names.join(", "));
        }
        println!("Input:            {:?}", report.input_shape);
        println!("Latent:           {:?}", report.latent_shape);
        println!("Output:           {:?}", report.output_shape);
        println!("Reconstruction MSE: {:.6}", report.mse);
        Ok(())
    }
}
