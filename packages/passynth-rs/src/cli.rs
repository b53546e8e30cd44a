//! Command line arguments backing the `passynth` binary.
use clap::{Parser, Subcommand};
use passynth_rs::transformer::{TransformOptions, DEFAULT_ROTATE_LABELS, DEFAULT_SKIP_LABELS};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "passynth",
  about = "Transform text in annotated passport images by means of the SRNet model",
  version
)]
pub struct Args {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Replace the text fields of annotated passports with synthetic content
  Transform(TransformArgs),
  /// Print generated passport records as JSON
  Content {
    /// Number of records to generate
    #[arg(long, short = 'n', default_value = "1")]
    count: usize,

    /// Seed for reproducible records
    #[arg(long)]
    seed: Option<u64>,
  },
}

#[derive(clap::Args, Debug)]
pub struct TransformArgs {
  /// Directory with original passports and their JSON annotations
  #[arg(long, short = 'i', default_value = "./passports/")]
  pub input_path: PathBuf,

  /// Directory to save synthetic images to
  #[arg(long, short = 'o', default_value = "./synthetic_passports/")]
  pub output_path: PathBuf,

  /// SRNet model exported to ONNX
  #[arg(long, short = 'm', default_value = "./model/final.onnx")]
  pub model_path: PathBuf,

  /// GPU for the model; -1 runs on the CPU
  #[arg(long, default_value = "-1", allow_negative_numbers = true)]
  pub gpu: i32,

  /// Font used to render the skeleton text
  #[arg(long, short = 'f', default_value = "arial.ttf")]
  pub font: PathBuf,

  /// Seed for reproducible content
  #[arg(long)]
  pub seed: Option<u64>,

  /// Synthetic images to generate per source image
  #[arg(long, default_value = "1")]
  pub variants: usize,

  /// Prefix output names with the source file name
  #[arg(long)]
  pub keep_names: bool,

  /// Paste the skeleton text without running the model
  #[arg(long)]
  pub skeleton_only: bool,

  /// Label to leave untouched (repeatable, replaces the defaults)
  #[arg(long = "skip-label")]
  pub skip_labels: Vec<String>,

  /// Label whose text runs vertically (repeatable, replaces the defaults)
  #[arg(long = "rotate-label")]
  pub rotate_labels: Vec<String>,

  /// Only report warnings and errors
  #[arg(long)]
  pub quiet: bool,
}

fn labels_or_default(labels: &[String], defaults: &[&str]) -> Vec<String> {
  if labels.is_empty() {
    defaults.iter().map(|s| s.to_string()).collect()
  } else {
    labels.to_vec()
  }
}

impl TransformArgs {
  pub fn options(&self) -> TransformOptions {
    TransformOptions {
      input_dir: self.input_path.clone(),
      output_dir: self.output_path.clone(),
      skip_labels: labels_or_default(&self.skip_labels, DEFAULT_SKIP_LABELS)
        .into_iter()
        .collect(),
      rotate_labels: labels_or_default(&self.rotate_labels, DEFAULT_ROTATE_LABELS)
        .into_iter()
        .collect(),
      variants: self.variants.max(1),
      keep_names: self.keep_names,
      seed: self.seed,
      verbose: !self.quiet,
      ..Default::default()
    }
  }
}
