mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Commands, TransformArgs};
use passynth_rs::prelude::*;
use passynth_srnet::{Device, OnnxSrnetEngine, PassthroughEngine, StyleTransferEngine};
use std::sync::Arc;

async fn run_transform(args: &TransformArgs) -> Result<TransformResult> {
  passynth_rs::logging::init(!args.quiet);

  let renderer = Arc::new(FontSkeletonRenderer::from_path(&args.font).await?);
  let engine: Arc<dyn StyleTransferEngine> = if args.skeleton_only {
    Arc::new(PassthroughEngine::new())
  } else {
    Arc::new(OnnxSrnetEngine::from_path(
      &args.model_path,
      Device::from_gpu_index(args.gpu),
    )?)
  };

  let mut transformer = PassportTransformer::new(args.options(), engine, renderer);
  transformer.transform_all().await
}

fn print_content(count: usize, seed: Option<u64>) -> Result<()> {
  let records = generate_contents(count, seed);
  println!("{}", serde_json::to_string_pretty(&records)?);
  Ok(())
}

#[tokio::main]
async fn main() {
  let args = Args::parse();

  match args.command {
    Commands::Version => {
      println!("passynth {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Content { count, seed } => {
      if let Err(e) = print_content(count, seed) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
      }
    }
    Commands::Transform(transform) => match run_transform(&transform).await {
      Ok(result) => {
        let summary = serde_json::json!({
          "written": result.outputs.len(),
          "failed": result.failed_images,
        });
        println!("{}", summary);
        if !result.success {
          std::process::exit(1);
        }
      }
      Err(e) => {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
      }
    },
  }
}
