//! Batch pipeline turning annotated passport scans into synthetic copies: every labeled text
//! field is cropped, re-rendered with new content, styled by the engine and pasted back.
use crate::annotation::{annotation_path_for, Annotation, Shape};
use crate::content::PassportContent;
use crate::region::{extract_region, paste_region, restore_orientation, Orientation};
use crate::skeleton::SkeletonRenderer;
use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use image::{ImageFormat, RgbImage};
use indicatif::{ProgressBar, ProgressStyle};
use passynth_srnet::{StyleInput, StyleTransferEngine};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Image types picked up from the input directory
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".tiff", ".bmp"];

/// Labels that mark non-text regions and are left untouched
pub const DEFAULT_SKIP_LABELS: &[&str] = &["officer_signature", "signature", "photo", "passport"];

/// Labels whose text runs vertically on the page
pub const DEFAULT_ROTATE_LABELS: &[&str] = &["number_group1", "number_group2"];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H.%M.%S.%6f";

fn to_set(items: &[&str]) -> HashSet<String> {
  items.iter().map(|s| s.to_string()).collect()
}

/// Configuration of a transform run.
pub struct TransformOptions {
  pub input_dir: PathBuf,
  pub output_dir: PathBuf,
  pub image_extensions: HashSet<String>,
  pub skip_labels: HashSet<String>,
  pub rotate_labels: HashSet<String>,
  /// Synthetic images generated per source image
  pub variants: usize,
  /// Prefix output names with the source file stem
  pub keep_names: bool,
  pub seed: Option<u64>,
  /// Date treated as "today" by the content generator; the local date when unset
  pub reference_date: Option<NaiveDate>,
  pub verbose: bool,
}

impl Default for TransformOptions {
  fn default() -> Self {
    Self {
      input_dir: PathBuf::from("./passports/"),
      output_dir: PathBuf::from("./synthetic_passports/"),
      image_extensions: to_set(DEFAULT_IMAGE_EXTENSIONS),
      skip_labels: to_set(DEFAULT_SKIP_LABELS),
      rotate_labels: to_set(DEFAULT_ROTATE_LABELS),
      variants: 1,
      keep_names: false,
      seed: None,
      reference_date: None,
      verbose: true,
    }
  }
}

/// What happened to a single labeled shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeOutcome {
  Replaced,
  /// Label is in the skip list
  Ignored,
  /// Label or geometry could not be used
  Skipped,
}

/// Outcome of transforming one source image.
#[derive(Debug, Clone, Default)]
pub struct ImageResult {
  pub outputs: Vec<PathBuf>,
  pub regions_replaced: usize,
  pub regions_skipped: usize,
}

/// Result returned after a transform run.
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
  pub success: bool,
  pub processed_images: usize,
  pub failed_images: usize,
  pub regions_replaced: usize,
  pub regions_skipped: usize,
  pub outputs: Vec<PathBuf>,
}

/// Drives a transform run over every annotated image of the input directory.
pub struct PassportTransformer {
  options: TransformOptions,
  engine: Arc<dyn StyleTransferEngine>,
  renderer: Arc<dyn SkeletonRenderer>,
  rng: StdRng,
}

impl PassportTransformer {
  pub fn new(
    options: TransformOptions,
    engine: Arc<dyn StyleTransferEngine>,
    renderer: Arc<dyn SkeletonRenderer>,
  ) -> Self {
    let rng = options
      .seed
      .map(StdRng::seed_from_u64)
      .unwrap_or_else(StdRng::from_entropy);
    Self {
      options,
      engine,
      renderer,
      rng,
    }
  }

  pub fn options(&self) -> &TransformOptions {
    &self.options
  }

  /// Lists the images directly inside the input directory, sorted by name.
  pub fn find_images(&self) -> Result<Vec<PathBuf>> {
    let dir = &self.options.input_dir;
    if !dir.is_dir() {
      return Err(anyhow!("Input directory {} does not exist", dir.display()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
      .min_depth(1)
      .max_depth(1)
      .sort_by_file_name()
      .into_iter()
      .filter_map(|e| e.ok())
    {
      if !entry.file_type().is_file() {
        continue;
      }
      let ext = entry
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();
      if self.options.image_extensions.contains(&ext) {
        images.push(entry.into_path());
      }
    }
    Ok(images)
  }

  fn orientation_for(&self, label: &str) -> Orientation {
    if self.options.rotate_labels.contains(label) {
      Orientation::Vertical
    } else {
      Orientation::Horizontal
    }
  }

  fn today(&self) -> NaiveDate {
    self
      .options
      .reference_date
      .unwrap_or_else(|| Local::now().date_naive())
  }

  /// Renders `text` as a skeleton the size of `region` and lets the engine style it.
  pub async fn stylize(&self, text: &str, region: RgbImage) -> Result<RgbImage> {
    let (width, height) = region.dimensions();
    let skeleton = self.renderer.render(text, width, height);
    let input = StyleInput::new(region, skeleton)?;
    let output = self
      .engine
      .transfer(&input)
      .await
      .with_context(|| format!("Style transfer failed for '{}'", text))?;
    Ok(output.fused)
  }

  /// Replaces the text inside one labeled shape of `canvas`.
  pub async fn replace_shape(
    &self,
    canvas: &mut RgbImage,
    shape: &Shape,
    content: &PassportContent,
  ) -> Result<ShapeOutcome> {
    let label = shape.label.as_str();
    if self.options.skip_labels.contains(label) {
      return Ok(ShapeOutcome::Ignored);
    }

    let Some(text) = content.text_for_label(label) else {
      warn!("No content for label '{}', leaving it untouched", label);
      return Ok(ShapeOutcome::Skipped);
    };
    let Some(rect) = shape
      .rect()
      .and_then(|r| r.clamp_to(canvas.width(), canvas.height()))
    else {
      warn!("Shape '{}' has no usable area, leaving it untouched", label);
      return Ok(ShapeOutcome::Skipped);
    };

    let orientation = self.orientation_for(label);
    let Some(region) = extract_region(canvas, rect, orientation) else {
      return Ok(ShapeOutcome::Skipped);
    };

    debug!("{} at {:?} -> '{}'", label, rect, text);
    let styled = self.stylize(&text, region).await?;
    let styled = restore_orientation(styled, orientation);
    paste_region(canvas, &styled, rect);

    Ok(ShapeOutcome::Replaced)
  }

  /// Picks a fresh output path inside the output directory.
  fn output_path_for(&self, image_path: &Path) -> PathBuf {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let base = match image_path.file_stem().and_then(|s| s.to_str()) {
      Some(stem) if self.options.keep_names => format!("{}_{}", stem, timestamp),
      _ => timestamp,
    };
    unique_path(&self.options.output_dir, &base, "png")
  }

  /// Transforms a single image, writing `variants` synthetic copies.
  pub async fn transform_image(&mut self, image_path: &Path) -> Result<ImageResult> {
    let annotation = Annotation::load(&annotation_path_for(image_path)).await?;
    let bytes = fs::read(image_path)
      .await
      .with_context(|| format!("Failed to read image {}", image_path.display()))?;
    let source = image::load_from_memory(&bytes)
      .with_context(|| format!("Failed to decode image {}", image_path.display()))?
      .to_rgb8();

    let mut result = ImageResult::default();
    let today = self.today();

    for _ in 0..self.options.variants.max(1) {
      let content = PassportContent::random_with(&mut self.rng, today);
      debug!("Content for {}: {}", image_path.display(), content);

      let mut canvas = source.clone();
      for shape in &annotation.shapes {
        match self.replace_shape(&mut canvas, shape, &content).await? {
          ShapeOutcome::Replaced => result.regions_replaced += 1,
          ShapeOutcome::Skipped => result.regions_skipped += 1,
          ShapeOutcome::Ignored => {}
        }
      }

      let output_path = self.output_path_for(image_path);
      save_png(&canvas, &output_path).await?;
      info!("{} -> {}", image_path.display(), output_path.display());
      result.outputs.push(output_path);
    }

    Ok(result)
  }

  /// Transforms every image of the input directory. Failing images are logged and counted.
  pub async fn transform_all(&mut self) -> Result<TransformResult> {
    fs::create_dir_all(&self.options.output_dir)
      .await
      .with_context(|| {
        format!(
          "Failed to create output directory {}",
          self.options.output_dir.display()
        )
      })?;

    let images = self.find_images()?;
    info!(
      "Found {} images in {}",
      images.len(),
      self.options.input_dir.display()
    );

    let progress = if self.options.verbose {
      ProgressBar::new(images.len() as u64)
    } else {
      ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}") {
      progress.set_style(style);
    }

    let mut result = TransformResult::default();
    for image_path in &images {
      progress.set_message(image_path.display().to_string());
      match self.transform_image(image_path).await {
        Ok(image_result) => {
          result.processed_images += 1;
          result.regions_replaced += image_result.regions_replaced;
          result.regions_skipped += image_result.regions_skipped;
          result.outputs.extend(image_result.outputs);
        }
        Err(e) => {
          warn!("Failed to transform {}: {:#}", image_path.display(), e);
          result.failed_images += 1;
        }
      }
      progress.inc(1);
    }
    progress.finish_and_clear();

    result.success = result.failed_images == 0;
    info!(
      "Transformed {} images ({} failed), replaced {} regions, skipped {}",
      result.processed_images, result.failed_images, result.regions_replaced, result.regions_skipped
    );
    Ok(result)
  }
}

/// `dir/base.ext`, or `dir/base_N.ext` for the first free N when that name is taken.
fn unique_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
  let candidate = dir.join(format!("{}.{}", base, ext));
  if !candidate.exists() {
    return candidate;
  }
  (1..)
    .map(|n| dir.join(format!("{}_{}.{}", base, n, ext)))
    .find(|p| !p.exists())
    .unwrap_or(candidate)
}

async fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
  let mut bytes = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
    .with_context(|| format!("Failed to encode {}", path.display()))?;
  fs::write(path, bytes)
    .await
    .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;
  use image::Rgb;
  use passynth_srnet::{PassthroughEngine, StyleError, StyleOutput};

  struct SolidRenderer(Rgb<u8>);

  impl SkeletonRenderer for SolidRenderer {
    fn render(&self, _text: &str, width: u32, height: u32) -> RgbImage {
      RgbImage::from_pixel(width, height, self.0)
    }
  }

  /// Dark left half, light right half; remembers every requested size.
  #[derive(Default)]
  struct StripeRenderer {
    sizes: std::sync::Mutex<Vec<(u32, u32)>>,
  }

  impl SkeletonRenderer for StripeRenderer {
    fn render(&self, _text: &str, width: u32, height: u32) -> RgbImage {
      if let Ok(mut sizes) = self.sizes.lock() {
        sizes.push((width, height));
      }
      RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
          Rgb([0, 0, 0])
        } else {
          Rgb([200, 200, 200])
        }
      })
    }
  }

  struct FailingEngine;

  #[async_trait]
  impl StyleTransferEngine for FailingEngine {
    async fn transfer(&self, _input: &StyleInput) -> Result<StyleOutput, StyleError> {
      Err(StyleError::EngineError("boom".into()))
    }
  }

  fn transformer(dir: &Path, engine: Arc<dyn StyleTransferEngine>) -> PassportTransformer {
    let options = TransformOptions {
      input_dir: dir.to_path_buf(),
      output_dir: dir.join("out"),
      seed: Some(1),
      verbose: false,
      ..Default::default()
    };
    PassportTransformer::new(options, engine, Arc::new(SolidRenderer(Rgb([1, 2, 3]))))
  }

  fn shape(label: &str, points: Vec<[f64; 2]>) -> Shape {
    Shape {
      label: label.to_string(),
      points,
      shape_type: None,
    }
  }

  #[test]
  fn test_find_images_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.PNG", "a.jpg", "c.json", "notes.txt", "d.tiff"] {
      std::fs::write(dir.path().join(name), b"").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();

    let t = transformer(dir.path(), Arc::new(PassthroughEngine::new()));
    let names: Vec<String> = t
      .find_images()
      .unwrap()
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["a.jpg", "b.PNG", "d.tiff"]);
  }

  #[test]
  fn test_find_images_missing_dir() {
    let t = transformer(Path::new("/nonexistent/passports"), Arc::new(PassthroughEngine::new()));
    assert!(t.find_images().is_err());
  }

  #[test]
  fn test_unique_path_avoids_collisions() {
    let dir = tempfile::tempdir().unwrap();
    let first = unique_path(dir.path(), "scan", "png");
    assert_eq!(first, dir.path().join("scan.png"));
    std::fs::write(&first, b"").unwrap();
    assert_eq!(unique_path(dir.path(), "scan", "png"), dir.path().join("scan_1.png"));
  }

  #[test]
  fn test_output_names() {
    let dir = tempfile::tempdir().unwrap();
    let mut t = transformer(dir.path(), Arc::new(PassthroughEngine::new()));
    let name = t.output_path_for(Path::new("scan_7.jpg"));
    let name = name.file_name().unwrap().to_string_lossy().into_owned();
    // 2024-03-15-10.20.30.123456.png
    assert_eq!(name.len(), "2024-03-15-10.20.30.123456.png".len());
    assert!(!name.starts_with("scan_7"));

    t.options.keep_names = true;
    let name = t.output_path_for(Path::new("scan_7.jpg"));
    assert!(name.file_name().unwrap().to_string_lossy().starts_with("scan_7_"));
  }

  #[tokio::test]
  async fn test_replace_shape_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let t = transformer(dir.path(), Arc::new(PassthroughEngine::new()));
    let content = PassportContent::random_with(
      &mut StdRng::seed_from_u64(5),
      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    let mut canvas = RgbImage::from_pixel(100, 80, Rgb([255, 255, 255]));

    let photo = shape("photo", vec![[0.0, 0.0], [30.0, 40.0]]);
    assert_eq!(
      t.replace_shape(&mut canvas, &photo, &content).await.unwrap(),
      ShapeOutcome::Ignored
    );
    let unknown = shape("stamp", vec![[0.0, 0.0], [30.0, 40.0]]);
    assert_eq!(
      t.replace_shape(&mut canvas, &unknown, &content).await.unwrap(),
      ShapeOutcome::Skipped
    );
    let outside = shape("surname", vec![[200.0, 0.0], [230.0, 40.0]]);
    assert_eq!(
      t.replace_shape(&mut canvas, &outside, &content).await.unwrap(),
      ShapeOutcome::Skipped
    );
    assert!(canvas.pixels().all(|p| *p == Rgb([255, 255, 255])));

    let number = shape("number_group1", vec![[90.0, 10.0], [98.0, 70.0]]);
    assert_eq!(
      t.replace_shape(&mut canvas, &number, &content).await.unwrap(),
      ShapeOutcome::Replaced
    );
    assert_eq!(canvas.get_pixel(90, 10), &Rgb([1, 2, 3]));
    assert_eq!(canvas.get_pixel(97, 69), &Rgb([1, 2, 3]));
    assert_eq!(canvas.get_pixel(98, 69), &Rgb([255, 255, 255]));
  }

  #[tokio::test]
  async fn test_engine_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let t = transformer(dir.path(), Arc::new(FailingEngine));
    let err = t
      .stylize("ИВАНОВ", RgbImage::new(20, 10))
      .await
      .unwrap_err();
    assert!(format!("{:#}", err).contains("boom"));
  }

  #[tokio::test]
  async fn test_vertical_field_rendered_landscape() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(StripeRenderer::default());
    let options = TransformOptions {
      input_dir: dir.path().to_path_buf(),
      output_dir: dir.path().join("out"),
      seed: Some(3),
      verbose: false,
      ..Default::default()
    };
    let t = PassportTransformer::new(options, Arc::new(PassthroughEngine::new()), renderer.clone());
    let content = PassportContent::random_with(
      &mut StdRng::seed_from_u64(5),
      NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    let white = Rgb([255, 255, 255]);
    let mut canvas = RgbImage::from_pixel(100, 80, white);

    let number = shape("number_group1", vec![[90.0, 10.0], [98.0, 70.0]]);
    let surname = shape("surname", vec![[0.0, 0.0], [40.0, 10.0]]);
    t.replace_shape(&mut canvas, &number, &content).await.unwrap();
    t.replace_shape(&mut canvas, &surname, &content).await.unwrap();

    assert_eq!(*renderer.sizes.lock().unwrap(), vec![(60, 8), (40, 10)]);

    // The start of the vertical text sits at the top of the field.
    let dark = Rgb([0, 0, 0]);
    let light = Rgb([200, 200, 200]);
    for x in 90..98 {
      assert_eq!(canvas.get_pixel(x, 10), &dark);
      assert_eq!(canvas.get_pixel(x, 39), &dark);
      assert_eq!(canvas.get_pixel(x, 40), &light);
      assert_eq!(canvas.get_pixel(x, 69), &light);
    }
    assert_eq!(canvas.get_pixel(89, 10), &white);
    assert_eq!(canvas.get_pixel(90, 70), &white);

    // Horizontal fields keep the renderer's layout.
    assert_eq!(canvas.get_pixel(0, 5), &dark);
    assert_eq!(canvas.get_pixel(19, 5), &dark);
    assert_eq!(canvas.get_pixel(20, 5), &light);
  }
}
