//! Labelme-style annotation documents describing the text fields of a passport scan.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// One annotation document, stored next to its image with a `.json` extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
  pub shapes: Vec<Shape>,
  #[serde(default)]
  pub image_path: Option<String>,
  #[serde(default)]
  pub image_width: Option<u32>,
  #[serde(default)]
  pub image_height: Option<u32>,
}

/// A labeled region. Rectangles come either as four corners or as two opposite corners.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shape {
  pub label: String,
  pub points: Vec<[f64; 2]>,
  #[serde(default)]
  pub shape_type: Option<String>,
}

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
  pub x: u32,
  pub y: u32,
  pub width: u32,
  pub height: u32,
}

impl PixelRect {
  pub fn right(&self) -> u32 {
    self.x + self.width
  }

  pub fn bottom(&self) -> u32 {
    self.y + self.height
  }

  /// Intersects the rectangle with an image of the given size.
  pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
    let right = self.right().min(image_width);
    let bottom = self.bottom().min(image_height);
    if self.x >= right || self.y >= bottom {
      return None;
    }
    Some(PixelRect {
      x: self.x,
      y: self.y,
      width: right - self.x,
      height: bottom - self.y,
    })
  }
}

impl Shape {
  /// Bounding rectangle of the shape's points.
  ///
  /// Coordinates are truncated toward zero and negative values are clipped to the image origin.
  /// For four corners ordered top-left first this is the corner 0 / corner 2 rectangle.
  pub fn rect(&self) -> Option<PixelRect> {
    if self.points.len() < 2 {
      return None;
    }
    let to_px = |v: f64| v.max(0.0).trunc() as u32;

    let xs = self.points.iter().map(|p| to_px(p[0]));
    let ys = self.points.iter().map(|p| to_px(p[1]));
    let (x0, x1) = xs.fold((u32::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let (y0, y1) = ys.fold((u32::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if x1 <= x0 || y1 <= y0 {
      return None;
    }
    Some(PixelRect {
      x: x0,
      y: y0,
      width: x1 - x0,
      height: y1 - y0,
    })
  }
}

impl Annotation {
  pub fn from_json(json: &str) -> Result<Self> {
    serde_json::from_str(json).context("Failed to parse annotation JSON")
  }

  /// Reads and parses an annotation file.
  pub async fn load(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path)
      .await
      .with_context(|| format!("Failed to read annotation {}", path.display()))?;
    Self::from_json(&content).with_context(|| format!("Invalid annotation {}", path.display()))
  }
}

/// The annotation file that belongs to an image: same stem, `.json` extension.
pub fn annotation_path_for(image_path: &Path) -> PathBuf {
  image_path.with_extension("json")
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"{
    "version": "4.5.6",
    "flags": {},
    "shapes": [
      {
        "label": "surname",
        "points": [[10.7, 20.2], [110.0, 20.0], [110.9, 45.5], [10.0, 45.0]],
        "group_id": null,
        "shape_type": "polygon",
        "flags": {}
      },
      {
        "label": "number_group1",
        "points": [[300.0, 5.0], [320.0, 90.0]],
        "shape_type": "rectangle"
      }
    ],
    "imagePath": "passport_001.jpg",
    "imageData": null,
    "imageHeight": 600,
    "imageWidth": 400
  }"#;

  #[test]
  fn test_parse_labelme_document() {
    let annotation = Annotation::from_json(SAMPLE).unwrap();
    assert_eq!(annotation.shapes.len(), 2);
    assert_eq!(annotation.shapes[0].label, "surname");
    assert_eq!(annotation.shapes[1].shape_type.as_deref(), Some("rectangle"));
    assert_eq!(annotation.image_path.as_deref(), Some("passport_001.jpg"));
    assert_eq!(annotation.image_width, Some(400));
  }

  #[test]
  fn test_four_corner_rect_truncates() {
    let annotation = Annotation::from_json(SAMPLE).unwrap();
    let rect = annotation.shapes[0].rect().unwrap();
    assert_eq!(
      rect,
      PixelRect {
        x: 10,
        y: 20,
        width: 100,
        height: 25
      }
    );
  }

  #[test]
  fn test_two_point_rect() {
    let annotation = Annotation::from_json(SAMPLE).unwrap();
    let rect = annotation.shapes[1].rect().unwrap();
    assert_eq!((rect.x, rect.y, rect.width, rect.height), (300, 5, 20, 85));
  }

  #[test]
  fn test_reversed_corners_and_degenerate_shapes() {
    let reversed = Shape {
      label: "name".into(),
      points: vec![[50.0, 40.0], [10.0, 40.0], [10.0, 10.0], [50.0, 10.0]],
      shape_type: None,
    };
    assert_eq!(reversed.rect().map(|r| (r.x, r.y)), Some((10, 10)));

    let flat = Shape {
      label: "name".into(),
      points: vec![[5.0, 5.0], [60.0, 5.0]],
      shape_type: None,
    };
    assert!(flat.rect().is_none());

    let single = Shape {
      label: "name".into(),
      points: vec![[5.0, 5.0]],
      shape_type: None,
    };
    assert!(single.rect().is_none());
  }

  #[test]
  fn test_clamp_to_image() {
    let rect = PixelRect {
      x: 90,
      y: 10,
      width: 30,
      height: 10,
    };
    assert_eq!(rect.clamp_to(100, 100).map(|r| r.width), Some(10));
    assert!(rect.clamp_to(80, 100).is_none());
  }

  #[test]
  fn test_annotation_path_for() {
    let path = annotation_path_for(Path::new("/data/passports/scan_01.jpeg"));
    assert_eq!(path, PathBuf::from("/data/passports/scan_01.json"));
  }

  #[tokio::test]
  async fn test_load_missing_file() {
    let err = Annotation::load(Path::new("/nonexistent/scan.json")).await.unwrap_err();
    assert!(err.to_string().contains("/nonexistent/scan.json"));
  }
}
