use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box, in pixel coordinates of the frame it
/// was detected in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceRegion {
    /// Map a region detected on a downsampled frame back to the
    /// resolution of the original frame.
    pub fn scale_by(&self, factor: f32) -> FaceRegion {
        FaceRegion {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
            confidence: self.confidence,
        }
    }
}

/// Fixed-length face embedding (128-dimensional for the bundled model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Euclidean distance to another embedding.
    ///
    /// Embeddings are only ever compared by distance; there is no
    /// meaningful notion of equality between two face vectors.
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// Identity assigned to a detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FaceLabel {
    Known { roll_no: i64, name: String },
    Unknown,
}

/// One detected face together with its assigned label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledFace {
    pub region: FaceRegion,
    pub label: FaceLabel,
}

/// Everything the recognition worker learned from one frame.
///
/// Regions are in the coordinate space of the downsampled frame they
/// were detected in; multiply by `downscale` to recover full-resolution
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub faces: Vec<LabeledFace>,
    pub downscale: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_identical_is_zero() {
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        let b = Embedding::new(vec![1.0, 2.0, 3.0]);
        assert!(a.distance(&b).abs() < 1e-6);
    }

    #[test]
    fn distance_unit_apart() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0]);
        assert!((a.distance(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Embedding::new(vec![0.5, -1.0, 2.0]);
        let b = Embedding::new(vec![-0.5, 1.0, 0.0]);
        assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-6);
    }

    #[test]
    fn scale_by_maps_back_to_full_resolution() {
        let region = FaceRegion {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            confidence: 0.9,
        };
        let scaled = region.scale_by(4.0);
        assert_eq!(scaled.x, 40.0);
        assert_eq!(scaled.y, 80.0);
        assert_eq!(scaled.width, 120.0);
        assert_eq!(scaled.height, 160.0);
        assert_eq!(scaled.confidence, 0.9);
    }
}
