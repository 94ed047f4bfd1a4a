//! MobileFaceNet embedding extractor via ONNX Runtime.
//!
//! Produces 128-dimensional L2-normalized embeddings from face crops.
//! The crop is taken straight from the detection box with a small
//! margin; no landmark alignment is performed.

use crate::types::{Embedding, FaceRegion};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants ---
const EMBED_INPUT_SIZE: usize = 112;
const EMBED_MEAN: f32 = 127.5;
const EMBED_STD: f32 = 127.5;
const EMBEDDING_DIM: usize = 128;
/// Fraction of the box size padded on each side before cropping.
const CROP_MARGIN: f32 = 0.15;

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face region lies entirely outside the frame")]
    RegionOutsideFrame,
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// MobileFaceNet-based embedding extractor.
pub struct FaceEmbedder {
    session: Session,
}

impl FaceEmbedder {
    /// Load the MobileFaceNet ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, EmbedderError> {
        if !Path::new(model_path).exists() {
            return Err(EmbedderError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(path = model_path, "loaded MobileFaceNet model");

        Ok(Self { session })
    }

    /// Extract an embedding for one detected face in a grayscale frame.
    pub fn extract(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Embedding, EmbedderError> {
        let crop = crop_and_resize(gray, width as usize, height as usize, region)?;
        let input = preprocess(&crop);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw_data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("embedding extraction: {e}")))?;

        let raw: Vec<f32> = raw_data.to_vec();
        if raw.len() != EMBEDDING_DIM {
            return Err(EmbedderError::InferenceFailed(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                raw.len()
            )));
        }

        // L2-normalize so Euclidean distances are comparable across frames.
        let norm: f32 = raw.iter().map(|x| x * x).sum::<f32>().sqrt();
        let values = if norm > 0.0 {
            raw.iter().map(|x| x / norm).collect()
        } else {
            raw
        };

        Ok(Embedding::new(values))
    }
}

/// Crop the region (expanded by the margin, clamped to the frame) and
/// bilinearly resample it to the model input size.
fn crop_and_resize(
    gray: &[u8],
    width: usize,
    height: usize,
    region: &FaceRegion,
) -> Result<Vec<u8>, EmbedderError> {
    let margin_x = region.width * CROP_MARGIN;
    let margin_y = region.height * CROP_MARGIN;

    let x0 = (region.x - margin_x).max(0.0);
    let y0 = (region.y - margin_y).max(0.0);
    let x1 = (region.x + region.width + margin_x).min(width as f32);
    let y1 = (region.y + region.height + margin_y).min(height as f32);

    if x1 <= x0 || y1 <= y0 {
        return Err(EmbedderError::RegionOutsideFrame);
    }

    let size = EMBED_INPUT_SIZE;
    let crop_w = x1 - x0;
    let crop_h = y1 - y0;
    let scale_x = crop_w / size as f32;
    let scale_y = crop_h / size as f32;

    let mut out = vec![0u8; size * size];
    for y in 0..size {
        let src_y = y0 + (y as f32 + 0.5) * scale_y - 0.5;
        let sy0 = (src_y.floor() as i32).clamp(0, height as i32 - 1) as usize;
        let sy1 = (sy0 + 1).min(height - 1);
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for x in 0..size {
            let src_x = x0 + (x as f32 + 0.5) * scale_x - 0.5;
            let sx0 = (src_x.floor() as i32).clamp(0, width as i32 - 1) as usize;
            let sx1 = (sx0 + 1).min(width - 1);
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            let tl = gray[sy0 * width + sx0] as f32;
            let tr = gray[sy0 * width + sx1] as f32;
            let bl = gray[sy1 * width + sx0] as f32;
            let br = gray[sy1 * width + sx1] as f32;

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            out[y * size + x] = val.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(out)
}

/// Preprocess a cropped grayscale face into a NCHW float tensor with the
/// grayscale channel replicated into RGB.
fn preprocess(crop: &[u8]) -> Array4<f32> {
    let size = EMBED_INPUT_SIZE;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = crop.get(y * size + x).copied().unwrap_or(0) as f32;
            let normalized = (pixel - EMBED_MEAN) / EMBED_STD;
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: f32, y: f32, w: f32, h: f32) -> FaceRegion {
        FaceRegion {
            x,
            y,
            width: w,
            height: h,
            confidence: 0.9,
        }
    }

    #[test]
    fn preprocess_output_shape() {
        let crop = vec![128u8; EMBED_INPUT_SIZE * EMBED_INPUT_SIZE];
        let tensor = preprocess(&crop);
        assert_eq!(tensor.shape(), &[1, 3, EMBED_INPUT_SIZE, EMBED_INPUT_SIZE]);
    }

    #[test]
    fn preprocess_normalization() {
        let crop = vec![128u8; EMBED_INPUT_SIZE * EMBED_INPUT_SIZE];
        let tensor = preprocess(&crop);
        let expected = (128.0 - EMBED_MEAN) / EMBED_STD;
        assert!((tensor[[0, 0, 0, 0]] - expected).abs() < 1e-6);
    }

    #[test]
    fn preprocess_channels_identical() {
        let crop: Vec<u8> = (0..EMBED_INPUT_SIZE * EMBED_INPUT_SIZE)
            .map(|i| (i % 251) as u8)
            .collect();
        let tensor = preprocess(&crop);
        for y in 0..EMBED_INPUT_SIZE {
            for x in 0..EMBED_INPUT_SIZE {
                assert_eq!(tensor[[0, 0, y, x]], tensor[[0, 1, y, x]]);
                assert_eq!(tensor[[0, 1, y, x]], tensor[[0, 2, y, x]]);
            }
        }
    }

    #[test]
    fn crop_uniform_frame_stays_uniform() {
        let gray = vec![90u8; 200 * 200];
        let crop = crop_and_resize(&gray, 200, 200, &region(40.0, 40.0, 80.0, 80.0))
            .expect("region inside frame");
        assert_eq!(crop.len(), EMBED_INPUT_SIZE * EMBED_INPUT_SIZE);
        assert!(crop.iter().all(|&p| p == 90));
    }

    #[test]
    fn crop_clamps_to_frame_bounds() {
        let gray = vec![10u8; 100 * 100];
        // Region overhanging the bottom-right corner still produces a crop.
        let crop = crop_and_resize(&gray, 100, 100, &region(80.0, 80.0, 60.0, 60.0))
            .expect("partially visible region");
        assert_eq!(crop.len(), EMBED_INPUT_SIZE * EMBED_INPUT_SIZE);
    }

    #[test]
    fn crop_outside_frame_is_rejected() {
        let gray = vec![10u8; 100 * 100];
        let result = crop_and_resize(&gray, 100, 100, &region(200.0, 200.0, 50.0, 50.0));
        assert!(matches!(result, Err(EmbedderError::RegionOutsideFrame)));
    }
}
