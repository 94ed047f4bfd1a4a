//! UltraFace face detector via ONNX Runtime.
//!
//! Runs the version-RFB-320 UltraFace model: one forward pass yields
//! per-anchor class scores and already-decoded corner boxes in
//! normalized [0, 1] coordinates, which are filtered by confidence and
//! de-duplicated with NMS.

use crate::types::FaceRegion;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants ---
const ULTRAFACE_INPUT_WIDTH: usize = 320;
const ULTRAFACE_INPUT_HEIGHT: usize = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_CONFIDENCE_THRESHOLD: f32 = 0.7;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.4;
/// Values per anchor in the score tensor: [background, face].
const ULTRAFACE_SCORES_PER_ANCHOR: usize = 2;
/// Values per anchor in the box tensor: [x1, y1, x2, y2].
const ULTRAFACE_COORDS_PER_ANCHOR: usize = 4;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// UltraFace-based face detector.
pub struct FaceDetector {
    session: Session,
    /// Output tensor indices (scores, boxes), discovered by name at load
    /// time with a positional fallback.
    score_output: usize,
    box_output: usize,
}

impl FaceDetector {
    /// Load the UltraFace ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> = session
            .outputs()
            .iter()
            .map(|o| o.name().to_string())
            .collect();

        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "UltraFace model requires 2 outputs (scores, boxes), got {}",
                output_names.len()
            )));
        }

        let (score_output, box_output) = discover_output_indices(&output_names);

        tracing::info!(
            path = model_path,
            outputs = ?output_names,
            score_output,
            box_output,
            "loaded UltraFace model"
        );

        Ok(Self {
            session,
            score_output,
            box_output,
        })
    }

    /// Detect faces in a grayscale frame, returning regions in pixel
    /// coordinates of that frame, sorted by descending confidence.
    pub fn detect(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, DetectorError> {
        let expected = width as usize * height as usize;
        if gray.len() < expected {
            return Err(DetectorError::InferenceFailed(format!(
                "frame buffer too short: expected {expected}, got {}",
                gray.len()
            )));
        }

        let input = preprocess(gray, width as usize, height as usize);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, scores) = outputs[self.score_output]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[self.box_output]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let detections = decode(
            scores,
            boxes,
            width as f32,
            height as f32,
            ULTRAFACE_CONFIDENCE_THRESHOLD,
        )?;

        let mut result = nms(detections, ULTRAFACE_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(result)
    }
}

/// Discover the (scores, boxes) output indices by name.
///
/// UltraFace exports typically name the outputs "scores" and "boxes";
/// generic numeric names fall back to positional [0]=scores, [1]=boxes.
fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let scores = names.iter().position(|n| n.contains("score"));
    let boxes = names.iter().position(|n| n.contains("box"));
    match (scores, boxes) {
        (Some(s), Some(b)) => (s, b),
        _ => {
            tracing::info!(
                ?names,
                "UltraFace: output names not recognized, using positional mapping [0]=scores, [1]=boxes"
            );
            (0, 1)
        }
    }
}

/// Resize to the model input with bilinear interpolation, normalize, and
/// replicate the grayscale channel into NCHW RGB.
fn preprocess(gray: &[u8], width: usize, height: usize) -> Array4<f32> {
    let (in_w, in_h) = (ULTRAFACE_INPUT_WIDTH, ULTRAFACE_INPUT_HEIGHT);
    let scale_x = width as f32 / in_w as f32;
    let scale_y = height as f32 / in_h as f32;

    let mut tensor = Array4::<f32>::zeros((1, 3, in_h, in_w));

    for y in 0..in_h {
        let src_y = (y as f32 + 0.5) * scale_y - 0.5;
        let y0 = (src_y.floor() as i32).clamp(0, height as i32 - 1) as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = (src_y - src_y.floor()).clamp(0.0, 1.0);

        for x in 0..in_w {
            let src_x = (x as f32 + 0.5) * scale_x - 0.5;
            let x0 = (src_x.floor() as i32).clamp(0, width as i32 - 1) as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = (src_x - src_x.floor()).clamp(0.0, 1.0);

            let tl = gray[y0 * width + x0] as f32;
            let tr = gray[y0 * width + x1] as f32;
            let bl = gray[y1 * width + x0] as f32;
            let br = gray[y1 * width + x1] as f32;

            let val = tl * (1.0 - fx) * (1.0 - fy)
                + tr * fx * (1.0 - fy)
                + bl * (1.0 - fx) * fy
                + br * fx * fy;

            let normalized = (val - ULTRAFACE_MEAN) / ULTRAFACE_STD;
            tensor[[0, 0, y, x]] = normalized;
            tensor[[0, 1, y, x]] = normalized;
            tensor[[0, 2, y, x]] = normalized;
        }
    }

    tensor
}

/// Decode raw output tensors into pixel-space regions above the
/// confidence threshold.
fn decode(
    scores: &[f32],
    boxes: &[f32],
    frame_w: f32,
    frame_h: f32,
    threshold: f32,
) -> Result<Vec<FaceRegion>, DetectorError> {
    let anchors = scores.len() / ULTRAFACE_SCORES_PER_ANCHOR;
    if boxes.len() < anchors * ULTRAFACE_COORDS_PER_ANCHOR {
        return Err(DetectorError::InferenceFailed(format!(
            "box tensor too short: {} anchors need {} values, got {}",
            anchors,
            anchors * ULTRAFACE_COORDS_PER_ANCHOR,
            boxes.len()
        )));
    }

    let mut detections = Vec::new();
    for idx in 0..anchors {
        let confidence = scores[idx * ULTRAFACE_SCORES_PER_ANCHOR + 1];
        if confidence < threshold {
            continue;
        }

        let off = idx * ULTRAFACE_COORDS_PER_ANCHOR;
        let x1 = boxes[off].clamp(0.0, 1.0) * frame_w;
        let y1 = boxes[off + 1].clamp(0.0, 1.0) * frame_h;
        let x2 = boxes[off + 2].clamp(0.0, 1.0) * frame_w;
        let y2 = boxes[off + 3].clamp(0.0, 1.0) * frame_h;

        detections.push(FaceRegion {
            x: x1,
            y: y1,
            width: (x2 - x1).max(1.0),
            height: (y2 - y1).max(1.0),
            confidence,
        });
    }

    Ok(detections)
}

/// Intersection-over-union of two regions.
fn iou(a: &FaceRegion, b: &FaceRegion) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

/// Greedy non-maximum suppression, keeping the highest-confidence region
/// of each overlapping cluster.
fn nms(mut detections: Vec<FaceRegion>, threshold: f32) -> Vec<FaceRegion> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<FaceRegion> = Vec::new();
    for det in detections {
        if kept.iter().all(|k| iou(k, &det) <= threshold) {
            kept.push(det);
        }
    }
    kept
}
