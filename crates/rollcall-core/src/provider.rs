//! The embedding-provider seam between the recognition pipeline and the
//! face models.
//!
//! Callers treat every method as an opaque, potentially slow blocking
//! inference call; nothing about cost or implementation is promised
//! beyond the signatures.

use crate::detector::{DetectorError, FaceDetector};
use crate::embedder::{EmbedderError, FaceEmbedder};
use crate::types::{Embedding, FaceRegion};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("embedder: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("{0}")]
    Other(String),
}

/// Face detection and embedding extraction behind one seam.
pub trait EmbeddingProvider {
    /// Detect face regions in a grayscale frame.
    fn detect_faces(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, ProviderError>;

    /// Extract a fixed-length embedding for one detected region.
    fn embed(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Embedding, ProviderError>;

    /// Distance between two embeddings in this provider's native metric.
    fn distance(&self, a: &Embedding, b: &Embedding) -> f32 {
        a.distance(b)
    }
}

/// Production provider: UltraFace detection plus MobileFaceNet
/// embeddings, both via ONNX Runtime.
pub struct OnnxProvider {
    detector: FaceDetector,
    embedder: FaceEmbedder,
}

impl OnnxProvider {
    /// Load both models, failing fast if either file is missing.
    pub fn load(detector_path: &str, embedder_path: &str) -> Result<Self, ProviderError> {
        let detector = FaceDetector::load(detector_path)?;
        let embedder = FaceEmbedder::load(embedder_path)?;
        Ok(Self { detector, embedder })
    }
}

impl EmbeddingProvider for OnnxProvider {
    fn detect_faces(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceRegion>, ProviderError> {
        Ok(self.detector.detect(gray, width, height)?)
    }

    fn embed(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        region: &FaceRegion,
    ) -> Result<Embedding, ProviderError> {
        Ok(self.embedder.extract(gray, width, height, region)?)
    }
}
