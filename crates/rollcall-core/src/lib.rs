//! rollcall-core — identity matching and embedding extraction.
//!
//! Holds the pure pieces of the attendance pipeline: embedding and face
//! region types, the roster matcher, enrollment sample handling, and the
//! ONNX-backed embedding provider (UltraFace detection + MobileFaceNet
//! embeddings) running via ONNX Runtime for CPU inference.

pub mod detector;
pub mod embedder;
pub mod enroll;
pub mod matcher;
pub mod provider;
pub mod types;

pub use matcher::{KnownFace, MatchOutcome, Matcher, NearestMatcher};
pub use provider::{EmbeddingProvider, OnnxProvider, ProviderError};
pub use types::{Embedding, FaceLabel, FaceRegion, LabeledFace, RecognitionResult};
