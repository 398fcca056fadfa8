//! Text simplification with word embeddings.
//!
//! Uncommon words are replaced by the common word whose embedding is closest
//! (or farthest, or random) under a configurable similarity metric.

pub mod config;
pub mod error;
pub mod metric;
pub mod settings;
pub mod simplify;
pub mod vector_math;
pub mod word_vectors;

pub use config::{Policy, ReplacementConfig};
pub use error::{Result, SimplifyError, VectorError};
pub use metric::Metric;
pub use settings::Settings;
pub use simplify::{Explanation, Simplifier, tokenize};
pub use word_vectors::{LoadReport, WordSource, WordVectors};
