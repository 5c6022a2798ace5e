// Embedding module
// This module handles the embedding server client, encoder resolution, and vector similarity

pub mod client;
pub mod encoder;
pub mod similarity;

pub use client::{EmbeddingClient, ModelInfo};
pub use encoder::{ActiveEncoder, TextEncoder, resolve_encoder};
pub use similarity::cosine_similarity;
