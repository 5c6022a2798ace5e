
use anyhow::Result;
use tracing::{info, warn};

use crate::TriageError;
use crate::embedding::client::{EmbeddingClient, ModelInfo};

/// A resolved embedding model that can turn text into a vector.
///
/// The trait is the seam between scoring logic and the embedding server, so
/// sessions can be exercised in tests without a live server. Encoders cross
/// await points inside the command handlers, hence the `Send + Sync` bound.
pub trait TextEncoder: Send + Sync {
    /// Embed a single text with the active model.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Tag of the model this encoder embeds with.
    fn model_name(&self) -> &str;
}

/// An encoder bound to a model that was verified against the server's
/// installed model list.
#[derive(Debug, Clone)]
pub struct ActiveEncoder {
    client: EmbeddingClient,
    model: String,
}

impl TextEncoder for ActiveEncoder {
    #[inline]
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(&self.model, text)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Walk the candidate model chain and return an encoder for the first model
/// installed on the server.
///
/// Every skipped candidate is logged. When no candidate is installed the
/// attempted chain is reported in [`TriageError::ModelUnavailable`] so the user
/// can see exactly what was tried.
#[inline]
pub fn resolve_encoder(
    client: &EmbeddingClient,
    candidates: &[String],
) -> crate::Result<ActiveEncoder> {
    if candidates.is_empty() {
        return Err(TriageError::Config(
            "No embedding models configured".to_string(),
        ));
    }

    let installed = client.list_models()?;

    for candidate in candidates {
        if model_installed(&installed, candidate) {
            info!("Using embedding model {}", candidate);
            return Ok(ActiveEncoder {
                client: client.clone(),
                model: candidate.clone(),
            });
        }
        warn!(
            "Embedding model {} is not installed, trying next candidate",
            candidate
        );
    }

    let available: Vec<&str> = installed.iter().map(|m| m.name.as_str()).collect();
    warn!(
        "No candidate model is installed. Available models: {:?}",
        available
    );

    Err(TriageError::ModelUnavailable {
        attempted: candidates.to_vec(),
    })
}

// Server tags usually carry a ":latest" style suffix, so "all-minilm" should
// match an installed "all-minilm:latest".
fn model_installed(installed: &[ModelInfo], wanted: &str) -> bool {
    installed
        .iter()
        .any(|m| m.name == wanted || m.name.split(':').next() == Some(wanted))
}
