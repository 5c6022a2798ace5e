use thiserror::Error;

pub type Result<T> = std::result::Result<T, TriageError>;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("No research context loaded")]
    ContextNotLoaded,

    #[error("Research context text is empty")]
    EmptyContext,

    #[error("Snippet content is empty")]
    EmptySnippet,

    #[error("No embedding model available, attempted: {}", attempted.join(", "))]
    ModelUnavailable { attempted: Vec<String> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("ArXiv error: {0}")]
    Arxiv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod arxiv;
pub mod commands;
pub mod config;
pub mod context;
pub mod database;
pub mod embedding;
pub mod menu;
pub mod recalc;
pub mod scoring;
pub mod session;
