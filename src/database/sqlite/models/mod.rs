
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Paper {
    pub id: String,
    pub title: String,
    #[sqlx(rename = "abstract")]
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub notes: String,
    pub relevance_score: f64,
    pub category: RelevanceCategory,
    pub status: PaperStatus,
    pub arxiv_id: Option<String>,
    pub authors: Option<String>,
    pub published: Option<String>,
    pub pdf_path: Option<String>,
    pub embedding: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_needs_update: bool,
    pub embedding_updated_date: Option<NaiveDateTime>,
    pub added_date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    ToRead,
    Reading,
    Read,
    Discarded,
}

impl std::fmt::Display for PaperStatus {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            PaperStatus::ToRead => write!(f, "To Read"),
            PaperStatus::Reading => write!(f, "Reading"),
            PaperStatus::Read => write!(f, "Read"),
            PaperStatus::Discarded => write!(f, "Discarded"),
        }
    }
}

impl std::str::FromStr for PaperStatus {
    type Err = anyhow::Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "to_read" | "toread" => Ok(PaperStatus::ToRead),
            "reading" => Ok(PaperStatus::Reading),
            "read" => Ok(PaperStatus::Read),
            "discarded" => Ok(PaperStatus::Discarded),
            other => Err(anyhow::anyhow!("Unknown paper status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RelevanceCategory {
    Low,
    Somewhat,
    Moderately,
    Highly,
}

impl std::fmt::Display for RelevanceCategory {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            RelevanceCategory::Low => write!(f, "Low Relevance"),
            RelevanceCategory::Somewhat => write!(f, "Somewhat Relevant"),
            RelevanceCategory::Moderately => write!(f, "Moderately Relevant"),
            RelevanceCategory::Highly => write!(f, "Highly Relevant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPaper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub notes: String,
    pub relevance_score: f64,
    pub category: RelevanceCategory,
    pub arxiv_id: Option<String>,
    pub authors: Option<String>,
    pub published: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoredSnippet {
    pub id: String,
    pub content: String,
    pub source: Option<String>,
    pub paper_id: Option<String>,
    pub position: i64,
    pub added_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSnippet {
    pub id: String,
    pub content: String,
    pub source: Option<String>,
    pub paper_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperStatistics {
    pub total_papers: i64,
    pub to_read: i64,
    pub reading: i64,
    pub read: i64,
    pub discarded: i64,
    pub low: i64,
    pub somewhat: i64,
    pub moderately: i64,
    pub highly: i64,
    pub average_score: f64,
    pub with_pdf: i64,
}

impl Paper {
    /// Score clamped to the displayable 0-100 range. The stored value is the
    /// raw similarity percentage and may drift slightly outside the range.
    #[inline]
    pub fn display_score(&self) -> f64 {
        self.relevance_score.clamp(0.0, 100.0)
    }

    #[inline]
    pub fn has_notes(&self) -> bool {
        !self.notes.trim().is_empty()
    }

    /// Decodes the cached embedding from its JSON column representation.
    #[inline]
    pub fn embedding_vector(&self) -> anyhow::Result<Option<Vec<f32>>> {
        match &self.embedding {
            Some(json) => Ok(Some(
                serde_json::from_str(json).context("Failed to decode stored paper embedding")?,
            )),
            None => Ok(None),
        }
    }
}
