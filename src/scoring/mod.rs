// Scoring module
// Maps cosine similarity between the research context and a paper onto the
// 0-100 relevance scale and its category bands


use serde::{Deserialize, Serialize};

use crate::database::RelevanceCategory;
use crate::{Result, TriageError};

/// One row of the relevance threshold table: scores at or above `min_score`
/// fall into `category` unless a higher band claimed them first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub min_score: f64,
    pub category: RelevanceCategory,
}

/// Ordered score bands checked top-down, with [`RelevanceCategory::Low`] as
/// the implicit catch-all for anything below the last band.
#[derive(Debug, Clone)]
pub struct ThresholdTable {
    bands: Vec<ThresholdBand>,
}

impl ThresholdTable {
    /// Build a table from configured bands, verifying the minimums are inside
    /// 0-100 and strictly decreasing.
    #[inline]
    pub fn new(bands: Vec<ThresholdBand>) -> Result<Self> {
        let mut previous: Option<f64> = None;

        for band in &bands {
            if !(0.0..=100.0).contains(&band.min_score) {
                return Err(TriageError::Config(format!(
                    "Relevance threshold {} is outside the 0-100 range",
                    band.min_score
                )));
            }

            if band.category == RelevanceCategory::Low {
                return Err(TriageError::Config(
                    "Low relevance is the catch-all band and cannot have a threshold".to_string(),
                ));
            }

            if let Some(prev) = previous {
                if band.min_score >= prev {
                    return Err(TriageError::Config(format!(
                        "Relevance thresholds must be strictly decreasing: {} follows {}",
                        band.min_score, prev
                    )));
                }
            }

            previous = Some(band.min_score);
        }

        Ok(Self { bands })
    }

    /// Category for a raw (unclamped) score.
    #[inline]
    pub fn categorize(&self, raw_score: f64) -> RelevanceCategory {
        for band in &self.bands {
            if raw_score >= band.min_score {
                return band.category;
            }
        }
        RelevanceCategory::Low
    }

    #[inline]
    pub fn bands(&self) -> &[ThresholdBand] {
        &self.bands
    }
}

impl Default for ThresholdTable {
    #[inline]
    fn default() -> Self {
        Self {
            bands: default_bands(),
        }
    }
}

/// The default score bands.
#[inline]
pub fn default_bands() -> Vec<ThresholdBand> {
    vec![
        ThresholdBand {
            min_score: 85.0,
            category: RelevanceCategory::Highly,
        },
        ThresholdBand {
            min_score: 50.0,
            category: RelevanceCategory::Moderately,
        },
        ThresholdBand {
            min_score: 30.0,
            category: RelevanceCategory::Somewhat,
        },
    ]
}

/// Assemble the text a paper is scored on: title, abstract, and the user's
/// notes when present.
#[inline]
pub fn compose_paper_text(title: &str, abstract_text: &str, notes: &str) -> String {
    let mut text = format!("{}\n\n{}", title, abstract_text);

    let notes = notes.trim();
    if !notes.is_empty() {
        text.push_str("\n\nNotes: ");
        text.push_str(notes);
    }

    text
}

/// Map a cosine similarity onto the 0-100 scale. The value is kept raw here;
/// clamping happens only at the display boundary.
#[inline]
pub fn similarity_to_score(similarity: f32) -> f64 {
    f64::from(similarity) * 100.0
}

/// Clamp a raw score into the 0-100 range shown to the user.
#[inline]
pub fn clamp_for_display(raw_score: f64) -> f64 {
    raw_score.clamp(0.0, 100.0)
}

/// Reading recommendation for a category, used by the CLI reports.
#[inline]
pub fn recommendation(category: RelevanceCategory) -> &'static str {
    match category {
        RelevanceCategory::Highly => "read this paper",
        RelevanceCategory::Moderately => "consider reading if you have time",
        RelevanceCategory::Somewhat => "skim for useful insights",
        RelevanceCategory::Low => "you can safely skip this paper",
    }
}
