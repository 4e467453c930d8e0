//! Generated market commentary for a single listing.

pub mod gemini;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::listings::Listing;

pub use gemini::GeminiInsights;

pub const UNAVAILABLE_MESSAGE: &str =
    "AI Insights are currently unavailable. Please check API configuration.";
pub const FAILURE_MESSAGE: &str = "Could not generate insights at this time.";
pub const EMPTY_MESSAGE: &str = "No text insights available for this property.";

/// Text-generation backend.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Returns `Ok(None)` when the model answered without any text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, InsightError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InsightError {
    #[error("insight service is not configured")]
    Unconfigured,
    #[error("insight service unreachable: {0}")]
    Transport(String),
    #[error("insight service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected insight payload: {0}")]
    Decode(String),
}

/// Where the text of an [`InsightOutcome`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    Generated,
    Unavailable,
    Failed,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightOutcome {
    pub text: String,
    pub source: InsightSource,
}

impl InsightOutcome {
    fn fixed(text: &str, source: InsightSource) -> Self {
        Self {
            text: text.to_string(),
            source,
        }
    }
}

pub fn build_prompt(listing: &Listing) -> String {
    format!(
        "Provide a brief, professional real estate analysis for this property:\n\
         Title: {title}\n\
         Location: {location}\n\
         Price: ${price}\n\
         Type: {kind}\n\
         Bedrooms/Bathrooms: {bedrooms}/{bathrooms}\n\
         Description: {description}\n\n\
         Focus on investment potential, neighborhood vibe, and who this home is perfect for. \
         Keep it under 150 words.",
        title = listing.title,
        location = listing.location,
        price = listing.price,
        kind = listing.property_type,
        bedrooms = listing.bedrooms,
        bathrooms = listing.bathrooms,
        description = listing.description,
    )
}

/// Generate commentary for `listing`. Never fails: every problem is mapped to
/// a fixed message the caller can display.
pub async fn insights_for(generator: &dyn InsightGenerator, listing: &Listing) -> InsightOutcome {
    if !generator.is_configured() {
        return InsightOutcome::fixed(UNAVAILABLE_MESSAGE, InsightSource::Unavailable);
    }

    match generator.generate(&build_prompt(listing)).await {
        Ok(Some(text)) if !text.trim().is_empty() => InsightOutcome {
            text,
            source: InsightSource::Generated,
        },
        Ok(_) => InsightOutcome::fixed(EMPTY_MESSAGE, InsightSource::Empty),
        Err(InsightError::Unconfigured) => {
            InsightOutcome::fixed(UNAVAILABLE_MESSAGE, InsightSource::Unavailable)
        }
        Err(error) => {
            warn!(%error, listing = %listing.id, "insight generation failed");
            InsightOutcome::fixed(FAILURE_MESSAGE, InsightSource::Failed)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredInsights;

#[async_trait]
impl InsightGenerator for UnconfiguredInsights {
    fn is_configured(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str) -> Result<Option<String>, InsightError> {
        Err(InsightError::Unconfigured)
    }
}
