//! Wire contract for the optional explanation-rewriting collaborator.
//!
//! The collaborator may rephrase a hint's explanation text, nothing else: the
//! suggested cell, category, and confidence never appear in the response type,
//! so they cannot be altered. Running without the collaborator is a
//! first-class configuration. Transport, timeouts, and retry policy belong to
//! the caller.

use serde::{Deserialize, Serialize};

use estopim_core::{HintSuggestion, Observation};

/// Payload sent to the rewriting service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub target: (u8, u8),
    pub category: String,
    pub confidence: String,
    pub original_explanation: String,
    pub board_summary: String,
}

impl RewriteRequest {
    /// Builds the request for a suggestion, embedding a JSON summary of the
    /// player-visible board.
    pub fn for_suggestion(
        suggestion: &HintSuggestion,
        obs: &Observation,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            target: suggestion.target,
            category: suggestion.category.to_string(),
            confidence: suggestion.confidence.to_string(),
            original_explanation: suggestion.explanation.clone(),
            board_summary: serde_json::to_string(obs)?,
        })
    }
}

/// Rewritten explanation text, or whatever the service sent back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub text: String,
}

/// Picks the explanation to display: the rewrite when it is usable, the
/// solver's original otherwise. A missing, empty, or blank response falls
/// back silently; it is logged, never surfaced as an error.
pub fn effective_explanation<'a>(
    original: &'a str,
    response: Option<&'a RewriteResponse>,
) -> &'a str {
    match response {
        Some(response) if !response.text.trim().is_empty() => response.text.as_str(),
        Some(_) => {
            log::warn!("rewriting service returned blank text, keeping original explanation");
            original
        }
        None => original,
    }
}
