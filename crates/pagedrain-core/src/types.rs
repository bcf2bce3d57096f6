//! Shared types used across pagedrain.
//!
//! This module defines the selector newtype and the result value reported
//! when a scroll session ends.

use crate::error::PagedrainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for CSS selectors with validation.
///
/// Selectors must contain at least one non-whitespace character. Syntax is
/// checked by the browser when the selector is queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssSelector(String);

impl CssSelector {
    /// Create a new `CssSelector` from a string.
    ///
    /// # Errors
    /// Returns error if the selector is empty or whitespace only.
    pub fn new(selector: impl Into<String>) -> Result<Self, PagedrainError> {
        let selector = selector.into();
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(PagedrainError::Validation(
                "invalid CSS selector: must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CssSelector {
    type Error = PagedrainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CssSelector> for String {
    fn from(selector: CssSelector) -> Self {
        selector.0
    }
}

impl fmt::Display for CssSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a scroll session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// An advance produced no growth, even after the stall grace period
    Stalled,
    /// The configured page budget was used up
    BudgetReached,
    /// The session deadline passed
    DeadlineExceeded,
    /// The iteration cap was hit before the page settled
    IterationLimit,
}

impl TerminationReason {
    /// Whether the page settled on its own rather than being cut off by a cap.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Stalled)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stalled => "stalled",
            Self::BudgetReached => "budget reached",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::IterationLimit => "iteration limit",
        };
        f.write_str(s)
    }
}

/// Result of one scroll session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhaustOutcome {
    /// Number of advances that grew the document
    pub pages_visited: u32,
    /// Why the session stopped
    pub reason: TerminationReason,
    /// Number of advance actions performed
    pub iterations: u32,
    /// Number of stalls observed
    pub stalls: u32,
    /// Content height at the last measurement
    pub final_height: u64,
    /// Base delay in effect when the session ended
    pub final_delay_ms: u64,
    /// Wall-clock duration of the session
    pub elapsed_ms: u64,
    /// When the session ended
    pub finished_at: DateTime<Utc>,
}
