pub mod aggregate;
pub mod composite;
pub mod document;
pub mod overrides;
pub mod resolver;
pub mod writer;

pub use aggregate::aggregate_source;
pub use composite::{ComponentInput, ComponentScore, CompositeScore};
pub use document::{CategoryScore, ProfileDocument, SourceProfile, TopCategory};
pub use overrides::apply_category_override;
pub use resolver::{Resolution, ResolutionTier, ResolvedMatch, Resolver};
pub use writer::{sanitize_entity_id, write_profile, WriteError};

use serde::{Deserialize, Serialize};

/// Five-tier rating shared by every score in the system. Ratings are always
/// re-derived from a weighted numeric score, never averaged as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Relatively Low")]
    RelativelyLow,
    #[serde(rename = "Relatively Moderate")]
    RelativelyModerate,
    #[serde(rename = "Relatively High")]
    RelativelyHigh,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Rating {
    /// Maps a score in [0, 1] through the fixed quintile breakpoints.
    pub fn from_unit(score: f64) -> Self {
        if !score.is_finite() {
            return Self::VeryLow;
        }

        if score >= 0.80 {
            Self::VeryHigh
        } else if score >= 0.60 {
            Self::RelativelyHigh
        } else if score >= 0.40 {
            Self::RelativelyModerate
        } else if score >= 0.20 {
            Self::RelativelyLow
        } else {
            Self::VeryLow
        }
    }

    /// Maps a score in [0, scale] through the same breakpoints.
    pub fn from_scaled(score: f64, scale: f64) -> Self {
        if scale <= 0.0 {
            return Self::VeryLow;
        }
        Self::from_unit(score / scale)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::RelativelyLow => "Relatively Low",
            Self::RelativelyModerate => "Relatively Moderate",
            Self::RelativelyHigh => "Relatively High",
            Self::VeryHigh => "Very High",
        }
    }
}

/// How well an entity's data resolved through the fallback chain for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Full,
    Partial,
    Unavailable,
}

impl CoverageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::Unavailable => "unavailable",
        }
    }
}
