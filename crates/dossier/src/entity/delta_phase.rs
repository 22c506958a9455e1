//! Lifecycle phases, priorities and kinds of a project delta.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where a delta stands. Work moves forward one phase at a time from
/// `Brainstorm` to `Complete`; `Abandoned` is outside the sequence.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DeltaPhase {
    #[sea_orm(string_value = "brainstorm")]
    #[default]
    Brainstorm,
    #[sea_orm(string_value = "planning")]
    Planning,
    #[sea_orm(string_value = "implementation")]
    Implementation,
    #[sea_orm(string_value = "review")]
    Review,
    #[sea_orm(string_value = "documentation")]
    Documentation,
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "abandoned")]
    Abandoned,
}

impl DeltaPhase {
    /// The forward sequence.
    pub const ORDER: [DeltaPhase; 6] = [
        DeltaPhase::Brainstorm,
        DeltaPhase::Planning,
        DeltaPhase::Implementation,
        DeltaPhase::Review,
        DeltaPhase::Documentation,
        DeltaPhase::Complete,
    ];

    /// The phase after this one, or `None` at the end of the sequence and
    /// for abandoned deltas.
    pub fn next(self) -> Option<DeltaPhase> {
        let index = Self::ORDER.iter().position(|p| *p == self)?;
        Self::ORDER.get(index + 1).copied()
    }

    /// Complete or abandoned.
    pub fn is_closed(self) -> bool {
        matches!(self, DeltaPhase::Complete | DeltaPhase::Abandoned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeltaPhase::Brainstorm => "brainstorm",
            DeltaPhase::Planning => "planning",
            DeltaPhase::Implementation => "implementation",
            DeltaPhase::Review => "review",
            DeltaPhase::Documentation => "documentation",
            DeltaPhase::Complete => "complete",
            DeltaPhase::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for DeltaPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeltaPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brainstorm" => Ok(DeltaPhase::Brainstorm),
            "planning" => Ok(DeltaPhase::Planning),
            "implementation" => Ok(DeltaPhase::Implementation),
            "review" => Ok(DeltaPhase::Review),
            "documentation" => Ok(DeltaPhase::Documentation),
            "complete" => Ok(DeltaPhase::Complete),
            "abandoned" => Ok(DeltaPhase::Abandoned),
            _ => Err(format!("Unknown delta phase: {s}")),
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DeltaPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    #[default]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "critical")]
    Critical,
}

impl DeltaPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaPriority::Low => "low",
            DeltaPriority::Medium => "medium",
            DeltaPriority::High => "high",
            DeltaPriority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for DeltaPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeltaPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(DeltaPriority::Low),
            "medium" => Ok(DeltaPriority::Medium),
            "high" => Ok(DeltaPriority::High),
            "critical" => Ok(DeltaPriority::Critical),
            _ => Err(format!("Unknown delta priority: {s}")),
        }
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum DeltaType {
    #[sea_orm(string_value = "feature")]
    #[default]
    Feature,
    #[sea_orm(string_value = "bugfix")]
    Bugfix,
    #[sea_orm(string_value = "refactor")]
    Refactor,
    #[sea_orm(string_value = "docs")]
    Docs,
    #[sea_orm(string_value = "chore")]
    Chore,
}

impl DeltaType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaType::Feature => "feature",
            DeltaType::Bugfix => "bugfix",
            DeltaType::Refactor => "refactor",
            DeltaType::Docs => "docs",
            DeltaType::Chore => "chore",
        }
    }
}

impl std::fmt::Display for DeltaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeltaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feature" => Ok(DeltaType::Feature),
            "bugfix" | "fix" => Ok(DeltaType::Bugfix),
            "refactor" => Ok(DeltaType::Refactor),
            "docs" => Ok(DeltaType::Docs),
            "chore" => Ok(DeltaType::Chore),
            _ => Err(format!("Unknown delta type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order_and_stop_at_complete() {
        let mut phase = DeltaPhase::default();
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            phase = next;
            seen.push(phase);
        }
        assert_eq!(seen, DeltaPhase::ORDER.to_vec());
        assert_eq!(DeltaPhase::Abandoned.next(), None);
    }

    #[test]
    fn closed_phases() {
        assert!(DeltaPhase::Complete.is_closed());
        assert!(DeltaPhase::Abandoned.is_closed());
        assert!(!DeltaPhase::Review.is_closed());
    }

    #[test]
    fn parse_names() {
        assert_eq!("Review".parse::<DeltaPhase>(), Ok(DeltaPhase::Review));
        assert_eq!("fix".parse::<DeltaType>(), Ok(DeltaType::Bugfix));
        assert_eq!("CRITICAL".parse::<DeltaPriority>(), Ok(DeltaPriority::Critical));
        assert!("urgent".parse::<DeltaPriority>().is_err());
        assert!(DeltaPriority::Critical > DeltaPriority::Low);
    }
}
