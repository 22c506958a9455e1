//! Documentation detail levels.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How deep a section goes, from elevator pitch to internals.
///
/// Variants are ordered: a query for `Overview` also returns `Summary`.
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
pub enum DocLevel {
    #[sea_orm(string_value = "summary")]
    Summary,
    #[sea_orm(string_value = "overview")]
    #[default]
    Overview,
    #[sea_orm(string_value = "detailed")]
    Detailed,
    #[sea_orm(string_value = "technical")]
    Technical,
}

impl DocLevel {
    pub const ALL: [DocLevel; 4] = [
        DocLevel::Summary,
        DocLevel::Overview,
        DocLevel::Detailed,
        DocLevel::Technical,
    ];

    /// Level for a Markdown heading of the given depth (1-6).
    pub fn from_heading_depth(depth: usize) -> Self {
        match depth {
            0 | 1 => DocLevel::Summary,
            2 => DocLevel::Overview,
            3 | 4 => DocLevel::Detailed,
            _ => DocLevel::Technical,
        }
    }

    /// This level and every shallower one.
    pub fn up_to(self) -> Vec<DocLevel> {
        Self::ALL.into_iter().filter(|l| *l <= self).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocLevel::Summary => "summary",
            DocLevel::Overview => "overview",
            DocLevel::Detailed => "detailed",
            DocLevel::Technical => "technical",
        }
    }
}

impl std::fmt::Display for DocLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(DocLevel::Summary),
            "overview" => Ok(DocLevel::Overview),
            "detailed" => Ok(DocLevel::Detailed),
            "technical" => Ok(DocLevel::Technical),
            _ => Err(format!("Unknown documentation level: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_depth_mapping() {
        assert_eq!(DocLevel::from_heading_depth(1), DocLevel::Summary);
        assert_eq!(DocLevel::from_heading_depth(2), DocLevel::Overview);
        assert_eq!(DocLevel::from_heading_depth(3), DocLevel::Detailed);
        assert_eq!(DocLevel::from_heading_depth(4), DocLevel::Detailed);
        assert_eq!(DocLevel::from_heading_depth(5), DocLevel::Technical);
        assert_eq!(DocLevel::from_heading_depth(6), DocLevel::Technical);
    }

    #[test]
    fn up_to_includes_shallower_levels() {
        assert_eq!(DocLevel::Summary.up_to(), vec![DocLevel::Summary]);
        assert_eq!(
            DocLevel::Detailed.up_to(),
            vec![DocLevel::Summary, DocLevel::Overview, DocLevel::Detailed]
        );
        assert_eq!(DocLevel::Technical.up_to().len(), 4);
    }

    #[test]
    fn parse_and_display_round_trip_names() {
        for level in DocLevel::ALL {
            assert_eq!(level.to_string().parse::<DocLevel>(), Ok(level));
        }
        assert_eq!("DETAILED".parse::<DocLevel>(), Ok(DocLevel::Detailed));
        assert!("deep".parse::<DocLevel>().is_err());
    }

    #[test]
    fn serde_uses_lowercase() {
        assert_eq!(
            serde_json::to_string(&DocLevel::Technical).expect("serialize"),
            "\"technical\""
        );
    }
}
