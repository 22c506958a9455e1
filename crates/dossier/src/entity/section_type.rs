//! Section categories inferred from heading text.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

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
pub enum SectionType {
    #[sea_orm(string_value = "setup")]
    Setup,
    #[sea_orm(string_value = "api")]
    Api,
    #[sea_orm(string_value = "usage")]
    Usage,
    #[sea_orm(string_value = "configuration")]
    Configuration,
    #[sea_orm(string_value = "development")]
    Development,
    #[sea_orm(string_value = "readme")]
    Readme,
    #[sea_orm(string_value = "general")]
    #[default]
    General,
}

/// Checked in order; the first type with a matching keyword wins.
const KEYWORDS: &[(SectionType, &[&str])] = &[
    (
        SectionType::Setup,
        &["setup", "installation", "install", "getting started"],
    ),
    (SectionType::Api, &["api", "endpoint", "route"]),
    (
        SectionType::Usage,
        &["usage", "how to", "example", "tutorial"],
    ),
    (
        SectionType::Configuration,
        &["config", "configuration", "settings"],
    ),
    (
        SectionType::Development,
        &["development", "contributing", "developer"],
    ),
    (
        SectionType::Readme,
        &["readme", "about", "overview", "introduction"],
    ),
];

impl SectionType {
    /// Infer a type from a heading by case-insensitive substring match.
    pub fn infer(title: &str) -> Self {
        let title = title.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| title.contains(w)))
            .map(|(kind, _)| *kind)
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SectionType::Setup => "setup",
            SectionType::Api => "api",
            SectionType::Usage => "usage",
            SectionType::Configuration => "configuration",
            SectionType::Development => "development",
            SectionType::Readme => "readme",
            SectionType::General => "general",
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "setup" => Ok(SectionType::Setup),
            "api" => Ok(SectionType::Api),
            "usage" => Ok(SectionType::Usage),
            "configuration" => Ok(SectionType::Configuration),
            "development" => Ok(SectionType::Development),
            "readme" => Ok(SectionType::Readme),
            "general" => Ok(SectionType::General),
            _ => Err(format!("Unknown section type: {s}")),
        }
    }
}
