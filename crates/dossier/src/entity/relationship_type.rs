//! Kinds of parent/child links between projects.

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
pub enum RelationshipType {
    #[sea_orm(string_value = "component")]
    #[default]
    Component,
    #[sea_orm(string_value = "dependency")]
    Dependency,
    #[sea_orm(string_value = "related")]
    Related,

    // ─── Links built by the autolinker ───────────────────────────────────────
    #[sea_orm(string_value = "contributor")]
    Contributor,
    #[sea_orm(string_value = "language")]
    Language,
    #[sea_orm(string_value = "branch")]
    Branch,
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "pr")]
    #[serde(rename = "pr")]
    PullRequest,
    #[sea_orm(string_value = "version")]
    Version,
    #[sea_orm(string_value = "doc")]
    Doc,
}

impl RelationshipType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipType::Component => "component",
            RelationshipType::Dependency => "dependency",
            RelationshipType::Related => "related",
            RelationshipType::Contributor => "contributor",
            RelationshipType::Language => "language",
            RelationshipType::Branch => "branch",
            RelationshipType::Issue => "issue",
            RelationshipType::PullRequest => "pr",
            RelationshipType::Version => "version",
            RelationshipType::Doc => "doc",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "component" => Ok(RelationshipType::Component),
            "dependency" => Ok(RelationshipType::Dependency),
            "related" => Ok(RelationshipType::Related),
            "contributor" => Ok(RelationshipType::Contributor),
            "language" => Ok(RelationshipType::Language),
            "branch" => Ok(RelationshipType::Branch),
            "issue" => Ok(RelationshipType::Issue),
            "pr" | "pull_request" => Ok(RelationshipType::PullRequest),
            "version" => Ok(RelationshipType::Version),
            "doc" => Ok(RelationshipType::Doc),
            _ => Err(format!("Unknown relationship type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_component() {
        assert_eq!(RelationshipType::default(), RelationshipType::Component);
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!(
            "Dependency".parse::<RelationshipType>(),
            Ok(RelationshipType::Dependency)
        );
        assert!("sibling".parse::<RelationshipType>().is_err());
    }

    #[test]
    fn pull_request_links_are_stored_as_pr() {
        assert_eq!(RelationshipType::PullRequest.as_str(), "pr");
        assert_eq!("pr".parse::<RelationshipType>(), Ok(RelationshipType::PullRequest));
        assert_eq!(
            serde_json::to_string(&RelationshipType::PullRequest).expect("serialize"),
            "\"pr\""
        );
    }
}
