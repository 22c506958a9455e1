//! DeltaLink entity - ties a delta to an issue, PR, branch, doc or another
//! delta.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
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
pub enum DeltaLinkType {
    #[sea_orm(string_value = "issue")]
    Issue,
    #[sea_orm(string_value = "pr")]
    Pr,
    #[sea_orm(string_value = "branch")]
    Branch,
    #[sea_orm(string_value = "delta")]
    Delta,
    #[sea_orm(string_value = "doc")]
    Doc,
}

impl DeltaLinkType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaLinkType::Issue => "issue",
            DeltaLinkType::Pr => "pr",
            DeltaLinkType::Branch => "branch",
            DeltaLinkType::Delta => "delta",
            DeltaLinkType::Doc => "doc",
        }
    }

    /// Issues and PRs are addressed by number, the rest by name.
    pub fn takes_number(self) -> bool {
        matches!(self, DeltaLinkType::Issue | DeltaLinkType::Pr)
    }
}

impl std::fmt::Display for DeltaLinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeltaLinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "issue" => Ok(DeltaLinkType::Issue),
            "pr" | "pull_request" => Ok(DeltaLinkType::Pr),
            "branch" => Ok(DeltaLinkType::Branch),
            "delta" => Ok(DeltaLinkType::Delta),
            "doc" => Ok(DeltaLinkType::Doc),
            _ => Err(format!("Unknown delta link type: {s}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "delta_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub delta_id: Uuid,
    pub link_type: DeltaLinkType,
    /// Issue or PR number.
    pub target_number: Option<i64>,
    /// Branch, doc or delta name.
    pub target_name: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project_delta::Entity",
        from = "Column::DeltaId",
        to = "super::project_delta::Column::Id",
        on_delete = "Cascade"
    )]
    Delta,
}

impl Related<super::project_delta::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Delta.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `#12` for issues and PRs, the name otherwise.
    pub fn target(&self) -> String {
        match (self.target_number, &self.target_name) {
            (Some(n), _) => format!("#{n}"),
            (None, Some(name)) => name.clone(),
            (None, None) => "-".to_string(),
        }
    }
}
