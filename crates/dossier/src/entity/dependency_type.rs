//! Dependency kinds as declared in manifests.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

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
pub enum DependencyType {
    #[sea_orm(string_value = "runtime")]
    #[default]
    Runtime,
    #[sea_orm(string_value = "dev")]
    Dev,
    #[sea_orm(string_value = "optional")]
    Optional,
    #[sea_orm(string_value = "peer")]
    Peer,
}

impl DependencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Runtime => "runtime",
            DependencyType::Dev => "dev",
            DependencyType::Optional => "optional",
            DependencyType::Peer => "peer",
        }
    }
}

impl std::fmt::Display for DependencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
