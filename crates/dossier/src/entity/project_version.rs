//! ProjectVersion entity - semantic versions derived from release tags.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,

    // ─── Version ─────────────────────────────────────────────────────────────
    /// The version string as found, e.g. `v1.2.3-rc.1`.
    pub version: String,
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub prerelease: Option<String>,
    pub build_metadata: Option<String>,

    // ─── Provenance ──────────────────────────────────────────────────────────
    /// `release`, `pyproject`, `package_json` or `manual`.
    pub source: String,
    pub release_id: Option<Uuid>,
    pub is_latest: bool,
    pub release_url: Option<String>,
    /// Changes since the previous version, as a GitHub compare link.
    pub changelog_url: Option<String>,
    pub release_date: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn semver(&self) -> SemVer {
        SemVer {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            prerelease: self.prerelease.clone(),
            build_metadata: self.build_metadata.clone(),
        }
    }
}

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-([0-9A-Za-z.-]+))?(?:\+([0-9A-Za-z.-]+))?$")
        .expect("semver pattern is valid")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Parsed `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`.
///
/// Equality and ordering follow semver precedence, so build metadata is
/// ignored by both.
#[derive(Debug, Clone, Default)]
pub struct SemVer {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub prerelease: Option<String>,
    pub build_metadata: Option<String>,
}

impl SemVer {
    /// Lenient parse: a leading `v`/`V` is ignored, missing components are
    /// zero, and strings that are not semver yield their first three digit
    /// runs (`release-2024.05` → 2024.5.0).
    pub fn parse(input: &str) -> Self {
        let ver = input.trim().trim_start_matches(['v', 'V']);
        let num = |m: Option<regex::Match<'_>>| {
            m.and_then(|m| m.as_str().parse::<i32>().ok())
                .unwrap_or(0)
        };

        if let Some(caps) = SEMVER.captures(ver) {
            return Self {
                major: num(caps.get(1)),
                minor: num(caps.get(2)),
                patch: num(caps.get(3)),
                prerelease: caps.get(4).map(|m| m.as_str().to_string()),
                build_metadata: caps.get(5).map(|m| m.as_str().to_string()),
            };
        }

        let mut digits = DIGITS.find_iter(ver);
        Self {
            major: num(digits.next()),
            minor: num(digits.next()),
            patch: num(digits.next()),
            prerelease: None,
            build_metadata: None,
        }
    }

    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

/// Dot-separated prerelease identifiers: numeric ones compare numerically
/// and sort below alphanumeric ones; a shorter list of equal identifiers
/// sorts first.
fn cmp_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl PartialEq for SemVer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemVer {}

impl PartialOrd for SemVer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Precedence ignores build metadata; a prerelease sorts below its release.
impl Ord for SemVer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => cmp_prerelease(a, b),
            })
    }
}

impl std::fmt::Display for SemVer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(build) = &self.build_metadata {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}
