//! Dossier reports: a portable YAML overview of one project.
//!
//! A report is assembled from the stored project, its sections and its
//! GitHub metadata. Empty blocks are left out of the output so a local
//! project without any sync produces a short file.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::prelude::{ProjectModel, SectionType};
use crate::store::{self, metadata, sections};

/// Format version written to `dossier.version`.
pub const DOSSIER_VERSION: &str = "1.0";

/// File extension used by `export`.
pub const DOSSIER_EXTENSION: &str = "dossier";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] store::StoreError),

    #[error("Invalid dossier YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid dossier: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub dossier: DossierHeader,
    pub project: ProjectBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<Overview>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<TechEntry>,
    /// Keyed by dependency type (`runtime`, `dev`, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Vec<DependencyEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<VersionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DossierHeader {
    pub version: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBlock {
    pub name: String,
    pub description: Option<String>,
    pub repository: Option<String>,
    pub language: Option<String>,
    pub stars: Option<i32>,
    pub synced_at: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub summary: String,
    pub readme_title: Option<String>,
    pub doc_sections: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechEntry {
    pub name: String,
    /// Rounded to one decimal.
    pub percentage: f64,
    pub bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEntry {
    pub name: String,
    pub version: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub last_release: Option<String>,
    pub release_date: Option<DateTime<FixedOffset>>,
    pub open_issues: usize,
    pub open_prs: usize,
    pub contributors: usize,
    pub branches: usize,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemverBlock {
    pub major: i32,
    pub minor: i32,
    pub patch: i32,
    pub prerelease: Option<String>,
    pub build_metadata: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: String,
    pub semver: SemverBlock,
    pub source: String,
    pub is_latest: bool,
    pub release_url: Option<String>,
    pub changelog_url: Option<String>,
    pub release_date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub repository: Option<String>,
    pub issues: String,
    pub pull_requests: String,
    pub releases: String,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn is_readme(section: &crate::entity::prelude::DocumentSectionModel) -> bool {
    section.section_type == SectionType::Readme
        || section
            .source_file
            .as_deref()
            .is_some_and(|f| f.to_lowercase().ends_with("readme.md"))
}

/// Build the report for `project`.
pub async fn generate(
    db: &DatabaseConnection,
    project: &ProjectModel,
    include_docs: bool,
    include_activity: bool,
) -> Result<Dossier> {
    let mut report = Dossier {
        dossier: DossierHeader {
            version: DOSSIER_VERSION.to_string(),
            generated_at: Utc::now(),
        },
        project: ProjectBlock {
            name: project.name.clone(),
            description: project.description.clone(),
            repository: project.repository_url.clone(),
            language: project.github_language.clone(),
            stars: project.github_stars,
            synced_at: project.last_synced_at,
            version: None,
        },
        overview: None,
        tech_stack: Vec::new(),
        dependencies: BTreeMap::new(),
        activity: None,
        versions: Vec::new(),
        links: None,
    };

    if include_docs {
        let docs = sections::for_project(db, project.id).await?;
        report.overview = Some(Overview {
            summary: project.description.clone().unwrap_or_default(),
            readme_title: docs.iter().find(|s| is_readme(s)).map(|s| s.title.clone()),
            doc_sections: docs.len(),
        });
    }

    let mut languages = metadata::languages(db, project.id).await?;
    languages.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));
    report.tech_stack = languages
        .into_iter()
        .map(|l| TechEntry {
            name: l.language,
            percentage: round1(l.percentage),
            bytes: l.bytes_count,
        })
        .collect();

    for dep in metadata::dependencies(db, project.id).await? {
        report
            .dependencies
            .entry(dep.dep_type.as_str().to_string())
            .or_default()
            .push(DependencyEntry {
                name: dep.name,
                version: dep.version_spec,
                source: dep.source,
            });
    }
    for group in report.dependencies.values_mut() {
        group.sort_by(|a, b| a.name.cmp(&b.name));
    }

    if include_activity {
        let branches = metadata::branches(db, project.id).await?;
        let releases = metadata::releases(db, project.id).await?;
        let latest_release = releases.first();
        let issues = metadata::issues(db, project.id).await?;
        let pulls = metadata::pull_requests(db, project.id).await?;
        let contributors = metadata::contributors(db, project.id).await?;

        report.activity = Some(Activity {
            last_release: latest_release.map(|r| r.tag_name.clone()),
            release_date: latest_release.and_then(|r| r.release_published_at),
            open_issues: issues.iter().filter(|i| i.state == "open").count(),
            open_prs: pulls.iter().filter(|p| p.state == "open").count(),
            contributors: contributors.len(),
            branches: branches.len(),
            default_branch: branches.iter().find(|b| b.is_default).map(|b| b.name.clone()),
        });
    }

    let versions = metadata::versions(db, project.id).await?;
    report.project.version = versions
        .iter()
        .find(|v| v.is_latest)
        .or_else(|| versions.first())
        .map(|v| v.version.clone());
    report.versions = versions
        .into_iter()
        .map(|v| VersionEntry {
            semver: SemverBlock {
                major: v.major,
                minor: v.minor,
                patch: v.patch,
                prerelease: v.prerelease,
                build_metadata: v.build_metadata,
            },
            version: v.version,
            source: v.source,
            is_latest: v.is_latest,
            release_url: v.release_url,
            changelog_url: v.changelog_url,
            release_date: v.release_date,
        })
        .collect();

    if let (Some(owner), Some(repo)) = (&project.github_owner, &project.github_repo) {
        let base = format!("https://github.com/{owner}/{repo}");
        report.links = Some(Links {
            repository: project.repository_url.clone(),
            issues: format!("{base}/issues"),
            pull_requests: format!("{base}/pulls"),
            releases: format!("{base}/releases"),
        });
    }

    Ok(report)
}

/// Placeholder text in a [`Dossier::template`].
pub const TEMPLATE_TODO: &str = "TODO";

impl Dossier {
    /// A hand-editable starting point for a project that has not been
    /// synced or parsed.
    #[must_use]
    pub fn template(name: &str) -> Self {
        let todo = |what: &str| format!("{TEMPLATE_TODO}: Add {what}");
        Self {
            dossier: DossierHeader {
                version: DOSSIER_VERSION.to_string(),
                generated_at: Utc::now(),
            },
            project: ProjectBlock {
                name: name.to_string(),
                description: Some(todo("project description")),
                repository: None,
                language: None,
                stars: None,
                synced_at: None,
                version: None,
            },
            overview: Some(Overview {
                summary: todo("a one-paragraph summary"),
                readme_title: None,
                doc_sections: 0,
            }),
            tech_stack: vec![TechEntry {
                name: TEMPLATE_TODO.to_string(),
                percentage: 100.0,
                bytes: 0,
            }],
            dependencies: BTreeMap::from([(
                "runtime".to_string(),
                vec![DependencyEntry {
                    name: TEMPLATE_TODO.to_string(),
                    version: Some("^1.0".to_string()),
                    source: "manual".to_string(),
                }],
            )]),
            activity: None,
            versions: Vec::new(),
            links: None,
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a `.dossier` document. The required sections are checked with
    /// [`validate`] before the typed parse, so a file missing them fails
    /// with [`ReportError::Invalid`] listing every problem.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let document: serde_yaml::Value = serde_yaml::from_str(text)?;
        let problems = validate(&document);
        if !problems.is_empty() {
            return Err(ReportError::Invalid { problems });
        }
        Ok(serde_yaml::from_value(document)?)
    }
}

/// Problems with a parsed `.dossier` document; empty when it is valid.
#[must_use]
pub fn validate(document: &serde_yaml::Value) -> Vec<String> {
    let mut errors = Vec::new();
    match document.get("dossier") {
        None => errors.push("Missing required 'dossier' section".to_string()),
        Some(header) if header.get("version").is_none() => {
            errors.push("Missing dossier version".to_string());
        }
        Some(_) => {}
    }
    match document.get("project") {
        None => errors.push("Missing required 'project' section".to_string()),
        Some(project) if project.get("name").is_none() => {
            errors.push("Missing project name".to_string());
        }
        Some(_) => {}
    }
    errors
}

/// Default output file name: `owner/repo` becomes `owner_repo.dossier`.
#[must_use]
pub fn default_file_name(project_name: &str) -> String {
    file_name_with_extension(project_name, DOSSIER_EXTENSION)
}

/// `project_name` with `/` replaced by `_`, plus `.{extension}`.
#[must_use]
pub fn file_name_with_extension(project_name: &str, extension: &str) -> String {
    format!("{}.{extension}", project_name.replace('/', "_"))
}
