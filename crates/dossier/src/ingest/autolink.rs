//! Builds a component graph out of a project's synced data.
//!
//! Each contributor, language, dependency, branch, issue, pull request,
//! version and doc section becomes a project of its own, linked under the
//! project it came from. Names are scoped so that shared things resolve to
//! one project everywhere:
//!
//! - global: `lang/<language>`, `pkg/<package>`
//! - per GitHub user: `github/user/<login>`
//! - per repository: `<owner>/<repo>/branch/<name>`, `<owner>/<repo>/issue/<n>`,
//!   `<owner>/<repo>/pr/<n>`, `<owner>/<repo>/ver/v<version>`,
//!   `<owner>/<repo>/doc/<type>-<slug>`
//!
//! Running it again finds the existing projects and links instead of
//! duplicating them.

use std::collections::HashMap;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info};

use crate::entity::prelude::{ProjectModel, RelationshipType};
use crate::store::{self, EntityProject, StoreError, components, metadata, projects, sections};

/// Longest issue or PR title carried into a description.
const TITLE_CHARS: usize = 80;
/// Longest title slug in a doc project name.
const DOC_SLUG_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutolinkOptions {
    pub contributors: bool,
    pub languages: bool,
    pub dependencies: bool,
    pub branches: bool,
    pub issues: bool,
    pub pull_requests: bool,
    pub versions: bool,
    pub docs: bool,
    pub max_contributors: usize,
    pub max_issues: usize,
    pub max_pull_requests: usize,
}

impl Default for AutolinkOptions {
    fn default() -> Self {
        Self {
            contributors: true,
            languages: true,
            dependencies: true,
            branches: true,
            issues: true,
            pull_requests: true,
            versions: true,
            docs: true,
            max_contributors: 10,
            max_issues: 50,
            max_pull_requests: 50,
        }
    }
}

/// What a run created versus found already in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub projects_created: usize,
    pub projects_found: usize,
    pub links_created: usize,
    pub links_found: usize,
    /// Links that could not be made, e.g. a project pointing at itself.
    pub errors: Vec<String>,
}

impl LinkStats {
    pub fn total_projects(&self) -> usize {
        self.projects_created + self.projects_found
    }

    pub fn total_links(&self) -> usize {
        self.links_created + self.links_found
    }

    fn absorb(&mut self, other: LinkStats) {
        self.projects_created += other.projects_created;
        self.projects_found += other.projects_found;
        self.links_created += other.links_created;
        self.links_found += other.links_found;
        self.errors.extend(other.errors);
    }
}

pub fn language_project_name(language: &str) -> String {
    format!("lang/{}", language.to_lowercase())
}

pub fn package_project_name(package: &str) -> String {
    format!("pkg/{}", package.to_lowercase())
}

pub fn user_project_name(login: &str) -> String {
    format!("github/user/{}", login.to_lowercase())
}

fn branch_project_name(owner: &str, repo: &str, branch: &str) -> String {
    format!("{owner}/{repo}/branch/{}", branch.replace('/', "-"))
}

fn version_project_name(owner: &str, repo: &str, version: &str) -> String {
    let version = version.trim_start_matches('v').replace('/', "-");
    format!("{owner}/{repo}/ver/v{version}")
}

fn doc_project_name(owner: &str, repo: &str, section_type: &str, title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .take(DOC_SLUG_CHARS)
        .collect();
    format!("{owner}/{repo}/doc/{section_type}-{slug}")
}

fn truncated_title(title: &str) -> String {
    match title.trim() {
        "" => "Untitled".to_string(),
        title => title.chars().take(TITLE_CHARS).collect(),
    }
}

/// Path within the repository for a section stored from GitHub.
fn repo_path<'a>(source_file: &'a str, owner: &str, repo: &str) -> Option<&'a str> {
    source_file
        .strip_prefix("github:")?
        .strip_prefix(owner)?
        .strip_prefix('/')?
        .strip_prefix(repo)?
        .strip_prefix('/')
        .filter(|path| !path.is_empty())
}

struct Linker<'a> {
    db: &'a DatabaseConnection,
    cache: HashMap<String, ProjectModel>,
    stats: LinkStats,
}

impl<'a> Linker<'a> {
    fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            cache: HashMap::new(),
            stats: LinkStats::default(),
        }
    }

    async fn entity(&mut self, entity: EntityProject) -> store::Result<ProjectModel> {
        if let Some(cached) = self.cache.get(&entity.name) {
            self.stats.projects_found += 1;
            return Ok(cached.clone());
        }
        let (project, created) = projects::find_or_create_entity(self.db, entity).await?;
        if created {
            debug!(project = %project.name, "created linked project");
            self.stats.projects_created += 1;
        } else {
            self.stats.projects_found += 1;
        }
        self.cache.insert(project.name.clone(), project.clone());
        Ok(project)
    }

    /// Find or create `entity` and link it under `parent`.
    async fn attach(
        &mut self,
        parent: &ProjectModel,
        entity: EntityProject,
        relationship_type: RelationshipType,
        order: usize,
    ) -> store::Result<()> {
        let child = self.entity(entity).await?;
        let order = i32::try_from(order).unwrap_or(i32::MAX);
        match components::add_if_missing(self.db, parent, &child, relationship_type, order).await {
            Ok(true) => self.stats.links_created += 1,
            Ok(false) => self.stats.links_found += 1,
            Err(e @ StoreError::SelfReference { .. }) => self.stats.errors.push(e.to_string()),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn contributors(&mut self, project: &ProjectModel, max: usize) -> store::Result<()> {
        let contributors = metadata::contributors(self.db, project.id).await?;
        for (i, contributor) in contributors.iter().take(max).enumerate() {
            let login = contributor.username.trim();
            if login.is_empty() {
                continue;
            }
            let entity = EntityProject {
                name: user_project_name(login),
                description: format!("GitHub user: {login}"),
                repository_url: Some(
                    contributor
                        .profile_url
                        .clone()
                        .unwrap_or_else(|| format!("https://github.com/{login}")),
                ),
                github_owner: Some(login.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Contributor, i).await?;
        }
        Ok(())
    }

    async fn languages(&mut self, project: &ProjectModel) -> store::Result<()> {
        for (i, language) in metadata::languages(self.db, project.id).await?.iter().enumerate() {
            if language.language.is_empty() {
                continue;
            }
            let entity = EntityProject {
                name: language_project_name(&language.language),
                description: format!("{} programming language", language.language),
                github_language: Some(language.language.clone()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Language, i).await?;
        }
        Ok(())
    }

    async fn dependencies(&mut self, project: &ProjectModel) -> store::Result<()> {
        for (i, dep) in metadata::dependencies(self.db, project.id).await?.iter().enumerate() {
            if dep.name.is_empty() {
                continue;
            }
            let description = match &dep.version_spec {
                Some(spec) => format!("{} package ({spec})", dep.name),
                None => format!("{} package", dep.name),
            };
            let entity = EntityProject {
                name: package_project_name(&dep.name),
                description,
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Dependency, i).await?;
        }
        Ok(())
    }

    async fn branches(&mut self, project: &ProjectModel, owner: &str, repo: &str) -> store::Result<()> {
        for (i, branch) in metadata::branches(self.db, project.id).await?.iter().enumerate() {
            let mut description = format!("Branch: {}", branch.name);
            if branch.is_default {
                description.push_str(" (default)");
            }
            let entity = EntityProject {
                name: branch_project_name(owner, repo, &branch.name),
                description,
                repository_url: Some(format!("https://github.com/{owner}/{repo}/tree/{}", branch.name)),
                github_owner: Some(owner.to_string()),
                github_repo: Some(repo.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Branch, i).await?;
        }
        Ok(())
    }

    async fn issues(&mut self, project: &ProjectModel, owner: &str, repo: &str, max: usize) -> store::Result<()> {
        let issues = metadata::issues(self.db, project.id).await?;
        for (i, issue) in issues.iter().take(max).enumerate() {
            let n = issue.issue_number;
            let entity = EntityProject {
                name: format!("{owner}/{repo}/issue/{n}"),
                description: format!("Issue #{n}: {}", truncated_title(&issue.title)),
                repository_url: Some(format!("https://github.com/{owner}/{repo}/issues/{n}")),
                github_owner: Some(owner.to_string()),
                github_repo: Some(repo.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Issue, i).await?;
        }
        Ok(())
    }

    async fn pull_requests(&mut self, project: &ProjectModel, owner: &str, repo: &str, max: usize) -> store::Result<()> {
        let pulls = metadata::pull_requests(self.db, project.id).await?;
        for (i, pr) in pulls.iter().take(max).enumerate() {
            let n = pr.pr_number;
            let mut description = format!("PR #{n}: {}", truncated_title(&pr.title));
            if pr.is_merged {
                description.push_str(" (merged)");
            }
            let entity = EntityProject {
                name: format!("{owner}/{repo}/pr/{n}"),
                description,
                repository_url: Some(format!("https://github.com/{owner}/{repo}/pull/{n}")),
                github_owner: Some(owner.to_string()),
                github_repo: Some(repo.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::PullRequest, i).await?;
        }
        Ok(())
    }

    /// Versions when any were derived, otherwise the raw releases.
    async fn versions(&mut self, project: &ProjectModel, owner: &str, repo: &str) -> store::Result<()> {
        let versions = metadata::versions(self.db, project.id).await?;
        let entries: Vec<(String, String, String)> = if versions.is_empty() {
            metadata::releases(self.db, project.id)
                .await?
                .into_iter()
                .map(|release| {
                    let description = match release.name.as_deref() {
                        Some(name) if !name.is_empty() && name != release.tag_name => {
                            format!("{name} ({})", release.tag_name)
                        }
                        _ => format!("Release {}", release.tag_name),
                    };
                    let url = format!("https://github.com/{owner}/{repo}/releases/tag/{}", release.tag_name);
                    (release.tag_name, description, url)
                })
                .collect()
        } else {
            versions
                .into_iter()
                .map(|version| {
                    let url = version.release_url.clone().unwrap_or_else(|| {
                        format!("https://github.com/{owner}/{repo}/releases/tag/{}", version.version)
                    });
                    let description = format!("Version {}", version.version);
                    (version.version, description, url)
                })
                .collect()
        };

        for (i, (version, description, url)) in entries.into_iter().enumerate() {
            if version.is_empty() {
                continue;
            }
            let entity = EntityProject {
                name: version_project_name(owner, repo, &version),
                description,
                repository_url: Some(url),
                github_owner: Some(owner.to_string()),
                github_repo: Some(repo.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Version, i).await?;
        }
        Ok(())
    }

    async fn docs(&mut self, project: &ProjectModel, owner: &str, repo: &str) -> store::Result<()> {
        for (i, section) in sections::for_project(self.db, project.id).await?.iter().enumerate() {
            if section.title.trim().is_empty() {
                continue;
            }
            let path = section
                .source_file
                .as_deref()
                .and_then(|source| repo_path(source, owner, repo));
            let entity = EntityProject {
                name: doc_project_name(owner, repo, section.section_type.as_str(), &section.title),
                description: format!("Documentation: {}", section.title),
                repository_url: path.map(|p| format!("https://github.com/{owner}/{repo}/blob/HEAD/{p}")),
                documentation_path: section.source_file.clone(),
                github_owner: Some(owner.to_string()),
                github_repo: Some(repo.to_string()),
                ..EntityProject::default()
            };
            self.attach(project, entity, RelationshipType::Doc, i).await?;
        }
        Ok(())
    }

    async fn build(&mut self, project: &ProjectModel, options: &AutolinkOptions) -> store::Result<()> {
        if options.contributors {
            self.contributors(project, options.max_contributors).await?;
        }
        if options.languages {
            self.languages(project).await?;
        }
        if options.dependencies {
            self.dependencies(project).await?;
        }

        let (Some(owner), Some(repo)) = (project.github_owner.as_deref(), project.github_repo.as_deref()) else {
            return Ok(());
        };
        if options.branches {
            self.branches(project, owner, repo).await?;
        }
        if options.issues {
            self.issues(project, owner, repo, options.max_issues).await?;
        }
        if options.pull_requests {
            self.pull_requests(project, owner, repo, options.max_pull_requests).await?;
        }
        if options.versions {
            self.versions(project, owner, repo).await?;
        }
        if options.docs {
            self.docs(project, owner, repo).await?;
        }
        Ok(())
    }
}

/// Link everything recorded for `project` under it. Repository-scoped
/// kinds need the project's GitHub owner and repo and are skipped without
/// them.
pub async fn build_graph(
    db: &DatabaseConnection,
    project: &ProjectModel,
    options: &AutolinkOptions,
) -> store::Result<LinkStats> {
    let mut linker = Linker::new(db);
    linker.build(project, options).await?;
    info!(
        project = %project.name,
        created = linker.stats.projects_created,
        links = linker.stats.links_created,
        "autolinked project"
    );
    Ok(linker.stats)
}

/// [`build_graph`] for every project with GitHub coordinates, sharing one
/// lookup cache across projects.
pub async fn build_all(db: &DatabaseConnection, options: &AutolinkOptions) -> store::Result<LinkStats> {
    let roots: Vec<ProjectModel> = projects::list(db)
        .await?
        .into_iter()
        .filter(|p| p.github_owner.is_some() && p.github_repo.is_some())
        .collect();

    let mut linker = Linker::new(db);
    let mut total = LinkStats::default();
    for project in &roots {
        linker.build(project, options).await?;
        total.absorb(std::mem::take(&mut linker.stats));
    }
    info!(
        projects = roots.len(),
        created = total.projects_created,
        links = total.links_created,
        "autolinked all projects"
    );
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_names() {
        assert_eq!(language_project_name("TypeScript"), "lang/typescript");
        assert_eq!(package_project_name("Serde_JSON"), "pkg/serde_json");
        assert_eq!(user_project_name("Octocat"), "github/user/octocat");
        assert_eq!(
            branch_project_name("acme", "widget", "feature/login"),
            "acme/widget/branch/feature-login"
        );
        assert_eq!(version_project_name("acme", "widget", "v1.2.0"), "acme/widget/ver/v1.2.0");
        assert_eq!(version_project_name("acme", "widget", "1.2.0"), "acme/widget/ver/v1.2.0");
    }

    #[test]
    fn doc_names_slug_and_cap_the_title() {
        assert_eq!(
            doc_project_name("acme", "widget", "setup", "Getting Started"),
            "acme/widget/doc/setup-getting-started"
        );
        let long = doc_project_name("a", "b", "general", &"x ".repeat(40));
        assert_eq!(long.trim_start_matches("a/b/doc/general-").chars().count(), DOC_SLUG_CHARS);
    }

    #[test]
    fn titles_are_truncated_or_defaulted() {
        assert_eq!(truncated_title("  "), "Untitled");
        assert_eq!(truncated_title(&"é".repeat(100)).chars().count(), TITLE_CHARS);
    }

    #[test]
    fn repo_paths_come_from_github_sources_only() {
        assert_eq!(repo_path("github:acme/widget/docs/guide.md", "acme", "widget"), Some("docs/guide.md"));
        assert_eq!(repo_path("github:acme/other/README.md", "acme", "widget"), None);
        assert_eq!(repo_path("docs/guide.md", "acme", "widget"), None);
    }

    #[test]
    fn stats_totals_and_merge() {
        let mut total = LinkStats {
            projects_created: 2,
            links_found: 1,
            ..LinkStats::default()
        };
        total.absorb(LinkStats {
            projects_found: 3,
            links_created: 4,
            errors: vec!["x".into()],
            ..LinkStats::default()
        });
        assert_eq!(total.total_projects(), 5);
        assert_eq!(total.total_links(), 5);
        assert_eq!(total.errors.len(), 1);
    }
}
