use std::path::Path;

use dossier::ProjectModel;
use dossier::store::{self, NewProject, components, metadata, projects, sections};
use sea_orm::DatabaseConnection;
use tabled::Tabled;

use crate::ProjectsAction;
use crate::commands::shared::{confirm, open_db, or_dash, print_table, report, truncate};

const DESCRIPTION_WIDTH: usize = 50;

#[derive(Debug, Tabled)]
struct ProjectRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Stars")]
    stars: String,
    #[tabled(rename = "Synced")]
    synced: String,
}

#[derive(Debug, Tabled)]
struct ProjectDetailRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Repository")]
    repository: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Stars")]
    stars: String,
    #[tabled(rename = "Last Synced")]
    synced: String,
}

fn synced_label(project: &ProjectModel) -> String {
    project
        .last_synced_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl From<&ProjectModel> for ProjectRow {
    fn from(p: &ProjectModel) -> Self {
        Self {
            name: p.name.clone(),
            language: or_dash(p.github_language.as_deref()),
            stars: p.github_stars.map_or_else(|| "-".to_string(), |s| s.to_string()),
            synced: if p.last_synced_at.is_some() { "yes" } else { "no" }.to_string(),
        }
    }
}

impl From<&ProjectModel> for ProjectDetailRow {
    fn from(p: &ProjectModel) -> Self {
        Self {
            name: p.name.clone(),
            description: truncate(p.description.as_deref().unwrap_or("-"), DESCRIPTION_WIDTH),
            repository: or_dash(p.repository_url.as_deref()),
            language: or_dash(p.github_language.as_deref()),
            stars: p.github_stars.map_or_else(|| "-".to_string(), |s| s.to_string()),
            synced: synced_label(p),
        }
    }
}

/// Everything `projects show` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProjectDetails {
    pub project: ProjectModel,
    pub sections: u64,
    /// `(label, count)` for each metadata table.
    pub counts: Vec<(&'static str, usize)>,
    pub latest_version: Option<String>,
    pub components: Vec<String>,
    pub parents: Vec<String>,
}

pub(crate) async fn load_details(
    db: &DatabaseConnection,
    name: &str,
) -> store::Result<ProjectDetails> {
    let project = projects::get_by_name(db, name).await?;
    let id = project.id;
    let counts = vec![
        ("Languages", metadata::languages(db, id).await?.len()),
        ("Dependencies", metadata::dependencies(db, id).await?.len()),
        ("Contributors", metadata::contributors(db, id).await?.len()),
        ("Issues", metadata::issues(db, id).await?.len()),
        ("Pull requests", metadata::pull_requests(db, id).await?.len()),
        ("Releases", metadata::releases(db, id).await?.len()),
        ("Branches", metadata::branches(db, id).await?.len()),
        ("Versions", metadata::versions(db, id).await?.len()),
    ];
    Ok(ProjectDetails {
        sections: sections::count_for_project(db, id).await?,
        counts,
        latest_version: metadata::latest_version(db, id).await?.map(|v| v.version),
        components: components::children(db, id)
            .await?
            .into_iter()
            .map(|(link, child)| format!("{} ({})", child.name, link.relationship_type))
            .collect(),
        parents: components::parents(db, id)
            .await?
            .into_iter()
            .map(|(_, parent)| parent.name)
            .collect(),
        project,
    })
}

fn print_details(details: &ProjectDetails) {
    let p = &details.project;
    println!("{}", p.name);
    if let Some(description) = &p.description {
        println!("  {description}");
    }
    println!();
    println!("  Repository:     {}", or_dash(p.repository_url.as_deref()));
    println!("  Docs path:      {}", or_dash(p.documentation_path.as_deref()));
    println!("  Language:       {}", or_dash(p.github_language.as_deref()));
    if let Some(stars) = p.github_stars {
        println!("  Stars:          {stars}");
    }
    println!("  Latest version: {}", or_dash(details.latest_version.as_deref()));
    println!("  Last synced:    {}", synced_label(p));
    println!("  Sections:       {}", details.sections);
    for (label, count) in details.counts.iter().filter(|(_, n)| *n > 0) {
        println!("  {:<15} {count}", format!("{label}:"));
    }
    if !details.components.is_empty() {
        println!("  Components:     {}", details.components.join(", "));
    }
    if !details.parents.is_empty() {
        println!("  Part of:        {}", details.parents.join(", "));
    }
}

pub(crate) async fn handle_projects(
    action: ProjectsAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(database_url).await?;

    match action {
        ProjectsAction::List { verbose, synced } => {
            let list = if synced {
                projects::list_synced(&db).await?
            } else {
                projects::list(&db).await?
            };
            if list.is_empty() {
                println!("No projects yet. Add one with: dossier projects add <name>");
                return Ok(());
            }
            if verbose {
                print_table(list.iter().map(ProjectDetailRow::from));
            } else {
                print_table(list.iter().map(ProjectRow::from));
            }
            println!("{} project(s)", list.len());
        }
        ProjectsAction::Add {
            name,
            description,
            repository,
            docs_path,
        } => {
            let project = projects::create(
                &db,
                NewProject {
                    name,
                    description,
                    repository_url: repository,
                    documentation_path: docs_path.as_deref().map(display_path),
                },
            )
            .await?;
            report(format!("Created project '{}'", project.name));
        }
        ProjectsAction::Remove { name, yes } => {
            // Fail on a missing project before prompting.
            projects::get_by_name(&db, &name).await?;
            let prompt = format!(
                "Remove '{name}' with its sections, component links and metadata?"
            );
            if !confirm(&prompt, yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            projects::remove(&db, &name).await?;
            report(format!("Removed project '{name}'"));
        }
        ProjectsAction::Show { name } => {
            print_details(&load_details(&db, &name).await?);
        }
        ProjectsAction::Rename { old, new } => {
            let project = projects::rename(&db, &old, &new).await?;
            report(format!("Renamed '{old}' to '{}'", project.name));
        }
    }

    Ok(())
}

fn display_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use dossier::RelationshipType;
    use dossier::connect_and_migrate;

    #[tokio::test]
    async fn details_collect_counts_and_links() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let suite = projects::create(&db, NewProject::named("suite")).await.expect("suite");
        let core = projects::create(
            &db,
            NewProject {
                description: Some("The core".into()),
                ..NewProject::named("acme/core")
            },
        )
        .await
        .expect("core");
        components::add(&db, &suite, &core, RelationshipType::Dependency, 0)
            .await
            .expect("link");

        let details = load_details(&db, "acme/core").await.expect("details");
        assert_eq!(details.sections, 0);
        assert_eq!(details.parents, vec!["suite".to_string()]);
        assert!(details.counts.iter().all(|(_, n)| *n == 0));
        assert_eq!(details.latest_version, None);

        let suite_details = load_details(&db, "suite").await.expect("details");
        assert_eq!(suite_details.components, vec!["acme/core (dependency)".to_string()]);
    }

    #[tokio::test]
    async fn details_for_missing_project_fail() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let err = load_details(&db, "ghost").await.expect_err("missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn rows_fill_missing_fields() {
        let now = chrono::Utc::now().fixed_offset();
        let project = ProjectModel {
            id: Default::default(),
            name: "local".into(),
            full_name: None,
            description: Some("x".repeat(80)),
            repository_url: None,
            documentation_path: None,
            github_owner: None,
            github_repo: None,
            github_stars: None,
            github_language: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        };
        let row = ProjectRow::from(&project);
        assert_eq!(row.stars, "-");
        assert_eq!(row.synced, "no");
        let detail = ProjectDetailRow::from(&project);
        assert_eq!(detail.description.chars().count(), DESCRIPTION_WIDTH);
        assert_eq!(detail.synced, "-");
    }
}
