//! Maintenance helpers for local databases.

use std::path::PathBuf;

use dossier::parsers::ParsedSection;
use dossier::store::{self, ClearScope, NewProject, components, projects, sections, stats};
use dossier::{DocLevel, RelationshipType, SectionType};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::Serialize;

use crate::commands::shared::{confirm, open_db, report, sqlite_path};
use crate::{DevAction, DumpFormat};

/// Projects listed under "recently synced" in `dev status`.
const RECENT_SYNCS: u64 = 5;

pub(crate) const EXAMPLE_PROJECT: &str = "example-project";
pub(crate) const EXAMPLE_SUITE: &str = "example-suite";
pub(crate) const EXAMPLE_LIBRARY: &str = "example-library";

#[derive(Debug, Serialize)]
pub(crate) struct DumpProject {
    pub name: String,
    pub description: Option<String>,
    pub github_owner: Option<String>,
    pub github_stars: Option<i32>,
    pub last_synced_at: Option<String>,
    pub doc_count: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct DumpComponent {
    pub parent: String,
    pub child: String,
    pub relationship_type: RelationshipType,
    pub order: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct Dump {
    pub projects: Vec<DumpProject>,
    pub components: Vec<DumpComponent>,
    pub stats: stats::DatabaseStats,
}

pub(crate) async fn build_dump(db: &DatabaseConnection) -> store::Result<Dump> {
    let mut dumped = Vec::new();
    for project in projects::list(db).await? {
        dumped.push(DumpProject {
            doc_count: sections::count_for_project(db, project.id).await?,
            last_synced_at: project.last_synced_at.map(|at| at.to_rfc3339()),
            name: project.name,
            description: project.description,
            github_owner: project.github_owner,
            github_stars: project.github_stars,
        });
    }
    let links = components::list_all(db, None)
        .await?
        .into_iter()
        .map(|l| DumpComponent {
            parent: l.parent,
            child: l.child,
            relationship_type: l.relationship_type,
            order: l.order,
        })
        .collect();
    Ok(Dump {
        projects: dumped,
        components: links,
        stats: stats::collect(db, RECENT_SYNCS).await?,
    })
}

pub(crate) fn render_summary(dump: &Dump) -> String {
    let mut lines = vec!["=== Database Dump ===".to_string(), String::new()];
    lines.push(format!("Projects ({}):", dump.projects.len()));
    for p in &dump.projects {
        lines.push(format!("  {} ({} docs)", p.name, p.doc_count));
    }
    lines.push(String::new());
    lines.push(format!("Components ({}):", dump.components.len()));
    for c in &dump.components {
        lines.push(format!("  {} -> {} [{}]", c.parent, c.child, c.relationship_type));
    }
    lines.join("\n")
}

fn sample_sections() -> Vec<ParsedSection> {
    let section = |order: i32, title: &str, content: &str, level, section_type, file: &str| {
        ParsedSection {
            title: title.to_string(),
            content: content.to_string(),
            level,
            section_type,
            source_file: Some(file.to_string()),
            order,
        }
    };
    vec![
        section(
            0,
            "Getting Started",
            "This is the getting started guide for the example project.",
            DocLevel::Summary,
            SectionType::Usage,
            "README.md",
        ),
        section(
            1,
            "Installation",
            "Run `cargo install example-project` to install.\n\nRequirements:\n- Rust 1.88+",
            DocLevel::Overview,
            SectionType::Setup,
            "README.md",
        ),
        section(
            2,
            "API Reference",
            "### `do_something(arg: &str) -> bool`\n\nDoes something important.",
            DocLevel::Detailed,
            SectionType::Api,
            "docs/api.md",
        ),
        section(
            3,
            "Architecture",
            "The system is layered:\n- CLI (clap)\n- API (axum)\n- Data (SeaORM)",
            DocLevel::Technical,
            SectionType::Development,
            "docs/architecture.md",
        ),
    ]
}

/// Create the example project with four sections, and with `example` a
/// small hierarchy around it. Existing sample projects are left alone.
/// Returns the names of the projects created.
pub(crate) async fn seed(db: &DatabaseConnection, example: bool) -> store::Result<Vec<String>> {
    let mut created = Vec::new();

    let project = match projects::find_by_name(db, EXAMPLE_PROJECT).await? {
        Some(existing) => existing,
        None => {
            let project = projects::create(
                db,
                NewProject {
                    description: Some("An example project for trying out dossier".into()),
                    repository_url: Some("https://github.com/example/project".into()),
                    documentation_path: Some("./docs".into()),
                    ..NewProject::named(EXAMPLE_PROJECT)
                },
            )
            .await?;
            sections::add_many(db, project.id, &sample_sections()).await?;
            created.push(project.name.clone());
            project
        }
    };

    if !example {
        return Ok(created);
    }

    let mut related = Vec::new();
    for (name, description) in [
        (EXAMPLE_SUITE, "A suite that bundles the example projects"),
        (EXAMPLE_LIBRARY, "A library the example project depends on"),
    ] {
        let found = match projects::find_by_name(db, name).await? {
            Some(existing) => existing,
            None => {
                let new = projects::create(
                    db,
                    NewProject {
                        description: Some(description.into()),
                        ..NewProject::named(name)
                    },
                )
                .await?;
                created.push(new.name.clone());
                new
            }
        };
        related.push(found);
    }
    let (suite, library) = (&related[0], &related[1]);

    for (parent, child, kind) in [
        (suite, &project, RelationshipType::Component),
        (suite, library, RelationshipType::Component),
        (&project, library, RelationshipType::Dependency),
    ] {
        let order = components::next_order(db, parent.id).await?;
        match components::add(db, parent, child, kind, order).await {
            Ok(_) | Err(store::StoreError::ComponentExists { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(created)
}

/// Delete every project whose name contains `pattern` (case-insensitive).
/// Returns the names removed; with `dry_run` nothing is deleted.
pub(crate) async fn purge(
    db: &DatabaseConnection,
    pattern: &str,
    dry_run: bool,
) -> store::Result<Vec<String>> {
    let matched = projects::matching(db, pattern).await?;
    let names: Vec<String> = matched.into_iter().map(|p| p.name).collect();
    if dry_run {
        return Ok(names);
    }
    for name in &names {
        projects::remove(db, name).await?;
    }
    Ok(names)
}

fn file_size(database_url: &str) -> Option<u64> {
    sqlite_path(database_url)
        .and_then(|path| std::fs::metadata(path).ok())
        .map(|meta| meta.len())
}

fn write_or_print(content: &str, output: Option<PathBuf>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, content)?;
            report(format!("Dumped to {}", path.display()));
        }
        None => println!("{content}"),
    }
    Ok(())
}

pub(crate) async fn handle_dev(
    action: DevAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        #[cfg(feature = "migrate")]
        DevAction::Reset { yes } => {
            use dossier::migration::{Migrator, MigratorTrait};

            if !confirm("Drop every table and recreate the schema?", yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let db = dossier::connect(database_url).await?;
            Migrator::fresh(&db).await?;
            report("Database reset.");
        }
        DevAction::Clear {
            projects,
            docs,
            components,
            all,
            yes,
        } => {
            let scope = if all {
                ClearScope::all()
            } else {
                ClearScope {
                    sections: docs,
                    components,
                    projects,
                }
            };
            if scope.is_empty() {
                return Err("Nothing to clear: pass --projects, --docs, --components or --all".into());
            }
            if !confirm("Delete the selected rows?", yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let db = open_db(database_url).await?;
            let counts = stats::clear(&db, scope).await?;
            report(format!(
                "Deleted {} sections, {} component links, {} projects",
                counts.sections, counts.components, counts.projects
            ));
        }
        DevAction::Purge {
            pattern,
            yes,
            dry_run,
        } => {
            let db = open_db(database_url).await?;
            let matched = projects::matching(&db, &pattern).await?;
            if matched.is_empty() {
                println!("No projects match '{pattern}'.");
                return Ok(());
            }
            println!("Projects matching '{pattern}' ({}):", matched.len());
            for project in &matched {
                let marker = if project.is_synced() { " [synced]" } else { "" };
                println!("  {}{marker}", project.name);
            }
            if dry_run {
                println!("\nDry run: nothing deleted.");
                return Ok(());
            }
            if !confirm(&format!("Delete {} projects?", matched.len()), yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = purge(&db, &pattern, false).await?;
            report(format!("✓ Deleted {} projects", removed.len()));
        }
        DevAction::Status => {
            let db = open_db(database_url).await?;
            let s = stats::collect(&db, RECENT_SYNCS).await?;
            println!("Database: {database_url}");
            if let Some(size) = file_size(database_url) {
                println!("Size:     {:.1} KB", size as f64 / 1024.0);
            }
            println!();
            println!("  Projects:       {} ({} synced)", s.projects, s.synced_projects);
            println!("  Sections:       {}", s.sections);
            println!("  Components:     {}", s.components);
            println!("  Languages:      {}", s.languages);
            println!("  Dependencies:   {}", s.dependencies);
            println!("  Contributors:   {}", s.contributors);
            println!("  Issues:         {}", s.issues);
            println!("  Pull requests:  {}", s.pull_requests);
            println!("  Releases:       {}", s.releases);
            println!("  Branches:       {}", s.branches);
            println!("  Versions:       {}", s.versions);
            println!("  Deltas:         {}", s.deltas);
            if !s.recently_synced.is_empty() {
                println!("\nRecently synced:");
                for (name, at) in &s.recently_synced {
                    println!("  {at}  {name}");
                }
            }
        }
        DevAction::Vacuum => {
            let db = open_db(database_url).await?;
            let before = file_size(database_url);
            db.execute_unprepared("VACUUM").await?;
            let after = file_size(database_url);
            report("Vacuum complete.");
            if let (Some(before), Some(after)) = (before, after) {
                println!("  Before: {before} bytes");
                println!("  After:  {after} bytes");
                if before > after {
                    let saved = before - after;
                    println!("  Saved:  {saved} bytes ({:.1} KB)", saved as f64 / 1024.0);
                }
            }
        }
        DevAction::Dump { output, format } => {
            let db = open_db(database_url).await?;
            let dump = build_dump(&db).await?;
            let content = match format {
                DumpFormat::Json => serde_json::to_string_pretty(&dump)?,
                DumpFormat::Summary => render_summary(&dump),
            };
            write_or_print(&content, output)?;
        }
        DevAction::Seed { example } => {
            let db = open_db(database_url).await?;
            let created = seed(&db, example).await?;
            if created.is_empty() {
                report("Sample data already present.");
            } else {
                report(format!("✓ Created {}", created.join(", ")));
            }
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use dossier::connect_and_migrate;

    #[tokio::test]
    async fn seed_is_idempotent_and_links_examples() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");

        let created = seed(&db, false).await.expect("seed");
        assert_eq!(created, vec![EXAMPLE_PROJECT.to_string()]);
        let created = seed(&db, true).await.expect("seed example");
        assert_eq!(
            created,
            vec![EXAMPLE_SUITE.to_string(), EXAMPLE_LIBRARY.to_string()]
        );
        assert!(seed(&db, true).await.expect("again").is_empty());

        let dump = build_dump(&db).await.expect("dump");
        assert_eq!(dump.projects.len(), 3);
        assert_eq!(dump.components.len(), 3);
        assert_eq!(dump.stats.sections, 4);

        let summary = render_summary(&dump);
        assert!(summary.contains("Projects (3):"));
        assert!(summary.contains("example-project (4 docs)"));
        assert!(summary.contains("example-suite -> example-library [component]"));
    }

    #[tokio::test]
    async fn purge_matches_names_case_insensitively() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        for name in ["test-alpha", "My-TEST", "keeper"] {
            projects::create(&db, NewProject::named(name)).await.expect("project");
        }

        let listed = purge(&db, "test", true).await.expect("dry run");
        assert_eq!(listed, vec!["My-TEST".to_string(), "test-alpha".to_string()]);
        assert_eq!(projects::count(&db).await.expect("count"), 3);

        let removed = purge(&db, "TEST", false).await.expect("purge");
        assert_eq!(removed.len(), 2);
        let left: Vec<_> = projects::list(&db)
            .await
            .expect("list")
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(left, vec!["keeper".to_string()]);
    }

    #[tokio::test]
    async fn dump_serializes_as_json() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        seed(&db, false).await.expect("seed");
        let value = serde_json::to_value(build_dump(&db).await.expect("dump")).expect("json");
        assert_eq!(value["projects"][0]["name"], EXAMPLE_PROJECT);
        assert_eq!(value["projects"][0]["doc_count"], 4);
        assert_eq!(value["stats"]["projects"], 1);
    }
}
