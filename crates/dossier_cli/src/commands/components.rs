use dossier::RelationshipType;
use dossier::ingest::autolink::{self, AutolinkOptions, LinkStats};
use dossier::store::{self, ComponentNode, DEFAULT_TREE_DEPTH, components, projects};
use sea_orm::DatabaseConnection;

use crate::commands::shared::{open_db, report};
use crate::{AutolinkArgs, ComponentsAction};

/// Link `child` under `parent` at the next free position; returns the order.
pub(crate) async fn add_link(
    db: &DatabaseConnection,
    parent: &str,
    child: &str,
    relationship_type: RelationshipType,
) -> store::Result<i32> {
    let parent = projects::get_by_name(db, parent).await?;
    let child = projects::get_by_name(db, child).await?;
    let order = components::next_order(db, parent.id).await?;
    components::add(db, &parent, &child, relationship_type, order).await?;
    Ok(order)
}

impl AutolinkArgs {
    pub(crate) fn options(&self) -> AutolinkOptions {
        AutolinkOptions {
            contributors: !self.no_contributors,
            languages: !self.no_languages,
            dependencies: !self.no_dependencies,
            branches: !self.no_branches,
            issues: !self.no_issues,
            pull_requests: !self.no_prs,
            versions: !self.no_versions,
            docs: !self.no_docs,
            max_contributors: self.max_contributors,
            max_issues: self.max_issues,
            max_pull_requests: self.max_prs,
        }
    }
}

/// Autolink one project, or every project with GitHub coordinates.
pub(crate) async fn run_autolink(
    db: &DatabaseConnection,
    project: Option<&str>,
    options: &AutolinkOptions,
) -> Result<LinkStats, Box<dyn std::error::Error>> {
    match project {
        Some(name) => {
            let project = projects::get_by_name(db, name).await?;
            if project.github_owner.is_none() || project.github_repo.is_none() {
                tracing::warn!(
                    project = %project.name,
                    "no GitHub owner/repo; only contributors, languages and dependencies are linked"
                );
            }
            Ok(autolink::build_graph(db, &project, options).await?)
        }
        None => Ok(autolink::build_all(db, options).await?),
    }
}

fn stats_lines(stats: &LinkStats) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Projects: {} created, {} existing",
            stats.projects_created, stats.projects_found
        ),
        format!(
            "Links:    {} created, {} existing",
            stats.links_created, stats.links_found
        ),
    ];
    for error in &stats.errors {
        lines.push(format!("  ! {error}"));
    }
    lines
}

/// Indented lines for a component tree.
pub(crate) fn tree_lines(nodes: &[ComponentNode]) -> Vec<String> {
    nodes
        .iter()
        .map(|node| {
            let indent = "  ".repeat(node.depth);
            let marker = if node.cycle { " (cycle)" } else { "" };
            format!(
                "{indent}└─ {} [{}]{marker}",
                node.project.name, node.relationship_type
            )
        })
        .collect()
}

pub(crate) async fn handle_components(
    action: ComponentsAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(database_url).await?;

    match action {
        ComponentsAction::Add {
            parent,
            child,
            relationship_type,
        } => {
            let relationship_type: RelationshipType = relationship_type.parse()?;
            let order = add_link(&db, &parent, &child, relationship_type).await?;
            report(format!(
                "Added {child} to {parent} as {relationship_type} (order {order})"
            ));
        }
        ComponentsAction::Remove { parent, child } => {
            let parent_project = projects::get_by_name(&db, &parent).await?;
            let child_project = projects::get_by_name(&db, &child).await?;
            components::remove(&db, &parent_project, &child_project).await?;
            report(format!("Removed {child} from {parent}"));
        }
        ComponentsAction::List { project, recursive } => {
            let root = projects::get_by_name(&db, &project).await?;
            let depth = if recursive { DEFAULT_TREE_DEPTH } else { 1 };
            let nodes = components::tree(&db, root.id, depth).await?;

            println!("{}", root.name);
            if nodes.is_empty() {
                println!("  (no components)");
            }
            for line in tree_lines(&nodes) {
                println!("{line}");
            }

            let parents = components::parents(&db, root.id).await?;
            if !parents.is_empty() {
                let names: Vec<_> = parents.iter().map(|(_, p)| p.name.as_str()).collect();
                println!("\nPart of: {}", names.join(", "));
            }
        }
        ComponentsAction::Autolink(args) => {
            let project = if args.all { None } else { args.project.as_deref() };
            let stats = run_autolink(&db, project, &args.options()).await?;
            for line in stats_lines(&stats) {
                report(line);
            }
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use dossier::connect_and_migrate;
    use dossier::store::NewProject;

    async fn seeded() -> DatabaseConnection {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        for name in ["suite", "core", "cli", "docs"] {
            projects::create(&db, NewProject::named(name)).await.expect("project");
        }
        db
    }

    #[tokio::test]
    async fn add_link_uses_next_order() {
        let db = seeded().await;
        assert_eq!(
            add_link(&db, "suite", "core", RelationshipType::Component).await.expect("first"),
            0
        );
        assert_eq!(
            add_link(&db, "suite", "cli", RelationshipType::Dependency).await.expect("second"),
            1
        );
        let err = add_link(&db, "suite", "core", RelationshipType::Component)
            .await
            .expect_err("duplicate");
        assert!(err.is_conflict());
        let err = add_link(&db, "suite", "ghost", RelationshipType::Component)
            .await
            .expect_err("missing child");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn tree_lines_indent_and_mark_cycles() {
        let db = seeded().await;
        add_link(&db, "suite", "core", RelationshipType::Component).await.expect("link");
        add_link(&db, "core", "docs", RelationshipType::Related).await.expect("link");
        add_link(&db, "docs", "suite", RelationshipType::Related).await.expect("link");

        let root = projects::get_by_name(&db, "suite").await.expect("root");
        let nodes = components::tree(&db, root.id, DEFAULT_TREE_DEPTH).await.expect("tree");
        assert_eq!(
            tree_lines(&nodes),
            vec![
                "  └─ core [component]".to_string(),
                "    └─ docs [related]".to_string(),
                "      └─ suite [related] (cycle)".to_string(),
            ]
        );

        let shallow = components::tree(&db, root.id, 1).await.expect("tree");
        assert_eq!(shallow.len(), 1);
    }

    #[tokio::test]
    async fn autolink_a_local_project_links_its_languages() {
        use dossier::github::LanguageRecord;

        let db = seeded().await;
        let core = projects::get_by_name(&db, "core").await.expect("core");
        store::metadata::replace_languages(
            &db,
            core.id,
            &[LanguageRecord {
                language: "Rust".into(),
                bytes_count: 900,
                percentage: 90.0,
                file_extensions: None,
                encoding: None,
            }],
        )
        .await
        .expect("languages");

        let only_languages = AutolinkOptions {
            contributors: false,
            dependencies: false,
            ..AutolinkOptions::default()
        };
        let stats = run_autolink(&db, Some("core"), &only_languages).await.expect("autolink");
        assert_eq!(stats.projects_created, 1);
        assert_eq!(stats.links_created, 1);
        assert!(projects::find_by_name(&db, "lang/rust").await.expect("query").is_some());

        let again = run_autolink(&db, Some("core"), &only_languages).await.expect("rerun");
        assert_eq!(again.links_created, 0);
        assert_eq!(again.links_found, 1);
        assert_eq!(
            stats_lines(&again)[1],
            "Links:    0 created, 1 existing".to_string()
        );

        let err = run_autolink(&db, Some("ghost"), &only_languages).await.expect_err("missing");
        assert!(err.to_string().contains("ghost"));
    }
}
