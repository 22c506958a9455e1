//! `delta`: track units of work on a project through their phases.

use dossier::store::{self, NewDelta, deltas, projects};
use dossier::{DeltaLinkModel, DeltaNoteModel, ProjectDeltaModel};
use sea_orm::DatabaseConnection;
use tabled::Tabled;

use crate::DeltaAction;
use crate::commands::shared::{confirm, open_db, or_dash, print_table, report, truncate};

const TITLE_WIDTH: usize = 40;

#[derive(Debug, Tabled)]
pub(crate) struct DeltaRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[tabled(rename = "Type")]
    pub delta_type: String,
    #[tabled(rename = "Priority")]
    pub priority: String,
    #[tabled(rename = "Links")]
    pub links: usize,
}

impl DeltaRow {
    pub(crate) fn new(delta: &ProjectDeltaModel, links: usize) -> Self {
        Self {
            name: delta.name.clone(),
            title: truncate(&delta.title, TITLE_WIDTH),
            phase: delta.phase.to_string(),
            delta_type: delta.delta_type.to_string(),
            priority: delta.priority.to_string(),
            links,
        }
    }
}

/// A project's deltas as table rows, with link counts.
pub(crate) async fn rows(
    db: &DatabaseConnection,
    project: &str,
    include_closed: bool,
) -> store::Result<Vec<DeltaRow>> {
    let project = projects::get_by_name(db, project).await?;
    let listed = deltas::list(db, project.id, include_closed).await?;
    let counts = deltas::link_counts(db, listed.iter().map(|d| d.id).collect()).await?;
    Ok(listed
        .iter()
        .map(|d| DeltaRow::new(d, counts.get(&d.id).copied().unwrap_or(0)))
        .collect())
}

/// Lines printed by `delta show`.
pub(crate) fn detail_lines(
    delta: &ProjectDeltaModel,
    notes: &[DeltaNoteModel],
    links: &[DeltaLinkModel],
) -> Vec<String> {
    let stamp = |at: &chrono::DateTime<chrono::FixedOffset>| at.format("%Y-%m-%d %H:%M").to_string();
    let mut lines = vec![
        format!("{} - {}", delta.name, delta.title),
        format!("  Phase:     {} (since {})", delta.phase, stamp(&delta.phase_changed_at)),
        format!("  Type:      {}", delta.delta_type),
        format!("  Priority:  {}", delta.priority),
    ];
    if let Some(description) = &delta.description {
        lines.push(format!("  About:     {description}"));
    }
    if let Some(at) = &delta.started_at {
        lines.push(format!("  Started:   {}", stamp(at)));
    }
    if let Some(at) = &delta.completed_at {
        lines.push(format!("  Completed: {}", stamp(at)));
    }
    if delta.issue_number.is_some() || delta.pr_number.is_some() || delta.branch_name.is_some() {
        lines.push(format!(
            "  GitHub:    issue {} / PR {} / branch {}",
            delta.issue_number.map_or_else(|| "-".to_string(), |n| format!("#{n}")),
            delta.pr_number.map_or_else(|| "-".to_string(), |n| format!("#{n}")),
            or_dash(delta.branch_name.as_deref()),
        ));
    }
    if !links.is_empty() {
        lines.push(String::new());
        lines.push(format!("Links ({}):", links.len()));
        for link in links {
            lines.push(format!("  {} {}", link.link_type, link.target()));
        }
    }
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push(format!("Notes ({}):", notes.len()));
        for note in notes {
            lines.push(format!("  [{}] {}", note.phase, note.content));
        }
    }
    lines
}

pub(crate) async fn handle_deltas(
    action: DeltaAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(database_url).await?;

    match action {
        DeltaAction::New {
            project,
            name,
            title,
            description,
            priority,
            delta_type,
            issue,
            pr,
            branch,
        } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::create(
                &db,
                &project,
                NewDelta {
                    title: title.unwrap_or_default(),
                    description,
                    priority,
                    delta_type,
                    issue_number: issue,
                    pr_number: pr,
                    branch_name: branch,
                    ..NewDelta::named(name)
                },
            )
            .await?;
            report(format!(
                "✓ Created delta {} in {} ({})",
                delta.name, project.name, delta.phase
            ));
        }
        DeltaAction::List { project, all } => {
            let rows = rows(&db, &project, all).await?;
            if rows.is_empty() {
                println!("No deltas in {project}.");
            } else {
                print_table(rows);
            }
        }
        DeltaAction::Show { project, name } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            let notes = deltas::notes(&db, delta.id).await?;
            let links = deltas::links(&db, delta.id).await?;
            for line in detail_lines(&delta, &notes, &links) {
                println!("{line}");
            }
        }
        DeltaAction::Advance { project, name } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            let from = delta.phase;
            let delta = deltas::advance(&db, delta).await?;
            report(format!("✓ {}: {from} → {}", delta.name, delta.phase));
        }
        DeltaAction::Abandon { project, name, yes } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            if !confirm(&format!("Abandon delta {}?", delta.name), yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            let delta = deltas::abandon(&db, delta).await?;
            report(format!("✓ {} abandoned", delta.name));
        }
        DeltaAction::Note {
            project,
            name,
            content,
        } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            let note = deltas::add_note(&db, &delta, &content).await?;
            report(format!("✓ Noted on {} ({})", delta.name, note.phase));
        }
        DeltaAction::Link {
            project,
            name,
            link_type,
            target,
        } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            let link = deltas::add_link(&db, &delta, link_type, &target).await?;
            report(format!(
                "✓ Linked {} to {} {}",
                delta.name,
                link.link_type,
                link.target()
            ));
        }
        DeltaAction::Remove { project, name, yes } => {
            let project = projects::get_by_name(&db, &project).await?;
            let delta = deltas::get(&db, &project, &name).await?;
            if !confirm(&format!("Delete delta {} with its notes and links?", delta.name), yes)? {
                println!("Cancelled.");
                return Ok(());
            }
            deltas::remove(&db, &delta).await?;
            report(format!("✓ Removed delta {}", delta.name));
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use dossier::connect_and_migrate;
    use dossier::store::NewProject;
    use dossier::{DeltaLinkType, DeltaPhase};

    #[tokio::test]
    async fn rows_hide_closed_deltas_and_count_links() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let project = projects::create(&db, NewProject::named("widget")).await.expect("project");
        let open = deltas::create(&db, &project, NewDelta::named("dark-mode")).await.expect("open");
        deltas::add_link(&db, &open, DeltaLinkType::Issue, "#7").await.expect("issue");
        deltas::add_link(&db, &open, DeltaLinkType::Branch, "feat/dark").await.expect("branch");
        let dropped = deltas::create(&db, &project, NewDelta::named("old-idea")).await.expect("dropped");
        deltas::abandon(&db, dropped).await.expect("abandon");

        let open_rows = rows(&db, "widget", false).await.expect("rows");
        assert_eq!(open_rows.len(), 1);
        assert_eq!(open_rows[0].name, "dark-mode");
        assert_eq!(open_rows[0].phase, "brainstorm");
        assert_eq!(open_rows[0].links, 2);

        assert_eq!(rows(&db, "widget", true).await.expect("all").len(), 2);
        assert!(rows(&db, "ghost", true).await.expect_err("missing").is_not_found());
    }

    #[tokio::test]
    async fn detail_lines_show_lifecycle_links_and_notes() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let project = projects::create(&db, NewProject::named("widget")).await.expect("project");
        let delta = deltas::create(
            &db,
            &project,
            NewDelta {
                title: "Dark mode".into(),
                pr_number: Some(12),
                ..NewDelta::named("dark-mode")
            },
        )
        .await
        .expect("create");
        deltas::add_note(&db, &delta, "sketch the palette").await.expect("note");
        let delta = deltas::advance(&db, delta).await.expect("planning");
        let delta = deltas::advance(&db, delta).await.expect("implementation");
        assert_eq!(delta.phase, DeltaPhase::Implementation);
        deltas::add_link(&db, &delta, DeltaLinkType::Doc, "docs/theme.md").await.expect("doc");

        let notes = deltas::notes(&db, delta.id).await.expect("notes");
        let links = deltas::links(&db, delta.id).await.expect("links");
        let lines = detail_lines(&delta, &notes, &links);
        assert_eq!(lines[0], "dark-mode - Dark mode");
        assert!(lines[1].starts_with("  Phase:     implementation (since "));
        assert!(lines.iter().any(|l| l.starts_with("  Started:   ")));
        assert!(lines.contains(&"  GitHub:    issue - / PR #12 / branch -".to_string()));
        assert!(lines.contains(&"  doc docs/theme.md".to_string()));
        assert!(lines.contains(&"  [brainstorm] sketch the palette".to_string()));
    }
}
