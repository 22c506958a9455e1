//! Interactive terminal dashboard over the local database.

mod state;
mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use dossier::github::{GitHubClient, RepoRef};
use dossier::ingest::{IngestOptions, sync_repository};
use dossier::store::{self, NewDelta, NewProject, components, deltas, metadata, projects, sections};
use dossier::{ProjectModel, RelationshipType};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use sea_orm::DatabaseConnection;

use crate::commands::components::add_link;
use crate::commands::shared::{github_client, open_db};
use crate::config::Config;
use state::{Action, DashboardState, ProjectDetail};

const TICK: Duration = Duration::from_millis(100);

type Term = Terminal<CrosstermBackend<Stdout>>;

async fn load_detail(db: &DatabaseConnection, project: &ProjectModel) -> store::Result<ProjectDetail> {
    let id = project.id;
    let components = components::tree(db, id, components::DEFAULT_TREE_DEPTH)
        .await?
        .into_iter()
        .map(|node| (node.project.name, node.relationship_type, node.depth))
        .collect();
    let open_deltas = deltas::list(db, id, false).await?;
    let counts = deltas::link_counts(db, open_deltas.iter().map(|d| d.id).collect()).await?;
    let deltas = open_deltas
        .into_iter()
        .map(|d| {
            let links = counts.get(&d.id).copied().unwrap_or(0);
            (d, links)
        })
        .collect();
    Ok(ProjectDetail {
        project: Some(project.clone()),
        sections: sections::for_project(db, id).await?,
        languages: metadata::languages(db, id).await?,
        dependencies: metadata::dependencies(db, id).await?,
        contributors: metadata::contributors(db, id).await?,
        issues: metadata::issues(db, id).await?,
        pull_requests: metadata::pull_requests(db, id).await?,
        releases: metadata::releases(db, id).await?,
        branches: metadata::branches(db, id).await?,
        components,
        deltas,
    })
}

type ActionResult = Result<String, Box<dyn std::error::Error>>;

async fn sync(
    client: Option<&GitHubClient>,
    db: &DatabaseConnection,
    repo: &RepoRef,
    name: Option<String>,
) -> ActionResult {
    let client = client.ok_or("GitHub client unavailable; check the configuration")?;
    let options = IngestOptions {
        name,
        ..IngestOptions::default()
    };
    let summary = sync_repository(client, db, repo, &options, None).await?;
    Ok(format!(
        "Synced {}: {} sections, {} issues, {} PRs",
        summary.project, summary.sections, summary.issues, summary.pull_requests
    ))
}

/// Carry out a state-changing action; the message goes to the status bar.
async fn perform(
    db: &DatabaseConnection,
    client: Option<&GitHubClient>,
    action: Action,
) -> ActionResult {
    match action {
        Action::Sync(name) => {
            let project = projects::get_by_name(db, &name).await?;
            let (Some(owner), Some(repo)) = (project.github_owner, project.github_repo) else {
                return Err(format!("{name} is not linked to a GitHub repository").into());
            };
            sync(client, db, &RepoRef::new(owner, repo), Some(name)).await
        }
        Action::SyncNew(repo) => sync(client, db, &repo, None).await,
        Action::CreateProject(name) => {
            let project = projects::create(db, NewProject::named(name)).await?;
            Ok(format!("Created {}", project.name))
        }
        Action::DeleteProject(name) => {
            if projects::remove(db, &name).await? {
                Ok(format!("Deleted {name}"))
            } else {
                Err(store::StoreError::project_not_found(&name).into())
            }
        }
        Action::AddComponent { parent, child } => {
            add_link(db, &parent, &child, RelationshipType::Component).await?;
            Ok(format!("Added {child} to {parent}"))
        }
        Action::NewDelta { project, name } => {
            let project = projects::get_by_name(db, &project).await?;
            let delta = deltas::create(db, &project, NewDelta::named(name)).await?;
            Ok(format!("Started delta {} ({})", delta.name, delta.phase))
        }
        Action::AdvanceDelta { project, name } => {
            let project = projects::get_by_name(db, &project).await?;
            let delta = deltas::get(db, &project, &name).await?;
            let delta = deltas::advance(db, delta).await?;
            Ok(format!("{} is now {}", delta.name, delta.phase))
        }
        Action::None | Action::Quit | Action::Reload | Action::LoadDetail => Ok(String::new()),
    }
}

async fn reload(db: &DatabaseConnection, state: &mut DashboardState) {
    match projects::list(db).await {
        Ok(list) => state.set_projects(list),
        Err(e) => state.status = format!("Reload failed: {e}"),
    }
    refresh_detail(db, state).await;
}

/// Load the selected project's detail into `state`, reporting failures in
/// the status bar.
async fn refresh_detail(db: &DatabaseConnection, state: &mut DashboardState) {
    let Some(project) = state.selected_project().cloned() else {
        state.detail = None;
        return;
    };
    match load_detail(db, &project).await {
        Ok(detail) => state.set_detail(detail),
        Err(e) => {
            tracing::warn!(project = %project.name, error = %e, "Failed to load project detail");
            state.status = format!("Failed to load {}: {e}", project.name);
        }
    }
}

fn setup_terminal() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn restore_terminal(terminal: &mut Term) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

async fn run_loop(
    terminal: &mut Term,
    db: &DatabaseConnection,
    client: Option<&GitHubClient>,
    state: &mut DashboardState,
) -> Result<(), Box<dyn std::error::Error>> {
    refresh_detail(db, state).await;
    loop {
        terminal.draw(|frame| ui::draw(frame, state))?;

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match state.handle_key(key) {
            Action::None => {}
            Action::Quit => return Ok(()),
            Action::LoadDetail => refresh_detail(db, state).await,
            Action::Reload => reload(db, state).await,
            action => {
                // Show the pending status while the action runs.
                terminal.draw(|frame| ui::draw(frame, state))?;
                let outcome = perform(db, client, action).await;
                reload(db, state).await;
                state.status = match outcome {
                    Ok(message) => message,
                    Err(e) => {
                        tracing::warn!(error = %e, "Dashboard action failed");
                        format!("Error: {e}")
                    }
                };
            }
        }
    }
}

/// Run the dashboard until the user quits. The terminal is restored even
/// when the loop fails.
pub(crate) async fn run(config: &Config, database_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(database_url).await?;
    let mut state = DashboardState::new(projects::list(&db).await?);
    let client = match github_client(config, None) {
        Ok(client) => Some(client),
        Err(e) => {
            state.status = format!("GitHub unavailable: {e}");
            None
        }
    };

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, &db, client.as_ref(), &mut state).await;
    restore_terminal(&mut terminal)?;
    result
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use dossier::DeltaPhase;

    #[tokio::test]
    async fn actions_change_the_database() {
        let db = dossier::connect_and_migrate("sqlite::memory:").await.expect("db");

        let message = perform(&db, None, Action::CreateProject("suite".into())).await.expect("create");
        assert_eq!(message, "Created suite");
        perform(&db, None, Action::CreateProject("core".into())).await.expect("create");
        perform(
            &db,
            None,
            Action::AddComponent {
                parent: "suite".into(),
                child: "core".into(),
            },
        )
        .await
        .expect("component");

        perform(
            &db,
            None,
            Action::NewDelta {
                project: "suite".into(),
                name: "dark-mode".into(),
            },
        )
        .await
        .expect("delta");
        let message = perform(
            &db,
            None,
            Action::AdvanceDelta {
                project: "suite".into(),
                name: "dark-mode".into(),
            },
        )
        .await
        .expect("advance");
        assert_eq!(message, "dark-mode is now planning");

        let suite = projects::get_by_name(&db, "suite").await.expect("suite");
        let detail = load_detail(&db, &suite).await.expect("detail");
        assert_eq!(detail.components.len(), 1);
        assert_eq!(detail.deltas.len(), 1);
        assert_eq!(detail.deltas[0].0.phase, DeltaPhase::Planning);

        perform(&db, None, Action::DeleteProject("suite".into())).await.expect("delete");
        assert!(projects::find_by_name(&db, "suite").await.expect("query").is_none());
        assert!(perform(&db, None, Action::DeleteProject("suite".into())).await.is_err());
    }

    #[tokio::test]
    async fn sync_without_a_client_or_repository_fails() {
        let db = dossier::connect_and_migrate("sqlite::memory:").await.expect("db");
        projects::create(&db, NewProject::named("local")).await.expect("create");

        let err = perform(&db, None, Action::Sync("local".into())).await.expect_err("unlinked");
        assert_eq!(err.to_string(), "local is not linked to a GitHub repository");
        let err = perform(&db, None, Action::SyncNew(RepoRef::new("acme", "widget")))
            .await
            .expect_err("no client");
        assert!(err.to_string().contains("GitHub client unavailable"));
    }
}
