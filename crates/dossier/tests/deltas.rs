//! Integration tests for delta tracking against an in-memory SQLite database.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

use dossier::connect_and_migrate;
use dossier::entity::prelude::{DeltaLinkType, DeltaPhase, DeltaPriority, DeltaType, ProjectModel};
use dossier::store::{self, NewDelta, NewProject, StoreError, deltas};
use sea_orm::DatabaseConnection;

async fn setup_test_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database")
}

async fn project(db: &DatabaseConnection, name: &str) -> ProjectModel {
    store::projects::create(db, NewProject::named(name))
        .await
        .expect("create project")
}

#[tokio::test]
async fn test_create_rejects_duplicates_and_blank_names() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let gadget = project(&db, "gadget").await;

    let delta = deltas::create(
        &db,
        &widget,
        NewDelta {
            title: "  ".into(),
            priority: DeltaPriority::High,
            delta_type: DeltaType::Bugfix,
            ..NewDelta::named(" fix-crash ")
        },
    )
    .await
    .expect("create");
    assert_eq!(delta.name, "fix-crash");
    assert_eq!(delta.title, "fix-crash");
    assert_eq!(delta.phase, DeltaPhase::Brainstorm);
    assert_eq!(delta.priority, DeltaPriority::High);
    assert!(delta.started_at.is_none());

    let err = deltas::create(&db, &widget, NewDelta::named("fix-crash"))
        .await
        .expect_err("duplicate");
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "Delta already exists: widget/fix-crash");

    // Names are scoped per project.
    deltas::create(&db, &gadget, NewDelta::named("fix-crash"))
        .await
        .expect("other project");

    let err = deltas::create(&db, &widget, NewDelta::named("   "))
        .await
        .expect_err("blank");
    assert!(matches!(err, StoreError::InvalidInput { .. }));

    let err = deltas::get(&db, &widget, "ghost").await.expect_err("missing");
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Delta not found: widget/ghost");
}

#[tokio::test]
async fn test_phases_stamp_start_and_completion() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let mut delta = deltas::create(&db, &widget, NewDelta::named("dark-mode"))
        .await
        .expect("create");

    let mut seen = vec![delta.phase];
    while delta.can_advance() {
        delta = deltas::advance(&db, delta).await.expect("advance");
        seen.push(delta.phase);
        if delta.phase == DeltaPhase::Implementation {
            assert!(delta.started_at.is_some());
            assert!(delta.completed_at.is_none());
        }
    }
    assert_eq!(
        seen,
        vec![
            DeltaPhase::Brainstorm,
            DeltaPhase::Planning,
            DeltaPhase::Implementation,
            DeltaPhase::Review,
            DeltaPhase::Documentation,
            DeltaPhase::Complete,
        ]
    );
    assert!(delta.completed_at.is_some());

    let err = deltas::advance(&db, delta.clone()).await.expect_err("complete");
    assert!(matches!(err, StoreError::InvalidInput { .. }));
    let err = deltas::abandon(&db, delta).await.expect_err("already closed");
    assert!(matches!(err, StoreError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_started_at_is_kept_on_later_phases() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let delta = deltas::create(&db, &widget, NewDelta::named("refactor"))
        .await
        .expect("create");
    let delta = deltas::advance(&db, delta).await.expect("planning");
    let delta = deltas::advance(&db, delta).await.expect("implementation");
    let started = delta.started_at.expect("stamped");
    let delta = deltas::advance(&db, delta).await.expect("review");
    assert_eq!(delta.started_at, Some(started));
}

#[tokio::test]
async fn test_list_hides_closed_deltas() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    deltas::create(&db, &widget, NewDelta::named("open-one"))
        .await
        .expect("open");
    let dropped = deltas::create(&db, &widget, NewDelta::named("dropped"))
        .await
        .expect("dropped");
    let dropped = deltas::abandon(&db, dropped).await.expect("abandon");
    assert_eq!(dropped.phase, DeltaPhase::Abandoned);
    assert!(dropped.completed_at.is_none());

    let open: Vec<_> = deltas::list(&db, widget.id, false)
        .await
        .expect("open")
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(open, vec!["open-one".to_string()]);
    assert_eq!(deltas::list(&db, widget.id, true).await.expect("all").len(), 2);
}

#[tokio::test]
async fn test_notes_and_links() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let delta = deltas::create(&db, &widget, NewDelta::named("dark-mode"))
        .await
        .expect("create");

    deltas::add_note(&db, &delta, "  pick a palette  ").await.expect("note");
    let delta = deltas::advance(&db, delta).await.expect("planning");
    deltas::add_note(&db, &delta, "needs a toggle").await.expect("note");
    let err = deltas::add_note(&db, &delta, " ").await.expect_err("empty");
    assert!(matches!(err, StoreError::InvalidInput { .. }));

    let notes = deltas::notes(&db, delta.id).await.expect("notes");
    let phases: Vec<_> = notes.iter().map(|n| (n.phase, n.content.as_str())).collect();
    assert_eq!(
        phases,
        vec![
            (DeltaPhase::Brainstorm, "pick a palette"),
            (DeltaPhase::Planning, "needs a toggle"),
        ]
    );

    let issue = deltas::add_link(&db, &delta, DeltaLinkType::Issue, "#12")
        .await
        .expect("issue");
    assert_eq!(issue.target_number, Some(12));
    assert_eq!(issue.target(), "#12");
    let branch = deltas::add_link(&db, &delta, DeltaLinkType::Branch, "feat/dark")
        .await
        .expect("branch");
    assert_eq!(branch.target(), "feat/dark");
    deltas::add_link(&db, &delta, DeltaLinkType::Pr, "40").await.expect("pr");

    let err = deltas::add_link(&db, &delta, DeltaLinkType::Pr, "soon")
        .await
        .expect_err("not a number");
    assert!(matches!(err, StoreError::InvalidInput { .. }));
    let err = deltas::add_link(&db, &delta, DeltaLinkType::Doc, "")
        .await
        .expect_err("no name");
    assert!(matches!(err, StoreError::InvalidInput { .. }));

    let links = deltas::links(&db, delta.id).await.expect("links");
    assert_eq!(links.len(), 3);
    let counts = deltas::link_counts(&db, vec![delta.id]).await.expect("counts");
    assert_eq!(counts.get(&delta.id), Some(&3));
    assert!(deltas::link_counts(&db, Vec::new()).await.expect("empty").is_empty());
}

#[tokio::test]
async fn test_removing_project_or_delta_cascades() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let delta = deltas::create(&db, &widget, NewDelta::named("dark-mode"))
        .await
        .expect("create");
    deltas::add_note(&db, &delta, "note").await.expect("note");
    deltas::add_link(&db, &delta, DeltaLinkType::Issue, "1").await.expect("link");

    let stats = store::stats::collect(&db, 5).await.expect("stats");
    assert_eq!(stats.deltas, 1);

    deltas::remove(&db, &delta).await.expect("remove");
    assert!(deltas::notes(&db, delta.id).await.expect("notes").is_empty());
    assert!(deltas::links(&db, delta.id).await.expect("links").is_empty());

    let again = deltas::create(&db, &widget, NewDelta::named("again"))
        .await
        .expect("create");
    deltas::add_note(&db, &again, "note").await.expect("note");
    store::projects::remove(&db, "widget").await.expect("remove project");
    assert!(deltas::notes(&db, again.id).await.expect("notes").is_empty());
    assert_eq!(store::stats::collect(&db, 5).await.expect("stats").deltas, 0);
}
