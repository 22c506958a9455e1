//! Integration tests for store operations.
//!
//! These tests require the `sqlite` and `migrate` features to be enabled
//! and use an in-memory SQLite database.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

use dossier::connect_and_migrate;
use dossier::entity::prelude::{DocLevel, ProjectModel, RelationshipType, SectionType};
use dossier::github::ContributorRecord;
use dossier::parsers::{DocParser, MarkdownParser};
use dossier::store::{self, ClearScope, NewProject, SectionQuery, StoreError};
use sea_orm::DatabaseConnection;

const README: &str = "\
# Widget
A small widget library.

## Installation
Run `cargo add widget`.

## Configuration
Set `WIDGET_MODE` to `fast`.

### Internals
The widget spins.

##### Allocator notes
Arena allocated.
";

/// Create an in-memory SQLite database with migrations applied.
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
async fn test_project_lifecycle() {
    let db = setup_test_db().await;

    let created = store::projects::create(
        &db,
        NewProject {
            description: Some("Widgets".into()),
            repository_url: Some("https://github.com/acme/widget".into()),
            ..NewProject::named("  widget  ")
        },
    )
    .await
    .expect("create");
    assert_eq!(created.name, "widget");

    let dup = store::projects::create(&db, NewProject::named("widget")).await;
    assert!(matches!(dup, Err(StoreError::DuplicateProject { .. })));

    let empty = store::projects::create(&db, NewProject::named("   ")).await;
    assert!(matches!(empty, Err(StoreError::InvalidInput { .. })));

    let renamed = store::projects::rename(&db, "widget", "acme/widget")
        .await
        .expect("rename");
    assert_eq!(renamed.id, created.id);
    assert!(store::projects::find_by_name(&db, "widget").await.unwrap().is_none());

    project(&db, "other").await;
    let clash = store::projects::rename(&db, "other", "acme/widget").await;
    assert!(matches!(clash, Err(StoreError::DuplicateProject { .. })));

    let missing = store::projects::get_by_name(&db, "nope").await;
    assert!(matches!(missing, Err(StoreError::ProjectNotFound { .. })));

    assert_eq!(store::projects::count(&db).await.unwrap(), 2);
    assert!(store::projects::remove(&db, "other").await.unwrap());
    assert!(!store::projects::remove(&db, "other").await.unwrap());
}

#[tokio::test]
async fn test_section_queries_respect_level_type_and_search() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;

    let sections = MarkdownParser.parse(README, Some("README.md"));
    store::sections::replace_for_project(&db, widget.id, &sections)
        .await
        .expect("store sections");

    let overview = store::sections::query(&db, widget.id, &SectionQuery::default())
        .await
        .unwrap();
    let titles: Vec<_> = overview.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Widget", "Installation", "Configuration"]);

    let everything = store::sections::query(
        &db,
        widget.id,
        &SectionQuery {
            max_level: DocLevel::Technical,
            ..SectionQuery::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(everything.len(), 5);
    assert!(everything.windows(2).all(|w| w[0].order < w[1].order));

    let setup = store::sections::query(
        &db,
        widget.id,
        &SectionQuery {
            max_level: DocLevel::Technical,
            section_type: Some(SectionType::Setup),
            search: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(setup.len(), 1);
    assert_eq!(setup[0].title, "Installation");

    let searched = store::sections::query(
        &db,
        widget.id,
        &SectionQuery {
            max_level: DocLevel::Technical,
            section_type: None,
            search: Some("ARENA".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].title, "Allocator notes");

    // Replacing swaps the whole set.
    let replacement = MarkdownParser.parse("# Widget v2\nRewritten.\n", None);
    store::sections::replace_for_project(&db, widget.id, &replacement)
        .await
        .unwrap();
    assert_eq!(store::sections::count_for_project(&db, widget.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_removing_a_project_cascades() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let suite = project(&db, "suite").await;

    let sections = MarkdownParser.parse(README, None);
    store::sections::add_many(&db, widget.id, &sections).await.unwrap();
    store::metadata::replace_contributors(
        &db,
        widget.id,
        &[ContributorRecord {
            username: "octocat".into(),
            avatar_url: None,
            contributions: 12,
            profile_url: None,
        }],
    )
    .await
    .unwrap();
    store::components::add(&db, &suite, &widget, RelationshipType::Component, 0)
        .await
        .unwrap();

    assert!(store::projects::remove(&db, "widget").await.unwrap());

    let stats = store::stats::collect(&db, 5).await.unwrap();
    assert_eq!(stats.projects, 1);
    assert_eq!(stats.sections, 0);
    assert_eq!(stats.contributors, 0);
    assert_eq!(stats.components, 0);
}

#[tokio::test]
async fn test_component_links_and_ordering() {
    let db = setup_test_db().await;
    let suite = project(&db, "suite").await;
    let core = project(&db, "core").await;
    let cli = project(&db, "cli").await;

    assert_eq!(store::components::next_order(&db, suite.id).await.unwrap(), 0);
    store::components::add(&db, &suite, &core, RelationshipType::Component, 0)
        .await
        .unwrap();
    let next = store::components::next_order(&db, suite.id).await.unwrap();
    assert_eq!(next, 1);
    store::components::add(&db, &suite, &cli, RelationshipType::Dependency, next)
        .await
        .unwrap();

    let again = store::components::add(&db, &suite, &core, RelationshipType::Related, 5).await;
    assert!(matches!(again, Err(StoreError::ComponentExists { .. })));
    let own = store::components::add(&db, &suite, &suite, RelationshipType::Component, 0).await;
    assert!(matches!(own, Err(StoreError::SelfReference { .. })));

    store::components::update(&db, &suite, &cli, None, Some(-1))
        .await
        .unwrap();
    let children: Vec<_> = store::components::children(&db, suite.id)
        .await
        .unwrap()
        .into_iter()
        .map(|(_, p)| p.name)
        .collect();
    assert_eq!(children, vec!["cli", "core"]);

    let parents = store::components::parents(&db, core.id).await.unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].1.name, "suite");

    let all = store::components::list_all(&db, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].child, "cli");
    let deps = store::components::list_all(&db, Some(RelationshipType::Dependency))
        .await
        .unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].parent_id, suite.id);

    store::components::remove(&db, &suite, &core).await.unwrap();
    let gone = store::components::remove(&db, &suite, &core).await;
    assert!(matches!(gone, Err(StoreError::ComponentNotFound { .. })));
}

#[tokio::test]
async fn test_component_tree_stops_at_cycles() {
    let db = setup_test_db().await;
    let a = project(&db, "a").await;
    let b = project(&db, "b").await;
    let c = project(&db, "c").await;

    store::components::add(&db, &a, &b, RelationshipType::Component, 0).await.unwrap();
    store::components::add(&db, &b, &c, RelationshipType::Component, 0).await.unwrap();
    store::components::add(&db, &c, &a, RelationshipType::Related, 0).await.unwrap();

    let tree = store::components::tree(&db, a.id, store::DEFAULT_TREE_DEPTH)
        .await
        .unwrap();
    let rows: Vec<_> = tree
        .iter()
        .map(|n| (n.depth, n.project.name.as_str(), n.cycle))
        .collect();
    assert_eq!(rows, vec![(1, "b", false), (2, "c", false), (3, "a", true)]);

    let shallow = store::components::tree(&db, a.id, 1).await.unwrap();
    assert_eq!(shallow.len(), 1);
}

#[tokio::test]
async fn test_clear_scopes() {
    let db = setup_test_db().await;
    let widget = project(&db, "widget").await;
    let suite = project(&db, "suite").await;
    store::sections::add_many(&db, widget.id, &MarkdownParser.parse(README, None))
        .await
        .unwrap();
    store::components::add(&db, &suite, &widget, RelationshipType::Component, 0)
        .await
        .unwrap();

    let counts = store::stats::clear(
        &db,
        ClearScope {
            sections: true,
            ..ClearScope::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(counts.sections, 5);
    assert_eq!(counts.projects, 0);

    let counts = store::stats::clear(&db, ClearScope::all()).await.unwrap();
    assert_eq!(counts.components, 1);
    assert_eq!(counts.projects, 2);
    assert_eq!(store::projects::count(&db).await.unwrap(), 0);
}
