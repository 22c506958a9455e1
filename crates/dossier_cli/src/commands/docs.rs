//! Local documentation: `parse` and `query`.

use std::path::{Path, PathBuf};

use dossier::DocLevel;
use dossier::parsers::{ParsedSection, ParserRegistry};
use dossier::store::{SectionQuery, projects, sections};
use sea_orm::DatabaseConnection;
use walkdir::WalkDir;

use crate::commands::shared::{open_db, report as say};

const RULE_WIDTH: usize = 40;

/// Files under `path` some registered parser accepts, sorted. A file path is
/// returned as-is when a parser accepts it. Symlinks are not followed.
pub(crate) fn collect_files(path: &Path, registry: &ParserRegistry) -> std::io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && registry.parser_for(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Sections of one file, with `order` continuing from `first_order`.
fn parse_file(
    file: &Path,
    registry: &ParserRegistry,
    first_order: i32,
) -> std::io::Result<Option<Vec<ParsedSection>>> {
    let Some(parser) = registry.parser_for(file) else {
        return Ok(None);
    };
    let content = std::fs::read_to_string(file)?;
    let source = file.display().to_string();
    let mut parsed = parser.parse(&content, Some(&source));
    for section in &mut parsed {
        section.order = section.order.saturating_add(first_order);
    }
    Ok(Some(parsed))
}

/// Parse `path` and append the sections to `project`; returns
/// `(file, sections)` per parsed file.
pub(crate) async fn parse_into_project(
    db: &DatabaseConnection,
    project: &str,
    path: &Path,
) -> Result<Vec<(PathBuf, usize)>, Box<dyn std::error::Error>> {
    let project = projects::get_by_name(db, project).await?;
    let registry = ParserRegistry::default();
    let mut next_order = i32::try_from(sections::count_for_project(db, project.id).await?)
        .unwrap_or(i32::MAX);

    let mut parsed_files = Vec::new();
    let mut all = Vec::new();
    for file in collect_files(path, &registry)? {
        let Some(parsed) = parse_file(&file, &registry, next_order)? else {
            tracing::debug!(path = %file.display(), "no parser for file");
            continue;
        };
        next_order = next_order.saturating_add(i32::try_from(parsed.len()).unwrap_or(i32::MAX));
        parsed_files.push((file, parsed.len()));
        all.extend(parsed);
    }
    sections::add_many(db, project.id, &all).await?;
    Ok(parsed_files)
}

pub(crate) async fn handle_parse(
    project: &str,
    path: &Path,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_db(database_url).await?;
    let parsed = parse_into_project(&db, project, path).await?;
    if parsed.is_empty() {
        println!("No Markdown files found under {}", path.display());
        return Ok(());
    }
    for (file, count) in &parsed {
        let name = file.file_name().map_or_else(
            || file.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        say(format!("  Parsed {name}: {count} sections"));
    }
    let total: usize = parsed.iter().map(|(_, n)| n).sum();
    say(format!("\nTotal sections added: {total}"));
    Ok(())
}

pub(crate) async fn handle_query(
    project: &str,
    level: &str,
    section_type: Option<&str>,
    search: Option<String>,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = SectionQuery {
        max_level: level.parse::<DocLevel>()?,
        section_type: section_type.map(str::parse).transpose()?,
        search,
    };
    let db = open_db(database_url).await?;
    let project = projects::get_by_name(&db, project).await?;
    let found = sections::query(&db, project.id, &filter).await?;

    if found.is_empty() {
        println!("No documentation found matching criteria.");
        return Ok(());
    }

    println!("\n=== {} Documentation ({}) ===\n", project.name, filter.max_level);
    for section in found {
        println!("## {}", section.title);
        println!("   Type: {} | Level: {}", section.section_type, section.level);
        println!("\n{}\n", section.content);
        println!("{}", "-".repeat(RULE_WIDTH));
    }
    Ok(())
}
