//! `.dossier` files: `export` (one project, all of them, to stdout, or a
//! validity check) and `init` for a hand-written template.

use std::path::{Path, PathBuf};

use dossier::report::{self, DOSSIER_EXTENSION, Dossier};
use dossier::store::projects;
use sea_orm::DatabaseConnection;

use crate::commands::shared::{open_db, report as say};
use crate::{ExportAction, ExportArgs};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ExportFormat {
    /// YAML `.dossier` file
    #[default]
    Dossier,
    Json,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Dossier => DOSSIER_EXTENSION,
            ExportFormat::Json => "json",
        }
    }

    fn render(self, dossier: &Dossier) -> report::Result<String> {
        match self {
            ExportFormat::Dossier => dossier.to_yaml(),
            ExportFormat::Json => dossier.to_json(),
        }
    }
}

/// What `export` wrote, for the summary line.
#[derive(Debug)]
pub(crate) struct Exported {
    pub path: PathBuf,
    pub dossier: Dossier,
}

/// One line per block worth mentioning after an export.
pub(crate) fn summary_lines(dossier: &Dossier) -> Vec<String> {
    let mut lines = Vec::new();
    if !dossier.tech_stack.is_empty() {
        let names: Vec<_> = dossier.tech_stack.iter().take(3).map(|t| t.name.as_str()).collect();
        lines.push(format!("Languages: {}", names.join(", ")));
    }
    let dependencies: usize = dossier.dependencies.values().map(Vec::len).sum();
    if dependencies > 0 {
        lines.push(format!("Dependencies: {dependencies}"));
    }
    if let Some(activity) = &dossier.activity {
        lines.push(format!(
            "Activity: {} open issues, {} open PRs, {} contributors",
            activity.open_issues, activity.open_prs, activity.contributors
        ));
    }
    if let Some(version) = &dossier.project.version {
        lines.push(format!("Latest version: {version}"));
    }
    lines
}

pub(crate) async fn export_project(
    db: &DatabaseConnection,
    name: &str,
    output: Option<PathBuf>,
    include_docs: bool,
    include_activity: bool,
) -> CliResult<Exported> {
    let project = projects::get_by_name(db, name).await?;
    let dossier = report::generate(db, &project, include_docs, include_activity).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(report::default_file_name(&project.name)));
    std::fs::write(&path, dossier.to_yaml()?)?;
    Ok(Exported { path, dossier })
}

/// Write one file per project into `dir`, created if missing. Returns the
/// paths written, in project name order.
pub(crate) async fn export_all(
    db: &DatabaseConnection,
    dir: &Path,
    format: ExportFormat,
    synced_only: bool,
) -> CliResult<Vec<PathBuf>> {
    let all = if synced_only {
        let mut synced = projects::list_synced(db).await?;
        synced.sort_by(|a, b| a.name.cmp(&b.name));
        synced
    } else {
        projects::list(db).await?
    };
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(all.len());
    for project in &all {
        let dossier = report::generate(db, project, true, true).await?;
        let path = dir.join(report::file_name_with_extension(&project.name, format.extension()));
        std::fs::write(&path, format.render(&dossier)?)?;
        tracing::debug!(project = %project.name, path = %path.display(), "exported");
        written.push(path);
    }
    Ok(written)
}

/// Read and check a `.dossier` file.
pub(crate) fn validate_file(path: &Path) -> CliResult<Dossier> {
    let text = std::fs::read_to_string(path)?;
    Ok(Dossier::from_yaml(&text)?)
}

/// Write a template for `name` (default: the name of `cwd`). An existing
/// file is only replaced with `force`.
pub(crate) fn init_template(
    name: Option<String>,
    output: Option<PathBuf>,
    force: bool,
    cwd: &Path,
) -> CliResult<PathBuf> {
    let name = match name {
        Some(name) => name,
        None => cwd
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or("Cannot infer a project name from the current directory; pass one")?,
    };
    let path = output.unwrap_or_else(|| cwd.join(report::default_file_name(&name)));
    if path.exists() && !force {
        return Err(format!("{} already exists; pass --force to overwrite", path.display()).into());
    }
    std::fs::write(&path, Dossier::template(&name).to_yaml()?)?;
    Ok(path)
}

pub(crate) async fn handle_export(
    args: ExportArgs,
    action: Option<ExportAction>,
    database_url: &str,
) -> CliResult<()> {
    let action = match action {
        Some(action) => action,
        None => {
            let project = args
                .project
                .ok_or("Missing project name: dossier export <project> or dossier export <command>")?;
            ExportAction::Dossier(ExportArgs {
                project: Some(project),
                ..args
            })
        }
    };

    match action {
        ExportAction::Dossier(args) => {
            let project = args.project.ok_or("Missing project name")?;
            let db = open_db(database_url).await?;
            let exported =
                export_project(&db, &project, args.output, !args.no_docs, !args.no_activity).await?;
            say(format!("✓ Exported {project} to {}", exported.path.display()));
            for line in summary_lines(&exported.dossier) {
                say(format!("  {line}"));
            }
        }
        ExportAction::All {
            output_dir,
            format,
            synced_only,
        } => {
            let db = open_db(database_url).await?;
            let written = export_all(&db, &output_dir, format, synced_only).await?;
            if written.is_empty() {
                println!("No projects to export.");
            } else {
                say(format!(
                    "✓ Exported {} projects to {}",
                    written.len(),
                    output_dir.display()
                ));
            }
        }
        ExportAction::Show { project } => {
            let db = open_db(database_url).await?;
            let project = projects::get_by_name(&db, &project).await?;
            let dossier = report::generate(&db, &project, true, true).await?;
            print!("{}", dossier.to_yaml()?);
        }
        ExportAction::Validate { file } => handle_validate(&file)?,
    }
    Ok(())
}

pub(crate) fn handle_validate(file: &Path) -> CliResult<()> {
    let dossier = validate_file(file)?;
    say(format!(
        "✓ {} is a valid dossier for {} (format {})",
        file.display(),
        dossier.project.name,
        dossier.dossier.version
    ));
    Ok(())
}

pub(crate) fn handle_init(name: Option<String>, output: Option<PathBuf>, force: bool) -> CliResult<()> {
    let cwd = std::env::current_dir()?;
    let path = init_template(name, output, force, &cwd)?;
    say(format!("✓ Created {}", path.display()));
    println!("\nEdit the file to fill in project details:\n  {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_names_the_file_after_the_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cwd = dir.path().join("widget");
        std::fs::create_dir(&cwd).expect("cwd");

        let path = init_template(None, None, false, &cwd).expect("init");
        assert_eq!(path, cwd.join("widget.dossier"));
        let parsed = validate_file(&path).expect("template is valid");
        assert_eq!(parsed.project.name, "widget");

        let err = init_template(None, None, false, &cwd).expect_err("exists");
        assert!(err.to_string().contains("--force"));
        init_template(Some("acme/widget".into()), Some(path.clone()), true, &cwd).expect("force");
        assert_eq!(validate_file(&path).expect("valid").project.name, "acme/widget");
    }

    #[test]
    fn validate_file_reports_missing_sections() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.dossier");
        std::fs::write(&path, "project:\n  description: no name\n").expect("write");

        let err = validate_file(&path).expect_err("invalid");
        let message = err.to_string();
        assert!(message.contains("Missing required 'dossier' section"), "{message}");
        assert!(message.contains("Missing project name"), "{message}");
    }

    #[test]
    fn summary_mentions_languages_and_activity() {
        let mut dossier = Dossier::template("widget");
        dossier.activity = Some(report::Activity {
            last_release: None,
            release_date: None,
            open_issues: 2,
            open_prs: 1,
            contributors: 3,
            branches: 1,
            default_branch: Some("main".into()),
        });
        let lines = summary_lines(&dossier);
        assert_eq!(lines[0], "Languages: TODO");
        assert_eq!(lines[1], "Dependencies: 1");
        assert_eq!(lines[2], "Activity: 2 open issues, 1 open PRs, 3 contributors");
    }

    #[cfg(all(feature = "sqlite", feature = "migrate"))]
    #[tokio::test]
    async fn exports_one_or_all_projects() {
        use dossier::store::NewProject;

        let dir = tempfile::tempdir().expect("tempdir");
        let db = dossier::connect_and_migrate("sqlite::memory:").await.expect("db");
        projects::create(&db, NewProject::named("acme/widget")).await.expect("widget");
        projects::create(&db, NewProject::named("notes")).await.expect("notes");

        let single = dir.path().join("single.dossier");
        let exported = export_project(&db, "acme/widget", Some(single.clone()), false, false)
            .await
            .expect("export");
        assert_eq!(exported.path, single);
        assert!(exported.dossier.overview.is_none());
        assert!(exported.dossier.activity.is_none());
        assert_eq!(validate_file(&single).expect("valid").project.name, "acme/widget");

        let out = dir.path().join("all");
        let written = export_all(&db, &out, ExportFormat::Json, false).await.expect("all");
        assert_eq!(written, vec![out.join("acme_widget.json"), out.join("notes.json")]);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[1]).expect("read")).expect("json");
        assert_eq!(json["project"]["name"], "notes");

        let synced = export_all(&db, &out, ExportFormat::Dossier, true).await.expect("synced");
        assert!(synced.is_empty());

        let err = export_project(&db, "ghost", None, true, true).await.expect_err("missing");
        assert!(err.to_string().contains("ghost"));
    }
}
