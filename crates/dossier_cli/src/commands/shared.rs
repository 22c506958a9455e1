use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use console::{Term, style};
use dossier::github::{GitHubClient, GitHubError};
use sea_orm::{DatabaseConnection, DbErr};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::config::Config;
use crate::progress::ProgressReporter;

/// Errors listed before the rest are summarized as a count.
const MAX_LISTED_ERRORS: usize = 10;

pub(crate) fn is_tty() -> bool {
    Term::stdout().is_term()
}

/// Open the database, bringing the schema up to date when migrations are
/// compiled in.
pub(crate) async fn open_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    #[cfg(feature = "migrate")]
    {
        dossier::connect_and_migrate(database_url).await
    }
    #[cfg(not(feature = "migrate"))]
    {
        dossier::connect(database_url).await
    }
}

/// GitHub client from config; retry and rate-limit notices go to `reporter`.
pub(crate) fn github_client(
    config: &Config,
    reporter: Option<&Arc<ProgressReporter>>,
) -> Result<GitHubClient, GitHubError> {
    let client = GitHubClient::new(config.client_options())?;
    Ok(match reporter {
        Some(reporter) => client.with_observer(reporter.as_observer()),
        None => client,
    })
}

/// Ask before a destructive action. `yes` skips the prompt; without a
/// terminal the answer is no.
pub(crate) fn confirm(prompt: &str, yes: bool) -> std::io::Result<bool> {
    if yes {
        return Ok(true);
    }
    let term = Term::stderr();
    if !term.is_term() {
        eprintln!("{prompt} Refusing without a terminal; pass --yes to proceed.");
        return Ok(false);
    }
    term.write_str(&format!("{prompt} [y/N] "))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Report a line of success output: printed on a terminal, logged otherwise.
pub(crate) fn report(message: impl AsRef<str>) {
    let message = message.as_ref();
    if is_tty() {
        println!("{message}");
    } else {
        tracing::info!("{message}");
    }
}

/// Show per-repository failures, at most [`MAX_LISTED_ERRORS`] of them.
pub(crate) fn display_errors(errors: &[(String, String)], is_tty: bool) {
    if errors.is_empty() {
        return;
    }
    let total = errors.len();
    let shown = total.min(MAX_LISTED_ERRORS);

    if is_tty {
        eprintln!(
            "\n{}",
            style(format!("Sync errors ({total} total):")).yellow().bold()
        );
        for (repo, error) in errors.iter().take(shown) {
            eprintln!("  - {repo}: {error}");
        }
        if total > shown {
            eprintln!("  ... and {} more errors", total - shown);
        }
    } else {
        for (repo, error) in errors.iter().take(shown) {
            tracing::error!(repo = %repo, error = %error, "Sync failed");
        }
        if total > shown {
            tracing::error!(additional_errors = total - shown, "Additional sync errors occurred");
        }
    }
}

/// Display final rate limit status with a timeout to avoid hangs.
pub(crate) async fn display_final_rate_limit(client: &GitHubClient, is_tty: bool) {
    let rate_limit =
        tokio::time::timeout(Duration::from_secs(5), client.check_rate_limit()).await;

    match rate_limit {
        Ok(Ok(quota)) => {
            if is_tty {
                println!(
                    "\nRate limit after sync: {}/{} remaining",
                    quota.remaining, quota.limit
                );
            } else {
                tracing::info!(
                    remaining = quota.remaining,
                    limit = quota.limit,
                    "Rate limit after sync"
                );
            }
        }
        Ok(Err(error)) => {
            if is_tty {
                eprintln!("Warning: Failed to fetch rate limit after sync: {error}");
            } else {
                tracing::warn!(error = %error, "Failed to fetch rate limit after sync");
            }
        }
        Err(_) => {
            if is_tty {
                eprintln!("Warning: Timed out fetching rate limit after sync");
            } else {
                tracing::warn!("Timed out fetching rate limit after sync");
            }
        }
    }
}

/// File path of a `sqlite://` URL, without query parameters.
pub(crate) fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// `value` or a dash for empty table cells.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("-").to_string()
}

/// Cut `text` to `max` characters with an ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
