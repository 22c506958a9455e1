//! Database connection utilities.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Configure SQLite-specific pragmas.
///
/// This sets:
/// - `journal_mode=WAL` - readers don't block the sync writer
/// - `busy_timeout=5000` - wait up to 5 seconds for locks
/// - `synchronous=NORMAL` - safe with WAL
/// - `foreign_keys=ON` - child tables cascade when a project is removed
async fn configure_sqlite(db: &DatabaseConnection, in_memory: bool) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    let mut pragmas = vec!["PRAGMA busy_timeout=5000", "PRAGMA foreign_keys=ON"];
    // WAL is meaningless for an in-memory database
    if !in_memory {
        pragmas.insert(0, "PRAGMA journal_mode=WAL");
        pragmas.push("PRAGMA synchronous=NORMAL");
    }

    for pragma in pragmas {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            pragma.to_string(),
        ))
        .await?;
    }

    Ok(())
}

fn is_sqlite(database_url: &str) -> bool {
    database_url.starts_with("sqlite:")
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Establish a connection to the database.
///
/// SQLite connections get WAL mode, a busy timeout and enforced foreign keys.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;

    if is_sqlite(database_url) {
        configure_sqlite(&db, is_in_memory(database_url)).await?;
    }

    Ok(db)
}

/// Establish a connection to the database and run all pending migrations.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
///
/// # Example
/// ```ignore
/// let db = dossier::connect_and_migrate("sqlite://dossier.db?mode=rwc").await?;
/// ```
#[cfg(feature = "migrate")]
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    use sea_orm_migration::MigratorTrait;

    let db = connect(database_url).await?;
    crate::migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "sqlite")]
    use sea_orm::{ConnectionTrait, Statement};

    #[cfg(feature = "sqlite")]
    async fn pragma(db: &DatabaseConnection, name: &str) -> String {
        let row = db
            .query_one(Statement::from_string(
                db.get_database_backend(),
                format!("PRAGMA {name}"),
            ))
            .await
            .expect("pragma query")
            .expect("pragma row");
        row.try_get_by_index::<i64>(0)
            .map(|v| v.to_string())
            .or_else(|_| row.try_get_by_index::<String>(0))
            .expect("pragma value")
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn sqlite_connections_enforce_foreign_keys() {
        let db = connect("sqlite::memory:").await.expect("connect");
        assert_eq!(pragma(&db, "foreign_keys").await, "1");
        assert_eq!(pragma(&db, "busy_timeout").await, "5000");
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn in_memory_skips_wal() {
        let db = connect("sqlite::memory:").await.expect("connect");
        assert_eq!(pragma(&db, "journal_mode").await, "memory");
    }

    #[test]
    fn url_classification() {
        assert!(is_sqlite("sqlite::memory:"));
        assert!(is_sqlite("sqlite:///tmp/dossier.db?mode=rwc"));
        assert!(!is_sqlite("postgres:///dossier"));
        assert!(is_in_memory("sqlite::memory:"));
        assert!(!is_in_memory("sqlite:///tmp/dossier.db"));
    }

    #[tokio::test]
    async fn connect_returns_error_for_invalid_database_url() {
        let err = connect("this-is-not-a-db-url")
            .await
            .expect_err("invalid URL should error");
        let msg = err.to_string().to_ascii_lowercase();
        assert!(
            msg.contains("error") || msg.contains("invalid"),
            "unexpected error message: {err}"
        );
    }
}
