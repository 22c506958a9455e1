//! Database migrations for the dossier schema.
//!
//! This module is only available when the `migrate` feature is enabled.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_schema;
mod m20260301_000002_add_project_versions;
mod m20260301_000003_add_lookup_indexes;
mod m20260301_000004_add_project_deltas;

/// The migrator that runs all migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_schema::Migration),
            Box::new(m20260301_000002_add_project_versions::Migration),
            Box::new(m20260301_000003_add_lookup_indexes::Migration),
            Box::new(m20260301_000004_add_project_deltas::Migration),
        ]
    }

    fn migration_table_name() -> SeaRc<dyn Iden> {
        SeaRc::new(Alias::new("dossier_migrations"))
    }
}
