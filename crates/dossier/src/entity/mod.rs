//! SeaORM entity definitions for the dossier database schema.

pub mod delta_link;
pub mod delta_note;
pub mod delta_phase;
pub mod dependency_type;
pub mod doc_level;
pub mod document_section;
pub mod prelude;
pub mod project;
pub mod project_branch;
pub mod project_component;
pub mod project_contributor;
pub mod project_delta;
pub mod project_dependency;
pub mod project_issue;
pub mod project_language;
pub mod project_pull_request;
pub mod project_release;
pub mod project_version;
pub mod relationship_type;
pub mod section_type;
