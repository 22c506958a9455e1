//! Common re-exports for convenient entity usage.

pub use super::delta_link::{
    ActiveModel as DeltaLinkActiveModel, Column as DeltaLinkColumn, DeltaLinkType,
    Entity as DeltaLink, Model as DeltaLinkModel,
};
pub use super::delta_note::{
    ActiveModel as DeltaNoteActiveModel, Column as DeltaNoteColumn, Entity as DeltaNote,
    Model as DeltaNoteModel,
};
pub use super::delta_phase::{DeltaPhase, DeltaPriority, DeltaType};
pub use super::dependency_type::DependencyType;
pub use super::doc_level::DocLevel;
pub use super::document_section::{
    ActiveModel as DocumentSectionActiveModel, Column as DocumentSectionColumn,
    Entity as DocumentSection, Model as DocumentSectionModel,
};
pub use super::project::{
    ActiveModel as ProjectActiveModel, Column as ProjectColumn, Entity as Project,
    Model as ProjectModel,
};
pub use super::project_branch::{
    ActiveModel as ProjectBranchActiveModel, Column as ProjectBranchColumn,
    Entity as ProjectBranch, Model as ProjectBranchModel,
};
pub use super::project_component::{
    ActiveModel as ProjectComponentActiveModel, Column as ProjectComponentColumn,
    Entity as ProjectComponent, Model as ProjectComponentModel,
};
pub use super::project_contributor::{
    ActiveModel as ProjectContributorActiveModel, Column as ProjectContributorColumn,
    Entity as ProjectContributor, Model as ProjectContributorModel,
};
pub use super::project_delta::{
    ActiveModel as ProjectDeltaActiveModel, Column as ProjectDeltaColumn,
    Entity as ProjectDelta, Model as ProjectDeltaModel,
};
pub use super::project_dependency::{
    ActiveModel as ProjectDependencyActiveModel, Column as ProjectDependencyColumn,
    Entity as ProjectDependency, Model as ProjectDependencyModel,
};
pub use super::project_issue::{
    ActiveModel as ProjectIssueActiveModel, Column as ProjectIssueColumn, Entity as ProjectIssue,
    Model as ProjectIssueModel,
};
pub use super::project_language::{
    ActiveModel as ProjectLanguageActiveModel, Column as ProjectLanguageColumn,
    Entity as ProjectLanguage, Model as ProjectLanguageModel,
};
pub use super::project_pull_request::{
    ActiveModel as ProjectPullRequestActiveModel, Column as ProjectPullRequestColumn,
    Entity as ProjectPullRequest, Model as ProjectPullRequestModel,
};
pub use super::project_release::{
    ActiveModel as ProjectReleaseActiveModel, Column as ProjectReleaseColumn,
    Entity as ProjectRelease, Model as ProjectReleaseModel,
};
pub use super::project_version::{
    ActiveModel as ProjectVersionActiveModel, Column as ProjectVersionColumn,
    Entity as ProjectVersion, Model as ProjectVersionModel, SemVer,
};
pub use super::relationship_type::RelationshipType;
pub use super::section_type::SectionType;
