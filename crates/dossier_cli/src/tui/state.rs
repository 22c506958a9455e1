//! Dashboard state and its key handling, independent of the terminal.

use dossier::github::RepoRef;
use dossier::{
    DocLevel, DocumentSectionModel, ProjectBranchModel, ProjectContributorModel,
    ProjectDeltaModel, ProjectDependencyModel, ProjectIssueModel, ProjectLanguageModel,
    ProjectModel, ProjectPullRequestModel, ProjectReleaseModel, RelationshipType,
};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Docs,
    Languages,
    Dependencies,
    Contributors,
    Issues,
    PullRequests,
    Releases,
    Branches,
    Components,
    Deltas,
}

impl Tab {
    pub(crate) const ALL: [Tab; 10] = [
        Tab::Docs,
        Tab::Languages,
        Tab::Dependencies,
        Tab::Contributors,
        Tab::Issues,
        Tab::PullRequests,
        Tab::Releases,
        Tab::Branches,
        Tab::Components,
        Tab::Deltas,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Tab::Docs => "Docs",
            Tab::Languages => "Languages",
            Tab::Dependencies => "Dependencies",
            Tab::Contributors => "Contributors",
            Tab::Issues => "Issues",
            Tab::PullRequests => "Pull Requests",
            Tab::Releases => "Releases",
            Tab::Branches => "Branches",
            Tab::Components => "Components",
            Tab::Deltas => "Deltas",
        }
    }

    pub(crate) fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Which projects the list shows, cycled with `f`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum SyncFilter {
    #[default]
    All,
    Synced,
    Unsynced,
}

impl SyncFilter {
    fn next(self) -> Self {
        match self {
            SyncFilter::All => SyncFilter::Synced,
            SyncFilter::Synced => SyncFilter::Unsynced,
            SyncFilter::Unsynced => SyncFilter::All,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SyncFilter::All => "all",
            SyncFilter::Synced => "synced",
            SyncFilter::Unsynced => "unsynced",
        }
    }

    fn admits(self, project: &ProjectModel) -> bool {
        match self {
            SyncFilter::All => true,
            SyncFilter::Synced => project.is_synced(),
            SyncFilter::Unsynced => !project.is_synced(),
        }
    }
}

/// What a line of text input is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Prompt {
    /// A name for a local project, or `owner/repo` / a GitHub URL to sync.
    AddProject,
    AddComponent { parent: String },
    NewDelta { project: String },
}

impl Prompt {
    pub(crate) fn label(&self) -> String {
        match self {
            Prompt::AddProject => "Add project (name, owner/repo or URL)".to_string(),
            Prompt::AddComponent { parent } => format!("Add component to {parent}"),
            Prompt::NewDelta { project } => format!("New delta in {project}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    /// Typing into the project filter.
    Filter,
    Input(Prompt),
    /// Waiting for y/n before deleting the named project.
    Confirm(String),
    Help,
}

/// What the event loop has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Reload the project list and the selected project's detail.
    Reload,
    /// Load the detail of the newly selected project.
    LoadDetail,
    /// Re-sync the named project from GitHub.
    Sync(String),
    /// Import a repository as a new project.
    SyncNew(RepoRef),
    CreateProject(String),
    DeleteProject(String),
    AddComponent { parent: String, child: String },
    NewDelta { project: String, name: String },
    AdvanceDelta { project: String, name: String },
}

/// `owner/repo` or a GitHub URL as a repository; anything else is a plain
/// project name.
pub(crate) fn repo_input(input: &str) -> Option<RepoRef> {
    let input = input.trim();
    if input.contains("://") || input.starts_with("git@") {
        return RepoRef::parse(input).ok();
    }
    let (owner, name) = input.split_once('/')?;
    let plain = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };
    (plain(owner) && plain(name)).then(|| RepoRef::new(owner, name))
}

/// Everything shown in the detail pane for one project.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProjectDetail {
    pub project: Option<ProjectModel>,
    pub sections: Vec<DocumentSectionModel>,
    pub languages: Vec<ProjectLanguageModel>,
    pub dependencies: Vec<ProjectDependencyModel>,
    pub contributors: Vec<ProjectContributorModel>,
    pub issues: Vec<ProjectIssueModel>,
    pub pull_requests: Vec<ProjectPullRequestModel>,
    pub releases: Vec<ProjectReleaseModel>,
    pub branches: Vec<ProjectBranchModel>,
    /// `(child name, relationship, depth)` in tree order.
    pub components: Vec<(String, RelationshipType, usize)>,
    /// Open deltas with their link counts, most recently updated first.
    pub deltas: Vec<(ProjectDeltaModel, usize)>,
}

/// A tab's content as rows of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TabTable {
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug)]
pub(crate) struct DashboardState {
    projects: Vec<ProjectModel>,
    pub filter: String,
    pub sync_filter: SyncFilter,
    pub mode: Mode,
    /// Text typed at a [`Mode::Input`] prompt.
    pub input: String,
    /// Index into the detail's deltas.
    pub delta_selected: usize,
    /// Index into [`Self::visible`].
    pub selected: usize,
    pub tab: Tab,
    pub level: DocLevel,
    pub detail: Option<ProjectDetail>,
    pub status: String,
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn date(value: Option<&sea_orm::prelude::DateTimeWithTimeZone>) -> String {
    value.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}

impl DashboardState {
    pub(crate) fn new(projects: Vec<ProjectModel>) -> Self {
        let status = format!("{} projects", projects.len());
        Self {
            projects,
            filter: String::new(),
            sync_filter: SyncFilter::All,
            mode: Mode::Normal,
            input: String::new(),
            delta_selected: 0,
            selected: 0,
            tab: Tab::Docs,
            level: DocLevel::Overview,
            detail: None,
            status,
        }
    }

    /// Projects admitted by the sync filter and matching the text filter on
    /// name or description, ignoring case.
    pub(crate) fn visible(&self) -> Vec<&ProjectModel> {
        let needle = self.filter.to_lowercase();
        self.projects
            .iter()
            .filter(|p| self.sync_filter.admits(p))
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub(crate) fn selected_project(&self) -> Option<&ProjectModel> {
        self.visible().get(self.selected).copied()
    }

    /// Swap in a fresh project list, keeping the selection on the same
    /// project name when it still exists.
    pub(crate) fn set_projects(&mut self, projects: Vec<ProjectModel>) {
        let current = self.selected_project().map(|p| p.name.clone());
        self.projects = projects;
        self.selected = current
            .and_then(|name| self.visible().iter().position(|p| p.name == name))
            .unwrap_or(0);
        self.status = format!("{} projects", self.projects.len());
    }

    pub(crate) fn set_detail(&mut self, detail: ProjectDetail) {
        self.delta_selected = self.delta_selected.min(detail.deltas.len().saturating_sub(1));
        self.detail = Some(detail);
    }

    pub(crate) fn selected_delta(&self) -> Option<&ProjectDeltaModel> {
        self.detail
            .as_ref()?
            .deltas
            .get(self.delta_selected)
            .map(|(delta, _)| delta)
    }

    fn move_delta(&mut self, forward: bool) {
        let count = self.detail.as_ref().map_or(0, |d| d.deltas.len());
        if count == 0 {
            return;
        }
        self.delta_selected = if forward {
            (self.delta_selected + 1).min(count - 1)
        } else {
            self.delta_selected.saturating_sub(1)
        };
    }

    fn prompt(&mut self, prompt: Prompt) -> Action {
        self.input.clear();
        self.mode = Mode::Input(prompt);
        Action::None
    }

    /// Name of the selected project, or a status hint when there is none.
    fn require_selection(&mut self) -> Option<String> {
        let name = self.selected_project().map(|p| p.name.clone());
        if name.is_none() {
            self.status = "No project selected".to_string();
        }
        name
    }

    fn move_selection(&mut self, forward: bool) -> Action {
        let count = self.visible().len();
        if count == 0 {
            return Action::None;
        }
        let next = if forward {
            (self.selected + 1).min(count - 1)
        } else {
            self.selected.saturating_sub(1)
        };
        if next == self.selected {
            return Action::None;
        }
        self.selected = next;
        Action::LoadDetail
    }

    fn filter_changed(&mut self) -> Action {
        self.selected = 0;
        self.delta_selected = 0;
        self.detail = None;
        Action::LoadDetail
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        match self.mode.clone() {
            Mode::Filter => self.handle_filter_key(key),
            Mode::Normal => self.handle_normal_key(key),
            Mode::Input(prompt) => self.handle_input_key(key, prompt),
            Mode::Confirm(name) => {
                self.mode = Mode::Normal;
                if matches!(key.code, KeyCode::Char('y' | 'Y')) {
                    self.status = format!("Deleting {name}...");
                    Action::DeleteProject(name)
                } else {
                    self.status = "Cancelled".to_string();
                    Action::None
                }
            }
            Mode::Help => {
                self.mode = Mode::Normal;
                Action::None
            }
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, prompt: Prompt) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.input.clear();
                Action::None
            }
            KeyCode::Backspace => {
                self.input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                Action::None
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let value = std::mem::take(&mut self.input).trim().to_string();
                if value.is_empty() {
                    return Action::None;
                }
                match prompt {
                    Prompt::AddProject => match repo_input(&value) {
                        Some(repo) => {
                            self.status = format!("Syncing {}...", repo.full_name());
                            Action::SyncNew(repo)
                        }
                        None => Action::CreateProject(value),
                    },
                    Prompt::AddComponent { parent } => Action::AddComponent {
                        parent,
                        child: value,
                    },
                    Prompt::NewDelta { project } => Action::NewDelta {
                        project,
                        name: value,
                    },
                }
            }
            _ => Action::None,
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                Action::None
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                if self.filter.is_empty() {
                    return Action::None;
                }
                self.filter.clear();
                self.filter_changed()
            }
            KeyCode::Backspace => {
                if self.filter.pop().is_some() {
                    self.filter_changed()
                } else {
                    Action::None
                }
            }
            KeyCode::Char(c) => {
                self.filter.push(c);
                self.filter_changed()
            }
            _ => Action::None,
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(false),
            KeyCode::Tab => {
                self.tab = self.tab.next();
                Action::None
            }
            KeyCode::BackTab => {
                self.tab = self.tab.prev();
                Action::None
            }
            KeyCode::Char('/') => {
                self.mode = Mode::Filter;
                Action::None
            }
            KeyCode::Char('r') => {
                self.status = "Reloading...".to_string();
                Action::Reload
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                self.level = DocLevel::ALL[index];
                self.tab = Tab::Docs;
                Action::None
            }
            KeyCode::Char('f') => {
                self.sync_filter = self.sync_filter.next();
                self.status = format!("Showing {} projects", self.sync_filter.label());
                self.filter_changed()
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Action::None
            }
            KeyCode::Char('s') => {
                let Some(project) = self.selected_project() else {
                    self.status = "No project selected".to_string();
                    return Action::None;
                };
                if project.github_owner.is_none() || project.github_repo.is_none() {
                    self.status = format!("{} is not linked to a GitHub repository", project.name);
                    return Action::None;
                }
                let name = project.name.clone();
                self.status = format!("Syncing {name}...");
                Action::Sync(name)
            }
            KeyCode::Char('a') => self.prompt(Prompt::AddProject),
            KeyCode::Char('d') => {
                if let Some(name) = self.require_selection() {
                    self.mode = Mode::Confirm(name);
                }
                Action::None
            }
            KeyCode::Char('c') => match self.require_selection() {
                Some(parent) => self.prompt(Prompt::AddComponent { parent }),
                None => Action::None,
            },
            KeyCode::Char('n') => match self.require_selection() {
                Some(project) => {
                    self.tab = Tab::Deltas;
                    self.prompt(Prompt::NewDelta { project })
                }
                None => Action::None,
            },
            KeyCode::Char(']') => {
                self.move_delta(true);
                Action::None
            }
            KeyCode::Char('[') => {
                self.move_delta(false);
                Action::None
            }
            KeyCode::Char('>') => {
                let Some(project) = self.selected_project().map(|p| p.name.clone()) else {
                    return Action::None;
                };
                let Some(delta) = self.selected_delta() else {
                    self.status = "No delta selected".to_string();
                    return Action::None;
                };
                if !delta.can_advance() {
                    self.status = format!("{} is {}", delta.name, delta.phase);
                    return Action::None;
                }
                Action::AdvanceDelta {
                    project,
                    name: delta.name.clone(),
                }
            }
            _ => Action::None,
        }
    }

    /// Sections of the current detail at or above the selected level.
    pub(crate) fn visible_sections(&self) -> Vec<&DocumentSectionModel> {
        self.detail
            .as_ref()
            .map(|d| d.sections.iter().filter(|s| s.level <= self.level).collect())
            .unwrap_or_default()
    }

    /// The current tab as a table; `None` for the docs tab.
    pub(crate) fn tab_table(&self) -> Option<TabTable> {
        let detail = self.detail.as_ref()?;
        let (header, rows): (Vec<&'static str>, Vec<Vec<String>>) = match self.tab {
            Tab::Docs => return None,
            Tab::Languages => (
                vec!["Language", "Share", "Bytes"],
                detail
                    .languages
                    .iter()
                    .map(|l| {
                        vec![
                            l.language.clone(),
                            format!("{:.1}%", l.percentage),
                            l.bytes_count.to_string(),
                        ]
                    })
                    .collect(),
            ),
            Tab::Dependencies => (
                vec!["Name", "Version", "Type", "Source"],
                detail
                    .dependencies
                    .iter()
                    .map(|d| {
                        vec![
                            d.name.clone(),
                            opt(d.version_spec.as_deref()),
                            d.dep_type.as_str().to_string(),
                            d.source.clone(),
                        ]
                    })
                    .collect(),
            ),
            Tab::Contributors => (
                vec!["User", "Contributions"],
                detail
                    .contributors
                    .iter()
                    .map(|c| vec![c.username.clone(), c.contributions.to_string()])
                    .collect(),
            ),
            Tab::Issues => (
                vec!["#", "Title", "State", "Author", "Labels"],
                detail
                    .issues
                    .iter()
                    .map(|i| {
                        vec![
                            i.issue_number.to_string(),
                            i.title.clone(),
                            i.state.clone(),
                            opt(i.author.as_deref()),
                            opt(i.labels.as_deref()),
                        ]
                    })
                    .collect(),
            ),
            Tab::PullRequests => (
                vec!["#", "Title", "State", "Author", "+/-"],
                detail
                    .pull_requests
                    .iter()
                    .map(|p| {
                        let state = if p.is_merged {
                            "merged".to_string()
                        } else if p.is_draft {
                            format!("{} (draft)", p.state)
                        } else {
                            p.state.clone()
                        };
                        vec![
                            p.pr_number.to_string(),
                            p.title.clone(),
                            state,
                            opt(p.author.as_deref()),
                            format!("+{} -{}", p.additions, p.deletions),
                        ]
                    })
                    .collect(),
            ),
            Tab::Releases => (
                vec!["Tag", "Name", "Published", "Pre"],
                detail
                    .releases
                    .iter()
                    .map(|r| {
                        vec![
                            r.tag_name.clone(),
                            opt(r.name.as_deref()),
                            date(r.release_published_at.as_ref()),
                            if r.is_prerelease { "yes" } else { "" }.to_string(),
                        ]
                    })
                    .collect(),
            ),
            Tab::Branches => (
                vec!["Branch", "Default", "Protected", "Last commit"],
                detail
                    .branches
                    .iter()
                    .map(|b| {
                        vec![
                            b.name.clone(),
                            if b.is_default { "yes" } else { "" }.to_string(),
                            if b.is_protected { "yes" } else { "" }.to_string(),
                            opt(b.commit_message.as_deref()),
                        ]
                    })
                    .collect(),
            ),
            Tab::Components => (
                vec!["Project", "Relationship"],
                detail
                    .components
                    .iter()
                    .map(|(name, kind, depth)| {
                        vec![
                            format!("{}{name}", "  ".repeat(depth.saturating_sub(1))),
                            kind.as_str().to_string(),
                        ]
                    })
                    .collect(),
            ),
            Tab::Deltas => (
                vec!["Name", "Title", "Phase", "Type", "Priority", "Links"],
                detail
                    .deltas
                    .iter()
                    .enumerate()
                    .map(|(i, (delta, links))| {
                        let cursor = if i == self.delta_selected { "> " } else { "  " };
                        vec![
                            format!("{cursor}{}", delta.name),
                            delta.title.clone(),
                            delta.phase.to_string(),
                            delta.delta_type.to_string(),
                            delta.priority.to_string(),
                            links.to_string(),
                        ]
                    })
                    .collect(),
            ),
        };
        Some(TabTable { header, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dossier::{DeltaPhase, SectionType};

    fn synced(name: &str, owner: &str) -> ProjectModel {
        ProjectModel {
            github_owner: Some(owner.into()),
            github_repo: Some(name.into()),
            last_synced_at: Some(Utc::now().fixed_offset()),
            ..project(&format!("{owner}/{name}"), None)
        }
    }

    fn delta(name: &str, phase: DeltaPhase) -> ProjectDeltaModel {
        let now = Utc::now().fixed_offset();
        ProjectDeltaModel {
            id: Default::default(),
            project_id: Default::default(),
            name: name.into(),
            title: name.into(),
            description: None,
            phase,
            phase_changed_at: now,
            priority: Default::default(),
            delta_type: Default::default(),
            started_at: None,
            completed_at: None,
            issue_number: None,
            pr_number: None,
            branch_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn typed(s: &mut DashboardState, text: &str) {
        for c in text.chars() {
            s.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn project(name: &str, description: Option<&str>) -> ProjectModel {
        let now = Utc::now().fixed_offset();
        ProjectModel {
            id: Default::default(),
            name: name.into(),
            full_name: None,
            description: description.map(str::to_string),
            repository_url: None,
            documentation_path: None,
            github_owner: None,
            github_repo: None,
            github_stars: None,
            github_language: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn section(title: &str, level: DocLevel) -> DocumentSectionModel {
        let now = Utc::now().fixed_offset();
        DocumentSectionModel {
            id: Default::default(),
            project_id: Default::default(),
            title: title.into(),
            content: String::new(),
            level,
            section_type: SectionType::General,
            source_file: None,
            order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state() -> DashboardState {
        DashboardState::new(vec![
            project("alpha", Some("HTTP server")),
            project("beta", None),
            project("gamma", Some("http client")),
        ])
    }

    #[test]
    fn moves_within_bounds() {
        let mut s = state();
        assert_eq!(s.handle_key(key(KeyCode::Char('k'))), Action::None);
        assert_eq!(s.handle_key(key(KeyCode::Char('j'))), Action::LoadDetail);
        assert_eq!(s.handle_key(key(KeyCode::Down)), Action::LoadDetail);
        assert_eq!(s.handle_key(key(KeyCode::Down)), Action::None);
        assert_eq!(s.selected_project().map(|p| p.name.as_str()), Some("gamma"));
        assert_eq!(s.handle_key(key(KeyCode::Up)), Action::LoadDetail);
        assert_eq!(s.selected, 1);
    }

    #[test]
    fn filter_matches_name_or_description() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('j')));
        assert_eq!(s.handle_key(key(KeyCode::Char('/'))), Action::None);
        assert_eq!(s.mode, Mode::Filter);
        for c in "HTTP".chars() {
            s.handle_key(key(KeyCode::Char(c)));
        }
        let names: Vec<_> = s.visible().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "gamma"]);
        assert_eq!(s.selected, 0);

        // q is text while filtering
        s.handle_key(key(KeyCode::Char('q')));
        assert!(s.visible().is_empty());
        assert_eq!(s.handle_key(key(KeyCode::Backspace)), Action::LoadDetail);

        assert_eq!(s.handle_key(key(KeyCode::Enter)), Action::None);
        assert_eq!(s.mode, Mode::Normal);
        assert_eq!(s.filter, "HTTP");

        s.handle_key(key(KeyCode::Char('/')));
        assert_eq!(s.handle_key(key(KeyCode::Esc)), Action::LoadDetail);
        assert!(s.filter.is_empty());
        assert_eq!(s.visible().len(), 3);
    }

    #[test]
    fn tabs_wrap_both_ways() {
        let mut s = state();
        s.handle_key(key(KeyCode::BackTab));
        assert_eq!(s.tab, Tab::Deltas);
        s.handle_key(key(KeyCode::Tab));
        assert_eq!(s.tab, Tab::Docs);
        s.handle_key(key(KeyCode::Tab));
        assert_eq!(s.tab, Tab::Languages);
    }

    #[test]
    fn number_keys_set_docs_level() {
        let mut s = state();
        s.tab = Tab::Issues;
        s.set_detail(ProjectDetail {
            sections: vec![
                section("Summary", DocLevel::Summary),
                section("Install", DocLevel::Overview),
                section("Internals", DocLevel::Technical),
            ],
            ..ProjectDetail::default()
        });
        assert_eq!(s.visible_sections().len(), 2);

        s.handle_key(key(KeyCode::Char('4')));
        assert_eq!(s.level, DocLevel::Technical);
        assert_eq!(s.tab, Tab::Docs);
        assert_eq!(s.visible_sections().len(), 3);

        s.handle_key(key(KeyCode::Char('1')));
        assert_eq!(s.visible_sections().len(), 1);
    }

    #[test]
    fn quit_and_reload_keys() {
        let mut s = state();
        assert_eq!(s.handle_key(key(KeyCode::Char('r'))), Action::Reload);
        assert_eq!(s.handle_key(key(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(s.handle_key(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            s.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn set_projects_keeps_selection_by_name() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('j')));
        s.set_projects(vec![project("aardvark", None), project("alpha", None), project("beta", None)]);
        assert_eq!(s.selected_project().map(|p| p.name.as_str()), Some("beta"));
        s.set_projects(vec![project("zeta", None)]);
        assert_eq!(s.selected, 0);
        assert_eq!(s.status, "1 projects");
    }

    #[test]
    fn components_table_indents_by_depth() {
        let mut s = state();
        s.tab = Tab::Components;
        assert_eq!(s.tab_table(), None);
        s.set_detail(ProjectDetail {
            components: vec![
                ("core".into(), RelationshipType::Component, 1),
                ("docs".into(), RelationshipType::Related, 2),
            ],
            ..ProjectDetail::default()
        });
        let table = s.tab_table().expect("table");
        assert_eq!(table.header, vec!["Project", "Relationship"]);
        assert_eq!(table.rows[1], vec!["  docs".to_string(), "related".to_string()]);

        s.tab = Tab::Docs;
        assert_eq!(s.tab_table(), None);
    }

    #[test]
    fn f_cycles_the_sync_filter() {
        let mut s = DashboardState::new(vec![project("local", None), synced("widget", "acme")]);
        assert_eq!(s.visible().len(), 2);
        assert_eq!(s.handle_key(key(KeyCode::Char('f'))), Action::LoadDetail);
        assert_eq!(s.sync_filter, SyncFilter::Synced);
        assert_eq!(s.visible()[0].name, "acme/widget");
        s.handle_key(key(KeyCode::Char('f')));
        assert_eq!(s.visible()[0].name, "local");
        assert_eq!(s.status, "Showing unsynced projects");
        s.handle_key(key(KeyCode::Char('f')));
        assert_eq!(s.sync_filter, SyncFilter::All);
        assert_eq!(s.visible().len(), 2);
    }

    #[test]
    fn help_closes_on_any_key() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('?')));
        assert_eq!(s.mode, Mode::Help);
        assert_eq!(s.handle_key(key(KeyCode::Char('q'))), Action::None);
        assert_eq!(s.mode, Mode::Normal);
    }

    #[test]
    fn sync_needs_a_linked_repository() {
        let mut s = DashboardState::new(vec![project("local", None), synced("widget", "acme")]);
        assert_eq!(s.handle_key(key(KeyCode::Char('s'))), Action::None);
        assert_eq!(s.status, "local is not linked to a GitHub repository");
        s.handle_key(key(KeyCode::Char('j')));
        assert_eq!(
            s.handle_key(key(KeyCode::Char('s'))),
            Action::Sync("acme/widget".into())
        );
    }

    #[test]
    fn add_syncs_repositories_and_creates_plain_names() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('a')));
        assert_eq!(s.mode, Mode::Input(Prompt::AddProject));
        typed(&mut s, "tokio-rs/axum");
        assert_eq!(
            s.handle_key(key(KeyCode::Enter)),
            Action::SyncNew(RepoRef::new("tokio-rs", "axum"))
        );
        assert_eq!(s.mode, Mode::Normal);

        s.handle_key(key(KeyCode::Char('a')));
        typed(&mut s, "notes");
        assert_eq!(s.handle_key(key(KeyCode::Enter)), Action::CreateProject("notes".into()));

        s.handle_key(key(KeyCode::Char('a')));
        typed(&mut s, "draft");
        assert_eq!(s.handle_key(key(KeyCode::Esc)), Action::None);
        assert!(s.input.is_empty());
    }

    #[test]
    fn repo_input_forms() {
        assert_eq!(repo_input("acme/widget"), Some(RepoRef::new("acme", "widget")));
        assert_eq!(
            repo_input("https://github.com/acme/widget.git"),
            Some(RepoRef::new("acme", "widget"))
        );
        assert_eq!(repo_input("widget"), None);
        assert_eq!(repo_input("my project/x"), None);
        assert_eq!(repo_input("acme/"), None);
    }

    #[test]
    fn delete_asks_first() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('d')));
        assert_eq!(s.mode, Mode::Confirm("alpha".into()));
        assert_eq!(s.handle_key(key(KeyCode::Char('n'))), Action::None);
        assert_eq!(s.status, "Cancelled");

        s.handle_key(key(KeyCode::Char('d')));
        assert_eq!(
            s.handle_key(key(KeyCode::Char('y'))),
            Action::DeleteProject("alpha".into())
        );
    }

    #[test]
    fn component_and_delta_prompts_target_the_selection() {
        let mut s = state();
        s.handle_key(key(KeyCode::Char('c')));
        typed(&mut s, "beta");
        assert_eq!(
            s.handle_key(key(KeyCode::Enter)),
            Action::AddComponent {
                parent: "alpha".into(),
                child: "beta".into()
            }
        );

        s.handle_key(key(KeyCode::Char('n')));
        assert_eq!(s.tab, Tab::Deltas);
        typed(&mut s, "dark-mode");
        assert_eq!(
            s.handle_key(key(KeyCode::Enter)),
            Action::NewDelta {
                project: "alpha".into(),
                name: "dark-mode".into()
            }
        );

        let mut empty = DashboardState::new(Vec::new());
        assert_eq!(empty.handle_key(key(KeyCode::Char('c'))), Action::None);
        assert_eq!(empty.mode, Mode::Normal);
        assert_eq!(empty.status, "No project selected");
    }

    #[test]
    fn deltas_tab_moves_cursor_and_advances() {
        let mut s = state();
        s.tab = Tab::Deltas;
        s.set_detail(ProjectDetail {
            deltas: vec![
                (delta("done", DeltaPhase::Complete), 0),
                (delta("dark-mode", DeltaPhase::Planning), 2),
            ],
            ..ProjectDetail::default()
        });

        assert_eq!(s.handle_key(key(KeyCode::Char('>'))), Action::None);
        assert_eq!(s.status, "done is complete");

        s.handle_key(key(KeyCode::Char(']')));
        s.handle_key(key(KeyCode::Char(']')));
        assert_eq!(s.delta_selected, 1);
        let table = s.tab_table().expect("table");
        assert_eq!(table.rows[1][0], "> dark-mode");
        assert_eq!(table.rows[1][2], "planning");
        assert_eq!(table.rows[1][5], "2");
        assert_eq!(
            s.handle_key(key(KeyCode::Char('>'))),
            Action::AdvanceDelta {
                project: "alpha".into(),
                name: "dark-mode".into()
            }
        );

        s.set_detail(ProjectDetail::default());
        assert_eq!(s.delta_selected, 0);
    }
}
