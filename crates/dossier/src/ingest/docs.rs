//! Documentation collection for a repository.

use std::path::Path;

use tracing::debug;

use crate::github::{GitHubClient, RepoRef};
use crate::parsers::{DocParser, MarkdownParser, ParsedSection, ParserRegistry};

use super::error::Result;

/// Sections collected from a repository, plus how many docs-folder files
/// contributed to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedDocs {
    pub sections: Vec<ParsedSection>,
    pub files: usize,
}

fn source_name(full_name: &str, path: &str) -> String {
    format!("github:{full_name}/{path}")
}

/// Parse the README and, when `include_docs` is set, every documentation
/// file the repository exposes.
///
/// README sections come first. Docs-folder sections follow, each file's
/// `order` shifted past everything collected before it. Files whose name
/// starts with `README` are skipped since the README is already parsed.
/// Formats without a registered parser are read as Markdown.
pub async fn collect_repo_sections(
    client: &GitHubClient,
    repo: &RepoRef,
    git_ref: Option<&str>,
    include_docs: bool,
    registry: &ParserRegistry,
) -> Result<CollectedDocs> {
    let full_name = repo.full_name();
    let fallback = MarkdownParser;
    let mut collected = CollectedDocs::default();

    if let Some(readme) = client.get_readme(repo).await? {
        let source = source_name(&full_name, "README.md");
        collected
            .sections
            .extend(fallback.parse(&readme, Some(&source)));
    }

    if !include_docs {
        return Ok(collected);
    }

    for file in client.list_docs_files(repo, git_ref).await? {
        if file.name.to_uppercase().starts_with("README") {
            continue;
        }
        let Some(content) = client.get_file_content(repo, &file.path).await? else {
            debug!(owner = %repo.owner, repo = %repo.name, path = %file.path, "doc file vanished");
            continue;
        };

        let parser = registry
            .parser_for(Path::new(&file.name))
            .unwrap_or(&fallback);
        let source = source_name(&full_name, &file.path);
        let offset = i32::try_from(collected.sections.len()).unwrap_or(i32::MAX);
        let parsed = parser.parse(&content, Some(&source));
        if !parsed.is_empty() {
            collected.files += 1;
        }
        collected
            .sections
            .extend(parsed.into_iter().map(|mut section| {
                section.order = section.order.saturating_add(offset);
                section
            }));
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::test_support::*;
    use crate::http::MockTransport;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn file_json(name: &str, path: &str, text: &str) -> serde_json::Value {
        json!({"name": name, "path": path, "type": "file", "content": STANDARD.encode(text)})
    }

    fn repo_ref() -> RepoRef {
        RepoRef::new("acme", "widget")
    }

    #[tokio::test]
    async fn readme_sections_come_first_and_docs_are_offset() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/readme"),
            200,
            file_json("README.md", "README.md", "# Widget\nIntro\n## Install\ncargo install widget\n"),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/"),
            200,
            json!([
                {"name": "README.md", "path": "README.md", "type": "file"},
                {"name": "docs", "path": "docs", "type": "dir"}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/docs"),
            200,
            json!([
                {"name": "guide.md", "path": "docs/guide.md", "type": "file"},
                {"name": "readme-old.md", "path": "docs/readme-old.md", "type": "file"}
            ]),
        );
        transport.push_json(
            format!("{API}/repos/acme/widget/contents/docs/guide.md"),
            200,
            file_json("guide.md", "docs/guide.md", "# Guide\nSteps\n"),
        );
        let client = mock_client(&transport);

        let docs = collect_repo_sections(&client, &repo_ref(), None, true, &ParserRegistry::default())
            .await
            .expect("docs");

        let titles: Vec<_> = docs.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Widget", "Install", "Guide"]);
        assert_eq!(docs.files, 1);
        assert_eq!(
            docs.sections[0].source_file.as_deref(),
            Some("github:acme/widget/README.md")
        );
        assert_eq!(
            docs.sections[2].source_file.as_deref(),
            Some("github:acme/widget/docs/guide.md")
        );
        assert_eq!(docs.sections[2].order, 2);
    }

    #[tokio::test]
    async fn docs_folder_is_not_listed_when_disabled() {
        let transport = MockTransport::new();
        transport.push_json(
            format!("{API}/repos/acme/widget/readme"),
            404,
            json!({"message": "Not Found"}),
        );
        let client = mock_client(&transport);

        let docs = collect_repo_sections(&client, &repo_ref(), None, false, &ParserRegistry::default())
            .await
            .expect("docs");
        assert!(docs.sections.is_empty());
        assert_eq!(transport.request_count(), 1);
    }
}
