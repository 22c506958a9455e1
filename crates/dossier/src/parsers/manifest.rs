//! Dependency manifest parsing for `pyproject.toml`, `package.json` and
//! `requirements.txt`.
//!
//! Parsing is best-effort: a manifest that cannot be read yields no records.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::entity::prelude::DependencyType;

pub const PYPROJECT: &str = "pyproject.toml";
pub const PACKAGE_JSON: &str = "package.json";
pub const REQUIREMENTS: &str = "requirements.txt";

static PEP508: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+(?:\[[^\]]+\])?)\s*(.*)$").expect("PEP 508 pattern is valid")
});

/// Optional-dependency groups treated as development dependencies.
const DEV_GROUPS: &[&str] = &["dev", "test", "testing"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version_spec: Option<String>,
    pub dep_type: DependencyType,
    /// Manifest file the entry came from.
    pub source: String,
}

impl DependencyRecord {
    fn new(name: impl Into<String>, version_spec: Option<String>, dep_type: DependencyType, source: &str) -> Self {
        Self {
            name: name.into(),
            version_spec,
            dep_type,
            source: source.to_string(),
        }
    }
}

/// Split a PEP 508 requirement into name and version constraint.
///
/// Extras are dropped from the name; an empty constraint is `None`.
pub fn parse_pep508(spec: &str) -> (String, Option<String>) {
    let spec = spec.trim();
    match PEP508.captures(spec) {
        Some(caps) => {
            let name = caps
                .get(1)
                .map_or(spec, |m| m.as_str())
                .split('[')
                .next()
                .unwrap_or_default()
                .to_string();
            let version = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            (name, version)
        }
        None => (spec.to_string(), None),
    }
}

fn pep508_records<'a>(
    specs: impl IntoIterator<Item = &'a toml::Value>,
    dep_type: DependencyType,
) -> impl Iterator<Item = DependencyRecord> {
    specs.into_iter().filter_map(move |v| {
        let (name, version) = parse_pep508(v.as_str()?);
        Some(DependencyRecord::new(name, version, dep_type, PYPROJECT))
    })
}

fn poetry_records(table: Option<&toml::Value>, dep_type: DependencyType) -> Vec<DependencyRecord> {
    let Some(table) = table.and_then(toml::Value::as_table) else {
        return Vec::new();
    };
    table
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("python"))
        .map(|(name, value)| {
            let version = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Table(t) => t
                    .get("version")
                    .and_then(toml::Value::as_str)
                    .unwrap_or("*")
                    .to_string(),
                other => other.to_string(),
            };
            DependencyRecord::new(name.as_str(), Some(version), dep_type, PYPROJECT)
        })
        .collect()
}

fn array<'a>(value: Option<&'a toml::Value>) -> &'a [toml::Value] {
    value
        .and_then(toml::Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// PEP 621, Poetry and uv dependency tables.
pub fn parse_pyproject(content: &str) -> Vec<DependencyRecord> {
    let doc: toml::Table = match content.parse() {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable pyproject.toml");
            return Vec::new();
        }
    };

    let mut deps = Vec::new();
    let project = doc.get("project");
    let tool = doc.get("tool");

    deps.extend(pep508_records(
        array(project.and_then(|p| p.get("dependencies"))),
        DependencyType::Runtime,
    ));

    if let Some(groups) = project
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(toml::Value::as_table)
    {
        for (group, specs) in groups {
            let dep_type = if DEV_GROUPS.contains(&group.as_str()) {
                DependencyType::Dev
            } else {
                DependencyType::Optional
            };
            deps.extend(pep508_records(array(Some(specs)), dep_type));
        }
    }

    let poetry = tool.and_then(|t| t.get("poetry"));
    deps.extend(poetry_records(
        poetry.and_then(|p| p.get("dependencies")),
        DependencyType::Runtime,
    ));
    deps.extend(poetry_records(
        poetry.and_then(|p| p.get("dev-dependencies")),
        DependencyType::Dev,
    ));

    let uv = tool.and_then(|t| t.get("uv"));
    deps.extend(pep508_records(
        array(uv.and_then(|u| u.get("dependencies"))),
        DependencyType::Runtime,
    ));
    deps.extend(pep508_records(
        array(uv.and_then(|u| u.get("dev-dependencies"))),
        DependencyType::Dev,
    ));

    deps
}

/// npm dependency maps, in declaration order.
pub fn parse_package_json(content: &str) -> Vec<DependencyRecord> {
    let doc: serde_json::Value = match serde_json::from_str(content) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable package.json");
            return Vec::new();
        }
    };

    let sections = [
        ("dependencies", DependencyType::Runtime),
        ("devDependencies", DependencyType::Dev),
        ("peerDependencies", DependencyType::Peer),
        ("optionalDependencies", DependencyType::Optional),
    ];

    let mut deps = Vec::new();
    for (key, dep_type) in sections {
        let Some(map) = doc.get(key).and_then(serde_json::Value::as_object) else {
            continue;
        };
        for (name, version) in map {
            let version = match version {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            deps.push(DependencyRecord::new(name.as_str(), Some(version), dep_type, PACKAGE_JSON));
        }
    }
    deps
}

/// One requirement per line; comments and pip options are skipped.
pub fn parse_requirements(content: &str) -> Vec<DependencyRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let (name, version) = parse_pep508(line);
            (!name.is_empty())
                .then(|| DependencyRecord::new(name, version, DependencyType::Runtime, REQUIREMENTS))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(deps: &[DependencyRecord]) -> Vec<&str> {
        deps.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn pep508_splits_name_and_constraint() {
        assert_eq!(parse_pep508("httpx>=0.27"), ("httpx".into(), Some(">=0.27".into())));
        assert_eq!(
            parse_pep508("uvicorn[standard] >= 0.30, <1"),
            ("uvicorn".into(), Some(">= 0.30, <1".into()))
        );
        assert_eq!(parse_pep508("  rich  "), ("rich".into(), None));
        assert_eq!(parse_pep508("@weird"), ("@weird".into(), None));
    }

    #[test]
    fn pyproject_covers_pep621_poetry_and_uv() {
        let content = r#"
[project]
name = "demo"
dependencies = ["httpx>=0.27", "rich"]

[project.optional-dependencies]
test = ["pytest>=8"]
docs = ["mkdocs"]

[tool.poetry.dependencies]
python = "^3.11"
click = "^8.1"
sqlmodel = { version = "^0.0.16", extras = ["asyncio"] }
typer = { git = "https://github.com/tiangolo/typer" }

[tool.poetry.dev-dependencies]
ruff = "^0.4"

[tool.uv]
dev-dependencies = ["mypy>=1.10"]
"#;
        let deps = parse_pyproject(content);
        assert_eq!(
            names(&deps),
            vec!["httpx", "rich", "pytest", "mkdocs", "click", "sqlmodel", "typer", "ruff", "mypy"]
        );

        let by_name = |n: &str| deps.iter().find(|d| d.name == n).cloned();
        assert_eq!(by_name("rich").and_then(|d| d.version_spec), None);
        assert_eq!(by_name("pytest").map(|d| d.dep_type), Some(DependencyType::Dev));
        assert_eq!(by_name("mkdocs").map(|d| d.dep_type), Some(DependencyType::Optional));
        assert_eq!(by_name("sqlmodel").and_then(|d| d.version_spec).as_deref(), Some("^0.0.16"));
        assert_eq!(by_name("typer").and_then(|d| d.version_spec).as_deref(), Some("*"));
        assert_eq!(by_name("ruff").map(|d| d.dep_type), Some(DependencyType::Dev));
        assert_eq!(by_name("mypy").map(|d| d.dep_type), Some(DependencyType::Dev));
        assert!(deps.iter().all(|d| d.source == PYPROJECT));
    }

    #[test]
    fn broken_manifests_yield_nothing() {
        assert!(parse_pyproject("[project\nname=").is_empty());
        assert!(parse_package_json("{not json").is_empty());
    }

    #[test]
    fn package_json_keeps_declaration_order() {
        let content = r#"{
            "name": "demo",
            "dependencies": {"react": "^18.2.0", "axios": "^1.6"},
            "devDependencies": {"vitest": "^1.0"},
            "peerDependencies": {"react-dom": ">=18"},
            "optionalDependencies": {"fsevents": "*"}
        }"#;
        let deps = parse_package_json(content);
        assert_eq!(names(&deps), vec!["react", "axios", "vitest", "react-dom", "fsevents"]);
        let kinds: Vec<_> = deps.iter().map(|d| d.dep_type).collect();
        assert_eq!(
            kinds,
            vec![
                DependencyType::Runtime,
                DependencyType::Runtime,
                DependencyType::Dev,
                DependencyType::Peer,
                DependencyType::Optional,
            ]
        );
    }

    #[test]
    fn requirements_skip_comments_and_options() {
        let content = "\
# pinned
requests==2.31.0
-r base.txt
--index-url https://example.org

flask
";
        let deps = parse_requirements(content);
        assert_eq!(names(&deps), vec!["requests", "flask"]);
        assert_eq!(deps[0].version_spec.as_deref(), Some("==2.31.0"));
        assert!(deps.iter().all(|d| d.dep_type == DependencyType::Runtime));
    }
}
