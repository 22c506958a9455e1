//! Owner/name references parsed from GitHub URLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::GitHubError;

const SSH_PREFIX: &str = "git@github.com:";

/// An `owner/name` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Accepts `git@github.com:owner/repo(.git)` and any URL whose path
    /// starts with `/owner/repo`. Extra path segments are ignored.
    pub fn parse(input: &str) -> Result<Self, GitHubError> {
        let input = input.trim();
        let invalid = || GitHubError::InvalidUrl(input.to_string());

        if let Some(rest) = input.strip_prefix(SSH_PREFIX) {
            let rest = rest.strip_suffix(".git").unwrap_or(rest);
            let (owner, name) = rest.split_once('/').ok_or_else(invalid)?;
            if owner.is_empty() || name.is_empty() {
                return Err(invalid());
            }
            return Ok(Self::new(owner, name));
        }

        let url = url::Url::parse(input).map_err(|_| invalid())?;
        let path = url.path().trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.split('/').filter(|p| !p.is_empty());
        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) => {
                let name = name.strip_suffix(".git").unwrap_or(name);
                Ok(Self::new(owner, name))
            }
            _ => Err(invalid()),
        }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    #[must_use]
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = GitHubError;

    /// Also accepts the bare `owner/repo` shorthand.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains("://")
            && !s.starts_with(SSH_PREFIX)
            && let Some((owner, name)) = s.trim().split_once('/')
            && !owner.is_empty()
            && !name.is_empty()
            && !name.contains('/')
        {
            return Ok(Self::new(owner, name));
        }
        Self::parse(s)
    }
}
