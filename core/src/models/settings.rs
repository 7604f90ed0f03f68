use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub font_family: String,
    pub font_size: String,
    pub background_color: String,
    pub text_color: String,
    pub accent_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "Inter, sans-serif".to_string(),
            font_size: "14px".to_string(),
            background_color: "#faf6f1".to_string(),
            text_color: "#333333".to_string(),
            accent_color: "#00c805".to_string(),
        }
    }
}

/// A GitHub repository identifier in `<owner>/<repo>` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidInput(format!("Repository must look like owner/repo, got '{}'", s));
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        let well_formed = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !well_formed(owner) || !well_formed(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Stored credentials and bookkeeping for the remote backup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSettings {
    pub token: Option<String>,
    pub repo: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncSettings {
    /// Token and parsed repository, if both are configured.
    pub fn credentials(&self) -> Result<(String, RepoId)> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidInput("GitHub token is not configured".to_string()))?;
        let repo = self
            .repo
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("GitHub repository is not configured".to_string()))?;
        Ok((token.to_string(), RepoId::parse(repo)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = Theme::default();
        assert_eq!(theme.font_size, "14px");
        let value = serde_json::to_value(&theme).unwrap();
        assert_eq!(value["accentColor"], "#00c805");
    }

    #[test]
    fn test_repo_id_parse() {
        let repo = RepoId::parse("alice/notes").unwrap();
        assert_eq!(repo.owner, "alice");
        assert_eq!(repo.name, "notes");
        assert_eq!(repo.to_string(), "alice/notes");

        assert!(RepoId::parse("alice").is_err());
        assert!(RepoId::parse("/notes").is_err());
        assert!(RepoId::parse("alice/").is_err());
        assert!(RepoId::parse("a/b/c").is_err());
        assert!(RepoId::parse("al ice/notes").is_err());
    }

    #[test]
    fn test_credentials_require_both() {
        let mut settings = SyncSettings::default();
        assert!(matches!(settings.credentials(), Err(Error::InvalidInput(_))));

        settings.token = Some("t0k".to_string());
        assert!(settings.credentials().is_err());

        settings.repo = Some("alice/notes".to_string());
        let (token, repo) = settings.credentials().unwrap();
        assert_eq!(token, "t0k");
        assert_eq!(repo.name, "notes");
    }
}
