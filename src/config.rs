use crate::error::ConfigError;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Config {
    pub access_token: String,
    pub user: String,
    /// Lowercased `owner/name` identifiers.
    pub excluded_repos: HashSet<String>,
    /// Lowercased language names.
    pub excluded_langs: HashSet<String>,
    pub include_forked_repos: bool,
    pub include_external_repos: bool,
    pub include_profile_views: bool,
}

impl Config {
    /// Load `.env` when it exists, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {e}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            access_token: required(&lookup, "ACCESS_TOKEN")?,
            user: required(&lookup, "GITHUB_ACTOR")?,
            excluded_repos: list(&lookup, "EXCLUDED_REPOS"),
            excluded_langs: list(&lookup, "EXCLUDED_LANGS"),
            include_forked_repos: boolean(&lookup, "INCLUDE_FORKED_REPOS", false),
            include_external_repos: boolean(&lookup, "INCLUDE_EXTERNAL_REPOS", false),
            include_profile_views: boolean(&lookup, "INCLUDE_PROFILE_VIEWS", false),
        })
    }

    pub fn is_repo_excluded(&self, name_with_owner: &str) -> bool {
        self.excluded_repos.contains(&name_with_owner.to_lowercase())
    }

    pub fn is_lang_excluded(&self, lang: &str) -> bool {
        self.excluded_langs.contains(&lang.to_lowercase())
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing { name }),
    }
}

fn list<F>(lookup: &F, name: &str) -> HashSet<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value
                .to_lowercase()
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// Anything other than "false" counts as enabled.
fn boolean<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| !value.trim().eq_ignore_ascii_case("false"))
        .unwrap_or(default)
}
