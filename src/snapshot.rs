use crate::badge;
use crate::config::Config;
use crate::github::GithubApi;
use crate::model::{LanguageStat, PageInfo, ReposOverview, RepositoryRecord};
use crate::stats::Stats;
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

const DEFAULT_NAME: &str = "No Name";
const DEFAULT_LANGUAGE_COLOR: &str = "#000000";

/// Everything produced by the repository pagination pass.
#[derive(Debug, Default)]
struct RepoOverview {
    name: String,
    stargazers: u64,
    forks: u64,
    repos: BTreeMap<String, RepositoryRecord>,
    languages: HashMap<String, LanguageStat>,
}

pub struct Snapshot<A> {
    api: A,
    config: Config,
    overview: Option<RepoOverview>,
    contributions: Option<u64>,
    lines_changed: Option<(u64, u64)>,
    views: Option<u64>,
    profile_views: Option<u64>,
}

impl<A: GithubApi> Snapshot<A> {
    pub fn new(api: A, config: Config) -> Self {
        Self {
            api,
            config,
            overview: None,
            contributions: None,
            lines_changed: None,
            views: None,
            profile_views: None,
        }
    }

    async fn overview(&mut self) -> Result<&RepoOverview> {
        if self.overview.is_none() {
            let overview = self.collect_overview().await?;
            self.overview = Some(overview);
        }

        self.overview
            .as_ref()
            .context("repository overview was not computed")
    }

    pub async fn name(&mut self) -> Result<String> {
        Ok(self.overview().await?.name.clone())
    }

    pub async fn stargazers(&mut self) -> Result<u64> {
        Ok(self.overview().await?.stargazers)
    }

    pub async fn forks(&mut self) -> Result<u64> {
        Ok(self.overview().await?.forks)
    }

    pub async fn repositories(&mut self) -> Result<&BTreeMap<String, RepositoryRecord>> {
        Ok(&self.overview().await?.repos)
    }

    pub async fn languages(&mut self) -> Result<&HashMap<String, LanguageStat>> {
        Ok(&self.overview().await?.languages)
    }

    /// Walk both repository collections page by page until neither reports
    /// another page.
    async fn collect_overview(&self) -> Result<RepoOverview> {
        let mut overview = RepoOverview::default();
        let mut owned_cursor: Option<String> = None;
        let mut contrib_cursor: Option<String> = None;
        let mut owned_done = false;
        let mut contrib_done = false;
        let mut page = 0usize;

        loop {
            page += 1;
            let ReposOverview {
                login,
                name,
                repositories,
                repositories_contributed_to,
            } = self
                .api
                .repos_overview(owned_cursor.as_deref(), contrib_cursor.as_deref())
                .await
                .with_context(|| format!("Failed to fetch repositories page {page}"))?;

            overview.name = display_name(name, login);

            if !owned_done {
                for repo in repositories.nodes {
                    self.ingest(&mut overview, repo);
                }
                (owned_done, owned_cursor) = advance(repositories.page_info, owned_cursor);
            }

            if !contrib_done {
                if self.config.include_external_repos {
                    for repo in repositories_contributed_to.nodes {
                        self.ingest(&mut overview, repo);
                    }
                }
                (contrib_done, contrib_cursor) =
                    advance(repositories_contributed_to.page_info, contrib_cursor);
            }

            if owned_done && contrib_done {
                break;
            }
        }

        apply_language_shares(&mut overview.languages);

        info!(
            "Collected {} repositories over {page} page(s): {} stars, {} forks, {} languages",
            overview.repos.len(),
            overview.stargazers,
            overview.forks,
            overview.languages.len()
        );

        Ok(overview)
    }

    fn ingest(&self, overview: &mut RepoOverview, repo: RepositoryRecord) {
        if self.config.is_repo_excluded(&repo.name_with_owner) {
            debug!("Skipping excluded repository {}", repo.name_with_owner);
            return;
        }
        if overview.repos.contains_key(&repo.name_with_owner) {
            return;
        }
        if repo.is_fork && !self.config.include_forked_repos {
            debug!("Skipping forked repository {}", repo.name_with_owner);
            return;
        }

        for edge in &repo.languages.edges {
            if self.config.is_lang_excluded(&edge.node.name) {
                continue;
            }

            overview
                .languages
                .entry(edge.node.name.clone())
                .and_modify(|stat| {
                    stat.size += edge.size;
                    stat.occurrences += 1;
                })
                .or_insert_with(|| LanguageStat {
                    size: edge.size,
                    occurrences: 1,
                    color: edge
                        .node
                        .color
                        .clone()
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| DEFAULT_LANGUAGE_COLOR.to_string()),
                    share: 0.0,
                });
        }

        overview.stargazers += repo.stargazers.total_count;
        overview.forks += repo.fork_count;
        overview.repos.insert(repo.name_with_owner.clone(), repo);
    }

    /// Sum of every year's contribution calendar total.
    pub async fn contributions(&mut self) -> Result<u64> {
        if let Some(total) = self.contributions {
            return Ok(total);
        }

        let years = self
            .api
            .contribution_years()
            .await
            .context("Failed to get contribution years")?;

        let total = if years.is_empty() {
            0
        } else {
            let by_year = self
                .api
                .contributions_by_year(&years)
                .await
                .context("Failed to get contributions by year")?;
            for (year, count) in &by_year {
                debug!("Made {count} contributions in {year}");
            }
            by_year.values().sum()
        };

        info!("Total contributions: {total}");
        self.contributions = Some(total);
        Ok(total)
    }

    /// Lines added and deleted by the configured user on the default branch
    /// of every retained repository.
    pub async fn lines_added_deleted(&mut self) -> Result<(u64, u64)> {
        if let Some(pair) = self.lines_changed {
            return Ok(pair);
        }

        self.overview().await?;
        let Some(overview) = self.overview.as_ref() else {
            anyhow::bail!("repository overview was not computed");
        };

        let mut additions = 0u64;
        let mut deletions = 0u64;

        for repo in overview.repos.values() {
            let Some((owner, name)) = repo.owner_and_name() else {
                continue;
            };

            let mut cursor: Option<String> = None;
            loop {
                let page = self
                    .api
                    .commit_history(owner, name, cursor.as_deref())
                    .await
                    .with_context(|| {
                        format!("Failed to get commit history for {}", repo.name_with_owner)
                    })?;

                for commit in &page.commits {
                    let by_user = commit
                        .author_login
                        .as_deref()
                        .is_some_and(|login| login.eq_ignore_ascii_case(&self.config.user));
                    if by_user {
                        additions = additions.saturating_add(commit.additions);
                        deletions = deletions.saturating_add(commit.deletions);
                    }
                }

                match page.page_info.end_cursor {
                    Some(next) if page.page_info.has_next_page => cursor = Some(next),
                    _ => break,
                }
            }
        }

        info!("Lines changed: {additions} added, {deletions} deleted");
        self.lines_changed = Some((additions, deletions));
        Ok((additions, deletions))
    }

    pub async fn lines_changed(&mut self) -> Result<u64> {
        let (additions, deletions) = self.lines_added_deleted().await?;
        Ok(additions.saturating_add(deletions))
    }

    /// Traffic views summed over retained repositories. A repository whose
    /// views cannot be fetched counts as zero.
    pub async fn views(&mut self) -> Result<u64> {
        if let Some(total) = self.views {
            return Ok(total);
        }

        self.overview().await?;
        let Some(overview) = self.overview.as_ref() else {
            anyhow::bail!("repository overview was not computed");
        };

        let mut total = 0u64;
        for name_with_owner in overview.repos.keys() {
            match self.api.repo_views(name_with_owner).await {
                Ok(count) => total = total.saturating_add(count),
                Err(e) => warn!("Failed to get views for {name_with_owner}: {e:#}"),
            }
        }

        info!("Total views: {total}");
        self.views = Some(total);
        Ok(total)
    }

    pub async fn profile_views(&mut self) -> Result<u64> {
        if let Some(total) = self.profile_views {
            return Ok(total);
        }

        let svg = self
            .api
            .profile_views_badge(&self.config.user)
            .await
            .context("Failed to fetch profile views badge")?;
        let total = badge::parse_profile_views(&svg).unwrap_or_else(|| {
            warn!("Profile views badge did not contain a view count");
            0
        });

        self.profile_views = Some(total);
        Ok(total)
    }

    /// Resolve every value the cards need.
    pub async fn stats(&mut self) -> Result<Stats> {
        let profile_views = if self.config.include_profile_views {
            Some(self.profile_views().await?)
        } else {
            None
        };

        Ok(Stats {
            name: self.name().await?,
            stars: self.stargazers().await?,
            forks: self.forks().await?,
            contributions: self.contributions().await?,
            lines_changed: self.lines_changed().await?,
            repos: self.repositories().await?.len() as u64,
            views: self.views().await?,
            profile_views,
        })
    }
}

/// Whether a collection is finished, and the cursor for its next request.
/// A page claiming more results without a cursor ends the collection.
fn advance(page_info: PageInfo, current: Option<String>) -> (bool, Option<String>) {
    match page_info.end_cursor {
        Some(next) if page_info.has_next_page => (false, Some(next)),
        Some(last) => (true, Some(last)),
        None => (true, current),
    }
}

fn display_name(name: Option<String>, login: String) -> String {
    name.filter(|n| !n.is_empty())
        .or_else(|| Some(login).filter(|l| !l.is_empty()))
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

fn apply_language_shares(languages: &mut HashMap<String, LanguageStat>) {
    let total: u64 = languages.values().map(|l| l.size).sum();
    if total == 0 {
        return;
    }
    for stat in languages.values_mut() {
        stat.share = stat.size as f64 * 100.0 / total as f64;
    }
}
