use crate::error::RestError;
use crate::model::{CommitPage, CommitStat, PageInfo, ReposOverview};
use crate::retry::{Attempt, Poller, Reply};
use anyhow::{Context, Result};
use chrono::{SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const AGENT: &str = "gh-snapshot";

const REPOS_OVERVIEW_QUERY: &str = r#"
query ReposOverview($ownedCursor: String, $contribCursor: String) {
    viewer {
        login
        name
        repositories(first: 100, after: $ownedCursor) {
            pageInfo {
                hasNextPage
                endCursor
            }
            nodes {
                ...RepoFields
            }
        }
        repositoriesContributedTo(
            first: 100,
            includeUserRepositories: false,
            after: $contribCursor,
            contributionTypes: [COMMIT, PULL_REQUEST, REPOSITORY, PULL_REQUEST_REVIEW]
        ) {
            pageInfo {
                hasNextPage
                endCursor
            }
            nodes {
                ...RepoFields
            }
        }
    }
}

fragment RepoFields on Repository {
    nameWithOwner
    isFork
    stargazers {
        totalCount
    }
    forkCount
    languages(first: 10, orderBy: {field: SIZE, direction: DESC}) {
        edges {
            size
            node {
                name
                color
            }
        }
    }
}
"#;

const CONTRIBUTION_YEARS_QUERY: &str = r#"
query {
    viewer {
        contributionsCollection {
            contributionYears
        }
    }
}
"#;

const COMMIT_HISTORY_QUERY: &str = r#"
query CommitHistory($owner: String!, $name: String!, $cursor: String) {
    repository(owner: $owner, name: $name) {
        defaultBranchRef {
            target {
                ... on Commit {
                    history(first: 100, after: $cursor) {
                        pageInfo {
                            hasNextPage
                            endCursor
                        }
                        nodes {
                            additions
                            deletions
                            author {
                                user {
                                    login
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
"#;

/// Remote calls the aggregator depends on.
#[allow(async_fn_in_trait)]
pub trait GithubApi {
    /// One page of owned and contributed-to repositories. `None` cursors
    /// request the first page.
    async fn repos_overview(
        &self,
        owned_cursor: Option<&str>,
        contrib_cursor: Option<&str>,
    ) -> Result<ReposOverview>;

    async fn contribution_years(&self) -> Result<Vec<i32>>;

    /// Total contributions per calendar year, in a single request.
    async fn contributions_by_year(&self, years: &[i32]) -> Result<BTreeMap<i32, u64>>;

    async fn commit_history(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
    ) -> Result<CommitPage>;

    async fn repo_views(&self, name_with_owner: &str) -> Result<u64>;

    /// Raw SVG of the profile-views badge for `user`.
    async fn profile_views_badge(&self, user: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub graphql: String,
    pub rest: String,
    pub profile_views: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            graphql: "https://api.github.com/graphql".to_string(),
            rest: "https://api.github.com".to_string(),
            profile_views: "https://komarev.com/ghpvc/".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct GithubClient {
    token: Arc<String>,
    http: Arc<Client>,
    endpoints: Arc<Endpoints>,
    poller: Poller,
}

impl GithubClient {
    pub fn new(token: &str) -> Self {
        Self::with_endpoints(token, Endpoints::default())
    }

    pub fn with_endpoints(token: &str, endpoints: Endpoints) -> Self {
        Self {
            token: Arc::new(token.to_string()),
            http: Arc::new(Client::new()),
            endpoints: Arc::new(endpoints),
            poller: Poller::default(),
        }
    }

    #[cfg(test)]
    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    /// POST a GraphQL document and return its `data` object.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .http
            .post(&self.endpoints.graphql)
            .bearer_auth(&*self.token)
            .header(USER_AGENT, AGENT)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("Network error sending GraphQL request")?;

        let status = resp.status();

        // Parse JSON (even for non-2xx to capture error payloads)
        let mut json: Value = resp
            .json()
            .await
            .context("Failed to parse JSON from GitHub")?;

        if let Some(errors) = json.get("errors") {
            return Err(anyhow::anyhow!("GraphQL reported errors: {errors:#}"));
        }

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "GitHub API returned HTTP {}: {json:#}",
                status.as_u16()
            ));
        }

        match json.get_mut("data") {
            Some(data) if !data.is_null() => Ok(data.take()),
            _ => Err(anyhow::anyhow!("Missing data field in GraphQL response")),
        }
    }

    /// GET through the bounded poller. `path` is either relative to the REST
    /// base or an absolute URL.
    pub async fn rest_get(
        &self,
        path: &str,
        params: &[(&str, &str)],
        accept: &str,
    ) -> Result<Reply, RestError> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.endpoints.rest.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        };

        let url = url.as_str();
        self.poller
            .run(path, || async move {
                let sent = self
                    .http
                    .get(url)
                    .query(params)
                    .bearer_auth(&*self.token)
                    .header(ACCEPT, accept)
                    .header(USER_AGENT, AGENT)
                    .send()
                    .await;

                let resp = match sent {
                    Ok(resp) => resp,
                    Err(e) => return Attempt::Failed(e.to_string()),
                };

                let status = resp.status().as_u16();
                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                match resp.text().await {
                    Ok(body) => Attempt::Replied(Reply {
                        status,
                        content_type,
                        body,
                    }),
                    Err(e) => Attempt::Failed(format!("failed to read response body: {e}")),
                }
            })
            .await
    }
}

/// `from`/`to` bounds covering one calendar year.
fn year_bounds(year: i32) -> Result<(String, String)> {
    let start = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .with_context(|| format!("Invalid contribution year {year}"))?;
    let end = Utc
        .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
        .single()
        .with_context(|| format!("Invalid contribution year {year}"))?;

    Ok((
        start.to_rfc3339_opts(SecondsFormat::Secs, true),
        end.to_rfc3339_opts(SecondsFormat::Secs, true),
    ))
}

/// One aliased `contributionsCollection` per year, e.g. `year2021: ...`.
pub fn all_contributions_query(years: &[i32]) -> Result<String> {
    let mut fragments = Vec::with_capacity(years.len());
    for &year in years {
        let (from, to) = year_bounds(year)?;
        fragments.push(format!(
            r#"
        year{year}: contributionsCollection(from: "{from}", to: "{to}") {{
            contributionCalendar {{
                totalContributions
            }}
        }}"#
        ));
    }

    Ok(format!(
        "query {{\n    viewer {{{}\n    }}\n}}",
        fragments.join("")
    ))
}

/// Decode the aliased per-year response. Every key must be `year<YYYY>`.
pub fn parse_contributions_by_year(viewer: Value) -> Result<BTreeMap<i32, u64>> {
    #[derive(Deserialize)]
    struct YearCollection {
        #[serde(rename = "contributionCalendar")]
        contribution_calendar: Calendar,
    }
    #[derive(Deserialize)]
    struct Calendar {
        #[serde(rename = "totalContributions")]
        total_contributions: u64,
    }

    let by_alias: HashMap<String, YearCollection> = serde_json::from_value(viewer)
        .context("Failed to deserialize contributions by year response")?;

    by_alias
        .into_iter()
        .map(|(alias, collection)| {
            let year = alias
                .strip_prefix("year")
                .and_then(|y| y.parse::<i32>().ok())
                .with_context(|| format!("Unexpected contributions alias {alias}"))?;
            Ok((year, collection.contribution_calendar.total_contributions))
        })
        .collect()
}

impl GithubApi for GithubClient {
    async fn repos_overview(
        &self,
        owned_cursor: Option<&str>,
        contrib_cursor: Option<&str>,
    ) -> Result<ReposOverview> {
        #[derive(Deserialize)]
        struct OverviewData {
            viewer: ReposOverview,
        }

        let data = self
            .graphql(
                REPOS_OVERVIEW_QUERY,
                serde_json::json!({
                    "ownedCursor": owned_cursor,
                    "contribCursor": contrib_cursor,
                }),
            )
            .await?;
        let parsed: OverviewData = serde_json::from_value(data)
            .context("Failed to deserialize repos_overview response")?;

        Ok(parsed.viewer)
    }

    async fn contribution_years(&self) -> Result<Vec<i32>> {
        #[derive(Deserialize)]
        struct YearsData {
            viewer: YearsViewer,
        }
        #[derive(Deserialize)]
        struct YearsViewer {
            #[serde(rename = "contributionsCollection")]
            contributions_collection: YearsCollection,
        }
        #[derive(Deserialize)]
        struct YearsCollection {
            #[serde(rename = "contributionYears")]
            contribution_years: Vec<i32>,
        }

        let data = self.graphql(CONTRIBUTION_YEARS_QUERY, Value::Null).await?;
        let parsed: YearsData = serde_json::from_value(data)
            .context("Failed to deserialize contribution_years response")?;

        Ok(parsed.viewer.contributions_collection.contribution_years)
    }

    async fn contributions_by_year(&self, years: &[i32]) -> Result<BTreeMap<i32, u64>> {
        let query = all_contributions_query(years)?;
        let mut data = self.graphql(&query, Value::Null).await?;

        let viewer = data
            .get_mut("viewer")
            .map(Value::take)
            .context("Missing viewer in contributions by year response")?;

        parse_contributions_by_year(viewer)
    }

    async fn commit_history(
        &self,
        owner: &str,
        name: &str,
        cursor: Option<&str>,
    ) -> Result<CommitPage> {
        #[derive(Deserialize)]
        struct RepoHistoryData {
            repository: Option<RepositoryWrapper>,
        }
        #[derive(Deserialize)]
        struct RepositoryWrapper {
            #[serde(rename = "defaultBranchRef")]
            default_branch_ref: Option<DefaultBranchRef>,
        }
        #[derive(Deserialize)]
        struct DefaultBranchRef {
            target: Option<TargetCommit>,
        }
        #[derive(Deserialize)]
        struct TargetCommit {
            history: Option<CommitHistoryPage>,
        }
        #[derive(Deserialize)]
        struct CommitHistoryPage {
            #[serde(rename = "pageInfo")]
            page_info: PageInfo,
            nodes: Option<Vec<HistoryNode>>,
        }
        #[derive(Deserialize)]
        struct HistoryNode {
            additions: Option<u64>,
            deletions: Option<u64>,
            author: Option<CommitAuthor>,
        }
        #[derive(Deserialize)]
        struct CommitAuthor {
            user: Option<UserLogin>,
        }
        #[derive(Deserialize)]
        struct UserLogin {
            login: Option<String>,
        }

        let data = self
            .graphql(
                COMMIT_HISTORY_QUERY,
                serde_json::json!({ "owner": owner, "name": name, "cursor": cursor }),
            )
            .await?;
        let parsed: RepoHistoryData = serde_json::from_value(data)
            .context("Failed to deserialize commit_history response")?;

        // Empty repositories have no default branch.
        let Some(history) = parsed
            .repository
            .and_then(|r| r.default_branch_ref)
            .and_then(|b| b.target)
            .and_then(|t| t.history)
        else {
            return Ok(CommitPage::default());
        };

        let commits = history
            .nodes
            .unwrap_or_default()
            .into_iter()
            .map(|node| CommitStat {
                additions: node.additions.unwrap_or(0),
                deletions: node.deletions.unwrap_or(0),
                author_login: node.author.and_then(|a| a.user).and_then(|u| u.login),
            })
            .collect();

        Ok(CommitPage {
            page_info: history.page_info,
            commits,
        })
    }

    async fn repo_views(&self, name_with_owner: &str) -> Result<u64> {
        #[derive(Deserialize)]
        struct Views {
            count: u64,
        }

        let reply = self
            .rest_get(
                &format!("repos/{name_with_owner}/traffic/views"),
                &[],
                "application/vnd.github+json",
            )
            .await?;
        let views: Views = serde_json::from_str(&reply.body)
            .with_context(|| format!("Failed to decode traffic views for {name_with_owner}"))?;

        Ok(views.count)
    }

    async fn profile_views_badge(&self, user: &str) -> Result<String> {
        let url = self.endpoints.profile_views.clone();
        let reply = self
            .rest_get(&url, &[("username", user)], "image/svg+xml")
            .await?;

        let content_type = reply.content_type.unwrap_or_default();
        if !content_type.contains("image/svg+xml") {
            return Err(RestError::UnexpectedContentType {
                target: url,
                content_type,
            }
            .into());
        }

        Ok(reply.body)
    }
}
