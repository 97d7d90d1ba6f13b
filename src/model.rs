use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CountObj {
    #[serde(rename = "totalCount")]
    pub total_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageNode {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LanguageEdge {
    pub size: u64,
    pub node: LanguageNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageEdges {
    #[serde(default)]
    pub edges: Vec<LanguageEdge>,
}

/// One repository as returned by either repository collection.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryRecord {
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
    #[serde(rename = "isFork")]
    pub is_fork: bool,
    pub stargazers: CountObj,
    #[serde(rename = "forkCount")]
    pub fork_count: u64,
    #[serde(default)]
    pub languages: LanguageEdges,
}

impl RepositoryRecord {
    /// Split `owner/name`. `None` unless there are exactly two segments.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let mut parts = self.name_with_owner.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Some((owner, name)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryPage {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<RepositoryRecord>,
}

/// One page of both repository collections plus the viewer's identity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReposOverview {
    pub login: String,
    pub name: Option<String>,
    pub repositories: RepositoryPage,
    #[serde(rename = "repositoriesContributedTo")]
    pub repositories_contributed_to: RepositoryPage,
}

/// A commit on a default branch, reduced to what lines-changed needs.
#[derive(Debug, Clone, Default)]
pub struct CommitStat {
    pub additions: u64,
    pub deletions: u64,
    pub author_login: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommitPage {
    pub page_info: PageInfo,
    pub commits: Vec<CommitStat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageStat {
    pub size: u64,
    pub occurrences: u32,
    pub color: String,
    /// Percentage of all retained bytes, filled in once ingestion is done.
    pub share: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name_with_owner: &str) -> RepositoryRecord {
        RepositoryRecord {
            name_with_owner: name_with_owner.to_string(),
            is_fork: false,
            stargazers: CountObj::default(),
            fork_count: 0,
            languages: LanguageEdges::default(),
        }
    }

    #[test]
    fn splits_owner_and_name() {
        assert_eq!(
            record("octocat/hello-world").owner_and_name(),
            Some(("octocat", "hello-world"))
        );
        assert_eq!(record("octocat").owner_and_name(), None);
        assert_eq!(record("a/b/c").owner_and_name(), None);
    }

    #[test]
    fn decodes_graphql_repository_node() {
        let json = serde_json::json!({
            "nameWithOwner": "octocat/hello-world",
            "isFork": true,
            "stargazers": { "totalCount": 12 },
            "forkCount": 3,
            "languages": {
                "edges": [
                    { "size": 1024, "node": { "name": "Rust", "color": "#dea584" } },
                    { "size": 10, "node": { "name": "Shell", "color": null } }
                ]
            }
        });

        let repo: RepositoryRecord = serde_json::from_value(json).unwrap();
        assert!(repo.is_fork);
        assert_eq!(repo.stargazers.total_count, 12);
        assert_eq!(repo.fork_count, 3);
        assert_eq!(repo.languages.edges.len(), 2);
        assert_eq!(repo.languages.edges[1].node.color, None);
    }
}
