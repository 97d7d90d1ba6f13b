/// Final values substituted into the overview card.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub name: String,
    pub stars: u64,
    pub forks: u64,
    pub contributions: u64,
    pub lines_changed: u64,
    pub repos: u64,
    pub views: u64,
    /// `None` when profile views are disabled.
    pub profile_views: Option<u64>,
}
