use serde::Deserialize;
use serde_json::{Map, Value};

/// Page size for the repository listing. The listing is never paginated.
pub const REPO_PAGE_SIZE: usize = 100;

/// Represents a GitHub user profile from the `/users/{username}` API.
///
/// Every field is optional and anything we don't read is kept in `extra`, so
/// the record is exactly what the API sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub login: Option<String>,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub public_repos: Option<u64>,
    pub html_url: Option<String>,
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry from `/users/{username}/repos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositorySummary {
    pub name: Option<String>,
    pub stargazers_count: Option<u64>,
    pub forks_count: Option<u64>,
    pub language: Option<String>,
    /// Where this repository's per-language byte breakdown lives.
    pub languages_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositorySummary {
    pub fn stars(&self) -> u64 {
        self.stargazers_count.unwrap_or(0)
    }

    pub fn forks(&self) -> u64 {
        self.forks_count.unwrap_or(0)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// The breakdown locator, if the API gave a non-empty one.
    pub fn breakdown_locator(&self) -> Option<&str> {
        self.languages_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// Repositories in most-recently-updated order, exactly as listed.
#[derive(Debug, Clone, Default)]
pub struct RepoListing {
    pub repos: Vec<RepositorySummary>,
    /// A full page came back, so the account may own repositories that were
    /// not listed.
    pub truncated: bool,
}

impl RepoListing {
    pub fn new(repos: Vec<RepositorySummary>) -> Self {
        let truncated = repos.len() >= REPO_PAGE_SIZE;
        Self { repos, truncated }
    }

    pub fn total_stars(&self) -> u64 {
        self.repos.iter().map(RepositorySummary::stars).sum()
    }

    pub fn total_forks(&self) -> u64 {
        self.repos.iter().map(RepositorySummary::forks).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_keeps_unread_fields() {
        let profile: UserProfile = serde_json::from_value(json!({
            "login": "octocat",
            "name": null,
            "followers": 12,
            "site_admin": false,
            "type": "User"
        }))
        .unwrap();

        assert_eq!(profile.login.as_deref(), Some("octocat"));
        assert_eq!(profile.name, None);
        assert_eq!(profile.followers, Some(12));
        assert_eq!(profile.bio, None);
        assert_eq!(profile.extra.get("type"), Some(&json!("User")));
        assert_eq!(profile.extra.get("site_admin"), Some(&json!(false)));
    }

    #[test]
    fn repo_counts_tolerate_null_and_missing() {
        let repo: RepositorySummary = serde_json::from_value(json!({
            "name": "hello",
            "stargazers_count": null,
            "languages_url": "https://api.github.com/repos/octocat/hello/languages"
        }))
        .unwrap();

        assert_eq!(repo.stars(), 0);
        assert_eq!(repo.forks(), 0);
        assert_eq!(
            repo.breakdown_locator(),
            Some("https://api.github.com/repos/octocat/hello/languages")
        );
    }

    #[test]
    fn blank_locator_is_no_locator() {
        let repo = RepositorySummary {
            languages_url: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(repo.breakdown_locator(), None);
    }

    #[test]
    fn listing_flags_a_full_page_as_truncated() {
        let full = RepoListing::new(vec![RepositorySummary::default(); REPO_PAGE_SIZE]);
        assert!(full.truncated);

        let partial = RepoListing::new(vec![RepositorySummary::default(); 3]);
        assert!(!partial.truncated);
    }

    #[test]
    fn listing_totals() {
        let listing = RepoListing::new(vec![
            RepositorySummary {
                stargazers_count: Some(5),
                forks_count: Some(1),
                ..Default::default()
            },
            RepositorySummary {
                stargazers_count: Some(7),
                ..Default::default()
            },
        ]);
        assert_eq!(listing.total_stars(), 12);
        assert_eq!(listing.total_forks(), 1);
    }
}
