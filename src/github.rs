use anyhow::Context;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::languages::{Breakdown, BreakdownSource, FetchFault};
use crate::models::{REPO_PAGE_SIZE, RepoListing, RepositorySummary, UserProfile};

const GITHUB_JSON: &str = "application/vnd.github+json";
const CLIENT_AGENT: &str = concat!("gh-langstats/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GithubClient {
    http: Arc<Client>,
    api_base: Arc<String>,
    token: Option<Arc<String>>,
}

impl GithubClient {
    /// Create a REST client from the startup config. Requests are sent
    /// anonymously when no token is configured.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_AGENT));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http: Arc::new(http),
            api_base: Arc::new(config.api_base.clone()),
            token: config.token.clone().map(Arc::new),
        })
    }

    /// Absolute URLs (breakdown locators) pass through; anything else is a
    /// path under the API base.
    fn url_for(&self, target: &str) -> String {
        if target.starts_with("https://") || target.starts_with("http://") {
            target.to_string()
        } else {
            format!("{}/{}", self.api_base, target.trim_start_matches('/'))
        }
    }

    /// A GET with the JSON `Accept` header and, when available, bearer auth.
    pub fn request(&self, target: &str, query: &[(&str, &str)]) -> RequestBuilder {
        let mut req = self
            .http
            .get(self.url_for(target))
            .header(ACCEPT, GITHUB_JSON);

        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.as_str());
        }
        req
    }

    /// One read that the run cannot continue without. Non-success statuses
    /// become [`AppError::Fetch`] with the raw body; nothing is retried.
    async fn fetch_required<T: DeserializeOwned>(
        &self,
        what: &str,
        target: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self.request(target, query).send().await?;
        let status = resp.status();
        debug!(what, status = status.as_u16(), "required read");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Fetch {
                what: what.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| AppError::Decode {
            what: what.to_string(),
            source,
        })
    }

    pub async fn fetch_user(&self, username: &str) -> Result<UserProfile> {
        self.fetch_required(
            &format!("user {username}"),
            &format!("users/{username}"),
            &[],
        )
        .await
    }

    /// First page of the user's repositories, most recently updated first.
    pub async fn fetch_repos(&self, username: &str) -> Result<RepoListing> {
        let per_page = REPO_PAGE_SIZE.to_string();
        let repos: Vec<RepositorySummary> = self
            .fetch_required(
                &format!("repos for {username}"),
                &format!("users/{username}/repos"),
                &[("per_page", per_page.as_str()), ("sort", "updated")],
            )
            .await?;

        let listing = RepoListing::new(repos);
        debug!(count = listing.repos.len(), truncated = listing.truncated, "listed repos");
        Ok(listing)
    }
}

impl BreakdownSource for GithubClient {
    async fn fetch_breakdown(&self, locator: &str) -> std::result::Result<Breakdown, FetchFault> {
        let resp = self.request(locator, &[]).send().await?;
        let status = resp.status();

        // The body of a refused request is never consumed.
        if !status.is_success() {
            return Ok(Breakdown {
                status,
                body: Value::Null,
            });
        }

        let body = resp.json::<Value>().await?;
        Ok(Breakdown { status, body })
    }
}
