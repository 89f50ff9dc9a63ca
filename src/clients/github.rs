use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use url::Url;

use crate::domain::GitHubLogin;
use crate::pagination::{fetch_all, Page, PaginationError};

pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Secret<String>,
    org: String,
    team_slug: String,
    max_pages: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("Failed to call the GitHub API")]
    Request(#[from] reqwest::Error),
    #[error("GitHub answered {0}")]
    UnexpectedStatus(StatusCode),
    #[error("Invalid team members URL")]
    Url(#[from] url::ParseError),
    #[error("GitHub team listing did not end after {0} pages")]
    Unbounded(usize),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TeamMember {
    pub login: String,
}

impl GitHubClient {
    pub fn new(
        base_url: String,
        token: Secret<String>,
        org: String,
        team_slug: String,
        timeout: Duration,
        max_pages: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            token,
            org,
            team_slug,
            max_pages,
        })
    }

    #[tracing::instrument(name = "Checking GitHub team membership", skip(self))]
    pub async fn is_team_member(&self, login: &GitHubLogin) -> Result<bool, GitHubError> {
        let is_member = self
            .team_members()
            .await?
            .iter()
            .any(|member| member.login == login.as_ref());

        tracing::info!(is_member, "GitHub team membership resolved");
        Ok(is_member)
    }

    /// Every member of the configured team. A non-200 answer on any page
    /// yields an empty list rather than an error.
    pub async fn team_members(&self) -> Result<Vec<TeamMember>, GitHubError> {
        let first = Url::parse(&format!(
            "{}/orgs/{}/teams/{}/members?per_page=100",
            self.base_url, self.org, self.team_slug
        ))?;

        let next_page = move |url| self.members_page(url);
        match fetch_all(first, self.max_pages, next_page).await {
            Ok(members) => Ok(members),
            Err(PaginationError::Page(GitHubError::UnexpectedStatus(status))) => {
                tracing::warn!(%status, "Failed to fetch team members, treating the team as empty");
                Ok(Vec::new())
            }
            Err(err) => Err(err.flatten_with(GitHubError::Unbounded)),
        }
    }

    async fn members_page(&self, url: Url) -> Result<Page<TeamMember, Url>, GitHubError> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("token {}", self.token.expose_secret()))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(GitHubError::UnexpectedStatus(response.status()));
        }

        let next = next_link(response.headers());
        let items = response.json().await?;
        Ok(Page { items, next })
    }
}

/// Target of the `rel="next"` entry of a `Link` header, if there is one.
fn next_link(headers: &HeaderMap) -> Option<Url> {
    let header = headers.get(LINK)?.to_str().ok()?;
    header.split(',').find_map(|link| {
        let (target, params) = link.split_once(';')?;
        if !params.split(';').any(|param| param.trim() == r#"rel="next""#) {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Url::parse(target).ok()
    })
}
