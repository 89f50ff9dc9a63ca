//! Google Workspace Admin Directory access through a service account with
//! domain-wide delegation.
//!
//! A session starts by signing a JWT assertion with the service account key
//! and exchanging it for an access token that impersonates the configured
//! admin subject. Group member listings then use that token.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::domain::MemberEmail;
use crate::pagination::{fetch_all, Page, PaginationError};
use crate::retry::{retry, RetryPolicy};

const DIRECTORY_SCOPE: &str = "https://www.googleapis.com/auth/admin.directory.group.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECONDS: i64 = 3600;

pub struct DirectoryClient {
    http: Client,
    base_url: String,
    service_account_file: PathBuf,
    admin_subject: String,
    retry: RetryPolicy,
    max_pages: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Failed to read the service account key file")]
    KeyFile(#[source] std::io::Error),
    #[error("The service account key file is malformed")]
    KeyFormat(#[from] serde_json::Error),
    #[error("Failed to sign the service account assertion")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Failed to call the directory API")]
    Request(#[from] reqwest::Error),
    #[error("Directory member listing did not end after {0} pages")]
    Unbounded(usize),
}

impl From<PaginationError<DirectoryError>> for DirectoryError {
    fn from(err: PaginationError<DirectoryError>) -> Self {
        err.flatten_with(DirectoryError::Unbounded)
    }
}

#[derive(serde::Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: Secret<String>,
    token_uri: String,
}

#[derive(serde::Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Secret<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersResponse {
    #[serde(default)]
    members: Vec<DirectoryMember>,
    next_page_token: Option<String>,
}

#[derive(serde::Deserialize)]
struct DirectoryMember {
    // Absent for members that are whole customers rather than accounts.
    email: Option<String>,
}

impl DirectoryClient {
    pub fn new(
        base_url: String,
        service_account_file: PathBuf,
        admin_subject: String,
        retry: RetryPolicy,
        timeout: Duration,
        max_pages: usize,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            service_account_file,
            admin_subject,
            retry,
            max_pages,
        })
    }

    #[tracing::instrument(name = "Authorizing the directory service account", skip(self))]
    pub async fn authorize(&self) -> Result<DirectorySession<'_>, DirectoryError> {
        let raw = tokio::fs::read_to_string(&self.service_account_file)
            .await
            .map_err(DirectoryError::KeyFile)?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)?;

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            sub: &self.admin_subject,
            scope: DIRECTORY_SCOPE,
            aud: &key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECONDS,
        };
        let pem = key.private_key.expose_secret().as_bytes();
        let signing_key = EncodingKey::from_rsa_pem(pem)?;
        let header = Header::new(Algorithm::RS256);
        let assertion = encode(&header, &claims, &signing_key)?;

        let token: TokenResponse = self
            .http
            .post(key.token_uri.as_str())
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(DirectorySession {
            client: self,
            access_token: token.access_token,
        })
    }
}

pub struct DirectorySession<'a> {
    client: &'a DirectoryClient,
    access_token: Secret<String>,
}

impl DirectorySession<'_> {
    /// Whether `email` is a member of `group`, compared case-insensitively.
    /// Listing failures are retried per the client's policy; once attempts
    /// run out the answer is `false`.
    #[tracing::instrument(name = "Checking directory group membership", skip(self))]
    pub async fn is_member(&self, email: &MemberEmail, group: &str) -> bool {
        let wanted = email.as_ref().to_lowercase();
        let policy = &self.client.retry;
        match retry(policy, move || self.member_emails(group)).await {
            Ok(members) => members.iter().any(|member| member.to_lowercase() == wanted),
            Err(err) => {
                tracing::error!(
                    error.cause_chain = ?err,
                    error.message = %err,
                    "Giving up on directory group membership"
                );
                false
            }
        }
    }

    /// Addresses of every member of `group`.
    pub async fn member_emails(&self, group: &str) -> Result<Vec<String>, DirectoryError> {
        let members = fetch_all(String::new(), self.client.max_pages, move |token| {
            self.members_page(group, token)
        })
        .await?;
        Ok(members.into_iter().filter_map(|member| member.email).collect())
    }

    async fn members_page(
        &self,
        group: &str,
        page_token: String,
    ) -> Result<Page<DirectoryMember, String>, DirectoryError> {
        let base_url = &self.client.base_url;
        let url = format!("{}/admin/directory/v1/groups/{}/members", base_url, group);
        let mut request = self
            .client
            .http
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .query(&[("maxResults", "200")]);
        if !page_token.is_empty() {
            request = request.query(&[("pageToken", page_token.as_str())]);
        }

        let response: MembersResponse = request.send().await?.error_for_status()?.json().await?;
        Ok(Page {
            items: response.members,
            next: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}
