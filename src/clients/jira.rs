use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::domain::MemberEmail;

pub struct JiraClient {
    http: Client,
    base_url: String,
    token: Secret<String>,
}

/// Any failure talking to Jira: transport, authentication or a non-success
/// status all land here.
#[derive(Debug, thiserror::Error)]
#[error("Failed to search Jira users")]
pub struct JiraError(#[from] reqwest::Error);

#[derive(serde::Deserialize)]
struct JiraUser {
    #[serde(rename = "emailAddress", default)]
    email_address: Option<String>,
}

impl JiraClient {
    pub fn new(
        base_url: String,
        token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    #[tracing::instrument(name = "Searching Jira users", skip(self))]
    pub async fn has_user(&self, email: &MemberEmail) -> Result<bool, JiraError> {
        let users: Vec<JiraUser> = self
            .http
            .get(format!("{}/rest/api/2/user/search", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .query(&[("username", email.as_ref())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let found = users
            .iter()
            .any(|user| user.email_address.as_deref() == Some(email.as_ref()));
        Ok(found)
    }
}
