use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::clients::{DirectoryClient, GitHubClient, GroupsIoClient, JiraClient};
use crate::retry::RetryPolicy;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub groups_io: GroupsIoSettings,
    pub github: GitHubSettings,
    pub jira: JiraSettings,
    pub directory: DirectorySettings,
    pub pagination: PaginationSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Organization name shown in rendered reports.
    pub organization: String,
    pub support_email: String,
    /// Where members go to fix their groups profile.
    pub profile_url: String,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct GroupsIoSettings {
    pub base_url: String,
    pub username: String,
    pub password: Secret<String>,
    /// Group searched directly by the full membership check.
    pub search_group: String,
    pub columns: ProfileColumns,
    pub skip: GroupSkipRules,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl GroupsIoSettings {
    pub fn client(&self, pagination: &PaginationSettings) -> GroupsIoClient {
        GroupsIoClient::new(
            self.base_url.clone(),
            self.username.clone(),
            self.password.clone(),
            Duration::from_millis(self.timeout_milliseconds),
            pagination.max_pages,
        )
    }
}

/// Column ids of the member profile fields the report looks at.
#[derive(serde::Deserialize, Clone, Copy, Debug)]
pub struct ProfileColumns {
    pub github_login: u32,
    pub lfx_email: u32,
    pub drive_email: u32,
    pub member_checkbox: u32,
    pub chair_vice_chair: u32,
}

impl ProfileColumns {
    pub fn ids(&self) -> [u32; 5] {
        [
            self.github_login,
            self.lfx_email,
            self.drive_email,
            self.member_checkbox,
            self.chair_vice_chair,
        ]
    }
}

/// Groups excluded when enumerating every subscribed group.
#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct GroupSkipRules {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub name_substrings: Vec<String>,
}

impl GroupSkipRules {
    pub fn skips(&self, group_name: &str) -> bool {
        let by_name = self.names.iter().any(|name| name == group_name);
        let by_part = self.name_substrings.iter().any(|s| group_name.contains(s));
        by_name || by_part
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct GitHubSettings {
    pub base_url: String,
    pub token: Secret<String>,
    pub org: String,
    pub team_slug: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl GitHubSettings {
    pub fn client(&self, pagination: &PaginationSettings) -> Result<GitHubClient, reqwest::Error> {
        GitHubClient::new(
            self.base_url.clone(),
            self.token.clone(),
            self.org.clone(),
            self.team_slug.clone(),
            Duration::from_millis(self.timeout_milliseconds),
            pagination.max_pages,
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct JiraSettings {
    pub base_url: String,
    pub token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl JiraSettings {
    pub fn client(&self) -> Result<JiraClient, reqwest::Error> {
        JiraClient::new(
            self.base_url.clone(),
            self.token.clone(),
            Duration::from_millis(self.timeout_milliseconds),
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DirectorySettings {
    pub base_url: String,
    pub service_account_file: PathBuf,
    /// Admin account impersonated through domain-wide delegation.
    pub admin_subject: String,
    pub groups: Vec<DirectoryGroup>,
    pub retry: RetrySettings,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl DirectorySettings {
    pub fn client(
        &self,
        pagination: &PaginationSettings,
    ) -> Result<DirectoryClient, reqwest::Error> {
        DirectoryClient::new(
            self.base_url.clone(),
            self.service_account_file.clone(),
            self.admin_subject.clone(),
            self.retry.policy(),
            Duration::from_millis(self.timeout_milliseconds),
            pagination.max_pages,
        )
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DirectoryGroup {
    /// Group email address used as the directory group key.
    pub key: String,
    pub label: String,
}

#[derive(serde::Deserialize, Clone, Copy)]
pub struct RetrySettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub attempts: u32,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub initial_backoff_milliseconds: u64,
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_milliseconds),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug)]
pub struct PaginationSettings {
    /// Upper bound on pages fetched per listing. Must be at least 1.
    #[serde(deserialize_with = "deserialize_page_bound")]
    pub max_pages: usize,
}

fn deserialize_page_bound<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let max_pages: usize = deserialize_number_from_string(deserializer)?;
    if max_pages == 0 {
        return Err(serde::de::Error::custom("max_pages must be at least 1"));
    }
    Ok(max_pages)
}

/// Reads `config.yaml`, then lets `APP_*` environment variables override it,
/// e.g. `APP_GROUPS_IO__PASSWORD`.
pub fn settings() -> Result<Settings, ConfigError> {
    let mut settings = Config::default();
    settings.merge(File::with_name("config"))?;
    settings.merge(Environment::with_prefix("app").separator("__"))?;
    settings.try_into()
}
