use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

use crate::config::GroupSkipRules;
use crate::domain::{ColumnValue, MemberEmail, MemberProfile};
use crate::pagination::{fetch_all, Page, PaginationError};

/// Groups.io API access. Holds no session: every lookup starts with
/// [`GroupsIoClient::login`], which hands back a fresh cookie jar.
pub struct GroupsIoClient {
    base_url: String,
    username: String,
    password: Secret<String>,
    timeout: Duration,
    max_pages: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum GroupsIoError {
    #[error("Groups.io did not accept the configured credentials")]
    Authentication,
    #[error("Failed to call the Groups.io API")]
    Request(#[from] reqwest::Error),
    #[error("Groups.io listing did not end after {0} pages")]
    Unbounded(usize),
}

impl From<PaginationError<GroupsIoError>> for GroupsIoError {
    fn from(err: PaginationError<GroupsIoError>) -> Self {
        err.flatten_with(GroupsIoError::Unbounded)
    }
}

#[derive(serde::Deserialize)]
struct LoginResponse {
    user: Option<LoginUser>,
}

#[derive(serde::Deserialize)]
struct LoginUser {
    csrf_token: String,
}

#[derive(serde::Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct Listing<T> {
    #[serde(default)]
    data: Option<Vec<T>>,
    #[serde(default)]
    next_page_token: u64,
}

impl<T> Listing<T> {
    // A zero token marks the last page.
    fn into_page(self) -> Page<T, u64> {
        let token = self.next_page_token;
        Page {
            items: self.data.unwrap_or_default(),
            next: (token != 0).then(|| token),
        }
    }
}

#[derive(serde::Deserialize)]
struct Member {
    email: String,
    #[serde(default)]
    extra_member_data: Vec<ExtraMemberData>,
}

#[derive(serde::Deserialize)]
struct ExtraMemberData {
    col_id: u32,
    col_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    checked: Option<bool>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Subscription {
    pub group_name: String,
}

/// Result of looking a member up in one subscribed group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_name: String,
    pub is_member: bool,
}

impl GroupsIoClient {
    pub fn new(
        base_url: String,
        username: String,
        password: Secret<String>,
        timeout: Duration,
        max_pages: usize,
    ) -> Self {
        Self {
            base_url,
            username,
            password,
            timeout,
            max_pages,
        }
    }

    #[tracing::instrument(name = "Signing in to Groups.io", skip(self))]
    pub async fn login(&self) -> Result<GroupsIoSession<'_>, GroupsIoError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(self.timeout)
            .build()?;

        let response: LoginResponse = http
            .post(format!("{}/login", self.base_url))
            .form(&[
                ("email", self.username.as_str()),
                ("password", self.password.expose_secret().as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        let user = response.user.ok_or(GroupsIoError::Authentication)?;

        Ok(GroupsIoSession {
            http,
            base_url: &self.base_url,
            csrf_token: Secret::new(user.csrf_token),
            max_pages: self.max_pages,
        })
    }
}

/// An authenticated Groups.io session: the login cookies plus its CSRF token.
pub struct GroupsIoSession<'a> {
    http: Client,
    base_url: &'a str,
    csrf_token: Secret<String>,
    max_pages: usize,
}

impl GroupsIoSession<'_> {
    /// Look `email` up in `group` and pull the requested profile columns.
    /// `None` means no member of the group has exactly that address.
    #[tracing::instrument(name = "Searching a Groups.io group", skip(self, columns))]
    pub async fn find_member(
        &self,
        group: &str,
        email: &MemberEmail,
        columns: &[u32],
    ) -> Result<Option<MemberProfile>, GroupsIoError> {
        let member = self
            .search_members(group, email)
            .await?
            .into_iter()
            .find(|member| member.email == email.as_ref());

        Ok(member.map(|member| profile_of(member, columns)))
    }

    /// Check every subscribed group not excluded by `skip`. A member still
    /// awaiting approval counts as absent.
    #[tracing::instrument(name = "Checking every subscribed Groups.io group", skip(self, skip))]
    pub async fn groups_with_member(
        &self,
        email: &MemberEmail,
        skip: &GroupSkipRules,
    ) -> Result<Vec<GroupMembership>, GroupsIoError> {
        let mut memberships = Vec::new();

        for subscription in self.subscriptions().await? {
            if skip.skips(&subscription.group_name) {
                tracing::debug!(group = %subscription.group_name, "Skipping excluded group");
                continue;
            }

            let pending = self.pending_members(&subscription.group_name).await?;
            let found = self
                .search_members(&subscription.group_name, email)
                .await?
                .iter()
                .any(|member| member.email == email.as_ref());
            let is_pending = pending.iter().any(|address| address == email.as_ref());

            memberships.push(GroupMembership {
                group_name: subscription.group_name,
                is_member: found && !is_pending,
            });
        }

        Ok(memberships)
    }

    /// Email addresses of the members of `group` still awaiting approval.
    #[tracing::instrument(name = "Listing pending Groups.io members", skip(self))]
    pub async fn pending_members(&self, group: &str) -> Result<Vec<String>, GroupsIoError> {
        let members = fetch_all(0, self.max_pages, move |token| {
            self.pending_page(group, token)
        })
        .await?;
        Ok(members.into_iter().map(|member| member.email).collect())
    }

    /// Groups the signed-in account is subscribed to.
    #[tracing::instrument(name = "Listing Groups.io subscriptions", skip(self))]
    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, GroupsIoError> {
        let next_page = move |token| self.subscriptions_page(token);
        Ok(fetch_all(0, self.max_pages, next_page).await?)
    }

    async fn search_members(
        &self,
        group: &str,
        email: &MemberEmail,
    ) -> Result<Vec<Member>, GroupsIoError> {
        let listing: Listing<Member> = self
            .http
            .post(format!("{}/searchmembers", self.base_url))
            .query(&[("group_name", group), ("q", email.as_ref())])
            .form(&[("csrf", self.csrf_token.expose_secret())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(listing.data.unwrap_or_default())
    }

    async fn pending_page(
        &self,
        group: &str,
        token: u64,
    ) -> Result<Page<Member, u64>, GroupsIoError> {
        let listing: Listing<Member> = self
            .http
            .post(format!("{}/getmembers", self.base_url))
            .query(&[
                ("group_name", group.to_string()),
                ("type", "pending".to_string()),
                ("page_token", token.to_string()),
            ])
            .form(&[("csrf", self.csrf_token.expose_secret())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(listing.into_page())
    }

    async fn subscriptions_page(
        &self,
        token: u64,
    ) -> Result<Page<Subscription, u64>, GroupsIoError> {
        let listing: Listing<Subscription> = self
            .http
            .post(format!("{}/getsubs", self.base_url))
            .query(&[
                ("limit", "100".to_string()),
                ("page_token", token.to_string()),
            ])
            .form(&[("csrf", self.csrf_token.expose_secret())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(listing.into_page())
    }
}

// Keeps non-empty text columns and every checkbox among `columns`.
fn profile_of(member: Member, columns: &[u32]) -> MemberProfile {
    let mut profile = MemberProfile::default();
    for item in member.extra_member_data {
        if !columns.contains(&item.col_id) {
            continue;
        }
        match item.col_type.as_str() {
            "text" => {
                if let Some(text) = item.text.filter(|text| !text.is_empty()) {
                    profile.insert(item.col_id, ColumnValue::Text(text));
                }
            }
            "checkbox" => {
                let checked = item.checked.unwrap_or(false);
                profile.insert(item.col_id, ColumnValue::Checked(checked));
            }
            _ => {}
        }
    }
    profile
}
