use anyhow::Context;

use crate::clients::{
    DirectoryClient, GitHubClient, GroupMembership, GroupsIoClient, GroupsIoError, JiraClient,
};
use crate::config::{DirectoryGroup, GroupSkipRules, ProfileColumns, Settings};
use crate::domain::{GitHubLogin, MemberEmail, MemberProfile};
use crate::status::{CheckOutcome, StatusRecord};
use crate::utils::error_chain_fmt;

/// Every upstream client plus the rules that drive a lookup. Built once at
/// startup and shared by all requests; holds no per-request state.
pub struct MembershipChecker {
    groups_io: GroupsIoClient,
    github: GitHubClient,
    jira: JiraClient,
    directory: DirectoryClient,
    search_group: String,
    columns: ProfileColumns,
    skip: GroupSkipRules,
    directory_groups: Vec<DirectoryGroup>,
}

/// Outcome of the full check for one email.
#[derive(Debug)]
pub enum MembershipReport {
    /// Not a member of the searched group; no other system was asked.
    NotFound,
    Found(StatusRecord),
}

#[derive(thiserror::Error)]
pub enum CheckError {
    #[error("Could not sign in to Groups.io")]
    Authentication(#[source] GroupsIoError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl MembershipChecker {
    pub fn from_settings(settings: &Settings) -> Result<Self, anyhow::Error> {
        Ok(Self {
            groups_io: settings.groups_io.client(&settings.pagination),
            github: settings
                .github
                .client(&settings.pagination)
                .context("Failed to build the GitHub client")?,
            jira: settings
                .jira
                .client()
                .context("Failed to build the Jira client")?,
            directory: settings
                .directory
                .client(&settings.pagination)
                .context("Failed to build the directory client")?,
            search_group: settings.groups_io.search_group.clone(),
            columns: settings.groups_io.columns,
            skip: settings.groups_io.skip.clone(),
            directory_groups: settings.directory.groups.clone(),
        })
    }

    /// Look the member up in the searched group and, when found, check every
    /// tool the profile points at.
    #[tracing::instrument(name = "Running the full membership check", skip(self))]
    pub async fn full_report(&self, email: &MemberEmail) -> Result<MembershipReport, CheckError> {
        let session = self
            .groups_io
            .login()
            .await
            .map_err(CheckError::Authentication)?;
        let profile = session
            .find_member(&self.search_group, email, &self.columns.ids())
            .await
            .context("Failed to search Groups.io members")?;

        match profile {
            None => Ok(MembershipReport::NotFound),
            Some(profile) => {
                let status = self.aggregate(email, &profile).await;
                Ok(MembershipReport::Found(status))
            }
        }
    }

    /// Per-group membership across every subscribed group.
    #[tracing::instrument(name = "Checking all subscribed groups", skip(self))]
    pub async fn group_breakdown(
        &self,
        email: &MemberEmail,
    ) -> Result<Vec<GroupMembership>, CheckError> {
        let session = self
            .groups_io
            .login()
            .await
            .map_err(CheckError::Authentication)?;
        let memberships = session
            .groups_with_member(email, &self.skip)
            .await
            .context("Failed to check subscribed Groups.io groups")?;
        Ok(memberships)
    }

    pub async fn github_team(&self, login: &GitHubLogin) -> CheckOutcome {
        match self.github.is_team_member(login).await {
            Ok(found) => CheckOutcome::from_found(found),
            Err(err) => upstream_error("GitHub", &err),
        }
    }

    pub async fn jira(&self, email: &MemberEmail) -> CheckOutcome {
        match self.jira.has_user(email).await {
            Ok(found) => CheckOutcome::from_found(found),
            Err(err) => upstream_error("Jira", &err),
        }
    }

    async fn aggregate(&self, email: &MemberEmail, profile: &MemberProfile) -> StatusRecord {
        let labels = self
            .directory_groups
            .iter()
            .map(|group| group.label.as_str());
        let mut status = StatusRecord::new(labels);

        if let Some(login) = profile.text(self.columns.github_login) {
            status.github_id = CheckOutcome::Found;
            status.github_team = match GitHubLogin::parse(login.to_string()) {
                Ok(login) => self.github_team(&login).await,
                Err(_) => {
                    tracing::warn!(
                        login,
                        "Profile GitHub login is malformed, skipping team check"
                    );
                    CheckOutcome::NotFound
                }
            };
        }

        if profile.text(self.columns.lfx_email).is_some() {
            status.lfx_email = CheckOutcome::Found;
        }

        if profile.text(self.columns.drive_email).is_some() {
            status.drive_email = CheckOutcome::Found;
            self.check_directory_groups(email, &mut status).await;
        }

        if let Some(checked) = profile.checked(self.columns.member_checkbox) {
            status.member_checkbox = CheckOutcome::from_found(checked);
        }
        if let Some(checked) = profile.checked(self.columns.chair_vice_chair) {
            status.chair_vice_chair = CheckOutcome::from_found(checked);
        }

        status.jira = self.jira(email).await;
        status
    }

    async fn check_directory_groups(&self, email: &MemberEmail, status: &mut StatusRecord) {
        let session = match self.directory.authorize().await {
            Ok(session) => session,
            Err(err) => {
                let outcome = upstream_error("Directory", &err);
                for access in &mut status.drive_groups {
                    access.outcome = outcome.clone();
                }
                return;
            }
        };

        let groups = self.directory_groups.iter().zip(&mut status.drive_groups);
        for (group, access) in groups {
            let found = session.is_member(email, &group.key).await;
            access.outcome = CheckOutcome::from_found(found);
        }
    }
}

fn upstream_error(upstream: &str, err: &(dyn std::error::Error + 'static)) -> CheckOutcome {
    tracing::error!(
        upstream,
        error.cause_chain = ?err,
        error.message = %err,
        "Upstream check failed"
    );
    CheckOutcome::UpstreamError(err.to_string())
}
