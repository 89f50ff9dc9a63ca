//! Consolidated membership status and the messages rendered from it.

use std::fmt::{self, Write};

use crate::clients::GroupMembership;
use crate::config::ApplicationSettings;
use crate::domain::{GitHubLogin, MemberEmail};

/// Result of one membership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Found,
    NotFound,
    UpstreamError(String),
}

impl CheckOutcome {
    pub fn from_found(found: bool) -> Self {
        if found {
            Self::Found
        } else {
            Self::NotFound
        }
    }
}

impl Default for CheckOutcome {
    fn default() -> Self {
        Self::NotFound
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found => f.write_str("✅"),
            Self::NotFound => f.write_str("❌"),
            Self::UpstreamError(_) => f.write_str("Error"),
        }
    }
}

/// Access to one directory group, under its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAccess {
    pub label: String,
    pub outcome: CheckOutcome,
}

/// Everything the full report shows for a member found on the groups
/// service. Every flag starts out as `NotFound`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    pub github_id: CheckOutcome,
    pub github_team: CheckOutcome,
    pub lfx_email: CheckOutcome,
    pub drive_email: CheckOutcome,
    pub drive_groups: Vec<DirectoryAccess>,
    pub member_checkbox: CheckOutcome,
    pub chair_vice_chair: CheckOutcome,
    pub jira: CheckOutcome,
}

impl StatusRecord {
    /// A record with one `NotFound` entry per directory group label.
    pub fn new<'a>(drive_labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            drive_groups: drive_labels
                .into_iter()
                .map(|label| DirectoryAccess {
                    label: label.to_string(),
                    outcome: CheckOutcome::NotFound,
                })
                .collect(),
            ..Self::default()
        }
    }
}

/// How a rendered page is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Success,
    Failure,
    Warning,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Warning => "warning",
        }
    }
}

pub fn invalid_email_message() -> String {
    r#"<span class="heading">Enter a valid email address to proceed!</span>"#.to_string()
}

pub fn invalid_login_message() -> String {
    r#"<span class="heading">Enter a valid GitHub login to proceed!</span>"#.to_string()
}

pub fn not_found_message(email: &MemberEmail, app: &ApplicationSettings) -> String {
    format!(
        "<span class=\"heading\">{email} \n\nNOT found in {org} Groups.io!\n\n</span>\
         Please, reach out to <a href='mailto:{support}'>{support}</a>!",
        email = email,
        org = app.organization,
        support = app.support_email
    )
}

pub fn error_message(err: &dyn fmt::Display, app: &ApplicationSettings) -> String {
    format!(
        "An error occurred: {err}\n\n\
         If you need assistance, please contact <a href='mailto:{support}'>{support}</a>!",
        err = err,
        support = app.support_email
    )
}

pub fn report_message(
    email: &MemberEmail,
    status: &StatusRecord,
    app: &ApplicationSettings,
) -> String {
    let org = &app.organization;
    // Writing to a String cannot fail.
    let mut tools = String::new();
    let _ = writeln!(tools, "{} GitHub Team Access {}", org, status.github_team);
    for access in &status.drive_groups {
        let _ = writeln!(tools, "{} Access {}", access.label, access.outcome);
    }
    let _ = writeln!(tools, "Jira Access {}", status.jira);

    format!(
        "<span class=\"heading\">{email}</span> \n\n\
         {org} Groups.io Account ✅\n\n\
         <span class=\"heading\">Accounts Credentials</span> \n\n\
         GitHub ID is set in Groups.io {github_id}\n\
         LFX Email is set in Groups.io {lfx_email}\n\
         Google Drive Email is set in Groups.io {drive_email}\n\
         Member checkbox is ticked in Groups.io {member_checkbox}\n\
         Chair / Vice-Chair is ticked in Groups.io {chair}\n\n\
         <span class=\"heading\">Tools Access</span> \n\n\
         {tools}\n\
         If you got ❌ for GitHub ID, LFX Email \n or Google Drive Email, \
         <a href=\"{profile_url}\">update your Groups.io profile</a> \n\n\
         If you got ❌ for any Tool Access, reach out to <span class=\"contact\">{support}</span>",
        email = email,
        org = app.organization,
        github_id = status.github_id,
        lfx_email = status.lfx_email,
        drive_email = status.drive_email,
        member_checkbox = status.member_checkbox,
        chair = status.chair_vice_chair,
        tools = tools,
        profile_url = app.profile_url,
        support = app.support_email
    )
}

/// Group names come from the groups service unchecked, so they are escaped.
pub fn groups_message(
    email: &MemberEmail,
    memberships: &[GroupMembership],
    app: &ApplicationSettings,
) -> String {
    let org = &app.organization;
    let mut message = format!("<span class=\"heading\">{}</span> \n\n", email);
    if memberships.is_empty() {
        let _ = writeln!(message, "No {} Groups.io groups to check.", org);
    }
    for membership in memberships {
        let name = html_escape(&membership.group_name);
        let outcome = CheckOutcome::from_found(membership.is_member);
        let _ = writeln!(message, "{} {}", name, outcome);
    }
    let _ = write!(
        message,
        "\nIf a group you expect is marked ❌, reach out to <span class=\"contact\">{}</span>",
        app.support_email
    );
    message
}

pub fn github_message(
    login: &GitHubLogin,
    outcome: &CheckOutcome,
    app: &ApplicationSettings,
) -> String {
    let org = &app.organization;
    match outcome {
        CheckOutcome::Found => format!("{} is a member of the {} GitHub team ✅", login, org),
        CheckOutcome::NotFound => {
            format!("{} is NOT a member of the {} GitHub team ❌", login, org)
        }
        CheckOutcome::UpstreamError(_) => error_message(&"GitHub could not be reached", app),
    }
}

pub fn jira_message(
    email: &MemberEmail,
    outcome: &CheckOutcome,
    app: &ApplicationSettings,
) -> String {
    let org = &app.organization;
    match outcome {
        CheckOutcome::Found => format!("{} has a {} Jira account ✅", email, org),
        CheckOutcome::NotFound => format!("{} does NOT have a {} Jira account ❌", email, org),
        CheckOutcome::UpstreamError(_) => error_message(&"Jira could not be reached", app),
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
