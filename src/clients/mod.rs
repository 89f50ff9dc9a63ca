mod directory;
mod github;
mod groups_io;
mod jira;

pub use directory::{DirectoryClient, DirectoryError, DirectorySession};
pub use github::{GitHubClient, GitHubError, TeamMember};
pub use groups_io::{GroupMembership, GroupsIoClient, GroupsIoError, GroupsIoSession, Subscription};
pub use jira::{JiraClient, JiraError};
