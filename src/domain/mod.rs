mod github_login;
mod member_email;
mod member_profile;

pub use github_login::{GitHubLogin, GitHubLoginParseError};
pub use member_email::{EmailParseError, MemberEmail};
pub use member_profile::{ColumnValue, MemberProfile};
