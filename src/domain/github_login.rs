use once_cell::sync::Lazy;
use regex::Regex;

// Alphanumerics with single hyphens between them.
static LOGIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9]|-[A-Za-z0-9]){0,38}$")
        .expect("login pattern is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubLogin(String);

impl GitHubLogin {
    pub fn parse(login: String) -> Result<Self, GitHubLoginParseError> {
        let login = login.trim();
        if LOGIN_PATTERN.is_match(login) {
            Ok(Self(login.to_string()))
        } else {
            Err(GitHubLoginParseError)
        }
    }
}

impl AsRef<str> for GitHubLogin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GitHubLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to parse provided String as a GitHub login")]
pub struct GitHubLoginParseError;
