use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// An email address that passed the syntactic check; the only way a lookup
/// can reach an upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEmail(String);

impl MemberEmail {
    pub fn parse(email: String) -> Result<Self, EmailParseError> {
        if EMAIL_PATTERN.is_match(&email) {
            Ok(Self(email))
        } else {
            Err(EmailParseError(email))
        }
    }
}

impl AsRef<str> for MemberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0:?} is not a valid email address")]
pub struct EmailParseError(String);
