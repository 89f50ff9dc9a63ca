use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use crate::checks::CheckError;
use crate::config::ApplicationSettings;
use crate::status::{self, PageStatus};

mod github;
mod groups;
mod health_check;
mod home;
mod jira;
mod membership;

pub(crate) use github::check_github;
pub(crate) use groups::check_groups;
pub(crate) use health_check::health_check;
pub(crate) use home::{home, not_found};
pub(crate) use jira::check_jira;
pub(crate) use membership::check_membership;

/// Form fields carrying an email; the field may be missing altogether.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct EmailForm {
    #[serde(default)]
    email: Option<String>,
}

fn render_page(code: StatusCode, status: PageStatus, message: &str) -> HttpResponse {
    let html = format!(
        include_str!("index.html"),
        status = status.as_str(),
        message = message
    );
    HttpResponse::build(code)
        .content_type(ContentType::html())
        .body(html)
}

fn invalid_input_page(message: &str) -> HttpResponse {
    render_page(StatusCode::BAD_REQUEST, PageStatus::Warning, message)
}

// The one place check failures are turned into a page.
fn check_failure_page(err: CheckError, app: &ApplicationSettings) -> HttpResponse {
    tracing::error!(error.cause_chain = ?err, error.message = %err, "Membership check failed");
    render_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        PageStatus::Failure,
        &status::error_message(&err, app),
    )
}
