use actix_web::http::StatusCode;
use actix_web::web::{Data, Form};
use actix_web::HttpResponse;

use super::{invalid_input_page, render_page};
use crate::checks::MembershipChecker;
use crate::config::ApplicationSettings;
use crate::domain::GitHubLogin;
use crate::status::{self, CheckOutcome, PageStatus};

#[derive(Debug, serde::Deserialize)]
pub(crate) struct GitHubForm {
    #[serde(default)]
    github_login: Option<String>,
}

#[tracing::instrument(
    name = "Checking GitHub team membership only",
    skip(form, checker, app)
)]
pub(crate) async fn check_github(
    form: Form<GitHubForm>,
    checker: Data<MembershipChecker>,
    app: Data<ApplicationSettings>,
) -> HttpResponse {
    let login = match GitHubLogin::parse(form.0.github_login.unwrap_or_default()) {
        Ok(login) => login,
        Err(_) => return invalid_input_page(&status::invalid_login_message()),
    };

    let outcome = checker.github_team(&login).await;
    let (code, page_status) = match outcome {
        CheckOutcome::Found => (StatusCode::OK, PageStatus::Success),
        CheckOutcome::NotFound => (StatusCode::OK, PageStatus::Failure),
        CheckOutcome::UpstreamError(_) => (StatusCode::INTERNAL_SERVER_ERROR, PageStatus::Failure),
    };
    let message = status::github_message(&login, &outcome, &app);
    render_page(code, page_status, &message)
}
