use actix_web::http::StatusCode;
use actix_web::web::{Data, Form};
use actix_web::HttpResponse;

use super::{invalid_input_page, render_page, EmailForm};
use crate::checks::MembershipChecker;
use crate::config::ApplicationSettings;
use crate::domain::MemberEmail;
use crate::status::{self, CheckOutcome, PageStatus};

#[tracing::instrument(name = "Checking Jira only", skip(form, checker, app))]
pub(crate) async fn check_jira(
    form: Form<EmailForm>,
    checker: Data<MembershipChecker>,
    app: Data<ApplicationSettings>,
) -> HttpResponse {
    let email = match MemberEmail::parse(form.0.email.unwrap_or_default()) {
        Ok(email) => email,
        Err(_) => return invalid_input_page(&status::invalid_email_message()),
    };

    let outcome = checker.jira(&email).await;
    let (code, page_status) = match outcome {
        CheckOutcome::Found => (StatusCode::OK, PageStatus::Success),
        CheckOutcome::NotFound => (StatusCode::OK, PageStatus::Failure),
        CheckOutcome::UpstreamError(_) => (StatusCode::INTERNAL_SERVER_ERROR, PageStatus::Failure),
    };
    let message = status::jira_message(&email, &outcome, &app);
    render_page(code, page_status, &message)
}
