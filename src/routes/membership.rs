use actix_web::http::StatusCode;
use actix_web::web::{Data, Form};
use actix_web::HttpResponse;

use super::{check_failure_page, invalid_input_page, render_page, EmailForm};
use crate::checks::{MembershipChecker, MembershipReport};
use crate::config::ApplicationSettings;
use crate::domain::MemberEmail;
use crate::status::{self, PageStatus};

#[tracing::instrument(
    name = "Checking membership across every tool",
    skip(form, checker, app),
    fields(member_email = tracing::field::Empty)
)]
pub(crate) async fn check_membership(
    form: Form<EmailForm>,
    checker: Data<MembershipChecker>,
    app: Data<ApplicationSettings>,
) -> HttpResponse {
    let email = match MemberEmail::parse(form.0.email.unwrap_or_default()) {
        Ok(email) => email,
        Err(err) => {
            tracing::info!(error.message = %err, "Rejected the submitted email");
            return invalid_input_page(&status::invalid_email_message());
        }
    };
    tracing::Span::current().record("member_email", &tracing::field::display(&email));

    match checker.full_report(&email).await {
        Ok(MembershipReport::Found(record)) => render_page(
            StatusCode::OK,
            PageStatus::Success,
            &status::report_message(&email, &record, &app),
        ),
        Ok(MembershipReport::NotFound) => render_page(
            StatusCode::OK,
            PageStatus::Failure,
            &status::not_found_message(&email, &app),
        ),
        Err(err) => check_failure_page(err, &app),
    }
}
