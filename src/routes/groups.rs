use actix_web::http::StatusCode;
use actix_web::web::{Data, Form};
use actix_web::HttpResponse;

use super::{check_failure_page, invalid_input_page, render_page, EmailForm};
use crate::checks::MembershipChecker;
use crate::config::ApplicationSettings;
use crate::domain::MemberEmail;
use crate::status::{self, PageStatus};

#[tracing::instrument(
    name = "Checking membership of every subscribed group",
    skip(form, checker, app),
    fields(member_email = tracing::field::Empty)
)]
pub(crate) async fn check_groups(
    form: Form<EmailForm>,
    checker: Data<MembershipChecker>,
    app: Data<ApplicationSettings>,
) -> HttpResponse {
    let email = match MemberEmail::parse(form.0.email.unwrap_or_default()) {
        Ok(email) => email,
        Err(_) => return invalid_input_page(&status::invalid_email_message()),
    };
    tracing::Span::current().record("member_email", &tracing::field::display(&email));

    match checker.group_breakdown(&email).await {
        Ok(memberships) => {
            let page_status = if memberships.iter().any(|membership| membership.is_member) {
                PageStatus::Success
            } else {
                PageStatus::Failure
            };
            let message = status::groups_message(&email, &memberships, &app);
            render_page(StatusCode::OK, page_status, &message)
        }
        Err(err) => check_failure_page(err, &app),
    }
}
