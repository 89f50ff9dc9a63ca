use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use super::render_page;
use crate::status::PageStatus;

pub(crate) async fn home() -> HttpResponse {
    render_page(StatusCode::OK, PageStatus::Success, "")
}

pub(crate) async fn not_found() -> HttpResponse {
    render_page(StatusCode::NOT_FOUND, PageStatus::Failure, "Page not found")
}
