#![forbid(unsafe_code)]

pub mod checks;
pub mod clients;
pub mod config;
pub mod domain;
pub mod pagination;
pub mod retry;
mod routes;
pub mod startup;
pub mod status;
pub mod telemetry;
mod utils;
