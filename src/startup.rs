use std::net::TcpListener;

use actix_web::{dev::Server, web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::checks::MembershipChecker;
use crate::config::{ApplicationSettings, Settings};
use crate::routes::{
    check_github, check_groups, check_jira, check_membership, health_check, home, not_found,
};

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let checker = MembershipChecker::from_settings(&config)?;

        let listener = TcpListener::bind(config.application.address())?;
        let port = listener.local_addr()?.port();

        let server = run(listener, checker, config.application)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    checker: MembershipChecker,
    application: ApplicationSettings,
) -> std::io::Result<Server> {
    let checker = web::Data::new(checker);
    let application = web::Data::new(application);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(checker.clone())
            .app_data(application.clone())
            .route("/", web::get().to(home))
            .route("/", web::post().to(check_membership))
            .route("/groups", web::post().to(check_groups))
            .route("/github", web::post().to(check_github))
            .route("/jira", web::post().to(check_jira))
            .route("/health_check", web::get().to(health_check))
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
