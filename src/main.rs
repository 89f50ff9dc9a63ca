use anyhow::Context;
use libmembercheck::startup::Application;
use libmembercheck::{config, telemetry};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber =
        telemetry::get_subscriber("membercheck".into(), "info".into(), std::io::stdout);
    telemetry::init_subscriber(subscriber);

    let config = config::settings().context("Failed to read configuration")?;
    let application = Application::build(config)?;
    application.run_until_stopped().await?;

    Ok(())
}
