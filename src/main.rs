use anyhow::Context;
use clap::Parser;
use session_terminator::{app::Application, config::Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_subscriber("info,tower_http=debug");

    let config = Config::parse();
    let app = Application::build(config).await?;

    app.run().await.context("Server terminated unexpectedly")
}
