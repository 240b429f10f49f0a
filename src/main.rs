mod api;
mod app;
mod archive;
mod commands;
mod config;
mod logging;
mod recording;
mod session;
mod setup;
mod ui;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
