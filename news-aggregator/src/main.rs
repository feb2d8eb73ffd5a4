use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use news_aggregator::{server, AppState, Args, TopicCatalog};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let catalog = match &args.topics_file {
        Some(path) => TopicCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load topics from {}", path.display()))?,
        None => TopicCatalog::builtin(),
    };
    info!("Serving topics: {}", catalog.topics().join(", "));

    let state = web::Data::new(AppState::new(Arc::new(catalog), &args).context("Failed to build application state")?);

    let address = args.address();
    info!("Server running at http://{}", address);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(server::configure))
        .bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?
        .run()
        .await?;

    Ok(())
}
