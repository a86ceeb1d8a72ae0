// src/main.rs
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use anyhow::Context;
use log::{info, warn};
use std::sync::Arc;

mod config;
mod errors;
mod handlers;
mod models;
mod operations;
mod services;

use crate::config::Config;
use crate::errors::ImgDropError;
use crate::handlers::{download, list_operations, process_form, run_operation};
use crate::operations::OperationRegistry;
use crate::services::{CaptionRenderer, ImageProcessor, OutputStore};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    output_store: Arc<OutputStore>,
    operations: Arc<OperationRegistry>,
}

impl AppState {
    pub fn new(config: Config, captions: CaptionRenderer) -> Result<Self, ImgDropError> {
        let output_store = Arc::new(OutputStore::new(&config.output_dir, config.output_ttl)?);
        let image_processor = Arc::new(ImageProcessor::new(config.max_dimension));
        let operations = Arc::new(OperationRegistry::new(image_processor, Arc::new(captions)));

        Ok(Self {
            config: Arc::new(config),
            output_store,
            operations,
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/operations", web::get().to(list_operations))
            .route("/operations/{name}", web::post().to(run_operation))
            .route("/process", web::post().to(process_form)),
    )
    .route("/", web::get().to(index))
    .route("/download/{id}", web::get().to(download))
    .route("/health", web::get().to(health_check));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting imgdrop service...");

    let config = Config::from_env().context("failed to read configuration")?;
    let captions = CaptionRenderer::load(config.font_path.as_deref())
        .context("failed to load caption font")?;
    if let Some(path) = captions.font_source() {
        info!("Caption font loaded from {}", path.display());
    }
    let bind_addr = config.bind_addr.clone();
    let sweep_interval = config.sweep_interval;

    let app_state = AppState::new(config, captions).context("failed to prepare output directory")?;
    info!(
        "Writing outputs to {}",
        app_state.output_store.dir().display()
    );

    let store = app_state.output_store.clone();
    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = handlers::sweep_expired(store.clone()).await {
                warn!("Expiry sweep failed: {}", e);
            }
        }
    });

    info!("Starting HTTP server on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(include_str!("../static/index.html"))
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "imgdrop",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
