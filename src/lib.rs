pub mod config;
pub mod domain;
pub mod progress_api;
pub mod storage;
pub mod sync_client;

use std::sync::Arc;

use config::Config;
use poem::{
    Endpoint, EndpointExt, Route, Server,
    listener::TcpListener,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use progress_api::ProgressApi;
use storage::ProgressRepo;

pub type ProgressStoreResult<T> = anyhow::Result<T>;

/// Full HTTP application: the progress API plus its RapiDoc UI and OpenAPI document.
pub fn app(repo: Arc<dyn ProgressRepo>, public_url: String) -> impl Endpoint {
    let version = env!("CARGO_PKG_VERSION");
    let api = ProgressApi { repo };
    let api_service = OpenApiService::new(api, "Progress Store API", version).server(public_url);
    let ui = api_service.rapidoc();
    let spec = api_service.spec_endpoint();
    Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", spec)
        .with(Cors::new())
        .with(PoemTracing)
}

pub async fn run_poem(repo: Arc<dyn ProgressRepo>, config: Arc<Config>) -> ProgressStoreResult<()> {
    let route = app(repo, config.public_url.clone());
    let bind_addr = config.bind_addr.clone();
    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr)).run(route).await?;
    Ok(())
}
