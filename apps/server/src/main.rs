//! Universe API Server
//! JSON-over-HTTP API for card storage, schemas, shotlist documents,
//! thumbnails, and prompt building.

mod api;
mod models;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use universe::UniverseStore;

pub struct AppState {
    pub store: UniverseStore,
    pub comfyui_url: Option<String>,
    pub http: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("universe_server=debug,axum=info")
        .init();

    info!("Starting Universe API server...");

    let base_dir =
        std::env::var("PROMPTDECK_UNIVERSES_DIR").unwrap_or_else(|_| "universes".to_string());
    let comfyui_url = std::env::var("PROMPTDECK_COMFYUI_URL").ok();

    let store = UniverseStore::open(&base_dir)?;
    info!("Universe storage at: {}", base_dir);
    match &comfyui_url {
        Some(url) => info!("Forwarding prompts to ComfyUI at: {}", url),
        None => info!("PROMPTDECK_COMFYUI_URL not set; /prompt forwarding disabled"),
    }

    let state = Arc::new(AppState {
        store,
        comfyui_url,
        http: reqwest::Client::new(),
    });

    let app = Router::new()
        // Universe endpoints
        .route("/api/universes", get(api::list_universes))
        .route("/api/universe/create", post(api::create_universe))
        // Card endpoints
        .route(
            "/api/universe/:universe/cards/:card_type",
            get(api::list_cards).post(api::create_card),
        )
        .route(
            "/api/universe/:universe/cards/:card_type/:name",
            delete(api::delete_card),
        )
        // Schema endpoints
        .route(
            "/api/universe/:universe/schema/:card_type",
            get(api::get_schema).post(api::save_schema),
        )
        // Shotlist document endpoints
        .route(
            "/api/universe/:universe/shotlists",
            get(api::load_shotlists).post(api::save_shotlists),
        )
        // Thumbnails and prompt building
        .route(
            "/api/universe/:universe/upload-thumbnail",
            post(api::upload_thumbnail),
        )
        .route("/api/universe/:universe/frame-prompt", post(api::frame_prompt))
        .route("/api/build-prompt", post(api::build_prompt))
        .route("/prompt", post(api::forward_prompt))
        // CORS for local development
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = "127.0.0.1:8000";
    info!("Universe server listening on http://{}", addr);
    info!("API endpoints:");
    info!("  GET    /api/universes                                - List universes");
    info!("  POST   /api/universe/create                          - Create universe");
    info!("  GET    /api/universe/:u/cards/:type                  - List cards");
    info!("  POST   /api/universe/:u/cards/:type                  - Save card");
    info!("  DELETE /api/universe/:u/cards/:type/:name            - Delete card");
    info!("  GET    /api/universe/:u/schema/:type                 - Get schema");
    info!("  POST   /api/universe/:u/schema/:type                 - Save schema");
    info!("  GET    /api/universe/:u/shotlists                    - Load shotlist document");
    info!("  POST   /api/universe/:u/shotlists                    - Save shotlist document");
    info!("  POST   /api/universe/:u/upload-thumbnail             - Upload thumbnail");
    info!("  POST   /api/universe/:u/frame-prompt                 - Compile frame prompt");
    info!("  POST   /api/build-prompt                             - Compose shot prompt");
    info!("  POST   /prompt                                       - Forward to ComfyUI");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
