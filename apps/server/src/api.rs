//! HTTP handlers for the universe API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

use cards::{compile_frame_prompt, compose_shot_prompt, Card, CardError, CardType, FramePrompt};
use schema::{AttributeField, SchemaError};
use shotlist::Board;

use crate::models::*;
use crate::AppState;

/// API error type
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Storage(String),
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::Storage(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", e),
            ),
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, e),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Schema and card-shape violations surface as 400s; anything else from
/// the store is a plain storage failure.
fn storage_err(err: anyhow::Error) -> ApiError {
    if err.downcast_ref::<SchemaError>().is_some() || err.downcast_ref::<CardError>().is_some() {
        ApiError::BadRequest(format!("{:#}", err))
    } else {
        ApiError::Storage(format!("{:#}", err))
    }
}

fn parse_card_type(raw: &str) -> Result<CardType, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown card type: {raw}")))
}

/// GET /api/universes - List universes
pub async fn list_universes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UniverseList>, ApiError> {
    let universes = state.store.list_universes().map_err(storage_err)?;
    Ok(Json(UniverseList { universes }))
}

/// POST /api/universe/create - Create a universe with its card-type
/// directories and an empty schema document
pub async fn create_universe(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUniverseRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Universe name is required.".to_string()));
    }
    if state.store.universe_exists(&req.name) {
        return Err(ApiError::BadRequest("Universe already exists.".to_string()));
    }
    let universe = state.store.create_universe(&req.name).map_err(storage_err)?;
    Ok(Json(json!({ "status": "success", "universe": universe })))
}

/// GET /api/universe/:universe/cards/:card_type - List cards of a type
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
    Path((universe, card_type)): Path<(String, String)>,
) -> Result<Json<Vec<Card>>, ApiError> {
    let card_type = parse_card_type(&card_type)?;
    let cards = state
        .store
        .list_cards(&universe, card_type)
        .map_err(storage_err)?;
    Ok(Json(cards))
}

/// POST /api/universe/:universe/cards/:card_type - Save a card document
pub async fn create_card(
    State(state): State<Arc<AppState>>,
    Path((universe, card_type)): Path<(String, String)>,
    Json(req): Json<CardCreate>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let card_type = parse_card_type(&card_type)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Card name is required.".to_string()));
    }
    if req.card_type != card_type {
        return Err(ApiError::BadRequest(format!(
            "card type mismatch: body says {}, path says {}",
            req.card_type, card_type
        )));
    }

    let card = req.into_card();
    let path = state.store.save_card(&universe, &card).map_err(storage_err)?;
    Ok(Json(json!({
        "status": "success",
        "file": path.display().to_string(),
    })))
}

/// DELETE /api/universe/:universe/cards/:card_type/:name - Delete a card
pub async fn delete_card(
    State(state): State<Arc<AppState>>,
    Path((universe, card_type, name)): Path<(String, String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let card_type = parse_card_type(&card_type)?;
    let removed = state
        .store
        .delete_card(&universe, card_type, &name)
        .map_err(storage_err)?;
    if !removed {
        return Err(ApiError::NotFound);
    }
    Ok(Json(json!({ "status": "deleted" })))
}

/// GET /api/universe/:universe/schema/:card_type - Effective field list
/// (universe override, else bundled preset)
pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path((universe, card_type)): Path<(String, String)>,
) -> Result<Json<Vec<AttributeField>>, ApiError> {
    let card_type = parse_card_type(&card_type)?;
    let fields = state
        .store
        .schema_fields(&universe, card_type)
        .map_err(storage_err)?;
    Ok(Json(fields))
}

/// POST /api/universe/:universe/schema/:card_type - Save a field list
pub async fn save_schema(
    State(state): State<Arc<AppState>>,
    Path((universe, card_type)): Path<(String, String)>,
    Json(fields): Json<Vec<AttributeField>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let card_type = parse_card_type(&card_type)?;
    state
        .store
        .save_schema_fields(&universe, card_type, fields)
        .map_err(storage_err)?;
    Ok(Json(json!({
        "status": "success",
        "message": format!("Saved {card_type} schema"),
    })))
}

/// GET /api/universe/:universe/shotlists - The stored board document.
/// Failure is a plain-text 500, matching the storage contract.
pub async fn load_shotlists(
    State(state): State<Arc<AppState>>,
    Path(universe): Path<String>,
) -> Response {
    match state.store.load_shotlists(&universe) {
        Ok(board) => Json(board).into_response(),
        Err(err) => {
            warn!("loading shotlists for '{}' failed: {:#}", universe, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error loading shotlists").into_response()
        }
    }
}

/// POST /api/universe/:universe/shotlists - Whole-document overwrite of
/// the board. Plain-text responses, no body schema.
pub async fn save_shotlists(
    State(state): State<Arc<AppState>>,
    Path(universe): Path<String>,
    Json(board): Json<Board>,
) -> Response {
    match state.store.save_shotlists(&universe, board) {
        Ok(()) => (StatusCode::OK, "Shotlists saved").into_response(),
        Err(err) => {
            error!("saving shotlists for '{}' failed: {:#}", universe, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error saving shotlists").into_response()
        }
    }
}

/// POST /api/universe/:universe/upload-thumbnail - Store a base64 image
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    Path(universe): Path<String>,
    Json(req): Json<UploadThumbnailRequest>,
) -> Result<Json<UploadThumbnailResponse>, ApiError> {
    let bytes = decode_image_payload(&req.data)
        .ok_or_else(|| ApiError::BadRequest("Invalid base64 image data".to_string()))?;
    let filename = state
        .store
        .save_thumbnail(&universe, &req.filename, &bytes)
        .map_err(storage_err)?;
    Ok(Json(UploadThumbnailResponse { filename }))
}

/// Accepts raw base64 or a full `data:image/...;base64,` URL.
fn decode_image_payload(data: &str) -> Option<Vec<u8>> {
    let encoded = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    base64::engine::general_purpose::STANDARD.decode(encoded).ok()
}

/// POST /api/build-prompt - Compose the shot prompt from stored
/// character and world cards plus an action phrase
pub async fn build_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BuildPromptRequest>,
) -> Result<Json<BuildPromptResponse>, ApiError> {
    let character = card_snippet(
        &state,
        &req.universe,
        CardType::Character,
        req.character.as_deref(),
    )?;
    let world = card_snippet(&state, &req.universe, CardType::World, req.world.as_deref())?;
    let prompt = compose_shot_prompt(&character, &world, req.action.as_deref());
    Ok(Json(BuildPromptResponse { prompt }))
}

/// A card's stored prompt when present, else its name; empty when the
/// reference is absent or unknown.
fn card_snippet(
    state: &AppState,
    universe: &str,
    card_type: CardType,
    name: Option<&str>,
) -> Result<String, ApiError> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(String::new());
    };
    match state.store.load_card(universe, card_type, name) {
        Ok(Some(card)) => Ok(card
            .prompt
            .filter(|p| !p.is_empty())
            .unwrap_or(card.name)),
        Ok(None) => Ok(String::new()),
        Err(err) => Err(storage_err(err)),
    }
}

/// POST /api/universe/:universe/frame-prompt - Compile a frame card's
/// prompt from the component cards it references
pub async fn frame_prompt(
    State(state): State<Arc<AppState>>,
    Path(universe): Path<String>,
    Json(req): Json<FramePromptRequest>,
) -> Result<Json<FramePrompt>, ApiError> {
    let frame = state
        .store
        .load_card(&universe, CardType::Frame, &req.name)
        .map_err(storage_err)?
        .ok_or(ApiError::NotFound)?;
    let all_cards = state.store.list_all_cards(&universe).map_err(storage_err)?;
    Ok(Json(compile_frame_prompt(&frame, &all_cards)))
}

/// POST /prompt - Forward a prompt to the remote ComfyUI endpoint with
/// fixed generation parameters
pub async fn forward_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PromptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(url) = &state.comfyui_url else {
        return Err(ApiError::Upstream("No ComfyUI endpoint configured".to_string()));
    };

    let payload = Txt2ImgPayload::new(req.prompt);
    let response = state
        .http
        .post(url.as_str())
        .json(&payload)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    let body = response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_payload_accepts_raw_and_data_urls() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");
        assert_eq!(decode_image_payload(&encoded).unwrap(), b"png-bytes");

        let data_url = format!("data:image/png;base64,{encoded}");
        assert_eq!(decode_image_payload(&data_url).unwrap(), b"png-bytes");

        assert!(decode_image_payload("not base64!!!").is_none());
    }

    #[test]
    fn test_parse_card_type_rejects_unknown() {
        assert!(parse_card_type("world").is_ok());
        assert!(parse_card_type("widget").is_err());
    }
}
