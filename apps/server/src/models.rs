//! Request and response bodies for the universe API.

use serde::{Deserialize, Serialize};

use cards::{AttributeBag, Card, CardType};

/// Card creation/update request. Wire names are camelCase, matching the
/// persisted card documents.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCreate {
    pub name: String,
    pub card_type: CardType,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub attributes: AttributeBag,
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub base_character_name: Option<String>,
    #[serde(default)]
    pub is_base: Option<bool>,
}

impl CardCreate {
    pub fn into_card(self) -> Card {
        Card {
            name: self.name.trim().to_string(),
            card_type: self.card_type,
            attributes: self.attributes,
            thumbnail: self.thumbnail,
            prompt: self.prompt,
            world: self.world,
            base_character_name: self.base_character_name,
            is_base: self.is_base,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUniverseRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UniverseList {
    pub universes: Vec<String>,
}

/// Base64 thumbnail upload; the decoded bytes are stored under the
/// universe's thumbnails directory.
#[derive(Debug, Deserialize)]
pub struct UploadThumbnailRequest {
    pub filename: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct UploadThumbnailResponse {
    pub filename: String,
}

/// Shot prompt composition request: card names resolved against the
/// universe, plus a free action phrase.
#[derive(Debug, Deserialize)]
pub struct BuildPromptRequest {
    pub universe: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildPromptResponse {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct FramePromptRequest {
    pub name: String,
}

/// Prompt forwarded to the remote ComfyUI endpoint.
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

/// Fixed generation parameters sent with every forwarded prompt.
#[derive(Debug, Serialize)]
pub struct Txt2ImgPayload {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
}

impl Txt2ImgPayload {
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            negative_prompt: String::new(),
            width: 512,
            height: 512,
            steps: 30,
            cfg_scale: 7.0,
        }
    }
}
