use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

mod prompts;
pub use prompts::*;

#[derive(Debug, Error)]
pub enum CardError {
    #[error("unknown card type: {0}")]
    UnknownType(String),
    #[error("card name is empty")]
    EmptyName,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Character,
    World,
    Scene,
    Prop,
    Shot,
    Event,
    Frame,
}

impl CardType {
    pub const ALL: [CardType; 7] = [
        CardType::Character,
        CardType::World,
        CardType::Scene,
        CardType::Prop,
        CardType::Shot,
        CardType::Event,
        CardType::Frame,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Character => "character",
            CardType::World => "world",
            CardType::Scene => "scene",
            CardType::Prop => "prop",
            CardType::Shot => "shot",
            CardType::Event => "event",
            CardType::Frame => "frame",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CardType {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(CardType::Character),
            "world" => Ok(CardType::World),
            "scene" => Ok(CardType::Scene),
            "prop" => Ok(CardType::Prop),
            "shot" => Ok(CardType::Shot),
            "event" => Ok(CardType::Event),
            "frame" => Ok(CardType::Frame),
            other => Err(CardError::UnknownType(other.to_string())),
        }
    }
}

/// A single attribute value. Card documents carry JSON scalars only;
/// anything else fails typed deserialization at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Toggle(bool),
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Blank values get template placeholders: null, empty text, the
    /// number 0, and false all count as blank.
    pub fn is_blank(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Toggle(b) => !b,
            AttributeValue::Number(n) => *n == 0.0,
            AttributeValue::Text(s) => s.is_empty(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            AttributeValue::Null => String::new(),
            AttributeValue::Toggle(b) => b.to_string(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Toggle(b)
    }
}

pub type AttributeBag = BTreeMap<String, AttributeValue>;

/// Normalized form of a card name used for keys and on-disk filenames:
/// trimmed, lowercased, whitespace runs collapsed to `_`.
pub fn safe_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Drag-and-drop identity of a card, derived from its type and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardKey(String);

impl CardKey {
    /// Allocates the key for a card: `<type>_<safe_name>`, e.g.
    /// `character_buckley`. Two cards of the same type whose names differ
    /// only by case or whitespace allocate the same key and are conflated
    /// wherever keys are compared (the later disk write replaces the
    /// earlier, and board drops dedup them as one card).
    pub fn allocate(card_type: CardType, name: &str) -> CardKey {
        CardKey(format!("{}_{}", card_type, safe_name(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A full card document as persisted per universe. Wire field names are
/// camelCase to match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub name: String,
    pub card_type: CardType,
    #[serde(default)]
    pub attributes: AttributeBag,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    /// World-variant linkage; only meaningful for character variants.
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default)]
    pub base_character_name: Option<String>,
    #[serde(default)]
    pub is_base: Option<bool>,
}

impl Card {
    pub fn new(name: impl Into<String>, card_type: CardType) -> Self {
        Self {
            name: name.into(),
            card_type,
            attributes: AttributeBag::new(),
            thumbnail: None,
            prompt: None,
            world: None,
            base_character_name: None,
            is_base: None,
        }
    }

    pub fn key(&self) -> CardKey {
        CardKey::allocate(self.card_type, &self.name)
    }

    pub fn mini(&self) -> MiniCard {
        MiniCard::from(self)
    }

    /// Recomputes the stored prompt from the current attributes. Invoked
    /// on every attribute edit; a derived value, not a cache.
    pub fn rebuild_prompt(&mut self) {
        self.prompt = Some(build_prompt(self.card_type, &self.name, &self.attributes));
    }
}

/// Projection of a card used as a drag-and-drop payload. Ephemeral:
/// recomputed from the card on every fetch, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniCard {
    pub id: CardKey,
    pub name: String,
    pub card_type: CardType,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl From<&Card> for MiniCard {
    fn from(card: &Card) -> Self {
        Self {
            id: card.key(),
            name: card.name.clone(),
            card_type: card.card_type,
            thumbnail: card.thumbnail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_key_normalization() {
        let key = CardKey::allocate(CardType::Character, "  Mr Big   Bad ");
        assert_eq!(key.as_str(), "character_mr_big_bad");
    }

    #[test]
    fn test_card_key_collision_is_documented_behavior() {
        let a = CardKey::allocate(CardType::Character, "Buckley");
        let b = CardKey::allocate(CardType::Character, "  buckley ");
        assert_eq!(a, b);
        // A different type never collides with the same name.
        let c = CardKey::allocate(CardType::World, "Buckley");
        assert_ne!(a, c);
    }

    #[test]
    fn test_card_serde_uses_camel_case() {
        let mut card = Card::new("Buckley", CardType::Character);
        card.base_character_name = Some("Buckley".to_string());
        card.is_base = Some(true);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["cardType"], "character");
        assert_eq!(json["baseCharacterName"], "Buckley");
        assert_eq!(json["isBase"], true);

        let back: Card = serde_json::from_value(json).unwrap();
        assert_eq!(back, card);
    }

    #[test]
    fn test_attribute_value_scalars_parse_untagged() {
        let bag: AttributeBag = serde_json::from_str(
            r#"{ "age": 25, "is_base": true, "title": "Captain", "outfit": null }"#,
        )
        .unwrap();
        assert_eq!(bag["age"], AttributeValue::Number(25.0));
        assert_eq!(bag["is_base"], AttributeValue::Toggle(true));
        assert_eq!(bag["title"], AttributeValue::Text("Captain".to_string()));
        assert!(bag["outfit"].is_blank());
    }

    #[test]
    fn test_blank_values() {
        assert!(AttributeValue::Text(String::new()).is_blank());
        assert!(AttributeValue::Number(0.0).is_blank());
        assert!(AttributeValue::Toggle(false).is_blank());
        assert!(AttributeValue::Null.is_blank());
        assert!(!AttributeValue::Text("x".to_string()).is_blank());
        assert!(!AttributeValue::Number(25.0).is_blank());
    }

    #[test]
    fn test_number_renders_without_decimal_point() {
        assert_eq!(AttributeValue::Number(25.0).render(), "25");
        assert_eq!(AttributeValue::Number(5.5).render(), "5.5");
    }

    #[test]
    fn test_mini_projection() {
        let mut card = Card::new("Jurassic", CardType::World);
        card.thumbnail = Some("jurassic.png".to_string());
        let mini = card.mini();
        assert_eq!(mini.id.as_str(), "world_jurassic");
        assert_eq!(mini.name, "Jurassic");
        assert_eq!(mini.card_type, CardType::World);
        assert_eq!(mini.thumbnail.as_deref(), Some("jurassic.png"));
    }

    #[test]
    fn test_card_type_round_trip() {
        for ty in CardType::ALL {
            let parsed: CardType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
        assert!("widget".parse::<CardType>().is_err());
    }
}
