//! Bundled default schemas, compiled into the crate. A universe's own
//! schema document overrides these per card type.

use crate::AttributeField;
use cards::CardType;

pub fn preset_fields(card_type: CardType) -> Vec<AttributeField> {
    let raw = match card_type {
        CardType::Character => include_str!("../presets/character.json"),
        CardType::World => include_str!("../presets/world.json"),
        CardType::Scene => include_str!("../presets/scene.json"),
        CardType::Prop => include_str!("../presets/prop.json"),
        CardType::Shot => include_str!("../presets/shot.json"),
        CardType::Event => include_str!("../presets/event.json"),
        CardType::Frame => include_str!("../presets/frame.json"),
    };
    serde_json::from_str(raw).expect("bundled preset schema is valid JSON")
}
