//! Prompt builders: pure functions from a card's name and attribute bag
//! to the descriptive paragraph handed to image-generation tools.

use serde::Serialize;

use crate::{AttributeBag, Card, CardType};

/// Returned for card types the dispatcher cannot resolve.
pub const FALLBACK_PROMPT: &str = "No prompt available.";

const DASH: &str = "—";

fn attr(attrs: &AttributeBag, key: &str, fallback: &str) -> String {
    match attrs.get(key) {
        Some(v) if !v.is_blank() => v.render(),
        _ => fallback.to_string(),
    }
}

fn name_or_dash(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DASH
    } else {
        trimmed
    }
}

/// Builds the prompt for `card_type`. Deterministic and total: the same
/// inputs always produce the same string, and blank attributes render as
/// placeholders rather than erroring.
pub fn build_prompt(card_type: CardType, name: &str, attrs: &AttributeBag) -> String {
    match card_type {
        CardType::Character => character_prompt(name, attrs),
        CardType::World => world_prompt(name, attrs),
        CardType::Scene => scene_prompt(name, attrs),
        CardType::Prop => prop_prompt(name, attrs),
        CardType::Shot => shot_prompt(name, attrs),
        CardType::Event => event_prompt(name, attrs),
        CardType::Frame => frame_prompt(name, attrs),
    }
}

/// Stringly-typed dispatch for callers holding a raw type name; unknown
/// names route to [`FALLBACK_PROMPT`].
pub fn build_prompt_raw(card_type: &str, name: &str, attrs: &AttributeBag) -> String {
    match card_type.parse::<CardType>() {
        Ok(ty) => build_prompt(ty, name, attrs),
        Err(_) => FALLBACK_PROMPT.to_string(),
    }
}

pub fn character_prompt(name: &str, attrs: &AttributeBag) -> String {
    let a = |key: &str| attr(attrs, key, DASH);
    let p = |key: &str, fallback: &str| attr(attrs, key, fallback);
    format!(
        "{name}, known as {title}, is a {species} of {gender}, aged {age}, \
         standing {height} inches tall with a {build} physique.\n\
         Their skin is {skin_tone}, eyes are {eye_color}, and hair is {hair_color} \
         styled in a {hairstyle}. {facial_hair} accents their face with a {face_shape},\n\
         {eye_spacing} eye spacing, {jaw_width} jaw width, {nose_length} nose length, \
         and {mouth_size} mouth size.\n\
         \n\
         They are usually seen {pose}, with an expression of {expression}. \
         Their outfit consists of {outfit}, and they often carry {accessories}.\n\
         Their signature item is {signature_item}. The style is defined by {style_keywords}.\n\
         \n\
         They are a {role} in the story, known for their {personality_traits}. \
         A bit of their backstory: {backstory_snippet}. They hail from {world_affiliation}.\n\
         \n\
         Additional visual notes: {visual_notes}.\n",
        name = name_or_dash(name),
        title = a("title"),
        species = a("species"),
        gender = a("gender"),
        age = a("age"),
        height = a("height"),
        build = a("build"),
        skin_tone = a("skin_tone"),
        eye_color = a("eye_color"),
        hair_color = a("hair_color"),
        hairstyle = a("hairstyle"),
        facial_hair = a("facial_hair"),
        face_shape = a("faceShape"),
        eye_spacing = a("eyeSpacing"),
        jaw_width = a("jawWidth"),
        nose_length = a("noseLength"),
        mouth_size = a("mouthSize"),
        pose = p("pose", "in a neutral stance"),
        expression = p("expression", "a calm demeanor"),
        outfit = p("outfit", "standard attire"),
        accessories = p("accessories", "no visible accessories"),
        signature_item = p("signature_item", "none"),
        style_keywords = p("style_keywords", "nondescript fashion"),
        role = p("role", "character"),
        personality_traits = p("personality_traits", "unique qualities"),
        backstory_snippet = a("backstory_snippet"),
        world_affiliation = p("world_affiliation", "an unknown land"),
        visual_notes = p("visual_notes", "none"),
    )
}

pub fn world_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: A world with {climate} and {terrain}.\n\
         Dominant culture: {dominant_culture}.\n\
         Technology level: {tech_level}.\n\
         Key locations include: {key_locations}.\n\
         Notable figures: {notable_figures}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        climate = attr(attrs, "climate", "varied climate"),
        terrain = attr(attrs, "terrain", "diverse terrain"),
        dominant_culture = attr(attrs, "dominant_culture", DASH),
        tech_level = attr(attrs, "tech_level", DASH),
        key_locations = attr(attrs, "key_locations", "unknown"),
        notable_figures = attr(attrs, "notable_figures", "undisclosed"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

pub fn scene_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: Set in {location} during {time_of_day}.\n\
         Weather conditions are {weather}.\n\
         Mood: {mood}.\n\
         Key objects present: {key_objects}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        location = attr(attrs, "location", "an unknown place"),
        time_of_day = attr(attrs, "time_of_day", "an undefined time of day"),
        weather = attr(attrs, "weather", "neutral"),
        mood = attr(attrs, "mood", DASH),
        key_objects = attr(attrs, "key_objects", "none"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

pub fn prop_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: A {material} prop, approximately {size} in size, weighing {weight}.\n\
         Condition: {condition}.\n\
         Magical properties: {magical_properties}.\n\
         Origin: {origin}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        material = attr(attrs, "material", DASH),
        size = attr(attrs, "size", DASH),
        weight = attr(attrs, "weight", DASH),
        condition = attr(attrs, "condition", DASH),
        magical_properties = attr(attrs, "magical_properties", DASH),
        origin = attr(attrs, "origin", "unknown"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

pub fn shot_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: Shot with a {camera_angle} camera angle, focusing on {focus_subject}.\n\
         Lighting is {lighting} with {motion}.\n\
         Special effects: {special_effects}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        camera_angle = attr(attrs, "camera_angle", "standard"),
        focus_subject = attr(attrs, "focus_subject", "the main subject"),
        lighting = attr(attrs, "lighting", "standard"),
        motion = attr(attrs, "motion", "no specific motion"),
        special_effects = attr(attrs, "special_effects", "none"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

pub fn event_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: A {event_type} event held at {location}.\n\
         Participants include: {participants}.\n\
         Outcome: {outcome}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        event_type = attr(attrs, "event_type", DASH),
        location = attr(attrs, "location", "an undisclosed location"),
        participants = attr(attrs, "participants", "unknown"),
        outcome = attr(attrs, "outcome", "unresolved"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

pub fn frame_prompt(name: &str, attrs: &AttributeBag) -> String {
    format!(
        "{name}: A frame with {perspective} perspective.\n\
         Mood: {mood}.\n\
         Objects in view: {objects_in_view}.\n\
         Visual style: {visual_notes}.",
        name = name_or_dash(name),
        perspective = attr(attrs, "perspective", DASH),
        mood = attr(attrs, "mood", "neutral"),
        objects_in_view = attr(attrs, "objects_in_view", "none"),
        visual_notes = attr(attrs, "visual_notes", "natural"),
    )
}

/// Composes the one-line shot prompt from character and world snippets.
/// Snippets are a card's stored prompt when present, else its name.
pub fn compose_shot_prompt(character: &str, world: &str, action: Option<&str>) -> String {
    let action_part = match action {
        Some(a) if !a.trim().is_empty() => format!(" — {}", a.trim()),
        _ => String::new(),
    };
    format!(
        "Shot of {character} in the {world}{action_part}. 1/8 scale action figure diorama style."
    )
}

/// Result of compiling a frame card against the card pool.
#[derive(Debug, Clone, Serialize)]
pub struct FramePrompt {
    pub compiled_prompt: String,
    pub used_cards: Vec<String>,
}

const FRAME_COMPONENTS: [CardType; 6] = [
    CardType::Character,
    CardType::World,
    CardType::Scene,
    CardType::Prop,
    CardType::Event,
    CardType::Shot,
];

/// Compiles a frame card's prompt by joining the prompts and attributes
/// of every component card its attribute bag references by name.
/// Missing references are skipped, never an error.
pub fn compile_frame_prompt(frame: &Card, all_cards: &[Card]) -> FramePrompt {
    let mut used_cards = Vec::new();
    let mut components: Vec<String> = Vec::new();

    for component in FRAME_COMPONENTS {
        let Some(value) = frame.attributes.get(component.as_str()) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let name = value.render();
        let Some(card) = all_cards
            .iter()
            .find(|c| c.name == name && c.card_type == component)
        else {
            continue;
        };

        used_cards.push(card.name.clone());
        if let Some(prompt) = &card.prompt {
            components.push(prompt.clone());
        }
        let flattened = card
            .attributes
            .iter()
            .filter(|(_, v)| !v.is_blank())
            .map(|(k, v)| format!("{}: {}", k, v.render()))
            .collect::<Vec<_>>()
            .join(" ");
        components.push(flattened);
    }

    let compiled_prompt = components
        .into_iter()
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    FramePrompt {
        compiled_prompt,
        used_cards,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeValue;

    fn bag(entries: &[(&str, &str)]) -> AttributeBag {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_character_prompt_with_no_attributes() {
        let prompt = character_prompt("Buckley", &AttributeBag::new());
        assert!(prompt.starts_with("Buckley, known as —, is a — of —, aged —"));
        assert!(!prompt.contains("null"));
        assert!(!prompt.contains("undefined"));
    }

    #[test]
    fn test_character_prompt_substitutes_attributes() {
        let mut attrs = bag(&[("title", "the Bold"), ("species", "badger")]);
        attrs.insert("age".to_string(), AttributeValue::Number(25.0));
        let prompt = character_prompt("Buckley", &attrs);
        assert!(prompt.starts_with("Buckley, known as the Bold, is a badger of —, aged 25"));
    }

    #[test]
    fn test_builders_are_deterministic() {
        let attrs = bag(&[("climate", "arid"), ("terrain", "dunes")]);
        assert_eq!(world_prompt("Dunes", &attrs), world_prompt("Dunes", &attrs));
    }

    #[test]
    fn test_all_types_have_a_builder() {
        for ty in CardType::ALL {
            let prompt = build_prompt(ty, "Thing", &AttributeBag::new());
            assert!(prompt.starts_with("Thing"));
            assert!(!prompt.contains("null"));
        }
    }

    #[test]
    fn test_blank_name_renders_as_placeholder() {
        let prompt = world_prompt("   ", &AttributeBag::new());
        assert!(prompt.starts_with("—: A world with varied climate"));
    }

    #[test]
    fn test_zero_and_empty_count_as_blank() {
        let mut attrs = AttributeBag::new();
        attrs.insert("age".to_string(), AttributeValue::Number(0.0));
        attrs.insert("title".to_string(), AttributeValue::Text(String::new()));
        let prompt = character_prompt("Buckley", &attrs);
        assert!(prompt.starts_with("Buckley, known as —, is a — of —, aged —"));
    }

    #[test]
    fn test_raw_dispatch_falls_back_on_unknown_type() {
        assert_eq!(
            build_prompt_raw("widget", "Thing", &AttributeBag::new()),
            FALLBACK_PROMPT
        );
        assert!(build_prompt_raw("world", "Thing", &AttributeBag::new()).starts_with("Thing:"));
    }

    #[test]
    fn test_compose_shot_prompt() {
        assert_eq!(
            compose_shot_prompt("Buckley", "Jurassic", Some("running")),
            "Shot of Buckley in the Jurassic — running. 1/8 scale action figure diorama style."
        );
        assert_eq!(
            compose_shot_prompt("Buckley", "Jurassic", None),
            "Shot of Buckley in the Jurassic. 1/8 scale action figure diorama style."
        );
    }

    #[test]
    fn test_compile_frame_prompt_uses_referenced_cards() {
        let mut character = Card::new("Buckley", CardType::Character);
        character.prompt = Some("Buckley the badger".to_string());
        character
            .attributes
            .insert("species".to_string(), AttributeValue::from("badger"));

        let world = Card::new("Jurassic", CardType::World);

        let mut frame = Card::new("Opening", CardType::Frame);
        frame
            .attributes
            .insert("character".to_string(), AttributeValue::from("Buckley"));
        frame
            .attributes
            .insert("world".to_string(), AttributeValue::from("Jurassic"));
        frame
            .attributes
            .insert("scene".to_string(), AttributeValue::from("Nowhere"));

        let pool = vec![character, world];
        let result = compile_frame_prompt(&frame, &pool);
        assert_eq!(result.used_cards, vec!["Buckley", "Jurassic"]);
        assert!(result.compiled_prompt.contains("Buckley the badger"));
        assert!(result.compiled_prompt.contains("species: badger"));
    }

    #[test]
    fn test_compile_frame_prompt_empty_frame() {
        let frame = Card::new("Empty", CardType::Frame);
        let result = compile_frame_prompt(&frame, &[]);
        assert!(result.compiled_prompt.is_empty());
        assert!(result.used_cards.is_empty());
    }
}
