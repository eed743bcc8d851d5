use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

use cards::{AttributeBag, AttributeValue, CardType};

mod presets;
pub use presets::preset_fields;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("duplicate field key: {0}")]
    DuplicateKey(String),
    #[error("group '{child}' nested inside group '{parent}'")]
    NestedGroup { parent: String, child: String },
    #[error("select field '{0}' has no options")]
    EmptyOptions(String),
    #[error("missing required attribute: {0}")]
    MissingRequired(String),
    #[error("attribute '{key}' is not a number")]
    NotANumber { key: String },
    #[error("attribute '{key}' value '{value}' is not an allowed option")]
    NotAnOption { key: String, value: String },
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Select,
    Group,
}

/// One attribute field descriptor. `options` is meaningful for select
/// fields, `children` for groups (a single nesting level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub children: Option<Vec<AttributeField>>,
}

impl AttributeField {
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            required: false,
            options: None,
            children: None,
        }
    }
}

/// Rejects field lists the editors would silently conflate: duplicate
/// sibling keys, groups nested inside groups, selects without options.
pub fn validate_fields(fields: &[AttributeField]) -> Result<(), SchemaError> {
    validate_siblings(fields, None)
}

fn validate_siblings(
    fields: &[AttributeField],
    parent: Option<&AttributeField>,
) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for field in fields {
        if !seen.insert(field.key.as_str()) {
            return Err(SchemaError::DuplicateKey(field.key.clone()));
        }
        match field.kind {
            FieldKind::Select => {
                if field.options.as_ref().map_or(true, |o| o.is_empty()) {
                    return Err(SchemaError::EmptyOptions(field.key.clone()));
                }
            }
            FieldKind::Group => {
                if let Some(parent) = parent {
                    return Err(SchemaError::NestedGroup {
                        parent: parent.key.clone(),
                        child: field.key.clone(),
                    });
                }
                if let Some(children) = &field.children {
                    validate_siblings(children, Some(field))?;
                }
            }
            FieldKind::Text | FieldKind::Number => {}
        }
    }
    Ok(())
}

/// Flattens groups one level so attribute checks see the fields the
/// editors actually render.
pub fn flatten_fields(fields: &[AttributeField]) -> Vec<&AttributeField> {
    let mut flat = Vec::new();
    for field in fields {
        match (&field.kind, &field.children) {
            (FieldKind::Group, Some(children)) => flat.extend(children.iter()),
            _ => flat.push(field),
        }
    }
    flat
}

/// Checks an attribute bag against a field list at the store boundary:
/// required fields must be present and non-blank, number fields must
/// hold numbers, select values must be among the declared options.
/// Keys the schema does not know are allowed through untouched.
pub fn validate_attributes(fields: &[AttributeField], attrs: &AttributeBag) -> Result<(), SchemaError> {
    for field in flatten_fields(fields) {
        let value = attrs.get(&field.key);
        let blank = value.map_or(true, AttributeValue::is_blank);
        if field.required && blank {
            return Err(SchemaError::MissingRequired(field.key.clone()));
        }
        let Some(value) = value else { continue };
        if value.is_blank() {
            continue;
        }
        match field.kind {
            FieldKind::Number => {
                if !matches!(value, AttributeValue::Number(_)) {
                    return Err(SchemaError::NotANumber {
                        key: field.key.clone(),
                    });
                }
            }
            FieldKind::Select => {
                let rendered = value.render();
                let allowed = field
                    .options
                    .as_ref()
                    .map_or(false, |opts| opts.iter().any(|o| *o == rendered));
                if !allowed {
                    return Err(SchemaError::NotAnOption {
                        key: field.key.clone(),
                        value: rendered,
                    });
                }
            }
            FieldKind::Text | FieldKind::Group => {}
        }
    }
    Ok(())
}

/// Per-universe schema overrides, persisted as one JSON document mapping
/// card type to its field list. Types without an override fall back to
/// the bundled presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet(pub BTreeMap<CardType, Vec<AttributeField>>);

impl SchemaSet {
    pub fn fields_for(&self, card_type: CardType) -> Option<&[AttributeField]> {
        self.0.get(&card_type).map(|f| f.as_slice())
    }

    /// The override when one exists, else the bundled preset.
    pub fn effective_fields(&self, card_type: CardType) -> Vec<AttributeField> {
        match self.0.get(&card_type) {
            Some(fields) => fields.clone(),
            None => preset_fields(card_type),
        }
    }

    /// Installs an override after validating it.
    pub fn set_fields(
        &mut self,
        card_type: CardType,
        fields: Vec<AttributeField>,
    ) -> Result<(), SchemaError> {
        validate_fields(&fields)?;
        self.0.insert(card_type, fields);
        Ok(())
    }
}
