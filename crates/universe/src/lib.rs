//! File-backed store for universes: card documents, schema overrides,
//! shotlist boards, and thumbnails, all JSON under one base directory.
//!
//! Layout per universe:
//!
//! ```text
//! <base>/<universe>/<card_type>/<safe_name>.json
//! <base>/<universe>/<universe>.json            schema overrides
//! <base>/<universe>/thumbnails/<file>
//! <base>/<universe>/shotlists/shotlists.json
//! ```

use anyhow::{bail, Context, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use cards::{safe_name, Card, CardType};
use schema::{validate_attributes, AttributeField, SchemaSet};
use shotlist::Board;

/// Directory name a universe gets on disk: trimmed, whitespace runs
/// collapsed to `_`, case preserved.
pub fn universe_dir_name(name: &str) -> String {
    name.trim().split_whitespace().collect::<Vec<_>>().join("_")
}

pub struct UniverseStore {
    base: PathBuf,
    // Write-through cache of shotlist board documents, keyed by
    // universe. Whole-document replace on save, no merge.
    boards: RwLock<HashMap<String, Board>>,
}

impl UniverseStore {
    pub fn open(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)
            .with_context(|| format!("creating universe base directory {}", base.display()))?;
        Ok(Self {
            base,
            boards: RwLock::new(HashMap::new()),
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn universe_dir(&self, universe: &str) -> PathBuf {
        self.base.join(universe_dir_name(universe))
    }

    pub fn universe_exists(&self, universe: &str) -> bool {
        self.universe_dir(universe).is_dir()
    }

    pub fn list_universes(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates the universe directory, one subdirectory per card type,
    /// and an empty schema file. Duplicate names are an error.
    pub fn create_universe(&self, name: &str) -> Result<String> {
        let dir_name = universe_dir_name(name);
        if dir_name.is_empty() {
            bail!("universe name is required");
        }
        let dir = self.base.join(&dir_name);
        if dir.exists() {
            bail!("universe '{dir_name}' already exists");
        }
        fs::create_dir_all(&dir)?;
        for card_type in CardType::ALL {
            fs::create_dir_all(dir.join(card_type.as_str()))?;
        }
        fs::write(dir.join(format!("{dir_name}.json")), "{}")?;
        Ok(dir_name)
    }

    fn card_path(&self, universe: &str, card_type: CardType, name: &str) -> PathBuf {
        self.universe_dir(universe)
            .join(card_type.as_str())
            .join(format!("{}.json", safe_name(name)))
    }

    /// Lists every card of a type. Unreadable or shapeless documents are
    /// skipped with a warning, never fatal.
    pub fn list_cards(&self, universe: &str, card_type: CardType) -> Result<Vec<Card>> {
        let dir = self.universe_dir(universe).join(card_type.as_str());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut cards = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|data| serde_json::from_str::<Card>(&data).map_err(Into::into))
            {
                Ok(card) => cards.push(card),
                Err(err) => warn!("skipping card document {}: {}", path.display(), err),
            }
        }
        cards.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cards)
    }

    /// Lists every card in the universe across all types.
    pub fn list_all_cards(&self, universe: &str) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        for card_type in CardType::ALL {
            cards.extend(self.list_cards(universe, card_type)?);
        }
        Ok(cards)
    }

    /// Persists a card as one whole JSON document, replacing any card of
    /// the same type whose name normalizes to the same file name. The
    /// attribute bag is checked against the universe's effective schema
    /// before anything touches disk.
    pub fn save_card(&self, universe: &str, card: &Card) -> Result<PathBuf> {
        if card.name.trim().is_empty() {
            return Err(cards::CardError::EmptyName.into());
        }
        let fields = self.schema_fields(universe, card.card_type)?;
        validate_attributes(&fields, &card.attributes)
            .with_context(|| format!("card '{}' failed schema validation", card.name))?;

        let path = self.card_path(universe, card.card_type, &card.name);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(card)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load_card(
        &self,
        universe: &str,
        card_type: CardType,
        name: &str,
    ) -> Result<Option<Card>> {
        let path = self.card_path(universe, card_type, name);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let card = serde_json::from_str(&data)
            .with_context(|| format!("parsing card document {}", path.display()))?;
        Ok(Some(card))
    }

    /// Returns whether a card document was actually removed.
    pub fn delete_card(&self, universe: &str, card_type: CardType, name: &str) -> Result<bool> {
        let path = self.card_path(universe, card_type, name);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    fn schema_path(&self, universe: &str) -> PathBuf {
        let dir_name = universe_dir_name(universe);
        self.universe_dir(universe).join(format!("{dir_name}.json"))
    }

    pub fn load_schema_set(&self, universe: &str) -> Result<SchemaSet> {
        let path = self.schema_path(universe);
        if !path.exists() {
            return Ok(SchemaSet::default());
        }
        let data = fs::read_to_string(&path)?;
        let set = serde_json::from_str(&data)
            .with_context(|| format!("parsing schema document {}", path.display()))?;
        Ok(set)
    }

    /// The universe's field list for a card type: its override when one
    /// exists, else the bundled preset.
    pub fn schema_fields(&self, universe: &str, card_type: CardType) -> Result<Vec<AttributeField>> {
        Ok(self.load_schema_set(universe)?.effective_fields(card_type))
    }

    /// Read-modify-write of the universe schema document; the incoming
    /// field list is validated before it lands.
    pub fn save_schema_fields(
        &self,
        universe: &str,
        card_type: CardType,
        fields: Vec<AttributeField>,
    ) -> Result<()> {
        let mut set = self.load_schema_set(universe)?;
        set.set_fields(card_type, fields)?;
        let path = self.schema_path(universe);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, serde_json::to_string_pretty(&set)?)?;
        Ok(())
    }

    fn shotlists_path(&self, universe: &str) -> PathBuf {
        self.universe_dir(universe)
            .join("shotlists")
            .join("shotlists.json")
    }

    /// Loads the universe's shotlist board: the cached document if a
    /// save already went through this store, else the file on disk. A
    /// missing or unparsable document is an error the API layer maps to
    /// a plain 500, matching the storage contract.
    pub fn load_shotlists(&self, universe: &str) -> Result<Board> {
        let key = universe_dir_name(universe);
        if let Some(board) = self.boards.read().get(&key) {
            return Ok(board.clone());
        }
        let path = self.shotlists_path(universe);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("reading shotlist document {}", path.display()))?;
        let board: Board = serde_json::from_str(&data)
            .with_context(|| format!("parsing shotlist document {}", path.display()))?;
        self.boards.write().insert(key, board.clone());
        Ok(board)
    }

    /// Whole-document overwrite of the universe's shotlist board:
    /// updates the cache, then rewrites `shotlists.json`. Last write
    /// wins; there is no merge.
    pub fn save_shotlists(&self, universe: &str, board: Board) -> Result<()> {
        let key = universe_dir_name(universe);
        let path = self.shotlists_path(universe);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&board)?;
        self.boards.write().insert(key, board);
        fs::write(&path, json)?;
        Ok(())
    }

    /// Stores an uploaded thumbnail under the universe, keeping the
    /// original stem and extension with a short random suffix so repeat
    /// uploads never clobber each other. Returns the universe-relative
    /// path the card documents reference.
    pub fn save_thumbnail(&self, universe: &str, filename: &str, bytes: &[u8]) -> Result<String> {
        let original = Path::new(filename);
        let stem = original
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "thumbnail".to_string());
        let ext = original
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let suffix = Uuid::new_v4().simple().to_string();
        let unique = format!("{stem}_{}{ext}", &suffix[..8]);

        let dir = self.universe_dir(universe).join("thumbnails");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(&unique), bytes)?;
        Ok(format!("{}/thumbnails/{}", universe_dir_name(universe), unique))
    }
}
