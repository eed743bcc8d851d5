use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use cards::{CardKey, CardType, MiniCard};

mod storage;
pub use storage::*;

#[derive(Debug, Error)]
pub enum ShotlistError {
    #[error("could not serialize board: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("board storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Columns allocated per shotlist on creation.
pub const COLUMNS_PER_SHOTLIST: usize = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ShotlistId(pub Uuid);

impl ShotlistId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShotlistId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ShotlistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ColumnId(pub Uuid);

impl ColumnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ColumnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One slot in a shotlist. The singular slots hold at most one card
/// each; characters and props accumulate, unique by card key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub id: ColumnId,
    #[serde(default)]
    pub world: Option<MiniCard>,
    #[serde(default)]
    pub scene: Option<MiniCard>,
    #[serde(default)]
    pub shot: Option<MiniCard>,
    #[serde(default)]
    pub characters: Vec<MiniCard>,
    #[serde(default)]
    pub props: Vec<MiniCard>,
}

impl Column {
    pub fn new() -> Self {
        Self {
            id: ColumnId::new(),
            world: None,
            scene: None,
            shot: None,
            characters: Vec::new(),
            props: Vec::new(),
        }
    }
}

impl Default for Column {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shotlist {
    pub id: ShotlistId,
    pub name: String,
    #[serde(default)]
    pub collapsed: bool,
    pub columns: Vec<Column>,
}

impl Shotlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ShotlistId::new(),
            name: name.into(),
            collapsed: false,
            columns: (0..COLUMNS_PER_SHOTLIST).map(|_| Column::new()).collect(),
        }
    }
}

/// The in-memory working set of shotlists a user arranges by drag and
/// drop. Every mutation is scoped to exactly one shotlist (and at most
/// one column); a referenced id that does not resolve makes the
/// operation a silent no-op rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Board(pub Vec<Shotlist>);

impl Board {
    pub fn shotlists(&self) -> &[Shotlist] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn shotlist_mut(&mut self, id: ShotlistId) -> Option<&mut Shotlist> {
        self.0.iter_mut().find(|s| s.id == id)
    }

    fn column_mut(&mut self, shotlist_id: ShotlistId, column_id: ColumnId) -> Option<&mut Column> {
        self.shotlist_mut(shotlist_id)?
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
    }

    /// Appends a new shotlist named `Shotlist {len+1}` with fresh empty
    /// columns, and returns it.
    pub fn add_shotlist(&mut self) -> &Shotlist {
        let shotlist = Shotlist::new(format!("Shotlist {}", self.0.len() + 1));
        self.0.push(shotlist);
        &self.0[self.0.len() - 1]
    }

    pub fn remove_shotlist(&mut self, id: ShotlistId) {
        self.0.retain(|s| s.id != id);
    }

    /// Renames a shotlist, trimming the new name. An empty trimmed name
    /// keeps the prior one.
    pub fn rename(&mut self, id: ShotlistId, new_name: &str) {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return;
        }
        if let Some(shotlist) = self.shotlist_mut(id) {
            shotlist.name = trimmed.to_string();
        }
    }

    /// Collapsed shotlists are omitted from the rendered board but stay
    /// in the model.
    pub fn toggle_collapsed(&mut self, id: ShotlistId) {
        if let Some(shotlist) = self.shotlist_mut(id) {
            shotlist.collapsed = !shotlist.collapsed;
        }
    }

    /// Applies a card drop to one column, dispatched by the card's type:
    /// world/scene/shot replace their slot (last drop wins), characters
    /// and props append unless the key is already present, anything else
    /// is a no-op.
    pub fn drop_card(&mut self, shotlist_id: ShotlistId, column_id: ColumnId, card: MiniCard) {
        let Some(column) = self.column_mut(shotlist_id, column_id) else {
            return;
        };
        match card.card_type {
            CardType::World => column.world = Some(card),
            CardType::Scene => column.scene = Some(card),
            CardType::Shot => column.shot = Some(card),
            CardType::Character => {
                if !column.characters.iter().any(|c| c.id == card.id) {
                    column.characters.push(card);
                }
            }
            CardType::Prop => {
                if !column.props.iter().any(|p| p.id == card.id) {
                    column.props.push(card);
                }
            }
            CardType::Event | CardType::Frame => {}
        }
    }

    /// Removes a card from one column. Singular slots clear only when
    /// the held card's key matches; list slots drop the matching entry
    /// and keep the order of the rest.
    pub fn remove_card(
        &mut self,
        shotlist_id: ShotlistId,
        column_id: ColumnId,
        card_id: &CardKey,
        card_type: CardType,
    ) {
        let Some(column) = self.column_mut(shotlist_id, column_id) else {
            return;
        };
        match card_type {
            CardType::World => {
                if column.world.as_ref().map_or(false, |c| &c.id == card_id) {
                    column.world = None;
                }
            }
            CardType::Scene => {
                if column.scene.as_ref().map_or(false, |c| &c.id == card_id) {
                    column.scene = None;
                }
            }
            CardType::Shot => {
                if column.shot.as_ref().map_or(false, |c| &c.id == card_id) {
                    column.shot = None;
                }
            }
            CardType::Character => column.characters.retain(|c| &c.id != card_id),
            CardType::Prop => column.props.retain(|p| &p.id != card_id),
            CardType::Event | CardType::Frame => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cards::{Card, CardType};

    fn mini(name: &str, card_type: CardType) -> MiniCard {
        Card::new(name, card_type).mini()
    }

    fn board_with_one() -> (Board, ShotlistId, ColumnId) {
        let mut board = Board::default();
        let shotlist = board.add_shotlist();
        let shotlist_id = shotlist.id;
        let column_id = shotlist.columns[0].id;
        (board, shotlist_id, column_id)
    }

    #[test]
    fn test_add_shotlist_allocates_six_fresh_columns() {
        let mut board = Board::default();
        for _ in 0..3 {
            board.add_shotlist();
        }
        assert_eq!(board.len(), 3);

        let mut ids = std::collections::HashSet::new();
        for (i, shotlist) in board.shotlists().iter().enumerate() {
            assert_eq!(shotlist.name, format!("Shotlist {}", i + 1));
            assert_eq!(shotlist.columns.len(), COLUMNS_PER_SHOTLIST);
            assert!(!shotlist.collapsed);
            assert!(ids.insert(shotlist.id));
        }
        let column_ids: std::collections::HashSet<_> = board
            .shotlists()
            .iter()
            .flat_map(|s| s.columns.iter().map(|c| c.id))
            .collect();
        assert_eq!(column_ids.len(), 3 * COLUMNS_PER_SHOTLIST);
    }

    #[test]
    fn test_singular_slot_last_drop_wins() {
        let (mut board, s, c) = board_with_one();
        board.drop_card(s, c, mini("Jurassic", CardType::World));
        board.drop_card(s, c, mini("WildWest", CardType::World));

        let column = &board.shotlists()[0].columns[0];
        assert_eq!(column.world.as_ref().unwrap().name, "WildWest");
    }

    #[test]
    fn test_character_drop_dedups_by_key() {
        let (mut board, s, c) = board_with_one();
        board.drop_card(s, c, mini("Buckley", CardType::Character));
        board.drop_card(s, c, mini("Buckley", CardType::Character));
        board.drop_card(s, c, mini("Weston", CardType::Character));

        let column = &board.shotlists()[0].columns[0];
        assert_eq!(column.characters.len(), 2);
        assert_eq!(column.characters[0].name, "Buckley");
        assert_eq!(column.characters[1].name, "Weston");
    }

    #[test]
    fn test_drop_is_scoped_to_one_column() {
        let (mut board, s, c) = board_with_one();
        board.add_shotlist();
        let before = board.clone();
        board.drop_card(s, c, mini("Jurassic", CardType::World));

        assert_ne!(board.shotlists()[0].columns[0], before.shotlists()[0].columns[0]);
        assert_eq!(board.shotlists()[0].columns[1..], before.shotlists()[0].columns[1..]);
        assert_eq!(board.shotlists()[1], before.shotlists()[1]);
    }

    #[test]
    fn test_drop_with_unknown_ids_is_a_noop() {
        let (mut board, s, _) = board_with_one();
        let before = board.clone();
        board.drop_card(s, ColumnId::new(), mini("Jurassic", CardType::World));
        board.drop_card(ShotlistId::new(), before.shotlists()[0].columns[0].id, mini("Jurassic", CardType::World));
        assert_eq!(board, before);
    }

    #[test]
    fn test_frame_and_event_drops_are_noops() {
        let (mut board, s, c) = board_with_one();
        let before = board.clone();
        board.drop_card(s, c, mini("Opening", CardType::Frame));
        board.drop_card(s, c, mini("Festival", CardType::Event));
        assert_eq!(board, before);
    }

    #[test]
    fn test_remove_card_requires_matching_key() {
        let (mut board, s, c) = board_with_one();
        let jurassic = mini("Jurassic", CardType::World);
        board.drop_card(s, c, jurassic.clone());

        let other = mini("WildWest", CardType::World);
        board.remove_card(s, c, &other.id, CardType::World);
        assert!(board.shotlists()[0].columns[0].world.is_some());

        board.remove_card(s, c, &jurassic.id, CardType::World);
        assert!(board.shotlists()[0].columns[0].world.is_none());
    }

    #[test]
    fn test_remove_card_filters_lists_preserving_order() {
        let (mut board, s, c) = board_with_one();
        let buckley = mini("Buckley", CardType::Character);
        board.drop_card(s, c, buckley.clone());
        board.drop_card(s, c, mini("Weston", CardType::Character));
        board.drop_card(s, c, mini("Ada", CardType::Character));

        board.remove_card(s, c, &buckley.id, CardType::Character);
        let names: Vec<_> = board.shotlists()[0].columns[0]
            .characters
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["Weston", "Ada"]);
    }

    #[test]
    fn test_rename_trims_and_keeps_prior_on_empty() {
        let (mut board, s, _) = board_with_one();
        board.rename(s, "  Act One  ");
        assert_eq!(board.shotlists()[0].name, "Act One");

        board.rename(s, "   ");
        assert_eq!(board.shotlists()[0].name, "Act One");
    }

    #[test]
    fn test_toggle_collapsed_keeps_shotlist_in_model() {
        let (mut board, s, _) = board_with_one();
        board.toggle_collapsed(s);
        assert!(board.shotlists()[0].collapsed);
        board.toggle_collapsed(s);
        assert!(!board.shotlists()[0].collapsed);
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_remove_shotlist_noop_when_absent() {
        let (mut board, _, _) = board_with_one();
        board.remove_shotlist(ShotlistId::new());
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_board_serde_round_trip() {
        let (mut board, s, c) = board_with_one();
        board.drop_card(s, c, mini("Jurassic", CardType::World));
        board.drop_card(s, c, mini("Buckley", CardType::Character));
        board.rename(s, "Act One");
        board.toggle_collapsed(s);

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, board);
    }
}
