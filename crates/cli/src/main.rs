use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use cards::{build_prompt_raw, AttributeBag, AttributeValue, Card, CardType};
use shotlist::{Board, BoardStore, ShotlistId, DEFAULT_BOARD_KEY};
use universe::UniverseStore;

#[derive(Parser)]
#[command(name = "promptdeck")]
#[command(about = "PromptDeck CLI - Headless card, schema, and shotlist operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Universe storage directory
    #[arg(long, global = true, default_value = "universes")]
    dir: PathBuf,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List universes
    Universes,

    /// Create a universe with its card-type directories
    CreateUniverse {
        /// Universe name
        name: String,
    },

    /// List cards of a type in a universe
    Cards {
        universe: String,
        /// character, world, scene, prop, shot, event, or frame
        card_type: String,
    },

    /// Create or update a card and regenerate its prompt
    AddCard {
        universe: String,
        card_type: String,
        /// Card name (unique within the type)
        name: String,

        /// Attributes as key=value pairs
        #[arg(short, long)]
        attr: Vec<String>,

        /// Thumbnail path or URL to reference
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Print a stored card document and its prompt
    ShowCard {
        universe: String,
        card_type: String,
        name: String,
    },

    /// Delete a card
    DeleteCard {
        universe: String,
        card_type: String,
        name: String,
    },

    /// Print the effective schema for a card type
    Schema {
        universe: String,
        card_type: String,
    },

    /// Build a prompt from attributes without touching storage
    Prompt {
        card_type: String,
        name: String,

        /// Attributes as key=value pairs
        #[arg(short, long)]
        attr: Vec<String>,
    },

    /// Print the local shotlist board
    Board,

    /// Append a shotlist to the local board
    AddShotlist,

    /// Rename a shotlist on the local board
    RenameShotlist {
        /// Shotlist id (uuid)
        id: String,
        name: String,
    },

    /// Remove a shotlist from the local board
    RemoveShotlist {
        /// Shotlist id (uuid)
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Universes => universes_command(&cli.dir),
        Commands::CreateUniverse { name } => create_universe_command(&cli.dir, &name),
        Commands::Cards {
            universe,
            card_type,
        } => cards_command(&cli.dir, &universe, &card_type),
        Commands::AddCard {
            universe,
            card_type,
            name,
            attr,
            thumbnail,
        } => add_card_command(&cli.dir, &universe, &card_type, &name, &attr, thumbnail),
        Commands::ShowCard {
            universe,
            card_type,
            name,
        } => show_card_command(&cli.dir, &universe, &card_type, &name),
        Commands::DeleteCard {
            universe,
            card_type,
            name,
        } => delete_card_command(&cli.dir, &universe, &card_type, &name),
        Commands::Schema {
            universe,
            card_type,
        } => schema_command(&cli.dir, &universe, &card_type),
        Commands::Prompt {
            card_type,
            name,
            attr,
        } => prompt_command(&card_type, &name, &attr),
        Commands::Board => board_command(),
        Commands::AddShotlist => add_shotlist_command(),
        Commands::RenameShotlist { id, name } => rename_shotlist_command(&id, &name),
        Commands::RemoveShotlist { id } => remove_shotlist_command(&id),
    }
}

fn parse_card_type(raw: &str) -> Result<CardType> {
    match CardType::from_str(raw) {
        Ok(ty) => Ok(ty),
        Err(_) => bail!(
            "unknown card type '{raw}' (expected one of: character, world, scene, prop, shot, event, frame)"
        ),
    }
}

/// Parses `key=value` pairs; values that read as numbers or booleans
/// become typed attribute values, everything else stays text.
fn parse_attrs(pairs: &[String]) -> Result<AttributeBag> {
    let mut bag = AttributeBag::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("attribute '{pair}' is not in key=value form");
        };
        let value = if let Ok(n) = value.parse::<f64>() {
            AttributeValue::Number(n)
        } else if let Ok(b) = value.parse::<bool>() {
            AttributeValue::Toggle(b)
        } else {
            AttributeValue::Text(value.to_string())
        };
        bag.insert(key.to_string(), value);
    }
    Ok(bag)
}

fn universes_command(dir: &PathBuf) -> Result<()> {
    let store = UniverseStore::open(dir)?;
    let universes = store.list_universes()?;
    if universes.is_empty() {
        println!("No universes in {}", dir.display());
        return Ok(());
    }
    for name in universes {
        println!("{name}");
    }
    Ok(())
}

fn create_universe_command(dir: &PathBuf, name: &str) -> Result<()> {
    let store = UniverseStore::open(dir)?;
    let created = store.create_universe(name)?;
    info!("created universe {created}");
    println!("Created universe: {created}");
    Ok(())
}

fn cards_command(dir: &PathBuf, universe: &str, card_type: &str) -> Result<()> {
    let card_type = parse_card_type(card_type)?;
    let store = UniverseStore::open(dir)?;
    let cards = store.list_cards(universe, card_type)?;
    if cards.is_empty() {
        println!("No {card_type} cards in {universe}");
        return Ok(());
    }
    for card in cards {
        println!("{}  [{}]", card.name, card.key());
    }
    Ok(())
}

fn add_card_command(
    dir: &PathBuf,
    universe: &str,
    card_type: &str,
    name: &str,
    attrs: &[String],
    thumbnail: Option<String>,
) -> Result<()> {
    let card_type = parse_card_type(card_type)?;
    let store = UniverseStore::open(dir)?;

    let mut card = match store.load_card(universe, card_type, name)? {
        Some(existing) => existing,
        None => Card::new(name, card_type),
    };
    card.attributes.extend(parse_attrs(attrs)?);
    if thumbnail.is_some() {
        card.thumbnail = thumbnail;
    }
    card.rebuild_prompt();

    let path = store.save_card(universe, &card)?;
    println!("Saved {} to {}", card.key(), path.display());
    Ok(())
}

fn show_card_command(dir: &PathBuf, universe: &str, card_type: &str, name: &str) -> Result<()> {
    let card_type = parse_card_type(card_type)?;
    let store = UniverseStore::open(dir)?;
    let Some(card) = store.load_card(universe, card_type, name)? else {
        bail!("no {card_type} card named '{name}' in {universe}");
    };
    println!("{}", serde_json::to_string_pretty(&card)?);
    if let Some(prompt) = &card.prompt {
        println!("\n{prompt}");
    }
    Ok(())
}

fn delete_card_command(dir: &PathBuf, universe: &str, card_type: &str, name: &str) -> Result<()> {
    let card_type = parse_card_type(card_type)?;
    let store = UniverseStore::open(dir)?;
    if store.delete_card(universe, card_type, name)? {
        println!("Deleted {card_type} card '{name}'");
    } else {
        println!("No {card_type} card named '{name}' in {universe}");
    }
    Ok(())
}

fn schema_command(dir: &PathBuf, universe: &str, card_type: &str) -> Result<()> {
    let card_type = parse_card_type(card_type)?;
    let store = UniverseStore::open(dir)?;
    let fields: Vec<schema::AttributeField> = store.schema_fields(universe, card_type)?;
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

fn prompt_command(card_type: &str, name: &str, attrs: &[String]) -> Result<()> {
    let bag = parse_attrs(attrs)?;
    println!("{}", build_prompt_raw(card_type, name, &bag));
    Ok(())
}

fn open_board() -> (BoardStore, Board) {
    let store = BoardStore::open_default();
    let board = store.load(DEFAULT_BOARD_KEY).unwrap_or_default();
    (store, board)
}

fn parse_shotlist_id(raw: &str) -> Result<ShotlistId> {
    match Uuid::parse_str(raw) {
        Ok(uuid) => Ok(ShotlistId(uuid)),
        Err(_) => bail!("'{raw}' is not a shotlist id"),
    }
}

fn board_command() -> Result<()> {
    let (_, board) = open_board();
    if board.is_empty() {
        println!("Board is empty");
        return Ok(());
    }
    for shotlist in board.shotlists() {
        let marker = if shotlist.collapsed { " (collapsed)" } else { "" };
        println!("{}  {}{}", shotlist.id, shotlist.name, marker);
        for column in &shotlist.columns {
            let mut slots = Vec::new();
            if let Some(world) = &column.world {
                slots.push(format!("world={}", world.name));
            }
            if let Some(scene) = &column.scene {
                slots.push(format!("scene={}", scene.name));
            }
            if let Some(shot) = &column.shot {
                slots.push(format!("shot={}", shot.name));
            }
            for character in &column.characters {
                slots.push(format!("character={}", character.name));
            }
            for prop in &column.props {
                slots.push(format!("prop={}", prop.name));
            }
            if slots.is_empty() {
                println!("  {}  (empty)", column.id);
            } else {
                println!("  {}  {}", column.id, slots.join(", "));
            }
        }
    }
    Ok(())
}

fn add_shotlist_command() -> Result<()> {
    let (store, mut board) = open_board();
    let name = board.add_shotlist().name.clone();
    store.save(DEFAULT_BOARD_KEY, &board)?;
    println!("Added '{name}'");
    Ok(())
}

fn rename_shotlist_command(id: &str, name: &str) -> Result<()> {
    let id = parse_shotlist_id(id)?;
    let (store, mut board) = open_board();
    board.rename(id, name);
    store.save(DEFAULT_BOARD_KEY, &board)?;
    Ok(())
}

fn remove_shotlist_command(id: &str) -> Result<()> {
    let id = parse_shotlist_id(id)?;
    let (store, mut board) = open_board();
    board.remove_shotlist(id);
    store.save(DEFAULT_BOARD_KEY, &board)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attrs_infers_scalar_kinds() {
        let bag = parse_attrs(&[
            "age=25".to_string(),
            "is_base=true".to_string(),
            "title=the Bold".to_string(),
        ])
        .unwrap();
        assert_eq!(bag["age"], AttributeValue::Number(25.0));
        assert_eq!(bag["is_base"], AttributeValue::Toggle(true));
        assert_eq!(bag["title"], AttributeValue::Text("the Bold".to_string()));
    }

    #[test]
    fn test_parse_attrs_rejects_bare_keys() {
        assert!(parse_attrs(&["species".to_string()]).is_err());
    }

    #[test]
    fn test_parse_card_type_messages() {
        assert!(parse_card_type("prop").is_ok());
        assert!(parse_card_type("widget").is_err());
    }
}
