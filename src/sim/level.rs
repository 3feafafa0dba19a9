//! Level grids and where they come from
//!
//! A level is plain text, one line per grid row. The last line is row 0, so
//! the file reads top-down the way it looks on screen.

use std::io;
use std::path::{Path, PathBuf};

use glam::Vec2;
use thiserror::Error;

use super::state::EntityKind;
use crate::cell_center;

/// Fatal problems with level content
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {level}: unknown level letter {character:?} at column {column}, row {row}")]
    InvalidLevelFormat {
        level: u32,
        character: char,
        row: usize,
        column: usize,
    },
    #[error("level {level}: no player start ('p')")]
    MissingPlayer { level: u32 },
    #[error("level {level}: {count} player starts ('p'), expected exactly one")]
    MultiplePlayers { level: u32, count: usize },
    #[error("could not read level {level} from {}: {source}", path.display())]
    Unreadable {
        level: u32,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One entity to create when a level loads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub kind: EntityKind,
    /// Grid cell as (column, row), row 0 at the bottom
    pub cell: (usize, usize),
    /// World-space center of the cell
    pub pos: Vec2,
}

fn letter_kind(letter: char) -> Option<Option<EntityKind>> {
    match letter {
        'x' => Some(Some(EntityKind::Wall)),
        'v' => Some(Some(EntityKind::Vortex)),
        's' => Some(Some(EntityKind::Star)),
        't' => Some(Some(EntityKind::Teleport)),
        'f' => Some(Some(EntityKind::Finish)),
        'p' => Some(Some(EntityKind::Player)),
        ' ' => Some(None),
        _ => None,
    }
}

/// Parse a level grid into placements
///
/// Rows may have different lengths; a short row just has fewer columns.
/// Every level must contain exactly one player start. Unknown letters are
/// reported first, in scan order (bottom row upward, left to right).
pub fn parse_level(text: &str, level: u32) -> Result<Vec<Placement>, LevelError> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut placements = Vec::new();
    let mut players = 0usize;

    for (row, line) in lines.iter().rev().enumerate() {
        for (column, letter) in line.chars().enumerate() {
            let kind = match letter_kind(letter) {
                Some(Some(kind)) => kind,
                Some(None) => continue,
                None => {
                    return Err(LevelError::InvalidLevelFormat {
                        level,
                        character: letter,
                        row,
                        column,
                    });
                }
            };

            if kind == EntityKind::Player {
                players += 1;
            }

            placements.push(Placement {
                kind,
                cell: (column, row),
                pos: cell_center(column, row),
            });
        }
    }

    match players {
        0 => Err(LevelError::MissingPlayer { level }),
        1 => Ok(placements),
        count => Err(LevelError::MultiplePlayers { level, count }),
    }
}

/// Supplies level text by level number (1-based)
pub trait LevelSource {
    /// `Ok(None)` means there is no such level: the sequence is finished
    fn level_text(&self, number: u32) -> Result<Option<String>, LevelError>;
}

/// Levels held in memory, level 1 first
#[derive(Debug, Clone, Default)]
pub struct LevelList {
    levels: Vec<String>,
}

impl LevelList {
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            levels: levels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl LevelSource for LevelList {
    fn level_text(&self, number: u32) -> Result<Option<String>, LevelError> {
        let index = (number as usize).checked_sub(1);
        Ok(index.and_then(|i| self.levels.get(i)).cloned())
    }
}

/// Levels stored as `level{n}.txt` files in one directory
#[derive(Debug, Clone)]
pub struct LevelDirectory {
    root: PathBuf,
}

impl LevelDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, number: u32) -> PathBuf {
        self.root.join(format!("level{number}.txt"))
    }
}

impl LevelSource for LevelDirectory {
    fn level_text(&self, number: u32) -> Result<Option<String>, LevelError> {
        let path = self.path_for(number);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LevelError::Unreadable {
                level: number,
                path,
                source,
            }),
        }
    }
}

const BUILTIN_LEVELS: [&str; 3] = [
    include_str!("../../levels/level1.txt"),
    include_str!("../../levels/level2.txt"),
    include_str!("../../levels/level3.txt"),
];

/// The levels shipped with the game
pub fn builtin_levels() -> LevelList {
    LevelList::new(BUILTIN_LEVELS)
}
