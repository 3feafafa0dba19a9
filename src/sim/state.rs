//! World state and core entity types
//!
//! Everything the contact rules and transitions mutate lives in `WorldState`.
//! Structural changes are also queued as `GameEvent`s so the physics engine
//! and the presentation layer can mirror them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::level::{LevelError, LevelSource, parse_level};
use super::teleport::Transition;

/// Stable entity identifier, never reused within a run
pub type EntityId = u32;

/// What a placed entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Wall,
    /// Hazard: swallows the player
    Vortex,
    /// Collectible
    Star,
    Teleport,
    /// Level exit
    Finish,
    Player,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Wall => "wall",
            EntityKind::Vortex => "vortex",
            EntityKind::Star => "star",
            EntityKind::Teleport => "teleport",
            EntityKind::Finish => "finish",
            EntityKind::Player => "player",
        }
    }

    /// Vortices and teleports rotate continuously (presentation only)
    pub fn spins(&self) -> bool {
        matches!(self, EntityKind::Vortex | EntityKind::Teleport)
    }
}

/// A static level entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Teleports only: can be entered / chosen as a destination
    pub active: bool,
    /// Teleports only: seconds until reactivation while inactive
    pub cooldown: f32,
    /// Rotation phase in radians
    pub spin: f32,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            active: true,
            cooldown: 0.0,
            spin: 0.0,
        }
    }

    /// Active teleport available for entry or as a destination
    pub fn is_open_teleport(&self) -> bool {
        self.kind == EntityKind::Teleport && self.active
    }
}

/// The player token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub pos: Vec2,
    /// Render scale (1.0 normal, shrinks during transitions)
    pub scale: f32,
    pub visible: bool,
    /// Physics response enabled (off while a transition animates it)
    pub dynamic: bool,
}

impl Player {
    pub fn new(id: EntityId, pos: Vec2) -> Self {
        Self {
            id,
            pos,
            scale: 1.0,
            visible: true,
            dynamic: true,
        }
    }
}

/// End-of-sequence message shown until the player taps to restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub text: String,
}

impl Banner {
    pub fn game_over(score: i64) -> Self {
        Self {
            text: format!("Game Over!\nScore: {score}.\nTouch the screen to play again"),
        }
    }
}

/// Notifications for the physics and presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: i64 },
    LevelLoaded { level: u32 },
    /// No further level exists; the banner is up
    SequenceFinished { score: i64 },
    BannerCleared,
    EntitySpawned { id: EntityId, kind: EntityKind, pos: Vec2 },
    EntityRemoved { id: EntityId, kind: EntityKind },
    TeleportActivated { id: EntityId },
    TeleportDeactivated { id: EntityId },
    PlayerDynamicsChanged { id: EntityId, dynamic: bool },
}

/// Result of a level load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelLoad {
    Loaded { level: u32, entities: usize },
    SequenceFinished { level: u32 },
}

/// The live game world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    /// May go negative
    pub score: i64,
    /// Current level number (1-based)
    pub level: u32,
    /// Death/teleport animation in progress
    pub transition: Transition,
    /// No level resource exists for `level`
    pub sequence_finished: bool,
    /// Where the player (re)spawns
    pub player_start: Option<Vec2>,
    pub player: Option<Player>,
    /// Level entities, sorted by id
    pub entities: Vec<Entity>,
    pub banner: Option<Banner>,
    #[serde(skip)]
    events: Vec<GameEvent>,
    next_id: EntityId,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    /// An empty world at level 1
    pub fn new() -> Self {
        Self {
            score: 0,
            level: 1,
            transition: Transition::Idle,
            sequence_finished: false,
            player_start: None,
            player: None,
            entities: Vec::new(),
            banner: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// True while the player is mid-death or mid-teleport
    pub fn is_transitioning(&self) -> bool {
        !matches!(self.transition, Transition::Idle)
    }

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    pub fn is_player(&self, id: EntityId) -> bool {
        self.player.as_ref().is_some_and(|p| p.id == id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let index = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        Some(&self.entities[index])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let index = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        Some(&mut self.entities[index])
    }

    pub fn entities_of(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.entities_of(kind).count()
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain queued events, oldest first
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add a static entity
    pub fn spawn_entity(&mut self, kind: EntityKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.entities.push(Entity::new(id, kind, pos));
        self.push_event(GameEvent::EntitySpawned { id, kind, pos });
        id
    }

    /// Create the player and record `pos` as the respawn point
    pub fn spawn_player(&mut self, pos: Vec2) -> EntityId {
        if let Some(old) = self.player.take() {
            self.push_event(GameEvent::EntityRemoved {
                id: old.id,
                kind: EntityKind::Player,
            });
        }

        let id = self.next_entity_id();
        self.player = Some(Player::new(id, pos));
        self.player_start = Some(pos);
        self.push_event(GameEvent::EntitySpawned {
            id,
            kind: EntityKind::Player,
            pos,
        });
        id
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.binary_search_by_key(&id, |e| e.id).ok()?;
        let entity = self.entities.remove(index);
        self.push_event(GameEvent::EntityRemoved {
            id,
            kind: entity.kind,
        });
        Some(entity)
    }

    pub fn remove_player(&mut self) -> Option<Player> {
        let player = self.player.take()?;
        self.push_event(GameEvent::EntityRemoved {
            id: player.id,
            kind: EntityKind::Player,
        });
        Some(player)
    }

    /// Turn the player's physics response on or off
    pub fn set_player_dynamic(&mut self, dynamic: bool) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        if player.dynamic != dynamic {
            player.dynamic = dynamic;
            let id = player.id;
            self.push_event(GameEvent::PlayerDynamicsChanged { id, dynamic });
        }
    }

    /// Recreate the player at the recorded start, if any
    pub fn respawn_player(&mut self) -> Option<EntityId> {
        let start = self.player_start?;
        Some(self.spawn_player(start))
    }

    pub fn adjust_score(&mut self, delta: i64) {
        self.score += delta;
        self.push_event(GameEvent::ScoreChanged { score: self.score });
    }

    /// Remove every level entity, the player and the banner
    pub fn clear_up(&mut self) {
        for entity in std::mem::take(&mut self.entities) {
            self.push_event(GameEvent::EntityRemoved {
                id: entity.id,
                kind: entity.kind,
            });
        }
        self.remove_player();
        if self.banner.take().is_some() {
            self.push_event(GameEvent::BannerCleared);
        }
        self.transition = Transition::Idle;
    }

    /// Clear the world and build level `number` from `levels`
    ///
    /// A missing level finishes the sequence. A malformed one is an error
    /// and leaves the world empty.
    pub fn load_level(
        &mut self,
        number: u32,
        levels: &dyn LevelSource,
    ) -> Result<LevelLoad, LevelError> {
        self.clear_up();
        self.level = number;

        let Some(text) = levels.level_text(number)? else {
            self.finish_sequence();
            return Ok(LevelLoad::SequenceFinished { level: number });
        };

        let placements = parse_level(&text, number)?;
        for placement in &placements {
            match placement.kind {
                EntityKind::Player => {
                    self.spawn_player(placement.pos);
                }
                kind => {
                    self.spawn_entity(kind, placement.pos);
                }
            }
        }

        log::info!(
            "Level {}: {} walls, {} stars, {} vortices, {} teleports",
            number,
            self.count_of(EntityKind::Wall),
            self.count_of(EntityKind::Star),
            self.count_of(EntityKind::Vortex),
            self.count_of(EntityKind::Teleport),
        );
        self.push_event(GameEvent::LevelLoaded { level: number });

        Ok(LevelLoad::Loaded {
            level: number,
            entities: placements.len(),
        })
    }

    fn finish_sequence(&mut self) {
        log::info!("No level {}, game finished with score {}", self.level, self.score);
        self.sequence_finished = true;
        self.banner = Some(Banner::game_over(self.score));
        self.push_event(GameEvent::SequenceFinished { score: self.score });
    }

    /// Reset score and level, then load level 1
    pub fn start_game(&mut self, levels: &dyn LevelSource) -> Result<LevelLoad, LevelError> {
        log::info!("Starting new game");
        self.score = 0;
        self.push_event(GameEvent::ScoreChanged { score: 0 });
        self.sequence_finished = false;
        self.load_level(1, levels)
    }
}
