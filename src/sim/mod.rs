//! Game simulation module
//!
//! All gameplay rules live here. Nothing in this module renders, blocks or
//! touches platform APIs:
//! - Physics is reached only through `PhysicsWorld`
//! - Level text only through `LevelSource`
//! - Randomness comes from a seeded RNG owned by the controller
//! - Stable iteration order (by entity ID)

pub mod body;
pub mod contact;
pub mod input;
pub mod level;
pub mod state;
pub mod teleport;
pub mod tick;

pub use body::{BodyDesc, BodyShape, Contact, PhysicsWorld};
pub use contact::{ContactOutcome, resolve_contact};
pub use input::InputMapper;
pub use level::{
    LevelDirectory, LevelError, LevelList, LevelSource, Placement, builtin_levels, parse_level,
};
pub use state::{
    Banner, Entity, EntityId, EntityKind, GameEvent, LevelLoad, Player, WorldState,
};
pub use teleport::{DyingPhase, TeleportPhase, Transition};
pub use tick::{GameController, PointerInput, TickInput};
