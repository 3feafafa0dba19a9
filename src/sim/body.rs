//! Physics engine boundary
//!
//! The rigid-body engine lives outside this crate. The game tells it which
//! bodies exist and how they filter collisions, sets gravity, and reads back
//! contact-begin pairs and the player position.

use glam::Vec2;

use super::state::{EntityId, EntityKind};
use crate::consts::{CELL_SIZE, PLAYER_LINEAR_DAMPING};

/// Collision category bits
pub mod category {
    pub const PLAYER: u32 = 1;
    pub const WALL: u32 = 2;
    pub const STAR: u32 = 4;
    pub const VORTEX: u32 = 8;
    pub const FINISH: u32 = 16;
    pub const TELEPORT: u32 = 32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    /// Axis-aligned square with the given side length
    Square(f32),
    Circle { radius: f32 },
}

/// Everything the physics engine needs to create a body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub shape: BodyShape,
    /// Moved by forces (only the player)
    pub dynamic: bool,
    pub allows_rotation: bool,
    pub linear_damping: f32,
    /// Bits identifying this body
    pub category: u32,
    /// Categories this body physically bounces off
    pub collision_mask: u32,
    /// Categories that produce contact-begin events with this body
    pub contact_mask: u32,
}

impl BodyDesc {
    pub fn for_kind(kind: EntityKind, pos: Vec2) -> Self {
        let radius = CELL_SIZE / 2.0;
        let pickup = |bits: u32| Self {
            kind,
            pos,
            shape: BodyShape::Circle { radius },
            dynamic: false,
            allows_rotation: true,
            linear_damping: 0.0,
            category: bits,
            collision_mask: 0,
            contact_mask: category::PLAYER,
        };

        match kind {
            EntityKind::Wall => Self {
                shape: BodyShape::Square(CELL_SIZE),
                contact_mask: 0,
                ..pickup(category::WALL)
            },
            EntityKind::Vortex => pickup(category::VORTEX),
            EntityKind::Star => pickup(category::STAR),
            EntityKind::Teleport => pickup(category::TELEPORT),
            EntityKind::Finish => pickup(category::FINISH),
            EntityKind::Player => Self {
                dynamic: true,
                allows_rotation: false,
                linear_damping: PLAYER_LINEAR_DAMPING,
                collision_mask: category::WALL,
                contact_mask: category::STAR
                    | category::VORTEX
                    | category::FINISH
                    | category::TELEPORT,
                ..pickup(category::PLAYER)
            },
        }
    }

    /// True if a contact-begin event is generated between the two bodies
    pub fn reports_contact_with(&self, other: &BodyDesc) -> bool {
        self.contact_mask & other.category != 0 || other.contact_mask & self.category != 0
    }

    /// True if the bodies push each other apart
    pub fn collides_with(&self, other: &BodyDesc) -> bool {
        self.collision_mask & other.category != 0
    }
}

/// A contact-begin notification between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: EntityId,
    pub b: EntityId,
}

impl Contact {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        Self { a, b }
    }
}

/// The external rigid-body simulation
pub trait PhysicsWorld {
    fn set_gravity(&mut self, gravity: Vec2);
    fn spawn_body(&mut self, id: EntityId, desc: BodyDesc);
    fn remove_body(&mut self, id: EntityId);
    /// Teleport a body without simulating the path
    fn set_body_position(&mut self, id: EntityId, pos: Vec2);
    /// Enable or suspend a body's response to forces and collisions
    fn set_body_dynamic(&mut self, id: EntityId, dynamic: bool);
    fn body_position(&self, id: EntityId) -> Option<Vec2>;
    /// Integrate `dt` seconds and report contacts that began
    fn step(&mut self, dt: f32) -> Vec<Contact>;
}
