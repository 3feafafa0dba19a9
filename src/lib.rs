//! Tilt Maze - a gravity-steered maze arcade game
//!
//! Core modules:
//! - `sim`: Level parsing, world state, contact rules and timed transitions
//! - `settings`: Tunable durations, scales and scoring

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Side length of one level grid cell in world units
    pub const CELL_SIZE: f32 = 64.0;

    /// Scale the player shrinks to when swallowed (never exactly zero)
    pub const MIN_PLAYER_SCALE: f32 = 0.0001;
    /// Player physics body linear damping
    pub const PLAYER_LINEAR_DAMPING: f32 = 0.5;
}

/// World-space center of the grid cell at (column, row), row 0 at the bottom
#[inline]
pub fn cell_center(column: usize, row: usize) -> Vec2 {
    let half = consts::CELL_SIZE / 2.0;
    Vec2::new(
        consts::CELL_SIZE * column as f32 + half,
        consts::CELL_SIZE * row as f32 + half,
    )
}

/// Wrap a rotation phase to [0, 2π)
#[inline]
pub fn wrap_phase(angle: f32) -> f32 {
    angle.rem_euclid(std::f32::consts::TAU)
}
