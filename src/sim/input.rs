//! Pointer / tilt to gravity mapping

use glam::Vec2;

use crate::settings::{InputMode, Settings};

/// Turns raw pointer and accelerometer samples into a world gravity vector
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    pub mode: InputMode,
    /// Last pointer position while a touch/drag is held
    pointer: Option<Vec2>,
    /// Last accelerometer reading (x, y)
    tilt: Option<Vec2>,
    gravity: Vec2,
}

impl InputMapper {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer_released(&mut self) {
        self.pointer = None;
    }

    pub fn tilt_sampled(&mut self, acceleration: Vec2) {
        self.tilt = Some(acceleration);
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Gravity from the previous update
    pub fn gravity(&self) -> Vec2 {
        self.gravity
    }

    /// Recompute gravity; keeps the previous value when there is nothing to
    /// compute it from
    pub fn update(&mut self, player_pos: Option<Vec2>, settings: &Settings) -> Vec2 {
        let next = match self.mode {
            InputMode::Pointer => self.pointer.zip(player_pos).map(|(pointer, player)| {
                pointer_gravity(pointer, player, settings.pointer_gravity_divisor)
            }),
            InputMode::Tilt => self
                .tilt
                .map(|acceleration| tilt_gravity(acceleration, settings.tilt_gravity_scale)),
        };
        if let Some(gravity) = next {
            self.gravity = gravity;
        }
        self.gravity
    }
}

/// Gravity pulling the player toward the pointer
#[inline]
pub fn pointer_gravity(pointer: Vec2, player: Vec2, divisor: f32) -> Vec2 {
    (pointer - player) / divisor
}

/// Gravity from an accelerometer reading held in landscape
#[inline]
pub fn tilt_gravity(acceleration: Vec2, scale: f32) -> Vec2 {
    Vec2::new(acceleration.y * -scale, acceleration.x * scale)
}
