//! Game loop
//!
//! Order within one tick: input → gravity → physics step → contacts →
//! transitions. World changes are mirrored into the physics engine and
//! handed back to the caller as events.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::body::{BodyDesc, PhysicsWorld};
use super::contact::resolve_contact;
use super::input::InputMapper;
use super::level::{LevelError, LevelSource};
use super::state::{GameEvent, LevelLoad, WorldState};
use super::teleport;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::settings::Settings;

/// Touch / mouse input for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Touch began (also restarts a finished game)
    Down(Vec2),
    Moved(Vec2),
    Up,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub pointer: Option<PointerInput>,
    /// Accelerometer reading, if one arrived
    pub tilt: Option<Vec2>,
}

/// Owns the world and drives it from host ticks
pub struct GameController<L: LevelSource> {
    state: WorldState,
    levels: L,
    settings: Settings,
    input: InputMapper,
    rng: Pcg32,
    accumulator: f32,
    /// Pointer events waiting for the next fixed step, oldest first
    pending_pointer: Vec<PointerInput>,
    /// Latest tilt sample waiting for the next fixed step
    pending_tilt: Option<Vec2>,
}

impl<L: LevelSource> GameController<L> {
    pub fn new(levels: L, settings: Settings) -> Self {
        Self {
            state: WorldState::new(),
            input: InputMapper::new(settings.input_mode),
            rng: Pcg32::seed_from_u64(settings.seed),
            levels,
            settings,
            accumulator: 0.0,
            pending_pointer: Vec::new(),
            pending_tilt: None,
        }
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn input(&self) -> &InputMapper {
        &self.input
    }

    /// Reset score and level and load level 1
    pub fn start_game(&mut self) -> Result<LevelLoad, LevelError> {
        self.state.start_game(&self.levels)
    }

    /// Advance one fixed step
    pub fn tick<P: PhysicsWorld + ?Sized>(
        &mut self,
        physics: &mut P,
        input: &TickInput,
        dt: f32,
    ) -> Result<Vec<GameEvent>, LevelError> {
        self.step(physics, input.pointer.as_slice(), input.tilt, dt)
    }

    fn step<P: PhysicsWorld + ?Sized>(
        &mut self,
        physics: &mut P,
        pointer: &[PointerInput],
        tilt: Option<Vec2>,
        dt: f32,
    ) -> Result<Vec<GameEvent>, LevelError> {
        let mut events = Vec::new();

        self.apply_input(pointer, tilt)?;

        let player_pos = self.state.player().map(|p| p.pos);
        let gravity = self.input.update(player_pos, &self.settings);
        physics.set_gravity(gravity);

        // Bodies created since the last tick must exist before stepping
        self.mirror_events(physics, &mut events);

        let contacts = physics.step(dt);
        self.sync_player(physics);

        for contact in contacts {
            resolve_contact(
                &mut self.state,
                &self.levels,
                &self.settings,
                &mut self.rng,
                contact.a,
                contact.b,
            )?;
        }

        teleport::advance(&mut self.state, &self.settings, dt);
        self.mirror_events(physics, &mut events);

        if let Some(player) = self.state.player().filter(|p| !p.dynamic) {
            physics.set_body_position(player.id, player.pos);
        }

        Ok(events)
    }

    /// Run as many fixed steps as `frame_dt` covers
    ///
    /// Input is queued and applied by the next step that runs, even when that
    /// step falls in a later frame. Frames longer than 0.1 s are clamped,
    /// non-finite frame times count as zero and at most `MAX_SUBSTEPS` steps
    /// run.
    pub fn advance_frame<P: PhysicsWorld + ?Sized>(
        &mut self,
        physics: &mut P,
        input: &TickInput,
        frame_dt: f32,
    ) -> Result<Vec<GameEvent>, LevelError> {
        self.pending_pointer.extend(input.pointer);
        if input.tilt.is_some() {
            self.pending_tilt = input.tilt;
        }

        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, 0.1)
        } else {
            0.0
        };
        self.accumulator += frame_dt;

        let mut events = Vec::new();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            // Cleared before stepping so queued input is consumed exactly once
            let pointer = std::mem::take(&mut self.pending_pointer);
            let tilt = self.pending_tilt.take();
            events.extend(self.step(physics, &pointer, tilt, SIM_DT)?);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        Ok(events)
    }

    fn apply_input(
        &mut self,
        pointer: &[PointerInput],
        tilt: Option<Vec2>,
    ) -> Result<(), LevelError> {
        for event in pointer {
            match *event {
                PointerInput::Down(pos) => {
                    self.input.pointer_moved(pos);
                    if self.state.sequence_finished {
                        self.start_game()?;
                    }
                }
                PointerInput::Moved(pos) => self.input.pointer_moved(pos),
                PointerInput::Up => self.input.pointer_released(),
            }
        }
        if let Some(acceleration) = tilt {
            self.input.tilt_sampled(acceleration);
        }
        Ok(())
    }

    /// Read the simulated player position back while physics drives it
    fn sync_player<P: PhysicsWorld + ?Sized>(&mut self, physics: &P) {
        if let Some(player) = self.state.player.as_mut().filter(|p| p.dynamic) {
            if let Some(pos) = physics.body_position(player.id) {
                player.pos = pos;
            }
        }
    }

    fn mirror_events<P: PhysicsWorld + ?Sized>(
        &mut self,
        physics: &mut P,
        out: &mut Vec<GameEvent>,
    ) {
        for event in self.state.take_events() {
            match event {
                GameEvent::EntitySpawned { id, kind, pos } => {
                    physics.spawn_body(id, BodyDesc::for_kind(kind, pos));
                }
                GameEvent::EntityRemoved { id, .. } => physics.remove_body(id),
                GameEvent::PlayerDynamicsChanged { id, dynamic } => {
                    if dynamic {
                        if let Some(player) = self.state.player().filter(|p| p.id == id) {
                            physics.set_body_position(id, player.pos);
                        }
                    }
                    physics.set_body_dynamic(id, dynamic);
                }
                _ => {}
            }
            out.push(event);
        }
    }
}
