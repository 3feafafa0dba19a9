//! Timed transitions: vortex death, teleport travel and teleport cooldowns
//!
//! Animations are plain state advanced by `advance` once per tick. A
//! transition always runs to completion; while one is active the player has
//! no physics response and contacts are ignored.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, EntityKind, GameEvent, WorldState};
use crate::consts::MIN_PLAYER_SCALE;
use crate::settings::Settings;
use crate::wrap_phase;

/// Timers within this many seconds of their target count as expired
const TIMER_EPSILON: f32 = 1e-4;

/// Player animation state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Transition {
    #[default]
    Idle,
    /// Swallowed by a vortex
    Dying(DyingSequence),
    /// Travelling between teleports
    Teleporting(TeleportSequence),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DyingPhase {
    /// Drawn into the vortex center
    Approach,
    /// Shrinks away, then respawns at the level start
    Shrink,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DyingSequence {
    pub phase: DyingPhase,
    /// Seconds spent in the current phase
    pub elapsed: f32,
    pub from: Vec2,
    pub vortex: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeleportPhase {
    /// Drawn into the entry teleport
    Approach,
    Shrink,
    /// Hidden at the destination
    Travel,
    /// Reappears at full scale
    Grow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeleportSequence {
    pub phase: TeleportPhase,
    /// Seconds spent in the current phase
    pub elapsed: f32,
    pub from: Vec2,
    pub entry: EntityId,
    pub entry_pos: Vec2,
    pub destination: EntityId,
    pub exit_pos: Vec2,
}

/// Start the vortex death sequence
///
/// Returns false (and changes nothing) if a transition is already running or
/// there is no player.
pub fn begin_dying(state: &mut WorldState, vortex: Vec2) -> bool {
    if state.is_transitioning() {
        return false;
    }
    let Some(from) = state.player().map(|p| p.pos) else {
        return false;
    };

    state.set_player_dynamic(false);
    state.transition = Transition::Dying(DyingSequence {
        phase: DyingPhase::Approach,
        elapsed: 0.0,
        from,
        vortex,
    });
    log::debug!("Player swallowed by vortex at {vortex}");
    true
}

/// Close a teleport for `cooldown` seconds
pub fn deactivate_teleport(state: &mut WorldState, id: EntityId, cooldown: f32) -> bool {
    let Some(teleport) = state.entity_mut(id) else {
        return false;
    };
    if teleport.kind != EntityKind::Teleport {
        return false;
    }

    let was_active = teleport.active;
    teleport.active = false;
    teleport.cooldown = teleport.cooldown.max(cooldown);
    if was_active {
        state.push_event(GameEvent::TeleportDeactivated { id });
    }
    true
}

/// Pick a random open teleport other than `entry`
pub fn pick_destination<R: Rng + ?Sized>(
    state: &WorldState,
    entry: EntityId,
    rng: &mut R,
) -> Option<EntityId> {
    let candidates: Vec<EntityId> = state
        .entities
        .iter()
        .filter(|e| e.is_open_teleport() && e.id != entry)
        .map(|e| e.id)
        .collect();
    candidates.choose(rng).copied()
}

/// Start moving the player from `entry` to `destination`
///
/// Closes the destination teleport. Returns false if a transition is already
/// running, there is no player, or either teleport is gone.
pub fn begin_teleport(
    state: &mut WorldState,
    entry: EntityId,
    destination: EntityId,
    settings: &Settings,
) -> bool {
    if state.is_transitioning() {
        return false;
    }
    let Some(entry_pos) = state.entity(entry).map(|e| e.pos) else {
        return false;
    };
    let Some(exit_pos) = state.entity(destination).map(|e| e.pos) else {
        return false;
    };
    let Some(from) = state.player().map(|p| p.pos) else {
        return false;
    };

    deactivate_teleport(state, destination, settings.teleport_cooldown);
    state.set_player_dynamic(false);
    state.transition = Transition::Teleporting(TeleportSequence {
        phase: TeleportPhase::Approach,
        elapsed: 0.0,
        from,
        entry,
        entry_pos,
        destination,
        exit_pos,
    });
    log::debug!("Teleporting {entry} -> {destination}");
    true
}

/// Advance cooldowns, spins and the active transition by `dt` seconds
pub fn advance(state: &mut WorldState, settings: &Settings, dt: f32) {
    advance_cooldowns(state, dt);
    advance_spin(state, settings.spin_speed, dt);
    advance_transition(state, settings, dt);
}

fn advance_cooldowns(state: &mut WorldState, dt: f32) {
    let mut reopened = Vec::new();
    for teleport in state
        .entities
        .iter_mut()
        .filter(|e| e.kind == EntityKind::Teleport && !e.active)
    {
        teleport.cooldown -= dt;
        if teleport.cooldown <= TIMER_EPSILON {
            teleport.cooldown = 0.0;
            teleport.active = true;
            reopened.push(teleport.id);
        }
    }
    for id in reopened {
        state.push_event(GameEvent::TeleportActivated { id });
    }
}

fn advance_spin(state: &mut WorldState, speed: f32, dt: f32) {
    for entity in state.entities.iter_mut().filter(|e| e.kind.spins()) {
        entity.spin = wrap_phase(entity.spin + speed * dt);
    }
}

fn advance_transition(state: &mut WorldState, settings: &Settings, dt: f32) {
    let mut budget = dt;
    loop {
        let crossed = match state.transition {
            Transition::Idle => return,
            Transition::Dying(seq) => {
                step_dying(state, seq, settings.vortex_step_duration, &mut budget)
            }
            Transition::Teleporting(seq) => {
                step_teleport(state, seq, settings.teleport_step_duration, &mut budget)
            }
        };
        if !crossed {
            return;
        }
    }
}

/// Spend time on a phase; returns (progress 0..=1, phase finished)
fn spend(elapsed: &mut f32, duration: f32, budget: &mut f32) -> (f32, bool) {
    if duration <= 0.0 {
        return (1.0, true);
    }
    let used = (duration - *elapsed).min(*budget).max(0.0);
    *elapsed += used;
    *budget -= used;
    if duration - *elapsed <= TIMER_EPSILON {
        (1.0, true)
    } else {
        (*elapsed / duration, false)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Returns true when a phase boundary was crossed
fn step_dying(
    state: &mut WorldState,
    mut seq: DyingSequence,
    duration: f32,
    budget: &mut f32,
) -> bool {
    let (t, done) = spend(&mut seq.elapsed, duration, budget);
    if let Some(player) = state.player.as_mut() {
        match seq.phase {
            DyingPhase::Approach => player.pos = seq.from.lerp(seq.vortex, t),
            DyingPhase::Shrink => player.scale = lerp(1.0, MIN_PLAYER_SCALE, t),
        }
    }

    if !done {
        state.transition = Transition::Dying(seq);
        return false;
    }

    match seq.phase {
        DyingPhase::Approach => {
            state.transition = Transition::Dying(DyingSequence {
                phase: DyingPhase::Shrink,
                elapsed: 0.0,
                ..seq
            });
        }
        DyingPhase::Shrink => {
            state.remove_player();
            state.transition = Transition::Idle;
            if state.respawn_player().is_none() {
                log::warn!("No player start recorded, cannot respawn");
            }
        }
    }
    true
}

/// Returns true when a phase boundary was crossed
fn step_teleport(
    state: &mut WorldState,
    mut seq: TeleportSequence,
    duration: f32,
    budget: &mut f32,
) -> bool {
    let (t, done) = spend(&mut seq.elapsed, duration, budget);
    if let Some(player) = state.player.as_mut() {
        match seq.phase {
            TeleportPhase::Approach => player.pos = seq.from.lerp(seq.entry_pos, t),
            TeleportPhase::Shrink => player.scale = lerp(1.0, MIN_PLAYER_SCALE, t),
            TeleportPhase::Travel => {
                player.pos = seq.exit_pos;
                player.visible = done;
            }
            TeleportPhase::Grow => player.scale = lerp(MIN_PLAYER_SCALE, 1.0, t),
        }
    }

    if !done {
        state.transition = Transition::Teleporting(seq);
        return false;
    }

    let next = match seq.phase {
        TeleportPhase::Approach => Some(TeleportPhase::Shrink),
        TeleportPhase::Shrink => Some(TeleportPhase::Travel),
        TeleportPhase::Travel => Some(TeleportPhase::Grow),
        TeleportPhase::Grow => None,
    };
    match next {
        Some(phase) => {
            state.transition = Transition::Teleporting(TeleportSequence {
                phase,
                elapsed: 0.0,
                ..seq
            });
        }
        None => {
            state.transition = Transition::Idle;
            state.set_player_dynamic(true);
            log::debug!("Teleport to {} complete", seq.destination);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const START: Vec2 = Vec2::new(32.0, 32.0);

    fn world_with_teleports(count: usize) -> (WorldState, Vec<EntityId>) {
        let mut state = WorldState::new();
        state.spawn_player(START);
        let ids = (0..count)
            .map(|i| state.spawn_entity(EntityKind::Teleport, Vec2::new(96.0 + 64.0 * i as f32, 160.0)))
            .collect();
        state.take_events();
        (state, ids)
    }

    #[test]
    fn test_pick_destination_excludes_entry_and_closed() {
        let (mut state, ids) = world_with_teleports(3);
        let mut rng = Pcg32::seed_from_u64(1);
        deactivate_teleport(&mut state, ids[1], 5.0);

        for _ in 0..50 {
            assert_eq!(pick_destination(&state, ids[0], &mut rng), Some(ids[2]));
        }
    }

    #[test]
    fn test_pick_destination_none_available() {
        let (mut state, ids) = world_with_teleports(2);
        let mut rng = Pcg32::seed_from_u64(1);
        assert_eq!(pick_destination(&state, ids[0], &mut rng), Some(ids[1]));

        deactivate_teleport(&mut state, ids[1], 5.0);
        assert_eq!(pick_destination(&state, ids[0], &mut rng), None);

        let (lonely, lone_ids) = world_with_teleports(1);
        assert_eq!(pick_destination(&lonely, lone_ids[0], &mut rng), None);
    }

    #[test]
    fn test_pick_destination_follows_seeded_rng() {
        let (state, ids) = world_with_teleports(4);
        let candidates = [ids[1], ids[2], ids[3]];

        let mut rng = Pcg32::seed_from_u64(99);
        let mut expected_rng = Pcg32::seed_from_u64(99);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let picked = pick_destination(&state, ids[0], &mut rng).unwrap();
            let expected = *candidates.choose(&mut expected_rng).unwrap();
            assert_eq!(picked, expected);
            seen.insert(picked);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_cooldowns_are_independent() {
        let (mut state, ids) = world_with_teleports(2);
        let settings = Settings::default();

        deactivate_teleport(&mut state, ids[0], settings.teleport_cooldown);
        advance(&mut state, &settings, 2.0);
        deactivate_teleport(&mut state, ids[1], settings.teleport_cooldown);

        advance(&mut state, &settings, 2.5);
        assert!(!state.entity(ids[0]).unwrap().active);

        advance(&mut state, &settings, 0.5);
        assert!(state.entity(ids[0]).unwrap().active);
        assert!(!state.entity(ids[1]).unwrap().active);

        advance(&mut state, &settings, 2.0);
        assert!(state.entity(ids[1]).unwrap().active);

        let events = state.take_events();
        assert_eq!(
            events,
            vec![
                GameEvent::TeleportDeactivated { id: ids[0] },
                GameEvent::TeleportDeactivated { id: ids[1] },
                GameEvent::TeleportActivated { id: ids[0] },
                GameEvent::TeleportActivated { id: ids[1] },
            ]
        );
    }

    #[test]
    fn test_cooldown_with_fixed_timestep() {
        let (mut state, ids) = world_with_teleports(1);
        let settings = Settings::default();
        deactivate_teleport(&mut state, ids[0], settings.teleport_cooldown);

        let dt = crate::consts::SIM_DT;
        for _ in 0..299 {
            advance(&mut state, &settings, dt);
        }
        assert!(!state.entity(ids[0]).unwrap().active);
        advance(&mut state, &settings, dt);
        assert!(state.entity(ids[0]).unwrap().active);
    }

    #[test]
    fn test_dying_sequence() {
        let (mut state, _) = world_with_teleports(0);
        let settings = Settings::default();
        let vortex = Vec2::new(160.0, 32.0);
        let first_id = state.player().unwrap().id;

        assert!(begin_dying(&mut state, vortex));
        assert!(state.is_transitioning());
        assert!(!state.player().unwrap().dynamic);
        assert!(!begin_dying(&mut state, vortex));

        advance(&mut state, &settings, 0.125);
        assert_eq!(state.player().unwrap().pos, Vec2::new(96.0, 32.0));

        advance(&mut state, &settings, 0.125);
        assert_eq!(state.player().unwrap().pos, vortex);
        assert_eq!(state.player().unwrap().scale, 1.0);

        advance(&mut state, &settings, 0.25);
        assert!(!state.is_transitioning());
        let player = state.player().expect("respawned");
        assert_ne!(player.id, first_id);
        assert_eq!(player.pos, START);
        assert_eq!(player.scale, 1.0);
        assert!(player.dynamic);
    }

    #[test]
    fn test_teleport_sequence() {
        let (mut state, ids) = world_with_teleports(2);
        let settings = Settings::default();
        let entry_pos = state.entity(ids[0]).unwrap().pos;
        let exit_pos = state.entity(ids[1]).unwrap().pos;

        assert!(begin_teleport(&mut state, ids[0], ids[1], &settings));
        assert!(!state.entity(ids[1]).unwrap().active);
        assert!(!state.player().unwrap().dynamic);

        advance(&mut state, &settings, 0.25);
        assert_eq!(state.player().unwrap().pos, entry_pos);

        advance(&mut state, &settings, 0.25);
        assert_eq!(state.player().unwrap().scale, MIN_PLAYER_SCALE);

        advance(&mut state, &settings, 0.1);
        let player = state.player().unwrap();
        assert_eq!(player.pos, exit_pos);
        assert!(!player.visible);

        advance(&mut state, &settings, 0.15);
        assert!(state.player().unwrap().visible);
        assert!(state.is_transitioning());

        advance(&mut state, &settings, 0.25);
        assert!(!state.is_transitioning());
        let player = state.player().unwrap();
        assert_eq!(player.pos, exit_pos);
        assert_eq!(player.scale, 1.0);
        assert!(player.dynamic);
        assert!(player.visible);
    }

    #[test]
    fn test_long_tick_finishes_whole_sequence() {
        let (mut state, ids) = world_with_teleports(2);
        let settings = Settings::default();

        assert!(begin_teleport(&mut state, ids[0], ids[1], &settings));
        advance(&mut state, &settings, 3.0);
        assert!(!state.is_transitioning());
        assert!(state.player().unwrap().dynamic);
        assert!(!state.entity(ids[1]).unwrap().active);
    }

    #[test]
    fn test_spin_wraps() {
        let (mut state, ids) = world_with_teleports(1);
        let settings = Settings::default();
        for _ in 0..5 {
            advance(&mut state, &settings, 1.0);
        }
        let spin = state.entity(ids[0]).unwrap().spin;
        assert!((0.0..std::f32::consts::TAU).contains(&spin));
        assert!((spin - std::f32::consts::PI).abs() < 1e-3);
    }
}
