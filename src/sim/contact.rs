//! Contact rules
//!
//! The physics engine reports contact-begin pairs by entity id. Only pairs
//! involving the player matter; everything else, and anything arriving while
//! a transition runs, is ignored.

use rand::Rng;

use super::level::{LevelError, LevelSource};
use super::state::{EntityId, EntityKind, LevelLoad, WorldState};
use super::teleport;
use crate::settings::Settings;

/// What a contact did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Not a player contact, stale, or suppressed by a running transition
    Ignored,
    StarCollected { star: EntityId },
    VortexEntered { vortex: EntityId },
    /// Finish reached and the next level loaded
    LevelCompleted { level: u32 },
    /// Finish reached but there is no next level
    SequenceFinished,
    Teleported { entry: EntityId, destination: EntityId },
    /// Entry teleport closed but no open destination existed
    TeleportUnpaired { entry: EntityId },
}

/// Apply one contact-begin between entities `a` and `b`
pub fn resolve_contact<R: Rng + ?Sized>(
    state: &mut WorldState,
    levels: &dyn LevelSource,
    settings: &Settings,
    rng: &mut R,
    a: EntityId,
    b: EntityId,
) -> Result<ContactOutcome, LevelError> {
    if state.is_transitioning() {
        log::trace!("Contact {a}/{b} ignored during transition");
        return Ok(ContactOutcome::Ignored);
    }

    let other = if state.is_player(a) {
        b
    } else if state.is_player(b) {
        a
    } else {
        return Ok(ContactOutcome::Ignored);
    };

    let Some(entity) = state.entity(other) else {
        log::trace!("Contact with removed entity {other}");
        return Ok(ContactOutcome::Ignored);
    };
    let (kind, pos, active) = (entity.kind, entity.pos, entity.active);

    let outcome = match kind {
        EntityKind::Vortex => {
            state.adjust_score(-settings.vortex_penalty);
            teleport::begin_dying(state, pos);
            ContactOutcome::VortexEntered { vortex: other }
        }
        EntityKind::Star => {
            state.remove_entity(other);
            state.adjust_score(settings.star_points);
            ContactOutcome::StarCollected { star: other }
        }
        EntityKind::Finish => {
            state.adjust_score(settings.finish_points);
            let next = state.level + 1;
            match state.load_level(next, levels)? {
                LevelLoad::Loaded { level, .. } => ContactOutcome::LevelCompleted { level },
                LevelLoad::SequenceFinished { .. } => ContactOutcome::SequenceFinished,
            }
        }
        EntityKind::Teleport => {
            if !active {
                return Ok(ContactOutcome::Ignored);
            }
            teleport::deactivate_teleport(state, other, settings.teleport_cooldown);
            match teleport::pick_destination(state, other, rng) {
                Some(destination) => {
                    teleport::begin_teleport(state, other, destination, settings);
                    ContactOutcome::Teleported {
                        entry: other,
                        destination,
                    }
                }
                None => ContactOutcome::TeleportUnpaired { entry: other },
            }
        }
        EntityKind::Wall | EntityKind::Player => ContactOutcome::Ignored,
    };

    log::debug!("Contact with {} {}: {:?}", kind.as_str(), other, outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::LevelList;
    use crate::sim::teleport::advance;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    struct Fixture {
        state: WorldState,
        levels: LevelList,
        settings: Settings,
        rng: Pcg32,
    }

    impl Fixture {
        fn new(levels: &[&str]) -> Self {
            let levels = LevelList::new(levels.iter().copied());
            let mut state = WorldState::new();
            state.start_game(&levels).expect("level 1 loads");
            Self {
                state,
                levels,
                settings: Settings::default(),
                rng: Pcg32::seed_from_u64(7),
            }
        }

        fn player(&self) -> EntityId {
            self.state.player().expect("player present").id
        }

        fn first(&self, kind: EntityKind) -> EntityId {
            self.state.entities_of(kind).next().expect("entity present").id
        }

        fn touch(&mut self, other: EntityId) -> ContactOutcome {
            let player = self.player();
            resolve_contact(
                &mut self.state,
                &self.levels,
                &self.settings,
                &mut self.rng,
                player,
                other,
            )
            .expect("contact resolves")
        }

        fn run(&mut self, seconds: f32) {
            advance(&mut self.state, &self.settings, seconds);
        }
    }

    #[test]
    fn test_non_player_contacts_ignored() {
        let mut fx = Fixture::new(&["p s v\nxxxxx"]);
        let star = fx.first(EntityKind::Star);
        let vortex = fx.first(EntityKind::Vortex);

        let outcome =
            resolve_contact(&mut fx.state, &fx.levels, &fx.settings, &mut fx.rng, star, vortex)
                .unwrap();
        assert_eq!(outcome, ContactOutcome::Ignored);
        assert_eq!(fx.state.score, 0);
    }

    #[test]
    fn test_player_on_either_side() {
        let mut fx = Fixture::new(&["p s s\nxxxxx"]);
        let player = fx.player();
        let star = fx.first(EntityKind::Star);

        let outcome =
            resolve_contact(&mut fx.state, &fx.levels, &fx.settings, &mut fx.rng, star, player)
                .unwrap();
        assert_eq!(outcome, ContactOutcome::StarCollected { star });
        assert_eq!(fx.state.score, 1);
    }

    #[test]
    fn test_star_collected_once() {
        let mut fx = Fixture::new(&["p s\nxxx"]);
        let star = fx.first(EntityKind::Star);

        assert_eq!(fx.touch(star), ContactOutcome::StarCollected { star });
        assert_eq!(fx.state.score, 1);
        assert!(fx.state.entity(star).is_none());

        assert_eq!(fx.touch(star), ContactOutcome::Ignored);
        assert_eq!(fx.state.score, 1);
    }

    #[test]
    fn test_vortex_penalty_once_then_respawn() {
        let mut fx = Fixture::new(&["p v\nxxx"]);
        let vortex = fx.first(EntityKind::Vortex);
        let start = fx.state.player_start.unwrap();

        assert_eq!(fx.touch(vortex), ContactOutcome::VortexEntered { vortex });
        assert_eq!(fx.state.score, -1);
        assert!(fx.state.is_transitioning());

        assert_eq!(fx.touch(vortex), ContactOutcome::Ignored);
        assert_eq!(fx.state.score, -1);

        fx.run(0.5);
        assert!(!fx.state.is_transitioning());
        let player = fx.state.player().unwrap();
        assert_eq!(player.pos, start);
        assert!(player.dynamic);

        assert_eq!(fx.touch(vortex), ContactOutcome::VortexEntered { vortex });
        assert_eq!(fx.state.score, -2);
    }

    #[test]
    fn test_finish_advances_level() {
        let mut fx = Fixture::new(&["p f\nxxx", "x\npsx"]);
        fx.state.adjust_score(2);
        let finish = fx.first(EntityKind::Finish);

        assert_eq!(fx.touch(finish), ContactOutcome::LevelCompleted { level: 2 });
        assert_eq!(fx.state.score, 12);
        assert_eq!(fx.state.level, 2);
        assert_eq!(fx.state.count_of(EntityKind::Star), 1);
        assert_eq!(fx.state.count_of(EntityKind::Finish), 0);
        assert_eq!(fx.state.player().unwrap().pos, Vec2::new(32.0, 32.0));
    }

    #[test]
    fn test_finish_on_last_level_keeps_score() {
        let mut fx = Fixture::new(&["p f\nxxx"]);
        fx.state.adjust_score(3);
        let finish = fx.first(EntityKind::Finish);

        assert_eq!(fx.touch(finish), ContactOutcome::SequenceFinished);
        assert!(fx.state.sequence_finished);
        assert_eq!(fx.state.score, 13);
        assert_eq!(fx.state.level, 2);
        assert!(fx.state.player().is_none());
    }

    #[test]
    fn test_finish_into_malformed_level_is_fatal() {
        let mut fx = Fixture::new(&["p f\nxxx", "p?"]);
        let finish = fx.first(EntityKind::Finish);
        let player = fx.player();

        let err = resolve_contact(
            &mut fx.state,
            &fx.levels,
            &fx.settings,
            &mut fx.rng,
            player,
            finish,
        )
        .unwrap_err();
        assert!(matches!(err, LevelError::InvalidLevelFormat { level: 2, character: '?', .. }));
        assert!(fx.state.entities.is_empty());
    }

    #[test]
    fn test_teleport_round_trip() {
        let mut fx = Fixture::new(&["t  t\np  x"]);
        let teleports: Vec<EntityId> = fx.state.entities_of(EntityKind::Teleport).map(|t| t.id).collect();
        let (a, b) = (teleports[0], teleports[1]);
        let b_pos = fx.state.entity(b).unwrap().pos;

        assert_eq!(fx.touch(a), ContactOutcome::Teleported { entry: a, destination: b });
        assert!(!fx.state.entity(a).unwrap().active);
        assert!(!fx.state.entity(b).unwrap().active);

        fx.run(1.0);
        assert!(!fx.state.is_transitioning());
        assert_eq!(fx.state.player().unwrap().pos, b_pos);

        // Arriving on B does not bounce the player back
        assert_eq!(fx.touch(b), ContactOutcome::Ignored);

        fx.run(3.9);
        assert!(!fx.state.entity(a).unwrap().active);
        fx.run(0.1);
        assert!(fx.state.entity(a).unwrap().active);
        assert!(fx.state.entity(b).unwrap().active);
    }

    #[test]
    fn test_teleport_without_open_partner() {
        let mut fx = Fixture::new(&["t  t\np  x"]);
        let teleports: Vec<EntityId> = fx.state.entities_of(EntityKind::Teleport).map(|t| t.id).collect();
        let (a, b) = (teleports[0], teleports[1]);
        teleport::deactivate_teleport(&mut fx.state, b, fx.settings.teleport_cooldown);
        let before = fx.state.player().unwrap().pos;

        assert_eq!(fx.touch(a), ContactOutcome::TeleportUnpaired { entry: a });
        assert!(!fx.state.is_transitioning());
        assert_eq!(fx.state.player().unwrap().pos, before);
        assert!(fx.state.player().unwrap().dynamic);
        assert_eq!(fx.state.score, 0);
    }

    #[test]
    fn test_contacts_ignored_while_teleporting() {
        let mut fx = Fixture::new(&["tst\npvx"]);
        let teleport = fx.first(EntityKind::Teleport);
        let star = fx.first(EntityKind::Star);
        let vortex = fx.first(EntityKind::Vortex);

        assert!(matches!(fx.touch(teleport), ContactOutcome::Teleported { .. }));
        assert_eq!(fx.touch(star), ContactOutcome::Ignored);
        assert_eq!(fx.touch(vortex), ContactOutcome::Ignored);
        assert_eq!(fx.state.score, 0);
        assert!(fx.state.entity(star).is_some());
    }

    #[test]
    fn test_wall_contact_ignored() {
        let mut fx = Fixture::new(&["px"]);
        let wall = fx.first(EntityKind::Wall);
        assert_eq!(fx.touch(wall), ContactOutcome::Ignored);
    }
}
