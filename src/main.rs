//! Tilt Maze entry point
//!
//! Native builds run headless: validate the level set, play a short scripted
//! session against a passive physics stand-in and print the world snapshot.
//!
//! Usage: `tilt-maze [LEVEL_DIR] [SETTINGS_JSON]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::collections::HashMap;
    use std::process::ExitCode;

    use glam::Vec2;
    use tilt_maze::Settings;
    use tilt_maze::consts::SIM_DT;
    use tilt_maze::sim::{
        BodyDesc, Contact, EntityId, EntityKind, GameController, LevelError, LevelSource,
        PhysicsWorld, TickInput, parse_level,
    };

    /// Keeps bodies where the game puts them; never integrates or reports contacts
    #[derive(Default)]
    pub struct PassivePhysics {
        bodies: HashMap<EntityId, BodyDesc>,
    }

    impl PhysicsWorld for PassivePhysics {
        fn set_gravity(&mut self, _gravity: Vec2) {}

        fn spawn_body(&mut self, id: EntityId, desc: BodyDesc) {
            self.bodies.insert(id, desc);
        }

        fn remove_body(&mut self, id: EntityId) {
            self.bodies.remove(&id);
        }

        fn set_body_position(&mut self, id: EntityId, pos: Vec2) {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.pos = pos;
            }
        }

        fn set_body_dynamic(&mut self, id: EntityId, dynamic: bool) {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.dynamic = dynamic;
            }
        }

        fn body_position(&self, id: EntityId) -> Option<Vec2> {
            self.bodies.get(&id).map(|b| b.pos)
        }

        fn step(&mut self, _dt: f32) -> Vec<Contact> {
            Vec::new()
        }
    }

    /// Parse every level in sequence until one is missing
    fn validate_levels(levels: &dyn LevelSource) -> Result<u32, LevelError> {
        let mut number = 1;
        while let Some(text) = levels.level_text(number)? {
            let placements = parse_level(&text, number)?;
            let count = |kind: EntityKind| placements.iter().filter(|p| p.kind == kind).count();
            log::info!(
                "level{}.txt ok: {} walls, {} stars, {} vortices, {} teleports, {} finishes",
                number,
                count(EntityKind::Wall),
                count(EntityKind::Star),
                count(EntityKind::Vortex),
                count(EntityKind::Teleport),
                count(EntityKind::Finish),
            );
            number += 1;
        }
        Ok(number - 1)
    }

    pub fn run<L: LevelSource>(levels: L, settings: Settings) -> ExitCode {
        let level_count = match validate_levels(&levels) {
            Ok(0) => {
                log::error!("No levels found");
                return ExitCode::FAILURE;
            }
            Ok(count) => count,
            Err(err) => {
                log::error!("{err}");
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        };
        log::info!("{level_count} levels validated");

        let mut game = GameController::new(levels, settings);
        log::info!("Input mode: {}", game.settings().input_mode.as_str());
        let mut physics = PassivePhysics::default();
        if let Err(err) = game.start_game() {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }

        // One second of a gentle tilt toward the top-right
        let input = TickInput {
            tilt: Some(Vec2::new(0.2, -0.1)),
            ..Default::default()
        };
        for _ in 0..60 {
            if let Err(err) = game.tick(&mut physics, &input, SIM_DT) {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }
        log::info!(
            "Gravity {} with {} bodies after one second",
            game.input().gravity(),
            physics.bodies.len()
        );

        match serde_json::to_string_pretty(game.state()) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: could not serialize world: {err}");
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::path::PathBuf;
    use tilt_maze::Settings;
    use tilt_maze::sim::{LevelDirectory, builtin_levels};

    env_logger::init();
    log::info!("Tilt Maze (native) starting...");

    let mut args = std::env::args().skip(1);
    let level_dir = args.next().map(PathBuf::from);
    let settings_path = args.next().map(PathBuf::from);
    let settings = Settings::load(settings_path.as_deref());

    match level_dir {
        Some(dir) => {
            let levels = LevelDirectory::new(dir);
            log::info!("Loading levels from {}", levels.root().display());
            headless::run(levels, settings)
        }
        None => headless::run(builtin_levels(), settings),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host page drives GameController directly
}
