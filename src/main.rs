//! Typing Defense headless runner
//!
//! Plays one seeded run with a scripted typist against a manual clock and
//! prints a JSON summary. The first argument is either a difficulty preset
//! (`easy`, `normal`, `hard`) or a path to a settings JSON file.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::collections::BTreeMap;

    use serde::Serialize;
    use typing_defense::Settings;
    use typing_defense::sim::{Clock, Driver, GameEvent, GamePhase, GameState, Key, ManualClock};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Roughly 80 words per minute
    const KEYSTROKE_MS: f64 = 150.0;
    const MAX_RUN_MS: f64 = 30.0 * 60.0 * 1000.0;

    #[derive(Debug, Default, Serialize)]
    pub struct Summary {
        seed: u64,
        outcome: String,
        wave: u32,
        score: u64,
        kills: u32,
        level: u32,
        survived_ms: f64,
        shots: u32,
        wrong_inputs: u32,
        barrages: u32,
        relics: Vec<String>,
        skills: BTreeMap<String, u32>,
    }

    /// Types the word of the nearest target one key at a time
    #[derive(Debug, Default)]
    struct Typist {
        next_key_at: f64,
        word: Option<String>,
    }

    impl Typist {
        fn choose(state: &GameState) -> Option<String> {
            if let Some(star) = state.relic_stars.first() {
                return Some(star.word.clone());
            }
            let nearest = *state.nearest_enemies(state.player.pos, &[]).first()?;
            state.enemy(nearest).map(|e| e.word.clone())
        }

        fn on_screen(state: &GameState, word: &str) -> bool {
            state.enemies.iter().any(|e| e.word == word)
                || state.relic_stars.iter().any(|s| s.word == word)
        }

        fn act(&mut self, driver: &mut Driver<ManualClock>, now_ms: f64) {
            if now_ms < self.next_key_at || driver.state().is_effectively_paused() {
                return;
            }
            self.next_key_at = now_ms + KEYSTROKE_MS;

            let state = driver.state();
            let typed = state.typing.text.clone();
            if typed.is_empty() {
                self.word = Self::choose(state);
            }
            let Some(word) = self.word.clone() else {
                return;
            };
            // Word changed or its owner is gone: start over without a penalty
            if !word.starts_with(&typed) || !Self::on_screen(state, &word) {
                driver.key(Key::Enter);
                self.word = None;
                return;
            }
            if let Some(c) = word.chars().nth(typed.chars().count()) {
                driver.key(Key::Char(c));
            }
        }
    }

    pub fn run(settings: Settings) -> Summary {
        let mut summary = Summary {
            seed: settings.seed,
            ..Summary::default()
        };
        let mut driver = Driver::new(settings, ManualClock::new(0.0));
        let mut typist = Typist::default();

        while driver.is_running() {
            driver.clock_mut().advance(FRAME_MS);
            if driver.clock().now_ms() >= MAX_RUN_MS {
                log::warn!("Run exceeded {} ms, stopping", MAX_RUN_MS);
                driver.stop();
                break;
            }

            for event in driver.frame().unwrap_or_default() {
                match event {
                    GameEvent::ShotFired { primary: true, .. } => summary.shots += 1,
                    GameEvent::WrongInput => summary.wrong_inputs += 1,
                    GameEvent::Barrage { .. } => summary.barrages += 1,
                    _ => {}
                }
            }

            if driver.state().level_up.is_some() {
                driver.choose_skill(0);
            }
            if driver.state().relic_announcement.is_some() {
                driver.close_relic_announcement();
            }
            let now = driver.clock().now_ms();
            typist.act(&mut driver, now);
        }

        let state = driver.state();
        summary.outcome = match state.phase {
            GamePhase::Won => "won",
            GamePhase::Lost => "lost",
            GamePhase::Playing => "stopped",
        }
        .to_string();
        summary.wave = state.wave;
        summary.score = state.score;
        summary.kills = state.kills;
        summary.level = state.player.level;
        summary.survived_ms = state.elapsed_ms(state.now_ms);
        summary.relics = state
            .player
            .relics
            .iter()
            .map(|r| r.descriptor().name.to_string())
            .collect();
        summary.skills = state
            .player
            .skills
            .iter()
            .map(|(skill, level)| (skill.name().to_string(), *level))
            .collect();
        summary
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use typing_defense::{Difficulty, Settings};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Typing Defense (headless) starting...");

    let settings = match std::env::args().nth(1) {
        None => Settings::default(),
        Some(arg) => match Difficulty::parse(&arg) {
            Some(difficulty) => Settings::from_difficulty(difficulty),
            None => Settings::load(&arg).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                Settings::default()
            }),
        },
    };

    let summary = demo::run(settings);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to encode summary: {e}"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page; nothing to run here
}
