//! Wave and spawn scheduling
//!
//! Enemy spawns run on a repeating timer whose interval shrinks with the
//! wave. Relic stars run on an independent timer with randomized intervals.

use glam::Vec2;
use rand::Rng;

use super::factory::{
    build_enemy, edge_spawn_point, roll_kind, roll_rank, wave_enemy_count, word_tier,
};
use super::state::{EntityId, GameEvent, GameState, RelicStar, live_words};
use super::tick::is_offscreen;
use super::typing::{self, ClearReason};
use super::upgrades::{RelicId, pick_relic};
use crate::consts::*;
use crate::settings::Difficulty;
use crate::words::{WordTier, draw_word};

/// Time between enemy spawns for a wave
pub fn spawn_interval_ms(wave: u32, difficulty: Difficulty) -> f64 {
    let steps = wave.max(1).saturating_sub(1) as f64;
    let base = (BASE_SPAWN_INTERVAL_MS - steps * SPAWN_INTERVAL_STEP_MS).max(MIN_SPAWN_INTERVAL_MS);
    base * difficulty.spawn_interval_factor()
}

/// Maximum simultaneous live enemies for a wave
pub fn enemy_cap(wave: u32) -> usize {
    MIN_ENEMY_CAP.max((wave as usize).saturating_add(2))
}

/// Advance the enemy spawn timer, spawning when due
pub fn update_enemy_spawns(state: &mut GameState, now_ms: f64) -> Option<EntityId> {
    if state.is_over() || state.is_effectively_paused() {
        return None;
    }
    let interval = spawn_interval_ms(state.wave, state.settings.difficulty);
    let Some(next) = state.timers.next_enemy_spawn_at else {
        state.timers.next_enemy_spawn_at = Some(now_ms + interval);
        return None;
    };
    if now_ms < next {
        return None;
    }
    state.timers.next_enemy_spawn_at = Some(now_ms + interval);

    let under_cap = state.enemies.len() < enemy_cap(state.wave);
    let wave_has_more = state.wave_spawned < wave_enemy_count(state.wave);
    if under_cap && wave_has_more {
        Some(spawn_enemy(state))
    } else {
        None
    }
}

/// Spawn one enemy at a random edge, aimed at the center
pub fn spawn_enemy(state: &mut GameState) -> EntityId {
    let id = state.next_entity_id();
    let wave = state.wave;
    let center = state.center();
    let bounds = state.bounds();

    let rank = roll_rank(&mut state.rng, wave);
    let kind = roll_kind(&mut state.rng, wave, Some(&state.player));
    let tier = word_tier(&mut state.rng, rank, wave);
    let word = {
        let live = live_words(&state.enemies, &state.relic_stars);
        draw_word(&mut state.rng, tier, &live)
    };
    let inset = ENEMY_RADIUS * rank.radius_multiplier();
    let pos = edge_spawn_point(&mut state.rng, bounds, inset);
    let speed_factor = state.settings.difficulty.speed_factor();

    let enemy = build_enemy(id, rank, kind, pos, center, wave, word, speed_factor);
    log::debug!("Spawned {:?}/{:?} enemy {} '{}' at {:?}", enemy.rank, enemy.kind, id, enemy.word, pos);
    state.enemies.push(enemy);
    state.wave_spawned += 1;
    id
}

fn next_relic_delay<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random_range(RELIC_SPAWN_MIN_MS..RELIC_SPAWN_MAX_MS)
}

/// Advance the relic spawn timer, spawning a star when due
pub fn update_relic_spawns(state: &mut GameState, now_ms: f64) -> Option<EntityId> {
    if state.is_over() || state.is_effectively_paused() {
        return None;
    }
    let Some(next) = state.timers.next_relic_spawn_at else {
        let delay = next_relic_delay(&mut state.rng);
        state.timers.next_relic_spawn_at = Some(now_ms + delay);
        return None;
    };
    if now_ms < next {
        return None;
    }
    let delay = next_relic_delay(&mut state.rng);
    state.timers.next_relic_spawn_at = Some(now_ms + delay);
    spawn_relic_star(state, now_ms)
}

/// Spawn a relic star for an uncollected relic. Declines quietly when the
/// pool is exhausted.
pub fn spawn_relic_star(state: &mut GameState, now_ms: f64) -> Option<EntityId> {
    let in_flight: Vec<RelicId> = state.relic_stars.iter().map(|s| s.relic).collect();
    let Some(relic) = pick_relic(&mut state.rng, &state.player, &in_flight) else {
        log::debug!("Relic pool exhausted, skipping star spawn");
        return None;
    };

    let bounds = state.bounds();
    let pos = edge_spawn_point(&mut state.rng, bounds, RELIC_STAR_RADIUS);
    // Aim somewhere in the middle half so the star crosses the screen
    let aim = Vec2::new(
        state.rng.random_range(bounds.x * 0.25..bounds.x * 0.75),
        state.rng.random_range(bounds.y * 0.25..bounds.y * 0.75),
    );
    let vel = crate::direction_to(pos, aim) * RELIC_STAR_SPEED;
    let word = {
        let live = live_words(&state.enemies, &state.relic_stars);
        draw_word(&mut state.rng, WordTier::Medium, &live)
    };

    let id = state.next_entity_id();
    let ttl = relic.rarity().ttl_ms();
    log::debug!("Relic star {} carrying {:?} ('{}')", id, relic, word);
    state.relic_stars.push(RelicStar {
        id,
        relic,
        word,
        pos,
        vel,
        expires_at: now_ms + ttl,
        typed_progress: 0.0,
        highlighted: false,
        wrong_flash: 0.0,
    });
    state.push_event(GameEvent::RelicSpawned { relic });
    Some(id)
}

/// Move relic stars and drop the expired or departed ones
pub fn update_relic_stars(state: &mut GameState, dt: f32, now_ms: f64) {
    let margin = state.settings.offscreen_margin;
    let bounds = state.bounds();
    let mut expired = Vec::new();

    state.relic_stars.retain_mut(|star| {
        star.pos += star.vel * dt;
        let gone = is_offscreen(star.pos, bounds, margin);
        if now_ms >= star.expires_at || gone {
            expired.push(star.relic);
            false
        } else {
            true
        }
    });

    for relic in expired {
        log::debug!("Relic star {:?} expired", relic);
        state.push_event(GameEvent::RelicExpired { relic });
    }
}

/// Advance the wave once its quota is defeated and the field is clear.
/// Returns true if a new wave started.
pub fn check_wave_complete(state: &mut GameState, now_ms: f64) -> bool {
    if state.is_over() || state.is_effectively_paused() {
        return false;
    }
    if state.wave_defeated < wave_enemy_count(state.wave) || !state.enemies.is_empty() {
        return false;
    }

    let finished = state.wave;
    state.wave = state.wave.saturating_add(1);
    state.wave_spawned = 0;
    state.wave_defeated = 0;
    state.timers.next_enemy_spawn_at =
        Some(now_ms + spawn_interval_ms(state.wave, state.settings.difficulty));
    typing::clear(state, ClearReason::Auto);

    log::info!("Wave {} complete, starting wave {}", finished, state.wave);
    state.push_event(GameEvent::WaveComplete { wave: finished });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::EnemyRank;

    #[test]
    fn test_spawn_interval_decreases_with_floor() {
        let d = Difficulty::Normal;
        assert!(spawn_interval_ms(5, d) < spawn_interval_ms(1, d));
        assert_eq!(spawn_interval_ms(1000, d), MIN_SPAWN_INTERVAL_MS);
        assert!(spawn_interval_ms(1, Difficulty::Hard) < spawn_interval_ms(1, Difficulty::Easy));
    }

    #[test]
    fn test_timer_arms_then_spawns() {
        let mut state = GameState::new(Settings::default(), 0.0);
        assert!(update_enemy_spawns(&mut state, 0.0).is_none());
        let next = state.timers.next_enemy_spawn_at.unwrap();
        assert!(update_enemy_spawns(&mut state, next - 1.0).is_none());
        assert!(update_enemy_spawns(&mut state, next).is_some());
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.wave_spawned, 1);
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let cap = enemy_cap(state.wave);
        for _ in 0..cap {
            spawn_enemy(&mut state);
        }
        state.timers.next_enemy_spawn_at = Some(0.0);
        assert!(update_enemy_spawns(&mut state, 10.0).is_none());
        assert_eq!(state.enemies.len(), cap);
    }

    #[test]
    fn test_no_spawn_while_paused() {
        use crate::sim::pause::{PauseReason, start_pause};
        let mut state = GameState::new(Settings::default(), 0.0);
        state.timers.next_enemy_spawn_at = Some(0.0);
        start_pause(&mut state, PauseReason::Manual, 0.0);
        assert!(update_enemy_spawns(&mut state, 50_000.0).is_none());
        assert!(update_relic_spawns(&mut state, 500_000.0).is_none());
        assert!(state.enemies.is_empty());
    }

    #[test]
    fn test_wave_one_spawns_normal_ten_hp() {
        let mut state = GameState::new(Settings::default(), 0.0);
        for _ in 0..enemy_cap(1) {
            spawn_enemy(&mut state);
        }
        for enemy in &state.enemies {
            assert_eq!(enemy.rank, EnemyRank::Normal);
            assert_eq!(enemy.max_health, 10.0);
        }
    }

    #[test]
    fn test_relic_spawn_declines_when_exhausted() {
        let mut state = GameState::new(Settings::default(), 0.0);
        for relic in RelicId::ALL {
            state.player.relics.insert(relic);
        }
        assert!(spawn_relic_star(&mut state, 0.0).is_none());
        assert!(state.relic_stars.is_empty());
    }

    #[test]
    fn test_relic_star_expires() {
        let mut state = GameState::new(Settings::default(), 0.0);
        spawn_relic_star(&mut state, 0.0).unwrap();
        let expires = state.relic_stars[0].expires_at;
        update_relic_stars(&mut state, 0.0, expires - 1.0);
        assert_eq!(state.relic_stars.len(), 1);
        update_relic_stars(&mut state, 0.0, expires);
        assert!(state.relic_stars.is_empty());
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::RelicExpired { .. })));
    }

    #[test]
    fn test_wave_complete_requires_clear_field() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.wave_defeated = wave_enemy_count(1);
        spawn_enemy(&mut state);
        assert!(!check_wave_complete(&mut state, 0.0));

        state.enemies.clear();
        state.typing.text = "ab".into();
        assert!(check_wave_complete(&mut state, 0.0));
        assert_eq!(state.wave, 2);
        assert_eq!(state.wave_defeated, 0);
        assert!(state.typing.text.is_empty());
    }
}
