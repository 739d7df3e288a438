//! Typing Defense - an arcade typing game
//!
//! Earth sits in the middle of the screen while enemies close in from the
//! edges. Each enemy carries a word; typing it fires at that enemy.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, typing, combat, projectiles, pause)
//! - `settings`: Runtime configuration and difficulty presets
//! - `words`: Word pool used for enemies and relic stars

pub mod settings;
pub mod sim;
pub mod words;

pub use settings::{Difficulty, Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Target frame rate of the simulation driver
    pub const TARGET_FPS: f64 = 60.0;
    /// Longest delta time a single tick will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Host callbacks this close to the frame interval still count as a frame
    pub const FRAME_SLACK_MS: f64 = 1.0;

    /// Default canvas dimensions
    pub const CANVAS_WIDTH: f32 = 1280.0;
    pub const CANVAS_HEIGHT: f32 = 720.0;
    /// Enemies further than this past the canvas edge are culled
    pub const OFFSCREEN_MARGIN: f32 = 200.0;
    /// Smallest cull margin that still clears the widest spawn inset
    pub const MIN_OFFSCREEN_MARGIN: f32 = ENEMY_RADIUS * BOSS_RADIUS_MULT;

    /// Survive this long (non-paused) to win: 20 minutes
    pub const WIN_TIME_MS: f64 = 1_200_000.0;

    /// Player (Earth) defaults
    pub const PLAYER_RADIUS: f32 = 30.0;
    pub const PLAYER_MAX_SHIELD: f32 = 100.0;
    /// Shield regained per second
    pub const PLAYER_SHIELD_REGEN: f32 = 0.5;
    pub const BASE_DAMAGE: f32 = 10.0;
    pub const BASE_CRIT_CHANCE: f32 = 0.05;
    pub const BASE_CRIT_MULTIPLIER: f32 = 2.0;
    /// Projectile travel speed (pixels/s)
    pub const BASE_PROJECTILE_SPEED: f32 = 900.0;
    pub const BASE_PROJECTILE_SIZE: f32 = 4.0;
    /// Hit budget of a fresh projectile
    pub const BASE_PROJECTILE_DURABILITY: f32 = 1.0;
    /// Durability spent per enemy hit
    pub const DURABILITY_PER_HIT: f32 = 1.0;
    pub const BASE_BOUNCE_RANGE: f32 = 180.0;

    /// Shield lost when a keystroke matches nothing
    pub const WRONG_INPUT_PENALTY: f32 = 2.0;
    /// Red flash on the last highlighted target (seconds)
    pub const WRONG_FLASH_SECS: f32 = 0.3;

    /// Enemy health tiers
    pub const ENEMY_BASE_HEALTH: f32 = 10.0;
    pub const ENEMY_HEALTH_PER_WAVE: f32 = 4.0;
    pub const ENEMY_HEALTH_PER_LATE_WAVE: f32 = 2.0;
    pub const ENEMY_HEALTH_TIER_WAVE: u32 = 20;

    /// Enemy geometry and motion
    pub const ENEMY_RADIUS: f32 = 18.0;
    pub const ENEMY_SPEED: f32 = 40.0;
    pub const ELITE_SPEED: f32 = 32.0;
    pub const BOSS_SPEED: f32 = 22.0;
    /// Per-wave speed growth, applied for at most `ENEMY_SPEED_WAVE_CAP` waves
    pub const ENEMY_SPEED_PER_WAVE: f32 = 0.015;
    pub const ENEMY_SPEED_WAVE_CAP: u32 = 30;

    /// Rank multipliers (health, score, radius)
    pub const ELITE_HEALTH_MULT: f32 = 3.0;
    pub const ELITE_SCORE_MULT: u64 = 3;
    pub const ELITE_RADIUS_MULT: f32 = 1.4;
    pub const BOSS_HEALTH_MULT: f32 = 8.0;
    pub const BOSS_SCORE_MULT: u64 = 10;
    pub const BOSS_RADIUS_MULT: f32 = 2.0;

    /// Rewards
    pub const BASE_POINTS: u64 = 10;
    pub const POINTS_PER_WAVE: u64 = 2;
    pub const BASE_XP: u32 = 10;

    /// Damage dealt to the shield on contact
    pub const COLLISION_DAMAGE_NORMAL: f32 = 25.0;
    pub const COLLISION_DAMAGE_ELITE: f32 = 40.0;
    pub const COLLISION_DAMAGE_BOSS: f32 = 60.0;

    /// Status effects
    pub const FREEZE_DURATION_MS: f64 = 3000.0;
    pub const FREEZE_SPEED_FACTOR: f32 = 0.3;
    pub const BURN_CHANCE: f32 = 0.35;
    pub const BURN_DURATION_MS: f64 = 3000.0;
    pub const BURN_TICK_MS: f64 = 500.0;
    /// Burn tick damage as a fraction of the player's hit damage
    pub const BURN_DAMAGE_FRACTION: f32 = 0.25;
    /// On-death burst radius of Frost/Ember enemies
    pub const SPECIAL_BURST_RADIUS: f32 = 120.0;

    /// Leveling
    pub const BASE_XP_TO_LEVEL: u32 = 50;
    pub const XP_GROWTH: f32 = 1.5;
    pub const LEVEL_UP_DAMAGE_BONUS: f32 = 1.0;
    pub const LEVEL_UP_SHIELD_BONUS: f32 = 5.0;
    pub const LEVEL_UP_CHOICES: usize = 3;

    /// Spawn scheduling
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 2500.0;
    pub const SPAWN_INTERVAL_STEP_MS: f64 = 100.0;
    pub const MIN_SPAWN_INTERVAL_MS: f64 = 600.0;
    pub const MIN_ENEMY_CAP: usize = 3;
    pub const BASE_WAVE_ENEMIES: u32 = 8;
    pub const WAVE_ENEMIES_STEP: u32 = 2;
    /// Highest wave a run may be configured to start on
    pub const MAX_START_WAVE: u32 = 10_000;

    /// Elite/boss chance tables (wave-scaled, capped)
    pub const ELITE_START_WAVE: u32 = 3;
    pub const ELITE_BASE_CHANCE: f32 = 0.05;
    pub const ELITE_CHANCE_PER_WAVE: f32 = 0.02;
    pub const ELITE_MAX_CHANCE: f32 = 0.25;
    pub const BOSS_START_WAVE: u32 = 5;
    pub const BOSS_BASE_CHANCE: f32 = 0.02;
    pub const BOSS_CHANCE_PER_WAVE: f32 = 0.01;
    pub const BOSS_MAX_CHANCE: f32 = 0.10;

    /// Special (Frost/Ember) enemy chances
    pub const SPECIAL_START_WAVE: u32 = 2;
    pub const SPECIAL_BASE_CHANCE: f32 = 0.05;
    pub const SPECIAL_CHANCE_PER_SKILL: f32 = 0.05;
    pub const SPECIAL_CHANCE_PER_WAVE: f32 = 0.005;
    pub const SPECIAL_MAX_CHANCE: f32 = 0.3;

    /// Relic stars
    pub const RELIC_SPAWN_MIN_MS: f64 = 30_000.0;
    pub const RELIC_SPAWN_MAX_MS: f64 = 60_000.0;
    pub const RELIC_STAR_SPEED: f32 = 60.0;
    pub const RELIC_STAR_RADIUS: f32 = 16.0;

    /// Multi-shot echoes are staggered by this much
    pub const MULTI_SHOT_STAGGER_MS: f64 = 80.0;

    /// Auto-fire interval per skill level
    pub const AUTO_FIRE_BASE_INTERVAL_MS: f64 = 3000.0;
    pub const AUTO_FIRE_INTERVAL_STEP_MS: f64 = 400.0;
    pub const AUTO_FIRE_MIN_INTERVAL_MS: f64 = 800.0;

    /// Elemental mastery kill thresholds
    pub const MASTERY_BASE_THRESHOLD: u32 = 15;
    pub const MASTERY_THRESHOLD_STEP: u32 = 2;
    pub const MASTERY_MIN_THRESHOLD: u32 = 5;
    pub const MASTERY_BASE_TARGETS: usize = 3;
    pub const FIRE_BARRAGE_AOE: f32 = 70.0;

    /// Cosmetic effects
    pub const EXPLOSION_RATE: f32 = 2.0;
    pub const FLOATING_TEXT_RATE: f32 = 1.0;
    pub const FLOATING_TEXT_RISE: f32 = 40.0;
    pub const PARTICLES_PER_EXPLOSION: usize = 10;
    pub const PARTICLE_DECAY: f32 = 0.92;
    pub const MIN_PARTICLE_SIZE: f32 = 0.5;
    pub const SCREEN_FLASH_DECAY: f32 = 0.9;
}

/// `num / den`, or 0 when the denominator is zero (or not finite)
#[inline]
pub fn ratio_or_zero(num: f32, den: f32) -> f32 {
    if den.abs() <= f32::EPSILON || !den.is_finite() {
        0.0
    } else {
        num / den
    }
}

/// Unit vector from `from` toward `to`, zero for coincident points
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Distance from `point` to segment `a`-`b`, plus the segment parameter
/// `t` in [0, 1] of the closest point
pub fn point_segment_distance(point: Vec2, a: Vec2, b: Vec2) -> (f32, f32) {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < 0.0001 {
        return (point.distance(a), 0.0);
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = a + seg * t;
    (point.distance(closest), t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(5.0, f32::INFINITY), 0.0);
        assert!((ratio_or_zero(5.0, 10.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);

        let (d, t) = point_segment_distance(Vec2::new(5.0, 3.0), a, b);
        assert!((d - 3.0).abs() < 1e-5);
        assert!((t - 0.5).abs() < 1e-5);

        // Past the end clamps to the endpoint
        let (d, t) = point_segment_distance(Vec2::new(14.0, 3.0), a, b);
        assert!((d - 5.0).abs() < 1e-5);
        assert_eq!(t, 1.0);
    }

    #[test]
    fn test_degenerate_segment() {
        let p = Vec2::new(3.0, 4.0);
        let (d, t) = point_segment_distance(p, Vec2::ZERO, Vec2::ZERO);
        assert!((d - 5.0).abs() < 1e-5);
        assert_eq!(t, 0.0);
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }
}
