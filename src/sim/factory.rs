//! Enemy construction
//!
//! Health follows wave tiers: a flat one-hit value on wave 1, additive growth
//! up to wave 20, slower growth after that. Velocity is fixed at spawn and
//! points at the exact screen center.

use glam::Vec2;
use rand::Rng;

use super::state::{EnemyKind, EnemyRank, EntityId, Enemy, Player, StatusEffects};
use super::upgrades::SkillKind;
use crate::consts::*;
use crate::direction_to;
use crate::words::WordTier;

/// Base enemy health for a wave, before rank multipliers
pub fn enemy_base_health(wave: u32) -> f32 {
    let wave = wave.max(1);
    if wave == 1 {
        ENEMY_BASE_HEALTH
    } else if wave <= ENEMY_HEALTH_TIER_WAVE {
        ENEMY_BASE_HEALTH + (wave - 1) as f32 * ENEMY_HEALTH_PER_WAVE
    } else {
        let early = (ENEMY_HEALTH_TIER_WAVE - 1) as f32 * ENEMY_HEALTH_PER_WAVE;
        let late = (wave - ENEMY_HEALTH_TIER_WAVE) as f32 * ENEMY_HEALTH_PER_LATE_WAVE;
        ENEMY_BASE_HEALTH + early + late
    }
}

/// Approach speed for a rank at a wave
pub fn enemy_speed(rank: EnemyRank, wave: u32, speed_factor: f32) -> f32 {
    let waves = wave.max(1).saturating_sub(1).min(ENEMY_SPEED_WAVE_CAP) as f32;
    rank.base_speed() * (1.0 + waves * ENEMY_SPEED_PER_WAVE) * speed_factor
}

/// Enemies to defeat to clear a wave
pub fn wave_enemy_count(wave: u32) -> u32 {
    wave.max(1)
        .saturating_sub(1)
        .saturating_mul(WAVE_ENEMIES_STEP)
        .saturating_add(BASE_WAVE_ENEMIES)
}

/// Elite and boss chances for a wave
pub fn rank_chances(wave: u32) -> (f32, f32) {
    let elite = if wave >= ELITE_START_WAVE {
        (ELITE_BASE_CHANCE + (wave - ELITE_START_WAVE) as f32 * ELITE_CHANCE_PER_WAVE)
            .min(ELITE_MAX_CHANCE)
    } else {
        0.0
    };
    let boss = if wave >= BOSS_START_WAVE {
        (BOSS_BASE_CHANCE + (wave - BOSS_START_WAVE) as f32 * BOSS_CHANCE_PER_WAVE)
            .min(BOSS_MAX_CHANCE)
    } else {
        0.0
    };
    (elite, boss)
}

pub fn roll_rank<R: Rng + ?Sized>(rng: &mut R, wave: u32) -> EnemyRank {
    let (elite, boss) = rank_chances(wave);
    let roll: f32 = rng.random();
    if roll < boss {
        EnemyRank::Boss
    } else if roll < boss + elite {
        EnemyRank::Elite
    } else {
        EnemyRank::Normal
    }
}

/// Chance of a special enemy, boosted by the matching mastery skill
pub fn special_chance(wave: u32, skill_level: u32) -> f32 {
    if wave < SPECIAL_START_WAVE {
        return 0.0;
    }
    (SPECIAL_BASE_CHANCE
        + skill_level as f32 * SPECIAL_CHANCE_PER_SKILL
        + wave as f32 * SPECIAL_CHANCE_PER_WAVE)
        .min(SPECIAL_MAX_CHANCE)
}

pub fn roll_kind<R: Rng + ?Sized>(rng: &mut R, wave: u32, player: Option<&Player>) -> EnemyKind {
    let (ice, fire) = player
        .map(|p| (p.skill_level(SkillKind::IceMastery), p.skill_level(SkillKind::FireMastery)))
        .unwrap_or((0, 0));
    let frost = special_chance(wave, ice);
    let ember = special_chance(wave, fire);

    let roll: f32 = rng.random();
    if roll < frost {
        EnemyKind::Frost
    } else if roll < frost + ember {
        EnemyKind::Ember
    } else {
        EnemyKind::Standard
    }
}

/// Word length tier for a new enemy
pub fn word_tier<R: Rng + ?Sized>(rng: &mut R, rank: EnemyRank, wave: u32) -> WordTier {
    match rank {
        EnemyRank::Boss => WordTier::Long,
        EnemyRank::Elite => {
            if rng.random_bool(0.5) {
                WordTier::Medium
            } else {
                WordTier::Long
            }
        }
        EnemyRank::Normal => match wave {
            0..=3 => WordTier::Short,
            4..=8 if rng.random_bool(0.5) => WordTier::Short,
            4..=8 => WordTier::Medium,
            _ if rng.random_bool(0.7) => WordTier::Medium,
            _ => WordTier::Long,
        },
    }
}

/// Random point just outside one of the four canvas edges
pub fn edge_spawn_point<R: Rng + ?Sized>(rng: &mut R, bounds: Vec2, inset: f32) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..bounds.x), -inset),
        1 => Vec2::new(bounds.x + inset, rng.random_range(0.0..bounds.y)),
        2 => Vec2::new(rng.random_range(0.0..bounds.x), bounds.y + inset),
        _ => Vec2::new(-inset, rng.random_range(0.0..bounds.y)),
    }
}

/// Build a fully initialized enemy
#[allow(clippy::too_many_arguments)]
pub fn build_enemy(
    id: EntityId,
    rank: EnemyRank,
    kind: EnemyKind,
    pos: Vec2,
    center: Vec2,
    wave: u32,
    word: String,
    speed_factor: f32,
) -> Enemy {
    let max_health = enemy_base_health(wave) * rank.health_multiplier();
    let speed = enemy_speed(rank, wave, speed_factor);
    let base_points = BASE_POINTS + wave.max(1).saturating_sub(1) as u64 * POINTS_PER_WAVE;
    let special_bonus = if kind == EnemyKind::Standard { 1 } else { 2 };

    Enemy {
        id,
        pos,
        vel: direction_to(pos, center) * speed,
        radius: ENEMY_RADIUS * rank.radius_multiplier(),
        health: max_health,
        max_health,
        word,
        rank,
        kind,
        status: StatusEffects::default(),
        typed_progress: 0.0,
        highlighted: false,
        wrong_flash: 0.0,
        points: base_points * rank.score_multiplier() * special_bonus,
        xp: BASE_XP * rank.score_multiplier() as u32,
    }
}
