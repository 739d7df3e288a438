//! Combat resolution
//!
//! Firing, damage, status effects, deaths, rewards and leveling. Every path
//! that hurts an enemy funnels through `apply_damage`.

use glam::Vec2;
use rand::Rng;

use super::factory::word_tier;
use super::pause::{PauseReason, end_pause, start_pause};
use super::schedule::{self, DeferredAction};
use super::state::{
    Element, Enemy, EnemyKind, EntityId, ExplosionKind, FloatingKind, GameEvent, GameState,
    Player, Projectile, ProjectileKind, live_words,
};
use super::upgrades::{SkillKind, barrage_targets, draw_offer, mastery_threshold};
use crate::consts::*;
use crate::words::draw_word;

/// Anything projectiles and area effects can hurt
pub trait Damageable {
    fn entity_id(&self) -> EntityId;
    fn position(&self) -> Vec2;
    fn hit_radius(&self) -> f32;
    fn is_alive(&self) -> bool;
    /// Subtract health. Returns true if this hit was lethal.
    fn receive_damage(&mut self, amount: f32) -> bool;
}

impl Damageable for Enemy {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.pos
    }

    fn hit_radius(&self) -> f32 {
        self.radius
    }

    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn receive_damage(&mut self, amount: f32) -> bool {
        self.health -= amount.max(0.0);
        self.health <= 0.0
    }
}

/// How a point of damage was delivered
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hit {
    pub critical: bool,
    /// Came from the player's own completed word
    pub primary: bool,
    pub element: Option<Element>,
}

impl Hit {
    /// Damage-over-time tick
    pub fn dot() -> Self {
        Self::default()
    }
}

/// Parameters for a new projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotSpec {
    pub kind: ProjectileKind,
    pub primary: bool,
    /// Splash override; `None` uses the player's splash radius
    pub aoe_radius: Option<f32>,
}

impl ShotSpec {
    /// The shot fired by a completed word
    pub fn primary(player: &Player) -> Self {
        let kind = if player.bounce_count > 0 {
            ProjectileKind::Bouncing
        } else {
            ProjectileKind::Normal
        };
        Self {
            kind,
            primary: true,
            aoe_radius: None,
        }
    }

    /// Multi-shot echo
    pub fn echo() -> Self {
        Self {
            kind: ProjectileKind::Multi,
            primary: false,
            aoe_radius: None,
        }
    }

    pub fn auto_fire() -> Self {
        Self {
            kind: ProjectileKind::Normal,
            primary: false,
            aoe_radius: Some(0.0),
        }
    }

    pub fn barrage(element: Element) -> Self {
        let aoe = match element {
            Element::Fire => FIRE_BARRAGE_AOE,
            Element::Ice => 0.0,
        };
        Self {
            kind: ProjectileKind::Elemental(element),
            primary: false,
            aoe_radius: Some(aoe),
        }
    }
}

/// Launch a projectile from the player at a live enemy.
/// Returns the projectile id, or `None` if the target is gone.
pub fn fire_at(state: &mut GameState, target_id: EntityId, spec: ShotSpec) -> Option<EntityId> {
    let target = state.enemy(target_id)?.pos;
    let id = state.next_entity_id();

    let player = &state.player;
    let base = player.hit_damage();
    let critical = state.rng.random::<f32>() < player.crit_chance;
    let damage = if critical {
        base * player.crit_multiplier
    } else {
        base
    };
    let bounces_left = if spec.kind.supports_bounce() {
        player.bounce_count
    } else {
        0
    };

    let projectile = Projectile {
        id,
        origin: player.pos,
        pos: player.pos,
        target,
        target_id: Some(target_id),
        progress: 0.0,
        speed: player.projectile_speed,
        damage,
        critical,
        size: player.projectile_size,
        durability: player.projectile_durability,
        bounces_left,
        bounce_range: player.bounce_range,
        hit_ids: Vec::new(),
        kind: spec.kind,
        primary: spec.primary,
        aoe_radius: spec.aoe_radius.unwrap_or(player.aoe_radius),
    };
    state.projectiles.push(projectile);
    state.push_event(GameEvent::ShotFired {
        target: target_id,
        primary: spec.primary,
    });
    Some(id)
}

/// Fire for a completed word: one primary shot, plus staggered echoes at
/// the next nearest enemies when multi-shot is learned.
pub fn fire_typed(state: &mut GameState, target_id: EntityId, now_ms: f64) -> Option<EntityId> {
    let spec = ShotSpec::primary(&state.player);
    let shot = fire_at(state, target_id, spec)?;

    let extra = state.player.multi_shot.saturating_sub(1) as usize;
    if extra > 0 {
        let echoes: Vec<EntityId> = state
            .nearest_enemies(state.player.pos, &[target_id])
            .into_iter()
            .take(extra)
            .collect();
        for (i, target) in echoes.into_iter().enumerate() {
            let due = now_ms + MULTI_SHOT_STAGGER_MS * (i + 1) as f64;
            schedule::schedule(state, due, DeferredAction::EchoShot { target });
        }
    }
    Some(shot)
}

pub fn freeze(enemy: &mut Enemy, now_ms: f64) {
    let until = now_ms + FREEZE_DURATION_MS;
    enemy.status.frozen_until = Some(enemy.status.frozen_until.map_or(until, |t| t.max(until)));
}

pub fn ignite(enemy: &mut Enemy, now_ms: f64, damage: f32) {
    if !enemy.is_burning(now_ms) {
        enemy.status.next_burn_tick = now_ms + BURN_TICK_MS;
    }
    enemy.status.burning_until = Some(now_ms + BURN_DURATION_MS);
    enemy.status.burn_damage = enemy.status.burn_damage.max(damage);
}

fn burn_damage(player: &Player) -> f32 {
    (player.hit_damage() * BURN_DAMAGE_FRACTION).max(1.0)
}

/// Damage an enemy. Handles status effects, word reassignment on a
/// surviving primary hit, and death. Returns true if the enemy died.
/// Unknown ids are ignored.
pub fn apply_damage(
    state: &mut GameState,
    id: EntityId,
    amount: f32,
    hit: Hit,
    now_ms: f64,
) -> bool {
    let Some(idx) = state.enemy_index(id) else {
        return false;
    };
    let dot = burn_damage(&state.player);

    let enemy = &mut state.enemies[idx];
    let died = enemy.receive_damage(amount);
    let pos = enemy.pos;
    match hit.element {
        Some(Element::Ice) => freeze(enemy, now_ms),
        Some(Element::Fire) => {
            if state.rng.random::<f32>() < BURN_CHANCE {
                ignite(enemy, now_ms, dot);
            }
        }
        None => {}
    }

    state.float_text(
        pos,
        format!("{}", amount.round() as i64),
        FloatingKind::Damage {
            critical: hit.critical,
        },
    );

    if died {
        kill_enemy(state, idx, now_ms);
        return true;
    }

    if hit.primary {
        reassign_word(state, idx);
    }
    false
}

/// Give a surviving enemy a fresh word
fn reassign_word(state: &mut GameState, idx: usize) {
    let (rank, wave) = (state.enemies[idx].rank, state.wave);
    let tier = word_tier(&mut state.rng, rank, wave);
    let word = {
        let live = live_words(&state.enemies, &state.relic_stars);
        draw_word(&mut state.rng, tier, &live)
    };
    let enemy = &mut state.enemies[idx];
    enemy.word = word;
    enemy.typed_progress = 0.0;
    enemy.highlighted = false;
}

fn kill_enemy(state: &mut GameState, idx: usize, now_ms: f64) {
    let enemy = state.enemies.remove(idx);
    state.kills += 1;
    state.wave_defeated += 1;
    state.score += enemy.points;

    let player = &mut state.player;
    let xp = (enemy.xp as f32 * player.xp_multiplier).round() as u32;
    player.xp += xp;
    if player.skill_level(SkillKind::IceMastery) > 0 {
        player.ice_kills += 1;
    }
    if player.skill_level(SkillKind::FireMastery) > 0 {
        player.fire_kills += 1;
    }

    state.push_event(GameEvent::EnemyKilled {
        id: enemy.id,
        points: enemy.points,
        xp,
        kind: enemy.kind,
    });
    state.explode(enemy.pos, enemy.radius * 1.5, ExplosionKind::Kill);
    state.float_text(enemy.pos, format!("+{xp} XP"), FloatingKind::Xp);

    match enemy.kind {
        EnemyKind::Frost => burst_status(state, enemy.pos, Element::Ice, now_ms),
        EnemyKind::Ember => burst_status(state, enemy.pos, Element::Fire, now_ms),
        EnemyKind::Standard => {}
    }

    check_level_up(state, now_ms);
}

/// Death burst of a special enemy: freeze or ignite everything nearby
fn burst_status(state: &mut GameState, center: Vec2, element: Element, now_ms: f64) {
    let dot = burn_damage(&state.player);
    for enemy in &mut state.enemies {
        if enemy.pos.distance(center) > SPECIAL_BURST_RADIUS {
            continue;
        }
        match element {
            Element::Ice => freeze(enemy, now_ms),
            Element::Fire => ignite(enemy, now_ms, dot),
        }
    }
    let kind = match element {
        Element::Ice => ExplosionKind::Frost,
        Element::Fire => ExplosionKind::Fire,
    };
    state.explode(center, SPECIAL_BURST_RADIUS, kind);
}

/// Convert banked XP into levels; pauses for a skill choice when one is
/// available.
pub fn check_level_up(state: &mut GameState, now_ms: f64) {
    let mut gained = 0;
    loop {
        let player = &mut state.player;
        if player.xp_to_next == 0 || player.xp < player.xp_to_next {
            break;
        }
        player.xp -= player.xp_to_next;
        player.level += 1;
        player.xp_to_next = (player.xp_to_next as f32 * XP_GROWTH).ceil() as u32;
        player.damage += LEVEL_UP_DAMAGE_BONUS;
        player.max_shield += LEVEL_UP_SHIELD_BONUS;
        player.restore_shield(LEVEL_UP_SHIELD_BONUS);
        gained += 1;

        let level = player.level;
        log::info!("Level up! Now level {}", level);
        state.push_event(GameEvent::LevelUp { level });
    }
    if gained == 0 {
        return;
    }
    state.pending_level_ups += gained;
    present_next_offer(state, now_ms);
}

fn present_next_offer(state: &mut GameState, now_ms: f64) {
    if state.level_up.is_some() {
        return;
    }
    while state.pending_level_ups > 0 {
        state.pending_level_ups -= 1;
        if let Some(offer) = draw_offer(&mut state.rng, &state.player) {
            state.level_up = Some(offer);
            start_pause(state, PauseReason::LevelUp, now_ms);
            return;
        }
    }
}

/// Apply the skill at `index` of the pending offer. Returns false when no
/// offer is pending or the index is out of range.
pub fn choose_skill(state: &mut GameState, index: usize, now_ms: f64) -> bool {
    let Some(skill) = state
        .level_up
        .as_ref()
        .and_then(|offer| offer.choices.get(index).copied())
    else {
        return false;
    };

    skill.apply(&mut state.player);
    log::info!("Chose {} (level {})", skill.name(), state.player.skill_level(skill));
    state.level_up = None;

    present_next_offer(state, now_ms);
    if state.level_up.is_none() {
        end_pause(state, PauseReason::LevelUp, now_ms);
    }
    true
}

/// Resolve an enemy reaching the player: shield damage, impact, removal.
/// Returns true if this ended the game.
pub fn resolve_player_collision(state: &mut GameState, idx: usize) -> bool {
    let enemy = state.enemies.remove(idx);
    let damage = enemy.rank.collision_damage();
    state.wave_defeated += 1;

    let depleted = state.player.take_shield_damage(damage);
    state.push_event(GameEvent::PlayerHit { damage });
    state.explode(enemy.pos, enemy.radius * 2.0, ExplosionKind::Impact);
    let player_pos = state.player.pos;
    state.float_text(player_pos, format!("-{}", damage.round() as i64), FloatingKind::Warning);
    log::debug!("Enemy {} hit the shield for {}", enemy.id, damage);

    if depleted {
        state.end_game(false);
    }
    depleted
}

/// Expire freezes and burns; apply due burn ticks (which can kill)
pub fn update_status_effects(state: &mut GameState, now_ms: f64) {
    let ids: Vec<EntityId> = state.enemies.iter().map(|e| e.id).collect();
    for id in ids {
        if state.is_halted() {
            break;
        }
        let Some(idx) = state.enemy_index(id) else {
            continue;
        };
        let status = &mut state.enemies[idx].status;
        if status.frozen_until.is_some_and(|t| now_ms >= t) {
            status.frozen_until = None;
        }

        let mut ticks = 0;
        if let Some(until) = status.burning_until {
            while status.next_burn_tick <= now_ms && status.next_burn_tick <= until {
                ticks += 1;
                status.next_burn_tick += BURN_TICK_MS;
            }
            if now_ms >= until {
                status.burning_until = None;
            }
        }
        let damage = status.burn_damage;

        for _ in 0..ticks {
            if apply_damage(state, id, damage, Hit::dot(), now_ms) {
                break;
            }
        }
    }
}

/// Fire the auto-fire laser when its timer comes due
pub fn update_auto_fire(state: &mut GameState, now_ms: f64) -> Option<EntityId> {
    let interval = state.player.auto_fire_interval_ms?;
    let Some(next) = state.player.next_auto_fire_at else {
        state.player.next_auto_fire_at = Some(now_ms + interval);
        return None;
    };
    if now_ms < next {
        return None;
    }
    state.player.next_auto_fire_at = Some(now_ms + interval);
    let target = state.nearest_enemies(state.player.pos, &[]).first().copied()?;
    fire_at(state, target, ShotSpec::auto_fire())
}

/// Launch elemental barrages whose kill counters reached their threshold.
/// Returns the number of shots fired.
pub fn update_mastery(state: &mut GameState) -> usize {
    try_barrage(state, Element::Ice) + try_barrage(state, Element::Fire)
}

fn try_barrage(state: &mut GameState, element: Element) -> usize {
    let skill = match element {
        Element::Ice => SkillKind::IceMastery,
        Element::Fire => SkillKind::FireMastery,
    };
    let level = state.player.skill_level(skill);
    if level == 0 {
        return 0;
    }
    let kills = match element {
        Element::Ice => state.player.ice_kills,
        Element::Fire => state.player.fire_kills,
    };
    if kills < mastery_threshold(level) {
        return 0;
    }

    // Hold the charge until there is something to hit
    let targets: Vec<EntityId> = state
        .nearest_enemies(state.player.pos, &[])
        .into_iter()
        .take(barrage_targets(level))
        .collect();
    if targets.is_empty() {
        return 0;
    }

    let fired = targets
        .into_iter()
        .filter_map(|t| fire_at(state, t, ShotSpec::barrage(element)))
        .count();
    match element {
        Element::Ice => state.player.ice_kills = 0,
        Element::Fire => state.player.fire_kills = 0,
    }
    log::info!("{:?} barrage fired at {} targets", element, fired);
    state.push_event(GameEvent::Barrage {
        element,
        targets: fired,
    });
    fired
}
