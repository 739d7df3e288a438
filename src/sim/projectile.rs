//! Projectile and effects engine
//!
//! Projectiles travel by interpolating from their origin toward a target
//! point that follows the target enemy while it lives. Each step's path
//! segment is swept against enemies the projectile has not hit yet, so fast
//! shots cannot tunnel through anything.
//!
//! Explosions and floating numbers live here too. They are purely cosmetic.

use glam::Vec2;
use rand::Rng;

use super::combat::{self, Damageable, Hit};
use super::state::{
    EntityId, Explosion, ExplosionKind, FloatingText, GameEvent, GameState, Particle, Projectile,
};
use crate::consts::*;
use crate::point_segment_distance;

/// Closest enemy touched by a path segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub index: usize,
    pub id: EntityId,
    /// Distance from the enemy center to the path
    pub distance: f32,
    /// Where along the segment (0-1) the closest approach happens
    pub t: f32,
}

/// Sweep a segment of width `size` against `targets`, ignoring `skip`.
///
/// Ties are broken by distance to the path, then by time along the
/// segment, then by id.
pub fn sweep<T: Damageable>(
    targets: &[T],
    from: Vec2,
    to: Vec2,
    size: f32,
    skip: &[EntityId],
) -> Option<SweepHit> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_alive() && !skip.contains(&t.entity_id()))
        .filter_map(|(index, target)| {
            let (distance, t) = point_segment_distance(target.position(), from, to);
            (distance <= target.hit_radius() + size).then_some(SweepHit {
                index,
                id: target.entity_id(),
                distance,
                t,
            })
        })
        .min_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.t.total_cmp(&b.t))
                .then(a.id.cmp(&b.id))
        })
}

/// Damage falloff for every target inside `radius` of `center`, skipping
/// `exclude`. Falls off linearly from 1 at the center to 0 at the edge.
pub fn falloff_targets<T: Damageable>(
    targets: &[T],
    center: Vec2,
    radius: f32,
    exclude: &[EntityId],
) -> Vec<(EntityId, f32)> {
    if radius <= 0.0 {
        return Vec::new();
    }
    targets
        .iter()
        .filter(|t| t.is_alive() && !exclude.contains(&t.entity_id()))
        .filter_map(|t| {
            let d = t.position().distance(center);
            (d <= radius).then(|| (t.entity_id(), (1.0 - d / radius).clamp(0.0, 1.0)))
        })
        .collect()
}

/// Splash damage around `center`. Returns the number of kills.
pub fn area_damage(
    state: &mut GameState,
    center: Vec2,
    radius: f32,
    base_damage: f32,
    exclude: &[EntityId],
    hit: Hit,
    now_ms: f64,
) -> usize {
    let targets = falloff_targets(&state.enemies, center, radius, exclude);
    if radius > 0.0 {
        state.explode(center, radius, ExplosionKind::Area);
    }
    // Splash never rewrites a word
    let hit = Hit {
        primary: false,
        critical: false,
        ..hit
    };
    let mut kills = 0;
    for (id, falloff) in targets {
        if state.is_halted() {
            break;
        }
        if falloff > 0.0 && combat::apply_damage(state, id, base_damage * falloff, hit, now_ms) {
            kills += 1;
        }
    }
    kills
}

/// What happened to a projectile this step
enum Flight {
    Flying,
    Consumed,
}

/// Advance every projectile, resolving hits, pierce, bounce and splash
pub fn update_projectiles(state: &mut GameState, dt: f32, now_ms: f64) {
    let mut flying = std::mem::take(&mut state.projectiles);
    flying.retain_mut(|p| {
        // Projectiles after a level-up kill wait untouched for the resume
        state.is_halted() || matches!(step_projectile(state, p, dt, now_ms), Flight::Flying)
    });
    // Keep anything fired while resolving hits
    flying.append(&mut state.projectiles);
    state.projectiles = flying;
}

fn step_projectile(state: &mut GameState, p: &mut Projectile, dt: f32, now_ms: f64) -> Flight {
    // Home on the target while it lives
    if let Some(target) = p.target_id.and_then(|id| state.enemy(id)) {
        p.target = target.pos;
    }

    let prev = p.pos;
    let path_len = p.origin.distance(p.target);
    if path_len <= f32::EPSILON {
        p.progress = 1.0;
    } else {
        p.progress = (p.progress + p.speed * dt / path_len).min(1.0);
    }
    p.pos = p.origin.lerp(p.target, p.progress);

    loop {
        let Some(hit) = sweep(&state.enemies, prev, p.pos, p.size, &p.hit_ids) else {
            break;
        };
        let hit_pos = state.enemies[hit.index].pos;
        p.hit_ids.push(hit.id);

        let damage_hit = Hit {
            critical: p.critical,
            primary: p.primary,
            element: p.kind.element(),
        };
        combat::apply_damage(state, hit.id, p.damage, damage_hit, now_ms);
        if p.aoe_radius > 0.0 {
            area_damage(state, hit_pos, p.aoe_radius, p.damage, &[hit.id], damage_hit, now_ms);
        }

        p.durability -= DURABILITY_PER_HIT;
        if p.durability > 0.0 && state.is_halted() {
            return Flight::Flying;
        }
        if p.durability > 0.0 {
            // Pierce: keep sweeping the same segment
            continue;
        }
        if try_bounce(state, p, hit_pos) {
            return Flight::Flying;
        }
        return Flight::Consumed;
    }

    if p.progress >= 1.0 {
        // Reached the aim point without touching anything
        Flight::Consumed
    } else {
        Flight::Flying
    }
}

/// Redirect a spent bouncing projectile to the nearest fresh enemy in range
fn try_bounce(state: &GameState, p: &mut Projectile, from: Vec2) -> bool {
    if !p.kind.supports_bounce() || p.bounces_left == 0 {
        return false;
    }
    let Some(next) = state
        .enemies
        .iter()
        .filter(|e| !p.hit_ids.contains(&e.id))
        .map(|e| (e, e.pos.distance(from)))
        .filter(|(_, d)| *d <= p.bounce_range)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)))
        .map(|(e, _)| (e.id, e.pos))
    else {
        return false;
    };

    p.bounces_left -= 1;
    p.damage *= 0.5;
    // Bounced shots never rewrite a word
    p.primary = false;
    p.durability = DURABILITY_PER_HIT;
    p.origin = from;
    p.pos = from;
    p.target = next.1;
    p.target_id = Some(next.0);
    p.progress = 0.0;
    true
}

/// Turn cosmetic requests from the event queue into effect entities
pub fn spawn_effects(state: &mut GameState, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::Explosion { pos, radius, kind } => {
                let particles = (0..PARTICLES_PER_EXPLOSION)
                    .map(|_| {
                        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
                        let speed = state.rng.random_range(1.0f32..3.0) * radius.max(1.0);
                        Particle {
                            pos: *pos,
                            vel: Vec2::from_angle(angle) * speed,
                            size: state.rng.random_range(2.0..4.0),
                        }
                    })
                    .collect();
                state.explosions.push(Explosion {
                    pos: *pos,
                    radius: *radius,
                    kind: *kind,
                    progress: 0.0,
                    particles,
                });
            }
            GameEvent::FloatingText { pos, text, kind } => {
                state.floating_texts.push(FloatingText {
                    pos: *pos,
                    text: text.clone(),
                    kind: *kind,
                    progress: 0.0,
                });
            }
            _ => {}
        }
    }
}

/// Age explosions and floating text, dropping finished ones
pub fn update_effects(state: &mut GameState, dt: f32) {
    state.explosions.retain_mut(|explosion| {
        explosion.progress += EXPLOSION_RATE * dt;
        explosion.particles.retain_mut(|particle| {
            particle.pos += particle.vel * dt;
            particle.vel *= PARTICLE_DECAY;
            particle.size *= PARTICLE_DECAY;
            particle.size >= MIN_PARTICLE_SIZE
        });
        explosion.progress < 1.0
    });

    state.floating_texts.retain_mut(|text| {
        text.progress += FLOATING_TEXT_RATE * dt;
        text.pos.y -= FLOATING_TEXT_RISE * dt;
        text.progress < 1.0
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::combat::{ShotSpec, fire_at};
    use crate::sim::factory::build_enemy;
    use crate::sim::state::{Element, EnemyKind, EnemyRank, FloatingKind, ProjectileKind};
    use proptest::prelude::*;

    fn add_enemy(state: &mut GameState, pos: Vec2, health: f32) -> EntityId {
        let id = state.next_entity_id();
        let center = state.center();
        let mut enemy = build_enemy(id, EnemyRank::Normal, EnemyKind::Standard, pos, center, 1, format!("e{id}"), 1.0);
        enemy.health = health;
        enemy.max_health = health;
        // Hold still
        enemy.vel = Vec2::ZERO;
        state.enemies.push(enemy);
        id
    }

    fn run(state: &mut GameState, steps: usize) {
        for _ in 0..steps {
            update_projectiles(state, 1.0 / 60.0, state.now_ms);
        }
    }

    #[test]
    fn test_projectile_kills_target() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.player.crit_chance = 0.0;
        let center = state.center();
        let id = add_enemy(&mut state, center + Vec2::new(300.0, 0.0), 10.0);
        let spec = ShotSpec::primary(&state.player);
        fire_at(&mut state, id, spec).unwrap();

        run(&mut state, 60);
        assert!(state.enemy(id).is_none());
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_zero_length_path_is_safe() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let center = state.center();
        let id = add_enemy(&mut state, center, 1000.0);
        fire_at(&mut state, id, ShotSpec::auto_fire()).unwrap();
        run(&mut state, 1);
        assert!(state.projectiles.is_empty());
        assert!(state.enemy(id).unwrap().health < 1000.0);
        assert!(state.enemies[0].pos.is_finite());
    }

    #[test]
    fn test_sweep_picks_closest_to_path() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let near = add_enemy(&mut state, Vec2::new(100.0, 2.0), 10.0);
        add_enemy(&mut state, Vec2::new(50.0, 10.0), 10.0);
        let hit = sweep(&state.enemies, Vec2::ZERO, Vec2::new(200.0, 0.0), 4.0, &[]).unwrap();
        assert_eq!(hit.id, near);
        assert!(sweep(&state.enemies, Vec2::ZERO, Vec2::new(200.0, 0.0), 4.0, &[near, near + 1]).is_none());
    }

    #[test]
    fn test_bounce_retargets_and_halves() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.player.crit_chance = 0.0;
        state.player.bounce_count = 1;
        let center = state.center();
        let first = add_enemy(&mut state, center + Vec2::new(200.0, 0.0), 5.0);
        let second = add_enemy(&mut state, center + Vec2::new(250.0, 80.0), 100.0);

        let spec = ShotSpec::primary(&state.player);
        assert_eq!(spec.kind, ProjectileKind::Bouncing);
        fire_at(&mut state, first, spec).unwrap();
        run(&mut state, 120);

        assert!(state.enemy(first).is_none());
        let survivor = state.enemy(second).unwrap();
        assert_eq!(survivor.health, 100.0 - BASE_DAMAGE * 0.5);
        // Non-primary hit: word untouched
        assert_eq!(survivor.word, format!("e{second}"));
    }

    #[test]
    fn test_area_falloff_excludes_primary() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let a = add_enemy(&mut state, Vec2::new(0.0, 0.0), 100.0);
        let b = add_enemy(&mut state, Vec2::new(50.0, 0.0), 100.0);
        let c = add_enemy(&mut state, Vec2::new(500.0, 0.0), 100.0);

        let kills = area_damage(&mut state, Vec2::ZERO, 100.0, 20.0, &[a], Hit::default(), 0.0);
        assert_eq!(kills, 0);
        assert_eq!(state.enemy(a).unwrap().health, 100.0);
        assert_eq!(state.enemy(b).unwrap().health, 90.0);
        assert_eq!(state.enemy(c).unwrap().health, 100.0);
    }

    #[test]
    fn test_fire_barrage_splashes_neighbor() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.player.crit_chance = 0.0;
        let center = state.center();
        let target = add_enemy(&mut state, center + Vec2::new(300.0, 0.0), 1000.0);
        let neighbor = add_enemy(&mut state, center + Vec2::new(300.0, 50.0), 100.0);
        fire_at(&mut state, target, ShotSpec::barrage(Element::Fire)).unwrap();

        run(&mut state, 60);
        assert_eq!(state.enemy(target).unwrap().health, 1000.0 - BASE_DAMAGE);
        let splashed = state.enemy(neighbor).unwrap().health;
        assert!(splashed < 100.0 && splashed > 100.0 - BASE_DAMAGE, "{splashed}");
        // Splash keeps the word
        assert_eq!(state.enemy(neighbor).unwrap().word, format!("e{neighbor}"));
    }

    #[test]
    fn test_level_up_kill_freezes_remaining_projectiles() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.player.crit_chance = 0.0;
        state.player.xp = BASE_XP_TO_LEVEL - 1;
        let center = state.center();
        let first = add_enemy(&mut state, center + Vec2::new(100.0, 0.0), 1.0);
        let second = add_enemy(&mut state, center - Vec2::new(100.0, 0.0), 1.0);
        fire_at(&mut state, first, ShotSpec::auto_fire()).unwrap();
        fire_at(&mut state, second, ShotSpec::auto_fire()).unwrap();
        let waiting = state.projectiles[1].clone();

        update_projectiles(&mut state, 0.2, 0.0);
        assert!(state.enemy(first).is_none());
        assert!(state.is_effectively_paused());
        assert!(state.enemy(second).is_some());
        assert_eq!(state.kills, 1);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].pos, waiting.pos);
    }

    #[test]
    fn test_effects_age_out() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let events = vec![
            GameEvent::Explosion {
                pos: Vec2::ZERO,
                radius: 20.0,
                kind: ExplosionKind::Kill,
            },
            GameEvent::FloatingText {
                pos: Vec2::ZERO,
                text: "10".into(),
                kind: FloatingKind::Damage { critical: false },
            },
            GameEvent::WrongInput,
        ];
        spawn_effects(&mut state, &events);
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.floating_texts.len(), 1);
        assert_eq!(state.explosions[0].particles.len(), PARTICLES_PER_EXPLOSION);

        for _ in 0..120 {
            update_effects(&mut state, 1.0 / 60.0);
        }
        assert!(state.explosions.is_empty());
        assert!(state.floating_texts.is_empty());
    }

    proptest! {
        #[test]
        fn prop_durability_caps_hits(durability in 0.5f32..6.0, count in 1usize..10) {
            let mut state = GameState::new(Settings::default(), 0.0);
            let origin = state.player.pos;
            let mut ids = Vec::new();
            for i in 0..count {
                let pos = origin + Vec2::new(40.0 * (i + 1) as f32, 0.0);
                ids.push(add_enemy(&mut state, pos, 1e6));
            }
            let last = *ids.last().unwrap();
            state.player.projectile_durability = durability;
            state.player.crit_chance = 0.0;
            fire_at(&mut state, last, ShotSpec::auto_fire()).unwrap();

            run(&mut state, 120);
            let hit = state.enemies.iter().filter(|e| e.health < 1e6).count();
            let budget = (durability / DURABILITY_PER_HIT).ceil() as usize;
            prop_assert!(hit <= budget);
            prop_assert_eq!(hit, budget.min(count));
            prop_assert!(state.projectiles.is_empty());
        }
    }
}
