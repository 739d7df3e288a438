//! Read-only view of a run for the renderer

use glam::Vec2;
use serde::Serialize;

use super::state::{
    EntityId, Enemy, Explosion, FloatingText, GamePhase, GameState, Player, Projectile, RelicStar,
};
use super::upgrades::{LevelUpOffer, Relic};
use crate::ratio_or_zero;

/// Auto-fire laser sight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Laser {
    pub target: EntityId,
    pub from: Vec2,
    pub to: Vec2,
    /// Ramps from 0 after a shot to 1 when the next one is due
    pub opacity: f32,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot<'a> {
    pub phase: GamePhase,
    pub paused: bool,
    pub wave: u32,
    pub score: u64,
    pub kills: u32,
    pub elapsed_ms: f64,
    pub player: &'a Player,
    pub shield_ratio: f32,
    pub xp_ratio: f32,
    pub enemies: &'a [Enemy],
    pub relic_stars: &'a [RelicStar],
    pub projectiles: &'a [Projectile],
    pub explosions: &'a [Explosion],
    pub floating_texts: &'a [FloatingText],
    pub typed_text: &'a str,
    pub laser: Option<Laser>,
    pub level_up: Option<&'a LevelUpOffer>,
    pub relic_announcement: Option<Relic>,
    pub screen_flash: f32,
}

pub fn snapshot(state: &GameState, now_ms: f64) -> RenderSnapshot<'_> {
    RenderSnapshot {
        phase: state.phase,
        paused: state.is_effectively_paused(),
        wave: state.wave,
        score: state.score,
        kills: state.kills,
        elapsed_ms: state.elapsed_ms(now_ms),
        player: &state.player,
        shield_ratio: state.player.shield_ratio(),
        xp_ratio: state.player.xp_ratio(),
        enemies: &state.enemies,
        relic_stars: &state.relic_stars,
        projectiles: &state.projectiles,
        explosions: &state.explosions,
        floating_texts: &state.floating_texts,
        typed_text: &state.typing.text,
        laser: laser(state, now_ms),
        level_up: state.level_up.as_ref(),
        relic_announcement: state.relic_announcement.map(|r| r.descriptor()),
        screen_flash: state.screen_flash,
    }
}

/// Laser toward the enemy auto-fire will hit next
fn laser(state: &GameState, now_ms: f64) -> Option<Laser> {
    let interval = state.player.auto_fire_interval_ms?;
    let next = state.player.next_auto_fire_at?;
    let target = *state.nearest_enemies(state.player.pos, &[]).first()?;
    let enemy = state.enemy(target)?;

    let remaining = ratio_or_zero((next - now_ms) as f32, interval as f32);
    let opacity = 1.0 - remaining.clamp(0.0, 1.0);
    Some(Laser {
        target,
        from: state.player.pos,
        to: enemy.pos,
        opacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::spawn::spawn_enemy;
    use crate::sim::upgrades::SkillKind;

    #[test]
    fn test_no_laser_without_auto_fire() {
        let mut state = GameState::new(Settings::default(), 0.0);
        spawn_enemy(&mut state);
        assert!(snapshot(&state, 0.0).laser.is_none());
    }

    #[test]
    fn test_laser_ramps_toward_shot() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let id = spawn_enemy(&mut state);
        SkillKind::AutoFire.apply(&mut state.player);
        let interval = state.player.auto_fire_interval_ms.unwrap();
        state.player.next_auto_fire_at = Some(interval);

        let early = snapshot(&state, 0.0).laser.unwrap();
        let late = snapshot(&state, interval * 0.9).laser.unwrap();
        assert_eq!(early.target, id);
        assert!(early.opacity < 0.01);
        assert!(late.opacity > 0.85);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = GameState::new(Settings::default(), 0.0);
        spawn_enemy(&mut state);
        state.typing.text = "ab".into();
        let json = serde_json::to_string(&snapshot(&state, 0.0)).unwrap();
        assert!(json.contains("\"typed_text\":\"ab\""));
    }
}
