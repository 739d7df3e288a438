//! Pause coordination
//!
//! Every pause source (manual, level-up, relic announcement) goes through
//! `start_pause`/`end_pause`. While any source is active the absolute-time
//! timers are held as offsets from the pause instant and restored relative
//! to the resume instant, so time appears to stand still.

use serde::{Deserialize, Serialize};

use super::state::GameState;

/// Why the game is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Escape key / pause screen
    Manual,
    /// Waiting for a skill choice
    LevelUp,
    /// Relic announcement modal open
    RelicAnnouncement,
}

/// Timers captured as offsets from the pause instant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerOffsets {
    pub enemy_spawn: Option<f64>,
    pub relic_spawn: Option<f64>,
    pub auto_fire: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseState {
    pub manual: bool,
    pub level_up: bool,
    pub relic_announcement: bool,
    /// When the current pause began
    pub paused_at: Option<f64>,
    pub offsets: Option<TimerOffsets>,
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        self.manual || self.level_up || self.relic_announcement
    }

    pub fn is_active(&self, reason: PauseReason) -> bool {
        match reason {
            PauseReason::Manual => self.manual,
            PauseReason::LevelUp => self.level_up,
            PauseReason::RelicAnnouncement => self.relic_announcement,
        }
    }

    fn set(&mut self, reason: PauseReason, active: bool) {
        match reason {
            PauseReason::Manual => self.manual = active,
            PauseReason::LevelUp => self.level_up = active,
            PauseReason::RelicAnnouncement => self.relic_announcement = active,
        }
    }
}

fn offset_from(now_ms: f64, at: Option<f64>) -> Option<f64> {
    at.map(|t| t - now_ms)
}

/// Begin pausing for `reason`. Returns false if that reason was already active.
pub fn start_pause(state: &mut GameState, reason: PauseReason, now_ms: f64) -> bool {
    if state.pause.is_active(reason) {
        return false;
    }
    let was_paused = state.pause.is_paused();
    state.pause.set(reason, true);
    log::debug!("Pause start: {:?}", reason);

    if !was_paused {
        state.pause.paused_at = Some(now_ms);
        state.pause.offsets = Some(TimerOffsets {
            enemy_spawn: offset_from(now_ms, state.timers.next_enemy_spawn_at.take()),
            relic_spawn: offset_from(now_ms, state.timers.next_relic_spawn_at.take()),
            auto_fire: offset_from(now_ms, state.player.next_auto_fire_at.take()),
        });
    }
    true
}

/// Stop pausing for `reason`. Timers resume only once no reason remains.
/// Returns false if that reason was not active.
pub fn end_pause(state: &mut GameState, reason: PauseReason, now_ms: f64) -> bool {
    if !state.pause.is_active(reason) {
        return false;
    }
    state.pause.set(reason, false);
    log::debug!("Pause end: {:?}", reason);
    if state.pause.is_paused() {
        return true;
    }

    let paused_at = state.pause.paused_at.take().unwrap_or(now_ms);
    let paused_for = (now_ms - paused_at).max(0.0);
    state.start_time_ms += paused_for;

    if let Some(offsets) = state.pause.offsets.take() {
        // Game over while paused cleared the timers for good
        if !state.is_over() {
            state.timers.next_enemy_spawn_at = offsets.enemy_spawn.map(|o| now_ms + o);
            state.timers.next_relic_spawn_at = offsets.relic_spawn.map(|o| now_ms + o);
            state.player.next_auto_fire_at = offsets.auto_fire.map(|o| now_ms + o);
        }
    }

    shift_entity_timers(state, paused_for);
    true
}

/// Push per-entity deadlines forward by the paused duration
fn shift_entity_timers(state: &mut GameState, paused_for: f64) {
    if paused_for <= 0.0 {
        return;
    }
    for enemy in &mut state.enemies {
        let status = &mut enemy.status;
        if let Some(t) = status.frozen_until.as_mut() {
            *t += paused_for;
        }
        if let Some(t) = status.burning_until.as_mut() {
            *t += paused_for;
            status.next_burn_tick += paused_for;
        }
    }
    for star in &mut state.relic_stars {
        star.expires_at += paused_for;
    }
    for action in &mut state.scheduled {
        action.due_ms += paused_for;
    }
}

/// Escape key: flip the manual pause
pub fn toggle_manual_pause(state: &mut GameState, now_ms: f64) -> bool {
    if state.pause.manual {
        end_pause(state, PauseReason::Manual, now_ms);
    } else {
        start_pause(state, PauseReason::Manual, now_ms);
    }
    state.pause.manual
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use proptest::prelude::*;

    fn state_with_timers() -> GameState {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.timers.next_enemy_spawn_at = Some(1_500.0);
        state.timers.next_relic_spawn_at = Some(40_000.0);
        state.player.next_auto_fire_at = Some(2_000.0);
        state
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut state = state_with_timers();
        assert!(start_pause(&mut state, PauseReason::Manual, 1_000.0));
        assert!(!start_pause(&mut state, PauseReason::Manual, 1_200.0));
        assert_eq!(state.pause.paused_at, Some(1_000.0));

        assert!(end_pause(&mut state, PauseReason::Manual, 3_000.0));
        assert!(!end_pause(&mut state, PauseReason::Manual, 3_500.0));
        assert_eq!(state.timers.next_enemy_spawn_at, Some(3_500.0));
        assert_eq!(state.start_time_ms, 2_000.0);
    }

    #[test]
    fn test_timers_frozen_while_paused() {
        let mut state = state_with_timers();
        start_pause(&mut state, PauseReason::LevelUp, 1_000.0);
        assert!(state.timers.next_enemy_spawn_at.is_none());
        assert!(state.timers.next_relic_spawn_at.is_none());
        assert!(state.player.next_auto_fire_at.is_none());
    }

    #[test]
    fn test_overlapping_reasons_resume_once() {
        let mut state = state_with_timers();
        start_pause(&mut state, PauseReason::LevelUp, 1_000.0);
        start_pause(&mut state, PauseReason::Manual, 2_000.0);
        end_pause(&mut state, PauseReason::LevelUp, 3_000.0);
        assert!(state.is_effectively_paused());
        assert!(state.timers.next_enemy_spawn_at.is_none());

        end_pause(&mut state, PauseReason::Manual, 5_000.0);
        assert!(!state.is_effectively_paused());
        // Offsets were taken at the first pause (t=1000)
        assert_eq!(state.timers.next_enemy_spawn_at, Some(5_500.0));
        assert_eq!(state.player.next_auto_fire_at, Some(6_000.0));
        assert_eq!(state.start_time_ms, 4_000.0);
    }

    #[test]
    fn test_elapsed_excludes_pause() {
        let mut state = GameState::new(Settings::default(), 0.0);
        start_pause(&mut state, PauseReason::Manual, 10_000.0);
        assert_eq!(state.elapsed_ms(60_000.0), 10_000.0);
        end_pause(&mut state, PauseReason::Manual, 60_000.0);
        assert_eq!(state.elapsed_ms(65_000.0), 15_000.0);
    }

    #[test]
    fn test_status_effects_shift() {
        use crate::sim::factory::build_enemy;
        use crate::sim::state::{EnemyKind, EnemyRank};
        use glam::Vec2;

        let mut state = GameState::new(Settings::default(), 0.0);
        let mut enemy = build_enemy(
            1,
            EnemyRank::Normal,
            EnemyKind::Standard,
            Vec2::ZERO,
            state.center(),
            1,
            "orb".into(),
            1.0,
        );
        enemy.status.frozen_until = Some(2_000.0);
        state.enemies.push(enemy);

        start_pause(&mut state, PauseReason::Manual, 1_000.0);
        end_pause(&mut state, PauseReason::Manual, 9_000.0);
        assert_eq!(state.enemies[0].status.frozen_until, Some(10_000.0));
    }

    proptest! {
        #[test]
        fn prop_pause_preserves_offsets(
            start in 0.0f64..100_000.0,
            offset in 0.0f64..60_000.0,
            pause_len in 0.0f64..600_000.0,
        ) {
            let mut state = GameState::new(Settings::default(), 0.0);
            state.timers.next_relic_spawn_at = Some(start + offset);
            start_pause(&mut state, PauseReason::Manual, start);
            let resume = start + pause_len;
            end_pause(&mut state, PauseReason::Manual, resume);
            let restored = state.timers.next_relic_spawn_at.unwrap();
            prop_assert!(((restored - resume) - offset).abs() < 1e-6);
        }
    }
}
