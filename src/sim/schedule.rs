//! Deferred actions keyed by a logical deadline
//!
//! Staggered multi-shot echoes are queued here instead of relying on a host
//! timer. The driver runs due actions once per tick; each action looks its
//! target up again and does nothing if it has since been removed.

use serde::{Deserialize, Serialize};

use super::combat::{self, ShotSpec};
use super::state::{EntityId, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeferredAction {
    /// Fire one more non-primary shot at `target`
    EchoShot { target: EntityId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub due_ms: f64,
    pub action: DeferredAction,
}

pub fn schedule(state: &mut GameState, due_ms: f64, action: DeferredAction) {
    state.scheduled.push(ScheduledAction { due_ms, action });
}

/// Run every action whose deadline has passed, in deadline order.
/// Returns how many actually did something.
pub fn run_due(state: &mut GameState, now_ms: f64) -> usize {
    if state.scheduled.is_empty() {
        return 0;
    }
    let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.scheduled)
        .into_iter()
        .partition(|a| a.due_ms <= now_ms);
    state.scheduled = pending;
    due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));

    let mut executed = 0;
    for entry in due {
        if state.is_over() {
            break;
        }
        match entry.action {
            DeferredAction::EchoShot { target } => {
                // Target may have died since the echo was queued
                if state.enemy(target).is_none() {
                    continue;
                }
                let spec = ShotSpec::echo();
                if combat::fire_at(state, target, spec).is_some() {
                    executed += 1;
                }
            }
        }
    }
    executed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::spawn::spawn_enemy;

    #[test]
    fn test_due_actions_fire_in_order() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let a = spawn_enemy(&mut state);
        let b = spawn_enemy(&mut state);
        schedule(&mut state, 160.0, DeferredAction::EchoShot { target: b });
        schedule(&mut state, 80.0, DeferredAction::EchoShot { target: a });

        assert_eq!(run_due(&mut state, 50.0), 0);
        assert_eq!(state.scheduled.len(), 2);

        assert_eq!(run_due(&mut state, 100.0), 1);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectiles[0].target_id, Some(a));
        assert!(!state.projectiles[0].primary);

        assert_eq!(run_due(&mut state, 200.0), 1);
        assert!(state.scheduled.is_empty());
    }

    #[test]
    fn test_stale_target_is_noop() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let id = spawn_enemy(&mut state);
        schedule(&mut state, 10.0, DeferredAction::EchoShot { target: id });
        state.enemies.clear();

        assert_eq!(run_due(&mut state, 20.0), 0);
        assert!(state.projectiles.is_empty());
        assert!(state.scheduled.is_empty());
    }
}
