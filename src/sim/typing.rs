//! Typing matcher
//!
//! Keystrokes build a single lowercase buffer. After every change the
//! buffer is matched by case-insensitive prefix against live relic stars
//! (which win) and enemies. A full match fires or collects; a keystroke
//! that matches nothing costs shield and clears the buffer.

use serde::{Deserialize, Serialize};

use super::combat;
use super::pause::{PauseReason, end_pause, start_pause, toggle_manual_pause};
use super::state::{EntityId, Enemy, FloatingKind, GameEvent, GameState, RelicStar};
use super::upgrades::RelicId;
use crate::consts::*;
use crate::ratio_or_zero;

/// Something the buffer can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRef {
    Enemy(EntityId),
    Relic(EntityId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypingState {
    /// Lowercased text typed so far
    pub text: String,
    /// Most recently highlighted target, flashed on wrong input
    pub last_highlighted: Option<TargetRef>,
}

/// Why the buffer was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// Word completed
    Completed,
    /// Keystroke matched nothing (penalized)
    WrongInput,
    /// Targets changed underneath the player (never penalized)
    Auto,
    /// Enter pressed or buffer backspaced to empty
    Manual,
}

/// Raw key forwarded by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    /// Buffer is a prefix of `matches` targets
    Typing { matches: usize },
    Fired { target: EntityId },
    Collected { relic: RelicId },
    WrongInput,
    Cleared,
    PauseToggled,
}

/// A live entity with a typable word
pub trait TypingTarget {
    fn target_ref(&self) -> TargetRef;
    fn word(&self) -> &str;
    fn set_typed(&mut self, progress: f32, highlighted: bool);
    fn flash_wrong(&mut self);
}

impl TypingTarget for Enemy {
    fn target_ref(&self) -> TargetRef {
        TargetRef::Enemy(self.id)
    }

    fn word(&self) -> &str {
        &self.word
    }

    fn set_typed(&mut self, progress: f32, highlighted: bool) {
        self.typed_progress = progress;
        self.highlighted = highlighted;
    }

    fn flash_wrong(&mut self) {
        self.wrong_flash = WRONG_FLASH_SECS;
    }
}

impl TypingTarget for RelicStar {
    fn target_ref(&self) -> TargetRef {
        TargetRef::Relic(self.id)
    }

    fn word(&self) -> &str {
        &self.word
    }

    fn set_typed(&mut self, progress: f32, highlighted: bool) {
        self.typed_progress = progress;
        self.highlighted = highlighted;
    }

    fn flash_wrong(&mut self) {
        self.wrong_flash = WRONG_FLASH_SECS;
    }
}

fn has_prefix(word: &str, prefix: &str) -> bool {
    !prefix.is_empty()
        && word
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn progress_of(word: &str, typed: &str) -> f32 {
    ratio_or_zero(typed.len() as f32, word.len() as f32).min(1.0)
}

fn reset_targets<T: TypingTarget>(targets: &mut [T]) {
    for target in targets {
        target.set_typed(0.0, false);
    }
}

/// Indices of targets whose word starts with `typed`
fn matching<T: TypingTarget>(targets: &[T], typed: &str) -> Vec<usize> {
    targets
        .iter()
        .enumerate()
        .filter(|(_, t)| has_prefix(t.word(), typed))
        .map(|(i, _)| i)
        .collect()
}

/// Best relic star for the buffer: an exact match, else the shortest word
fn best_star(stars: &[RelicStar], candidates: &[usize], typed: &str) -> Option<usize> {
    candidates.iter().copied().min_by_key(|&i| {
        let star = &stars[i];
        (!star.word.eq_ignore_ascii_case(typed), star.word.len(), star.id)
    })
}

/// Handle one key from the host
pub fn handle_key(state: &mut GameState, key: Key, now_ms: f64) -> KeyOutcome {
    if state.is_over() {
        return KeyOutcome::Ignored;
    }
    if key == Key::Escape {
        toggle_manual_pause(state, now_ms);
        return KeyOutcome::PauseToggled;
    }
    if state.is_effectively_paused() {
        return KeyOutcome::Ignored;
    }

    match key {
        Key::Char(c) if c.is_ascii_alphabetic() => {
            state.typing.text.push(c.to_ascii_lowercase());
            evaluate(state, now_ms, true)
        }
        Key::Char(_) => KeyOutcome::Ignored,
        Key::Backspace => {
            if state.typing.text.pop().is_none() {
                return KeyOutcome::Ignored;
            }
            if state.typing.text.is_empty() {
                clear(state, ClearReason::Manual);
                return KeyOutcome::Cleared;
            }
            evaluate(state, now_ms, false)
        }
        Key::Enter => {
            if state.typing.text.is_empty() {
                return KeyOutcome::Ignored;
            }
            clear(state, ClearReason::Manual);
            KeyOutcome::Cleared
        }
        Key::Escape => KeyOutcome::Ignored,
    }
}

/// Re-match the buffer after it changed
fn evaluate(state: &mut GameState, now_ms: f64, penalize: bool) -> KeyOutcome {
    let typed = state.typing.text.clone();

    let stars = matching(&state.relic_stars, &typed);
    if let Some(idx) = best_star(&state.relic_stars, &stars, &typed) {
        reset_targets(&mut state.enemies);
        reset_targets(&mut state.relic_stars);
        let star = &mut state.relic_stars[idx];
        let progress = progress_of(&star.word, &typed);
        star.set_typed(progress, true);
        state.typing.last_highlighted = Some(star.target_ref());

        if star.word.eq_ignore_ascii_case(&typed) {
            let relic = collect_relic(state, idx, now_ms);
            clear(state, ClearReason::Completed);
            return KeyOutcome::Collected { relic };
        }
        return KeyOutcome::Typing { matches: 1 };
    }

    let matches = matching(&state.enemies, &typed);
    if matches.is_empty() {
        if penalize {
            wrong_input(state);
            return KeyOutcome::WrongInput;
        }
        clear(state, ClearReason::Auto);
        return KeyOutcome::Cleared;
    }

    highlight_enemies(state, &matches, &typed);

    // Duplicate words resolve to the enemy nearest the player
    let player = state.player.pos;
    let exact = matches
        .iter()
        .map(|&i| &state.enemies[i])
        .filter(|e| e.word.eq_ignore_ascii_case(&typed))
        .min_by(|a, b| {
            a.pos
                .distance_squared(player)
                .total_cmp(&b.pos.distance_squared(player))
                .then(a.id.cmp(&b.id))
        })
        .map(|e| e.id);

    if let Some(target) = exact {
        combat::fire_typed(state, target, now_ms);
        clear(state, ClearReason::Completed);
        return KeyOutcome::Fired { target };
    }
    KeyOutcome::Typing {
        matches: matches.len(),
    }
}

fn highlight_enemies(state: &mut GameState, matches: &[usize], typed: &str) {
    reset_targets(&mut state.enemies);
    reset_targets(&mut state.relic_stars);
    for &i in matches {
        let enemy = &mut state.enemies[i];
        let progress = progress_of(&enemy.word, typed);
        enemy.set_typed(progress, true);
    }
    let player = state.player.pos;
    state.typing.last_highlighted = matches
        .iter()
        .map(|&i| &state.enemies[i])
        .min_by(|a, b| a.pos.distance_squared(player).total_cmp(&b.pos.distance_squared(player)))
        .map(|e| e.target_ref());
}

fn wrong_input(state: &mut GameState) {
    match state.typing.last_highlighted {
        Some(TargetRef::Enemy(id)) => {
            if let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == id) {
                enemy.flash_wrong();
            }
        }
        Some(TargetRef::Relic(id)) => {
            if let Some(star) = state.relic_stars.iter_mut().find(|s| s.id == id) {
                star.flash_wrong();
            }
        }
        None => {}
    }

    state.screen_flash = 1.0;
    let penalty = state.settings.wrong_input_penalty;
    let depleted = state.player.take_shield_damage(penalty);
    let pos = state.player.pos;
    state.float_text(pos, format!("Wrong key! -{penalty} shield"), FloatingKind::Warning);
    state.push_event(GameEvent::WrongInput);
    clear(state, ClearReason::WrongInput);

    if depleted {
        state.end_game(false);
    }
}

fn collect_relic(state: &mut GameState, idx: usize, now_ms: f64) -> RelicId {
    let star = state.relic_stars.remove(idx);
    let relic = star.relic;
    let descriptor = relic.descriptor();
    relic.apply(&mut state.player);
    log::info!("Collected relic {} ({:?})", descriptor.name, descriptor.rarity);

    state.float_text(star.pos, descriptor.name, FloatingKind::Info);
    state.push_event(GameEvent::RelicCollected { relic });
    state.relic_announcement = Some(relic);
    start_pause(state, PauseReason::RelicAnnouncement, now_ms);
    relic
}

/// Dismiss the relic announcement. Returns false if none is showing.
pub fn close_relic_announcement(state: &mut GameState, now_ms: f64) -> bool {
    if state.relic_announcement.take().is_none() {
        return false;
    }
    end_pause(state, PauseReason::RelicAnnouncement, now_ms);
    true
}

/// Empty the buffer and drop all highlights
pub fn clear(state: &mut GameState, reason: ClearReason) {
    if !state.typing.text.is_empty() {
        log::debug!("Typing cleared ({:?}): '{}'", reason, state.typing.text);
    }
    state.typing.text.clear();
    state.typing.last_highlighted = None;
    reset_targets(&mut state.enemies);
    reset_targets(&mut state.relic_stars);
}

/// Re-check the buffer after targets changed outside the player's
/// control. Clears silently when nothing matches any more; never fires.
/// Returns true if the buffer was cleared.
pub fn revalidate(state: &mut GameState) -> bool {
    let typed = state.typing.text.clone();
    if typed.is_empty() {
        return false;
    }

    let stars = matching(&state.relic_stars, &typed);
    if let Some(idx) = best_star(&state.relic_stars, &stars, &typed) {
        reset_targets(&mut state.enemies);
        reset_targets(&mut state.relic_stars);
        let star = &mut state.relic_stars[idx];
        let progress = progress_of(&star.word, &typed);
        star.set_typed(progress, true);
        return false;
    }

    let matches = matching(&state.enemies, &typed);
    if matches.is_empty() {
        clear(state, ClearReason::Auto);
        return true;
    }
    highlight_enemies(state, &matches, &typed);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::factory::build_enemy;
    use crate::sim::state::{EnemyKind, EnemyRank, GamePhase};
    use glam::Vec2;

    fn add_enemy(state: &mut GameState, word: &str, pos: Vec2) -> EntityId {
        let id = state.next_entity_id();
        let center = state.center();
        let enemy = build_enemy(id, EnemyRank::Normal, EnemyKind::Standard, pos, center, 1, word.into(), 1.0);
        state.enemies.push(enemy);
        id
    }

    fn add_star(state: &mut GameState, word: &str) -> EntityId {
        let id = state.next_entity_id();
        state.relic_stars.push(RelicStar {
            id,
            relic: RelicId::WhetStone,
            word: word.into(),
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::ZERO,
            expires_at: 1e9,
            typed_progress: 0.0,
            highlighted: false,
            wrong_flash: 0.0,
        });
        id
    }

    fn type_str(state: &mut GameState, text: &str) -> KeyOutcome {
        let mut last = KeyOutcome::Ignored;
        for c in text.chars() {
            last = handle_key(state, Key::Char(c), 0.0);
        }
        last
    }

    #[test]
    fn test_prefix_highlights_exact_set() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let a = add_enemy(&mut state, "star", Vec2::new(10.0, 10.0));
        let b = add_enemy(&mut state, "stone", Vec2::new(20.0, 10.0));
        let c = add_enemy(&mut state, "moon", Vec2::new(30.0, 10.0));

        assert_eq!(type_str(&mut state, "st"), KeyOutcome::Typing { matches: 2 });
        let lit: Vec<EntityId> = state.enemies.iter().filter(|e| e.highlighted).map(|e| e.id).collect();
        assert_eq!(lit, vec![a, b]);
        assert!(!state.enemy(c).unwrap().highlighted);
        assert_eq!(state.enemy(a).unwrap().typed_progress, 0.5);
    }

    #[test]
    fn test_full_word_fires_once_and_clears() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let id = add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        assert_eq!(type_str(&mut state, "ORB"), KeyOutcome::Fired { target: id });
        assert!(state.typing.text.is_empty());
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.projectiles[0].primary);
    }

    #[test]
    fn test_wrong_input_penalizes_once() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        let shield = state.player.shield;

        assert_eq!(type_str(&mut state, "ox"), KeyOutcome::WrongInput);
        assert!(state.typing.text.is_empty());
        assert_eq!(state.player.shield, shield - WRONG_INPUT_PENALTY);
        assert_eq!(state.enemies[0].wrong_flash, WRONG_FLASH_SECS);
        let wrongs = state.events.iter().filter(|e| **e == GameEvent::WrongInput).count();
        assert_eq!(wrongs, 1);
    }

    #[test]
    fn test_wrong_input_can_end_game() {
        let mut state = GameState::new(Settings::default(), 0.0);
        state.player.shield = 1.0;
        assert_eq!(type_str(&mut state, "q"), KeyOutcome::WrongInput);
        assert_eq!(state.phase, GamePhase::Lost);
    }

    #[test]
    fn test_backspace_never_penalizes() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        let shield = state.player.shield;
        type_str(&mut state, "or");
        assert_eq!(handle_key(&mut state, Key::Backspace, 0.0), KeyOutcome::Typing { matches: 1 });
        assert_eq!(handle_key(&mut state, Key::Backspace, 0.0), KeyOutcome::Cleared);
        assert_eq!(handle_key(&mut state, Key::Backspace, 0.0), KeyOutcome::Ignored);
        assert_eq!(state.player.shield, shield);
    }

    #[test]
    fn test_non_letters_ignored() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        assert_eq!(handle_key(&mut state, Key::Char('1'), 0.0), KeyOutcome::Ignored);
        assert_eq!(handle_key(&mut state, Key::Char(' '), 0.0), KeyOutcome::Ignored);
        assert!(state.typing.text.is_empty());
    }

    #[test]
    fn test_relic_star_takes_priority() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let enemy = add_enemy(&mut state, "orbit", Vec2::new(10.0, 10.0));
        add_star(&mut state, "orb");

        assert_eq!(type_str(&mut state, "or"), KeyOutcome::Typing { matches: 1 });
        assert!(!state.enemy(enemy).unwrap().highlighted);
        assert!(state.relic_stars[0].highlighted);

        assert_eq!(handle_key(&mut state, Key::Char('b'), 0.0), KeyOutcome::Collected { relic: RelicId::WhetStone });
        assert!(state.relic_stars.is_empty());
        assert!(state.player.relics.contains(&RelicId::WhetStone));
        assert!(state.pause.relic_announcement);

        assert!(close_relic_announcement(&mut state, 10.0));
        assert!(!close_relic_announcement(&mut state, 10.0));
        assert!(!state.is_effectively_paused());
    }

    #[test]
    fn test_duplicate_word_targets_nearest() {
        let mut state = GameState::new(Settings::default(), 0.0);
        let center = state.center();
        add_enemy(&mut state, "orb", Vec2::new(0.0, 0.0));
        let near = add_enemy(&mut state, "orb", center + Vec2::new(50.0, 0.0));
        assert_eq!(type_str(&mut state, "orb"), KeyOutcome::Fired { target: near });
    }

    #[test]
    fn test_revalidate_clears_silently() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        let shield = state.player.shield;
        type_str(&mut state, "or");
        state.enemies.clear();

        assert!(revalidate(&mut state));
        assert!(state.typing.text.is_empty());
        assert_eq!(state.player.shield, shield);
        assert!(state.projectiles.is_empty());
    }

    #[test]
    fn test_revalidate_keeps_live_match() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        type_str(&mut state, "or");
        assert!(!revalidate(&mut state));
        assert_eq!(state.typing.text, "or");
    }

    #[test]
    fn test_keys_ignored_while_paused() {
        let mut state = GameState::new(Settings::default(), 0.0);
        add_enemy(&mut state, "orb", Vec2::new(10.0, 10.0));
        assert_eq!(handle_key(&mut state, Key::Escape, 0.0), KeyOutcome::PauseToggled);
        assert_eq!(handle_key(&mut state, Key::Char('o'), 0.0), KeyOutcome::Ignored);
        assert_eq!(handle_key(&mut state, Key::Escape, 5.0), KeyOutcome::PauseToggled);
        assert_eq!(handle_key(&mut state, Key::Char('o'), 5.0), KeyOutcome::Typing { matches: 1 });
    }
}
