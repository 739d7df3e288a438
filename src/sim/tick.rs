//! Simulation driver
//!
//! `tick` advances the game by one accepted frame in a fixed order. The
//! `Driver` wraps it with a frame limiter and a `Clock` so the same loop runs
//! against wall time in the binary and against a manual clock in tests.

use glam::Vec2;

use super::combat;
use super::pause::toggle_manual_pause;
use super::projectile;
use super::schedule;
use super::snapshot::{RenderSnapshot, snapshot};
use super::spawn;
use super::state::{GameEvent, GameState};
use super::typing::{self, Key, KeyOutcome};
use crate::consts::*;
use crate::settings::Settings;

/// Advance the game to `now_ms`, integrating `dt` seconds.
///
/// Returns every event raised since the previous tick, including ones from
/// keystrokes handled in between.
pub fn tick(state: &mut GameState, now_ms: f64, dt: f32) -> Vec<GameEvent> {
    state.now_ms = now_ms;
    if !state.is_over() && !state.is_effectively_paused() {
        step(state, now_ms, dt.clamp(0.0, MAX_FRAME_DT));
    }
    if !state.is_over() {
        typing::revalidate(state);
    }
    drain_events(state)
}

fn step(state: &mut GameState, now_ms: f64, dt: f32) {
    if state.elapsed_ms(now_ms) >= state.settings.win_time_ms {
        state.end_game(true);
        return;
    }

    spawn::update_enemy_spawns(state, now_ms);
    combat::update_status_effects(state, now_ms);
    // A level-up or game over stops the rest of the tick
    if state.is_halted() {
        return;
    }

    spawn::update_relic_stars(state, dt, now_ms);
    spawn::update_relic_spawns(state, now_ms);

    update_enemies(state, dt, now_ms);
    if state.is_halted() {
        return;
    }

    schedule::run_due(state, now_ms);
    projectile::update_projectiles(state, dt, now_ms);
    projectile::update_effects(state, dt);
    if state.is_halted() {
        return;
    }

    spawn::check_wave_complete(state, now_ms);
    combat::update_auto_fire(state, now_ms);
    combat::update_mastery(state);
    if state.is_halted() {
        return;
    }

    let player = &mut state.player;
    player.restore_shield(player.shield_regen * player.shield_efficiency * dt);

    decay_visuals(state, dt);
}

/// Beyond the canvas by more than `margin` on any side
pub fn is_offscreen(pos: Vec2, bounds: Vec2, margin: f32) -> bool {
    pos.x < -margin || pos.y < -margin || pos.x > bounds.x + margin || pos.y > bounds.y + margin
}

/// Move enemies, cull strays and resolve contact with the player
fn update_enemies(state: &mut GameState, dt: f32, now_ms: f64) {
    let margin = state.settings.offscreen_margin;
    let bounds = state.bounds();
    let (player_pos, player_radius) = (state.player.pos, state.player.radius);

    let mut i = 0;
    while i < state.enemies.len() {
        let enemy = &mut state.enemies[i];
        enemy.pos += enemy.vel * enemy.speed_factor(now_ms) * dt;

        if is_offscreen(enemy.pos, bounds, margin) {
            let culled = state.enemies.remove(i);
            // Refund the spawn so the wave can still be completed
            state.wave_spawned = state.wave_spawned.saturating_sub(1);
            log::debug!("Culled enemy {} at {:?}", culled.id, culled.pos);
            continue;
        }

        if enemy.pos.distance(player_pos) < enemy.radius + player_radius {
            if combat::resolve_player_collision(state, i) {
                return;
            }
            continue;
        }
        i += 1;
    }
}

fn decay_visuals(state: &mut GameState, dt: f32) {
    for enemy in &mut state.enemies {
        enemy.wrong_flash = (enemy.wrong_flash - dt).max(0.0);
    }
    for star in &mut state.relic_stars {
        star.wrong_flash = (star.wrong_flash - dt).max(0.0);
    }
    state.screen_flash *= SCREEN_FLASH_DECAY;
    if state.screen_flash < 0.01 {
        state.screen_flash = 0.0;
    }
}

/// Hand queued events to the host, materializing cosmetic requests
fn drain_events(state: &mut GameState) -> Vec<GameEvent> {
    let events = std::mem::take(&mut state.events);
    projectile::spawn_effects(state, &events);
    events
}

/// Drops host callbacks that arrive faster than the target frame rate
#[derive(Debug, Clone)]
pub struct FrameLimiter {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl FrameLimiter {
    pub fn new(target_fps: f64) -> Self {
        Self::with_interval_ms(if target_fps > 0.0 { 1000.0 / target_fps } else { 0.0 })
    }

    pub fn with_interval_ms(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            last_ms: None,
        }
    }

    /// Delta time in seconds if a frame should run at `now_ms`
    pub fn accept(&mut self, now_ms: f64) -> Option<f32> {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            return Some(0.0);
        };
        let elapsed = now_ms - last;
        if elapsed + FRAME_SLACK_MS < self.interval_ms {
            return None;
        }
        self.last_ms = Some(now_ms);
        Some(((elapsed / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT))
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Source of the current time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Wall clock measured from creation
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock advanced by hand, for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: f64,
}

impl ManualClock {
    pub fn new(now_ms: f64) -> Self {
        Self { now_ms }
    }

    pub fn advance(&mut self, ms: f64) {
        self.now_ms += ms.max(0.0);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

/// Owns one run and exposes the host-facing actions
#[derive(Debug)]
pub struct Driver<C: Clock> {
    state: GameState,
    clock: C,
    limiter: FrameLimiter,
    running: bool,
}

impl<C: Clock> Driver<C> {
    pub fn new(settings: Settings, clock: C) -> Self {
        let limiter = FrameLimiter::with_interval_ms(settings.frame_interval_ms());
        let state = GameState::new(settings, clock.now_ms());
        log::info!("Starting run with seed {:#x}", state.seed);
        Self {
            state,
            clock,
            limiter,
            running: true,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Host frame callback. Returns events when a tick actually ran.
    pub fn frame(&mut self) -> Option<Vec<GameEvent>> {
        if !self.running {
            return None;
        }
        let now = self.clock.now_ms();
        let dt = self.limiter.accept(now)?;
        let events = tick(&mut self.state, now, dt);
        if self.state.is_over() {
            self.stop();
        }
        Some(events)
    }

    pub fn key(&mut self, key: Key) -> KeyOutcome {
        if !self.running {
            return KeyOutcome::Ignored;
        }
        let now = self.clock.now_ms();
        typing::handle_key(&mut self.state, key, now)
    }

    /// Level-up screen confirmation
    pub fn choose_skill(&mut self, index: usize) -> bool {
        let now = self.clock.now_ms();
        combat::choose_skill(&mut self.state, index, now)
    }

    pub fn close_relic_announcement(&mut self) -> bool {
        let now = self.clock.now_ms();
        typing::close_relic_announcement(&mut self.state, now)
    }

    /// Pause screen toggle. Returns whether the manual pause is now active.
    pub fn toggle_pause(&mut self) -> bool {
        if self.state.is_over() {
            return false;
        }
        let now = self.clock.now_ms();
        toggle_manual_pause(&mut self.state, now)
    }

    /// Throw the current run away and start over with the same settings
    pub fn restart(&mut self) {
        let settings = self.state.settings.clone();
        self.state = GameState::new(settings, self.clock.now_ms());
        self.limiter.reset();
        self.running = true;
        log::info!("Restarted run");
    }

    /// Stop ticking and cancel everything pending
    pub fn stop(&mut self) {
        self.running = false;
        self.state.timers = Default::default();
        self.state.scheduled.clear();
    }

    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        snapshot(&self.state, self.clock.now_ms())
    }
}
