//! Game state and core simulation types
//!
//! Everything the driver mutates during a tick lives here. A new
//! `GameState` is built for every run; restarting replaces it wholesale.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pause::PauseState;
use super::schedule::ScheduledAction;
use super::typing::TypingState;
use super::upgrades::{LevelUpOffer, RelicId, SkillKind};
use crate::consts::*;
use crate::settings::Settings;
use crate::ratio_or_zero;

/// Stable entity identifier, unique within a run
pub type EntityId = u32;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay (possibly paused, see `PauseState`)
    Playing,
    /// Shield depleted
    Lost,
    /// Survived until the win time
    Won,
}

/// Elemental damage types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Ice,
    Fire,
}

/// Enemy rank: scales health, score, size and contact damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyRank {
    Normal,
    Elite,
    Boss,
}

impl EnemyRank {
    pub fn health_multiplier(&self) -> f32 {
        match self {
            EnemyRank::Normal => 1.0,
            EnemyRank::Elite => ELITE_HEALTH_MULT,
            EnemyRank::Boss => BOSS_HEALTH_MULT,
        }
    }

    pub fn score_multiplier(&self) -> u64 {
        match self {
            EnemyRank::Normal => 1,
            EnemyRank::Elite => ELITE_SCORE_MULT,
            EnemyRank::Boss => BOSS_SCORE_MULT,
        }
    }

    pub fn radius_multiplier(&self) -> f32 {
        match self {
            EnemyRank::Normal => 1.0,
            EnemyRank::Elite => ELITE_RADIUS_MULT,
            EnemyRank::Boss => BOSS_RADIUS_MULT,
        }
    }

    pub fn base_speed(&self) -> f32 {
        match self {
            EnemyRank::Normal => ENEMY_SPEED,
            EnemyRank::Elite => ELITE_SPEED,
            EnemyRank::Boss => BOSS_SPEED,
        }
    }

    /// Shield damage dealt when this enemy reaches the player
    pub fn collision_damage(&self) -> f32 {
        match self {
            EnemyRank::Normal => COLLISION_DAMAGE_NORMAL,
            EnemyRank::Elite => COLLISION_DAMAGE_ELITE,
            EnemyRank::Boss => COLLISION_DAMAGE_BOSS,
        }
    }
}

/// Enemy category; special kinds burst on death
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Standard,
    /// Freezes nearby enemies when killed
    Frost,
    /// Ignites nearby enemies when killed
    Ember,
}

/// Timed status effects on an enemy (absolute ms timestamps)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub frozen_until: Option<f64>,
    pub burning_until: Option<f64>,
    /// Next damage-over-time tick
    pub next_burn_tick: f64,
    pub burn_damage: f32,
}

/// A hostile unit closing in on the player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub pos: Vec2,
    /// Fixed at spawn, pointed at the screen center
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    /// Word the player types to target this enemy
    pub word: String,
    pub rank: EnemyRank,
    pub kind: EnemyKind,
    pub status: StatusEffects,
    /// Fraction of the word typed so far (0-1)
    pub typed_progress: f32,
    pub highlighted: bool,
    /// Remaining red flash after a wrong keystroke (seconds)
    pub wrong_flash: f32,
    pub points: u64,
    pub xp: u32,
}

impl Enemy {
    pub fn is_frozen(&self, now_ms: f64) -> bool {
        self.status.frozen_until.is_some_and(|t| now_ms < t)
    }

    pub fn is_burning(&self, now_ms: f64) -> bool {
        self.status.burning_until.is_some_and(|t| now_ms < t)
    }

    /// Movement multiplier from status effects
    pub fn speed_factor(&self, now_ms: f64) -> f32 {
        if self.is_frozen(now_ms) {
            FREEZE_SPEED_FACTOR
        } else {
            1.0
        }
    }

    pub fn health_ratio(&self) -> f32 {
        ratio_or_zero(self.health, self.max_health).clamp(0.0, 1.0)
    }
}

/// Projectile flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    Normal,
    Bouncing,
    /// Multi-shot echo
    Multi,
    Elemental(Element),
}

impl ProjectileKind {
    pub fn supports_bounce(&self) -> bool {
        matches!(self, ProjectileKind::Bouncing)
    }

    pub fn element(&self) -> Option<Element> {
        match self {
            ProjectileKind::Elemental(element) => Some(*element),
            _ => None,
        }
    }
}

/// A shot in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    /// Start of the current path (the player, or the last bounce point)
    pub origin: Vec2,
    pub pos: Vec2,
    pub target: Vec2,
    /// Enemy being homed on; the target point follows it while alive
    pub target_id: Option<EntityId>,
    /// Progress along origin -> target (0-1)
    pub progress: f32,
    /// Travel speed (pixels/s)
    pub speed: f32,
    pub damage: f32,
    pub critical: bool,
    pub size: f32,
    /// Hit budget; spent per hit, consumed at <= 0
    pub durability: f32,
    pub bounces_left: u32,
    pub bounce_range: f32,
    /// Enemies already struck by this projectile
    pub hit_ids: Vec<EntityId>,
    pub kind: ProjectileKind,
    /// Fired by the player's own completed word
    pub primary: bool,
    /// Splash radius (0 = none)
    pub aoe_radius: f32,
}

/// Relic rarity tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Relative drop weight
    pub fn weight(&self) -> u32 {
        match self {
            Rarity::Common => 60,
            Rarity::Rare => 28,
            Rarity::Epic => 10,
            Rarity::Legendary => 2,
        }
    }

    /// How long a star carrying this rarity stays on screen
    pub fn ttl_ms(&self) -> f64 {
        match self {
            Rarity::Common => 14_000.0,
            Rarity::Rare => 11_000.0,
            Rarity::Epic => 8_000.0,
            Rarity::Legendary => 6_000.0,
        }
    }
}

/// A flying pickup carrying one relic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelicStar {
    pub id: EntityId,
    pub relic: RelicId,
    pub word: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub expires_at: f64,
    pub typed_progress: f32,
    pub highlighted: bool,
    pub wrong_flash: f32,
}

/// Explosion flavors (color lookup for rendering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionKind {
    Kill,
    Impact,
    Frost,
    Fire,
    Area,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

/// Cosmetic explosion (no gameplay effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ExplosionKind,
    /// 0-1, removed at 1
    pub progress: f32,
    pub particles: Vec<Particle>,
}

/// Floating text flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloatingKind {
    Damage { critical: bool },
    Xp,
    Warning,
    Info,
}

/// Floating damage number or message (no gameplay effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub kind: FloatingKind,
    pub progress: f32,
}

/// The player: Earth, fixed at the center of the canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,

    // === Defense ===
    pub shield: f32,
    pub max_shield: f32,
    /// Shield per second
    pub shield_regen: f32,
    /// Multiplier on regen
    pub shield_efficiency: f32,

    // === Offense ===
    pub damage: f32,
    pub damage_multiplier: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    /// Targets per completed word
    pub multi_shot: u32,
    pub bounce_count: u32,
    pub bounce_range: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,
    pub projectile_durability: f32,
    pub aoe_radius: f32,

    // === Progression ===
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub xp_multiplier: f32,

    // === Triggers ===
    /// Auto-fire period, once learned
    pub auto_fire_interval_ms: Option<f64>,
    pub next_auto_fire_at: Option<f64>,
    pub ice_kills: u32,
    pub fire_kills: u32,

    /// Learned skill levels
    pub skills: BTreeMap<SkillKind, u32>,
    /// Collected relics (unique)
    pub relics: BTreeSet<RelicId>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: PLAYER_RADIUS,
            shield: PLAYER_MAX_SHIELD,
            max_shield: PLAYER_MAX_SHIELD,
            shield_regen: PLAYER_SHIELD_REGEN,
            shield_efficiency: 1.0,
            damage: BASE_DAMAGE,
            damage_multiplier: 1.0,
            crit_chance: BASE_CRIT_CHANCE,
            crit_multiplier: BASE_CRIT_MULTIPLIER,
            multi_shot: 1,
            bounce_count: 0,
            bounce_range: BASE_BOUNCE_RANGE,
            projectile_speed: BASE_PROJECTILE_SPEED,
            projectile_size: BASE_PROJECTILE_SIZE,
            projectile_durability: BASE_PROJECTILE_DURABILITY,
            aoe_radius: 0.0,
            level: 1,
            xp: 0,
            xp_to_next: BASE_XP_TO_LEVEL,
            xp_multiplier: 1.0,
            auto_fire_interval_ms: None,
            next_auto_fire_at: None,
            ice_kills: 0,
            fire_kills: 0,
            skills: BTreeMap::new(),
            relics: BTreeSet::new(),
        }
    }

    pub fn skill_level(&self, skill: SkillKind) -> u32 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    /// Damage of one unmodified hit
    pub fn hit_damage(&self) -> f32 {
        self.damage * self.damage_multiplier
    }

    /// Lose shield, clamped at zero. Returns true if the shield is depleted.
    pub fn take_shield_damage(&mut self, amount: f32) -> bool {
        self.shield = (self.shield - amount.max(0.0)).clamp(0.0, self.max_shield);
        self.shield <= 0.0
    }

    pub fn restore_shield(&mut self, amount: f32) {
        self.shield = (self.shield + amount.max(0.0)).min(self.max_shield);
    }

    pub fn shield_ratio(&self) -> f32 {
        ratio_or_zero(self.shield, self.max_shield).clamp(0.0, 1.0)
    }

    pub fn xp_ratio(&self) -> f32 {
        ratio_or_zero(self.xp as f32, self.xp_to_next as f32).clamp(0.0, 1.0)
    }
}

/// Something that happened during a tick or keystroke.
///
/// Cosmetic requests (`Explosion`, `FloatingText`) are turned into effect
/// entities when the driver drains the queue; the rest is handed to the
/// host for audio/UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GameEvent {
    ShotFired { target: EntityId, primary: bool },
    EnemyKilled { id: EntityId, points: u64, xp: u32, kind: EnemyKind },
    PlayerHit { damage: f32 },
    WrongInput,
    LevelUp { level: u32 },
    RelicSpawned { relic: RelicId },
    RelicCollected { relic: RelicId },
    RelicExpired { relic: RelicId },
    WaveComplete { wave: u32 },
    Barrage { element: Element, targets: usize },
    GameOver { won: bool },
    Explosion { pos: Vec2, radius: f32, kind: ExplosionKind },
    FloatingText { pos: Vec2, text: String, kind: FloatingKind },
}

/// Words currently on screen (enemies and relic stars)
pub fn live_words<'a>(enemies: &'a [Enemy], stars: &'a [RelicStar]) -> Vec<&'a str> {
    enemies
        .iter()
        .map(|e| e.word.as_str())
        .chain(stars.iter().map(|s| s.word.as_str()))
        .collect()
}

/// Absolute-time timers owned by the scheduler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timers {
    pub next_enemy_spawn_at: Option<f64>,
    pub next_relic_spawn_at: Option<f64>,
}

/// Complete game state for one run
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub settings: Settings,
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip)]
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Time of the most recent tick (ms)
    pub now_ms: f64,
    /// Logical start time, pushed forward by paused durations
    pub start_time_ms: f64,

    // === Progress ===
    pub wave: u32,
    /// Enemies spawned for the current wave (culled ones are refunded)
    pub wave_spawned: u32,
    /// Enemies killed or crashed during the current wave
    pub wave_defeated: u32,
    pub score: u64,
    pub kills: u32,

    // === Entities ===
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub relic_stars: Vec<RelicStar>,
    pub projectiles: Vec<Projectile>,
    pub explosions: Vec<Explosion>,
    pub floating_texts: Vec<FloatingText>,

    // === Coordination ===
    pub typing: TypingState,
    pub pause: PauseState,
    pub timers: Timers,
    pub scheduled: Vec<ScheduledAction>,
    pub level_up: Option<LevelUpOffer>,
    /// Level-ups earned but not yet offered
    pub pending_level_ups: u32,
    pub relic_announcement: Option<RelicId>,

    /// Full-screen red flash after wrong input (0-1)
    pub screen_flash: f32,

    /// Events raised since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: EntityId,
}

impl GameState {
    /// Create a fresh run starting at `now_ms`
    pub fn new(settings: Settings, now_ms: f64) -> Self {
        let center = Vec2::new(settings.canvas_width / 2.0, settings.canvas_height / 2.0);
        let seed = settings.seed;
        let wave = settings.start_wave.max(1);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            now_ms,
            start_time_ms: now_ms,
            wave,
            wave_spawned: 0,
            wave_defeated: 0,
            score: 0,
            kills: 0,
            player: Player::new(center),
            enemies: Vec::new(),
            relic_stars: Vec::new(),
            projectiles: Vec::new(),
            explosions: Vec::new(),
            floating_texts: Vec::new(),
            typing: TypingState::default(),
            pause: PauseState::default(),
            timers: Timers::default(),
            scheduled: Vec::new(),
            level_up: None,
            pending_level_ups: 0,
            relic_announcement: None,
            screen_flash: 0.0,
            events: Vec::new(),
            next_id: 1,
            settings,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.settings.canvas_width / 2.0, self.settings.canvas_height / 2.0)
    }

    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.settings.canvas_width, self.settings.canvas_height)
    }

    pub fn is_over(&self) -> bool {
        self.phase != GamePhase::Playing
    }

    /// Manual pause, level-up selection or relic announcement
    pub fn is_effectively_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Nothing more may happen until the host resumes or restarts
    pub fn is_halted(&self) -> bool {
        self.is_over() || self.is_effectively_paused()
    }

    /// Survival time excluding paused intervals
    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        let until = self.pause.paused_at.unwrap_or(now_ms);
        (until - self.start_time_ms).max(0.0)
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.iter().position(|e| e.id == id)
    }

    /// Live enemies ordered by distance from `from`, skipping `exclude`
    pub fn nearest_enemies(&self, from: Vec2, exclude: &[EntityId]) -> Vec<EntityId> {
        let mut candidates: Vec<(EntityId, f32)> = self
            .enemies
            .iter()
            .filter(|e| !exclude.contains(&e.id))
            .map(|e| (e.id, e.pos.distance_squared(from)))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        candidates.into_iter().map(|(id, _)| id).collect()
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Queue a floating message
    pub fn float_text(&mut self, pos: Vec2, text: impl Into<String>, kind: FloatingKind) {
        self.events.push(GameEvent::FloatingText {
            pos,
            text: text.into(),
            kind,
        });
    }

    pub fn explode(&mut self, pos: Vec2, radius: f32, kind: ExplosionKind) {
        self.events.push(GameEvent::Explosion { pos, radius, kind });
    }

    /// End the run. Only the first call has any effect.
    pub fn end_game(&mut self, won: bool) {
        if self.is_over() {
            return;
        }
        self.phase = if won { GamePhase::Won } else { GamePhase::Lost };
        self.timers = Timers::default();
        self.player.next_auto_fire_at = None;
        self.scheduled.clear();
        log::info!(
            "Game over ({}): wave {}, score {}, kills {}",
            if won { "won" } else { "lost" },
            self.wave,
            self.score,
            self.kills
        );
        self.events.push(GameEvent::GameOver { won });
    }
}
