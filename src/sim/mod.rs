//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only comes in through `tick` and host actions
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod combat;
pub mod factory;
pub mod pause;
pub mod projectile;
pub mod schedule;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod typing;
pub mod upgrades;

pub use combat::{Damageable, Hit, ShotSpec, apply_damage, choose_skill};
pub use pause::{PauseReason, end_pause, start_pause, toggle_manual_pause};
pub use snapshot::{Laser, RenderSnapshot, snapshot};
pub use state::{
    Element, Enemy, EnemyKind, EnemyRank, EntityId, GameEvent, GamePhase, GameState, Player,
    Projectile, ProjectileKind, Rarity, RelicStar,
};
#[cfg(not(target_arch = "wasm32"))]
pub use tick::SystemClock;
pub use tick::{Clock, Driver, FrameLimiter, ManualClock, tick};
pub use typing::{ClearReason, Key, KeyOutcome, close_relic_announcement, handle_key};
pub use upgrades::{LevelUpOffer, Relic, RelicId, SkillKind};
