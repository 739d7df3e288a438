//! Skill and relic catalogs
//!
//! Skills are offered on level-up and can be taken several times up to a cap.
//! Relics are one-off stat modifiers carried by relic stars.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::state::{Player, Rarity};
use crate::consts::*;

/// Level-up skills
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Damage,
    CritChance,
    CritDamage,
    MultiShot,
    Bounce,
    ProjectileSpeed,
    Piercing,
    ShieldCapacity,
    ShieldRegen,
    AutoFire,
    IceMastery,
    FireMastery,
    XpBoost,
}

impl SkillKind {
    pub const ALL: [SkillKind; 13] = [
        SkillKind::Damage,
        SkillKind::CritChance,
        SkillKind::CritDamage,
        SkillKind::MultiShot,
        SkillKind::Bounce,
        SkillKind::ProjectileSpeed,
        SkillKind::Piercing,
        SkillKind::ShieldCapacity,
        SkillKind::ShieldRegen,
        SkillKind::AutoFire,
        SkillKind::IceMastery,
        SkillKind::FireMastery,
        SkillKind::XpBoost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Damage => "Heavy Rounds",
            SkillKind::CritChance => "Keen Eye",
            SkillKind::CritDamage => "Executioner",
            SkillKind::MultiShot => "Split Shot",
            SkillKind::Bounce => "Ricochet",
            SkillKind::ProjectileSpeed => "Railgun",
            SkillKind::Piercing => "Piercing Rounds",
            SkillKind::ShieldCapacity => "Reinforced Shield",
            SkillKind::ShieldRegen => "Shield Regenerator",
            SkillKind::AutoFire => "Sentry Laser",
            SkillKind::IceMastery => "Ice Mastery",
            SkillKind::FireMastery => "Fire Mastery",
            SkillKind::XpBoost => "Fast Learner",
        }
    }

    pub fn max_level(&self) -> u32 {
        match self {
            SkillKind::CritDamage
            | SkillKind::MultiShot
            | SkillKind::Bounce
            | SkillKind::ProjectileSpeed
            | SkillKind::Piercing
            | SkillKind::XpBoost => 3,
            _ => 5,
        }
    }

    /// Apply one level of this skill
    pub fn apply(&self, player: &mut Player) {
        let level = player.skill_level(*self) + 1;
        player.skills.insert(*self, level);

        match self {
            SkillKind::Damage => player.damage += 3.0,
            SkillKind::CritChance => player.crit_chance = (player.crit_chance + 0.05).min(1.0),
            SkillKind::CritDamage => player.crit_multiplier += 0.5,
            SkillKind::MultiShot => player.multi_shot += 1,
            SkillKind::Bounce => {
                player.bounce_count += 1;
                player.bounce_range += 20.0;
            }
            SkillKind::ProjectileSpeed => player.projectile_speed *= 1.2,
            SkillKind::Piercing => {
                player.projectile_durability += 1.0;
                player.projectile_size += 1.0;
            }
            SkillKind::ShieldCapacity => {
                player.max_shield += 20.0;
                player.restore_shield(20.0);
            }
            SkillKind::ShieldRegen => player.shield_regen += 0.5,
            SkillKind::AutoFire => {
                player.auto_fire_interval_ms = Some(auto_fire_interval_ms(level));
                // Re-armed by the driver on the next unpaused tick
                player.next_auto_fire_at = None;
            }
            SkillKind::IceMastery | SkillKind::FireMastery => {}
            SkillKind::XpBoost => player.xp_multiplier += 0.15,
        }
    }
}

/// Auto-fire period at a given skill level
pub fn auto_fire_interval_ms(level: u32) -> f64 {
    let steps = level.saturating_sub(1) as f64;
    (AUTO_FIRE_BASE_INTERVAL_MS - steps * AUTO_FIRE_INTERVAL_STEP_MS).max(AUTO_FIRE_MIN_INTERVAL_MS)
}

/// Kills needed to trigger an elemental barrage at a given mastery level
pub fn mastery_threshold(level: u32) -> u32 {
    let reduction = level.saturating_sub(1) * MASTERY_THRESHOLD_STEP;
    MASTERY_BASE_THRESHOLD
        .saturating_sub(reduction)
        .max(MASTERY_MIN_THRESHOLD)
}

/// Targets hit by one barrage at a given mastery level
pub fn barrage_targets(level: u32) -> usize {
    MASTERY_BASE_TARGETS + level.saturating_sub(1) as usize
}

/// Skills presented to the player after a level-up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUpOffer {
    pub level: u32,
    pub choices: Vec<SkillKind>,
}

/// Draw up to `LEVEL_UP_CHOICES` distinct skills the player can still take.
/// Returns `None` when every skill is maxed.
pub fn draw_offer<R: Rng + ?Sized>(rng: &mut R, player: &Player) -> Option<LevelUpOffer> {
    let mut open: Vec<SkillKind> = SkillKind::ALL
        .iter()
        .copied()
        .filter(|s| player.skill_level(*s) < s.max_level())
        .collect();
    if open.is_empty() {
        return None;
    }
    open.shuffle(rng);
    open.truncate(LEVEL_UP_CHOICES);
    Some(LevelUpOffer {
        level: player.level,
        choices: open,
    })
}

/// Relic catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RelicId {
    WhetStone,
    CoolantCell,
    LuckyCoin,
    ThickPlating,
    Prism,
    RicochetCore,
    TomeOfInsight,
    Accelerator,
    ShatterLens,
    BlastCharge,
    Overcharger,
    HeartOfEarth,
    Singularity,
}

/// Immutable relic descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relic {
    pub id: RelicId,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: Rarity,
}

impl RelicId {
    pub const ALL: [RelicId; 13] = [
        RelicId::WhetStone,
        RelicId::CoolantCell,
        RelicId::LuckyCoin,
        RelicId::ThickPlating,
        RelicId::Prism,
        RelicId::RicochetCore,
        RelicId::TomeOfInsight,
        RelicId::Accelerator,
        RelicId::ShatterLens,
        RelicId::BlastCharge,
        RelicId::Overcharger,
        RelicId::HeartOfEarth,
        RelicId::Singularity,
    ];

    pub fn descriptor(&self) -> Relic {
        use Rarity::*;
        let (name, description, rarity) = match self {
            RelicId::WhetStone => ("Whetstone", "+2 damage", Common),
            RelicId::CoolantCell => ("Coolant Cell", "+0.5 shield regen", Common),
            RelicId::LuckyCoin => ("Lucky Coin", "+5% crit chance", Common),
            RelicId::ThickPlating => ("Thick Plating", "+20 max shield", Common),
            RelicId::Prism => ("Prism", "+1 target per word", Rare),
            RelicId::RicochetCore => ("Ricochet Core", "+1 bounce, +40 bounce range", Rare),
            RelicId::TomeOfInsight => ("Tome of Insight", "+25% XP", Rare),
            RelicId::Accelerator => ("Accelerator", "+30% projectile speed", Rare),
            RelicId::ShatterLens => ("Shatter Lens", "+0.5 crit multiplier", Epic),
            RelicId::BlastCharge => ("Blast Charge", "Shots splash for 60px", Epic),
            RelicId::Overcharger => ("Overcharger", "+20% damage", Epic),
            RelicId::HeartOfEarth => ("Heart of Earth", "+50 max shield, full repair, +25% regen", Legendary),
            RelicId::Singularity => ("Singularity", "Shots pierce one more enemy", Legendary),
        };
        Relic {
            id: *self,
            name,
            description,
            rarity,
        }
    }

    pub fn rarity(&self) -> Rarity {
        self.descriptor().rarity
    }

    /// Apply this relic's modifier
    pub fn apply(&self, player: &mut Player) {
        match self {
            RelicId::WhetStone => player.damage += 2.0,
            RelicId::CoolantCell => player.shield_regen += 0.5,
            RelicId::LuckyCoin => player.crit_chance = (player.crit_chance + 0.05).min(1.0),
            RelicId::ThickPlating => {
                player.max_shield += 20.0;
                player.restore_shield(20.0);
            }
            RelicId::Prism => player.multi_shot += 1,
            RelicId::RicochetCore => {
                player.bounce_count += 1;
                player.bounce_range += 40.0;
            }
            RelicId::TomeOfInsight => player.xp_multiplier += 0.25,
            RelicId::Accelerator => player.projectile_speed *= 1.3,
            RelicId::ShatterLens => player.crit_multiplier += 0.5,
            RelicId::BlastCharge => player.aoe_radius = player.aoe_radius.max(60.0),
            RelicId::Overcharger => player.damage_multiplier += 0.2,
            RelicId::HeartOfEarth => {
                player.max_shield += 50.0;
                player.shield = player.max_shield;
                player.shield_efficiency += 0.25;
            }
            RelicId::Singularity => {
                player.projectile_durability += 1.0;
                player.projectile_size += 2.0;
            }
        }
        player.relics.insert(*self);
    }
}

/// Weighted pick among relics not yet collected and not in `exclude`.
/// `None` when the pool is exhausted.
pub fn pick_relic<R: Rng + ?Sized>(
    rng: &mut R,
    player: &Player,
    exclude: &[RelicId],
) -> Option<RelicId> {
    let available: Vec<RelicId> = RelicId::ALL
        .iter()
        .copied()
        .filter(|r| !player.relics.contains(r) && !exclude.contains(r))
        .collect();
    let total: u32 = available.iter().map(|r| r.rarity().weight()).sum();
    if total == 0 {
        return None;
    }

    let mut roll = rng.random_range(0..total);
    for relic in available {
        let weight = relic.rarity().weight();
        if roll < weight {
            return Some(relic);
        }
        roll -= weight;
    }
    None
}
