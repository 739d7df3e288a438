//! Word pool for enemies and relic stars
//!
//! Words are lowercase ASCII; matching elsewhere is case-insensitive.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Word length tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordTier {
    Short,
    Medium,
    Long,
}

const SHORT_WORDS: &[&str] = &[
    "ace", "arc", "axe", "bay", "bolt", "cog", "dart", "dew", "dusk", "echo", "elm", "fang", "fizz",
    "glow", "gust", "hex", "hull", "ion", "jab", "jolt", "keel", "kite", "lux", "mist", "moon",
    "nova", "nub", "oak", "orb", "pod", "pulse", "quay", "ray", "rift", "sol", "spin", "tide",
    "tusk", "urn", "vex", "void", "warp", "wisp", "yak", "yew", "zap", "zinc",
];

const MEDIUM_WORDS: &[&str] = &[
    "anchor", "beacon", "blazer", "cinder", "cosmic", "dynamo", "ember", "fathom", "frozen",
    "galaxy", "glider", "harbor", "hunter", "igloo", "jigsaw", "jungle", "kernel", "kindle",
    "lantern", "meteor", "mirage", "nebula", "nimbus", "orbit", "oxygen", "photon", "plasma",
    "quasar", "quiver", "radar", "rocket", "saturn", "signal", "tundra", "turret", "umbra",
    "vector", "vortex", "walker", "wander", "xenon", "yonder", "zealot", "zenith",
];

const LONG_WORDS: &[&str] = &[
    "asteroid", "blackhole", "celestial", "constellation", "dreadnought", "eclipse",
    "firmament", "gravitation", "hyperdrive", "interstellar", "juggernaut", "kaleidoscope",
    "leviathan", "magnetosphere", "nightshade", "observatory", "protostar", "quicksilver",
    "radiation", "spacecraft", "supernova", "telescope", "ultraviolet", "vanguard",
    "wavelength", "xenolith", "yesteryear", "zeppelin",
];

impl WordTier {
    pub fn words(&self) -> &'static [&'static str] {
        match self {
            WordTier::Short => SHORT_WORDS,
            WordTier::Medium => MEDIUM_WORDS,
            WordTier::Long => LONG_WORDS,
        }
    }
}

/// Attempts spent looking for a word with an unused first letter
const DISTINCT_ATTEMPTS: usize = 12;

/// Draw a word from `tier`, preferring one whose first letter no live word
/// uses, then one that at least differs from every live word.
pub fn draw_word<R: Rng + ?Sized>(rng: &mut R, tier: WordTier, live: &[&str]) -> String {
    let pool = tier.words();
    let first_letter_taken = |w: &str| live.iter().any(|l| l.chars().next() == w.chars().next());

    let mut fallback: Option<&str> = None;
    for _ in 0..DISTINCT_ATTEMPTS {
        let Some(&word) = pool.choose(rng) else {
            break;
        };
        if !first_letter_taken(word) {
            return word.to_string();
        }
        if fallback.is_none() && !live.contains(&word) {
            fallback = Some(word);
        }
    }

    fallback
        .or_else(|| pool.iter().copied().find(|w| !live.contains(w)))
        .or_else(|| pool.first().copied())
        .unwrap_or("typo")
        .to_string()
}
