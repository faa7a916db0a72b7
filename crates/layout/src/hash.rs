//! Deterministic "randomness" derived from entity identity.
//!
//! Nothing in layout generation touches a shared RNG. Every jittered value is
//! a pure function of an identity string (or a block/plaza key) plus a salt,
//! so the same roster always produces the same city and the generator can be
//! run from any thread.

use xxhash_rust::xxh32::xxh32;

/// Seed fed to xxh32 for all identity hashes.
const IDENTITY_HASH_SEED: u32 = 0x5EED_C17E;

// Numerical Recipes LCG constants.
const LCG_MUL: u32 = 1_664_525;
const LCG_INC: u32 = 1_013_904_223;
/// Golden-ratio increment used to spread salts across the u32 range.
const SALT_SPREAD: u32 = 0x9E37_79B9;

/// Stable 32-bit hash of an identity string.
pub fn identity_seed(identity: &str) -> u32 {
    xxh32(identity.as_bytes(), IDENTITY_HASH_SEED)
}

/// Stable 32-bit hash of an integer grid key (block or plaza coordinates).
pub fn grid_seed(x: i32, y: i32) -> u32 {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&x.to_le_bytes());
    bytes[4..].copy_from_slice(&y.to_le_bytes());
    xxh32(&bytes, IDENTITY_HASH_SEED)
}

/// Stable 32-bit hash of a plain index (plaza slots).
pub fn index_seed(index: u32) -> u32 {
    xxh32(&index.to_le_bytes(), IDENTITY_HASH_SEED)
}

/// One LCG step from `seed` mixed with `salt`, mapped into [0, 1).
///
/// Different salts decorrelate values drawn from the same seed (width vs depth).
pub fn unit(seed: u32, salt: u32) -> f32 {
    let state = seed
        .wrapping_add(salt.wrapping_mul(SALT_SPREAD))
        .wrapping_mul(LCG_MUL)
        .wrapping_add(LCG_INC);
    to_unit(state)
}

/// Convenience for `unit(identity_seed(identity), salt)`.
pub fn identity_unit(identity: &str, salt: u32) -> f32 {
    unit(identity_seed(identity), salt)
}

#[inline]
fn to_unit(state: u32) -> f32 {
    // Top 24 bits fit an f32 mantissa exactly, so the result is always < 1.0.
    (state >> 8) as f32 / (1u32 << 24) as f32
}

/// Small linear-congruential generator for sequences of values from one seed
/// (e.g. the trees scattered around one plaza).
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u32,
}

impl DetRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn from_identity(identity: &str) -> Self {
        Self::new(identity_seed(identity))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC);
        self.state
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        to_unit(self.next_u32())
    }

    /// Uniform in [min, max).
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Uniform integer in [min, max] (inclusive).
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + ((self.next_f32() * span as f32) as u32).min(span - 1)
    }
}
