//! Random number generator abstraction.
//!
//! Domain code that needs randomness (feedback access codes, for one)
//! draws from a [`DeterministicRng`] carried by the context, so tests can
//! inject a seeded or scripted implementation.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;
}

/// Production RNG, seeded from the operating system.
#[derive(Debug)]
pub struct SystemRng(StdRng);

impl SystemRng {
    /// Creates an RNG seeded from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self(StdRng::from_os_rng())
    }

    /// Creates an RNG with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SystemRng {
    fn default() -> Self {
        Self::new()
    }
}

impl DeterministicRng for SystemRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        self.0.random_range(min..=max)
    }
}

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Draws an alphanumeric string of `len` characters.
pub fn alphanumeric(rng: &mut dyn DeterministicRng, len: usize) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let max = (ALPHANUMERIC.len() - 1) as u32;
    (0..len)
        .map(|_| ALPHANUMERIC[rng.next_u32_range(0, max) as usize] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SystemRng::seeded(7);
        let mut b = SystemRng::seeded(7);

        assert_eq!(alphanumeric(&mut a, 16), alphanumeric(&mut b, 16));
    }

    #[test]
    fn test_alphanumeric_has_requested_length_and_charset() {
        let mut rng = SystemRng::new();

        let code = alphanumeric(&mut rng, 12);

        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
