// Fast random number generator: PCG output permutation over an LCG.
//
// Each particle history draws from its own stream, derived from the run
// seed and the history index alone via O(log n) LCG skip-ahead. Banked
// crossing records therefore depend only on (seed, history), never on how
// histories are divided among worker threads.

use rand::{RngCore, SeedableRng};

/// LCG multiplier
const PRN_MULT: u64 = 6364136223846793005;
/// LCG additive constant
const PRN_ADD: u64 = 1442695040888963407;
/// Stream separation between consecutive particle histories
const PRN_STRIDE: u64 = 152917;

/// Fast RNG using a PCG (RXS-M-XS) permutation of a 64-bit LCG.
///
/// Minimal state (one u64), fully inlineable, and seekable: the LCG can be
/// advanced n steps in O(log n), which is what per-history streams use.
#[derive(Clone, Copy, Debug)]
pub struct FastRng {
    seed: u64,
}

impl FastRng {
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// RNG positioned at the start of history `history`'s stream.
    /// Independent of thread partitioning by construction.
    pub fn for_history(master_seed: u64, history: u64) -> Self {
        Self {
            seed: advance_lcg(master_seed, history.wrapping_mul(PRN_STRIDE)),
        }
    }

    /// Generate a random u64 via the PCG output permutation
    #[inline(always)]
    pub fn next_raw(&mut self) -> u64 {
        self.seed = PRN_MULT.wrapping_mul(self.seed).wrapping_add(PRN_ADD);
        let word = ((self.seed >> ((self.seed >> 59) + 5)) ^ self.seed)
            .wrapping_mul(12605985483714917081);
        (word >> 43) ^ word
    }

    /// Generate a random f64 in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        // Equivalent to ldexp(raw, -64)
        (self.next_raw() as f64) * 5.421010862427522e-20
    }

    /// Reseed the generator in place
    #[inline]
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
    }
}

/// Advance an LCG state by n steps in O(log n).
/// Standard Brown/L'Ecuyer skip-ahead: repeatedly square the multiplier
/// while folding the additive constant.
fn advance_lcg(seed: u64, n: u64) -> u64 {
    let mut g = PRN_MULT;
    let mut c = PRN_ADD;
    let mut g_new: u64 = 1;
    let mut c_new: u64 = 0;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            g_new = g_new.wrapping_mul(g);
            c_new = c_new.wrapping_mul(g).wrapping_add(c);
        }
        c = c.wrapping_mul(g.wrapping_add(1));
        g = g.wrapping_mul(g);
        n >>= 1;
    }
    g_new.wrapping_mul(seed).wrapping_add(c_new)
}

impl RngCore for FastRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        (self.next_raw() >> 32) as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.next_raw()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self {
            seed: u64::from_le_bytes(seed),
        }
    }

    fn seed_from_u64(state: u64) -> Self {
        Self { seed: state }
    }
}
