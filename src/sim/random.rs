//! Seedable xorshift128 generator
//!
//! Every random decision in a game goes through the generator owned by that
//! game, so a seed reproduces a whole session.

use rand::rand_core::impls;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Marsaglia's xorshift128 (32-bit lanes)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Xorshift128 {
    x: u32,
    y: u32,
    z: u32,
    w: u32,
}

/// Used when a seed would leave every lane at zero
const FALLBACK_STATE: [u32; 4] = [123_456_789, 362_436_069, 521_288_629, 88_675_123];

impl Xorshift128 {
    pub fn new(seed: u64) -> Self {
        Self::seed_from_u64(seed)
    }

    fn from_lanes(lanes: [u32; 4]) -> Self {
        let [x, y, z, w] = if lanes == [0; 4] { FALLBACK_STATE } else { lanes };
        Self { x, y, z, w }
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let mut t = self.x;
        t ^= t << 11;
        t ^= t >> 8;
        self.x = self.y;
        self.y = self.z;
        self.z = self.w;
        self.w ^= self.w >> 19;
        self.w ^= t;
        self.w
    }
}

impl RngCore for Xorshift128 {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.step());
        let low = u64::from(self.step());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        impls::fill_bytes_via_next(self, dst)
    }
}

impl SeedableRng for Xorshift128 {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let mut lanes = [0u32; 4];
        for (lane, bytes) in lanes.iter_mut().zip(seed.chunks_exact(4)) {
            *lane = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        Self::from_lanes(lanes)
    }
}

/// Smallest power of two strictly greater than `number`
fn next_power_of_two_above(mut number: u64) -> u64 {
    let mut result = 1;
    while number != 0 {
        number >>= 1;
        result <<= 1;
    }
    result
}

/// Uniform integer in `[minimum, maximum]`
///
/// Uses rejection sampling over the next power of two, so there is no modulo bias.
///
/// # Panics
///
/// Panics if `maximum < minimum`.
pub fn random_integer<R: RngCore + ?Sized>(rng: &mut R, minimum: i32, maximum: i32) -> i32 {
    assert!(
        minimum <= maximum,
        "empty random range [{minimum}, {maximum}]"
    );
    let range = (i64::from(maximum) - i64::from(minimum) + 1) as u64;
    let modulus = next_power_of_two_above(range);
    loop {
        let value = rng.next_u64() % modulus;
        if value < range {
            return (i64::from(minimum) + value as i64) as i32;
        }
    }
}

/// Fair coin
pub fn coin_flip<R: RngCore + ?Sized>(rng: &mut R) -> bool {
    random_integer(rng, 0, 1) != 0
}
