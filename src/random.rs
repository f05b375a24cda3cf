//! Deterministic hash-based randomness.
//!
//! A [`RandomStream`] never mutates: every draw is a pure function of the
//! stream seed and an explicit draw counter (xxHash32 of a single word).
//! Nested randomness is obtained through [`RandomStream::derive_sub`], which
//! seeds an independent stream from one draw of the parent. This is what lets
//! poles be generated in any order (or in parallel) without influencing
//! each other.

use std::f32::consts::PI;

use cgmath::Vector2;

const PRIME32_1: u32 = 2_654_435_761;
const PRIME32_2: u32 = 2_246_822_519;
const PRIME32_3: u32 = 3_266_489_917;
const PRIME32_4: u32 = 668_265_263;
const PRIME32_5: u32 = 374_761_393;

/// Seeded xxHash32 stream. Cheap to copy, carries no state besides the seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RandomStream {
    seed: u32,
}

impl RandomStream {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// xxHash32 of a single 4-byte input.
    fn hash(seed: u32, data: u32) -> u32 {
        let mut h = seed.wrapping_add(PRIME32_5).wrapping_add(4);
        h = h.wrapping_add(data.wrapping_mul(PRIME32_3));
        h = h.rotate_left(17).wrapping_mul(PRIME32_4);
        h ^= h >> 15;
        h = h.wrapping_mul(PRIME32_2);
        h ^= h >> 13;
        h = h.wrapping_mul(PRIME32_3);
        h ^= h >> 16;
        h
    }

    pub fn uint(&self, counter: u32) -> u32 {
        Self::hash(self.seed, counter)
    }

    /// Uniform integer in `[0, max)`. Returns 0 when `max == 0`.
    pub fn int_range(&self, max: u32, counter: u32) -> u32 {
        if max == 0 { 0 } else { self.uint(counter) % max }
    }

    pub fn bool(&self, counter: u32) -> bool {
        self.uint(counter) & 1 != 0
    }

    /// Uniform float in `[0, 1)`, built from the top 24 bits of the hash so
    /// that every value is exactly representable.
    pub fn float(&self, counter: u32) -> f32 {
        (self.uint(counter) >> 8) as f32 * (1.0 / 16_777_216.0)
    }

    /// Uniform float in `[lo, hi)`. An empty range (`hi <= lo`) yields `lo`.
    pub fn float_range(&self, lo: f32, hi: f32, counter: u32) -> f32 {
        lerp_below(lo, hi, self.float(counter))
    }

    /// Point uniformly distributed inside the unit disk.
    ///
    /// Radius and angle come from two decorrelated hashes of the same
    /// counter, so this consumes a single counter value.
    pub fn point_in_disk(&self, counter: u32) -> Vector2<f32> {
        let u1 = self.float(counter);
        let u2 = (Self::hash(self.seed.wrapping_add(PRIME32_1), counter) >> 8) as f32
            * (1.0 / 16_777_216.0);
        let r = u1.sqrt();
        let (sin, cos) = (2.0 * PI * u2).sin_cos();
        Vector2::new(r * cos, r * sin)
    }

    /// Independent stream seeded from `uint(counter)`.
    pub fn derive_sub(&self, counter: u32) -> RandomStream {
        RandomStream::new(self.uint(counter))
    }
}

/// Maps `u` in `[0, 1)` onto `[lo, hi)`.
///
/// `lo + (hi - lo) * u` can round up to `hi` for `u` close to 1, so the
/// result is clamped to the largest float below `hi`.
fn lerp_below(lo: f32, hi: f32, u: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    let v = lo + (hi - lo) * u;
    if v < hi { v } else { next_below(hi).max(lo) }
}

/// Largest finite `f32` strictly below `x`, for finite `x`.
fn next_below(x: f32) -> f32 {
    if x == 0.0 {
        -f32::from_bits(1)
    } else if x > 0.0 {
        f32::from_bits(x.to_bits() - 1)
    } else {
        f32::from_bits(x.to_bits() + 1)
    }
}

/// A stream paired with the next unused counter.
///
/// Every draw consumes exactly one counter value, so the sequence of values
/// depends only on the order of calls on this cursor.
#[derive(Clone, Debug)]
pub struct StreamCursor {
    stream: RandomStream,
    counter: u32,
}

impl StreamCursor {
    pub fn new(stream: RandomStream) -> Self {
        Self { stream, counter: 0 }
    }

    pub fn stream(&self) -> RandomStream {
        self.stream
    }

    /// Number of counter values consumed so far.
    pub fn draws(&self) -> u32 {
        self.counter
    }

    fn next(&mut self) -> u32 {
        let c = self.counter;
        self.counter = self.counter.wrapping_add(1);
        c
    }

    pub fn uint(&mut self) -> u32 {
        let c = self.next();
        self.stream.uint(c)
    }

    pub fn int_range(&mut self, max: u32) -> u32 {
        let c = self.next();
        self.stream.int_range(max, c)
    }

    pub fn bool(&mut self) -> bool {
        let c = self.next();
        self.stream.bool(c)
    }

    pub fn float(&mut self) -> f32 {
        let c = self.next();
        self.stream.float(c)
    }

    pub fn float_range(&mut self, lo: f32, hi: f32) -> f32 {
        let c = self.next();
        self.stream.float_range(lo, hi, c)
    }

    pub fn point_in_disk(&mut self) -> Vector2<f32> {
        let c = self.next();
        self.stream.point_in_disk(c)
    }

    pub fn derive_sub(&mut self) -> RandomStream {
        let c = self.next();
        self.stream.derive_sub(c)
    }
}
