//! Zipfian key generators in the style of YCSB.
//!
//! [`ZipfianGenerator`] produces ranks where small values are the most
//! popular. [`ScrambledZipfianGenerator`] keeps the same popularity curve but
//! hashes each rank with FNV-1a so the hot items are spread across the key
//! space instead of clustering at the low end.
//!
//! Sampling is the inverse-CDF approximation from Gray et al., "Quickly
//! Generating Billion-Record Synthetic Databases" (SIGMOD 1994), as used by
//! YCSB.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Default skew. 0.0 is uniform; values close to 1.0 are highly skewed.
pub const ZIPFIAN_CONSTANT: f64 = 0.99;

/// Number of ranks sampled by [`ScrambledZipfianGenerator`] before scrambling.
pub const ITEM_COUNT: u64 = 10_000_000_000;

/// `zeta(ITEM_COUNT, ZIPFIAN_CONSTANT)`, precomputed because summing ten
/// billion terms at construction is not practical.
pub const ZETAN: f64 = 26.46902820178302;

const FNV_OFFSET_BASIS_64: u64 = 0xCBF2_9CE4_8422_2325;
const FNV_PRIME_64: u64 = 1_099_511_628_211;

/// Computes `zeta(n, theta) = sum(1 / i^theta for i in 1..=n)`.
pub fn zeta(n: u64, theta: f64) -> f64 {
    let mut sum = 0.0;
    for i in 1..=n {
        sum += 1.0 / (i as f64).powf(theta);
    }
    sum
}

/// 64-bit FNV-1a over the little-endian bytes of `value`, folded to a
/// non-negative 63-bit result.
pub fn fnv_hash64(value: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS_64;
    for octet in value.to_le_bytes() {
        hash ^= u64::from(octet);
        hash = hash.wrapping_mul(FNV_PRIME_64);
    }
    (hash as i64).unsigned_abs()
}

/// Zipfian-distributed values in `[min, max]`, popularity decreasing with
/// the value.
///
/// # Example
///
/// ```
/// use weakkit::harness::zipfian::ZipfianGenerator;
///
/// let mut generator = ZipfianGenerator::with_seed(0, 99, 7);
/// for _ in 0..1_000 {
///     assert!(generator.next_value() <= 99);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ZipfianGenerator {
    base: u64,
    items: u64,
    theta: f64,
    zeta_n: f64,
    alpha: f64,
    eta: f64,
    second_threshold: f64,
    rng: SmallRng,
    last: Option<u64>,
}

impl ZipfianGenerator {
    /// Creates a generator over `[min, max]` with a random seed.
    pub fn new(min: u64, max: u64) -> Self {
        Self::with_constant(min, max, ZIPFIAN_CONSTANT, rand::rng().random())
    }

    /// Creates a seeded generator over `[min, max]`.
    pub fn with_seed(min: u64, max: u64, seed: u64) -> Self {
        Self::with_constant(min, max, ZIPFIAN_CONSTANT, seed)
    }

    /// Creates a seeded generator with an explicit skew.
    ///
    /// `theta` is clamped to `[0.0, 0.9999]`; at 1.0 the closed form divides
    /// by zero. Computing zeta is O(items), so very wide ranges are slow to
    /// build. The full `u64` range holds `u64::MAX` items and its top value is
    /// never produced.
    pub fn with_constant(min: u64, max: u64, theta: f64, seed: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let items = (max - min).saturating_add(1);
        let theta = theta.clamp(0.0, 0.9999);
        Self::with_zeta(min, items, theta, zeta(items, theta), seed)
    }

    fn with_zeta(base: u64, items: u64, theta: f64, zeta_n: f64, seed: u64) -> Self {
        let zeta_2 = zeta(2, theta);
        let alpha = 1.0 / (1.0 - theta);
        let eta = (1.0 - (2.0 / items as f64).powf(1.0 - theta)) / (1.0 - zeta_2 / zeta_n);

        Self {
            base,
            items,
            theta,
            zeta_n,
            alpha,
            eta,
            second_threshold: 1.0 + 0.5_f64.powf(theta),
            rng: SmallRng::seed_from_u64(seed),
            last: None,
        }
    }

    /// Returns the next value.
    pub fn next_value(&mut self) -> u64 {
        let u: f64 = self.rng.random();
        let uz = u * self.zeta_n;

        let rank = if uz < 1.0 {
            0
        } else if uz < self.second_threshold {
            1
        } else {
            let spread = (self.items as f64) * (self.eta * u - self.eta + 1.0).powf(self.alpha);
            (spread as u64).min(self.items - 1)
        };

        let value = self.base + rank;
        self.last = Some(value);
        value
    }

    /// Returns the most recent value, if any.
    pub fn last_value(&self) -> Option<u64> {
        self.last
    }

    /// Returns the skew parameter in use.
    pub fn theta(&self) -> f64 {
        self.theta
    }
}

/// Zipfian popularity with the hot items scattered over `[min, max]`.
///
/// # Example
///
/// ```
/// use weakkit::harness::zipfian::ScrambledZipfianGenerator;
///
/// let mut generator = ScrambledZipfianGenerator::with_seed(1_000, 42);
/// let value = generator.next_value();
/// assert!(value < 1_000);
/// assert_eq!(generator.last_value(), Some(value));
/// ```
#[derive(Debug, Clone)]
pub struct ScrambledZipfianGenerator {
    min: u64,
    item_count: u64,
    ranks: ZipfianGenerator,
    last: Option<u64>,
}

impl ScrambledZipfianGenerator {
    /// Creates a generator over `[0, items)` with a random seed.
    pub fn new(items: u64) -> Self {
        Self::with_seed(items, rand::rng().random())
    }

    /// Creates a seeded generator over `[0, items)`.
    pub fn with_seed(items: u64, seed: u64) -> Self {
        Self::range(0, items.max(1) - 1, seed)
    }

    /// Creates a seeded generator over `[min, max]`.
    ///
    /// The full `u64` range is treated as `u64::MAX` items, so `u64::MAX`
    /// itself is never produced.
    pub fn range(min: u64, max: u64, seed: u64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            item_count: (max - min).saturating_add(1),
            ranks: ZipfianGenerator::with_zeta(0, ITEM_COUNT, ZIPFIAN_CONSTANT, ZETAN, seed),
            last: None,
        }
    }

    /// Returns the next value.
    pub fn next_value(&mut self) -> u64 {
        let rank = self.ranks.next_value();
        let value = self.min + fnv_hash64(rank) % self.item_count;
        self.last = Some(value);
        value
    }

    /// Returns the most recent value, if any.
    pub fn last_value(&self) -> Option<u64> {
        self.last
    }

    /// Returns the number of distinct values.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Midpoint of the value range.
    pub fn mean(&self) -> f64 {
        self.min as f64 + (self.item_count - 1) as f64 / 2.0
    }
}
