//! Per-path pseudo-random number generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Random number generator for one simulated path.
///
/// Wraps a ChaCha8 generator seeded from a 64-bit seed and positioned on the
/// stream numbered by the path index. Distinct paths never share draws.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::rng::PathRng;
///
/// let mut first = PathRng::for_path(42, 0);
/// let mut second = PathRng::for_path(42, 1);
/// assert_ne!(first.gen_normal(), second.gen_normal());
/// assert_eq!(first.seed(), 42);
/// assert_eq!(second.stream(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct PathRng {
    inner: ChaCha8Rng,
    seed: u64,
    stream: u64,
}

impl PathRng {
    /// Generator for path `path` of a simulation seeded with `seed`.
    #[inline]
    pub fn for_path(seed: u64, path: u64) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(path);
        Self {
            inner,
            seed,
            stream: path,
        }
    }

    /// Seed used for initialisation.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream (path index) this generator draws from.
    #[inline]
    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// A uniform value in [0, 1).
    #[inline]
    pub fn gen_uniform(&mut self) -> f64 {
        self.inner.gen()
    }

    /// A standard normal variate.
    ///
    /// Uses the Ziggurat method of `rand_distr::StandardNormal`.
    #[inline]
    pub fn gen_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    /// Fills the buffer with standard normal variates.
    ///
    /// Zero-allocation; an empty buffer is a no-op.
    #[inline]
    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = StandardNormal.sample(&mut self.inner);
        }
    }
}
