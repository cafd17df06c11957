//! # Random Number Generation
//!
//! Seeded generators for the spot simulation.
//!
//! Every simulated path draws from its own ChaCha8 stream selected by the
//! path index, so a path's normals depend only on `(seed, path)`. Results are
//! therefore identical however the paths are spread across threads.
//!
//! ## Generator
//!
//! - Bit generator: `rand_chacha::ChaCha8Rng`, seeded with `seed_from_u64`
//! - Stream: `set_stream(path_index)`
//! - Normal transform: Ziggurat via `rand_distr::StandardNormal`
//!
//! ## Usage Example
//!
//! ```rust
//! use storage_pricing::rng::PathRng;
//!
//! let mut rng = PathRng::for_path(11, 0);
//! let mut buffer = vec![0.0; 3];
//! rng.fill_normal(&mut buffer);
//!
//! // Same seed and path, same draws.
//! let mut again = PathRng::for_path(11, 0);
//! assert_eq!(again.gen_normal(), buffer[0]);
//! ```

mod prng;

pub use prng::PathRng;

#[cfg(test)]
mod tests;
