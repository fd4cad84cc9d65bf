//! noise — random noise generators for synthetic experiments.
//!
//! [`NoiseDist`] wraps the `statrs` normal and lognormal laws behind one
//! name-parsed enum so drivers can pick a noise family from configuration,
//! draw `(n, 1)` noise tensors with an explicit RNG handle, and read the
//! closed-form mean and variance (for centering or reporting).
//!
//! The core never seeds or owns randomness; every sampler takes `&mut R`.

pub mod dist;

pub use self::dist::{NoiseDist, NoiseStats};

pub mod prelude {
    pub use super::dist::{NoiseDist, NoiseStats};
}
