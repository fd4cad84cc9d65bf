//! Named noise distributions with sampling and closed-form moments.
//!
//! Parameter names follow the usual generator conventions: `normal` takes
//! `loc` and `scale` (standard deviation); `lognormal` takes `mean` and
//! `sigma` of the underlying normal, so its own mean is
//! `exp(mean + sigma²/2)`.
use ndarray::Array2;
use rand::{Rng, distributions::Distribution as _};
use statrs::{
    distribution::{LogNormal, Normal},
    statistics::Distribution as Moments,
};
use std::{fmt, str::FromStr};

use crate::{
    config::{
        errors::{ConfigError, ConfigResult},
        hyperparams::Hyperparams,
    },
    tensor::types::Tensor,
};

const NOISE_NAMES: &str = "'normal', 'lognormal'";

/// Mean and variance of a noise distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseStats {
    pub mean: f64,
    pub var: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseDist {
    Normal(Normal),
    LogNormal(LogNormal),
}

impl NoiseDist {
    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `loc` is finite and
    ///   `scale` is finite and positive.
    pub fn normal(loc: f64, scale: f64) -> ConfigResult<Self> {
        let d = Normal::new(loc, scale).map_err(|_| {
            ConfigError::invalid("scale", scale, "normal needs finite loc and scale > 0")
        })?;
        Ok(NoiseDist::Normal(d))
    }

    /// # Errors
    /// - `ConfigError::InvalidHyperparameter` unless `mean` is finite and
    ///   `sigma` is finite and positive.
    pub fn lognormal(mean: f64, sigma: f64) -> ConfigResult<Self> {
        let d = LogNormal::new(mean, sigma).map_err(|_| {
            ConfigError::invalid("sigma", sigma, "lognormal needs finite mean and sigma > 0")
        })?;
        Ok(NoiseDist::LogNormal(d))
    }

    /// Build from a distribution name and its hyperparameters. Missing
    /// parameters default to the standard form (`0`, `1`).
    pub fn from_hyperparams(name: &str, hp: &Hyperparams) -> ConfigResult<Self> {
        match name.parse::<NoiseDist>()? {
            NoiseDist::Normal(_) => Self::normal(hp.f64_or("loc", 0.0)?, hp.f64_or("scale", 1.0)?),
            NoiseDist::LogNormal(_) => {
                Self::lognormal(hp.f64_or("mean", 0.0)?, hp.f64_or("sigma", 1.0)?)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseDist::Normal(_) => "normal",
            NoiseDist::LogNormal(_) => "lognormal",
        }
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            NoiseDist::Normal(d) => d.sample(rng),
            NoiseDist::LogNormal(d) => d.sample(rng),
        }
    }

    /// `n` independent draws as an `(n, 1)` tensor.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Tensor {
        Array2::from_shape_simple_fn((n, 1), || self.draw(rng)).into_dyn()
    }

    /// `n` draws with the distribution mean subtracted.
    pub fn sample_centered<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Tensor {
        let mean = self.stats().mean;
        self.sample(n, rng) - mean
    }

    pub fn stats(&self) -> NoiseStats {
        let (mean, var) = match self {
            NoiseDist::Normal(d) => (d.mean(), d.variance()),
            NoiseDist::LogNormal(d) => (d.mean(), d.variance()),
        };
        NoiseStats { mean: mean.unwrap_or(f64::NAN), var: var.unwrap_or(f64::NAN) }
    }
}

impl fmt::Display for NoiseDist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseDist {
    type Err = ConfigError;

    /// Parse a case-insensitive name into the standard form of that family.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Self::normal(0.0, 1.0),
            "lognormal" => Self::lognormal(0.0, 1.0),
            _ => Err(ConfigError::UnknownName {
                kind: "noise distribution",
                name: s.to_string(),
                expected: NOISE_NAMES,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{SeedableRng, rngs::StdRng};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover closed-form moments, construction from
    // hyperparameters, parameter validation and the centered sampler.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify moments against the closed forms.
    //
    // Given
    // -----
    // - normal(2, 3) and lognormal(0, 0.5).
    //
    // Expect
    // ------
    // - Normal: mean 2, var 9.
    // - Lognormal: mean exp(0.125), var (exp(0.25) − 1)·exp(0.25).
    fn moments_match_closed_forms() {
        // Arrange
        let n = NoiseDist::normal(2.0, 3.0).unwrap();
        let ln = NoiseDist::lognormal(0.0, 0.5).unwrap();

        // Act
        let (sn, sln) = (n.stats(), ln.stats());

        // Assert
        assert_abs_diff_eq!(sn.mean, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sn.var, 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sln.mean, 0.125f64.exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(sln.var, (0.25f64.exp() - 1.0) * 0.25f64.exp(), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify name-based construction and validation.
    //
    // Given
    // -----
    // - "LogNormal" with sigma 2; "normal" with scale −1; "cauchy".
    //
    // Expect
    // ------
    // - The first builds; the second is InvalidHyperparameter; the third
    //   is UnknownName.
    fn builds_from_hyperparams() {
        let hp = Hyperparams::new().with("sigma", 2.0);
        let bad = Hyperparams::new().with("scale", -1.0);

        let ok = NoiseDist::from_hyperparams("LogNormal", &hp).unwrap();

        assert_eq!(ok.name(), "lognormal");
        assert_abs_diff_eq!(ok.stats().mean, 2.0f64.exp(), epsilon = 1e-12);
        assert!(matches!(
            NoiseDist::from_hyperparams("normal", &bad),
            Err(ConfigError::InvalidHyperparameter { .. })
        ));
        assert!(matches!("cauchy".parse::<NoiseDist>(), Err(ConfigError::UnknownName { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Verify the centered sampler's shape and approximate centering.
    //
    // Given
    // -----
    // - 20 000 lognormal(0, 0.5) draws with a fixed seed.
    //
    // Expect
    // ------
    // - Shape (20000, 1); sample mean within 0.02 of zero.
    fn centered_samples_have_zero_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        let d = NoiseDist::lognormal(0.0, 0.5).unwrap();

        let s = d.sample_centered(20_000, &mut rng);

        assert_eq!(s.shape(), &[20_000, 1]);
        assert!(s.mean().unwrap().abs() < 0.02);
    }
}
