//! Influence functions for M-estimators of location.
//!
//! Each variant is a bounded (or slowly growing) odd function `ψ` applied
//! elementwise to standardized residuals. Constants are the classical
//! defaults:
//!
//! | name        | ψ(u)                                                        |
//! |-------------|-------------------------------------------------------------|
//! | `algsq`     | `u / sqrt(1 + u²/2)`                                        |
//! | `atan`      | `atan(u)`                                                   |
//! | `catnarrow` | `−sgn(u)·log1p(−sgn(u)·u + u²/2)` if `|u| ≤ 1`, else `sgn(u)·ln 2` |
//! | `catwide`   | `sgn(u)·log1p(sgn(u)·u + u²/2)`                             |
//! | `gudermann` | `2·atan(exp(u)) − π/2`                                      |
//! | `fair`      | `u / (1 + |u|/c)`, `c = 1.3998`                             |
//! | `huber`     | `u` if `|u| ≤ c`, else `c·sgn(u)`, `c = 1.345`              |
//! | `hubermod`  | `c·sin(u/c)` if `|u| ≤ cπ/2`, else `c·sgn(u)`, `c = 1.2107` |
//! | `logistic`  | `c₁/(1 + exp(−c₂u)) − c₁/2`, `c₁ = 4`, `c₂ = 1`            |
//! | `tanh`      | `tanh(u)`                                                   |
//!
//! `sgn` is three-valued (`sgn(0) = 0`).
use std::{
    f64::consts::{FRAC_PI_2, LN_2},
    fmt,
    str::FromStr,
};

use crate::{config::errors::ConfigError, tensor::shapes::sign};

pub const FAIR_C: f64 = 1.3998;
pub const HUBER_C: f64 = 1.345;
pub const HUBERMOD_C: f64 = 1.2107;
pub const LOGISTIC_C1: f64 = 4.0;
pub const LOGISTIC_C2: f64 = 1.0;

const INFLUENCE_NAMES: &str =
    "'algsq', 'atan', 'catnarrow', 'catwide', 'gudermann', 'fair', 'huber', 'hubermod', 'logistic', 'tanh'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Influence {
    AlgSq,
    Atan,
    CatNarrow,
    CatWide,
    Gudermann,
    Fair,
    Huber,
    HuberMod,
    Logistic,
    Tanh,
}

impl Influence {
    pub const ALL: [Influence; 10] = [
        Influence::AlgSq,
        Influence::Atan,
        Influence::CatNarrow,
        Influence::CatWide,
        Influence::Gudermann,
        Influence::Fair,
        Influence::Huber,
        Influence::HuberMod,
        Influence::Logistic,
        Influence::Tanh,
    ];

    #[inline]
    pub fn apply(self, u: f64) -> f64 {
        match self {
            Influence::AlgSq => u / (1.0 + u * u / 2.0).sqrt(),
            Influence::Atan => u.atan(),
            Influence::CatNarrow => {
                let s = sign(u);
                if u.abs() <= 1.0 { -s * (-s * u + u * u / 2.0).ln_1p() } else { s * LN_2 }
            }
            Influence::CatWide => {
                let s = sign(u);
                s * (s * u + u * u / 2.0).ln_1p()
            }
            Influence::Gudermann => 2.0 * u.exp().atan() - FRAC_PI_2,
            Influence::Fair => u / (1.0 + u.abs() / FAIR_C),
            Influence::Huber => {
                if u.abs() <= HUBER_C { u } else { HUBER_C * sign(u) }
            }
            Influence::HuberMod => {
                if u.abs() <= HUBERMOD_C * FRAC_PI_2 {
                    HUBERMOD_C * (u / HUBERMOD_C).sin()
                } else {
                    HUBERMOD_C * sign(u)
                }
            }
            Influence::Logistic => LOGISTIC_C1 / (1.0 + (-LOGISTIC_C2 * u).exp()) - LOGISTIC_C1 / 2.0,
            Influence::Tanh => u.tanh(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Influence::AlgSq => "algsq",
            Influence::Atan => "atan",
            Influence::CatNarrow => "catnarrow",
            Influence::CatWide => "catwide",
            Influence::Gudermann => "gudermann",
            Influence::Fair => "fair",
            Influence::Huber => "huber",
            Influence::HuberMod => "hubermod",
            Influence::Logistic => "logistic",
            Influence::Tanh => "tanh",
        }
    }
}

impl fmt::Display for Influence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Influence {
    type Err = ConfigError;

    /// Parse a case-insensitive name, with or without an `inf_` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let key = lowered.strip_prefix("inf_").unwrap_or(&lowered);
        Influence::ALL.into_iter().find(|f| f.name() == key).ok_or_else(|| ConfigError::UnknownName {
            kind: "influence function",
            name: s.to_string(),
            expected: INFLUENCE_NAMES,
        })
    }
}
