//! Chi functions for M-estimators of scale.
//!
//! Each chi function is even, bounded below by `−beta` at the origin and
//! satisfies `chi(0) = −beta`, where `beta` is its classical consistency
//! constant. The scale solver uses `beta = −chi(0)`.
use std::{f64::consts::PI, fmt, str::FromStr};

use crate::config::errors::ConfigError;

pub const ANDREWS_C: f64 = 1.3387;
pub const DW_C: f64 = 2.9846;
pub const HUBER2_C: f64 = 1.5;
pub const TUKEY_C: f64 = 1.547;

const CHI_NAMES: &str = "'andrews', 'dw', 'geman_abs', 'geman_quad', 'huber2', 'tukey'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chi {
    /// Andrews wave.
    Andrews,
    /// Dennis–Walsh.
    DennisWalsh,
    GemanAbs,
    GemanQuad,
    /// Huber's proposal 2.
    Huber2,
    /// Tukey biweight.
    Tukey,
}

impl Chi {
    pub const ALL: [Chi; 6] =
        [Chi::Andrews, Chi::DennisWalsh, Chi::GemanAbs, Chi::GemanQuad, Chi::Huber2, Chi::Tukey];

    /// Classical consistency constant.
    pub fn beta(self) -> f64 {
        match self {
            Chi::Andrews => 0.8726193,
            Chi::DennisWalsh => 0.8579632,
            Chi::GemanAbs => 0.3851295,
            Chi::GemanQuad => 0.3443205,
            Chi::Huber2 => 0.7784655,
            Chi::Tukey => 0.1994997,
        }
    }

    #[inline]
    pub fn apply(self, u: f64) -> f64 {
        let beta = self.beta();
        match self {
            Chi::Andrews => {
                let c = ANDREWS_C;
                if u.abs() <= c * PI {
                    2.0 * c * c * (1.0 - (u / c).cos()) - beta
                } else {
                    4.0 * c * c - beta
                }
            }
            Chi::DennisWalsh => {
                let c = DW_C;
                c * c * (1.0 - (-(u / c).powi(2)).exp()) - beta
            }
            Chi::GemanAbs => u.abs() / (1.0 + u.abs()) - beta,
            Chi::GemanQuad => u * u / (1.0 + u * u) - beta,
            Chi::Huber2 => (u * u).min(HUBER2_C * HUBER2_C) - beta,
            Chi::Tukey => {
                let c = TUKEY_C;
                if u.abs() < c {
                    u.powi(6) / (6.0 * c.powi(4)) - u.powi(4) / (2.0 * c * c) + u * u / 2.0 - beta
                } else {
                    c * c / 6.0 - beta
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Chi::Andrews => "andrews",
            Chi::DennisWalsh => "dw",
            Chi::GemanAbs => "geman_abs",
            Chi::GemanQuad => "geman_quad",
            Chi::Huber2 => "huber2",
            Chi::Tukey => "tukey",
        }
    }
}

impl fmt::Display for Chi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chi {
    type Err = ConfigError;

    /// Parse a case-insensitive name, with or without a `chi_` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        let key = lowered.strip_prefix("chi_").unwrap_or(&lowered);
        Chi::ALL.into_iter().find(|f| f.name() == key).ok_or_else(|| ConfigError::UnknownName {
            kind: "chi function",
            name: s.to_string(),
            expected: CHI_NAMES,
        })
    }
}
