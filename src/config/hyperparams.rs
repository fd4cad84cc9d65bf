//! config::hyperparams — plain name → value mapping handed to constructors.
//!
//! Purpose
//! -------
//! Represent experiment configuration as the flat mapping a driver would read
//! from a file or command line, and give constructors typed accessors that
//! turn absent or mistyped entries into [`ConfigError`]s.
//!
//! Conventions
//! -----------
//! - Values are numbers, text or flags; `serde(untagged)` lets a JSON object
//!   such as `{"loss": "quadratic", "alpha": 0.1}` deserialize directly.
//! - `require_*` accessors fail on absence; `*_or` accessors fall back to a
//!   default on absence but still fail on a wrong type.
//! - Integer-valued hyperparameters are stored as numbers and must be
//!   non-negative whole values.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::errors::{ConfigError, ConfigResult};

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HyperValue {
    Flag(bool),
    Num(f64),
    Text(String),
}

impl From<f64> for HyperValue {
    fn from(v: f64) -> Self {
        HyperValue::Num(v)
    }
}

impl From<usize> for HyperValue {
    fn from(v: usize) -> Self {
        HyperValue::Num(v as f64)
    }
}

impl From<bool> for HyperValue {
    fn from(v: bool) -> Self {
        HyperValue::Flag(v)
    }
}

impl From<&str> for HyperValue {
    fn from(v: &str) -> Self {
        HyperValue::Text(v.to_string())
    }
}

/// Named hyperparameters passed at construction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparams {
    values: BTreeMap<String, HyperValue>,
}

impl Hyperparams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<HyperValue>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<HyperValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&HyperValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn require_f64(&self, name: &str) -> ConfigResult<f64> {
        match self.values.get(name) {
            Some(value) => as_f64(name, value),
            None => Err(ConfigError::MissingHyperparameter { name: name.to_string() }),
        }
    }

    pub fn f64_or(&self, name: &str, default: f64) -> ConfigResult<f64> {
        match self.values.get(name) {
            Some(value) => as_f64(name, value),
            None => Ok(default),
        }
    }

    /// `None` on absence; a wrong type is still an error.
    pub fn f64_opt(&self, name: &str) -> ConfigResult<Option<f64>> {
        self.values.get(name).map(|value| as_f64(name, value)).transpose()
    }

    pub fn usize_or(&self, name: &str, default: usize) -> ConfigResult<usize> {
        match self.values.get(name) {
            Some(value) => {
                let v = as_f64(name, value)?;
                if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
                    return Err(ConfigError::invalid(name, v, "must be a non-negative integer"));
                }
                Ok(v as usize)
            }
            None => Ok(default),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> ConfigResult<bool> {
        match self.values.get(name) {
            Some(HyperValue::Flag(b)) => Ok(*b),
            Some(_) => Err(ConfigError::WrongHyperparameterType {
                name: name.to_string(),
                expected: "boolean",
            }),
            None => Ok(default),
        }
    }

    pub fn require_str(&self, name: &str) -> ConfigResult<&str> {
        match self.values.get(name) {
            Some(value) => as_str(name, value),
            None => Err(ConfigError::MissingHyperparameter { name: name.to_string() }),
        }
    }

    pub fn str_or<'a>(&'a self, name: &str, default: &'a str) -> ConfigResult<&'a str> {
        match self.values.get(name) {
            Some(value) => as_str(name, value),
            None => Ok(default),
        }
    }
}

fn as_f64(name: &str, value: &HyperValue) -> ConfigResult<f64> {
    match value {
        HyperValue::Num(v) => Ok(*v),
        _ => Err(ConfigError::WrongHyperparameterType { name: name.to_string(), expected: "number" }),
    }
}

fn as_str<'a>(name: &str, value: &'a HyperValue) -> ConfigResult<&'a str> {
    match value {
        HyperValue::Text(s) => Ok(s.as_str()),
        _ => Err(ConfigError::WrongHyperparameterType { name: name.to_string(), expected: "string" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover typed access, defaults, and error reporting for
    // missing or mistyped entries. Builders that consume the mapping are
    // tested in `config::builders`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify typed accessors on present entries and defaults on absent ones.
    //
    // Given
    // -----
    // - A mapping with a number, a string, a flag and an integer count.
    //
    // Expect
    // ------
    // - Each accessor returns the stored value; `*_or` returns defaults for
    //   absent keys.
    fn accessors_return_stored_values_and_defaults() {
        let hp = Hyperparams::new()
            .with("alpha", 0.25)
            .with("loss", "quadratic")
            .with("hinge", true)
            .with("mest_iters", 40usize);

        assert_eq!(hp.require_f64("alpha").unwrap(), 0.25);
        assert_eq!(hp.require_str("loss").unwrap(), "quadratic");
        assert!(hp.bool_or("hinge", false).unwrap());
        assert_eq!(hp.usize_or("mest_iters", 50).unwrap(), 40);
        assert_eq!(hp.f64_or("delta", 0.05).unwrap(), 0.05);
        assert_eq!(hp.str_or("risk", "none").unwrap(), "none");
    }

    #[test]
    // Purpose
    // -------
    // Ensure absent required keys and wrong value types are reported.
    //
    // Given
    // -----
    // - A mapping where `alpha` is text and `iters` is fractional.
    //
    // Expect
    // ------
    // - MissingHyperparameter, WrongHyperparameterType and
    //   InvalidHyperparameter respectively.
    fn accessors_report_missing_and_mistyped_entries() {
        let hp = Hyperparams::new().with("alpha", "high").with("iters", 2.5);

        assert!(matches!(
            hp.require_f64("step_coef"),
            Err(ConfigError::MissingHyperparameter { .. })
        ));
        assert!(matches!(
            hp.require_f64("alpha"),
            Err(ConfigError::WrongHyperparameterType { .. })
        ));
        assert!(matches!(
            hp.usize_or("iters", 10),
            Err(ConfigError::InvalidHyperparameter { .. })
        ));
    }
}
