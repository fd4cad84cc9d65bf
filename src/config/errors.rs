//! Configuration errors: unknown names, missing or invalid hyperparameters,
//! and parameter sets that do not carry what a component needs.
//!
//! All of these are raised at construction time (or, for parameter lookups,
//! before any numeric work in the call that needs them).
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    // ---- Names ----
    /// A function, estimator, loss or algorithm name was not recognized.
    #[error("Unknown {kind} '{name}'. Valid options: {expected}")]
    UnknownName { kind: &'static str, name: String, expected: &'static str },

    // ---- Hyperparameters ----
    /// A required hyperparameter is absent from the mapping.
    #[error("Missing required hyperparameter '{name}'")]
    MissingHyperparameter { name: String },

    /// A hyperparameter is present with the wrong value type.
    #[error("Hyperparameter '{name}' must be a {expected}")]
    WrongHyperparameterType { name: String, expected: &'static str },

    /// A numeric hyperparameter is outside its admissible range.
    #[error("Invalid hyperparameter '{name}' = {value}: {reason}")]
    InvalidHyperparameter { name: String, value: f64, reason: &'static str },

    /// Iteration caps must be positive.
    #[error("Invalid iteration cap '{name}' = {value}: {reason}")]
    InvalidIterations { name: String, value: usize, reason: &'static str },

    // ---- Parameter sets ----
    /// A parameter required by a model, loss or update is missing.
    #[error("Missing parameter '{name}'")]
    MissingParameter { name: String },

    /// A supplied parameter is not declared by the component receiving it.
    #[error("Unexpected parameter '{name}'")]
    UnexpectedParameter { name: String },

    /// A parameter name is claimed twice (e.g. a loss auxiliary parameter
    /// colliding with a model parameter).
    #[error("Duplicate parameter '{name}'")]
    DuplicateParameter { name: String },
}

impl ConfigError {
    pub fn invalid(name: &str, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidHyperparameter { name: name.to_string(), value, reason }
    }

    pub fn missing_parameter(name: &str) -> Self {
        ConfigError::MissingParameter { name: name.to_string() }
    }
}
