//! config — hyperparameter mappings and the builders that consume them.
//!
//! Purpose
//! -------
//! Carry experiment configuration from a flat name → value mapping
//! ([`hyperparams::Hyperparams`], deserializable from JSON) to constructed
//! losses, direction rules and L-BFGS options ([`builders`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Every name and value is validated when a component is built; running a
//!   built component never raises a configuration error for its own settings.
//! - Name lookups are case-insensitive.
//!
//! Conventions
//! -----------
//! - All failures surface as [`errors::ConfigError`], lifted into
//!   `ErmError::Config` where a builder also touches other error sources.

pub mod builders;
pub mod errors;
pub mod hyperparams;

pub use self::builders::{build_lbfgs_options, build_loss, build_rule};
pub use self::errors::{ConfigError, ConfigResult};
pub use self::hyperparams::{HyperValue, Hyperparams};

pub mod prelude {
    pub use super::builders::{build_lbfgs_options, build_loss, build_rule};
    pub use super::errors::{ConfigError, ConfigResult};
    pub use super::hyperparams::Hyperparams;
}
