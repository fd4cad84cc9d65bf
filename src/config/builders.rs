//! config::builders — turn a [`Hyperparams`] mapping into losses, direction
//! rules and solver options.
//!
//! Purpose
//! -------
//! Give drivers one place to go from a flat configuration (typically
//! deserialized from JSON) to ready-to-use components, so that unknown names
//! and bad values fail at construction and never at iteration time.
//!
//! Key behaviors
//! -------------
//! - [`build_loss`]: base loss from `loss`, optionally wrapped by the risk
//!   transform named in `risk`.
//! - [`build_rule`]: direction rule named in `algo`, with step coefficients
//!   and the robust-aggregation settings it needs.
//! - [`build_lbfgs_options`]: L-BFGS tolerances and solver settings.
//!
//! Recognized keys
//! ---------------
//! | key | used by | default |
//! |---|---|---|
//! | `loss` | all losses | required |
//! | `hinge`, `threshold` | `margin_binary` | `true`, `0.0` |
//! | `risk` | wrapper choice: `none`, `cvar`, `dro`, `tilted` | `none` |
//! | `alpha` | `cvar` | required |
//! | `bound`, `shape` | `dro` | required, `2.0` |
//! | `tilt` | `tilted` | required |
//! | `algo` | `gd`, `rgd_mest`, `rgd_vecmedian` | required |
//! | `step_coef` | all rules | `0.01` |
//! | `delta`, `est_loc`, `est_scale` | `rgd_mest` | required, `huber`, `huber2` |
//! | `mest_thres`, `mest_iters` | `rgd_mest` | `1e-3`, `50` |
//! | `vec_median`, `median_thres`, `median_iters` | `rgd_vecmedian` | `geomed`, `1e-3`, `100` |
//! | `tol_grad`, `tol_cost`, `max_iter` | L-BFGS | `1e-6`, none, `300` |
//! | `line_search`, `lbfgs_mem`, `verbose` | L-BFGS | `MoreThuente`, `7`, `false` |
use tracing::debug;

use crate::{
    algos::{
        gd::GdErm,
        linesearch::{DEFAULT_STEP_COEF, DirectionRule, StepCoefs},
        quasi_newton::{DEFAULT_LBFGS_MEM, LbfgsOptions, LineSearcher, Tolerances},
        rgd::{RgdMest, RgdVecMedian},
    },
    config::{
        errors::{ConfigError, ConfigResult},
        hyperparams::Hyperparams,
    },
    errors::ErmResult,
    losses::{
        absolute::Absolute,
        classification::ZeroOne,
        cvar::CVaR,
        dro::DroCr,
        logistic::{Logistic, LogisticBinary},
        margin::MarginBinary,
        quadratic::Quadratic,
        tilted::Tilted,
        traits::Loss,
    },
    robust::{
        influence::Influence,
        mest::{DEFAULT_MEST_ITERS, DEFAULT_MEST_THRES, MestOptions, ScaleEstimator},
        vecmean::{DEFAULT_MEDIAN_ITERS, DEFAULT_MEDIAN_THRES, MedianOptions, VecMedian},
    },
};

const LOSS_NAMES: &str =
    "'quadratic', 'absolute', 'logistic_binary', 'logistic', 'margin_binary', 'zero_one'";
const RISK_NAMES: &str = "'none', 'cvar', 'dro', 'tilted'";
const ALGO_NAMES: &str = "'gd', 'rgd_mest', 'rgd_vecmedian'";

/// Default Cressie–Read shape for `dro`.
pub const DEFAULT_DRO_SHAPE: f64 = 2.0;

fn unknown(kind: &'static str, name: &str, expected: &'static str) -> ConfigError {
    ConfigError::UnknownName { kind, name: name.to_string(), expected }
}

/// Base loss named by `loss`.
pub fn build_base_loss(hp: &Hyperparams) -> ConfigResult<Box<dyn Loss>> {
    let name = hp.require_str("loss")?;
    let loss: Box<dyn Loss> = match name.to_lowercase().as_str() {
        "quadratic" => Box::new(Quadratic::new()),
        "absolute" => Box::new(Absolute::new()),
        "logistic_binary" => Box::new(LogisticBinary::new()),
        "logistic" => Box::new(Logistic::new()),
        "margin_binary" => {
            Box::new(MarginBinary::new(hp.bool_or("hinge", true)?, hp.f64_or("threshold", 0.0)?))
        }
        "zero_one" => Box::new(ZeroOne::new()),
        _ => return Err(unknown("loss", name, LOSS_NAMES)),
    };
    Ok(loss)
}

/// Base loss wrapped by the risk transform named in `risk`.
///
/// # Errors
/// - `ConfigError::UnknownName` for unknown `loss` or `risk` names.
/// - `ConfigError::MissingHyperparameter` if the wrapper's required value is
///   absent, or `InvalidHyperparameter` if it is out of range.
pub fn build_loss(hp: &Hyperparams) -> ErmResult<Box<dyn Loss>> {
    let base = build_base_loss(hp)?;
    let risk = hp.str_or("risk", "none")?;
    let loss: Box<dyn Loss> = match risk.to_lowercase().as_str() {
        "none" => base,
        "cvar" => Box::new(CVaR::new(base, hp.require_f64("alpha")?)?),
        "dro" => Box::new(DroCr::new(
            base,
            hp.require_f64("bound")?,
            hp.f64_or("shape", DEFAULT_DRO_SHAPE)?,
        )?),
        "tilted" => Box::new(Tilted::new(base, hp.require_f64("tilt")?)?),
        _ => return Err(unknown("risk transform", risk, RISK_NAMES).into()),
    };
    debug!(loss = %loss.name(), "built loss");
    Ok(loss)
}

pub fn build_step_coefs(hp: &Hyperparams) -> ConfigResult<StepCoefs> {
    StepCoefs::new(hp.f64_or("step_coef", DEFAULT_STEP_COEF)?)
}

pub fn build_mest_options(hp: &Hyperparams) -> ConfigResult<MestOptions> {
    MestOptions::new(
        hp.f64_or("mest_thres", DEFAULT_MEST_THRES)?,
        hp.usize_or("mest_iters", DEFAULT_MEST_ITERS)?,
    )
}

pub fn build_median_options(hp: &Hyperparams) -> ConfigResult<MedianOptions> {
    MedianOptions::new(
        hp.f64_or("median_thres", DEFAULT_MEDIAN_THRES)?,
        hp.usize_or("median_iters", DEFAULT_MEDIAN_ITERS)?,
    )
}

/// Direction rule named by `algo`.
///
/// # Errors
/// - `ConfigError::UnknownName` for unknown algorithm, influence, scale or
///   median names.
/// - `ConfigError::MissingHyperparameter` / `InvalidHyperparameter` for
///   absent or out-of-range values.
pub fn build_rule(hp: &Hyperparams) -> ConfigResult<Box<dyn DirectionRule>> {
    let name = hp.require_str("algo")?;
    let steps = build_step_coefs(hp)?;
    let rule: Box<dyn DirectionRule> = match name.to_lowercase().as_str() {
        "gd" | "gd_erm" => Box::new(GdErm::new(steps)),
        "rgd_mest" => {
            let influence: Influence = hp.str_or("est_loc", "huber")?.parse()?;
            let scale: ScaleEstimator = hp.str_or("est_scale", "huber2")?.parse()?;
            Box::new(RgdMest::new(
                influence,
                scale,
                hp.require_f64("delta")?,
                build_mest_options(hp)?,
                steps,
            )?)
        }
        "rgd_vecmedian" => {
            let median: VecMedian = hp.str_or("vec_median", "geomed")?.parse()?;
            Box::new(RgdVecMedian::new(median, build_median_options(hp)?, steps))
        }
        _ => return Err(unknown("algorithm", name, ALGO_NAMES)),
    };
    debug!(rule = rule.name(), "built direction rule");
    Ok(rule)
}

/// L-BFGS options. Without any tolerance keys the defaults of
/// [`LbfgsOptions::default`] apply.
pub fn build_lbfgs_options(hp: &Hyperparams) -> ConfigResult<LbfgsOptions> {
    let defaults = LbfgsOptions::default().tols;
    let tol_grad = hp.f64_opt("tol_grad")?;
    let tol_cost = hp.f64_opt("tol_cost")?;
    let max_iter =
        if hp.contains("max_iter") { Some(hp.usize_or("max_iter", 0)?) } else { defaults.max_iter };
    let tols = if tol_grad.is_none() && tol_cost.is_none() {
        Tolerances::new(defaults.tol_grad, None, max_iter)?
    } else {
        Tolerances::new(tol_grad, tol_cost, max_iter)?
    };
    let line_searcher: LineSearcher = hp.str_or("line_search", "MoreThuente")?.parse()?;
    LbfgsOptions::new(
        tols,
        line_searcher,
        hp.bool_or("verbose", false)?,
        Some(hp.usize_or("lbfgs_mem", DEFAULT_LBFGS_MEM)?),
    )
}
