//! Opto-electronic transfer curve evaluation
//!
//! The analytic family is the piecewise "toe + power" curve defined by
//! (alpha, beta, gamma, delta). Both directions are odd-symmetric around
//! zero so xvYCC-style signed excursions survive the round trip.
//! Non-analytic output transfers (PQ, HLG, log) enter through
//! [`DelineariseFn`]; linearisation has no such escape hatch, so the
//! input side must always be analytic.

use crate::tables::TransferCoefficients;

/// Caller-supplied scalar delinearisation (linear light to signal)
pub type DelineariseFn = fn(f64) -> f64;

/// Delinearise: linear light to non-linear signal
pub fn delinearise(c: &TransferCoefficients, v: f64) -> f64 {
    if v <= -c.beta {
        -(c.alpha * (-v).powf(c.gamma) - (c.alpha - 1.0))
    } else if v < c.beta {
        c.delta * v
    } else {
        c.alpha * v.powf(c.gamma) - (c.alpha - 1.0)
    }
}

/// Linearise: non-linear signal to linear light
///
/// Algebraic inverse of [`delinearise`]. The linear segment spans
/// (-beta*delta, beta*delta); a zero-width segment (beta = 0) never
/// takes the division branch.
pub fn linearise(c: &TransferCoefficients, v: f64) -> f64 {
    let bd = c.beta * c.delta;
    if v <= -bd {
        -(((c.alpha - 1.0 - v) / c.alpha).powf(1.0 / c.gamma))
    } else if v < bd {
        v / c.delta
    } else {
        ((v + c.alpha - 1.0) / c.alpha).powf(1.0 / c.gamma)
    }
}

/// Output-side delinearisation source: closed form or caller-provided
#[derive(Clone, Copy)]
pub enum Delinearise {
    /// Closed-form curve
    Analytic(TransferCoefficients),
    /// Caller-supplied scalar function
    Custom(DelineariseFn),
}

impl Delinearise {
    /// Evaluate at `v`
    pub fn eval(&self, v: f64) -> f64 {
        match self {
            Delinearise::Analytic(c) => delinearise(c, v),
            Delinearise::Custom(f) => f(v),
        }
    }
}

impl core::fmt::Debug for Delinearise {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Delinearise::Analytic(c) => f.debug_tuple("Analytic").field(c).finish(),
            Delinearise::Custom(_) => f.write_str("Custom(fn)"),
        }
    }
}
