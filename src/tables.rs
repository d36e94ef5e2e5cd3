//! Colorimetric constant tables
//!
//! Chromaticities are stored as exact rationals (the values the
//! standards print are decimal fractions); solvers convert to `f64`
//! once, at matrix-derivation time.

use num_rational::Ratio;

use crate::meta::{ColorPrimaries, MatrixCoefficients, TransferCharacteristic};

/// One CIE 1931 (x, y) chromaticity coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chromaticity {
    /// x coordinate
    pub x: Ratio<i32>,
    /// y coordinate
    pub y: Ratio<i32>,
}

impl Chromaticity {
    const fn new(x_num: i32, y_num: i32, denom: i32) -> Self {
        Self {
            x: Ratio::new_raw(x_num, denom),
            y: Ratio::new_raw(y_num, denom),
        }
    }

    /// x as floating point
    pub fn xf(&self) -> f64 {
        *self.x.numer() as f64 / *self.x.denom() as f64
    }

    /// y as floating point
    pub fn yf(&self) -> f64 {
        *self.y.numer() as f64 / *self.y.denom() as f64
    }
}

/// Primary chromaticities plus white point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimariesDesc {
    /// Red primary
    pub red: Chromaticity,
    /// Green primary
    pub green: Chromaticity,
    /// Blue primary
    pub blue: Chromaticity,
    /// White point
    pub white: Chromaticity,
}

/// Luma coefficients deriving Y from R, G, B
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaCoefficients {
    /// Red contribution
    pub kr: f64,
    /// Blue contribution
    pub kb: f64,
}

impl LumaCoefficients {
    /// Green contribution (1 - kr - kb)
    pub fn kg(&self) -> f64 {
        1.0 - self.kr - self.kb
    }
}

/// Constants of the piecewise "toe + power" transfer curve
///
/// `alpha == 0.0` marks a non-analytic transfer: delinearisation must
/// come from a caller-supplied function and linearisation is
/// unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferCoefficients {
    /// Power-segment gain
    pub alpha: f64,
    /// Linear/power breakpoint (linear-light domain)
    pub beta: f64,
    /// Encoding exponent
    pub gamma: f64,
    /// Linear-segment slope
    pub delta: f64,
}

impl TransferCoefficients {
    /// Whether the closed-form curve applies
    pub fn is_analytic(&self) -> bool {
        self.alpha != 0.0
    }
}

const D65: Chromaticity = Chromaticity::new(3127, 3290, 10000);
const ILLUMINANT_C: Chromaticity = Chromaticity::new(310, 316, 1000);

/// Chromaticities for a named primaries tag
pub fn primaries_desc(tag: ColorPrimaries) -> Option<PrimariesDesc> {
    let desc = match tag {
        ColorPrimaries::Unspecified => return None,
        ColorPrimaries::Bt709 => PrimariesDesc {
            red: Chromaticity::new(640, 330, 1000),
            green: Chromaticity::new(300, 600, 1000),
            blue: Chromaticity::new(150, 60, 1000),
            white: D65,
        },
        ColorPrimaries::Bt470m => PrimariesDesc {
            red: Chromaticity::new(670, 330, 1000),
            green: Chromaticity::new(210, 710, 1000),
            blue: Chromaticity::new(140, 80, 1000),
            white: ILLUMINANT_C,
        },
        ColorPrimaries::Bt470bg => PrimariesDesc {
            red: Chromaticity::new(640, 330, 1000),
            green: Chromaticity::new(290, 600, 1000),
            blue: Chromaticity::new(150, 60, 1000),
            white: D65,
        },
        ColorPrimaries::Smpte170m | ColorPrimaries::Smpte240m => PrimariesDesc {
            red: Chromaticity::new(630, 340, 1000),
            green: Chromaticity::new(310, 595, 1000),
            blue: Chromaticity::new(155, 70, 1000),
            white: D65,
        },
        ColorPrimaries::Bt2020 => PrimariesDesc {
            red: Chromaticity::new(708, 292, 1000),
            green: Chromaticity::new(170, 797, 1000),
            blue: Chromaticity::new(131, 46, 1000),
            white: D65,
        },
    };
    Some(desc)
}

/// Luma coefficients for a named matrix tag
///
/// `Identity` and `Unspecified` have no luma decomposition.
pub fn luma_coefficients(tag: MatrixCoefficients) -> Option<LumaCoefficients> {
    let (kr, kb) = match tag {
        MatrixCoefficients::Identity | MatrixCoefficients::Unspecified => return None,
        MatrixCoefficients::Bt709 => (0.2126, 0.0722),
        MatrixCoefficients::Fcc => (0.30, 0.11),
        MatrixCoefficients::Bt470bg | MatrixCoefficients::Smpte170m => (0.299, 0.114),
        MatrixCoefficients::Smpte240m => (0.212, 0.087),
        MatrixCoefficients::Bt2020Ncl => (0.2627, 0.0593),
    };
    Some(LumaCoefficients { kr, kb })
}

/// Curve constants for a named transfer tag
///
/// Gamma 2.2 and 2.8 are pure power laws here (no linear toe), matching
/// how legacy BT.470 content is produced in practice rather than the
/// CRT-physics idealisation.
pub fn transfer_coefficients(tag: TransferCharacteristic) -> Option<TransferCoefficients> {
    let (alpha, beta, gamma, delta) = match tag {
        TransferCharacteristic::Unspecified => return None,
        TransferCharacteristic::Bt709
        | TransferCharacteristic::Smpte170m
        | TransferCharacteristic::Xvycc
        | TransferCharacteristic::Bt2020_10 => (1.099, 0.018, 0.45, 4.5),
        TransferCharacteristic::Bt2020_12 => (1.0993, 0.0181, 0.45, 4.5),
        TransferCharacteristic::Smpte240m => (1.1115, 0.0228, 0.45, 4.0),
        TransferCharacteristic::Srgb => (1.055, 0.0031308, 1.0 / 2.4, 12.92),
        TransferCharacteristic::Gamma22 => (1.0, 0.0, 1.0 / 2.2, 0.0),
        TransferCharacteristic::Gamma28 => (1.0, 0.0, 1.0 / 2.8, 0.0),
        TransferCharacteristic::Linear => (1.0, 0.0, 1.0, 1.0),
    };
    Some(TransferCoefficients {
        alpha,
        beta,
        gamma,
        delta,
    })
}
