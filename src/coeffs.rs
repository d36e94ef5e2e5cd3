//! YUV matrix derivation and fixed-point coefficient quantisation
//!
//! Integer pipelines carry linear RGB in int16 with 1.0 == 28672, and
//! matrix coefficients at 14 fractional bits. The 28672 scale is folded
//! into the YUV<->RGB coefficients so the RGB intermediate never needs
//! a separate normalisation step. Every quantised scalar is replicated
//! across 8 lanes so SIMD kernels can broadcast-load coefficients.

use crate::math::Mat3;
use crate::meta::Range;
use crate::tables::LumaCoefficients;

/// Integer scale of linear-light 1.0 in the int16 RGB intermediate
pub const INT_ONE: i32 = 28672;

/// Coefficient matrix with per-entry 8-lane fan-out
pub type CoeffLanes = [[[i16; 8]; 3]; 3];

/// Offset vector with 8-lane fan-out
pub type OffsetLanes = [i16; 8];

fn lanes(v: i16) -> [i16; 8] {
    [v; 8]
}

fn clip_i16(v: f64) -> i16 {
    v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// RGB to YUV matrix from luma coefficients
///
/// Classical construction: Y is the luma sum, U and V are scaled
/// blue/red color differences.
pub fn rgb2yuv_matrix(luma: &LumaCoefficients) -> Mat3 {
    let kr = luma.kr;
    let kb = luma.kb;
    let kg = luma.kg();
    Mat3([
        [kr, kg, kb],
        [
            -kr / (2.0 * (1.0 - kb)),
            -kg / (2.0 * (1.0 - kb)),
            0.5,
        ],
        [
            0.5,
            -kg / (2.0 * (1.0 - kr)),
            -kb / (2.0 * (1.0 - kr)),
        ],
    ])
}

/// YUV to RGB matrix (inverse of [`rgb2yuv_matrix`])
pub fn yuv2rgb_matrix(luma: &LumaCoefficients) -> Mat3 {
    rgb2yuv_matrix(luma).invert()
}

/// Black-level offset and component ranges at a given depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeParams {
    /// Luma black level
    pub offset: i32,
    /// Luma excursion
    pub y_range: i32,
    /// Chroma excursion
    pub uv_range: i32,
}

/// Range parameters for a resolved (non-unspecified) range tag
pub fn range_params(range: Range, depth: u8) -> RangeParams {
    match range {
        Range::Full => RangeParams {
            offset: 0,
            y_range: (1 << depth) - 1,
            uv_range: (1 << depth) - 1,
        },
        // Unspecified resolves to limited before planning gets here
        Range::Limited | Range::Unspecified => RangeParams {
            offset: 16 << (depth - 8),
            y_range: 219 << (depth - 8),
            uv_range: 224 << (depth - 8),
        },
    }
}

/// Luma offset lanes for one side of the pipeline
pub fn yuv_offset_lanes(rp: &RangeParams) -> OffsetLanes {
    lanes(rp.offset as i16)
}

/// Quantise a YUV->RGB matrix for the integer pipeline
///
/// The kernel shift is `depth - 1`, so RGB comes out at the 28672
/// scale: `coef = round(28672 * 2^(depth-1) * m / range)` with the
/// luma range on column 0 and the chroma range elsewhere.
pub fn quantize_yuv2rgb(m: &Mat3, depth: u8, rp: &RangeParams) -> CoeffLanes {
    let mut out = [[[0i16; 8]; 3]; 3];
    let scale = INT_ONE as f64 * (1u32 << (depth - 1)) as f64;
    for n in 0..3 {
        for c in 0..3 {
            let range = if c == 0 { rp.y_range } else { rp.uv_range };
            out[n][c] = lanes(clip_i16(scale * m.0[n][c] / range as f64));
        }
    }
    out
}

/// Quantise an RGB->YUV matrix for the integer pipeline
///
/// The kernel shift is `29 - depth`:
/// `coef = round(2^(29-depth) * out_range * m / 28672)` with the luma
/// range on row 0 and the chroma range elsewhere.
pub fn quantize_rgb2yuv(m: &Mat3, depth: u8, rp: &RangeParams) -> CoeffLanes {
    let mut out = [[[0i16; 8]; 3]; 3];
    let scale = (1u32 << (29 - depth)) as f64 / INT_ONE as f64;
    for n in 0..3 {
        let range = if n == 0 { rp.y_range } else { rp.uv_range };
        for c in 0..3 {
            out[n][c] = lanes(clip_i16(scale * range as f64 * m.0[n][c]));
        }
    }
    out
}

/// Quantise the composed YUV->YUV matrix
///
/// Used when color volume is unchanged and only matrix, range or depth
/// differ. The kernel shift is `14 + in_depth - out_depth`:
/// `coef = round(16384 * m * out_rng * 2^in_depth / (in_rng * 2^out_depth))`.
pub fn quantize_yuv2yuv(
    m: &Mat3,
    in_depth: u8,
    out_depth: u8,
    in_rp: &RangeParams,
    out_rp: &RangeParams,
) -> CoeffLanes {
    let mut out = [[[0i16; 8]; 3]; 3];
    let depth_scale = (1u64 << in_depth) as f64 / (1u64 << out_depth) as f64;
    for n in 0..3 {
        let out_rng = if n == 0 { out_rp.y_range } else { out_rp.uv_range };
        for c in 0..3 {
            let in_rng = if c == 0 { in_rp.y_range } else { in_rp.uv_range };
            let v = 16384.0 * m.0[n][c] * out_rng as f64 * depth_scale / in_rng as f64;
            out[n][c] = lanes(clip_i16(v));
        }
    }
    out
}

/// Quantise a primary-mapping matrix at 14 fractional bits
pub fn quantize_lrgb2lrgb(m: &Mat3) -> CoeffLanes {
    let mut out = [[[0i16; 8]; 3]; 3];
    for n in 0..3 {
        for c in 0..3 {
            out[n][c] = lanes(clip_i16(16384.0 * m.0[n][c]));
        }
    }
    out
}

/// f32 mirror of a solver matrix, for the float pipelines
pub fn matrix_f32(m: &Mat3) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for n in 0..3 {
        for c in 0..3 {
            out[n][c] = m.0[n][c] as f32;
        }
    }
    out
}
