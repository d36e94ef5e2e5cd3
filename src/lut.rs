//! Tone-response lookup tables
//!
//! Two variants: a 32768-entry int16 pair for the integer pipeline and
//! a 65536-entry pair for the half-float pipeline, indexed by the raw
//! f16 bit pattern. Each pair lives in a single allocation.

use half::f16;

use crate::coeffs::INT_ONE;
use crate::tables::TransferCoefficients;
use crate::transfer::{linearise, Delinearise};

/// Entries per integer LUT
pub const INT_LUT_SIZE: usize = 32768;

/// Integer LUT index representing linear-light 0.0
///
/// Index n stands for the real value (n - 2048) / 28672, so 0.0 sits at
/// 2048 and 1.0 at 30720, with symmetric under- and overflow room.
pub const INT_LUT_ZERO: i32 = 2048;

/// Entries per half-float LUT (one per f16 bit pattern)
pub const HALF_LUT_SIZE: usize = 65536;

/// Paired linearise/delinearise tables for the integer pipeline
///
/// Stored values are clipped to int16, so xvYCC excursions far outside
/// [0, 1] saturate at the container rails rather than widening it.
pub struct IntToneLut {
    data: Box<[i16]>,
}

impl IntToneLut {
    /// Build from analytic input coefficients and an output
    /// delinearisation source
    pub fn build(input: &TransferCoefficients, output: &Delinearise) -> Self {
        let mut data = vec![0i16; 2 * INT_LUT_SIZE].into_boxed_slice();
        let (lin, delin) = data.split_at_mut(INT_LUT_SIZE);
        for n in 0..INT_LUT_SIZE {
            let v = (n as i32 - INT_LUT_ZERO) as f64 / INT_ONE as f64;
            lin[n] = quantize(linearise(input, v));
            delin[n] = quantize(output.eval(v));
        }
        Self { data }
    }

    /// Linearisation table
    pub fn lin(&self) -> &[i16] {
        &self.data[..INT_LUT_SIZE]
    }

    /// Delinearisation table
    pub fn delin(&self) -> &[i16] {
        &self.data[INT_LUT_SIZE..]
    }
}

fn quantize(v: f64) -> i16 {
    (v * INT_ONE as f64)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Paired linearise/delinearise tables for the half-float pipeline
///
/// Indexed by the raw bit pattern of the f16 sample; entries are the
/// result's bit pattern.
pub struct HalfToneLut {
    data: Box<[u16]>,
}

impl HalfToneLut {
    /// Build from analytic input coefficients and an output
    /// delinearisation source
    pub fn build(input: &TransferCoefficients, output: &Delinearise) -> Self {
        let mut data = vec![0u16; 2 * HALF_LUT_SIZE].into_boxed_slice();
        let (lin, delin) = data.split_at_mut(HALF_LUT_SIZE);
        for n in 0..HALF_LUT_SIZE {
            let v = f16::from_bits(n as u16).to_f64();
            lin[n] = f16::from_f64(linearise(input, v)).to_bits();
            delin[n] = f16::from_f64(output.eval(v)).to_bits();
        }
        Self { data }
    }

    /// Linearisation table
    pub fn lin(&self) -> &[u16] {
        &self.data[..HALF_LUT_SIZE]
    }

    /// Delinearisation table
    pub fn delin(&self) -> &[u16] {
        &self.data[HALF_LUT_SIZE..]
    }
}
