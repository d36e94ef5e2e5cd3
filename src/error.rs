//! Error types for chromaplane

use crate::format::PixelFormat;

/// Error type for conversion planning
///
/// All errors surface from the planning stage, before any slice work is
/// dispatched. Kernels are total on supported inputs and have no failure
/// path of their own.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Pixel format is not one of the supported planar layouts
    #[error("unsupported pixel format: {0:?}")]
    InvalidFormat(PixelFormat),

    /// Bit depth is unsupported, or the float widths do not pair
    ///
    /// Both depths carry the same value when a single side's depth is
    /// the problem (e.g. a raw descriptor with a 9-bit component);
    /// they differ for an f16 to f32 crossing.
    #[error("unsupported bit depth: {in_depth} -> {out_depth}")]
    InvalidDepth {
        /// Input component depth
        in_depth: u8,
        /// Output component depth
        out_depth: u8,
    },

    /// Chroma subsampling is not 4:4:4, 4:2:2 or 4:2:0 (or subsampling
    /// was requested on a float format)
    #[error("unsupported chroma subsampling (log2 {0}x{1})")]
    InvalidSubsampling(u8, u8),

    /// Format family contradicts the matrix metadata or sample layout
    #[error("format family mismatch: {0}")]
    FamilyMismatch(&'static str),

    /// Primaries tag has no known chromaticity set
    #[error("unknown or unsupported primaries")]
    UnknownPrimaries,

    /// Transfer tag has no known curve and no caller-supplied function
    #[error("unknown or unsupported transfer characteristic")]
    UnknownTransfer,

    /// Matrix tag has no known luma coefficients
    #[error("unknown or unsupported matrix coefficients")]
    UnknownMatrix,

    /// Range code point is not a known range signal
    #[error("invalid range")]
    InvalidRange,

    /// Width or height is odd
    #[error("odd dimensions: {width}x{height}")]
    OddDimensions {
        /// Frame width
        width: usize,
        /// Frame height
        height: usize,
    },

    /// Memory allocation failed
    #[error("out of memory")]
    OutOfMemory,
}

/// Result type for chromaplane operations
pub type Result<T, E = Error> = core::result::Result<T, E>;
