//! # chromaplane
//!
//! Planar video-frame colorspace conversion: YUV matrix, primaries,
//! transfer characteristic, range and bit depth, between planar YUV
//! (8/10/12-bit, 4:2:0/4:2:2/4:4:4) and planar float GBR (f16/f32).
//!
//! The pipeline runs YUV -> linear RGB -> primary-mapped linear RGB ->
//! non-linear RGB -> YUV, in fixed point for integer formats and IEEE
//! floats for GBR formats. When the color volume is unchanged and only
//! matrix, range or depth differ, a single composed YUV-to-YUV matrix
//! replaces the whole chain.
//!
//! Chroma resampling is nearest-neighbour in both directions. This is
//! deliberate and will not change: convert to 4:4:4 with a real scaler
//! first if that matters for your content.
//!
//! ## Quick start
//!
//! ```no_run
//! use chromaplane::{convert, ConverterConfig, Frame, PixelFormat, Preset};
//! use chromaplane::{ColorMetadata, Range};
//!
//! let meta = ColorMetadata::default();
//! let input = Frame::alloc(PixelFormat::Yuv420p, 1920, 1080, meta).unwrap();
//! let mut output = Frame::alloc(PixelFormat::Yuv420p, 1920, 1080, meta).unwrap();
//!
//! let config = ConverterConfig::new()
//!     .iall(Preset::Smpte170m)
//!     .all(Preset::Bt709)
//!     .range(Range::Limited);
//! convert(&input, &mut output, config).unwrap();
//! ```
//!
//! ## Threading
//!
//! The crate exposes per-slice conversion; mapping slices to worker
//! threads is the host's job. [`slice_bounds`] partitions a frame into
//! chroma-row-aligned slices whose results are independent:
//!
//! ```no_run
//! use chromaplane::{slice_bounds, Converter, ConverterConfig};
//! # use chromaplane::{ColorMetadata, Frame, PixelFormat};
//! # let meta = ColorMetadata::default();
//! # let input = Frame::alloc(PixelFormat::Yuv420p, 64, 64, meta).unwrap();
//! # let mut output = Frame::alloc(PixelFormat::Yuv420p, 64, 64, meta).unwrap();
//! let mut converter = Converter::new(ConverterConfig::new());
//! converter.prepare(&input, &mut output).unwrap();
//! for worker in 0..4 {
//!     let (h1, h2) = slice_bounds(input.height(), worker, 4);
//!     converter.convert_slice(&input, &mut output, h1, h2);
//! }
//! ```

mod adaptation;
mod coeffs;
mod config;
mod converter;
mod engine;
mod error;
mod format;
mod frame;
mod kernels;
mod lut;
mod math;
mod meta;
mod plan;
mod primaries;
mod scratch;
mod tables;
mod transfer;

pub use adaptation::WhitepointAdaptation;
pub use config::{ConverterConfig, DitherMode};
pub use converter::{slice_bounds, Converter, PlanInfo};
pub use error::{Error, Result};
pub use format::{ColorFamily, FormatDescriptor, PixelFormat};
pub use frame::Frame;
pub use meta::{
    ColorMetadata, ColorPrimaries, MatrixCoefficients, Preset, Range, TransferCharacteristic,
};
pub use tables::{
    luma_coefficients, primaries_desc, transfer_coefficients, Chromaticity, LumaCoefficients,
    PrimariesDesc, TransferCoefficients,
};
pub use transfer::{delinearise, linearise, Delinearise, DelineariseFn};

/// Convert a single frame with a one-shot converter
///
/// Hosts converting a stream should keep a [`Converter`] instead: the
/// derived coefficient tables and tone LUTs are cached across frames
/// with stable metadata.
pub fn convert(input: &Frame, output: &mut Frame, config: ConverterConfig) -> Result<()> {
    Converter::new(config).convert(input, output)
}
