//! Converter configuration

use crate::adaptation::WhitepointAdaptation;
use crate::format::PixelFormat;
use crate::meta::{ColorPrimaries, MatrixCoefficients, Preset, Range, TransferCharacteristic};
use crate::transfer::DelineariseFn;

/// Dithering applied on the RGB to YUV output path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Round to nearest
    #[default]
    None,
    /// Floyd-Steinberg error diffusion
    Fsb,
}

/// Configuration for a [`Converter`](crate::Converter)
///
/// Output-side options (`all`, `space`, `range`, `primaries`, `trc`)
/// describe the colorspace to convert *to*; unset aspects are carried
/// over from the input. The `i`-prefixed options override the input
/// frame's own metadata, for streams with missing or wrong tags.
#[derive(Debug, Clone, Default)]
pub struct ConverterConfig {
    pub(crate) all: Option<Preset>,
    pub(crate) iall: Option<Preset>,
    pub(crate) space: Option<MatrixCoefficients>,
    pub(crate) ispace: Option<MatrixCoefficients>,
    pub(crate) range: Option<Range>,
    pub(crate) irange: Option<Range>,
    pub(crate) primaries: Option<ColorPrimaries>,
    pub(crate) iprimaries: Option<ColorPrimaries>,
    pub(crate) trc: Option<TransferCharacteristic>,
    pub(crate) itrc: Option<TransferCharacteristic>,
    pub(crate) format: Option<PixelFormat>,
    pub(crate) fast: bool,
    pub(crate) dither: DitherMode,
    pub(crate) wpadapt: WhitepointAdaptation,
    pub(crate) output_delinearise: Option<DelineariseFn>,
}

impl ConverterConfig {
    /// Create a configuration with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand a named preset into the output matrix, primaries and
    /// transfer
    pub fn all(mut self, preset: Preset) -> Self {
        self.all = Some(preset);
        self
    }

    /// Expand a named preset into the input matrix, primaries and
    /// transfer
    pub fn iall(mut self, preset: Preset) -> Self {
        self.iall = Some(preset);
        self
    }

    /// Output matrix coefficients
    pub fn space(mut self, space: MatrixCoefficients) -> Self {
        self.space = Some(space);
        self
    }

    /// Override the input matrix coefficients
    pub fn ispace(mut self, space: MatrixCoefficients) -> Self {
        self.ispace = Some(space);
        self
    }

    /// Output sample range
    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    /// Override the input sample range
    pub fn irange(mut self, range: Range) -> Self {
        self.irange = Some(range);
        self
    }

    /// Output primaries
    pub fn primaries(mut self, primaries: ColorPrimaries) -> Self {
        self.primaries = Some(primaries);
        self
    }

    /// Override the input primaries
    pub fn iprimaries(mut self, primaries: ColorPrimaries) -> Self {
        self.iprimaries = Some(primaries);
        self
    }

    /// Output transfer characteristic
    pub fn trc(mut self, trc: TransferCharacteristic) -> Self {
        self.trc = Some(trc);
        self
    }

    /// Override the input transfer characteristic
    pub fn itrc(mut self, trc: TransferCharacteristic) -> Self {
        self.itrc = Some(trc);
        self
    }

    /// Require a specific output pixel format
    ///
    /// Planning fails with `InvalidFormat` if the output frame does
    /// not match.
    pub fn format(mut self, format: PixelFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Skip gamut and tone mapping entirely
    ///
    /// Forces the RGB passthrough path: only matrix, range and depth
    /// conversion are applied.
    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    /// Dithering on the RGB to YUV output path
    pub fn dither(mut self, dither: DitherMode) -> Self {
        self.dither = dither;
        self
    }

    /// Cone-response basis for white point adaptation
    pub fn wpadapt(mut self, method: WhitepointAdaptation) -> Self {
        self.wpadapt = method;
        self
    }

    /// Supply a closed-form delinearisation for the output transfer
    ///
    /// Used for non-analytic output transfers (PQ, HLG, log curves):
    /// the function maps linear light to the output signal and replaces
    /// the output tag's own curve. The input transfer must still be one
    /// of the analytic tags.
    pub fn output_delinearise(mut self, f: DelineariseFn) -> Self {
        self.output_delinearise = Some(f);
        self
    }
}
