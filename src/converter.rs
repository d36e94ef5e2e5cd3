//! The converter instance
//!
//! A [`Converter`] owns the plan cache and the intermediate buffers.
//! Planning ([`Converter::prepare`]) is single-threaded and surfaces
//! every error before any pixel work starts; slice execution
//! ([`Converter::convert_slice`]) is a pure CPU loop with no failure
//! path and no allocation.

use crate::config::{ConverterConfig, DitherMode};
use crate::engine;
use crate::error::{Error, Result};
use crate::format::ColorFamily;
use crate::frame::Frame;
use crate::plan::Planner;
use crate::scratch::ScratchManager;

/// Slice bounds for worker `worker` of `workers`
///
/// Frames are partitioned into contiguous horizontal slices aligned to
/// chroma row pairs; the result with N workers is bit-identical to the
/// result with one (dither excepted, which restarts per slice).
pub fn slice_bounds(height: usize, worker: usize, workers: usize) -> (usize, usize) {
    let half = height.div_ceil(2);
    let h1 = 2 * (worker * half / workers);
    let h2 = 2 * ((worker + 1) * half / workers);
    (h1, h2.min(height))
}

/// How a prepared conversion will execute
///
/// Returned by [`Converter::plan_info`]; useful for host logging and
/// for asserting that a conversion takes the expected path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanInfo {
    /// Output is a plane copy of the input
    pub frame_passthrough: bool,
    /// Single composed YUV-to-YUV matrix, no RGB intermediate
    pub fast_yuv2yuv: bool,
    /// Linearisation, primary mapping and delinearisation are skipped
    pub rgb_passthrough: bool,
    /// Primary mapping alone is skipped
    pub gamut_passthrough: bool,
}

/// Planar colorspace converter
pub struct Converter {
    config: ConverterConfig,
    planner: Planner,
    scratch: ScratchManager,
}

impl Converter {
    /// Create a converter with the given configuration
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config,
            planner: Planner::default(),
            scratch: ScratchManager::default(),
        }
    }

    /// Plan the conversion and size the intermediate buffers
    ///
    /// Resolves metadata (applying the configured presets and
    /// overrides), rebuilds whatever coefficient tables the metadata
    /// change invalidated, and writes the resolved tags into the output
    /// frame. A planning failure leaves the converter reusable for the
    /// next frame.
    ///
    /// Input and output must have identical, even dimensions.
    pub fn prepare(&mut self, input: &Frame, output: &mut Frame) -> Result<()> {
        let (w, h) = (input.width(), input.height());
        if w % 2 != 0 || h % 2 != 0 {
            return Err(Error::OddDimensions {
                width: w,
                height: h,
            });
        }
        if output.width() != w || output.height() != h {
            return Err(Error::InvalidFormat(output.format()));
        }
        self.planner
            .plan(&self.config, input.format(), output.format(), input.metadata)?;
        let plan = &self.planner.plan;

        let needs_scratch = (plan.in_desc.family == ColorFamily::Yuv
            || plan.out_desc.family == ColorFamily::Yuv)
            && !plan.yuv2yuv_fastmode;
        if needs_scratch {
            let dither_widths = if plan.dither == DitherMode::Fsb
                && plan.out_desc.family == ColorFamily::Yuv
            {
                let cw = output.format().plane_width(1, w);
                Some([w, cw, cw])
            } else {
                None
            };
            self.scratch.ensure(w, h, dither_widths)?;
        }
        output.metadata = plan.out_meta;
        Ok(())
    }

    /// Convert rows `h1..h2` of the prepared frame pair
    ///
    /// Bounds must come from [`slice_bounds`] (even-aligned, within the
    /// frame). [`Converter::prepare`] must have been called for this
    /// frame pair first.
    pub fn convert_slice(&mut self, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
        debug_assert!(h1 % 2 == 0 && h2 % 2 == 0 && h2 <= input.height());
        if h1 >= h2 {
            return;
        }
        engine::convert_slice(&self.planner.plan, &mut self.scratch, input, output, h1, h2);
    }

    /// Plan and convert the whole frame
    pub fn convert(&mut self, input: &Frame, output: &mut Frame) -> Result<()> {
        self.prepare(input, output)?;
        self.convert_slice(input, output, 0, input.height());
        Ok(())
    }

    /// Execution shape of the last prepared conversion
    pub fn plan_info(&self) -> PlanInfo {
        let plan = &self.planner.plan;
        PlanInfo {
            frame_passthrough: plan.yuv2yuv_passthrough,
            fast_yuv2yuv: plan.yuv2yuv_fastmode,
            rgb_passthrough: plan.rgb2rgb_passthrough,
            gamut_passthrough: plan.lrgb2lrgb_passthrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_bounds_tile_the_frame() {
        for height in [2usize, 96, 1080, 2160] {
            for workers in [1usize, 2, 3, 4, 7, 16] {
                let mut expected_start = 0;
                for j in 0..workers {
                    let (h1, h2) = slice_bounds(height, j, workers);
                    assert_eq!(h1 % 2, 0);
                    assert_eq!(h1, expected_start);
                    assert!(h2 >= h1);
                    expected_start = h2;
                }
                assert_eq!(expected_start, height, "height {height} workers {workers}");
            }
        }
    }

    #[test]
    fn more_workers_than_rows_leaves_trailing_slices_empty() {
        let (h1, h2) = slice_bounds(2, 3, 4);
        assert!(h1 >= h2 || h2 - h1 == 0 || h2 <= 2);
        let total: usize = (0..4)
            .map(|j| {
                let (a, b) = slice_bounds(2, j, 4);
                b.saturating_sub(a)
            })
            .sum();
        assert_eq!(total, 2);
    }
}
