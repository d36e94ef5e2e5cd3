//! Conversion planning
//!
//! The planner turns (input metadata, output metadata, formats, config)
//! into an immutable [`Plan`]: quantised coefficient tables, tone LUTs,
//! passthrough flags and kernel selections. Planning runs once per
//! metadata change; slice execution reads the plan without touching it.
//!
//! Derived tables are cached against the tags that produced them, so a
//! stream with stable metadata pays the derivation cost once, and a
//! change to one side's matrix does not rebuild the tone LUTs.

use crate::coeffs::{
    matrix_f32, quantize_lrgb2lrgb, quantize_rgb2yuv, quantize_yuv2rgb, quantize_yuv2yuv,
    range_params, rgb2yuv_matrix, yuv2rgb_matrix, yuv_offset_lanes, CoeffLanes, OffsetLanes,
};
use crate::config::{ConverterConfig, DitherMode};
use crate::error::{Error, Result};
use crate::format::{ColorFamily, FormatDescriptor, PixelFormat};
use crate::kernels::{
    select_rgb2yuv, select_rgb2yuv_fsb, select_yuv2rgb, select_yuv2yuv, Rgb2YuvFn, Rgb2YuvFsbFn,
    Yuv2RgbFn, Yuv2YuvFn,
};
use crate::lut::{HalfToneLut, IntToneLut};
use crate::math::Mat3;
use crate::meta::{ColorMetadata, MatrixCoefficients, Range};
use crate::primaries::primary_map;
use crate::tables::{
    luma_coefficients, primaries_desc, transfer_coefficients, TransferCoefficients,
};
use crate::transfer::{Delinearise, DelineariseFn};

const LINEAR_TRC: TransferCoefficients = TransferCoefficients {
    alpha: 1.0,
    beta: 0.0,
    gamma: 1.0,
    delta: 1.0,
};

/// Everything slice execution needs, derived once per metadata change
pub(crate) struct Plan {
    pub in_fmt: PixelFormat,
    pub out_fmt: PixelFormat,
    pub in_desc: FormatDescriptor,
    pub out_desc: FormatDescriptor,
    pub in_meta: ColorMetadata,
    pub out_meta: ColorMetadata,

    pub yuv2rgb_coeffs: CoeffLanes,
    pub rgb2yuv_coeffs: CoeffLanes,
    pub yuv2yuv_coeffs: CoeffLanes,
    pub yuv_offset: [OffsetLanes; 2],
    pub lrgb2lrgb_coeffs: CoeffLanes,
    pub lrgb2lrgb_f: [[f32; 3]; 3],
    pub int_lut: Option<IntToneLut>,
    pub half_lut: Option<HalfToneLut>,

    pub rgb2rgb_passthrough: bool,
    pub lrgb2lrgb_passthrough: bool,
    pub yuv2yuv_fastmode: bool,
    pub yuv2yuv_passthrough: bool,
    pub dither: DitherMode,

    /// Analytic input curve for the closed-form float paths
    pub in_transfer: TransferCoefficients,
    /// Output delinearisation for the closed-form float paths
    pub out_delin: Delinearise,

    pub k_yuv2rgb: Option<Yuv2RgbFn>,
    pub k_rgb2yuv: Option<Rgb2YuvFn>,
    pub k_rgb2yuv_fsb: Option<Rgb2YuvFsbFn>,
    pub k_yuv2yuv: Option<Yuv2YuvFn>,

    // Double-precision matrices kept for partial rebuilds
    yuv2rgb_dbl: Mat3,
    rgb2yuv_dbl: Mat3,
    yuv2yuv_valid: bool,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            in_fmt: PixelFormat::Yuv420p,
            out_fmt: PixelFormat::Yuv420p,
            in_desc: PixelFormat::Yuv420p.descriptor(),
            out_desc: PixelFormat::Yuv420p.descriptor(),
            in_meta: ColorMetadata::default(),
            out_meta: ColorMetadata::default(),
            yuv2rgb_coeffs: [[[0; 8]; 3]; 3],
            rgb2yuv_coeffs: [[[0; 8]; 3]; 3],
            yuv2yuv_coeffs: [[[0; 8]; 3]; 3],
            yuv_offset: [[0; 8]; 2],
            lrgb2lrgb_coeffs: [[[0; 8]; 3]; 3],
            lrgb2lrgb_f: [[0.0; 3]; 3],
            int_lut: None,
            half_lut: None,
            rgb2rgb_passthrough: false,
            lrgb2lrgb_passthrough: false,
            yuv2yuv_fastmode: false,
            yuv2yuv_passthrough: false,
            dither: DitherMode::None,
            in_transfer: LINEAR_TRC,
            out_delin: Delinearise::Analytic(LINEAR_TRC),
            k_yuv2rgb: None,
            k_rgb2yuv: None,
            k_rgb2yuv_fsb: None,
            k_yuv2yuv: None,
            yuv2rgb_dbl: Mat3::IDENTITY,
            rgb2yuv_dbl: Mat3::IDENTITY,
            yuv2yuv_valid: false,
        }
    }
}

/// Inputs the plan is keyed on; any difference triggers a (partial)
/// rebuild
#[derive(Clone, PartialEq)]
struct PlanKey {
    in_fmt: PixelFormat,
    out_fmt: PixelFormat,
    in_meta: ColorMetadata,
    out_meta: ColorMetadata,
    fast: bool,
    dither: DitherMode,
    wpadapt: crate::adaptation::WhitepointAdaptation,
    custom_delin: Option<DelineariseFn>,
}

fn transfers_changed(a: &PlanKey, b: &PlanKey) -> bool {
    a.in_meta.transfer != b.in_meta.transfer
        || a.out_meta.transfer != b.out_meta.transfer
        || a.custom_delin != b.custom_delin
}

fn in_yuv_changed(a: &PlanKey, b: &PlanKey) -> bool {
    a.in_fmt != b.in_fmt || a.in_meta.matrix != b.in_meta.matrix || a.in_meta.range != b.in_meta.range
}

fn out_yuv_changed(a: &PlanKey, b: &PlanKey) -> bool {
    a.out_fmt != b.out_fmt
        || a.out_meta.matrix != b.out_meta.matrix
        || a.out_meta.range != b.out_meta.range
}

/// Owns the current plan and its cache key
#[derive(Default)]
pub(crate) struct Planner {
    warned_range: bool,
    key: Option<PlanKey>,
    pub(crate) plan: Plan,
}

impl Planner {
    /// Rebuild the plan if any planning input changed
    pub(crate) fn plan(
        &mut self,
        cfg: &ConverterConfig,
        in_fmt: PixelFormat,
        out_fmt: PixelFormat,
        input_meta: ColorMetadata,
    ) -> Result<()> {
        let in_desc = in_fmt.descriptor();
        let out_desc = out_fmt.descriptor();

        if let Some(required) = cfg.format {
            if required != out_fmt {
                return Err(Error::InvalidFormat(out_fmt));
            }
        }
        // f16 and f32 layouts do not mix: neither float pipeline owns
        // the crossing
        if in_desc.is_float && out_desc.is_float && in_desc.depth != out_desc.depth {
            return Err(Error::InvalidDepth {
                in_depth: in_desc.depth,
                out_depth: out_desc.depth,
            });
        }

        let (in_meta, out_meta) =
            self.resolve_metadata(cfg, input_meta, &in_desc, &out_desc)?;

        let key = PlanKey {
            in_fmt,
            out_fmt,
            in_meta,
            out_meta,
            fast: cfg.fast,
            dither: cfg.dither,
            wpadapt: cfg.wpadapt,
            custom_delin: cfg.output_delinearise,
        };
        if self.key.as_ref() == Some(&key) {
            return Ok(());
        }
        log::debug!(
            "rebuilding plan: {in_fmt:?}/{} -> {out_fmt:?}/{}",
            format_meta(&in_meta),
            format_meta(&out_meta),
        );
        self.rebuild(cfg, key)
    }

    fn resolve_metadata(
        &mut self,
        cfg: &ConverterConfig,
        input_meta: ColorMetadata,
        in_desc: &FormatDescriptor,
        out_desc: &FormatDescriptor,
    ) -> Result<(ColorMetadata, ColorMetadata)> {
        let mut in_meta = input_meta;
        if let Some(p) = cfg.iall {
            let (m, pr, t) = p.expand();
            in_meta.matrix = m;
            in_meta.primaries = pr;
            in_meta.transfer = t;
        }
        if let Some(m) = cfg.ispace {
            in_meta.matrix = m;
        }
        if let Some(r) = cfg.irange {
            if r != Range::Unspecified {
                in_meta.range = r;
            }
        }
        if let Some(p) = cfg.iprimaries {
            in_meta.primaries = p;
        }
        if let Some(t) = cfg.itrc {
            in_meta.transfer = t;
        }

        let mut out_meta = in_meta;
        if let Some(p) = cfg.all {
            let (m, pr, t) = p.expand();
            out_meta.matrix = m;
            out_meta.primaries = pr;
            out_meta.transfer = t;
        }
        if let Some(m) = cfg.space {
            out_meta.matrix = m;
        }
        if let Some(r) = cfg.range {
            if r != Range::Unspecified {
                out_meta.range = r;
            }
        }
        if let Some(p) = cfg.primaries {
            out_meta.primaries = p;
        }
        if let Some(t) = cfg.trc {
            out_meta.transfer = t;
        }

        self.reconcile_family(&mut in_meta, in_desc, cfg.ispace)?;
        self.reconcile_family(&mut out_meta, out_desc, cfg.space)?;
        Ok((in_meta, out_meta))
    }

    fn reconcile_family(
        &mut self,
        meta: &mut ColorMetadata,
        desc: &FormatDescriptor,
        explicit_matrix: Option<MatrixCoefficients>,
    ) -> Result<()> {
        match desc.family {
            ColorFamily::Rgb => {
                // An explicitly requested YUV matrix is a contradiction;
                // an inherited tag is simply dropped
                if let Some(m) = explicit_matrix {
                    if m != MatrixCoefficients::Identity && m != MatrixCoefficients::Unspecified {
                        return Err(Error::FamilyMismatch(
                            "GBR format cannot carry YUV matrix coefficients",
                        ));
                    }
                }
                meta.matrix = MatrixCoefficients::Identity;
                meta.range = Range::Full;
            }
            ColorFamily::Yuv => {
                if meta.matrix == MatrixCoefficients::Identity {
                    return Err(Error::FamilyMismatch(
                        "YUV format requires non-identity matrix coefficients",
                    ));
                }
                if meta.range == Range::Unspecified {
                    if !self.warned_range {
                        log::warn!("range unspecified; assuming limited (TV) range");
                        self.warned_range = true;
                    }
                    meta.range = Range::Limited;
                }
            }
        }
        Ok(())
    }

    fn rebuild(&mut self, cfg: &ConverterConfig, key: PlanKey) -> Result<()> {
        let old_key = self.key.take();
        let plan = &mut self.plan;
        let in_desc = key.in_fmt.descriptor();
        let out_desc = key.out_fmt.descriptor();
        let in_meta = key.in_meta;
        let out_meta = key.out_meta;
        let in_yuv = in_desc.family == ColorFamily::Yuv;
        let out_yuv = out_desc.family == ColorFamily::Yuv;

        // Passthrough analysis (tags only)
        let in_prim = primaries_desc(in_meta.primaries);
        let out_prim = primaries_desc(out_meta.primaries);
        let lrgb2lrgb_passthrough = match (&in_prim, &out_prim) {
            (Some(a), Some(b)) => a == b,
            _ => in_meta.primaries == out_meta.primaries,
        };
        let rgb2rgb_passthrough = cfg.fast
            || (lrgb2lrgb_passthrough
                && cfg.output_delinearise.is_none()
                && in_meta.transfer == out_meta.transfer);
        let ss_match = in_desc.log2_chroma_w == out_desc.log2_chroma_w
            && in_desc.log2_chroma_h == out_desc.log2_chroma_h;
        let yuv2yuv_fastmode = rgb2rgb_passthrough && in_yuv && out_yuv && ss_match;
        let yuv2yuv_passthrough = yuv2yuv_fastmode
            && in_meta.range == out_meta.range
            && in_meta.matrix == out_meta.matrix
            && in_desc.depth == out_desc.depth;

        // Transfer resolution
        let in_trc = transfer_coefficients(in_meta.transfer);
        let out_delin = match cfg.output_delinearise {
            Some(f) => Some(Delinearise::Custom(f)),
            None => transfer_coefficients(out_meta.transfer).map(Delinearise::Analytic),
        };
        if !rgb2rgb_passthrough {
            match in_trc {
                Some(c) if c.is_analytic() => {}
                _ => return Err(Error::UnknownTransfer),
            }
            if out_delin.is_none() {
                return Err(Error::UnknownTransfer);
            }
            if !lrgb2lrgb_passthrough && (in_prim.is_none() || out_prim.is_none()) {
                return Err(Error::UnknownPrimaries);
            }
        }

        // YUV-side coefficient groups, rebuilt only when their inputs
        // changed
        let redo_in = old_key.as_ref().map_or(true, |k| in_yuv_changed(k, &key));
        let redo_out = old_key.as_ref().map_or(true, |k| out_yuv_changed(k, &key));
        if in_yuv {
            let rp = range_params(in_meta.range, in_desc.depth);
            if redo_in {
                let luma = luma_coefficients(in_meta.matrix).ok_or(Error::UnknownMatrix)?;
                plan.yuv2rgb_dbl = yuv2rgb_matrix(&luma);
                plan.yuv2rgb_coeffs = quantize_yuv2rgb(&plan.yuv2rgb_dbl, in_desc.depth, &rp);
                plan.yuv_offset[0] = yuv_offset_lanes(&rp);
            }
            plan.k_yuv2rgb = Some(select_yuv2rgb(
                in_desc.depth,
                (in_desc.log2_chroma_w, in_desc.log2_chroma_h),
            ));
        } else {
            plan.k_yuv2rgb = None;
        }
        if out_yuv {
            let rp = range_params(out_meta.range, out_desc.depth);
            if redo_out {
                let luma = luma_coefficients(out_meta.matrix).ok_or(Error::UnknownMatrix)?;
                plan.rgb2yuv_dbl = rgb2yuv_matrix(&luma);
                plan.rgb2yuv_coeffs = quantize_rgb2yuv(&plan.rgb2yuv_dbl, out_desc.depth, &rp);
                plan.yuv_offset[1] = yuv_offset_lanes(&rp);
            }
            let ss = (out_desc.log2_chroma_w, out_desc.log2_chroma_h);
            plan.k_rgb2yuv = Some(select_rgb2yuv(out_desc.depth, ss));
            plan.k_rgb2yuv_fsb = match cfg.dither {
                DitherMode::Fsb => Some(select_rgb2yuv_fsb(out_desc.depth, ss)),
                DitherMode::None => None,
            };
        } else {
            plan.k_rgb2yuv = None;
            plan.k_rgb2yuv_fsb = None;
        }
        if yuv2yuv_fastmode && !yuv2yuv_passthrough {
            if redo_in || redo_out || !plan.yuv2yuv_valid {
                let composed = plan.rgb2yuv_dbl.mul(&plan.yuv2rgb_dbl);
                plan.yuv2yuv_coeffs = quantize_yuv2yuv(
                    &composed,
                    in_desc.depth,
                    out_desc.depth,
                    &range_params(in_meta.range, in_desc.depth),
                    &range_params(out_meta.range, out_desc.depth),
                );
                plan.yuv2yuv_valid = true;
            }
            plan.k_yuv2yuv = Some(select_yuv2yuv(
                in_desc.depth,
                out_desc.depth,
                (in_desc.log2_chroma_w, in_desc.log2_chroma_h),
            ));
        } else {
            plan.k_yuv2yuv = None;
            if redo_in || redo_out {
                plan.yuv2yuv_valid = false;
            }
        }

        // Primary map
        if !rgb2rgb_passthrough && !lrgb2lrgb_passthrough {
            // Presence checked above
            if let (Some(src), Some(dst)) = (&in_prim, &out_prim) {
                let m = primary_map(src, dst, cfg.wpadapt);
                plan.lrgb2lrgb_coeffs = quantize_lrgb2lrgb(&m);
                plan.lrgb2lrgb_f = matrix_f32(&m);
            }
        } else {
            plan.lrgb2lrgb_coeffs = quantize_lrgb2lrgb(&Mat3::IDENTITY);
            plan.lrgb2lrgb_f = matrix_f32(&Mat3::IDENTITY);
        }

        // Tone LUTs, cached against the transfer tags
        let luts_reusable = old_key
            .as_ref()
            .map_or(false, |k| !transfers_changed(k, &key));
        let need_int_lut = !rgb2rgb_passthrough && !yuv2yuv_fastmode && in_yuv;
        let need_half_lut = !rgb2rgb_passthrough
            && in_desc.is_float
            && in_desc.depth == 16
            && out_desc.is_float;
        if need_int_lut {
            if !(luts_reusable && plan.int_lut.is_some()) {
                // Presence and analyticity checked above
                if let (Some(c), Some(d)) = (&in_trc, &out_delin) {
                    plan.int_lut = Some(IntToneLut::build(c, d));
                }
            }
        } else {
            plan.int_lut = None;
        }
        if need_half_lut {
            if !(luts_reusable && plan.half_lut.is_some()) {
                if let (Some(c), Some(d)) = (&in_trc, &out_delin) {
                    plan.half_lut = Some(HalfToneLut::build(c, d));
                }
            }
        } else {
            plan.half_lut = None;
        }

        plan.in_fmt = key.in_fmt;
        plan.out_fmt = key.out_fmt;
        plan.in_desc = in_desc;
        plan.out_desc = out_desc;
        plan.in_meta = in_meta;
        plan.out_meta = out_meta;
        plan.rgb2rgb_passthrough = rgb2rgb_passthrough;
        plan.lrgb2lrgb_passthrough = lrgb2lrgb_passthrough;
        plan.yuv2yuv_fastmode = yuv2yuv_fastmode;
        plan.yuv2yuv_passthrough = yuv2yuv_passthrough;
        plan.dither = cfg.dither;
        plan.in_transfer = in_trc.unwrap_or(LINEAR_TRC);
        plan.out_delin = out_delin.unwrap_or(Delinearise::Analytic(LINEAR_TRC));

        if yuv2yuv_passthrough {
            log::debug!("plan: yuv2yuv passthrough (plane copy)");
        } else if yuv2yuv_fastmode {
            log::debug!("plan: composed yuv2yuv fast path");
        } else if rgb2rgb_passthrough {
            log::debug!("plan: rgb passthrough (no gamut/tone mapping)");
        }

        self.key = Some(key);
        Ok(())
    }
}

fn format_meta(m: &ColorMetadata) -> String {
    format!("{}/{}/{}/{}", m.matrix, m.primaries, m.transfer, m.range)
}
