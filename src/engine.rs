//! Slice execution
//!
//! Executes one horizontal slice of a planned conversion. Three
//! specialised pipelines cover the homogeneous cases (integer YUV,
//! half-float GBR, single-float GBR); two bridge paths connect integer
//! YUV with float GBR through the int16 linear intermediate. Slice
//! bounds are chroma-row aligned and workers write disjoint regions, so
//! per-slice calls are order-independent (dither excepted).

use half::f16;

use crate::coeffs::INT_ONE;
use crate::config::DitherMode;
use crate::format::ColorFamily;
use crate::frame::Frame;
use crate::kernels::{
    apply_lut_rows, apply_matrix_rows, Rgb2YuvFn, Rgb2YuvFsbFn, Yuv2RgbFn, Yuv2YuvFn,
};
use crate::meta::TransferCharacteristic;
use crate::plan::Plan;
use crate::scratch::ScratchManager;
use crate::transfer::linearise;

const F16_ONE: u16 = 0x3C00;

/// Execute one slice of the planned conversion
///
/// `h1..h2` must be even-aligned and within the frame height.
pub(crate) fn convert_slice(
    plan: &Plan,
    scratch: &mut ScratchManager,
    input: &Frame,
    output: &mut Frame,
    h1: usize,
    h2: usize,
) {
    let in_yuv = plan.in_desc.family == ColorFamily::Yuv;
    let out_yuv = plan.out_desc.family == ColorFamily::Yuv;
    match (in_yuv, out_yuv) {
        (true, true) => yuv_to_yuv(plan, scratch, input, output, h1, h2),
        (true, false) => yuv_to_float(plan, scratch, input, output, h1, h2),
        (false, true) => float_to_yuv(plan, scratch, input, output, h1, h2),
        (false, false) => float_to_float(plan, input, output, h1, h2),
    }
}

fn yuv_to_yuv(
    plan: &Plan,
    scratch: &mut ScratchManager,
    input: &Frame,
    output: &mut Frame,
    h1: usize,
    h2: usize,
) {
    if plan.yuv2yuv_passthrough {
        copy_yuv_rows(plan, input, output, h1, h2);
        return;
    }
    if plan.yuv2yuv_fastmode {
        run_yuv2yuv(plan, input, output, h1, h2);
        return;
    }
    run_yuv2rgb(plan, scratch, input, h1, h2);
    apply_middle(plan, scratch, input.width(), h1, h2);
    run_rgb2yuv(plan, scratch, output, h1, h2);
}

/// LUT linearise, primary map, LUT delinearise on the scratch slice
fn apply_middle(plan: &Plan, scratch: &mut ScratchManager, w: usize, h1: usize, h2: usize) {
    if plan.rgb2rgb_passthrough {
        return;
    }
    let stride = scratch.stride();
    let off = h1 * stride;
    let rows = h2 - h1;
    let Some(lut) = &plan.int_lut else { return };
    let [r, g, b] = &mut scratch.rgb;
    let planes = [&mut r[off..], &mut g[off..], &mut b[off..]];
    apply_lut_rows(planes, stride, w, rows, lut.lin());
    if !plan.lrgb2lrgb_passthrough {
        let [r, g, b] = &mut scratch.rgb;
        apply_matrix_rows(
            [&mut r[off..], &mut g[off..], &mut b[off..]],
            stride,
            w,
            rows,
            &plan.lrgb2lrgb_coeffs,
        );
    }
    let [r, g, b] = &mut scratch.rgb;
    apply_lut_rows(
        [&mut r[off..], &mut g[off..], &mut b[off..]],
        stride,
        w,
        rows,
        lut.delin(),
    );
}

fn run_yuv2rgb(plan: &Plan, scratch: &mut ScratchManager, input: &Frame, h1: usize, h2: usize) {
    let d = &plan.in_desc;
    let w = input.width();
    let rows = h2 - h1;
    let stride = scratch.stride();
    let off = h1 * stride;
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    let yo = h1 * strides[0];
    let c1 = (h1 >> d.log2_chroma_h) * strides[1];
    let c2 = (h1 >> d.log2_chroma_h) * strides[2];
    let [r, g, b] = &mut scratch.rgb;
    let rgb = [&mut r[off..], &mut g[off..], &mut b[off..]];
    match &plan.k_yuv2rgb {
        Some(Yuv2RgbFn::B8(f)) => f(
            rgb,
            stride,
            [
                &input.plane_u8(0)[yo..],
                &input.plane_u8(1)[c1..],
                &input.plane_u8(2)[c2..],
            ],
            strides,
            w,
            rows,
            &plan.yuv2rgb_coeffs,
            &plan.yuv_offset[0],
            d.depth,
        ),
        Some(Yuv2RgbFn::B16(f)) => f(
            rgb,
            stride,
            [
                &input.plane_u16(0)[yo..],
                &input.plane_u16(1)[c1..],
                &input.plane_u16(2)[c2..],
            ],
            strides,
            w,
            rows,
            &plan.yuv2rgb_coeffs,
            &plan.yuv_offset[0],
            d.depth,
        ),
        None => {}
    }
}

fn run_rgb2yuv(
    plan: &Plan,
    scratch: &mut ScratchManager,
    output: &mut Frame,
    h1: usize,
    h2: usize,
) {
    let d = plan.out_desc;
    let w = output.width();
    let rows = h2 - h1;
    let stride = scratch.stride();
    let off = h1 * stride;
    let strides = [output.stride(0), output.stride(1), output.stride(2)];
    let yo = h1 * strides[0];
    let c1 = (h1 >> d.log2_chroma_h) * strides[1];
    let c2 = (h1 >> d.log2_chroma_h) * strides[2];
    let ScratchManager { rgb, dither, .. } = scratch;
    let rgb = [&rgb[0][off..], &rgb[1][off..], &rgb[2][off..]];

    if plan.dither == DitherMode::Fsb {
        if let Some(k) = &plan.k_rgb2yuv_fsb {
            // Diffusion restarts at the slice boundary
            for rows in dither.iter_mut() {
                rows.reset();
            }
            match k {
                Rgb2YuvFsbFn::B8(f) => {
                    let [y, u, v] = output.planes_u8_mut3();
                    f(
                        [&mut y[yo..], &mut u[c1..], &mut v[c2..]],
                        strides,
                        rgb,
                        stride,
                        w,
                        rows,
                        &plan.rgb2yuv_coeffs,
                        &plan.yuv_offset[1],
                        d.depth,
                        dither,
                    );
                }
                Rgb2YuvFsbFn::B16(f) => {
                    let [y, u, v] = output.planes_u16_mut3();
                    f(
                        [&mut y[yo..], &mut u[c1..], &mut v[c2..]],
                        strides,
                        rgb,
                        stride,
                        w,
                        rows,
                        &plan.rgb2yuv_coeffs,
                        &plan.yuv_offset[1],
                        d.depth,
                        dither,
                    );
                }
            }
            return;
        }
    }
    match &plan.k_rgb2yuv {
        Some(Rgb2YuvFn::B8(f)) => {
            let [y, u, v] = output.planes_u8_mut3();
            f(
                [&mut y[yo..], &mut u[c1..], &mut v[c2..]],
                strides,
                rgb,
                stride,
                w,
                rows,
                &plan.rgb2yuv_coeffs,
                &plan.yuv_offset[1],
                d.depth,
            );
        }
        Some(Rgb2YuvFn::B16(f)) => {
            let [y, u, v] = output.planes_u16_mut3();
            f(
                [&mut y[yo..], &mut u[c1..], &mut v[c2..]],
                strides,
                rgb,
                stride,
                w,
                rows,
                &plan.rgb2yuv_coeffs,
                &plan.yuv_offset[1],
                d.depth,
            );
        }
        None => {}
    }
}

fn run_yuv2yuv(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    let d_in = plan.in_desc;
    let d_out = plan.out_desc;
    let w = input.width();
    let rows = h2 - h1;
    let src_strides = [input.stride(0), input.stride(1), input.stride(2)];
    let dst_strides = [output.stride(0), output.stride(1), output.stride(2)];
    let syo = h1 * src_strides[0];
    let sc1 = (h1 >> d_in.log2_chroma_h) * src_strides[1];
    let sc2 = (h1 >> d_in.log2_chroma_h) * src_strides[2];
    let dyo = h1 * dst_strides[0];
    let dc1 = (h1 >> d_out.log2_chroma_h) * dst_strides[1];
    let dc2 = (h1 >> d_out.log2_chroma_h) * dst_strides[2];

    macro_rules! run {
        ($f:expr, $src:ident, $dst:ident) => {{
            let src = [
                &input.$src(0)[syo..],
                &input.$src(1)[sc1..],
                &input.$src(2)[sc2..],
            ];
            let [y, u, v] = output.$dst();
            $f(
                [&mut y[dyo..], &mut u[dc1..], &mut v[dc2..]],
                dst_strides,
                src,
                src_strides,
                w,
                rows,
                &plan.yuv2yuv_coeffs,
                &plan.yuv_offset,
                d_in.depth,
                d_out.depth,
            )
        }};
    }
    match &plan.k_yuv2yuv {
        Some(Yuv2YuvFn::B8B8(f)) => run!(f, plane_u8, planes_u8_mut3),
        Some(Yuv2YuvFn::B8B16(f)) => run!(f, plane_u8, planes_u16_mut3),
        Some(Yuv2YuvFn::B16B8(f)) => run!(f, plane_u16, planes_u8_mut3),
        Some(Yuv2YuvFn::B16B16(f)) => run!(f, plane_u16, planes_u16_mut3),
        None => {}
    }
}

fn copy_yuv_rows(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    let d = plan.in_desc;
    for p in 0..3 {
        let (r1, r2) = if p == 0 {
            (h1, h2)
        } else {
            (h1 >> d.log2_chroma_h, h2 >> d.log2_chroma_h)
        };
        let w = plan.in_fmt.plane_width(p, input.width());
        let (ss, ds) = (input.stride(p), output.stride(p));
        if d.depth == 8 {
            let src = input.plane_u8(p);
            let dst = output.plane_u8_mut(p);
            for y in r1..r2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        } else {
            let src = input.plane_u16(p);
            let dst = output.plane_u16_mut(p);
            for y in r1..r2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        }
    }
}

/// Integer YUV to float GBR: the int16 linear intermediate is scaled to
/// real units and delinearised in closed form at store time
fn yuv_to_float(
    plan: &Plan,
    scratch: &mut ScratchManager,
    input: &Frame,
    output: &mut Frame,
    h1: usize,
    h2: usize,
) {
    run_yuv2rgb(plan, scratch, input, h1, h2);
    if !plan.rgb2rgb_passthrough {
        let stride = scratch.stride();
        let off = h1 * stride;
        let rows = h2 - h1;
        let w = input.width();
        if let Some(lut) = &plan.int_lut {
            let [r, g, b] = &mut scratch.rgb;
            apply_lut_rows(
                [&mut r[off..], &mut g[off..], &mut b[off..]],
                stride,
                w,
                rows,
                lut.lin(),
            );
        }
        if !plan.lrgb2lrgb_passthrough {
            let [r, g, b] = &mut scratch.rgb;
            apply_matrix_rows(
                [&mut r[off..], &mut g[off..], &mut b[off..]],
                stride,
                w,
                rows,
                &plan.lrgb2lrgb_coeffs,
            );
        }
    }
    let w = output.width();
    let sc_stride = scratch.stride();
    let delin = !plan.rgb2rgb_passthrough;
    // Output plane order is G, B, R; scratch order is R, G, B
    for (plane, sc) in [(0usize, 1usize), (1, 2), (2, 0)] {
        let stride = output.stride(plane);
        let src = &scratch.rgb[sc];
        if plan.out_desc.depth == 32 {
            let dst = output.plane_f32_mut(plane);
            for y in h1..h2 {
                for x in 0..w {
                    let mut v = src[y * sc_stride + x] as f64 / INT_ONE as f64;
                    if delin {
                        v = plan.out_delin.eval(v);
                    }
                    dst[y * stride + x] = v as f32;
                }
            }
        } else {
            let dst = output.plane_u16_mut(plane);
            for y in h1..h2 {
                for x in 0..w {
                    let mut v = src[y * sc_stride + x] as f64 / INT_ONE as f64;
                    if delin {
                        v = plan.out_delin.eval(v);
                    }
                    dst[y * stride + x] = f16::from_f64(v).to_bits();
                }
            }
        }
    }
    if plan.out_desc.has_alpha {
        fill_opaque_alpha(plan, output, h1, h2);
    }
}

/// Float GBR to integer YUV: closed-form transfer work in double
/// precision, quantised into the int16 intermediate for the integer
/// output kernel
fn float_to_yuv(
    plan: &Plan,
    scratch: &mut ScratchManager,
    input: &Frame,
    output: &mut Frame,
    h1: usize,
    h2: usize,
) {
    let w = input.width();
    let stride = scratch.stride();
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    let full = !plan.rgb2rgb_passthrough;
    let m = &plan.lrgb2lrgb_f;
    let map = !plan.lrgb2lrgb_passthrough;
    let half_input = plan.in_desc.depth == 16;

    let load = |plane: usize, idx: usize| -> f64 {
        if half_input {
            f16::from_bits(input.plane_u16(plane)[idx]).to_f64()
        } else {
            input.plane_f32(plane)[idx] as f64
        }
    };

    let [rp, gp, bp] = &mut scratch.rgb;
    for y in h1..h2 {
        let row = y * stride;
        for x in 0..w {
            // Input plane order is G, B, R
            let mut g = load(0, y * strides[0] + x);
            let mut b = load(1, y * strides[1] + x);
            let mut r = load(2, y * strides[2] + x);
            if full {
                r = linearise(&plan.in_transfer, r);
                g = linearise(&plan.in_transfer, g);
                b = linearise(&plan.in_transfer, b);
                if map {
                    let (r0, g0, b0) = (r, g, b);
                    r = m[0][0] as f64 * r0 + m[0][1] as f64 * g0 + m[0][2] as f64 * b0;
                    g = m[1][0] as f64 * r0 + m[1][1] as f64 * g0 + m[1][2] as f64 * b0;
                    b = m[2][0] as f64 * r0 + m[2][1] as f64 * g0 + m[2][2] as f64 * b0;
                }
                r = plan.out_delin.eval(r);
                g = plan.out_delin.eval(g);
                b = plan.out_delin.eval(b);
            }
            rp[row + x] = quantize_i16(r);
            gp[row + x] = quantize_i16(g);
            bp[row + x] = quantize_i16(b);
        }
    }
    run_rgb2yuv(plan, scratch, output, h1, h2);
}

fn quantize_i16(v: f64) -> i16 {
    (v * INT_ONE as f64)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn float_to_float(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    if plan.rgb2rgb_passthrough {
        copy_float_rows(plan, input, output, h1, h2);
        return;
    }
    if plan.in_desc.depth == 16 {
        half_pipeline(plan, input, output, h1, h2);
    } else {
        single_pipeline(plan, input, output, h1, h2);
    }
    copy_or_fill_alpha(plan, input, output, h1, h2);
}

/// Half-float pipeline: everything runs through the 65536-entry LUT
/// pair, with a per-element f32 round trip only for the primary map
fn half_pipeline(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    let w = input.width();
    let in_strides = [input.stride(0), input.stride(1), input.stride(2)];
    let out_strides = [output.stride(0), output.stride(1), output.stride(2)];
    let Some(lut) = &plan.half_lut else { return };

    // Linear input straight into the output curve
    if plan.in_meta.transfer == TransferCharacteristic::Linear && plan.lrgb2lrgb_passthrough {
        let delin = lut.delin();
        for p in 0..3 {
            let src = input.plane_u16(p);
            let dst = output.plane_u16_mut(p);
            for y in h1..h2 {
                for x in 0..w {
                    dst[y * out_strides[p] + x] = delin[src[y * in_strides[p] + x] as usize];
                }
            }
        }
        return;
    }

    let (lin, delin) = (lut.lin(), lut.delin());
    let m = &plan.lrgb2lrgb_f;
    let map = !plan.lrgb2lrgb_passthrough;
    let (gp, bp, rp) = (input.plane_u16(0), input.plane_u16(1), input.plane_u16(2));
    let [god, bod, rod] = output.planes_u16_mut3();
    for y in h1..h2 {
        for x in 0..w {
            let mut g = lin[gp[y * in_strides[0] + x] as usize];
            let mut b = lin[bp[y * in_strides[1] + x] as usize];
            let mut r = lin[rp[y * in_strides[2] + x] as usize];
            if map {
                let rf = f16::from_bits(r).to_f32();
                let gf = f16::from_bits(g).to_f32();
                let bf = f16::from_bits(b).to_f32();
                r = f16::from_f32(m[0][0] * rf + m[0][1] * gf + m[0][2] * bf).to_bits();
                g = f16::from_f32(m[1][0] * rf + m[1][1] * gf + m[1][2] * bf).to_bits();
                b = f16::from_f32(m[2][0] * rf + m[2][1] * gf + m[2][2] * bf).to_bits();
            }
            god[y * out_strides[0] + x] = delin[g as usize];
            bod[y * out_strides[1] + x] = delin[b as usize];
            rod[y * out_strides[2] + x] = delin[r as usize];
        }
    }
}

/// Single-float pipeline: closed-form curves per pixel, no LUT
fn single_pipeline(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    let w = input.width();
    let in_strides = [input.stride(0), input.stride(1), input.stride(2)];
    let out_strides = [output.stride(0), output.stride(1), output.stride(2)];
    let m = &plan.lrgb2lrgb_f;
    let map = !plan.lrgb2lrgb_passthrough;
    let (gp, bp, rp) = (input.plane_f32(0), input.plane_f32(1), input.plane_f32(2));
    let [god, bod, rod] = output.planes_f32_mut3();
    for y in h1..h2 {
        for x in 0..w {
            let mut g = linearise(&plan.in_transfer, gp[y * in_strides[0] + x] as f64);
            let mut b = linearise(&plan.in_transfer, bp[y * in_strides[1] + x] as f64);
            let mut r = linearise(&plan.in_transfer, rp[y * in_strides[2] + x] as f64);
            if map {
                let (r0, g0, b0) = (r, g, b);
                r = m[0][0] as f64 * r0 + m[0][1] as f64 * g0 + m[0][2] as f64 * b0;
                g = m[1][0] as f64 * r0 + m[1][1] as f64 * g0 + m[1][2] as f64 * b0;
                b = m[2][0] as f64 * r0 + m[2][1] as f64 * g0 + m[2][2] as f64 * b0;
            }
            god[y * out_strides[0] + x] = plan.out_delin.eval(g) as f32;
            bod[y * out_strides[1] + x] = plan.out_delin.eval(b) as f32;
            rod[y * out_strides[2] + x] = plan.out_delin.eval(r) as f32;
        }
    }
}

fn copy_float_rows(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    let w = input.width();
    for p in 0..3 {
        let (ss, ds) = (input.stride(p), output.stride(p));
        if plan.in_desc.depth == 16 {
            let src = input.plane_u16(p);
            let dst = output.plane_u16_mut(p);
            for y in h1..h2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        } else {
            let src = input.plane_f32(p);
            let dst = output.plane_f32_mut(p);
            for y in h1..h2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        }
    }
    copy_or_fill_alpha(plan, input, output, h1, h2);
}

/// Alpha is copied verbatim, never transformed; a missing input alpha
/// becomes fully opaque
fn copy_or_fill_alpha(plan: &Plan, input: &Frame, output: &mut Frame, h1: usize, h2: usize) {
    if !plan.out_desc.has_alpha {
        return;
    }
    if plan.in_desc.has_alpha {
        let w = input.width();
        let (ss, ds) = (input.stride(3), output.stride(3));
        if plan.out_desc.depth == 16 {
            let src = input.plane_u16(3);
            let dst = output.plane_u16_mut(3);
            for y in h1..h2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        } else {
            let src = input.plane_f32(3);
            let dst = output.plane_f32_mut(3);
            for y in h1..h2 {
                dst[y * ds..y * ds + w].copy_from_slice(&src[y * ss..y * ss + w]);
            }
        }
    } else {
        fill_opaque_alpha(plan, output, h1, h2);
    }
}

fn fill_opaque_alpha(plan: &Plan, output: &mut Frame, h1: usize, h2: usize) {
    let w = output.width();
    let ds = output.stride(3);
    if plan.out_desc.depth == 16 {
        let dst = output.plane_u16_mut(3);
        for y in h1..h2 {
            dst[y * ds..y * ds + w].fill(F16_ONE);
        }
    } else {
        let dst = output.plane_f32_mut(3);
        for y in h1..h2 {
            dst[y * ds..y * ds + w].fill(1.0);
        }
    }
}
