//! Fixed-point integer pixel kernels
//!
//! All integer-path work happens here: YUV to int16 RGB, the LUT and
//! Q14 matrix middle stages, int16 RGB back to YUV (with an optional
//! error-diffusion variant), and the composed single-matrix YUV to YUV
//! kernel. Kernels are generic over the plane sample type and chroma
//! subsampling, monomorphised once per supported combination and
//! selected through small sum types so the hot loops stay static calls.
//!
//! Chroma handling is nearest-neighbour both ways: one chroma sample
//! covers its whole block on upsampling, and the block's top-left
//! position is the representative on downsampling. Callers wanting
//! better resampling must convert to 4:4:4 first.

use crate::coeffs::{CoeffLanes, OffsetLanes};
use crate::lut::{INT_LUT_SIZE, INT_LUT_ZERO};
use crate::scratch::DitherRows;

/// Integer plane sample (u8 for 8-bit, u16 for 10/12-bit)
pub(crate) trait Sample: Copy {
    fn to_i32(self) -> i32;
    fn from_clipped(v: i32, max: i32) -> Self;
}

impl Sample for u8 {
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_clipped(v: i32, max: i32) -> Self {
        v.clamp(0, max) as u8
    }
}

impl Sample for u16 {
    #[inline(always)]
    fn to_i32(self) -> i32 {
        self as i32
    }

    #[inline(always)]
    fn from_clipped(v: i32, max: i32) -> Self {
        v.clamp(0, max) as u16
    }
}

#[inline(always)]
fn clip_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[inline(always)]
fn coeff_row(coeffs: &CoeffLanes, n: usize) -> [i32; 3] {
    [
        coeffs[n][0][0] as i32,
        coeffs[n][1][0] as i32,
        coeffs[n][2][0] as i32,
    ]
}

/// YUV planes to int16 RGB at the 28672 scale
///
/// Shift is `depth - 1`, matching the coefficient quantisation.
fn yuv2rgb<T: Sample, const SS_W: usize, const SS_H: usize>(
    rgb: [&mut [i16]; 3],
    rgb_stride: usize,
    yuv: [&[T]; 3],
    yuv_stride: [usize; 3],
    w: usize,
    h: usize,
    coeffs: &CoeffLanes,
    yuv_offset: &OffsetLanes,
    depth: u8,
) {
    let sh = depth as i32 - 1;
    let rnd = 1i32 << (sh - 1);
    let y_off = yuv_offset[0] as i32;
    let uv_center = 1i32 << (depth - 1);
    let [cr, cg, cb] = [
        coeff_row(coeffs, 0),
        coeff_row(coeffs, 1),
        coeff_row(coeffs, 2),
    ];
    let [rp, gp, bp] = rgb;

    for by in (0..h).step_by(1 << SS_H) {
        let cy = by >> SS_H;
        for bx in (0..w).step_by(1 << SS_W) {
            let cx = bx >> SS_W;
            let u = yuv[1][cy * yuv_stride[1] + cx].to_i32() - uv_center;
            let v = yuv[2][cy * yuv_stride[2] + cx].to_i32() - uv_center;
            for dy in 0..(1 << SS_H) {
                let row = (by + dy) * yuv_stride[0];
                let out_row = (by + dy) * rgb_stride;
                for dx in 0..(1 << SS_W) {
                    let y = yuv[0][row + bx + dx].to_i32() - y_off;
                    let idx = out_row + bx + dx;
                    rp[idx] = clip_i16((y * cr[0] + u * cr[1] + v * cr[2] + rnd) >> sh);
                    gp[idx] = clip_i16((y * cg[0] + u * cg[1] + v * cg[2] + rnd) >> sh);
                    bp[idx] = clip_i16((y * cb[0] + u * cb[1] + v * cb[2] + rnd) >> sh);
                }
            }
        }
    }
}

/// int16 RGB back to YUV planes
///
/// Shift is `29 - depth`. Chroma takes the block's top-left RGB sample.
fn rgb2yuv<T: Sample, const SS_W: usize, const SS_H: usize>(
    yuv: [&mut [T]; 3],
    yuv_stride: [usize; 3],
    rgb: [&[i16]; 3],
    rgb_stride: usize,
    w: usize,
    h: usize,
    coeffs: &CoeffLanes,
    yuv_offset: &OffsetLanes,
    depth: u8,
) {
    let sh = 29 - depth as i32;
    let rnd = 1i64 << (sh - 1);
    let y_off = yuv_offset[0] as i32;
    let uv_center = 1i32 << (depth - 1);
    let max = (1i32 << depth) - 1;
    let [cy_row, cu_row, cv_row] = [
        coeff_row(coeffs, 0),
        coeff_row(coeffs, 1),
        coeff_row(coeffs, 2),
    ];
    let [yp, up, vp] = yuv;

    for by in (0..h).step_by(1 << SS_H) {
        let crow = (by >> SS_H) * yuv_stride[1];
        let crow_v = (by >> SS_H) * yuv_stride[2];
        for bx in (0..w).step_by(1 << SS_W) {
            for dy in 0..(1 << SS_H) {
                let in_row = (by + dy) * rgb_stride;
                let out_row = (by + dy) * yuv_stride[0];
                for dx in 0..(1 << SS_W) {
                    let idx = in_row + bx + dx;
                    let (r, g, b) = (rgb[0][idx] as i64, rgb[1][idx] as i64, rgb[2][idx] as i64);
                    let y = ((r * cy_row[0] as i64 + g * cy_row[1] as i64 + b * cy_row[2] as i64
                        + rnd)
                        >> sh) as i32;
                    yp[out_row + bx + dx] = T::from_clipped(y + y_off, max);
                }
            }
            let idx = by * rgb_stride + bx;
            let (r, g, b) = (rgb[0][idx] as i64, rgb[1][idx] as i64, rgb[2][idx] as i64);
            let u = ((r * cu_row[0] as i64 + g * cu_row[1] as i64 + b * cu_row[2] as i64 + rnd)
                >> sh) as i32;
            let v = ((r * cv_row[0] as i64 + g * cv_row[1] as i64 + b * cv_row[2] as i64 + rnd)
                >> sh) as i32;
            up[crow + (bx >> SS_W)] = T::from_clipped(u + uv_center, max);
            vp[crow_v + (bx >> SS_W)] = T::from_clipped(v + uv_center, max);
        }
    }
}

/// One error-diffused quantisation step
///
/// `cur`/`next` are offset by one so column -1 is addressable; the
/// residual spreads 7/16 right, 3/16 below-left, 5/16 below and 1/16
/// below-right.
#[inline(always)]
fn diffuse(sum: i64, x: usize, sh: i32, cur: &mut [i32], next: &mut [i32]) -> i32 {
    let total = sum + cur[x + 1] as i64;
    let q = total >> sh;
    let err = (total - (q << sh)) as i32;
    cur[x + 1] = 0;
    cur[x + 2] += (err * 7) >> 4;
    next[x] += (err * 3) >> 4;
    next[x + 1] += (err * 5) >> 4;
    next[x + 2] += err >> 4;
    q as i32
}

/// int16 RGB back to YUV with Floyd-Steinberg error diffusion
///
/// Components are processed row-sequentially so the diffusion order is
/// the classic left-to-right, top-to-bottom scan; luma runs on the
/// full grid and each chroma plane on its subsampled grid.
fn rgb2yuv_fsb<T: Sample, const SS_W: usize, const SS_H: usize>(
    yuv: [&mut [T]; 3],
    yuv_stride: [usize; 3],
    rgb: [&[i16]; 3],
    rgb_stride: usize,
    w: usize,
    h: usize,
    coeffs: &CoeffLanes,
    yuv_offset: &OffsetLanes,
    depth: u8,
    dither: &mut [DitherRows; 3],
) {
    let sh = 29 - depth as i32;
    let y_off = yuv_offset[0] as i32;
    let uv_center = 1i32 << (depth - 1);
    let max = (1i32 << depth) - 1;
    let [yp, up, vp] = yuv;
    let [dy_rows, du_rows, dv_rows] = dither;

    let c = coeff_row(coeffs, 0);
    for y in 0..h {
        let (cur, next) = dy_rows.pair_mut(y & 1);
        let in_row = y * rgb_stride;
        let out_row = y * yuv_stride[0];
        for x in 0..w {
            let idx = in_row + x;
            let sum = rgb[0][idx] as i64 * c[0] as i64
                + rgb[1][idx] as i64 * c[1] as i64
                + rgb[2][idx] as i64 * c[2] as i64;
            let q = diffuse(sum, x, sh, cur, next);
            yp[out_row + x] = T::from_clipped(q + y_off, max);
        }
    }

    for (n, (plane, rows)) in [(up, du_rows), (vp, dv_rows)].into_iter().enumerate() {
        let c = coeff_row(coeffs, n + 1);
        let cw = (w + (1 << SS_W) - 1) >> SS_W;
        let ch = (h + (1 << SS_H) - 1) >> SS_H;
        for cy in 0..ch {
            let (cur, next) = rows.pair_mut(cy & 1);
            let in_row = (cy << SS_H) * rgb_stride;
            let out_row = cy * yuv_stride[n + 1];
            for cx in 0..cw {
                let idx = in_row + (cx << SS_W);
                let sum = rgb[0][idx] as i64 * c[0] as i64
                    + rgb[1][idx] as i64 * c[1] as i64
                    + rgb[2][idx] as i64 * c[2] as i64;
                let q = diffuse(sum, cx, sh, cur, next);
                plane[out_row + cx] = T::from_clipped(q + uv_center, max);
            }
        }
    }
}

/// Composed single-matrix YUV to YUV
///
/// Shift is `14 + in_depth - out_depth`. Output chroma takes the
/// block's top-left luma as its luma contribution.
fn yuv2yuv<Tin: Sample, Tout: Sample, const SS_W: usize, const SS_H: usize>(
    dst: [&mut [Tout]; 3],
    dst_stride: [usize; 3],
    src: [&[Tin]; 3],
    src_stride: [usize; 3],
    w: usize,
    h: usize,
    coeffs: &CoeffLanes,
    yuv_offset: &[OffsetLanes; 2],
    in_depth: u8,
    out_depth: u8,
) {
    let sh = 14 + in_depth as i32 - out_depth as i32;
    let rnd = 1i32 << (sh - 1);
    let in_y_off = yuv_offset[0][0] as i32;
    let out_y_off = yuv_offset[1][0] as i32;
    let in_center = 1i32 << (in_depth - 1);
    let out_center = 1i32 << (out_depth - 1);
    let max = (1i32 << out_depth) - 1;
    let [cy_row, cu_row, cv_row] = [
        coeff_row(coeffs, 0),
        coeff_row(coeffs, 1),
        coeff_row(coeffs, 2),
    ];
    let [yd, ud, vd] = dst;

    for by in (0..h).step_by(1 << SS_H) {
        let cy = by >> SS_H;
        for bx in (0..w).step_by(1 << SS_W) {
            let cx = bx >> SS_W;
            let u = src[1][cy * src_stride[1] + cx].to_i32() - in_center;
            let v = src[2][cy * src_stride[2] + cx].to_i32() - in_center;
            let y00 = src[0][by * src_stride[0] + bx].to_i32() - in_y_off;
            for dy in 0..(1 << SS_H) {
                let in_row = (by + dy) * src_stride[0];
                let out_row = (by + dy) * dst_stride[0];
                for dx in 0..(1 << SS_W) {
                    let y = src[0][in_row + bx + dx].to_i32() - in_y_off;
                    let out =
                        ((y * cy_row[0] + u * cy_row[1] + v * cy_row[2] + rnd) >> sh) + out_y_off;
                    yd[out_row + bx + dx] = Tout::from_clipped(out, max);
                }
            }
            let uo = ((y00 * cu_row[0] + u * cu_row[1] + v * cu_row[2] + rnd) >> sh) + out_center;
            let vo = ((y00 * cv_row[0] + u * cv_row[1] + v * cv_row[2] + rnd) >> sh) + out_center;
            ud[cy * dst_stride[1] + cx] = Tout::from_clipped(uo, max);
            vd[cy * dst_stride[2] + cx] = Tout::from_clipped(vo, max);
        }
    }
}

/// Run a tone LUT over the int16 RGB planes in place
///
/// Index is the clipped unsigned 15-bit value `2048 + sample`.
pub(crate) fn apply_lut_rows(rgb: [&mut [i16]; 3], stride: usize, w: usize, h: usize, lut: &[i16]) {
    debug_assert_eq!(lut.len(), INT_LUT_SIZE);
    for plane in rgb {
        for y in 0..h {
            let row = &mut plane[y * stride..y * stride + w];
            for px in row {
                let idx = (INT_LUT_ZERO + *px as i32).clamp(0, INT_LUT_SIZE as i32 - 1);
                *px = lut[idx as usize];
            }
        }
    }
}

/// Multiply the int16 RGB planes by a Q14 3x3 matrix in place
pub(crate) fn apply_matrix_rows(
    rgb: [&mut [i16]; 3],
    stride: usize,
    w: usize,
    h: usize,
    coeffs: &CoeffLanes,
) {
    let [cr, cg, cb] = [
        coeff_row(coeffs, 0),
        coeff_row(coeffs, 1),
        coeff_row(coeffs, 2),
    ];
    let [rp, gp, bp] = rgb;
    for y in 0..h {
        let row = y * stride;
        for x in 0..w {
            let idx = row + x;
            let (r, g, b) = (rp[idx] as i64, gp[idx] as i64, bp[idx] as i64);
            let m = |c: [i32; 3]| -> i16 {
                clip_i16(
                    ((r * c[0] as i64 + g * c[1] as i64 + b * c[2] as i64 + 8192) >> 14) as i32,
                )
            };
            rp[idx] = m(cr);
            gp[idx] = m(cg);
            bp[idx] = m(cb);
        }
    }
}

/// YUV-to-RGB kernel selected per sample width
pub(crate) enum Yuv2RgbFn {
    B8(Yuv2RgbImpl<u8>),
    B16(Yuv2RgbImpl<u16>),
}

type Yuv2RgbImpl<T> = fn(
    [&mut [i16]; 3],
    usize,
    [&[T]; 3],
    [usize; 3],
    usize,
    usize,
    &CoeffLanes,
    &OffsetLanes,
    u8,
);

/// RGB-to-YUV kernel selected per sample width
pub(crate) enum Rgb2YuvFn {
    B8(Rgb2YuvImpl<u8>),
    B16(Rgb2YuvImpl<u16>),
}

type Rgb2YuvImpl<T> = fn(
    [&mut [T]; 3],
    [usize; 3],
    [&[i16]; 3],
    usize,
    usize,
    usize,
    &CoeffLanes,
    &OffsetLanes,
    u8,
);

/// Error-diffusing RGB-to-YUV kernel selected per sample width
pub(crate) enum Rgb2YuvFsbFn {
    B8(Rgb2YuvFsbImpl<u8>),
    B16(Rgb2YuvFsbImpl<u16>),
}

type Rgb2YuvFsbImpl<T> = fn(
    [&mut [T]; 3],
    [usize; 3],
    [&[i16]; 3],
    usize,
    usize,
    usize,
    &CoeffLanes,
    &OffsetLanes,
    u8,
    &mut [DitherRows; 3],
);

/// Composed YUV-to-YUV kernel selected per sample width pair
pub(crate) enum Yuv2YuvFn {
    B8B8(Yuv2YuvImpl<u8, u8>),
    B8B16(Yuv2YuvImpl<u8, u16>),
    B16B8(Yuv2YuvImpl<u16, u8>),
    B16B16(Yuv2YuvImpl<u16, u16>),
}

type Yuv2YuvImpl<Tin, Tout> = fn(
    [&mut [Tout]; 3],
    [usize; 3],
    [&[Tin]; 3],
    [usize; 3],
    usize,
    usize,
    &CoeffLanes,
    &[OffsetLanes; 2],
    u8,
    u8,
);

macro_rules! per_subsampling {
    ($kernel:ident, $ss:expr $(, $ty:ty)*) => {
        match $ss {
            (1, 1) => $kernel::<$($ty,)* 1, 1>,
            (1, 0) => $kernel::<$($ty,)* 1, 0>,
            _ => $kernel::<$($ty,)* 0, 0>,
        }
    };
}

/// Pick the YUV-to-RGB kernel for a depth/subsampling pair
pub(crate) fn select_yuv2rgb(depth: u8, ss: (u8, u8)) -> Yuv2RgbFn {
    if depth == 8 {
        Yuv2RgbFn::B8(per_subsampling!(yuv2rgb, ss, u8))
    } else {
        Yuv2RgbFn::B16(per_subsampling!(yuv2rgb, ss, u16))
    }
}

/// Pick the RGB-to-YUV kernel for a depth/subsampling pair
pub(crate) fn select_rgb2yuv(depth: u8, ss: (u8, u8)) -> Rgb2YuvFn {
    if depth == 8 {
        Rgb2YuvFn::B8(per_subsampling!(rgb2yuv, ss, u8))
    } else {
        Rgb2YuvFn::B16(per_subsampling!(rgb2yuv, ss, u16))
    }
}

/// Pick the error-diffusing RGB-to-YUV kernel
pub(crate) fn select_rgb2yuv_fsb(depth: u8, ss: (u8, u8)) -> Rgb2YuvFsbFn {
    if depth == 8 {
        Rgb2YuvFsbFn::B8(per_subsampling!(rgb2yuv_fsb, ss, u8))
    } else {
        Rgb2YuvFsbFn::B16(per_subsampling!(rgb2yuv_fsb, ss, u16))
    }
}

/// Pick the composed YUV-to-YUV kernel for a depth pair
pub(crate) fn select_yuv2yuv(in_depth: u8, out_depth: u8, ss: (u8, u8)) -> Yuv2YuvFn {
    match (in_depth == 8, out_depth == 8) {
        (true, true) => Yuv2YuvFn::B8B8(per_subsampling!(yuv2yuv, ss, u8, u8)),
        (true, false) => Yuv2YuvFn::B8B16(per_subsampling!(yuv2yuv, ss, u8, u16)),
        (false, true) => Yuv2YuvFn::B16B8(per_subsampling!(yuv2yuv, ss, u16, u8)),
        (false, false) => Yuv2YuvFn::B16B16(per_subsampling!(yuv2yuv, ss, u16, u16)),
    }
}
