//! End-to-end pipeline round trips against double-precision references

use chromaplane::{
    convert, ColorMetadata, Converter, ConverterConfig, Frame, MatrixCoefficients, PixelFormat,
    Preset, Range, TransferCharacteristic,
};

struct XorShift(u32);

impl XorShift {
    fn next(&mut self) -> u32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        self.0
    }

    fn unit(&mut self) -> f64 {
        (self.next() >> 8) as f64 / (1 << 24) as f64
    }
}

fn preset_meta(preset: Preset, range: Range) -> ColorMetadata {
    let (matrix, primaries, transfer) = preset.expand();
    ColorMetadata {
        matrix,
        primaries,
        transfer,
        range,
    }
}

/// Fill a YUV420 frame with in-gamut content: random nonlinear RGB per
/// 2x2 block, encoded with the classical BT.709 matrix in f64
fn fill_yuv420_from_rgb(frame: &mut Frame, rng: &mut XorShift, kr: f64, kb: f64) {
    let (w, h) = (frame.width(), frame.height());
    let kg = 1.0 - kr - kb;
    let (ys, us, vs) = (frame.stride(0), frame.stride(1), frame.stride(2));
    for by in (0..h).step_by(2) {
        for bx in (0..w).step_by(2) {
            let (r, g, b) = (rng.unit(), rng.unit(), rng.unit());
            let y = kr * r + kg * g + kb * b;
            let u = (b - y) / (2.0 * (1.0 - kb));
            let v = (r - y) / (2.0 * (1.0 - kr));
            let y_code = (16.0 + 219.0 * y).round() as u8;
            let u_code = (128.0 + 224.0 * u).round() as u8;
            let v_code = (128.0 + 224.0 * v).round() as u8;
            for dy in 0..2 {
                for dx in 0..2 {
                    frame.plane_u8_mut(0)[(by + dy) * ys + bx + dx] = y_code;
                }
            }
            frame.plane_u8_mut(1)[(by / 2) * us + bx / 2] = u_code;
            frame.plane_u8_mut(2)[(by / 2) * vs + bx / 2] = v_code;
        }
    }
}

fn avg_abs_diff_u8(a: &Frame, b: &Frame, plane: usize, w: usize, h: usize) -> f64 {
    let (sa, sb) = (a.stride(plane), b.stride(plane));
    let (pa, pb) = (a.plane_u8(plane), b.plane_u8(plane));
    let mut sum = 0.0;
    for y in 0..h {
        for x in 0..w {
            sum += (pa[y * sa + x] as f64 - pb[y * sb + x] as f64).abs();
        }
    }
    sum / (w * h) as f64
}

#[test]
fn yuv420_to_linear_float_and_back() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv420p, 96, 96, meta).unwrap();
    fill_yuv420_from_rgb(&mut input, &mut XorShift(0x1234_5678), 0.2126, 0.0722);

    let mut linear = Frame::alloc(PixelFormat::Gbrpf32, 96, 96, ColorMetadata::default()).unwrap();
    convert(
        &input,
        &mut linear,
        ConverterConfig::new().trc(TransferCharacteristic::Linear),
    )
    .unwrap();
    assert_eq!(linear.metadata.transfer, TransferCharacteristic::Linear);
    assert_eq!(linear.metadata.matrix, MatrixCoefficients::Identity);
    assert_eq!(linear.metadata.range, Range::Full);

    let mut back = Frame::alloc(PixelFormat::Yuv420p, 96, 96, ColorMetadata::default()).unwrap();
    convert(
        &linear,
        &mut back,
        ConverterConfig::new()
            .space(MatrixCoefficients::Bt709)
            .trc(TransferCharacteristic::Bt709)
            .range(Range::Limited),
    )
    .unwrap();
    assert_eq!(back.metadata.range, Range::Limited);

    let dy = avg_abs_diff_u8(&input, &back, 0, 96, 96);
    let du = avg_abs_diff_u8(&input, &back, 1, 48, 48);
    let dv = avg_abs_diff_u8(&input, &back, 2, 48, 48);
    eprintln!("roundtrip avg abs diff: y={dy:.3} u={du:.3} v={dv:.3}");
    assert!(dy < 1.0, "luma drift {dy}");
    assert!(du < 1.0, "cb drift {du}");
    assert!(dv < 1.0, "cr drift {dv}");
}

#[test]
fn float_fast_mode_is_byte_exact() {
    let meta = preset_meta(Preset::Bt709, Range::Full);
    let mut input = Frame::alloc(PixelFormat::Gbrpf16, 32, 8, meta).unwrap();
    let mut rng = XorShift(0xCAFE_F00D);
    for p in 0..3 {
        let stride = input.stride(p);
        for y in 0..8 {
            for x in 0..32 {
                let v = half::f16::from_f64(rng.unit() * 2.0 - 0.25);
                input.plane_u16_mut(p)[y * stride + x] = v.to_bits();
            }
        }
    }
    let mut output = Frame::alloc(PixelFormat::Gbrpf16, 32, 8, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new().fast(true));
    converter.convert(&input, &mut output).unwrap();
    assert!(converter.plan_info().rgb_passthrough);
    for p in 0..3 {
        assert_eq!(input.plane_bytes(p), output.plane_bytes(p), "plane {p}");
    }
}

#[test]
fn range_only_change_uses_composed_matrix() {
    let meta = preset_meta(Preset::Bt2020, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv444p12, 64, 4, meta).unwrap();
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    for y in 0..4 {
        for x in 0..64 {
            // Ramp across the limited range
            let code = 256 + (x * (3760 - 256)) / 63;
            input.plane_u16_mut(0)[y * strides[0] + x] = code as u16;
            input.plane_u16_mut(1)[y * strides[1] + x] = 2048;
            input.plane_u16_mut(2)[y * strides[2] + x] = 2048;
        }
    }
    let mut output = Frame::alloc(PixelFormat::Yuv444p12, 64, 4, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new().range(Range::Full));
    converter.convert(&input, &mut output).unwrap();
    let info = converter.plan_info();
    assert!(info.fast_yuv2yuv);
    assert!(!info.frame_passthrough);

    let os = output.stride(0);
    for x in 0..64 {
        let in_code = input.plane_u16(0)[x] as f64;
        let want = (in_code - 256.0) * 4095.0 / (219.0 * 16.0);
        let got = output.plane_u16(0)[x] as f64;
        assert!(
            (got - want).abs() <= 1.0,
            "x={x}: {got} vs closed form {want:.2}"
        );
        // Rows are identical
        assert_eq!(output.plane_u16(0)[x], output.plane_u16(0)[2 * os + x]);
    }
}

// f64 reference pipeline for the bt601 -> bt709 scenario

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn mat_inv(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let a = m[(j + 1) % 3][(i + 1) % 3];
            let b = m[(j + 2) % 3][(i + 2) % 3];
            let c = m[(j + 1) % 3][(i + 2) % 3];
            let d = m[(j + 2) % 3][(i + 1) % 3];
            out[i][j] = (a * b - c * d) / det;
        }
    }
    out
}

fn mat_vec(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn rgb2yuv_mat(kr: f64, kb: f64) -> [[f64; 3]; 3] {
    let kg = 1.0 - kr - kb;
    [
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
    ]
}

fn rgb_to_xyz(prim: &[(f64, f64); 4]) -> [[f64; 3]; 3] {
    let col = |(x, y): (f64, f64)| [x / y, 1.0, (1.0 - x - y) / y];
    let (r, g, b) = (col(prim[0]), col(prim[1]), col(prim[2]));
    let m = [
        [r[0], g[0], b[0]],
        [r[1], g[1], b[1]],
        [r[2], g[2], b[2]],
    ];
    let (wx, wy) = prim[3];
    let s = mat_vec(&mat_inv(&m), [wx, wy, 1.0 - wx - wy]);
    [
        [m[0][0] * s[0], m[0][1] * s[1], m[0][2] * s[2]],
        [m[1][0] * s[0], m[1][1] * s[1], m[1][2] * s[2]],
        [m[2][0] * s[0], m[2][1] * s[1], m[2][2] * s[2]],
    ]
}

fn bt1886_delin(v: f64) -> f64 {
    // alpha 1.099, beta 0.018, gamma 0.45, delta 4.5; odd-symmetric
    let (s, a) = (v.signum(), v.abs());
    if a < 0.018 {
        4.5 * v
    } else {
        s * (1.099 * a.powf(0.45) - 0.099)
    }
}

fn bt1886_lin(v: f64) -> f64 {
    let (s, a) = (v.signum(), v.abs());
    if a < 0.018 * 4.5 {
        v / 4.5
    } else {
        s * ((a + 0.099) / 1.099).powf(1.0 / 0.45)
    }
}

#[test]
fn bt601_to_bt709_matches_double_reference() {
    const SMPTE170M_PRIM: [(f64, f64); 4] = [
        (0.630, 0.340),
        (0.310, 0.595),
        (0.155, 0.070),
        (0.3127, 0.3290),
    ];
    const BT709_PRIM: [(f64, f64); 4] = [
        (0.640, 0.330),
        (0.300, 0.600),
        (0.150, 0.060),
        (0.3127, 0.3290),
    ];

    let (w, h) = (64usize, 32usize);
    let meta = preset_meta(Preset::Smpte170m, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv420p, w, h, meta).unwrap();
    // Smooth gradient, constant inside each 2x2 block so nearest
    // neighbour chroma resampling drops out of the comparison
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    for by in (0..h).step_by(2) {
        for bx in (0..w).step_by(2) {
            let y_code = (40 + bx * 2 + by) as u8;
            let u_code = (110 + bx / 2) as u8;
            let v_code = (120 + by / 2) as u8;
            for dy in 0..2 {
                for dx in 0..2 {
                    input.plane_u8_mut(0)[(by + dy) * strides[0] + bx + dx] = y_code;
                }
            }
            input.plane_u8_mut(1)[(by / 2) * strides[1] + bx / 2] = u_code;
            input.plane_u8_mut(2)[(by / 2) * strides[2] + bx / 2] = v_code;
        }
    }

    let mut output = Frame::alloc(PixelFormat::Yuv420p, w, h, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new().all(Preset::Bt709));
    converter.convert(&input, &mut output).unwrap();
    let info = converter.plan_info();
    assert!(!info.rgb_passthrough);
    assert!(!info.gamut_passthrough);

    // Double-precision reference over the same samples
    let yuv2rgb_601 = mat_inv(&rgb2yuv_mat(0.299, 0.114));
    let rgb2yuv_709 = rgb2yuv_mat(0.2126, 0.0722);
    let gamut = mat_mul(&mat_inv(&rgb_to_xyz(&BT709_PRIM)), &rgb_to_xyz(&SMPTE170M_PRIM));

    for by in (0..h).step_by(2) {
        for bx in (0..w).step_by(2) {
            let y = (input.plane_u8(0)[by * input.stride(0) + bx] as f64 - 16.0) / 219.0;
            let u = (input.plane_u8(1)[(by / 2) * input.stride(1) + bx / 2] as f64 - 128.0) / 224.0;
            let v = (input.plane_u8(2)[(by / 2) * input.stride(2) + bx / 2] as f64 - 128.0) / 224.0;
            let rgb = mat_vec(&yuv2rgb_601, [y, u, v]);
            let lin = [
                bt1886_lin(rgb[0]),
                bt1886_lin(rgb[1]),
                bt1886_lin(rgb[2]),
            ];
            let mapped = mat_vec(&gamut, lin);
            let coded = [
                bt1886_delin(mapped[0]),
                bt1886_delin(mapped[1]),
                bt1886_delin(mapped[2]),
            ];
            let yuv = mat_vec(&rgb2yuv_709, coded);
            let want_y = 16.0 + 219.0 * yuv[0];
            let want_u = 128.0 + 224.0 * yuv[1];
            let want_v = 128.0 + 224.0 * yuv[2];

            let got_y = output.plane_u8(0)[by * output.stride(0) + bx] as f64;
            let got_u = output.plane_u8(1)[(by / 2) * output.stride(1) + bx / 2] as f64;
            let got_v = output.plane_u8(2)[(by / 2) * output.stride(2) + bx / 2] as f64;
            assert!(
                (got_y - want_y).abs() <= 2.0,
                "({bx},{by}) luma {got_y} vs {want_y:.2}"
            );
            assert!(
                (got_u - want_u).abs() <= 2.0,
                "({bx},{by}) cb {got_u} vs {want_u:.2}"
            );
            assert!(
                (got_v - want_v).abs() <= 2.0,
                "({bx},{by}) cr {got_v} vs {want_v:.2}"
            );
        }
    }
}

#[test]
fn slice_decomposition_is_bit_exact() {
    let meta = preset_meta(Preset::Smpte170m, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv420p, 96, 96, meta).unwrap();
    fill_yuv420_from_rgb(&mut input, &mut XorShift(0xDEAD_BEEF), 0.299, 0.114);

    let cfg = ConverterConfig::new().all(Preset::Bt709);
    let mut whole = Frame::alloc(PixelFormat::Yuv420p, 96, 96, ColorMetadata::default()).unwrap();
    Converter::new(cfg.clone())
        .convert(&input, &mut whole)
        .unwrap();

    for workers in [2usize, 3, 5] {
        let mut sliced =
            Frame::alloc(PixelFormat::Yuv420p, 96, 96, ColorMetadata::default()).unwrap();
        let mut converter = Converter::new(cfg.clone());
        converter.prepare(&input, &mut sliced).unwrap();
        for j in 0..workers {
            let (h1, h2) = chromaplane::slice_bounds(96, j, workers);
            converter.convert_slice(&input, &mut sliced, h1, h2);
        }
        for p in 0..3 {
            assert_eq!(
                whole.plane_bytes(p),
                sliced.plane_bytes(p),
                "plane {p} with {workers} workers"
            );
        }
    }
}

#[test]
fn half_float_linear_shortcut_matches_closed_form() {
    let meta = ColorMetadata {
        matrix: MatrixCoefficients::Identity,
        primaries: chromaplane::ColorPrimaries::Bt709,
        transfer: TransferCharacteristic::Linear,
        range: Range::Full,
    };
    let mut input = Frame::alloc(PixelFormat::Gbrpf16, 16, 4, meta).unwrap();
    let mut rng = XorShift(42);
    for p in 0..3 {
        let stride = input.stride(p);
        for y in 0..4 {
            for x in 0..16 {
                input.plane_u16_mut(p)[y * stride + x] =
                    half::f16::from_f64(rng.unit()).to_bits();
            }
        }
    }
    let mut output = Frame::alloc(PixelFormat::Gbrpf16, 16, 4, ColorMetadata::default()).unwrap();
    convert(
        &input,
        &mut output,
        ConverterConfig::new().trc(TransferCharacteristic::Srgb),
    )
    .unwrap();

    for p in 0..3 {
        let (is, os) = (input.stride(p), output.stride(p));
        for y in 0..4 {
            for x in 0..16 {
                let v = half::f16::from_bits(input.plane_u16(p)[y * is + x]).to_f64();
                let want = if v < 0.0031308 {
                    12.92 * v
                } else {
                    1.055 * v.powf(1.0 / 2.4) - 0.055
                };
                let got = half::f16::from_bits(output.plane_u16(p)[y * os + x]).to_f64();
                assert!(
                    (got - want).abs() < 2e-3,
                    "plane {p} ({x},{y}): {got} vs {want}"
                );
            }
        }
    }
}

#[test]
fn single_float_gamut_mapping_preserves_neutrals() {
    let meta = ColorMetadata {
        matrix: MatrixCoefficients::Identity,
        primaries: chromaplane::ColorPrimaries::Bt709,
        transfer: TransferCharacteristic::Srgb,
        range: Range::Full,
    };
    let mut input = Frame::alloc(PixelFormat::Gbrpf32, 8, 2, meta).unwrap();
    for p in 0..3 {
        let stride = input.stride(p);
        for x in 0..8 {
            let v = x as f32 / 7.0;
            input.plane_f32_mut(p)[x] = v;
            input.plane_f32_mut(p)[stride + x] = v;
        }
    }
    let mut output = Frame::alloc(PixelFormat::Gbrpf32, 8, 2, ColorMetadata::default()).unwrap();
    convert(
        &input,
        &mut output,
        ConverterConfig::new().primaries(chromaplane::ColorPrimaries::Bt2020),
    )
    .unwrap();
    // Shared D65 white point keeps greys grey across the gamut change
    for p in 0..3 {
        for x in 0..8 {
            let got = output.plane_f32(p)[x];
            let want = input.plane_f32(p)[x];
            assert!(
                (got - want).abs() < 1e-4,
                "plane {p} x={x}: {got} vs {want}"
            );
        }
    }
}
