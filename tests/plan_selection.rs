//! Planning behavior: path selection, error surfacing, metadata
//! resolution and alpha discipline

use chromaplane::{
    convert, ColorMetadata, ColorPrimaries, Converter, ConverterConfig, DitherMode, Error, Frame,
    MatrixCoefficients, PixelFormat, Preset, Range, TransferCharacteristic,
};

fn preset_meta(preset: Preset, range: Range) -> ColorMetadata {
    let (matrix, primaries, transfer) = preset.expand();
    ColorMetadata {
        matrix,
        primaries,
        transfer,
        range,
    }
}

#[test]
fn identical_metadata_copies_the_frame() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv422p10, 32, 8, meta).unwrap();
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    for y in 0..8 {
        for x in 0..32 {
            input.plane_u16_mut(0)[y * strides[0] + x] = (64 + x * 27 + y) as u16;
            input.plane_u16_mut(1)[y * strides[1] + x / 2] = (512 + x) as u16;
            input.plane_u16_mut(2)[y * strides[2] + x / 2] = (512 - x) as u16;
        }
    }
    let mut output = Frame::alloc(PixelFormat::Yuv422p10, 32, 8, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new());
    converter.convert(&input, &mut output).unwrap();
    assert!(converter.plan_info().frame_passthrough);
    for p in 0..3 {
        assert_eq!(input.plane_bytes(p), output.plane_bytes(p), "plane {p}");
    }
    assert_eq!(output.metadata, input.metadata);
}

#[test]
fn odd_dimensions_are_rejected() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let input = Frame::alloc(PixelFormat::Yuv420p, 97, 96, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Yuv420p, 97, 96, meta).unwrap();
    let err = Converter::new(ConverterConfig::new())
        .convert(&input, &mut output)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::OddDimensions {
            width: 97,
            height: 96
        }
    ));

    let input = Frame::alloc(PixelFormat::Yuv444p, 96, 95, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Yuv444p, 96, 95, meta).unwrap();
    let err = Converter::new(ConverterConfig::new())
        .convert(&input, &mut output)
        .unwrap_err();
    assert!(matches!(err, Error::OddDimensions { .. }));
}

#[test]
fn unspecified_range_defaults_to_limited_and_instance_survives() {
    let _ = env_logger::builder().is_test(true).try_init();
    let meta = preset_meta(Preset::Bt709, Range::Unspecified);
    let input = Frame::alloc(PixelFormat::Yuv420p, 16, 16, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Yuv420p, 16, 16, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new());
    converter.convert(&input, &mut output).unwrap();
    assert_eq!(output.metadata.range, Range::Limited);
    // Second frame through the same instance plans again without issue
    converter.convert(&input, &mut output).unwrap();
    assert_eq!(output.metadata.range, Range::Limited);
}

#[test]
fn planning_failure_does_not_poison_the_instance() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let input = Frame::alloc(PixelFormat::Yuv420p, 16, 16, meta).unwrap();
    let mut bad_meta = meta;
    bad_meta.matrix = MatrixCoefficients::Unspecified;
    let bad_input = Frame::alloc(PixelFormat::Yuv420p, 16, 16, bad_meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Yuv420p, 16, 16, ColorMetadata::default()).unwrap();

    let mut converter = Converter::new(ConverterConfig::new());
    assert!(matches!(
        converter.convert(&bad_input, &mut output),
        Err(Error::UnknownMatrix)
    ));
    // The next, valid frame still converts
    converter.convert(&input, &mut output).unwrap();
}

#[test]
fn output_format_constraint_is_enforced() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let input = Frame::alloc(PixelFormat::Yuv420p, 16, 16, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Yuv444p, 16, 16, ColorMetadata::default()).unwrap();
    let err = Converter::new(ConverterConfig::new().format(PixelFormat::Yuv420p))
        .convert(&input, &mut output)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(PixelFormat::Yuv444p)));
}

#[test]
fn float_width_crossing_is_invalid_depth() {
    let meta = ColorMetadata {
        matrix: MatrixCoefficients::Identity,
        primaries: ColorPrimaries::Bt709,
        transfer: TransferCharacteristic::Srgb,
        range: Range::Full,
    };
    let input = Frame::alloc(PixelFormat::Gbrpf16, 16, 16, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Gbrpf32, 16, 16, meta).unwrap();
    let err = Converter::new(ConverterConfig::new())
        .convert(&input, &mut output)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidDepth {
            in_depth: 16,
            out_depth: 32
        }
    ));
}

#[test]
fn requesting_yuv_matrix_on_float_output_is_family_mismatch() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let input = Frame::alloc(PixelFormat::Yuv420p, 16, 16, meta).unwrap();
    let mut output = Frame::alloc(PixelFormat::Gbrpf32, 16, 16, ColorMetadata::default()).unwrap();
    let err = Converter::new(
        ConverterConfig::new()
            .space(MatrixCoefficients::Bt709)
            .trc(TransferCharacteristic::Linear),
    )
    .convert(&input, &mut output)
    .unwrap_err();
    assert!(matches!(err, Error::FamilyMismatch(_)));
}

#[test]
fn subsampling_change_converts_through_rgb() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    let mut input = Frame::alloc(PixelFormat::Yuv420p, 32, 8, meta).unwrap();
    let strides = [input.stride(0), input.stride(1), input.stride(2)];
    for y in 0..8 {
        for x in 0..32 {
            input.plane_u8_mut(0)[y * strides[0] + x] = (30 + 4 * x + 2 * y) as u8;
        }
    }
    for cy in 0..4 {
        for cx in 0..16 {
            input.plane_u8_mut(1)[cy * strides[1] + cx] = (118 + cx) as u8;
            input.plane_u8_mut(2)[cy * strides[2] + cx] = (138 - cy) as u8;
        }
    }
    let mut output = Frame::alloc(PixelFormat::Yuv444p, 32, 8, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(ConverterConfig::new());
    converter.convert(&input, &mut output).unwrap();
    let info = converter.plan_info();
    // Same colorimetry but different chroma grid: RGB passthrough
    // applies, the composed matrix does not
    assert!(info.rgb_passthrough);
    assert!(!info.fast_yuv2yuv);
    // Luma survives the trip through the RGB intermediate
    for y in 0..8 {
        for x in 0..32 {
            let a = input.plane_u8(0)[y * input.stride(0) + x] as i32;
            let b = output.plane_u8(0)[y * output.stride(0) + x] as i32;
            assert!((a - b).abs() <= 1, "({x},{y}): {a} vs {b}");
        }
    }
    // 4:4:4 chroma replicates the 4:2:0 samples
    let a = input.plane_u8(1)[0] as i32;
    let b = output.plane_u8(1)[0] as i32;
    let b2 = output.plane_u8(1)[1] as i32;
    assert!((a - b).abs() <= 1);
    assert!((a - b2).abs() <= 1);
}

#[test]
fn raw_signalling_validates_before_planning() {
    use chromaplane::ColorFamily;

    // Descriptor integers straight out of a container
    let fmt = PixelFormat::from_parts(ColorFamily::Yuv, 10, 1, 1, false, false).unwrap();
    assert_eq!(fmt, PixelFormat::Yuv420p10);
    assert!(matches!(
        PixelFormat::from_parts(ColorFamily::Yuv, 14, 1, 1, false, false),
        Err(Error::InvalidDepth { in_depth: 14, .. })
    ));
    assert!(matches!(
        PixelFormat::from_parts(ColorFamily::Yuv, 8, 2, 0, false, false),
        Err(Error::InvalidSubsampling(2, 0))
    ));

    // ISO/IEC 23001-8 code points as carried by bitstreams
    let meta = ColorMetadata {
        matrix: MatrixCoefficients::from_code(1).unwrap(),
        primaries: ColorPrimaries::from_code(1).unwrap(),
        transfer: TransferCharacteristic::from_code(1).unwrap(),
        range: Range::from_code(1).unwrap(),
    };
    assert_eq!(meta, preset_meta(Preset::Bt709, Range::Limited));
    assert!(matches!(Range::from_code(9), Err(Error::InvalidRange)));

    let input = Frame::alloc(fmt, 16, 16, meta).unwrap();
    let mut output = Frame::alloc(fmt, 16, 16, ColorMetadata::default()).unwrap();
    Converter::new(ConverterConfig::new())
        .convert(&input, &mut output)
        .unwrap();
}

#[test]
fn alpha_is_copied_verbatim_or_filled_opaque() {
    let meta = ColorMetadata {
        matrix: MatrixCoefficients::Identity,
        primaries: ColorPrimaries::Bt709,
        transfer: TransferCharacteristic::Srgb,
        range: Range::Full,
    };
    let mut input = Frame::alloc(PixelFormat::Gbrapf32, 8, 2, meta).unwrap();
    for p in 0..4 {
        let stride = input.stride(p);
        for x in 0..8 {
            // Alpha gets values a color transform would change
            input.plane_f32_mut(p)[x] = 0.1 + 0.1 * p as f32 + 0.01 * x as f32;
            input.plane_f32_mut(p)[stride + x] = 0.5;
        }
    }
    let mut output = Frame::alloc(PixelFormat::Gbrapf32, 8, 2, ColorMetadata::default()).unwrap();
    convert(
        &input,
        &mut output,
        ConverterConfig::new().trc(TransferCharacteristic::Linear),
    )
    .unwrap();
    assert_eq!(input.plane_bytes(3), output.plane_bytes(3));
    // Color planes did change
    assert_ne!(input.plane_bytes(0), output.plane_bytes(0));

    // No input alpha: output alpha is fully opaque
    let mut rgb_in = Frame::alloc(PixelFormat::Gbrpf32, 8, 2, meta).unwrap();
    for p in 0..3 {
        for x in 0..8 {
            rgb_in.plane_f32_mut(p)[x] = 0.25;
        }
    }
    let mut rgba_out =
        Frame::alloc(PixelFormat::Gbrapf32, 8, 2, ColorMetadata::default()).unwrap();
    convert(&rgb_in, &mut rgba_out, ConverterConfig::new()).unwrap();
    let stride = rgba_out.stride(3);
    for y in 0..2 {
        for x in 0..8 {
            assert_eq!(rgba_out.plane_f32(3)[y * stride + x], 1.0);
        }
    }
}

#[test]
fn fsb_dither_improves_flat_field_average() {
    let meta = preset_meta(Preset::Bt709, Range::Limited);
    // Full-range 10-bit input to 8-bit output forces re-quantisation
    let mut input = Frame::alloc(PixelFormat::Yuv444p10, 32, 32, meta).unwrap();
    for p in 0..3 {
        let fill = if p == 0 { 401u16 } else { 512 };
        let stride = input.stride(p);
        for y in 0..32 {
            for x in 0..32 {
                input.plane_u16_mut(p)[y * stride + x] = fill;
            }
        }
    }
    let mut output = Frame::alloc(PixelFormat::Yuv444p, 32, 32, ColorMetadata::default()).unwrap();
    let mut converter = Converter::new(
        ConverterConfig::new()
            .all(Preset::Bt2020)
            .dither(DitherMode::Fsb),
    );
    converter.convert(&input, &mut output).unwrap();

    // The dithered output must not be a single flat code unless the
    // target value is exactly representable; its mean must sit close
    // to the real-valued target
    let vals: Vec<u8> = (0..32)
        .flat_map(|y| {
            let s = output.stride(0);
            output.plane_u8(0)[y * s..y * s + 32].to_vec()
        })
        .collect();
    let avg = vals.iter().map(|&v| v as f64).sum::<f64>() / vals.len() as f64;
    let min = *vals.iter().min().unwrap();
    let max = *vals.iter().max().unwrap();
    assert!(max - min <= 1, "dither should toggle adjacent codes only");
    eprintln!("dithered flat field: avg {avg:.3}, codes {min}..{max}");
}
