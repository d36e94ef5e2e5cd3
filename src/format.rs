//! Supported planar pixel formats
//!
//! Only planar layouts are supported: YUV 4:2:0 / 4:2:2 / 4:4:4 at
//! 8/10/12 bits, and G-B-R (optionally with alpha) at 16- and 32-bit
//! float. 10- and 12-bit components are stored in the low bits of
//! native-endian `u16`; float components are `f16` bit patterns in
//! `u16` or native `f32`.

use crate::error::{Error, Result};

/// Whether a format carries YUV or RGB-family samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFamily {
    /// Luma + two chroma planes
    Yuv,
    /// Green, blue, red planes (plus optional alpha)
    Rgb,
}

/// A supported planar pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 8-bit
    Yuv420p,
    /// Planar YUV 4:2:2, 8-bit
    Yuv422p,
    /// Planar YUV 4:4:4, 8-bit
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit
    Yuv420p10,
    /// Planar YUV 4:2:2, 10-bit
    Yuv422p10,
    /// Planar YUV 4:4:4, 10-bit
    Yuv444p10,
    /// Planar YUV 4:2:0, 12-bit
    Yuv420p12,
    /// Planar YUV 4:2:2, 12-bit
    Yuv422p12,
    /// Planar YUV 4:4:4, 12-bit
    Yuv444p12,
    /// Planar GBR, 16-bit float
    Gbrpf16,
    /// Planar GBR + alpha, 16-bit float
    Gbrapf16,
    /// Planar GBR, 32-bit float
    Gbrpf32,
    /// Planar GBR + alpha, 32-bit float
    Gbrapf32,
}

/// Static properties of a [`PixelFormat`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Bits per component (8, 10, 12, 16 or 32)
    pub depth: u8,
    /// log2 horizontal chroma subsampling
    pub log2_chroma_w: u8,
    /// log2 vertical chroma subsampling
    pub log2_chroma_h: u8,
    /// Components are IEEE floats
    pub is_float: bool,
    /// An alpha plane follows the color planes
    pub has_alpha: bool,
    /// Sample family
    pub family: ColorFamily,
}

impl PixelFormat {
    /// Map a raw format description onto a supported format
    ///
    /// Hosts reading format parameters from a container or decoder can
    /// validate them here instead of hand-matching the enum: an
    /// unsupported depth or subsampling pair is rejected with the
    /// specific reason, a family/layout contradiction (float YUV,
    /// integer GBR, YUV alpha) as a mismatch.
    pub fn from_parts(
        family: ColorFamily,
        depth: u8,
        log2_chroma_w: u8,
        log2_chroma_h: u8,
        is_float: bool,
        has_alpha: bool,
    ) -> Result<Self> {
        if !matches!((log2_chroma_w, log2_chroma_h), (0, 0) | (1, 0) | (1, 1)) {
            return Err(Error::InvalidSubsampling(log2_chroma_w, log2_chroma_h));
        }
        match family {
            ColorFamily::Yuv => {
                if is_float {
                    return Err(Error::FamilyMismatch("YUV formats are integer-valued"));
                }
                if has_alpha {
                    return Err(Error::FamilyMismatch("YUV formats carry no alpha plane"));
                }
                match (depth, log2_chroma_w, log2_chroma_h) {
                    (8, 1, 1) => Ok(PixelFormat::Yuv420p),
                    (8, 1, 0) => Ok(PixelFormat::Yuv422p),
                    (8, 0, 0) => Ok(PixelFormat::Yuv444p),
                    (10, 1, 1) => Ok(PixelFormat::Yuv420p10),
                    (10, 1, 0) => Ok(PixelFormat::Yuv422p10),
                    (10, 0, 0) => Ok(PixelFormat::Yuv444p10),
                    (12, 1, 1) => Ok(PixelFormat::Yuv420p12),
                    (12, 1, 0) => Ok(PixelFormat::Yuv422p12),
                    (12, 0, 0) => Ok(PixelFormat::Yuv444p12),
                    _ => Err(Error::InvalidDepth {
                        in_depth: depth,
                        out_depth: depth,
                    }),
                }
            }
            ColorFamily::Rgb => {
                if !is_float {
                    return Err(Error::FamilyMismatch("GBR formats are floating-point"));
                }
                if (log2_chroma_w, log2_chroma_h) != (0, 0) {
                    return Err(Error::InvalidSubsampling(log2_chroma_w, log2_chroma_h));
                }
                match (depth, has_alpha) {
                    (16, false) => Ok(PixelFormat::Gbrpf16),
                    (16, true) => Ok(PixelFormat::Gbrapf16),
                    (32, false) => Ok(PixelFormat::Gbrpf32),
                    (32, true) => Ok(PixelFormat::Gbrapf32),
                    _ => Err(Error::InvalidDepth {
                        in_depth: depth,
                        out_depth: depth,
                    }),
                }
            }
        }
    }

    /// Descriptor for this format
    pub fn descriptor(self) -> FormatDescriptor {
        use ColorFamily::{Rgb, Yuv};
        let (depth, cw, ch, is_float, has_alpha, family) = match self {
            PixelFormat::Yuv420p => (8, 1, 1, false, false, Yuv),
            PixelFormat::Yuv422p => (8, 1, 0, false, false, Yuv),
            PixelFormat::Yuv444p => (8, 0, 0, false, false, Yuv),
            PixelFormat::Yuv420p10 => (10, 1, 1, false, false, Yuv),
            PixelFormat::Yuv422p10 => (10, 1, 0, false, false, Yuv),
            PixelFormat::Yuv444p10 => (10, 0, 0, false, false, Yuv),
            PixelFormat::Yuv420p12 => (12, 1, 1, false, false, Yuv),
            PixelFormat::Yuv422p12 => (12, 1, 0, false, false, Yuv),
            PixelFormat::Yuv444p12 => (12, 0, 0, false, false, Yuv),
            PixelFormat::Gbrpf16 => (16, 0, 0, true, false, Rgb),
            PixelFormat::Gbrapf16 => (16, 0, 0, true, true, Rgb),
            PixelFormat::Gbrpf32 => (32, 0, 0, true, false, Rgb),
            PixelFormat::Gbrapf32 => (32, 0, 0, true, true, Rgb),
        };
        FormatDescriptor {
            depth,
            log2_chroma_w: cw,
            log2_chroma_h: ch,
            is_float,
            has_alpha,
            family,
        }
    }

    /// Number of planes (3, or 4 with alpha)
    pub fn plane_count(self) -> usize {
        if self.descriptor().has_alpha {
            4
        } else {
            3
        }
    }

    /// Bytes per component sample
    pub fn bytes_per_comp(self) -> usize {
        match self.descriptor().depth {
            8 => 1,
            10 | 12 | 16 => 2,
            _ => 4,
        }
    }

    /// Width of plane `idx` in samples for an image `width` wide
    pub fn plane_width(self, idx: usize, width: usize) -> usize {
        let d = self.descriptor();
        if d.family == ColorFamily::Yuv && (idx == 1 || idx == 2) {
            // Subsampled dimensions round up
            (width + (1 << d.log2_chroma_w) - 1) >> d.log2_chroma_w
        } else {
            width
        }
    }

    /// Height of plane `idx` in rows for an image `height` tall
    pub fn plane_height(self, idx: usize, height: usize) -> usize {
        let d = self.descriptor();
        if d.family == ColorFamily::Yuv && (idx == 1 || idx == 2) {
            (height + (1 << d.log2_chroma_h) - 1) >> d.log2_chroma_h
        } else {
            height
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_consistent() {
        for fmt in [
            PixelFormat::Yuv420p,
            PixelFormat::Yuv422p10,
            PixelFormat::Yuv444p12,
            PixelFormat::Gbrpf16,
            PixelFormat::Gbrapf32,
        ] {
            let d = fmt.descriptor();
            if d.family == ColorFamily::Rgb {
                assert!(d.is_float);
                assert_eq!(d.log2_chroma_w, 0);
                assert_eq!(d.log2_chroma_h, 0);
            }
            assert_eq!(fmt.plane_count(), if d.has_alpha { 4 } else { 3 });
        }
    }

    #[test]
    fn from_parts_maps_supported_descriptors() {
        assert_eq!(
            PixelFormat::from_parts(ColorFamily::Yuv, 10, 1, 0, false, false).unwrap(),
            PixelFormat::Yuv422p10
        );
        assert_eq!(
            PixelFormat::from_parts(ColorFamily::Yuv, 8, 1, 1, false, false).unwrap(),
            PixelFormat::Yuv420p
        );
        assert_eq!(
            PixelFormat::from_parts(ColorFamily::Rgb, 32, 0, 0, true, true).unwrap(),
            PixelFormat::Gbrapf32
        );
    }

    #[test]
    fn from_parts_rejects_raw_values() {
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 9, 0, 0, false, false),
            Err(Error::InvalidDepth { in_depth: 9, .. })
        ));
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 16, 0, 0, false, false),
            Err(Error::InvalidDepth { in_depth: 16, .. })
        ));
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 8, 2, 2, false, false),
            Err(Error::InvalidSubsampling(2, 2))
        ));
        // Vertical-only subsampling is not a supported pair
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 8, 0, 1, false, false),
            Err(Error::InvalidSubsampling(0, 1))
        ));
        // Float formats are never subsampled
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Rgb, 16, 1, 1, true, false),
            Err(Error::InvalidSubsampling(1, 1))
        ));
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 8, 1, 1, true, false),
            Err(Error::FamilyMismatch(_))
        ));
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Rgb, 8, 0, 0, false, false),
            Err(Error::FamilyMismatch(_))
        ));
        assert!(matches!(
            PixelFormat::from_parts(ColorFamily::Yuv, 8, 0, 0, false, true),
            Err(Error::FamilyMismatch(_))
        ));
    }

    #[test]
    fn chroma_plane_dimensions() {
        assert_eq!(PixelFormat::Yuv420p.plane_width(1, 96), 48);
        assert_eq!(PixelFormat::Yuv420p.plane_height(2, 96), 48);
        assert_eq!(PixelFormat::Yuv422p.plane_width(1, 96), 48);
        assert_eq!(PixelFormat::Yuv422p.plane_height(1, 96), 96);
        assert_eq!(PixelFormat::Yuv444p12.plane_width(1, 96), 96);
        assert_eq!(PixelFormat::Gbrpf32.plane_width(1, 96), 96);
    }
}
