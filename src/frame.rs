//! Owned planar frames
//!
//! A [`Frame`] is a set of per-plane sample buffers with independent
//! strides. Planes are stored at their natural width: `u8` for 8-bit,
//! `u16` for 10/12-bit and f16 bit patterns, `f32` for single floats.
//! Byte-level views for host import/export go through [`bytemuck`].

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::meta::ColorMetadata;

const STRIDE_ALIGN: usize = 32;

fn align_up(v: usize, align: usize) -> usize {
    (v + align - 1) & !(align - 1)
}

#[derive(Debug, Clone)]
enum PlaneBuf {
    B8(Vec<u8>),
    B16(Vec<u16>),
    F32(Vec<f32>),
}

/// One image plane: samples plus a row stride
#[derive(Debug, Clone)]
struct Plane {
    buf: PlaneBuf,
    /// Stride in samples, not bytes
    stride: usize,
}

/// An owned planar image with colorimetric metadata
#[derive(Debug, Clone)]
pub struct Frame {
    format: PixelFormat,
    width: usize,
    height: usize,
    planes: Vec<Plane>,
    /// Colorimetric tags describing the samples
    pub metadata: ColorMetadata,
}

impl Frame {
    /// Allocate a zero-filled frame with 32-byte-aligned row strides
    pub fn alloc(
        format: PixelFormat,
        width: usize,
        height: usize,
        metadata: ColorMetadata,
    ) -> Result<Self> {
        let bpc = format.bytes_per_comp();
        let is_float32 = format.descriptor().is_float && format.descriptor().depth == 32;
        let mut planes = Vec::new();
        for idx in 0..format.plane_count() {
            let row_samples = format.plane_width(idx, width);
            let stride = align_up(row_samples * bpc, STRIDE_ALIGN) / bpc;
            let len = stride * format.plane_height(idx, height);
            let buf = match (bpc, is_float32) {
                (1, _) => PlaneBuf::B8(try_vec(len, 0u8)?),
                (2, _) => PlaneBuf::B16(try_vec(len, 0u16)?),
                _ => PlaneBuf::F32(try_vec(len, 0f32)?),
            };
            planes.push(Plane { buf, stride });
        }
        Ok(Self {
            format,
            width,
            height,
            planes,
            metadata,
        })
    }

    /// Pixel format
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of planes
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Row stride of plane `idx` in samples
    pub fn stride(&self, idx: usize) -> usize {
        self.planes[idx].stride
    }

    /// 8-bit plane samples
    ///
    /// # Panics
    /// If the format does not store this plane as 8-bit samples.
    pub fn plane_u8(&self, idx: usize) -> &[u8] {
        match &self.planes[idx].buf {
            PlaneBuf::B8(v) => v,
            _ => panic!("plane {idx} is not 8-bit"),
        }
    }

    /// Mutable 8-bit plane samples
    pub fn plane_u8_mut(&mut self, idx: usize) -> &mut [u8] {
        match &mut self.planes[idx].buf {
            PlaneBuf::B8(v) => v,
            _ => panic!("plane {idx} is not 8-bit"),
        }
    }

    /// 16-bit plane samples (10/12-bit video or f16 bit patterns)
    ///
    /// # Panics
    /// If the format does not store this plane as 16-bit samples.
    pub fn plane_u16(&self, idx: usize) -> &[u16] {
        match &self.planes[idx].buf {
            PlaneBuf::B16(v) => v,
            _ => panic!("plane {idx} is not 16-bit"),
        }
    }

    /// Mutable 16-bit plane samples
    pub fn plane_u16_mut(&mut self, idx: usize) -> &mut [u16] {
        match &mut self.planes[idx].buf {
            PlaneBuf::B16(v) => v,
            _ => panic!("plane {idx} is not 16-bit"),
        }
    }

    /// f32 plane samples
    ///
    /// # Panics
    /// If the format does not store this plane as f32 samples.
    pub fn plane_f32(&self, idx: usize) -> &[f32] {
        match &self.planes[idx].buf {
            PlaneBuf::F32(v) => v,
            _ => panic!("plane {idx} is not f32"),
        }
    }

    /// Mutable f32 plane samples
    pub fn plane_f32_mut(&mut self, idx: usize) -> &mut [f32] {
        match &mut self.planes[idx].buf {
            PlaneBuf::F32(v) => v,
            _ => panic!("plane {idx} is not f32"),
        }
    }

    /// Plane viewed as native-endian bytes, for host export
    pub fn plane_bytes(&self, idx: usize) -> &[u8] {
        match &self.planes[idx].buf {
            PlaneBuf::B8(v) => v,
            PlaneBuf::B16(v) => bytemuck::cast_slice(v),
            PlaneBuf::F32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Overwrite a plane from native-endian bytes, for host import
    ///
    /// `bytes` must match the plane's allocated size exactly.
    pub fn copy_plane_from(&mut self, idx: usize, bytes: &[u8]) {
        match &mut self.planes[idx].buf {
            PlaneBuf::B8(v) => v.copy_from_slice(bytes),
            PlaneBuf::B16(v) => bytemuck::cast_slice_mut::<u16, u8>(v).copy_from_slice(bytes),
            PlaneBuf::F32(v) => bytemuck::cast_slice_mut::<f32, u8>(v).copy_from_slice(bytes),
        }
    }

    pub(crate) fn planes_u8_mut3(&mut self) -> [&mut [u8]; 3] {
        let [p0, p1, p2] = &mut self.planes[0..3] else {
            unreachable!("formats carry at least three planes")
        };
        [as_u8_mut(p0), as_u8_mut(p1), as_u8_mut(p2)]
    }

    pub(crate) fn planes_u16_mut3(&mut self) -> [&mut [u16]; 3] {
        let [p0, p1, p2] = &mut self.planes[0..3] else {
            unreachable!("formats carry at least three planes")
        };
        [as_u16_mut(p0), as_u16_mut(p1), as_u16_mut(p2)]
    }

    pub(crate) fn planes_f32_mut3(&mut self) -> [&mut [f32]; 3] {
        let [p0, p1, p2] = &mut self.planes[0..3] else {
            unreachable!("formats carry at least three planes")
        };
        [as_f32_mut(p0), as_f32_mut(p1), as_f32_mut(p2)]
    }
}

fn as_u8_mut(p: &mut Plane) -> &mut [u8] {
    match &mut p.buf {
        PlaneBuf::B8(v) => v,
        _ => panic!("plane is not 8-bit"),
    }
}

fn as_u16_mut(p: &mut Plane) -> &mut [u16] {
    match &mut p.buf {
        PlaneBuf::B16(v) => v,
        _ => panic!("plane is not 16-bit"),
    }
}

fn as_f32_mut(p: &mut Plane) -> &mut [f32] {
    match &mut p.buf {
        PlaneBuf::F32(v) => v,
        _ => panic!("plane is not f32"),
    }
}

fn try_vec<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    v.resize(len, fill);
    Ok(v)
}
