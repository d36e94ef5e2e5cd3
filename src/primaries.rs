//! RGB/XYZ matrices and the primary-mapping transform

use crate::adaptation::{adaptation_matrix, WhitepointAdaptation};
use crate::math::Mat3;
use crate::tables::{Chromaticity, PrimariesDesc};

fn primary_column(c: &Chromaticity) -> [f64; 3] {
    let x = c.xf();
    let y = c.yf();
    [x / y, 1.0, (1.0 - x - y) / y]
}

/// RGB to XYZ matrix for a primary set
///
/// Columns are the primaries' XYZ directions, scaled so that RGB
/// (1, 1, 1) lands on the white point.
pub fn rgb_to_xyz(desc: &PrimariesDesc) -> Mat3 {
    let m = Mat3::from_columns(
        primary_column(&desc.red),
        primary_column(&desc.green),
        primary_column(&desc.blue),
    );
    let wx = desc.white.xf();
    let wy = desc.white.yf();
    let s = m.invert().mul_vec([wx, wy, 1.0 - wx - wy]);
    m.mul(&Mat3::diag(s))
}

/// Linear RGB to linear RGB matrix mapping `src` primaries onto `dst`
///
/// White point adaptation is inserted between the two XYZ spaces unless
/// the white points match or the method is `Identity`.
pub fn primary_map(
    src: &PrimariesDesc,
    dst: &PrimariesDesc,
    method: WhitepointAdaptation,
) -> Mat3 {
    let src_xyz = rgb_to_xyz(src);
    let dst_xyz = rgb_to_xyz(dst);
    let xyz_map = match adaptation_matrix(method, &src.white, &dst.white) {
        Some(a) => a.mul(&src_xyz),
        None => src_xyz,
    };
    dst_xyz.invert().mul(&xyz_map)
}
