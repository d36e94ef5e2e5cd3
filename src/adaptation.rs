//! Chromatic adaptation between white points
//!
//! Maps XYZ values referenced to one white point onto another via a
//! cone-response basis: scale factors are computed in cone space and
//! transformed back, `A = M^-1 * diag(d/s) * M`.

use crate::math::Mat3;
use crate::tables::Chromaticity;

/// Cone-response basis used for white point adaptation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitepointAdaptation {
    /// Bradford cone response (default)
    #[default]
    Bradford,
    /// von Kries cone response
    VonKries,
    /// No adaptation even when white points differ
    Identity,
}

const BRADFORD: Mat3 = Mat3([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

const VON_KRIES: Mat3 = Mat3([
    [0.40024, 0.70760, -0.08081],
    [-0.22630, 1.16532, 0.04570],
    [0.0, 0.0, 0.91822],
]);

fn whitepoint_xyz(wp: &Chromaticity) -> [f64; 3] {
    let x = wp.xf();
    let y = wp.yf();
    [x, y, 1.0 - x - y]
}

/// Adaptation matrix from `src` to `dst` white point
///
/// Returns `None` when no adaptation is wanted: identical white points,
/// or the `Identity` method.
pub fn adaptation_matrix(
    method: WhitepointAdaptation,
    src: &Chromaticity,
    dst: &Chromaticity,
) -> Option<Mat3> {
    if src == dst {
        return None;
    }
    let cone = match method {
        WhitepointAdaptation::Bradford => BRADFORD,
        WhitepointAdaptation::VonKries => VON_KRIES,
        WhitepointAdaptation::Identity => return None,
    };
    let s = cone.mul_vec(whitepoint_xyz(src));
    let d = cone.mul_vec(whitepoint_xyz(dst));
    let scale = Mat3::diag([d[0] / s[0], d[1] / s[1], d[2] / s[2]]);
    Some(cone.invert().mul(&scale).mul(&cone))
}
