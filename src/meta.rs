//! Colorimetric metadata tags
//!
//! Tag values follow the ISO/IEC 23001-8 code points that video
//! bitstreams carry, restricted to the set this crate can convert
//! between. String forms match the usual option spellings so hosts can
//! parse user-supplied overrides.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// YUV matrix coefficients tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixCoefficients {
    /// GBR passthrough (RGB-family formats)
    Identity,
    /// Determined by the application
    Unspecified,
    /// Rec. ITU-R BT.709-6
    Bt709,
    /// US FCC Title 47
    Fcc,
    /// Rec. ITU-R BT.470 System B/G
    Bt470bg,
    /// SMPTE ST 170 (BT.601-6 525)
    Smpte170m,
    /// SMPTE ST 240
    Smpte240m,
    /// Rec. ITU-R BT.2020 non-constant luminance
    Bt2020Ncl,
}

/// Color primaries tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPrimaries {
    /// Determined by the application
    Unspecified,
    /// Rec. ITU-R BT.709-6
    Bt709,
    /// Rec. ITU-R BT.470 System M
    Bt470m,
    /// Rec. ITU-R BT.470 System B/G
    Bt470bg,
    /// SMPTE ST 170
    Smpte170m,
    /// SMPTE ST 240
    Smpte240m,
    /// Rec. ITU-R BT.2020
    Bt2020,
}

/// Transfer characteristic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferCharacteristic {
    /// Determined by the application
    Unspecified,
    /// Rec. ITU-R BT.709-6
    Bt709,
    /// Assumed display gamma 2.2 (BT.470 System M)
    Gamma22,
    /// Assumed display gamma 2.8 (BT.470 System B/G)
    Gamma28,
    /// SMPTE ST 170
    Smpte170m,
    /// SMPTE ST 240
    Smpte240m,
    /// Linear light
    Linear,
    /// IEC 61966-2-1 (sRGB)
    Srgb,
    /// IEC 61966-2-4 (xvYCC)
    Xvycc,
    /// Rec. ITU-R BT.2020 for 10-bit systems
    Bt2020_10,
    /// Rec. ITU-R BT.2020 for 12-bit systems
    Bt2020_12,
}

/// Numeric range of YUV samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Range {
    /// Not signalled; resolved to limited with a one-shot warning
    #[default]
    Unspecified,
    /// Limited/studio range (Y 16-235, UV 16-240 at 8-bit)
    Limited,
    /// Full range (0-255 at 8-bit)
    Full,
}

/// Complete colorimetric description of one side of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorMetadata {
    /// YUV matrix coefficients
    pub matrix: MatrixCoefficients,
    /// Primary chromaticities
    pub primaries: ColorPrimaries,
    /// Opto-electronic transfer characteristic
    pub transfer: TransferCharacteristic,
    /// Sample range
    pub range: Range,
}

impl Default for ColorMetadata {
    fn default() -> Self {
        Self {
            matrix: MatrixCoefficients::Unspecified,
            primaries: ColorPrimaries::Unspecified,
            transfer: TransferCharacteristic::Unspecified,
            range: Range::Unspecified,
        }
    }
}

impl MatrixCoefficients {
    /// Resolve an ISO/IEC 23001-8 matrix coefficients code point
    ///
    /// Reserved values and code points this crate cannot convert
    /// (YCgCo, constant luminance, ICtCp) are rejected.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => MatrixCoefficients::Identity,
            1 => MatrixCoefficients::Bt709,
            2 => MatrixCoefficients::Unspecified,
            4 => MatrixCoefficients::Fcc,
            5 => MatrixCoefficients::Bt470bg,
            6 => MatrixCoefficients::Smpte170m,
            7 => MatrixCoefficients::Smpte240m,
            9 => MatrixCoefficients::Bt2020Ncl,
            _ => return Err(Error::UnknownMatrix),
        })
    }
}

impl ColorPrimaries {
    /// Resolve an ISO/IEC 23001-8 colour primaries code point
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            1 => ColorPrimaries::Bt709,
            2 => ColorPrimaries::Unspecified,
            4 => ColorPrimaries::Bt470m,
            5 => ColorPrimaries::Bt470bg,
            6 => ColorPrimaries::Smpte170m,
            7 => ColorPrimaries::Smpte240m,
            9 => ColorPrimaries::Bt2020,
            _ => return Err(Error::UnknownPrimaries),
        })
    }
}

impl TransferCharacteristic {
    /// Resolve an ISO/IEC 23001-8 transfer characteristics code point
    ///
    /// Non-analytic curves (PQ, HLG, the log transfers) have no code
    /// point here; they enter through the caller-supplied
    /// delinearisation instead.
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            1 => TransferCharacteristic::Bt709,
            2 => TransferCharacteristic::Unspecified,
            4 => TransferCharacteristic::Gamma22,
            5 => TransferCharacteristic::Gamma28,
            6 => TransferCharacteristic::Smpte170m,
            7 => TransferCharacteristic::Smpte240m,
            8 => TransferCharacteristic::Linear,
            11 => TransferCharacteristic::Xvycc,
            13 => TransferCharacteristic::Srgb,
            14 => TransferCharacteristic::Bt2020_10,
            15 => TransferCharacteristic::Bt2020_12,
            _ => return Err(Error::UnknownTransfer),
        })
    }
}

impl Range {
    /// Resolve a signalled range code (0 unspecified, 1 limited, 2 full)
    pub fn from_code(code: u8) -> Result<Self> {
        Ok(match code {
            0 => Range::Unspecified,
            1 => Range::Limited,
            2 => Range::Full,
            _ => return Err(Error::InvalidRange),
        })
    }
}

/// Named colorspace preset expanding to a (matrix, primaries, transfer)
/// triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// BT.470 System M
    Bt470m,
    /// BT.470 System B/G
    Bt470bg,
    /// BT.601-6 525-line
    Bt601_6_525,
    /// BT.601-6 625-line
    Bt601_6_625,
    /// BT.709
    Bt709,
    /// SMPTE ST 170
    Smpte170m,
    /// SMPTE ST 240
    Smpte240m,
    /// BT.2020 (non-constant luminance, 10-bit transfer)
    Bt2020,
}

impl Preset {
    /// Expand the preset into its canonical tag triple
    pub fn expand(self) -> (MatrixCoefficients, ColorPrimaries, TransferCharacteristic) {
        use ColorPrimaries as P;
        use MatrixCoefficients as M;
        use TransferCharacteristic as T;
        match self {
            Preset::Bt470m => (M::Smpte170m, P::Bt470m, T::Gamma22),
            Preset::Bt470bg => (M::Bt470bg, P::Bt470bg, T::Gamma28),
            Preset::Bt601_6_525 => (M::Smpte170m, P::Smpte170m, T::Smpte170m),
            Preset::Bt601_6_625 => (M::Bt470bg, P::Bt470bg, T::Smpte170m),
            Preset::Bt709 => (M::Bt709, P::Bt709, T::Bt709),
            Preset::Smpte170m => (M::Smpte170m, P::Smpte170m, T::Smpte170m),
            Preset::Smpte240m => (M::Smpte240m, P::Smpte240m, T::Smpte240m),
            Preset::Bt2020 => (M::Bt2020Ncl, P::Bt2020, T::Bt2020_10),
        }
    }
}

impl fmt::Display for MatrixCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatrixCoefficients::Identity => "gbr",
            MatrixCoefficients::Unspecified => "unspecified",
            MatrixCoefficients::Bt709 => "bt709",
            MatrixCoefficients::Fcc => "fcc",
            MatrixCoefficients::Bt470bg => "bt470bg",
            MatrixCoefficients::Smpte170m => "smpte170m",
            MatrixCoefficients::Smpte240m => "smpte240m",
            MatrixCoefficients::Bt2020Ncl => "bt2020ncl",
        };
        s.fmt(f)
    }
}

impl FromStr for MatrixCoefficients {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "gbr" | "rgb" => MatrixCoefficients::Identity,
            "unspecified" => MatrixCoefficients::Unspecified,
            "bt709" => MatrixCoefficients::Bt709,
            "fcc" => MatrixCoefficients::Fcc,
            "bt470bg" | "bt601-6-625" => MatrixCoefficients::Bt470bg,
            "smpte170m" | "bt601-6-525" => MatrixCoefficients::Smpte170m,
            "smpte240m" => MatrixCoefficients::Smpte240m,
            "bt2020ncl" | "bt2020nc" => MatrixCoefficients::Bt2020Ncl,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for ColorPrimaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorPrimaries::Unspecified => "unspecified",
            ColorPrimaries::Bt709 => "bt709",
            ColorPrimaries::Bt470m => "bt470m",
            ColorPrimaries::Bt470bg => "bt470bg",
            ColorPrimaries::Smpte170m => "smpte170m",
            ColorPrimaries::Smpte240m => "smpte240m",
            ColorPrimaries::Bt2020 => "bt2020",
        };
        s.fmt(f)
    }
}

impl FromStr for ColorPrimaries {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "unspecified" => ColorPrimaries::Unspecified,
            "bt709" => ColorPrimaries::Bt709,
            "bt470m" => ColorPrimaries::Bt470m,
            "bt470bg" => ColorPrimaries::Bt470bg,
            "smpte170m" => ColorPrimaries::Smpte170m,
            "smpte240m" => ColorPrimaries::Smpte240m,
            "bt2020" => ColorPrimaries::Bt2020,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for TransferCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferCharacteristic::Unspecified => "unspecified",
            TransferCharacteristic::Bt709 => "bt709",
            TransferCharacteristic::Gamma22 => "gamma22",
            TransferCharacteristic::Gamma28 => "gamma28",
            TransferCharacteristic::Smpte170m => "smpte170m",
            TransferCharacteristic::Smpte240m => "smpte240m",
            TransferCharacteristic::Linear => "linear",
            TransferCharacteristic::Srgb => "srgb",
            TransferCharacteristic::Xvycc => "xvycc",
            TransferCharacteristic::Bt2020_10 => "bt2020-10",
            TransferCharacteristic::Bt2020_12 => "bt2020-12",
        };
        s.fmt(f)
    }
}

impl FromStr for TransferCharacteristic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "unspecified" => TransferCharacteristic::Unspecified,
            "bt709" => TransferCharacteristic::Bt709,
            "gamma22" | "bt470m" => TransferCharacteristic::Gamma22,
            "gamma28" | "bt470bg" => TransferCharacteristic::Gamma28,
            "smpte170m" => TransferCharacteristic::Smpte170m,
            "smpte240m" => TransferCharacteristic::Smpte240m,
            "linear" => TransferCharacteristic::Linear,
            "srgb" | "iec61966-2-1" => TransferCharacteristic::Srgb,
            "xvycc" | "iec61966-2-4" => TransferCharacteristic::Xvycc,
            "bt2020-10" => TransferCharacteristic::Bt2020_10,
            "bt2020-12" => TransferCharacteristic::Bt2020_12,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Range::Unspecified => "unspecified",
            Range::Limited => "tv",
            Range::Full => "pc",
        };
        s.fmt(f)
    }
}

impl FromStr for Range {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "unspecified" => Range::Unspecified,
            "tv" | "mpeg" | "limited" => Range::Limited,
            "pc" | "jpeg" | "full" => Range::Full,
            _ => return Err(()),
        })
    }
}

impl FromStr for Preset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Ok(match s {
            "bt470m" => Preset::Bt470m,
            "bt470bg" => Preset::Bt470bg,
            "bt601-6-525" => Preset::Bt601_6_525,
            "bt601-6-625" => Preset::Bt601_6_625,
            "bt709" => Preset::Bt709,
            "smpte170m" => Preset::Smpte170m,
            "smpte240m" => Preset::Smpte240m,
            "bt2020" => Preset::Bt2020,
            _ => return Err(()),
        })
    }
}
