//! Physical display layouts and their DDRAM addressing.
//!
//! The controller only knows two DDRAM lines of 40 characters, starting at `0x00` and `0x40`.
//! Four row displays fold each of those lines in half, so their third and fourth rows continue
//! the first and second ones at `cols` characters in.

use super::{LcdError, LcdResult};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum DisplayGeometry {
    Lcd8x1,
    Lcd16x1,
    Lcd16x2,
    Lcd20x2,
    Lcd32x2,
    Lcd40x2,
    Lcd16x4,
    Lcd20x4,
    /// Uses two controllers with separate enable lines, not supported by this driver.
    Lcd40x4,
}

#[derive(Debug)]
struct GeometryInfo {
    geometry: DisplayGeometry,
    rows: u8,
    cols: u8,
    row_addresses: Option<&'static [u8]>,
}

const ONE_ROW: &[u8] = &[0x00];
const TWO_ROWS: &[u8] = &[0x00, 0x40];

/// Indexed by the [DisplayGeometry] discriminant.
static GEOMETRY_TABLE: [GeometryInfo; 9] = [
    GeometryInfo { geometry: DisplayGeometry::Lcd8x1, rows: 1, cols: 8, row_addresses: Some(ONE_ROW) },
    GeometryInfo { geometry: DisplayGeometry::Lcd16x1, rows: 1, cols: 16, row_addresses: Some(ONE_ROW) },
    GeometryInfo { geometry: DisplayGeometry::Lcd16x2, rows: 2, cols: 16, row_addresses: Some(TWO_ROWS) },
    GeometryInfo { geometry: DisplayGeometry::Lcd20x2, rows: 2, cols: 20, row_addresses: Some(TWO_ROWS) },
    GeometryInfo { geometry: DisplayGeometry::Lcd32x2, rows: 2, cols: 32, row_addresses: Some(TWO_ROWS) },
    GeometryInfo { geometry: DisplayGeometry::Lcd40x2, rows: 2, cols: 40, row_addresses: Some(TWO_ROWS) },
    GeometryInfo {
        geometry: DisplayGeometry::Lcd16x4,
        rows: 4,
        cols: 16,
        row_addresses: Some(&[0x00, 0x40, 0x10, 0x50]),
    },
    GeometryInfo {
        geometry: DisplayGeometry::Lcd20x4,
        rows: 4,
        cols: 20,
        row_addresses: Some(&[0x00, 0x40, 0x14, 0x54]),
    },
    GeometryInfo { geometry: DisplayGeometry::Lcd40x4, rows: 4, cols: 40, row_addresses: None },
];

impl DisplayGeometry {
    pub const ALL: [DisplayGeometry; 9] = [
        DisplayGeometry::Lcd8x1,
        DisplayGeometry::Lcd16x1,
        DisplayGeometry::Lcd16x2,
        DisplayGeometry::Lcd20x2,
        DisplayGeometry::Lcd32x2,
        DisplayGeometry::Lcd40x2,
        DisplayGeometry::Lcd16x4,
        DisplayGeometry::Lcd20x4,
        DisplayGeometry::Lcd40x4,
    ];

    fn info(self) -> &'static GeometryInfo {
        let info = &GEOMETRY_TABLE[self as usize];
        debug_assert_eq!(info.geometry, self);
        info
    }

    pub fn rows(self) -> u8 {
        self.info().rows
    }

    pub fn cols(self) -> u8 {
        self.info().cols
    }

    pub fn is_supported(self) -> bool {
        self.info().row_addresses.is_some()
    }

    /// Fails with [LcdError::UnsupportedGeometry] for layouts the driver can't address.
    pub fn check_supported(self) -> LcdResult<()> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(LcdError::UnsupportedGeometry(self))
        }
    }

    /// Whether the controller has to be configured for two lines.
    ///
    /// Four row displays are two DDRAM lines folded in half, so they count too.
    pub fn two_line_class(self) -> bool {
        self.rows() > 1
    }

    /// DDRAM address of the first character of `row`.
    pub fn row_base_address(self, row: u8) -> LcdResult<u8> {
        let addresses = self.info().row_addresses.ok_or(LcdError::UnsupportedGeometry(self))?;
        addresses
            .get(row as usize)
            .copied()
            .ok_or(LcdError::InvalidRow { geometry: self, row })
    }
}

impl Display for DisplayGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.cols(), self.rows())
    }
}

impl FromStr for DisplayGeometry {
    type Err = String;

    /// Parses `"<cols>x<rows>"`, e.g. `"20x4"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisplayGeometry::ALL
            .into_iter()
            .find(|geometry| geometry.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown display geometry: {s:?}"))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DisplayGeometry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DisplayGeometry {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Provides the geometry of a display.
///
/// Implemented by [DisplayGeometry] for layouts picked at runtime and by the zero-sized markers in
/// [fixed] for layouts known at compile time.
pub trait Layout: Debug {
    fn geometry(&self) -> DisplayGeometry;
}

impl Layout for DisplayGeometry {
    fn geometry(&self) -> DisplayGeometry {
        *self
    }
}

/// Compile-time display layouts.
///
/// There is no marker for 40x4, which the driver can't address.
pub mod fixed {
    use super::{DisplayGeometry, Layout};

    macro_rules! fixed_layout {
        ($($name:ident => $geometry:ident),* $(,)?) => {
            $(
                #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
                pub struct $name;

                impl Layout for $name {
                    fn geometry(&self) -> DisplayGeometry {
                        DisplayGeometry::$geometry
                    }
                }
            )*
        };
    }

    fixed_layout! {
        Lcd8x1 => Lcd8x1,
        Lcd16x1 => Lcd16x1,
        Lcd16x2 => Lcd16x2,
        Lcd20x2 => Lcd20x2,
        Lcd32x2 => Lcd32x2,
        Lcd40x2 => Lcd40x2,
        Lcd16x4 => Lcd16x4,
        Lcd20x4 => Lcd20x4,
    }
}
