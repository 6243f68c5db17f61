//! HD44780 character LCD driver.
//!
//! Drives HD44780-compatible dot-matrix controllers over a parallel bus, either 8 data lines or
//! the upper 4 of them. Timing follows the datasheet: every transfer is followed by either a fixed
//! execution delay or, when the RW line is wired, by polling the busy flag.
//!
//! The [driver::HD44780Driver] trait describes the instruction set, [driver::GpioHD44780Driver]
//! implements it over [GpioPin](crate::GpioPin)s and a [GpioPort](crate::GpioPort), and
//! [text::TextExt] adds line-oriented text rendering on top.
//!
//! DDRAM addresses are not contiguous across rows (a 20x4 display has row 2 right after row 0 at
//! `0x14`), so rows are always addressed through the [geometry] table.
//!
//! ```no_run
//! use charlcd_gpio::delay::StdDelay;
//! use charlcd_gpio::gpiod::GpiodDriver;
//! use charlcd_gpio::lcd::hd44780::{DataBus, DisplayGeometry, GpioHD44780Driver, LcdConfig, TextExt};
//! use charlcd_gpio::GpioDriver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gpio = GpiodDriver::open("/dev/gpiochip0")?;
//! let mut e = gpio.get_pin(22)?;
//! let mut rs = gpio.get_pin(27)?;
//! let mut data = gpio.get_port([23, 24, 25, 26], 4)?;
//! let mut delay = StdDelay::new();
//!
//! let mut lcd = GpioHD44780Driver::new(
//!     e.as_mut(),
//!     rs.as_mut(),
//!     DataBus::four_bit(data.as_mut(), 4)?,
//!     DisplayGeometry::Lcd20x4,
//!     LcdConfig::default(),
//!     &mut delay,
//! )?;
//! lcd.write_line("It's OK!", 3, 10)?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod driver;
pub mod geometry;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod text;

use crate::GpioError;
use thiserror::Error;

pub use config::{CursorDirection, InterfaceWidth, LcdConfig, Timing};
pub use driver::bus::DataBus;
pub use driver::gpio::{GpioHD44780Driver, ReadWrite, WriteOnly};
pub use driver::{HD44780Driver, HD44780Reader};
pub use geometry::{DisplayGeometry, Layout};
pub use text::TextExt;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("display geometry {0} is not supported")]
    UnsupportedGeometry(DisplayGeometry),
    #[error("data shift {0} does not fit a 4-bit bus into an 8-bit port")]
    InvalidDataShift(u8),
    #[error("row {row} is out of range for a {geometry} display")]
    InvalidRow { geometry: DisplayGeometry, row: u8 },
    #[error("the controller stayed busy for longer than the configured timeout")]
    BusyTimeout,
    #[error("GPIO error: {0}")]
    Gpio(#[from] GpioError),
}

pub type LcdResult<T> = Result<T, LcdError>;
