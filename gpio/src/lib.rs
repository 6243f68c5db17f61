pub mod delay;
pub mod gpiod;
pub mod lcd;

use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use crate::delay::Delay;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn count(&self) -> GpioResult<usize>;

    /// Gets the GPIO pin at the given index.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Gets an 8-bit wide port made of the lines at the given indices.
    ///
    /// `indices[i]` is wired to port bit `first_bit + i`, so a 4-line port starting at bit 4 maps
    /// its lines onto the high nibble. Port bits with no line behind them read as `0` and ignore
    /// writes.
    fn get_port<const N: usize>(
        &self,
        indices: [usize; N],
        first_bit: u8,
    ) -> GpioResult<Box<dyn GpioPort + '_>>;
}

/// Direction of a GPIO line.
///
/// Lines start as inputs until configured otherwise.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioDirection {
    #[default] Input,
    Output,
}

/// Specifies the bias of the GPIO pin.
///
/// You can use this to enable pull-up or pull-down resistors.
/// These should work in both input and output modes.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

/// A single GPIO line that can be switched between input and output.
pub trait GpioPin: Debug {
    /// Sets the direction and bias of the pin.
    fn set_direction(&mut self, direction: GpioDirection, bias: GpioBias) -> GpioResult<()>;

    /// Gets the direction the pin was last configured with.
    fn direction(&self) -> GpioDirection;

    /// Drives the pin high or low. The pin must be an output.
    fn write(&mut self, value: bool) -> GpioResult<()>;

    /// Reads the level of the pin.
    fn read(&self) -> GpioResult<bool>;

    /// Configures the pin as an output and drives it low.
    fn to_output_low(&mut self) -> GpioResult<()> {
        self.set_direction(GpioDirection::Output, GpioBias::None)?;
        self.write(false)
    }

    /// Drives the pin high for `width`, then low for `width` again.
    fn pulse(&mut self, width: Duration, delay: &mut dyn Delay) -> GpioResult<()> {
        self.write(true)?;
        delay.delay(width);
        self.write(false)?;
        delay.delay(width);
        Ok(())
    }
}

/// A group of up to 8 GPIO lines accessed as one byte, LSb first.
///
/// Every operation takes a mask, and bits outside of it are left untouched.
pub trait GpioPort: Debug {
    /// Sets the direction and bias of the lines selected by `mask`.
    fn set_direction(&mut self, mask: u8, direction: GpioDirection, bias: GpioBias) -> GpioResult<()>;

    /// Replaces the output bits selected by `mask` with the same bits of `value`.
    fn write_masked(&mut self, mask: u8, value: u8) -> GpioResult<()>;

    /// Reads the levels of the lines selected by `mask`. Other bits are `0`.
    fn read_masked(&self, mask: u8) -> GpioResult<u8>;
}
