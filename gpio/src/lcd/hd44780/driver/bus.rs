use crate::lcd::hd44780::config::InterfaceWidth;
use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{GpioBias, GpioDirection, GpioPort};
use log::trace;

/// The data lines of the controller, as a slice of a [GpioPort].
///
/// In 4-bit mode DB4..DB7 sit on four consecutive port bits starting at `shift`. In 8-bit mode
/// DB0..DB7 are the whole port.
#[derive(Debug)]
pub struct DataBus<'a> {
    port: &'a mut dyn GpioPort,
    width: InterfaceWidth,
    shift: u8,
    direction: GpioDirection,
}

impl<'a> DataBus<'a> {
    /// Uses four port bits starting at `shift`, which has to be between 0 and 4.
    pub fn four_bit(port: &'a mut dyn GpioPort, shift: u8) -> LcdResult<Self> {
        if shift > 4 {
            return Err(LcdError::InvalidDataShift(shift));
        }
        Ok(DataBus {
            port,
            width: InterfaceWidth::FourBit,
            shift,
            direction: GpioDirection::Input,
        })
    }

    pub fn eight_bit(port: &'a mut dyn GpioPort) -> Self {
        DataBus {
            port,
            width: InterfaceWidth::EightBit,
            shift: 0,
            direction: GpioDirection::Input,
        }
    }

    pub fn width(&self) -> InterfaceWidth {
        self.width
    }

    pub fn direction(&self) -> GpioDirection {
        self.direction
    }

    /// Port bits occupied by the bus.
    pub fn mask(&self) -> u8 {
        match self.width {
            InterfaceWidth::FourBit => 0x0F << self.shift,
            InterfaceWidth::EightBit => 0xFF,
        }
    }

    /// Switches the data lines. Inputs get pull-ups so a floating bus reads as busy.
    pub fn set_direction(&mut self, direction: GpioDirection) -> LcdResult<()> {
        let bias = match direction {
            GpioDirection::Input => GpioBias::PullUp,
            GpioDirection::Output => GpioBias::None,
        };
        self.port.set_direction(self.mask(), direction, bias)?;
        self.direction = direction;
        trace!("Data bus direction: {:?}", direction);
        Ok(())
    }

    /// Drives the lines with `value`. In 4-bit mode only its low nibble is used.
    pub fn put(&mut self, value: u8) -> LcdResult<()> {
        let value = match self.width {
            InterfaceWidth::FourBit => (value & 0x0F) << self.shift,
            InterfaceWidth::EightBit => value,
        };
        self.port.write_masked(self.mask(), value)?;
        Ok(())
    }

    /// Samples the lines. In 4-bit mode the nibble is returned in the low bits.
    pub fn sample(&self) -> LcdResult<u8> {
        let value = self.port.read_masked(self.mask())?;
        Ok(match self.width {
            InterfaceWidth::FourBit => value >> self.shift,
            InterfaceWidth::EightBit => value,
        })
    }
}
