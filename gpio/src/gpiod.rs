//! GpiodDriver implementation for managing GPIO lines using the gpiod library.
//!
//! Line requests in the GPIO character device are tied to a direction, so changing the direction
//! of a pin or port releases its request and requests the lines again.
use crate::{
    GpioBias, GpioDirection, GpioDriver, GpioError, GpioPin, GpioPort, GpioResult,
};
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_pins: bits,
        }
    }

    /// Opens the GPIO chip at the given path, e.g. `/dev/gpiochip0`.
    pub fn open(path: &str) -> GpioResult<Self> {
        Ok(Self::new(gpiod::Chip::new(path)?))
    }

    fn request_input(&self, indices: &[usize], bias: GpioBias) -> GpioResult<gpiod::Lines<gpiod::Input>> {
        let lines = self.chip.request_lines(
            gpiod::Options::input(indices.iter().map(|&index| index as u32).collect::<Vec<_>>())
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(bias.into()),
        )?;
        Ok(lines)
    }

    fn request_output(&self, indices: &[usize], bias: GpioBias) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        let lines = self.chip.request_lines(
            gpiod::Options::output(indices.iter().map(|&index| index as u32).collect::<Vec<_>>())
                .consumer(env!("CARGO_PKG_NAME"))
                .bias(bias.into()),
        )?;
        Ok(lines)
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_pins[index] {
            return Err(GpioError::AlreadyInUse);
        }

        self.used_pins.set_aliased(index, true);

        Ok(Box::new(GpiodPin {
            driver: self,
            pin_index: index,
            lines: GpiodLines::Released,
            level: false,
        }))
    }

    fn get_port<const N: usize>(
        &self,
        indices: [usize; N],
        first_bit: u8,
    ) -> GpioResult<Box<dyn GpioPort + '_>> {
        if N == 0 || N + first_bit as usize > 8 {
            return Err(GpioError::InvalidArgument);
        }

        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        if indices.iter().any(|&index| self.used_pins[index]) {
            return Err(GpioError::AlreadyInUse);
        }

        for index in indices {
            self.used_pins.set_aliased(index, true);
        }

        Ok(Box::new(GpiodPort {
            driver: self,
            pin_indices: indices,
            first_bit,
            lines: GpiodLines::Released,
            output: 0,
        }))
    }
}

impl From<GpioBias> for gpiod::Bias {
    fn from(bias: GpioBias) -> Self {
        match bias {
            GpioBias::None => gpiod::Bias::Disable,
            GpioBias::PullUp => gpiod::Bias::PullUp,
            GpioBias::PullDown => gpiod::Bias::PullDown,
        }
    }
}

/// The current line request of a pin or port.
enum GpiodLines {
    Released,
    Input(gpiod::Lines<gpiod::Input>),
    Output(gpiod::Lines<gpiod::Output>),
}

impl GpiodLines {
    fn direction(&self) -> GpioDirection {
        match self {
            GpiodLines::Output(_) => GpioDirection::Output,
            _ => GpioDirection::Input,
        }
    }
}

struct GpiodPin<'a> {
    driver: &'a GpiodDriver,
    pin_index: usize,
    lines: GpiodLines,
    level: bool,
}

impl Debug for GpiodPin<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}][{:?}]", self.driver, self.pin_index, self.lines.direction())
    }
}

impl GpioPin for GpiodPin<'_> {
    fn set_direction(&mut self, direction: GpioDirection, bias: GpioBias) -> GpioResult<()> {
        // The old request has to be dropped before the line can be requested again
        self.lines = GpiodLines::Released;
        self.lines = match direction {
            GpioDirection::Input => GpiodLines::Input(self.driver.request_input(&[self.pin_index], bias)?),
            GpioDirection::Output => {
                let lines = self.driver.request_output(&[self.pin_index], bias)?;
                lines.set_values([self.level])?;
                GpiodLines::Output(lines)
            }
        };
        trace!("{:?} configured", self);
        Ok(())
    }

    fn direction(&self) -> GpioDirection {
        self.lines.direction()
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        match &self.lines {
            GpiodLines::Output(lines) => {
                lines.set_values([value])?;
                self.level = value;
                Ok(())
            }
            _ => Err(GpioError::InvalidArgument),
        }
    }

    fn read(&self) -> GpioResult<bool> {
        match &self.lines {
            GpiodLines::Input(lines) => {
                let values = lines.get_values([false])?;
                Ok(values[0])
            }
            GpiodLines::Output(_) => Ok(self.level),
            GpiodLines::Released => Err(GpioError::InvalidArgument),
        }
    }
}

impl Drop for GpiodPin<'_> {
    fn drop(&mut self) {
        self.driver.used_pins.set_aliased(self.pin_index, false);
    }
}

/// A port backed by `N` lines of the chip.
///
/// The lines are always requested together, so a direction change touching any of the port's
/// bits switches all of them.
struct GpiodPort<'a, const N: usize> {
    driver: &'a GpiodDriver,
    pin_indices: [usize; N],
    first_bit: u8,
    lines: GpiodLines,
    /// Last value written to the port, kept so masked writes can preserve the other bits.
    output: u8,
}

impl<const N: usize> GpiodPort<'_, N> {
    fn port_mask(&self) -> u8 {
        let width_mask = if N >= 8 { 0xFF } else { (1u8 << N) - 1 };
        width_mask << self.first_bit
    }

    fn line_values(&self, byte: u8) -> [bool; N] {
        let mut values = [false; N];
        for (i, value) in values.iter_mut().enumerate() {
            *value = (byte >> (self.first_bit as usize + i)) & 1 != 0;
        }
        values
    }
}

impl<const N: usize> Debug for GpiodPort<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}{:?}<<{}[{:?}]",
            self.driver,
            self.pin_indices,
            self.first_bit,
            self.lines.direction(),
        )
    }
}

impl<const N: usize> GpioPort for GpiodPort<'_, N> {
    fn set_direction(&mut self, mask: u8, direction: GpioDirection, bias: GpioBias) -> GpioResult<()> {
        if mask & self.port_mask() == 0 {
            return Ok(());
        }

        self.lines = GpiodLines::Released;
        self.lines = match direction {
            GpioDirection::Input => GpiodLines::Input(self.driver.request_input(&self.pin_indices, bias)?),
            GpioDirection::Output => {
                let lines = self.driver.request_output(&self.pin_indices, bias)?;
                lines.set_values(self.line_values(self.output))?;
                GpiodLines::Output(lines)
            }
        };
        trace!("{:?} configured", self);
        Ok(())
    }

    fn write_masked(&mut self, mask: u8, value: u8) -> GpioResult<()> {
        self.output = (self.output & !mask) | (value & mask);
        match &self.lines {
            GpiodLines::Output(lines) => {
                lines.set_values(self.line_values(self.output))?;
                Ok(())
            }
            _ => Err(GpioError::InvalidArgument),
        }
    }

    fn read_masked(&self, mask: u8) -> GpioResult<u8> {
        let byte = match &self.lines {
            GpiodLines::Input(lines) => {
                let values = lines.get_values([false; N])?;
                values
                    .iter()
                    .enumerate()
                    .filter(|&(_, &value)| value)
                    .fold(0u8, |byte, (i, _)| byte | 1 << (self.first_bit as usize + i))
            }
            GpiodLines::Output(_) => self.output,
            GpiodLines::Released => return Err(GpioError::InvalidArgument),
        };
        Ok(byte & mask & self.port_mask())
    }
}

impl<const N: usize> Drop for GpiodPort<'_, N> {
    fn drop(&mut self) {
        for &index in &self.pin_indices {
            self.driver.used_pins.set_aliased(index, false);
        }
    }
}
