use crate::delay::Delay;
use crate::lcd::hd44780::command::*;
use crate::lcd::hd44780::config::{InterfaceWidth, LcdConfig};
use crate::lcd::hd44780::driver::bus::DataBus;
use crate::lcd::hd44780::driver::{HD44780Driver, HD44780Reader};
use crate::lcd::hd44780::geometry::{DisplayGeometry, Layout};
use crate::lcd::hd44780::{LcdError, LcdResult};
use crate::{GpioDirection, GpioPin};
use log::{debug, error, trace};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Instant;

/// Whether a [GpioHD44780Driver] has its RW line connected.
pub trait Access: Debug {}

/// RW tied to ground. Transfers are followed by fixed execution delays and nothing can be read.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct WriteOnly;

/// RW connected. The busy flag is polled and [HD44780Reader] is available.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ReadWrite;

impl Access for WriteOnly {}
impl Access for ReadWrite {}

/// HD44780 driven directly over GPIO lines.
///
/// The RW line is optional. A driver built with [new](Self::new) can't read from the controller
/// and waits a fixed execution time after every transfer. One built with [with_rw](Self::with_rw)
/// polls the busy flag instead and implements [HD44780Reader].
///
/// RS idles high (data), commands drop it for the duration of the transfer.
///
/// Reading from a write-only driver does not compile:
///
/// ```compile_fail
/// use charlcd_gpio::delay::StdDelay;
/// use charlcd_gpio::gpiod::GpiodDriver;
/// use charlcd_gpio::lcd::hd44780::{DataBus, DisplayGeometry, GpioHD44780Driver, HD44780Reader, LcdConfig};
/// use charlcd_gpio::GpioDriver;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gpio = GpiodDriver::open("/dev/gpiochip0")?;
/// let mut e = gpio.get_pin(22)?;
/// let mut rs = gpio.get_pin(27)?;
/// let mut data = gpio.get_port([23, 24, 25, 26], 4)?;
/// let mut delay = StdDelay::new();
///
/// let mut lcd = GpioHD44780Driver::new(
///     e.as_mut(),
///     rs.as_mut(),
///     DataBus::four_bit(data.as_mut(), 4)?,
///     DisplayGeometry::Lcd16x2,
///     LcdConfig::default(),
///     &mut delay,
/// )?;
/// let address = lcd.read_busy_and_address()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GpioHD44780Driver<'a, L: Layout = DisplayGeometry, A: Access = WriteOnly> {
    pin_e: &'a mut dyn GpioPin,
    pin_rw: Option<&'a mut dyn GpioPin>,
    pin_rs: &'a mut dyn GpioPin,
    data_bus: DataBus<'a>,
    layout: L,
    config: LcdConfig,
    delay: &'a mut dyn Delay,
    access: PhantomData<A>,
}

impl<'a, L: Layout> GpioHD44780Driver<'a, L, WriteOnly> {
    /// Takes over the pins of a display with RW tied low and initializes the controller.
    ///
    /// Fails before touching any pin if the layout is not supported.
    pub fn new(
        pin_e: &'a mut dyn GpioPin,
        pin_rs: &'a mut dyn GpioPin,
        data_bus: DataBus<'a>,
        layout: L,
        config: LcdConfig,
        delay: &'a mut dyn Delay,
    ) -> LcdResult<Self> {
        Self::build(pin_e, None, pin_rs, data_bus, layout, config, delay)
    }
}

impl<'a, L: Layout> GpioHD44780Driver<'a, L, ReadWrite> {
    /// Like [new](GpioHD44780Driver::new), with the RW line connected.
    pub fn with_rw(
        pin_e: &'a mut dyn GpioPin,
        pin_rw: &'a mut dyn GpioPin,
        pin_rs: &'a mut dyn GpioPin,
        data_bus: DataBus<'a>,
        layout: L,
        config: LcdConfig,
        delay: &'a mut dyn Delay,
    ) -> LcdResult<Self> {
        Self::build(pin_e, Some(pin_rw), pin_rs, data_bus, layout, config, delay)
    }
}

impl<'a, L: Layout, A: Access> GpioHD44780Driver<'a, L, A> {
    fn build(
        pin_e: &'a mut dyn GpioPin,
        pin_rw: Option<&'a mut dyn GpioPin>,
        pin_rs: &'a mut dyn GpioPin,
        data_bus: DataBus<'a>,
        layout: L,
        config: LcdConfig,
        delay: &'a mut dyn Delay,
    ) -> LcdResult<Self> {
        layout.geometry().check_supported()?;

        let mut driver = GpioHD44780Driver {
            pin_e,
            pin_rw,
            pin_rs,
            data_bus,
            layout,
            config,
            delay,
            access: PhantomData,
        };
        driver.init()?;
        Ok(driver)
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn config(&self) -> &LcdConfig {
        &self.config
    }

    pub fn interface_width(&self) -> InterfaceWidth {
        self.data_bus.width()
    }

    /// Whether the RW line is connected.
    pub fn is_read_enabled(&self) -> bool {
        self.pin_rw.is_some()
    }

    fn init(&mut self) -> LcdResult<()> {
        let geometry = self.layout.geometry();
        let width = self.data_bus.width();
        let timing = self.config.timing;
        debug!(
            "Initializing {} display over a {}-bit bus, read {}",
            geometry,
            width.bits(),
            if self.is_read_enabled() { "enabled" } else { "disabled" },
        );

        self.pin_rs.to_output_low()?;
        self.pin_e.to_output_low()?;
        if let Some(rw) = self.pin_rw.as_deref_mut() {
            rw.to_output_low()?;
        }
        self.data_bus.set_direction(GpioDirection::Output)?;

        self.delay.delay(timing.power_on);

        // Synchronize, the controller may be in either mode or halfway through a 4-bit transfer
        let pattern = match width {
            InterfaceWidth::FourBit => INIT_4BIT,
            InterfaceWidth::EightBit => INIT_8BIT,
        };
        for wait in [timing.init_first, timing.init_second, timing.init_third] {
            self.send_raw(pattern)?;
            self.delay.delay(wait);
        }
        if width == InterfaceWidth::FourBit {
            self.send_raw(INIT_4BIT_SWITCH)?;
            self.delay.delay(timing.init_four_bit);
        }
        debug!("Synchronized");

        self.function_set(width, geometry.two_line_class(), self.config.big_font)?;
        self.settle_init_step();

        self.set_display_control(false, false, false)?;
        self.settle_init_step();
        self.delay.delay(timing.display_off_settle);

        self.clear_display()?;
        self.settle_init_step();

        self.set_entry_mode(self.config.cursor_direction, self.config.display_shift)?;
        self.settle_init_step();

        if self.config.display_on {
            self.set_display_control(true, self.config.cursor_on, self.config.blink_on)?;
        }

        debug!("Initialized");
        Ok(())
    }

    fn settle_init_step(&mut self) {
        if !self.is_read_enabled() {
            self.delay.delay(self.config.timing.init_step_extra);
        }
    }

    /// Puts one transfer on the data lines and strobes E.
    ///
    /// In 4-bit mode only the low nibble of `value` is sent.
    fn send_raw(&mut self, value: u8) -> LcdResult<()> {
        debug_assert_eq!(self.data_bus.direction(), GpioDirection::Output);
        self.data_bus.put(value)?;
        self.pin_e.pulse(self.config.timing.enable_pulse, &mut *self.delay)?;
        Ok(())
    }

    /// Sends a full byte, then waits until the controller is done with it.
    fn send_byte(&mut self, value: u8, long: bool) -> LcdResult<()> {
        match self.data_bus.width() {
            InterfaceWidth::FourBit => {
                trace!("Writing HN: {:04b}", value >> 4);
                self.send_raw(value >> 4)?;
                trace!("Writing LN: {:04b}", value & 0x0F);
                self.send_raw(value & 0x0F)?;
            }
            InterfaceWidth::EightBit => self.send_raw(value)?,
        }
        self.wait(long)
    }

    fn wait(&mut self, long: bool) -> LcdResult<()> {
        if self.is_read_enabled() {
            self.poll_until_ready()?;
        } else {
            let timing = &self.config.timing;
            self.delay.delay(if long { timing.long_exec } else { timing.exec });
        }
        Ok(())
    }

    fn set_rw(&mut self, read: bool) -> LcdResult<()> {
        if let Some(rw) = self.pin_rw.as_deref_mut() {
            rw.write(read)?;
        }
        Ok(())
    }

    /// One E strobe with the bus in read mode, sampling while E is high.
    fn read_strobe(&mut self) -> LcdResult<u8> {
        let width = self.config.timing.enable_pulse;
        self.pin_e.write(true)?;
        self.delay.delay(width);
        let value = self.data_bus.sample();
        self.pin_e.write(false)?;
        self.delay.delay(width);
        value
    }

    /// Reads a full byte, high nibble first in 4-bit mode.
    fn read_cycle(&mut self) -> LcdResult<u8> {
        match self.data_bus.width() {
            InterfaceWidth::FourBit => {
                let high_nibble = self.read_strobe()?;
                let low_nibble = self.read_strobe()?;
                Ok((high_nibble << 4) | (low_nibble & 0x0F))
            }
            InterfaceWidth::EightBit => self.read_strobe(),
        }
    }

    fn leave_read_mode(&mut self) -> LcdResult<()> {
        self.set_rw(false)?;
        self.data_bus.set_direction(GpioDirection::Output)
    }

    /// Reads the status byte until the busy flag clears. Leaves RS high and the bus in write mode.
    fn poll_until_ready(&mut self) -> LcdResult<u8> {
        let timing = self.config.timing;
        let deadline = timing.busy_timeout.map(|timeout| Instant::now() + timeout);

        self.data_bus.set_direction(GpioDirection::Input)?;
        self.pin_rs.write(false)?;
        self.set_rw(true)?;

        let result = loop {
            let status = match self.read_cycle() {
                Ok(status) => status,
                Err(err) => break Err(err),
            };
            if status & BUSY_FLAG == 0 {
                break Ok(status & ADDRESS_MASK);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                error!("Controller still busy after {:?}", timing.busy_timeout);
                break Err(LcdError::BusyTimeout);
            }
            if !timing.busy_loop_extra.is_zero() {
                self.delay.delay(timing.busy_loop_extra);
            }
        };

        self.leave_read_mode()?;
        self.pin_rs.write(true)?;

        if let Ok(address) = result {
            trace!("Ready, AC: {:#04x}", address);
        }
        result
    }
}

impl<L: Layout, A: Access> HD44780Driver for GpioHD44780Driver<'_, L, A> {
    fn geometry(&self) -> DisplayGeometry {
        self.layout.geometry()
    }

    fn send_command(&mut self, command: u8) -> LcdResult<()> {
        trace!("Sending command: {:08b}", command);
        self.pin_rs.write(false)?;
        self.send_byte(command, false)?;
        self.pin_rs.write(true)?;
        Ok(())
    }

    fn send_long_command(&mut self, command: u8) -> LcdResult<()> {
        trace!("Sending long command: {:08b}", command);
        self.pin_rs.write(false)?;
        self.send_byte(command, true)?;
        self.pin_rs.write(true)?;
        Ok(())
    }

    fn send_data(&mut self, data: u8) -> LcdResult<()> {
        trace!("Sending data: {:08b}", data);
        self.send_byte(data, false)
    }
}

impl<L: Layout> HD44780Reader for GpioHD44780Driver<'_, L, ReadWrite> {
    fn read_busy_and_address(&mut self) -> LcdResult<u8> {
        self.poll_until_ready()
    }

    fn read_data(&mut self) -> LcdResult<u8> {
        self.data_bus.set_direction(GpioDirection::Input)?;
        self.set_rw(true)?;
        let data = self.read_cycle();
        self.leave_read_mode()?;

        let data = data?;
        trace!("Read data: {:08b}", data);
        Ok(data)
    }
}
