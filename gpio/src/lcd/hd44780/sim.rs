//! A simulated HD44780 behind simulated GPIO lines.
//!
//! [SimController] hands out [GpioPin], [GpioPort] and [Delay] implementations that all feed one
//! controller model. The model latches transfers on the falling edge of E like the real chip,
//! keeps DDRAM and CGRAM, answers reads, and records every pin change, delay and executed
//! instruction, so tests can check both the bus traffic and what ends up on the screen.
//!
//! Delays are recorded but never slept.

use crate::delay::Delay;
use crate::lcd::hd44780::command::{ADDRESS_MASK, BUSY_FLAG};
use crate::lcd::hd44780::config::InterfaceWidth;
use crate::lcd::hd44780::geometry::DisplayGeometry;
use crate::lcd::hd44780::LcdResult;
use crate::{GpioBias, GpioDirection, GpioError, GpioPin, GpioPort, GpioResult};
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::Duration;

const DDRAM_SIZE: usize = 0x80;
const CGRAM_SIZE: usize = 0x40;

/// The control lines of the controller.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SimLine {
    Rs,
    E,
    Rw,
}

impl SimLine {
    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SimEvent {
    PinDirection(SimLine, GpioDirection, GpioBias),
    Pin(SimLine, bool),
    PortDirection { mask: u8, direction: GpioDirection, bias: GpioBias },
    Port { mask: u8, value: u8 },
    Delay(Duration),
    /// One write strobe as seen on the data lines, a nibble on a 4-bit bus.
    Latch { rs: bool, value: u8 },
    /// A complete instruction executed by the controller.
    Command(u8),
    /// A complete data byte written to DDRAM or CGRAM.
    Data(u8),
    /// A status byte returned by a read with RS low.
    StatusRead(u8),
    /// A data byte returned by a read with RS high.
    DataRead(u8),
}

#[derive(Debug)]
struct Controller {
    eight_bit: bool,
    two_lines: bool,
    big_font: bool,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
    increment: bool,
    entry_shift: bool,
    display_shift: i8,
    cgram_mode: bool,
    address: u8,
    ddram: [u8; DDRAM_SIZE],
    cgram: [u8; CGRAM_SIZE],
    /// High nibble of a 4-bit write waiting for its low half.
    pending_nibble: Option<u8>,
    /// Low nibble of a 4-bit read waiting for the second strobe.
    pending_read: Option<u8>,
    busy_remaining: u32,
}

impl Controller {
    fn new() -> Self {
        Controller {
            eight_bit: true,
            two_lines: false,
            big_font: false,
            display_on: false,
            cursor_on: false,
            blink_on: false,
            increment: true,
            entry_shift: false,
            display_shift: 0,
            cgram_mode: false,
            address: 0,
            ddram: [b' '; DDRAM_SIZE],
            cgram: [0; CGRAM_SIZE],
            pending_nibble: None,
            pending_read: None,
            busy_remaining: 0,
        }
    }

    fn step_address(&mut self, forward: bool) {
        if self.cgram_mode {
            let address = if forward { self.address + 1 } else { self.address.wrapping_sub(1) };
            self.address = address & 0x3F;
            return;
        }

        self.address = match (self.two_lines, forward) {
            (true, true) => match self.address {
                0x27 => 0x40,
                0x67 => 0x00,
                address => (address + 1) & 0x7F,
            },
            (true, false) => match self.address {
                0x40 => 0x27,
                0x00 => 0x67,
                address => address - 1,
            },
            (false, true) => (self.address + 1) % 0x50,
            (false, false) => self.address.checked_sub(1).unwrap_or(0x4F),
        };
    }

    fn execute_command(&mut self, command: u8) {
        match command {
            c if c & 0x80 != 0 => {
                self.address = c & 0x7F;
                self.cgram_mode = false;
            }
            c if c & 0x40 != 0 => {
                self.address = c & 0x3F;
                self.cgram_mode = true;
            }
            c if c & 0x20 != 0 => {
                self.eight_bit = c & 0x10 != 0;
                self.two_lines = c & 0x08 != 0;
                self.big_font = c & 0x04 != 0;
                self.pending_nibble = None;
            }
            c if c & 0x10 != 0 => {
                let right = c & 0x04 != 0;
                if c & 0x08 != 0 {
                    self.display_shift = self.display_shift.wrapping_add(if right { 1 } else { -1 });
                } else {
                    self.step_address(right);
                }
            }
            c if c & 0x08 != 0 => {
                self.display_on = c & 0x04 != 0;
                self.cursor_on = c & 0x02 != 0;
                self.blink_on = c & 0x01 != 0;
            }
            c if c & 0x04 != 0 => {
                self.increment = c & 0x02 != 0;
                self.entry_shift = c & 0x01 != 0;
            }
            c if c & 0x02 != 0 => {
                self.address = 0;
                self.cgram_mode = false;
                self.display_shift = 0;
            }
            c if c & 0x01 != 0 => {
                self.ddram = [b' '; DDRAM_SIZE];
                self.address = 0;
                self.cgram_mode = false;
                self.display_shift = 0;
                self.increment = true;
            }
            _ => {}
        }
    }

    fn write_data(&mut self, data: u8) {
        if self.cgram_mode {
            self.cgram[self.address as usize] = data;
        } else {
            self.ddram[self.address as usize] = data;
        }
        self.step_address(self.increment);
    }

    fn read_data(&mut self) -> u8 {
        let data = if self.cgram_mode {
            self.cgram[self.address as usize]
        } else {
            self.ddram[self.address as usize]
        };
        self.step_address(self.increment);
        data
    }
}

#[derive(Debug)]
struct SimState {
    width: InterfaceWidth,
    shift: u8,
    levels: [bool; 3],
    directions: [GpioDirection; 3],
    port_out: u8,
    port_outputs: u8,
    /// Value the controller drives onto the data lines during a read, pull-ups otherwise.
    port_in: u8,
    controller: Controller,
    busy_polls: u32,
    stuck_busy: bool,
    failing_reads: bool,
    events: Vec<SimEvent>,
}

impl SimState {
    fn wiring_mask(&self) -> u8 {
        match self.width {
            InterfaceWidth::FourBit => 0x0F << self.shift,
            InterfaceWidth::EightBit => 0xFF,
        }
    }

    fn level(&self, line: SimLine) -> bool {
        self.levels[line.index()]
    }

    fn set_pin_direction(&mut self, line: SimLine, direction: GpioDirection, bias: GpioBias) {
        self.directions[line.index()] = direction;
        self.events.push(SimEvent::PinDirection(line, direction, bias));
    }

    fn write_pin(&mut self, line: SimLine, value: bool) -> GpioResult<()> {
        if self.directions[line.index()] != GpioDirection::Output {
            return Err(GpioError::InvalidArgument);
        }

        self.events.push(SimEvent::Pin(line, value));
        let previous = std::mem::replace(&mut self.levels[line.index()], value);

        match (line, previous, value) {
            (SimLine::E, false, true) if self.level(SimLine::Rw) => self.drive_read(),
            (SimLine::E, true, false) if self.level(SimLine::Rw) => self.port_in = 0xFF,
            (SimLine::E, true, false) => self.latch(),
            (SimLine::Rw, true, false) => self.controller.pending_read = None,
            _ => {}
        }
        Ok(())
    }

    fn latch(&mut self) {
        let rs = self.level(SimLine::Rs);
        let value = match self.width {
            InterfaceWidth::FourBit => (self.port_out >> self.shift) & 0x0F,
            InterfaceWidth::EightBit => self.port_out,
        };
        self.events.push(SimEvent::Latch { rs, value });

        let byte = match (self.width, self.controller.eight_bit) {
            // DB0..DB3 are not connected and read as low
            (InterfaceWidth::FourBit, true) => value << 4,
            (InterfaceWidth::FourBit, false) => match self.controller.pending_nibble.take() {
                Some(high) => (high << 4) | value,
                None => {
                    self.controller.pending_nibble = Some(value);
                    return;
                }
            },
            (InterfaceWidth::EightBit, _) => value,
        };

        if rs {
            self.events.push(SimEvent::Data(byte));
            self.controller.write_data(byte);
        } else {
            self.events.push(SimEvent::Command(byte));
            self.controller.execute_command(byte);
        }
        self.controller.busy_remaining = self.busy_polls;
    }

    fn drive_read(&mut self) {
        let value = match self.controller.pending_read.take() {
            Some(low) => low,
            None => {
                let byte = self.read_byte();
                match self.width {
                    InterfaceWidth::FourBit => {
                        self.controller.pending_read = Some(byte & 0x0F);
                        byte >> 4
                    }
                    InterfaceWidth::EightBit => byte,
                }
            }
        };

        self.port_in = match self.width {
            InterfaceWidth::FourBit => value << self.shift,
            InterfaceWidth::EightBit => value,
        };
    }

    fn read_byte(&mut self) -> u8 {
        if self.level(SimLine::Rs) {
            let data = self.controller.read_data();
            self.events.push(SimEvent::DataRead(data));
            data
        } else {
            let busy = self.stuck_busy || self.controller.busy_remaining > 0;
            self.controller.busy_remaining = self.controller.busy_remaining.saturating_sub(1);
            let flag = if busy { BUSY_FLAG } else { 0 };
            let status = flag | (self.controller.address & ADDRESS_MASK);
            self.events.push(SimEvent::StatusRead(status));
            status
        }
    }
}

/// A simulated display, see the [module docs](self).
#[derive(Clone)]
pub struct SimController {
    state: Rc<RefCell<SimState>>,
}

impl SimController {
    /// A controller with its data lines on `shift..shift + 4` of the port, or on the whole port.
    pub fn new(width: InterfaceWidth, shift: u8) -> Self {
        let shift = match width {
            InterfaceWidth::FourBit => shift,
            InterfaceWidth::EightBit => 0,
        };
        SimController {
            state: Rc::new(RefCell::new(SimState {
                width,
                shift,
                levels: [false; 3],
                directions: [GpioDirection::Input; 3],
                port_out: 0,
                port_outputs: 0,
                port_in: 0xFF,
                controller: Controller::new(),
                busy_polls: 0,
                stuck_busy: false,
                failing_reads: false,
                events: Vec::new(),
            })),
        }
    }

    pub fn four_bit(shift: u8) -> Self {
        Self::new(InterfaceWidth::FourBit, shift)
    }

    pub fn eight_bit() -> Self {
        Self::new(InterfaceWidth::EightBit, 0)
    }

    pub fn pin(&self, line: SimLine) -> SimPin {
        SimPin {
            state: self.state.clone(),
            line,
        }
    }

    pub fn port(&self) -> SimPort {
        SimPort {
            state: self.state.clone(),
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            state: self.state.clone(),
        }
    }

    /// Number of status reads that report busy after each executed transfer.
    pub fn set_busy_polls(&self, polls: u32) {
        self.state.borrow_mut().busy_polls = polls;
    }

    /// Makes every status read report busy.
    pub fn set_stuck_busy(&self, stuck: bool) {
        self.state.borrow_mut().stuck_busy = stuck;
    }

    /// Makes sampling the data lines fail, like a backend losing the line handles.
    pub fn set_failing_reads(&self, failing: bool) {
        self.state.borrow_mut().failing_reads = failing;
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.filter_events(|event| match event {
            SimEvent::Delay(duration) => Some(duration),
            _ => None,
        })
    }

    /// Instructions executed so far, in order.
    pub fn commands(&self) -> Vec<u8> {
        self.filter_events(|event| match event {
            SimEvent::Command(command) => Some(command),
            _ => None,
        })
    }

    /// Raw write strobes so far as `(rs, value)`.
    pub fn latches(&self) -> Vec<(bool, u8)> {
        self.filter_events(|event| match event {
            SimEvent::Latch { rs, value } => Some((rs, value)),
            _ => None,
        })
    }

    pub fn status_reads(&self) -> usize {
        self.filter_events(|event| match event {
            SimEvent::StatusRead(status) => Some(status),
            _ => None,
        })
        .len()
    }

    fn filter_events<T>(&self, f: impl Fn(SimEvent) -> Option<T>) -> Vec<T> {
        self.state.borrow().events.iter().copied().filter_map(f).collect()
    }

    pub fn pin_level(&self, line: SimLine) -> bool {
        self.state.borrow().level(line)
    }

    pub fn port_direction(&self) -> GpioDirection {
        let state = self.state.borrow();
        if state.port_outputs & state.wiring_mask() == state.wiring_mask() {
            GpioDirection::Output
        } else {
            GpioDirection::Input
        }
    }

    pub fn is_four_bit_mode(&self) -> bool {
        !self.state.borrow().controller.eight_bit
    }

    pub fn is_two_line_mode(&self) -> bool {
        self.state.borrow().controller.two_lines
    }

    pub fn is_display_on(&self) -> bool {
        self.state.borrow().controller.display_on
    }

    pub fn cursor_flags(&self) -> (bool, bool) {
        let state = self.state.borrow();
        (state.controller.cursor_on, state.controller.blink_on)
    }

    /// Entry mode as `(increment, shift)`.
    pub fn entry_mode(&self) -> (bool, bool) {
        let state = self.state.borrow();
        (state.controller.increment, state.controller.entry_shift)
    }

    pub fn address(&self) -> u8 {
        self.state.borrow().controller.address
    }

    pub fn is_cgram_mode(&self) -> bool {
        self.state.borrow().controller.cgram_mode
    }

    pub fn ddram(&self, address: u8) -> u8 {
        self.state.borrow().controller.ddram[(address & 0x7F) as usize]
    }

    /// The 8 bytes stored for a custom glyph.
    pub fn glyph(&self, slot: u8) -> [u8; 8] {
        let start = (slot & 0x07) as usize * 8;
        let mut glyph = [0; 8];
        glyph.copy_from_slice(&self.state.borrow().controller.cgram[start..start + 8]);
        glyph
    }

    /// The visible characters of `row`, ignoring any display shift.
    pub fn row_text(&self, geometry: DisplayGeometry, row: u8) -> LcdResult<String> {
        let base = geometry.row_base_address(row)?;
        let state = self.state.borrow();
        Ok((0..geometry.cols())
            .map(|col| state.controller.ddram[(base + col) as usize & 0x7F] as char)
            .collect())
    }

    pub fn screen(&self, geometry: DisplayGeometry) -> LcdResult<Vec<String>> {
        (0..geometry.rows()).map(|row| self.row_text(geometry, row)).collect()
    }
}

impl Debug for SimController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        write!(f, "SimController({}-bit, {} events)", state.width.bits(), state.events.len())
    }
}

pub struct SimPin {
    state: Rc<RefCell<SimState>>,
    line: SimLine,
}

impl Debug for SimPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimPin({:?})", self.line)
    }
}

impl GpioPin for SimPin {
    fn set_direction(&mut self, direction: GpioDirection, bias: GpioBias) -> GpioResult<()> {
        self.state.borrow_mut().set_pin_direction(self.line, direction, bias);
        Ok(())
    }

    fn direction(&self) -> GpioDirection {
        self.state.borrow().directions[self.line.index()]
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        self.state.borrow_mut().write_pin(self.line, value)
    }

    fn read(&self) -> GpioResult<bool> {
        Ok(self.state.borrow().level(self.line))
    }
}

pub struct SimPort {
    state: Rc<RefCell<SimState>>,
}

impl Debug for SimPort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimPort({:#04x})", self.state.borrow().wiring_mask())
    }
}

impl GpioPort for SimPort {
    fn set_direction(&mut self, mask: u8, direction: GpioDirection, bias: GpioBias) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();
        let mask = mask & state.wiring_mask();
        match direction {
            GpioDirection::Output => state.port_outputs |= mask,
            GpioDirection::Input => state.port_outputs &= !mask,
        }
        state.events.push(SimEvent::PortDirection { mask, direction, bias });
        Ok(())
    }

    fn write_masked(&mut self, mask: u8, value: u8) -> GpioResult<()> {
        let mut state = self.state.borrow_mut();
        let mask = mask & state.wiring_mask();
        if mask & !state.port_outputs != 0 {
            return Err(GpioError::InvalidArgument);
        }
        state.port_out = (state.port_out & !mask) | (value & mask);
        state.events.push(SimEvent::Port { mask, value: value & mask });
        Ok(())
    }

    fn read_masked(&self, mask: u8) -> GpioResult<u8> {
        let state = self.state.borrow();
        if state.failing_reads {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        let value = (state.port_out & state.port_outputs) | (state.port_in & !state.port_outputs);
        Ok(value & mask & state.wiring_mask())
    }
}

pub struct SimDelay {
    state: Rc<RefCell<SimState>>,
}

impl Debug for SimDelay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDelay")
    }
}

impl Delay for SimDelay {
    fn delay(&mut self, duration: Duration) {
        self.state.borrow_mut().events.push(SimEvent::Delay(duration));
    }
}
