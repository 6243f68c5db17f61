pub mod bus;
pub mod gpio;

use crate::lcd::hd44780::command::*;
use crate::lcd::hd44780::config::{CursorDirection, InterfaceWidth};
use crate::lcd::hd44780::geometry::DisplayGeometry;
use crate::lcd::hd44780::LcdResult;
use std::fmt::Debug;

pub trait HD44780Driver: Debug {
    /// Geometry of the connected display.
    fn geometry(&self) -> DisplayGeometry;

    /// Sends a raw instruction, masking `args` to the bits the instruction takes.
    fn instruction(&mut self, instruction: Instruction, args: u8) -> LcdResult<()> {
        let command = instruction.encode(args);
        if instruction.is_long() {
            self.send_long_command(command)
        } else {
            self.send_command(command)
        }
    }

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) -> LcdResult<()> {
        self.instruction(Instruction::Clear, 0)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn return_home(&mut self) -> LcdResult<()> {
        self.instruction(Instruction::Home, 0)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> LcdResult<()> {
        let mut args = 0;
        if cursor_direction == CursorDirection::Right {
            args |= ID_INCREMENT;
        }
        if shift {
            args |= S_SHIFT;
        }
        self.instruction(Instruction::EntryMode, args)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> LcdResult<()> {
        let mut args = 0;
        if display_on {
            args |= D_DISPLAY_ON;
        }
        if cursor_on {
            args |= C_CURSOR_ON;
        }
        if blink_on {
            args |= B_BLINK_ON;
        }
        self.instruction(Instruction::DisplayControl, args)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> LcdResult<()> {
        let mut args = 0;
        if display_shift {
            args |= SC_DISPLAY;
        }
        if direction == CursorDirection::Right {
            args |= RL_RIGHT;
        }
        self.instruction(Instruction::CursorShift, args)
    }

    /// Sets the interface width, line count and font.
    fn function_set(&mut self, width: InterfaceWidth, two_lines: bool, big_font: bool) -> LcdResult<()> {
        let mut args = 0;
        if width == InterfaceWidth::EightBit {
            args |= DL_8BIT;
        }
        if two_lines {
            args |= N_TWO_LINES;
        }
        if big_font {
            args |= F_BIG_FONT;
        }
        self.instruction(Instruction::FunctionSet, args)
    }

    /// Sets the CGRAM address. Only the low 6 bits are used.
    fn set_cgram_address(&mut self, address: u8) -> LcdResult<()> {
        self.instruction(Instruction::CgramAddress, address)
    }

    /// Sets the DDRAM address. Only the low 7 bits are used.
    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        self.instruction(Instruction::DdramAddress, address)
    }

    /// Moves the cursor to `col` of `row`.
    ///
    /// The column is not checked, so it can point into the hidden part of a DDRAM line or run
    /// into the next row of a four row display.
    fn set_position(&mut self, row: u8, col: u8) -> LcdResult<()> {
        let base = self.geometry().row_base_address(row)?;
        self.set_ddram_address(base.wrapping_add(col))
    }

    /// Writes one character code at the cursor.
    fn write_byte(&mut self, byte: u8) -> LcdResult<()> {
        self.send_data(byte)
    }

    // Low-level commands
    // These raw commands are used by the high-level functions above.
    // They are not meant to be used directly, but implemented by the driver implementation.

    /// Sends a command to the HD44780 controller, then waits for the regular execution time.
    fn send_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends a command that needs the long execution time, i.e. clear or home.
    fn send_long_command(&mut self, command: u8) -> LcdResult<()>;

    /// Sends data to the HD44780 controller.
    fn send_data(&mut self, data: u8) -> LcdResult<()>;
}

/// Read access to the controller, for drivers with the RW line connected.
pub trait HD44780Reader: HD44780Driver {
    /// Waits until the busy flag clears, then returns the address counter.
    fn read_busy_and_address(&mut self) -> LcdResult<u8>;

    /// Reads the byte at the address counter from DDRAM or CGRAM.
    fn read_data(&mut self) -> LcdResult<u8>;
}
