//! HD44780 instruction encoding.
//!
//! Every instruction is a fixed opcode bit followed by a field of argument bits below it. The
//! argument width grows by one bit per instruction, from none for [Instruction::Clear] to 7 for
//! [Instruction::DdramAddress]. Arguments are always masked to that width, so stray high bits are
//! dropped rather than turning the byte into a different instruction.

/// Entry mode: increment the address counter (move right) after each access.
pub const ID_INCREMENT: u8 = 0b0000_0010;
/// Entry mode: shift the display along with the cursor.
pub const S_SHIFT: u8 = 0b0000_0001;

/// Display control: display on.
pub const D_DISPLAY_ON: u8 = 0b0000_0100;
/// Display control: underline cursor on.
pub const C_CURSOR_ON: u8 = 0b0000_0010;
/// Display control: blinking block cursor on.
pub const B_BLINK_ON: u8 = 0b0000_0001;

/// Cursor/shift: shift the whole display instead of moving the cursor.
pub const SC_DISPLAY: u8 = 0b0000_1000;
/// Cursor/shift: move or shift to the right.
pub const RL_RIGHT: u8 = 0b0000_0100;

/// Function set: 8-bit interface.
pub const DL_8BIT: u8 = 0b0001_0000;
/// Function set: two line (and four line) displays.
pub const N_TWO_LINES: u8 = 0b0000_1000;
/// Function set: 5x10 dot font.
pub const F_BIG_FONT: u8 = 0b0000_0100;

/// Busy flag bit of the status byte.
pub const BUSY_FLAG: u8 = 0b1000_0000;
/// Address counter bits of the status byte.
pub const ADDRESS_MASK: u8 = 0b0111_1111;

/// Function set for 8-bit mode, sent three times to synchronize an 8-bit bus.
pub const INIT_8BIT: u8 = 0b0011_0000;
/// Upper nibble of [INIT_8BIT], sent three times to synchronize a 4-bit bus.
pub const INIT_4BIT: u8 = 0b0011;
/// Upper nibble of a 4-bit function set, switches the controller into 4-bit mode.
pub const INIT_4BIT_SWITCH: u8 = 0b0010;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    /// Fills DDRAM with spaces and returns home.
    Clear,
    /// Resets the address counter and the display shift.
    Home,
    EntryMode,
    DisplayControl,
    CursorShift,
    FunctionSet,
    CgramAddress,
    DdramAddress,
}

impl Instruction {
    /// The opcode bit identifying the instruction.
    pub const fn opcode(self) -> u8 {
        match self {
            Instruction::Clear => 0b0000_0001,
            Instruction::Home => 0b0000_0010,
            Instruction::EntryMode => 0b0000_0100,
            Instruction::DisplayControl => 0b0000_1000,
            Instruction::CursorShift => 0b0001_0000,
            Instruction::FunctionSet => 0b0010_0000,
            Instruction::CgramAddress => 0b0100_0000,
            Instruction::DdramAddress => 0b1000_0000,
        }
    }

    /// The bits available for arguments.
    ///
    /// `Home` keeps a single don't-care bit and `Clear` has none.
    pub const fn mask(self) -> u8 {
        match self {
            Instruction::Clear => 0,
            _ => self.opcode() - 1,
        }
    }

    /// Builds the instruction byte, dropping argument bits outside of [Self::mask].
    pub const fn encode(self, args: u8) -> u8 {
        self.opcode() | (args & self.mask())
    }

    /// Whether the instruction needs the long execution time (1.52 ms on a 270 kHz oscillator).
    pub const fn is_long(self) -> bool {
        matches!(self, Instruction::Clear | Instruction::Home)
    }
}
