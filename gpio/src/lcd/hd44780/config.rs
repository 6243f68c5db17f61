use std::time::Duration;

/// Width of the data bus between the host and the controller.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InterfaceWidth {
    /// Only DB4..DB7 are connected, every byte is sent as two nibbles.
    #[default]
    FourBit,
    EightBit,
}

impl InterfaceWidth {
    pub fn bits(self) -> u8 {
        match self {
            InterfaceWidth::FourBit => 4,
            InterfaceWidth::EightBit => 8,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    #[default]
    Right,
}

/// Delays used while talking to the controller.
///
/// The defaults are the datasheet values for a 270 kHz oscillator with some margin added.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Timing {
    /// Wait after power-on before the first instruction.
    pub power_on: Duration,
    /// Waits after each of the three synchronization patterns.
    pub init_first: Duration,
    pub init_second: Duration,
    pub init_third: Duration,
    /// Wait after switching into 4-bit mode.
    pub init_four_bit: Duration,
    /// Added after every initialization instruction when the busy flag can't be read.
    pub init_step_extra: Duration,
    /// Wait between turning the display off and clearing it during initialization.
    pub display_off_settle: Duration,
    /// Execution time of regular instructions and data writes.
    pub exec: Duration,
    /// Execution time of clear and home.
    pub long_exec: Duration,
    /// Width of the enable pulse, and of the low time after it.
    pub enable_pulse: Duration,
    /// Extra wait between busy flag polls.
    pub busy_loop_extra: Duration,
    /// Gives up polling the busy flag after this long. `None` polls forever.
    pub busy_timeout: Option<Duration>,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            power_on: Duration::from_millis(18 + 3),
            init_first: Duration::from_millis(5),
            init_second: Duration::from_micros(120),
            init_third: Duration::from_micros(50),
            init_four_bit: Duration::from_micros(50),
            init_step_extra: Duration::from_micros(10),
            display_off_settle: Duration::from_micros(1500),
            exec: Duration::from_micros(50),
            long_exec: Duration::from_micros(1760),
            enable_pulse: Duration::from_nanos(800),
            busy_loop_extra: Duration::ZERO,
            busy_timeout: None,
        }
    }
}

/// Settings applied by the initialization sequence.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LcdConfig {
    /// Direction the address counter moves after each data access.
    pub cursor_direction: CursorDirection,
    /// Shift the display instead of moving the cursor.
    pub display_shift: bool,
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink_on: bool,
    /// Use the 5x10 dot font. Only honored by one line displays.
    pub big_font: bool,
    pub timing: Timing,
}

impl Default for LcdConfig {
    fn default() -> Self {
        LcdConfig {
            cursor_direction: CursorDirection::Right,
            display_shift: false,
            display_on: true,
            cursor_on: false,
            blink_on: false,
            big_font: false,
            timing: Timing::default(),
        }
    }
}
