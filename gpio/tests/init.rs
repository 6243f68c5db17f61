mod common;

use charlcd_gpio::lcd::hd44780::sim::{SimController, SimEvent, SimLine};
use charlcd_gpio::lcd::hd44780::{CursorDirection, DataBus, DisplayGeometry, LcdConfig, LcdError};
use charlcd_gpio::GpioDirection;
use common::{ms, us, waits, Rig};

#[test]
fn four_bit_without_read_uses_fixed_waits() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    rig.driver(DisplayGeometry::Lcd20x4, LcdConfig::default()).unwrap();

    assert_eq!(
        waits(&sim),
        vec![
            ms(21),
            ms(5),
            us(120),
            us(50),
            us(50),
            // function set
            us(50),
            us(10),
            // display off
            us(50),
            us(10),
            us(1500),
            // clear
            us(1760),
            us(10),
            // entry mode
            us(50),
            us(10),
            // display on
            us(50),
        ]
    );
    assert_eq!(sim.status_reads(), 0);
}

#[test]
fn four_bit_synchronizes_with_raw_nibbles() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    rig.driver(DisplayGeometry::Lcd20x4, LcdConfig::default()).unwrap();

    let latches = sim.latches();
    assert_eq!(&latches[..4], &[(false, 0x3), (false, 0x3), (false, 0x3), (false, 0x2)]);
    // Everything after that is a full byte split into two nibbles
    assert_eq!(latches.len(), 4 + 5 * 2);
    assert_eq!(sim.commands(), vec![0x30, 0x30, 0x30, 0x20, 0x28, 0x08, 0x01, 0x06, 0x0C]);
    assert!(sim.is_four_bit_mode());
    assert!(sim.is_two_line_mode());
    assert!(sim.is_display_on());
}

#[test]
fn eight_bit_skips_the_mode_switch() {
    let mut rig = Rig::eight_bit();
    let sim = rig.sim.clone();
    rig.driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();

    assert_eq!(&sim.latches()[..3], &[(false, 0x30), (false, 0x30), (false, 0x30)]);
    assert_eq!(sim.commands(), vec![0x30, 0x30, 0x30, 0x38, 0x08, 0x01, 0x06, 0x0C]);
    assert_eq!(&waits(&sim)[..5], &[ms(21), ms(5), us(120), us(50), us(50)]);
    assert!(!sim.is_four_bit_mode());
}

#[test]
fn data_nibble_can_sit_low_on_the_port() {
    let mut rig = Rig::four_bit(0);
    let sim = rig.sim.clone();
    rig.driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();

    assert_eq!(sim.commands(), vec![0x30, 0x30, 0x30, 0x20, 0x28, 0x08, 0x01, 0x06, 0x0C]);
}

#[test]
fn read_enabled_polls_after_every_step() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    rig.reading_driver(DisplayGeometry::Lcd20x4, LcdConfig::default()).unwrap();

    let trace: Vec<String> = sim
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SimEvent::Command(command) => Some(format!("{command:02x}")),
            SimEvent::StatusRead(_) => Some("poll".to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(
        trace,
        vec![
            "30", "30", "30", "20", "28", "poll", "08", "poll", "01", "poll", "06", "poll", "0c", "poll",
        ]
    );

    // No fixed execution waits, only the synchronization and the settle before clear
    assert_eq!(waits(&sim), vec![ms(21), ms(5), us(120), us(50), us(50), us(1500)]);

    assert!(sim.pin_level(SimLine::Rs));
    assert!(!sim.pin_level(SimLine::Rw));
    assert!(!sim.pin_level(SimLine::E));
    assert_eq!(sim.port_direction(), GpioDirection::Output);
}

#[test]
fn busy_controller_is_polled_until_ready() {
    let mut rig = Rig::eight_bit();
    let sim = rig.sim.clone();
    sim.set_busy_polls(2);
    rig.reading_driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();

    assert_eq!(sim.status_reads(), 5 * 3);
}

#[test]
fn config_flags_are_applied() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let config = LcdConfig {
        cursor_direction: CursorDirection::Left,
        display_shift: true,
        cursor_on: true,
        blink_on: true,
        ..LcdConfig::default()
    };
    rig.driver(DisplayGeometry::Lcd16x2, config).unwrap();

    assert_eq!(sim.commands()[7..], [0x05, 0x0F]);
    assert_eq!(sim.entry_mode(), (false, true));
    assert_eq!(sim.cursor_flags(), (true, true));
}

#[test]
fn display_stays_off_when_requested() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let config = LcdConfig {
        display_on: false,
        ..LcdConfig::default()
    };
    rig.driver(DisplayGeometry::Lcd16x2, config).unwrap();

    assert_eq!(sim.commands().last(), Some(&0x06));
    assert!(!sim.is_display_on());
}

#[test]
fn one_line_display_can_use_big_font() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let config = LcdConfig {
        big_font: true,
        ..LcdConfig::default()
    };
    rig.driver(DisplayGeometry::Lcd16x1, config).unwrap();

    assert_eq!(sim.commands()[4], 0x24);
    assert!(!sim.is_two_line_mode());
}

#[test]
fn unsupported_geometry_is_rejected_before_touching_pins() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let result = rig.driver(DisplayGeometry::Lcd40x4, LcdConfig::default());

    assert_eq!(
        result.err(),
        Some(LcdError::UnsupportedGeometry(DisplayGeometry::Lcd40x4))
    );
    assert!(sim.events().is_empty());
}

#[test]
fn data_shift_must_fit_the_port() {
    let sim = SimController::four_bit(4);
    let mut port = sim.port();
    assert_eq!(DataBus::four_bit(&mut port, 5).err(), Some(LcdError::InvalidDataShift(5)));
    assert!(DataBus::four_bit(&mut port, 4).is_ok());
}
