mod common;

use charlcd_gpio::lcd::hd44780::sim::{SimEvent, SimLine};
use charlcd_gpio::lcd::hd44780::{
    DisplayGeometry, HD44780Driver, HD44780Reader, LcdConfig, LcdError, TextExt, Timing,
};
use charlcd_gpio::{GpioBias, GpioDirection, GpioError};
use common::Rig;
use std::io::ErrorKind;
use std::time::Duration;

#[test]
fn write_only_driver_never_touches_rw() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let mut lcd = rig.driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();
    lcd.write_line("no reads", 0, 0).unwrap();

    assert!(!lcd.is_read_enabled());
    assert!(sim.events().iter().all(|event| !matches!(
        event,
        SimEvent::Pin(SimLine::Rw, _) | SimEvent::PinDirection(SimLine::Rw, ..) | SimEvent::StatusRead(_)
    )));
}

#[test]
fn status_read_switches_the_bus_around_the_strobes() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();
    lcd.set_position(1, 2).unwrap();
    sim.clear_events();

    assert_eq!(lcd.read_busy_and_address(), Ok(0x42));

    let sequence: Vec<SimEvent> = sim
        .events()
        .into_iter()
        .filter(|event| match event {
            SimEvent::Pin(line, _) => *line != SimLine::E,
            SimEvent::PortDirection { .. } | SimEvent::StatusRead(_) => true,
            _ => false,
        })
        .collect();
    assert_eq!(
        sequence,
        vec![
            SimEvent::PortDirection { mask: 0xF0, direction: GpioDirection::Input, bias: GpioBias::PullUp },
            SimEvent::Pin(SimLine::Rs, false),
            SimEvent::Pin(SimLine::Rw, true),
            SimEvent::StatusRead(0x42),
            SimEvent::Pin(SimLine::Rw, false),
            SimEvent::PortDirection { mask: 0xF0, direction: GpioDirection::Output, bias: GpioBias::None },
            SimEvent::Pin(SimLine::Rs, true),
        ]
    );

    let strobes = sim
        .events()
        .into_iter()
        .filter(|event| *event == SimEvent::Pin(SimLine::E, true))
        .count();
    assert_eq!(strobes, 2);
}

#[test]
fn failed_read_leaves_the_bus_writable() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();
    let broken = Err(LcdError::Gpio(GpioError::Io(ErrorKind::BrokenPipe)));

    sim.set_failing_reads(true);
    assert_eq!(lcd.read_busy_and_address(), broken);
    assert!(sim.pin_level(SimLine::Rs));
    assert!(!sim.pin_level(SimLine::Rw));
    assert!(!sim.pin_level(SimLine::E));
    assert_eq!(sim.port_direction(), GpioDirection::Output);

    assert_eq!(lcd.read_data(), broken);
    assert!(!sim.pin_level(SimLine::Rw));
    assert!(!sim.pin_level(SimLine::E));
    assert_eq!(sim.port_direction(), GpioDirection::Output);

    sim.set_failing_reads(false);
    lcd.write_line("still here", 0, 0).unwrap();
    assert_eq!(sim.row_text(DisplayGeometry::Lcd16x2, 0).unwrap(), "still here      ");
}

#[test]
fn address_counter_follows_the_cursor() {
    let mut rig = Rig::four_bit(4);
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd20x4, LcdConfig::default()).unwrap();

    lcd.set_position(1, 5).unwrap();
    assert_eq!(lcd.read_busy_and_address(), Ok(0x45));

    lcd.write_stream("abc").unwrap();
    assert_eq!(lcd.read_busy_and_address(), Ok(0x48));

    lcd.set_position(3, 0).unwrap();
    assert_eq!(lcd.read_busy_and_address(), Ok(0x54));
}

#[test]
fn text_reads_back_from_ddram() {
    let mut rig = Rig::eight_bit();
    let sim = rig.sim.clone();
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();

    lcd.write_line("hello", 1, 0).unwrap();
    lcd.set_position(1, 0).unwrap();

    let mut read = Vec::new();
    for _ in 0..5 {
        read.push(lcd.read_data().unwrap());
    }
    assert_eq!(read, b"hello");
    assert!(sim.pin_level(SimLine::Rs));
    assert!(!sim.pin_level(SimLine::Rw));
    assert_eq!(sim.port_direction(), GpioDirection::Output);
}

#[test]
fn glyph_round_trip() {
    let heart = [0x00, 0x0A, 0x1F, 0x1F, 0x1F, 0x0E, 0x04, 0x00];
    let mut rig = Rig::four_bit(4);
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, LcdConfig::default()).unwrap();

    lcd.write_glyph(5, &heart).unwrap();
    lcd.set_cgram_address(5 * 8).unwrap();

    let mut read = [0; 8];
    for line in read.iter_mut() {
        *line = lcd.read_data().unwrap();
    }
    assert_eq!(read, heart);
}

#[test]
fn busy_timeout_gives_up_and_restores_the_bus() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let config = LcdConfig {
        timing: Timing {
            busy_timeout: Some(Duration::from_millis(2)),
            ..Timing::default()
        },
        ..LcdConfig::default()
    };
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, config).unwrap();

    sim.set_stuck_busy(true);
    assert_eq!(lcd.clear_display(), Err(LcdError::BusyTimeout));

    assert!(sim.pin_level(SimLine::Rs));
    assert!(!sim.pin_level(SimLine::Rw));
    assert_eq!(sim.port_direction(), GpioDirection::Output);

    sim.set_stuck_busy(false);
    assert_eq!(lcd.read_busy_and_address(), Ok(0x00));
}

#[test]
fn busy_loop_waits_between_polls() {
    let mut rig = Rig::eight_bit();
    let sim = rig.sim.clone();
    let config = LcdConfig {
        timing: Timing {
            busy_loop_extra: Duration::from_micros(7),
            ..Timing::default()
        },
        ..LcdConfig::default()
    };
    let mut lcd = rig.reading_driver(DisplayGeometry::Lcd16x2, config).unwrap();
    sim.set_busy_polls(3);
    sim.clear_events();

    lcd.return_home().unwrap();

    assert_eq!(sim.status_reads(), 4);
    let extra = sim
        .delays()
        .into_iter()
        .filter(|&delay| delay == Duration::from_micros(7))
        .count();
    assert_eq!(extra, 3);
}
