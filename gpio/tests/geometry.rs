mod common;

use charlcd_gpio::lcd::hd44780::geometry::fixed;
use charlcd_gpio::lcd::hd44780::{DisplayGeometry, HD44780Driver, LcdConfig, LcdError};
use common::Rig;

#[test]
fn row_bases_match_the_controller_layout() {
    let table: [(DisplayGeometry, u8, u8, &[u8]); 8] = [
        (DisplayGeometry::Lcd8x1, 1, 8, &[0x00]),
        (DisplayGeometry::Lcd16x1, 1, 16, &[0x00]),
        (DisplayGeometry::Lcd16x2, 2, 16, &[0x00, 0x40]),
        (DisplayGeometry::Lcd20x2, 2, 20, &[0x00, 0x40]),
        (DisplayGeometry::Lcd32x2, 2, 32, &[0x00, 0x40]),
        (DisplayGeometry::Lcd40x2, 2, 40, &[0x00, 0x40]),
        (DisplayGeometry::Lcd16x4, 4, 16, &[0x00, 0x40, 0x10, 0x50]),
        (DisplayGeometry::Lcd20x4, 4, 20, &[0x00, 0x40, 0x14, 0x54]),
    ];

    for (geometry, rows, cols, bases) in table {
        assert_eq!(geometry.rows(), rows, "{geometry}");
        assert_eq!(geometry.cols(), cols, "{geometry}");
        for (row, &base) in bases.iter().enumerate() {
            assert_eq!(geometry.row_base_address(row as u8), Ok(base), "{geometry} row {row}");
        }
        assert_eq!(
            geometry.row_base_address(rows),
            Err(LcdError::InvalidRow { geometry, row: rows })
        );
    }
}

#[test]
fn two_line_mode_for_every_multi_row_display() {
    assert!(!DisplayGeometry::Lcd8x1.two_line_class());
    assert!(!DisplayGeometry::Lcd16x1.two_line_class());
    assert!(DisplayGeometry::Lcd16x2.two_line_class());
    assert!(DisplayGeometry::Lcd20x4.two_line_class());
}

#[test]
fn forty_by_four_is_unsupported() {
    assert!(!DisplayGeometry::Lcd40x4.is_supported());
    assert_eq!(
        DisplayGeometry::Lcd40x4.row_base_address(0),
        Err(LcdError::UnsupportedGeometry(DisplayGeometry::Lcd40x4))
    );
}

#[test]
fn set_position_does_not_check_columns() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let mut lcd = rig.driver(DisplayGeometry::Lcd20x4, LcdConfig::default()).unwrap();
    sim.clear_events();

    lcd.set_position(0, 25).unwrap();
    lcd.set_position(2, 3).unwrap();

    assert_eq!(sim.commands(), vec![0x80 | 25, 0x80 | 0x17]);
    assert_eq!(
        lcd.set_position(4, 0),
        Err(LcdError::InvalidRow { geometry: DisplayGeometry::Lcd20x4, row: 4 })
    );
}

#[test]
fn fixed_layout_behaves_like_the_runtime_one() {
    let mut rig = Rig::four_bit(4);
    let sim = rig.sim.clone();
    let mut lcd = rig.driver(fixed::Lcd16x4, LcdConfig::default()).unwrap();
    sim.clear_events();

    assert_eq!(lcd.geometry(), DisplayGeometry::Lcd16x4);
    lcd.set_position(3, 1).unwrap();
    assert_eq!(sim.commands(), vec![0xD1]);
}
