mod config;

use std::env::var;
use std::thread;
use std::time::Duration;
use dotenv::dotenv;
use log::{debug, info, warn};
use sysinfo::System;
use time::OffsetDateTime;
use charlcd_gpio::delay::StdDelay;
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::sim::{SimController, SimLine};
use charlcd_gpio::lcd::hd44780::{DataBus, GpioHD44780Driver, HD44780Driver, InterfaceWidth, TextExt};
use charlcd_gpio::GpioDriver;
use crate::config::Config;

const BELL: [u8; 8] = [0x04, 0x0E, 0x0E, 0x0E, 0x1F, 0x00, 0x04, 0x00];
const CLOCK: [u8; 8] = [0x00, 0x0E, 0x15, 0x17, 0x11, 0x0E, 0x00, 0x00];

/// Ticks of the clock shown when running against the simulator.
const SIMULATED_TICKS: u32 = 3;

fn parse_pin_bus<const N: usize>(pin_str: &str) -> eyre::Result<[usize; N]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Expected {} data pins", N))
}

fn clock_line() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| {
        warn!("Local offset unavailable, showing UTC");
        OffsetDateTime::now_utc()
    });
    format!(
        "\x01 {:02}:{:02}:{:02} {:02}.{:02}",
        now.hour(),
        now.minute(),
        now.second(),
        now.day(),
        u8::from(now.month()),
    )
}

/// Runs the quick start screens, then keeps the time updated on the last row.
///
/// `show` is called after every screen update.
fn run(
    lcd: &mut dyn HD44780Driver,
    ticks: Option<u32>,
    show: &dyn Fn() -> eyre::Result<()>,
) -> eyre::Result<()> {
    let geometry = lcd.geometry();

    lcd.write_stream("Initialization...")?;
    show()?;
    thread::sleep(Duration::from_millis(1500));

    let lines = [
        ("Quick start example:", 0),
        ("line 2", 4),
        ("line 3", 4),
        ("It's OK!", 10),
    ];
    for (row, (text, start_col)) in (0..geometry.rows()).zip(lines) {
        lcd.write_line(text, row, start_col)?;
    }
    show()?;

    lcd.write_glyph(0, &BELL)?;
    lcd.write_glyph(1, &CLOCK)?;

    let last_row = geometry.rows() - 1;
    let mut tick = 0;
    while ticks.is_none_or(|ticks| tick < ticks) {
        thread::sleep(Duration::from_secs(1));
        lcd.write_line(&clock_line(), last_row, 0)?;
        show()?;
        tick += 1;
    }

    lcd.write_line("\x00 Bye!", last_row, 0)?;
    show()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!(
        "Hostname {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!("Architecture {}", System::cpu_arch());

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load()? {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };
    debug!("{:?}", config);

    let simulate = var("CHARLCD_SIMULATE").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if simulate {
        run_simulated(&config)
    } else {
        run_gpiod(&config)
    }
}

fn run_simulated(config: &Config) -> eyre::Result<()> {
    info!("Running against a simulated {} display", config.geometry);

    let sim = SimController::new(config.interface, config.data_shift);
    let mut pin_e = sim.pin(SimLine::E);
    let mut pin_rw = sim.pin(SimLine::Rw);
    let mut pin_rs = sim.pin(SimLine::Rs);
    let mut port = sim.port();
    let mut delay = sim.delay();

    let data_bus = match config.interface {
        InterfaceWidth::FourBit => DataBus::four_bit(&mut port, config.data_shift)?,
        InterfaceWidth::EightBit => DataBus::eight_bit(&mut port),
    };
    let mut lcd = GpioHD44780Driver::with_rw(
        &mut pin_e,
        &mut pin_rw,
        &mut pin_rs,
        data_bus,
        config.geometry,
        config.lcd_config(),
        &mut delay,
    )?;
    debug!("{:?} initialized.", lcd);

    let show = || -> eyre::Result<()> {
        info!("+{}+", "-".repeat(config.geometry.cols() as usize));
        for line in sim.screen(config.geometry)? {
            let line: String = line.chars().map(|c| if c < ' ' { '*' } else { c }).collect();
            info!("|{}|", line);
        }
        info!("+{}+", "-".repeat(config.geometry.cols() as usize));
        Ok(())
    };

    run(&mut lcd, Some(SIMULATED_TICKS), &show)
}

fn run_gpiod(config: &Config) -> eyre::Result<()> {
    // Get pin numbers from env
    let chip = var("CHARLCD_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let lcd_e_pin_no: usize = var("CHARLCD_PIN_E")?.parse()?;
    let lcd_rw_pin_no: Option<usize> = var("CHARLCD_PIN_RW").ok().map(|s| s.parse()).transpose()?;
    let lcd_rs_pin_no: usize = var("CHARLCD_PIN_RS")?.parse()?;
    let lcd_data_pins = var("CHARLCD_PINS_DATA")?;

    info!("LCD @ {} E: {}, RW: {:?}, RS: {}, Data: {}",
        chip, lcd_e_pin_no, lcd_rw_pin_no, lcd_rs_pin_no, lcd_data_pins);

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::open(&chip)?;
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let mut lcd_e_pin = gpio.get_pin(lcd_e_pin_no)?;
    let mut lcd_rw_pin = lcd_rw_pin_no.map(|no| gpio.get_pin(no)).transpose()?;
    let mut lcd_rs_pin = gpio.get_pin(lcd_rs_pin_no)?;
    let mut lcd_data_port = match config.interface {
        InterfaceWidth::FourBit => {
            gpio.get_port(parse_pin_bus::<4>(&lcd_data_pins)?, config.data_shift)?
        }
        InterfaceWidth::EightBit => gpio.get_port(parse_pin_bus::<8>(&lcd_data_pins)?, 0)?,
    };
    let data_bus = match config.interface {
        InterfaceWidth::FourBit => DataBus::four_bit(lcd_data_port.as_mut(), config.data_shift)?,
        InterfaceWidth::EightBit => DataBus::eight_bit(lcd_data_port.as_mut()),
    };
    let mut delay = StdDelay::new();

    let show = || -> eyre::Result<()> { Ok(()) };
    match lcd_rw_pin.as_mut() {
        Some(lcd_rw_pin) => {
            let mut lcd = GpioHD44780Driver::with_rw(
                lcd_e_pin.as_mut(),
                lcd_rw_pin.as_mut(),
                lcd_rs_pin.as_mut(),
                data_bus,
                config.geometry,
                config.lcd_config(),
                &mut delay,
            )?;
            debug!("{:?} initialized.", lcd);
            info!("Starting main loop...");
            run(&mut lcd, None, &show)
        }
        None => {
            let mut lcd = GpioHD44780Driver::new(
                lcd_e_pin.as_mut(),
                lcd_rs_pin.as_mut(),
                data_bus,
                config.geometry,
                config.lcd_config(),
                &mut delay,
            )?;
            debug!("{:?} initialized.", lcd);
            info!("Starting main loop...");
            run(&mut lcd, None, &show)
        }
    }
}
