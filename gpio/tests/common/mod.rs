#![allow(dead_code)]

use charlcd_gpio::lcd::hd44780::sim::{SimController, SimDelay, SimLine, SimPin, SimPort};
use charlcd_gpio::lcd::hd44780::{
    DataBus, GpioHD44780Driver, InterfaceWidth, LcdConfig, LcdResult, Layout, ReadWrite,
};
use std::time::Duration;

/// The pins of one simulated display.
pub struct Rig {
    pub sim: SimController,
    width: InterfaceWidth,
    shift: u8,
    e: SimPin,
    rs: SimPin,
    rw: SimPin,
    port: SimPort,
    delay: SimDelay,
}

impl Rig {
    pub fn new(width: InterfaceWidth, shift: u8) -> Self {
        let sim = SimController::new(width, shift);
        Rig {
            width,
            shift,
            e: sim.pin(SimLine::E),
            rs: sim.pin(SimLine::Rs),
            rw: sim.pin(SimLine::Rw),
            port: sim.port(),
            delay: sim.delay(),
            sim,
        }
    }

    pub fn four_bit(shift: u8) -> Self {
        Self::new(InterfaceWidth::FourBit, shift)
    }

    pub fn eight_bit() -> Self {
        Self::new(InterfaceWidth::EightBit, 0)
    }

    /// A driver with RW left unconnected.
    pub fn driver<L: Layout>(
        &mut self,
        layout: L,
        config: LcdConfig,
    ) -> LcdResult<GpioHD44780Driver<'_, L>> {
        let data_bus = data_bus(&mut self.port, self.width, self.shift)?;
        GpioHD44780Driver::new(&mut self.e, &mut self.rs, data_bus, layout, config, &mut self.delay)
    }

    /// A driver that polls the busy flag and can read back.
    pub fn reading_driver<L: Layout>(
        &mut self,
        layout: L,
        config: LcdConfig,
    ) -> LcdResult<GpioHD44780Driver<'_, L, ReadWrite>> {
        let data_bus = data_bus(&mut self.port, self.width, self.shift)?;
        GpioHD44780Driver::with_rw(
            &mut self.e,
            &mut self.rw,
            &mut self.rs,
            data_bus,
            layout,
            config,
            &mut self.delay,
        )
    }
}

fn data_bus(port: &mut SimPort, width: InterfaceWidth, shift: u8) -> LcdResult<DataBus<'_>> {
    match width {
        InterfaceWidth::FourBit => DataBus::four_bit(port, shift),
        InterfaceWidth::EightBit => Ok(DataBus::eight_bit(port)),
    }
}

/// Delays other than the enable pulse, which shows up twice per transfer.
pub fn waits(sim: &SimController) -> Vec<Duration> {
    let pulse = LcdConfig::default().timing.enable_pulse;
    sim.delays().into_iter().filter(|&delay| delay != pulse).collect()
}

pub fn us(us: u64) -> Duration {
    Duration::from_micros(us)
}

pub fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
