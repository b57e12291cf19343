/*
 *  display/link.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  SPI transport with a data/command select line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::display::error::DisplayError;

/// Byte-level link to the panel controller
///
/// The DC line is low for command bytes and high for parameter/pixel data.
/// Every call drives DC before touching the bus, so calls must not be
/// interleaved from multiple threads.
pub struct SpiLink<SPI, DC> {
    spi: SPI,
    dc: DC,
}

impl<SPI, DC> SpiLink<SPI, DC>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
{
    pub fn new(spi: SPI, dc: DC) -> Self {
        Self { spi, dc }
    }

    /// Drive DC to command state, then write `bytes`
    pub fn send_command(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.dc
            .set_low()
            .map_err(|e| DisplayError::Gpio(format!("DC low: {:?}", e)))?;
        self.write(bytes)
    }

    /// Drive DC to data state, then write `bytes`
    pub fn send_data(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.dc
            .set_high()
            .map_err(|e| DisplayError::Gpio(format!("DC high: {:?}", e)))?;
        self.write(bytes)
    }

    /// Single opcode
    pub fn command(&mut self, cmd: u8) -> Result<(), DisplayError> {
        self.send_command(&[cmd])
    }

    /// Opcode followed by its parameter bytes (if any)
    pub fn write_command(&mut self, cmd: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.command(cmd)?;
        if !params.is_empty() {
            self.send_data(params)?;
        }
        Ok(())
    }

    /// Give back the bus and DC pin
    pub fn release(self) -> (SPI, DC) {
        (self.spi, self.dc)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), DisplayError> {
        self.spi
            .write(bytes)
            .map_err(|e| DisplayError::Spi(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mock::{BusEvent, MockBus};

    #[test]
    fn test_command_then_data() {
        let bus = MockBus::new();
        let mut link = SpiLink::new(bus.spi(), bus.dc());

        link.write_command(0x3A, &[0x05]).unwrap();

        let state = bus.state();
        let state = state.lock().unwrap();
        assert_eq!(
            state.events,
            vec![BusEvent::Command(vec![0x3A]), BusEvent::Data(vec![0x05])]
        );
    }

    #[test]
    fn test_command_without_params_sends_no_data() {
        let bus = MockBus::new();
        let mut link = SpiLink::new(bus.spi(), bus.dc());

        link.write_command(0x29, &[]).unwrap();

        assert_eq!(bus.state().lock().unwrap().events, vec![BusEvent::Command(vec![0x29])]);
    }

    #[test]
    fn test_spi_failure_surfaces() {
        let bus = MockBus::new();
        let mut link = SpiLink::new(bus.spi(), bus.dc());
        bus.state().lock().unwrap().simulate_spi_failure = true;

        let err = link.send_data(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, DisplayError::Spi(_)));
        assert!(bus.state().lock().unwrap().events.is_empty());
    }

    #[test]
    fn test_dc_failure_skips_bus_write() {
        let bus = MockBus::new();
        let mut link = SpiLink::new(bus.spi(), bus.dc());
        bus.state().lock().unwrap().simulate_gpio_failure = true;

        let err = link.command(0x01).unwrap_err();
        assert!(matches!(err, DisplayError::Gpio(_)));
        assert!(bus.state().lock().unwrap().events.is_empty());
    }
}
