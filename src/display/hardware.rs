/*
 *  display/hardware.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Linux bring-up: spidev bus, GPIO character-device lines, one owner
 *  per bus
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

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{CdevPin, Delay, SpidevDevice};

use log::info;

use crate::config::PanelConfig;
use crate::display::error::DisplayError;
use crate::display::rotation::Rotation;
use crate::display::st7789::St7789;

const CONSUMER: &str = "pibox-lcd";

pub type LinuxSt7789 = St7789<SpidevDevice, CdevPin, CdevPin, Delay>;

/// SPI bus paths currently owned by an open panel
static CLAIMED_BUSES: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Exclusive claim on one SPI bus path, released on drop
#[derive(Debug)]
pub struct BusClaim {
    path: String,
}

impl BusClaim {
    pub fn acquire(path: &str) -> Result<Self, DisplayError> {
        let mut claimed = CLAIMED_BUSES.lock().unwrap_or_else(PoisonError::into_inner);
        if claimed.iter().any(|p| p == path) {
            return Err(DisplayError::BusInUse(path.to_string()));
        }
        claimed.push(path.to_string());
        Ok(Self { path: path.to_string() })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for BusClaim {
    fn drop(&mut self) {
        CLAIMED_BUSES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|p| p != &self.path);
    }
}

/// The process's handle on the panel. Pass it by reference to whatever
/// draws; dropping or closing it frees the bus for a later `open`.
pub struct PanelHandle {
    panel: LinuxSt7789,
    claim: BusClaim,
}

impl PanelHandle {
    /// Release the SPI device and GPIO lines
    pub fn close(self) {
        let PanelHandle { panel, claim } = self;
        drop(panel.release());
        info!("closed panel on {}", claim.path());
    }
}

impl Deref for PanelHandle {
    type Target = LinuxSt7789;

    fn deref(&self) -> &Self::Target {
        &self.panel
    }
}

impl DerefMut for PanelHandle {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.panel
    }
}

fn output_line(chip: &mut Chip, offset: u32, initial: u8) -> Result<CdevPin, DisplayError> {
    let line = chip
        .get_line(offset)
        .map_err(|e| DisplayError::Gpio(format!("line {}: {}", offset, e)))?;
    let handle = line
        .request(LineRequestFlags::OUTPUT, initial, CONSUMER)
        .map_err(|e| DisplayError::Gpio(format!("request line {}: {}", offset, e)))?;
    CdevPin::new(handle).map_err(|e| DisplayError::Gpio(format!("line {}: {:?}", offset, e)))
}

/// Open the bus and GPIO lines named in `cfg`, run bring-up, then apply the
/// configured rotation, colour order and inversion.
pub fn open(cfg: &PanelConfig) -> Result<PanelHandle, DisplayError> {
    let bus = cfg.spi_bus();
    let claim = BusClaim::acquire(bus)?;

    info!(
        "Initializing ST7789 on {} at {} Hz, DC GPIO{} power GPIO{}",
        bus,
        cfg.speed_hz(),
        cfg.dc_pin(),
        cfg.power_pin()
    );

    let mut spi = SpidevDevice::open(bus)
        .map_err(|e| DisplayError::Spi(format!("Failed to open {}: {:?}", bus, e)))?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(cfg.speed_hz())
        .mode(SpiModeFlags::SPI_MODE_0)
        .build();
    spi.0.configure(&options)?;

    let mut chip = Chip::new(cfg.gpio_chip())
        .map_err(|e| DisplayError::Gpio(format!("Failed to open {}: {}", cfg.gpio_chip(), e)))?;
    let dc = output_line(&mut chip, cfg.dc_pin(), 0)?;
    let power = output_line(&mut chip, cfg.power_pin(), 0)?;

    let mut panel = St7789::new(spi, dc, power, Delay, cfg.opts())?;

    if let Some(deg) = cfg.rotate_deg {
        panel.set_rotation(Rotation::from_degrees(deg)?)?;
    }
    if let Some(bgr) = cfg.bgr {
        panel.set_bgr(bgr)?;
    }
    if let Some(invert) = cfg.invert {
        panel.invert_colors(invert)?;
    }

    Ok(PanelHandle { panel, claim })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_claim_is_exclusive() {
        let path = "/dev/spidev-test.0";
        let first = BusClaim::acquire(path).unwrap();
        assert!(matches!(BusClaim::acquire(path), Err(DisplayError::BusInUse(_))));

        let other = BusClaim::acquire("/dev/spidev-test.1").unwrap();
        assert_eq!(other.path(), "/dev/spidev-test.1");

        drop(first);
        assert!(BusClaim::acquire(path).is_ok());
    }

    #[test]
    fn test_bus_claim_survives_poisoned_registry() {
        let path = "/dev/spidev-poison.0";
        let claim = BusClaim::acquire(path).unwrap();

        let _ = std::thread::spawn(|| {
            let _guard = CLAIMED_BUSES.lock().unwrap();
            panic!("poison the registry");
        })
        .join();
        assert!(CLAIMED_BUSES.is_poisoned());

        assert!(matches!(BusClaim::acquire(path), Err(DisplayError::BusInUse(_))));
        drop(claim);
        let again = BusClaim::acquire(path).unwrap();
        assert_eq!(again.path(), path);
    }
}
