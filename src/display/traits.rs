/*
 *  display/traits.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use std::io::Read;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::display::color::Rgb;
use crate::display::error::DisplayError;
use crate::display::rotation::Rotation;
use crate::display::st7789::{PixelWrite, St7789};

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Physical width in pixels
    pub width: u32,

    /// Physical height in pixels
    pub height: u32,

    /// Whether the display supports hardware rotation
    pub supports_rotation: bool,

    /// Whether the display supports inversion
    pub supports_invert: bool,

    /// Whether the backlight can be switched
    pub supports_backlight: bool,
}

/// Object-safe drawing surface consumed by front ends (CLI, HTTP layer)
///
/// Implementations perform their own bus transactions synchronously; callers
/// sharing one driver between threads must serialise access themselves.
pub trait DisplayDriver {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the physical dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    fn fill_screen(&mut self, color: Rgb) -> Result<(), DisplayError>;

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) -> Result<(), DisplayError>;

    fn plot(&mut self, x: i32, y: i32, color: Rgb) -> Result<PixelWrite, DisplayError>;

    /// Decode and show a still image
    fn show_image(&mut self, reader: &mut dyn Read) -> Result<(), DisplayError>;

    /// Decode and play an animated GIF once, returning the frame count
    fn show_gif(&mut self, reader: &mut dyn Read) -> Result<usize, DisplayError>;

    /// Set display rotation
    ///
    /// Rotation angle should be 0, 90, 180, or 270 degrees.
    fn set_rotation_deg(&mut self, degrees: u16) -> Result<(), DisplayError>;

    /// Set display inversion
    fn set_invert(&mut self, inverted: bool) -> Result<(), DisplayError>;

    /// Switch the backlight
    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError>;
}

impl<SPI, DC, PWR, D> DisplayDriver for St7789<SPI, DC, PWR, D>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
{
    fn capabilities(&self) -> &DisplayCapabilities {
        St7789::capabilities(self)
    }

    fn fill_screen(&mut self, color: Rgb) -> Result<(), DisplayError> {
        St7789::fill_screen(self, color)
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb) -> Result<(), DisplayError> {
        self.fill_rectangle(x, y, width, height, color)
    }

    fn plot(&mut self, x: i32, y: i32, color: Rgb) -> Result<PixelWrite, DisplayError> {
        self.set_pixel(x, y, color)
    }

    fn show_image(&mut self, reader: &mut dyn Read) -> Result<(), DisplayError> {
        self.draw_image(reader)
    }

    fn show_gif(&mut self, reader: &mut dyn Read) -> Result<usize, DisplayError> {
        self.play_gif(reader)
    }

    fn set_rotation_deg(&mut self, degrees: u16) -> Result<(), DisplayError> {
        let rotation = Rotation::from_degrees(degrees)?;
        self.set_rotation(rotation)
    }

    fn set_invert(&mut self, inverted: bool) -> Result<(), DisplayError> {
        self.invert_colors(inverted)
    }

    fn set_backlight(&mut self, on: bool) -> Result<(), DisplayError> {
        if on { self.power_on() } else { self.power_off() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::mock::MockBus;
    use crate::display::st7789::{MADCTL, Opts};

    #[test]
    fn test_driver_through_trait_object() {
        let bus = MockBus::new();
        let mut panel = bus.panel(Opts::default());
        let driver: &mut dyn DisplayDriver = &mut panel;

        assert_eq!(driver.dimensions(), (240, 240));
        driver.set_rotation_deg(270).unwrap();
        assert!(matches!(driver.set_rotation_deg(45), Err(DisplayError::InvalidRotation(45))));
        assert_eq!(driver.plot(-5, 0, Rgb::RED).unwrap(), PixelWrite::Skipped);
        driver.set_backlight(false).unwrap();

        let state = bus.state();
        let state = state.lock().unwrap();
        assert_eq!(state.commands(), vec![MADCTL]);
        assert_eq!(state.power_log, vec![false]);
    }

    #[test]
    fn test_capabilities() {
        let bus = MockBus::new();
        let panel = bus.panel(Opts { width: 135, height: 240, ..Opts::default() });
        let caps = DisplayDriver::capabilities(&panel);
        assert_eq!((caps.width, caps.height), (135, 240));
        assert!(caps.supports_rotation && caps.supports_invert && caps.supports_backlight);
    }
}
