/*
 *  display/st7789.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7789 panel controller: bring-up sequence, addressing window,
 *  rotation and solid fills
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

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use log::{debug, info, trace};

use crate::display::color::{Rgb, wire_bytes};
use crate::display::error::DisplayError;
use crate::display::link::SpiLink;
use crate::display::rotation::{MADCTL_BGR, MADCTL_ML, MADCTL_MV, MADCTL_MX, Rotation};
use crate::display::traits::DisplayCapabilities;

// Command set
pub const SWRESET: u8 = 0x01;
pub const SLPOUT: u8 = 0x11;
pub const INVOFF: u8 = 0x20;
pub const INVON: u8 = 0x21;
pub const DISPON: u8 = 0x29;
pub const CASET: u8 = 0x2A;
pub const RASET: u8 = 0x2B;
pub const RAMWR: u8 = 0x2C;
pub const MADCTL: u8 = 0x36;
pub const COLMOD: u8 = 0x3A;
pub const FRMCTR2: u8 = 0xB2;
pub const GCTRL: u8 = 0xB7;
pub const VCOMS: u8 = 0xBB;
pub const LCMCTRL: u8 = 0xC0;
pub const VDVVRHEN: u8 = 0xC2;
pub const VRHS: u8 = 0xC3;
pub const VDVS: u8 = 0xC4;
pub const FRCTRL2: u8 = 0xC6;
pub const PWCTRL1: u8 = 0xD0;
pub const GMCTRP1: u8 = 0xE0;
pub const GMCTRN1: u8 = 0xE1;

/// Native geometry of the supported panel
pub const PANEL_WIDTH: u16 = 240;
pub const PANEL_HEIGHT: u16 = 240;

/// Reset line held low for at least this long
pub const RESET_HOLD_MS: u32 = 100;

/// Controller ignores commands until its software reset completes
pub const SWRESET_SETTLE_MS: u32 = 150;

/// Data byte that follows every RAMWR opcode
pub const RAMWR_LEAD_BYTE: u8 = 0x89;

/// Orientation the controller is brought up in
pub const INIT_MADCTL: u8 = MADCTL_MX | MADCTL_MV | MADCTL_ML;

/// One entry of the bring-up table: opcode, payload, minimum settle time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitStep {
    pub command: u8,
    pub params: &'static [u8],
    pub settle_ms: u32,
}

const fn step(command: u8, params: &'static [u8]) -> InitStep {
    InitStep { command, params, settle_ms: 0 }
}

/// Vendor bring-up sequence. Payloads are panel calibration and must go out
/// byte-exact in this order.
pub const INIT_SEQUENCE: &[InitStep] = &[
    InitStep { command: SWRESET, params: &[], settle_ms: SWRESET_SETTLE_MS },
    step(MADCTL, &[INIT_MADCTL]),
    step(FRMCTR2, &[0x0C, 0x0C, 0x00, 0x33, 0x33]),
    step(COLMOD, &[0x05]),
    step(GCTRL, &[0x14]),
    step(VCOMS, &[0x37]),
    step(LCMCTRL, &[0x2C]),
    step(VDVVRHEN, &[0x01]),
    step(VRHS, &[0x12]),
    step(VDVS, &[0x20]),
    step(PWCTRL1, &[0xA4, 0xA1]),
    step(FRCTRL2, &[0x0F]),
    step(
        GMCTRP1,
        &[0xD0, 0x04, 0x0D, 0x11, 0x13, 0x2B, 0x3F, 0x54, 0x4C, 0x18, 0x0D, 0x0B, 0x1F, 0x23],
    ),
    step(
        GMCTRN1,
        &[0xD0, 0x04, 0x0C, 0x11, 0x13, 0x2C, 0x3F, 0x44, 0x51, 0x2F, 0x1F, 0x1F, 0x20, 0x23],
    ),
    step(INVON, &[]),
    step(SLPOUT, &[]),
    step(DISPON, &[]),
];

/// Construction parameters, consumed once by [`St7789::new`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opts {
    pub width: u16,
    pub height: u16,
    pub row_offset: u16,
    pub col_offset: u16,
}

/// One past the highest address CASET/RASET can carry
const ADDRESS_SPACE: u32 = 0x1_0000;

impl Opts {
    /// Reject geometry the controller cannot address.
    ///
    /// Offsets swap axes at 90 degrees, so each offset must leave room for
    /// the longer side.
    pub fn validate(&self) -> Result<(), DisplayError> {
        if self.width == 0 || self.height == 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "panel size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let span = self.width.max(self.height) as u32;
        for (name, offset) in [("row", self.row_offset), ("column", self.col_offset)] {
            if offset as u32 + span > ADDRESS_SPACE {
                return Err(DisplayError::InvalidConfiguration(format!(
                    "{} offset {} pushes a {}x{} panel past address 0xFFFF",
                    name, offset, self.width, self.height
                )));
            }
        }
        Ok(())
    }
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            row_offset: 0,
            col_offset: 0,
        }
    }
}

/// Outcome of [`St7789::set_pixel`]
///
/// Plotting outside the logical bounds is not an error; it is reported as
/// `Skipped` and nothing reaches the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelWrite {
    Written,
    Skipped,
}

/// Open handle on one ST7789 panel
pub struct St7789<SPI, DC, PWR, D> {
    link: SpiLink<SPI, DC>,
    power: PWR,
    delay: D,

    width: u16,
    height: u16,
    rotation: Rotation,
    row_offset_cfg: u16,
    col_offset_cfg: u16,
    row_offset: u16,
    col_offset: u16,
    is_bgr: bool,

    /// One pre-encoded scanline, reused across fills
    scanline: Vec<u8>,

    capabilities: DisplayCapabilities,
}

impl<SPI, DC, PWR, D> St7789<SPI, DC, PWR, D>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the wiring, pulse reset and replay the bring-up table.
    ///
    /// `power` doubles as the reset/backlight line on Pirate Audio style
    /// boards; it is left high once the panel is up. Any failure here aborts
    /// construction.
    pub fn new(spi: SPI, dc: DC, power: PWR, delay: D, opts: Opts) -> Result<Self, DisplayError> {
        opts.validate()?;

        let mut dev = Self {
            link: SpiLink::new(spi, dc),
            power,
            delay,
            width: opts.width,
            height: opts.height,
            rotation: Rotation::Deg0,
            row_offset_cfg: opts.row_offset,
            col_offset_cfg: opts.col_offset,
            row_offset: opts.row_offset,
            col_offset: opts.col_offset,
            is_bgr: false,
            scanline: vec![0; opts.width as usize * 2],
            capabilities: DisplayCapabilities {
                width: opts.width as u32,
                height: opts.height as u32,
                supports_rotation: true,
                supports_invert: true,
                supports_backlight: true,
            },
        };

        dev.hardware_reset()
            .and_then(|_| dev.run_init_sequence())
            .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;

        info!("ST7789 initialized ({}x{})", dev.width, dev.height);
        Ok(dev)
    }

    fn hardware_reset(&mut self) -> Result<(), DisplayError> {
        self.set_power(false)?;
        self.delay.delay_ms(RESET_HOLD_MS);
        self.set_power(true)
    }

    fn run_init_sequence(&mut self) -> Result<(), DisplayError> {
        for s in INIT_SEQUENCE {
            self.link.write_command(s.command, s.params)?;
            if s.settle_ms > 0 {
                self.delay.delay_ms(s.settle_ms);
            }
        }
        Ok(())
    }

    /// Physical panel size, independent of rotation
    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Logical size: width and height swap at 90 and 270 degrees
    pub fn logical_size(&self) -> (u16, u16) {
        if self.rotation.is_transposed() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Active (row, column) offsets
    pub fn offsets(&self) -> (u16, u16) {
        (self.row_offset, self.col_offset)
    }

    pub fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    /// Point the write cursor at the whole panel
    pub fn set_window(&mut self) -> Result<(), DisplayError> {
        let x0 = self.col_offset;
        let y0 = self.row_offset;
        self.write_window(x0, y0, x0 + (self.width - 1), y0 + (self.height - 1))
    }

    fn write_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        trace!("window ({}, {})-({}, {})", x0, y0, x1, y1);
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.link.write_command(CASET, &[x0h, x0l, x1h, x1l])?;
        self.link.write_command(RASET, &[y0h, y0l, y1h, y1l])?;
        self.link.write_command(RAMWR, &[RAMWR_LEAD_BYTE])
    }

    /// Fill a rectangle in logical coordinates with one color.
    ///
    /// Rejects anything not fully inside the current logical bounds before
    /// touching the bus. Pixels go out in scanline-sized bursts.
    pub fn fill_rectangle(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Rgb,
    ) -> Result<(), DisplayError> {
        let (bw, bh) = self.logical_size();
        let fits = x >= 0
            && y >= 0
            && width > 0
            && height > 0
            && x as i64 + width as i64 <= bw as i64
            && y as i64 + height as i64 <= bh as i64;
        if !fits {
            return Err(DisplayError::OutOfRange {
                x,
                y,
                width,
                height,
                bounds_w: bw,
                bounds_h: bh,
            });
        }

        let x0 = x as u16 + self.col_offset;
        let y0 = y as u16 + self.row_offset;
        self.write_window(x0, y0, x0 + (width as u16 - 1), y0 + (height as u16 - 1))?;

        let pair = wire_bytes(color.to_565());
        for px in self.scanline.chunks_exact_mut(2) {
            px.copy_from_slice(&pair);
        }

        let row_pixels = self.width as usize;
        let mut remaining = width as usize * height as usize;
        while remaining > 0 {
            let n = remaining.min(row_pixels);
            self.link.send_data(&self.scanline[..n * 2])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Plot one pixel; out-of-bounds coordinates are skipped, not rejected
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgb) -> Result<PixelWrite, DisplayError> {
        let (bw, bh) = self.logical_size();
        if x < 0 || y < 0 || x >= bw as i32 || y >= bh as i32 {
            trace!("pixel ({}, {}) outside {}x{}, skipped", x, y, bw, bh);
            return Ok(PixelWrite::Skipped);
        }
        self.fill_rectangle(x, y, 1, 1, color)?;
        Ok(PixelWrite::Written)
    }

    pub fn fill_screen(&mut self, color: Rgb) -> Result<(), DisplayError> {
        let (w, h) = self.logical_size();
        self.fill_rectangle(0, 0, w as i32, h as i32, color)
    }

    /// Horizontal line, endpoints in either order
    pub fn draw_fast_hline(&mut self, x0: i32, x1: i32, y: i32, color: Rgb) -> Result<(), DisplayError> {
        let (x0, x1) = if x0 > x1 { (x1, x0) } else { (x0, x1) };
        self.fill_rectangle(x0, y, x1 - x0 + 1, 1, color)
    }

    /// Vertical line, endpoints in either order
    pub fn draw_fast_vline(&mut self, x: i32, y0: i32, y1: i32, color: Rgb) -> Result<(), DisplayError> {
        let (y0, y1) = if y0 > y1 { (y1, y0) } else { (y0, y1) };
        self.fill_rectangle(x, y0, 1, y1 - y0 + 1, color)
    }

    /// Switch orientation (clockwise) and send the matching MADCTL
    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), DisplayError> {
        let mut madctl = rotation.madctl();
        if self.is_bgr {
            madctl |= MADCTL_BGR;
        }
        let (row, col) = rotation.offsets(self.row_offset_cfg, self.col_offset_cfg);
        self.link.write_command(MADCTL, &[madctl])?;
        self.rotation = rotation;
        self.row_offset = row;
        self.col_offset = col;
        debug!("rotation {} deg, MADCTL 0x{:02X}", rotation.degrees(), madctl);
        Ok(())
    }

    /// Select BGR subpixel order and re-send MADCTL for the current rotation
    pub fn set_bgr(&mut self, bgr: bool) -> Result<(), DisplayError> {
        self.is_bgr = bgr;
        self.set_rotation(self.rotation)
    }

    pub fn is_bgr(&self) -> bool {
        self.is_bgr
    }

    pub fn invert_colors(&mut self, invert: bool) -> Result<(), DisplayError> {
        debug!("inversion {}", if invert { "on" } else { "off" });
        self.link.command(if invert { INVON } else { INVOFF })
    }

    /// Backlight on. Panel registers are untouched.
    pub fn power_on(&mut self) -> Result<(), DisplayError> {
        debug!("backlight on");
        self.set_power(true)
    }

    /// Backlight off. Panel registers are untouched.
    pub fn power_off(&mut self) -> Result<(), DisplayError> {
        debug!("backlight off");
        self.set_power(false)
    }

    fn set_power(&mut self, on: bool) -> Result<(), DisplayError> {
        let res = if on { self.power.set_high() } else { self.power.set_low() };
        res.map_err(|e| DisplayError::Gpio(format!("power pin: {:?}", e)))
    }

    /// Stream already-encoded pixel bytes in bursts of at most `chunk` bytes
    pub(crate) fn send_pixels(&mut self, bytes: &[u8], chunk: usize) -> Result<(), DisplayError> {
        for burst in bytes.chunks(chunk) {
            trace!("pixel burst {} bytes", burst.len());
            self.link.send_data(burst)?;
        }
        Ok(())
    }

    pub(crate) fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Close the session, handing back the wiring
    pub fn release(self) -> (SpiLink<SPI, DC>, PWR, D) {
        info!("ST7789 released");
        (self.link, self.power, self.delay)
    }
}

impl<SPI, DC, PWR, D> OriginDimensions for St7789<SPI, DC, PWR, D>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
{
    fn size(&self) -> Size {
        let (w, h) = self.logical_size();
        Size::new(w as u32, h as u32)
    }
}

// Lets embedded-graphics text and primitives render straight to the panel
impl<SPI, DC, PWR, D> DrawTarget for St7789<SPI, DC, PWR, D>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
{
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.into())?;
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        if area.is_zero_sized() {
            return Ok(());
        }
        self.fill_rectangle(
            area.top_left.x,
            area.top_left.y,
            area.size.width as i32,
            area.size.height as i32,
            color.into(),
        )
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_screen(color.into())
    }
}
