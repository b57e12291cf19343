/*
 *  display/color.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pixel codec: 8-bit RGB to the panel's packed 565 wire format
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

use embedded_graphics::pixelcolor::{Rgb565, Rgb888, RgbColor};
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};

/// Opaque 8-bit-per-channel color
///
/// The panel has no alpha plane, so this type carries none. Callers holding
/// RGBA data must go through [`Rgb::from_rgba`], which drops alpha explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from RGBA, discarding alpha
    pub const fn from_rgba(r: u8, g: u8, b: u8, _alpha: u8) -> Self {
        Self { r, g, b }
    }

    /// Packed 565 value for this color
    pub const fn to_565(self) -> u16 {
        rgb_to_565(self)
    }
}

/// Pack 8-bit R,G,B into 5-6-5.
///
/// Each channel is truncated, never rounded: top 5 bits of red, top 6 of
/// green, top 5 of blue.
pub const fn rgb_to_565(c: Rgb) -> u16 {
    ((c.r as u16 & 0xF8) << 8) | ((c.g as u16 & 0xFC) << 3) | (c.b as u16 >> 3)
}

/// Expand a packed 565 value back to 8-bit channels (low bits zero)
pub const fn rgb565_to_rgb(v: u16) -> Rgb {
    Rgb {
        r: ((v >> 8) & 0xF8) as u8,
        g: ((v >> 3) & 0xFC) as u8,
        b: ((v << 3) & 0xF8) as u8,
    }
}

/// Byte pair as it goes out on the bus, low byte first
#[inline]
pub const fn wire_bytes(v: u16) -> [u8; 2] {
    [v as u8, (v >> 8) as u8]
}

impl From<Rgb888> for Rgb {
    fn from(c: Rgb888) -> Self {
        Rgb::new(c.r(), c.g(), c.b())
    }
}

impl From<Rgb> for Rgb888 {
    fn from(c: Rgb) -> Self {
        Rgb888::new(c.r, c.g, c.b)
    }
}

impl From<Rgb565> for Rgb {
    fn from(c: Rgb565) -> Self {
        rgb565_to_rgb(RawU16::from(c).into_inner())
    }
}

impl From<image::Rgba<u8>> for Rgb {
    fn from(p: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = p.0;
        Rgb::from_rgba(r, g, b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_565(Rgb::RED), 0xF800);
        assert_eq!(rgb_to_565(Rgb::GREEN), 0x07E0);
        assert_eq!(rgb_to_565(Rgb::BLUE), 0x001F);
        assert_eq!(rgb_to_565(Rgb::WHITE), 0xFFFF);
        assert_eq!(rgb_to_565(Rgb::BLACK), 0x0000);
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 0b0000_0111 would round up to 1 but truncates to 0
        assert_eq!(rgb_to_565(Rgb::new(7, 3, 7)), 0);
        assert_eq!(rgb_to_565(Rgb::new(8, 4, 8)), 0x0821);
    }

    #[test]
    fn test_decode_loses_only_low_bits() {
        for r in (0..=255u16).step_by(5) {
            for g in (0..=255u16).step_by(3) {
                for b in [0u8, 1, 6, 7, 8, 127, 128, 254, 255] {
                    let c = Rgb::new(r as u8, g as u8, b);
                    let back = rgb565_to_rgb(rgb_to_565(c));
                    assert_eq!(back.r, c.r & 0xF8);
                    assert_eq!(back.g, c.g & 0xFC);
                    assert_eq!(back.b, c.b & 0xF8);
                    assert_eq!(rgb_to_565(c), rgb_to_565(c));
                }
            }
        }
    }

    #[test]
    fn test_alpha_is_dropped() {
        let opaque = Rgb::from(image::Rgba([10, 20, 30, 255]));
        let clear = Rgb::from(image::Rgba([10, 20, 30, 0]));
        assert_eq!(opaque, clear);
    }

    #[test]
    fn test_wire_bytes_low_first() {
        assert_eq!(wire_bytes(0xF800), [0x00, 0xF8]);
        assert_eq!(wire_bytes(0x1234), [0x34, 0x12]);
    }

    #[test]
    fn test_embedded_graphics_conversion() {
        let c = Rgb::from(Rgb565::new(31, 0, 0));
        assert_eq!(c, Rgb::new(0xF8, 0, 0));
        assert_eq!(Rgb::from(Rgb888::new(1, 2, 3)), Rgb::new(1, 2, 3));
    }
}
