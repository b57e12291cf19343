/*
 *  display/blit.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Whole-image transfer: decoded images and GIF playback onto the panel
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

use std::io::{Cursor, Read};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, GenericImageView, Rgba};

use log::{debug, warn};

use crate::display::color::{Rgb, wire_bytes};
use crate::display::error::DisplayError;
use crate::display::st7789::St7789;

/// Bytes per SPI transaction for whole-image transfers (2048 pixels)
pub const IMAGE_CHUNK_BYTES: usize = 4096;

/// GIF frames are held for 3 ms per 1/100 s of encoded delay
const GIF_DELAY_NUMER: u32 = 3;
const GIF_DELAY_DENOM: u32 = 10;

/// Encode `img` into the panel's native stream order.
///
/// The panel is mounted mirrored, so stream position (i, j) takes the
/// source pixel at column `width - i`, row `j`. Samples falling outside
/// the source read as black.
pub fn mirrored_stream<I>(img: &I, width: u32, height: u32) -> Vec<u8>
where
    I: GenericImageView<Pixel = Rgba<u8>>,
{
    let (src_w, src_h) = img.dimensions();
    let mut out = Vec::with_capacity(width as usize * height as usize * 2);
    for i in 0..width {
        let x = width - i;
        for y in 0..height {
            let c = if x < src_w && y < src_h {
                Rgb::from(img.get_pixel(x, y))
            } else {
                Rgb::BLACK
            };
            out.extend_from_slice(&wire_bytes(c.to_565()));
        }
    }
    out
}

/// Hold time for a GIF frame whose encoded delay is `delay_ms`
pub fn gif_pause_ms(delay_ms: u32) -> u32 {
    delay_ms.saturating_mul(GIF_DELAY_NUMER) / GIF_DELAY_DENOM
}

impl<SPI, DC, PWR, D> St7789<SPI, DC, PWR, D>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    PWR: OutputPin,
    D: DelayNs,
{
    /// Blit a decoded, panel-sized image.
    ///
    /// No scaling or cropping: anything other than the panel's physical size
    /// is rejected before the bus is touched.
    pub fn draw_raw<I>(&mut self, img: &I) -> Result<(), DisplayError>
    where
        I: GenericImageView<Pixel = Rgba<u8>>,
    {
        let (w, h) = self.dimensions();
        let expected = (w as u32, h as u32);
        if img.dimensions() != expected {
            return Err(DisplayError::ImageSize {
                expected,
                actual: img.dimensions(),
            });
        }

        let stream = mirrored_stream(img, expected.0, expected.1);
        self.set_window()?;
        self.send_pixels(&stream, IMAGE_CHUNK_BYTES)
    }

    /// Decode an encoded image (PNG, JPEG, GIF first frame) and blit it
    pub fn draw_image<R: Read>(&mut self, mut reader: R) -> Result<(), DisplayError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let img = image::load_from_memory(&bytes)?;
        debug!("decoded {}x{} image", img.width(), img.height());
        self.draw_raw(&img)
    }

    /// Play every frame of an animated GIF once, blocking between frames.
    ///
    /// Returns the number of frames shown.
    pub fn play_gif<R: Read>(&mut self, mut reader: R) -> Result<usize, DisplayError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let frames = GifDecoder::new(Cursor::new(bytes))?
            .into_frames()
            .collect_frames()?;
        if frames.is_empty() {
            warn!("GIF contains no frames");
        }

        for frame in &frames {
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_ms = if denom == 0 { 0 } else { numer / denom };
            self.draw_raw(frame.buffer())?;
            self.pause_ms(gif_pause_ms(delay_ms));
        }
        debug!("played {} GIF frames", frames.len());
        Ok(frames.len())
    }
}
