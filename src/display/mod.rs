/*
 *  display/mod.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  ST7789 display subsystem
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod color;
pub mod rotation;

// Transport and panel controller
pub mod link;
pub mod st7789;
pub mod blit;

// Linux spidev/gpio-cdev bring-up
pub mod hardware;

// Recording bus doubles for testing
#[cfg(test)]
pub mod mock;

// Re-exports for convenience
pub use traits::{DisplayDriver, DisplayCapabilities};
pub use error::DisplayError;
pub use color::{Rgb, rgb_to_565, rgb565_to_rgb};
pub use rotation::Rotation;
pub use link::SpiLink;
pub use st7789::{Opts, PixelWrite, St7789};
pub use blit::IMAGE_CHUNK_BYTES;
pub use hardware::{PanelHandle, open};
