/*
 *  display/error.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
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

use thiserror::Error;

/// Unified error type for all display operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// SPI write failed
    #[error("SPI communication error: {0}")]
    Spi(String),

    /// Data/command select, reset or backlight line failed
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Hardware bring-up failed
    #[error("Display initialization failed: {0}")]
    InitializationFailed(String),

    /// Rectangle does not fit the current logical bounds
    #[error(
        "rectangle {width}x{height} at ({x}, {y}) outside display area {bounds_w}x{bounds_h}"
    )]
    OutOfRange {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        bounds_w: u16,
        bounds_h: u16,
    },

    /// Source image does not match the panel geometry
    #[error("image size mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    ImageSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Upstream image decode failed
    #[error("image decode failed: {0}")]
    Decode(String),

    /// Invalid rotation angle
    #[error("Invalid rotation angle: {0} (must be 0, 90, 180, or 270)")]
    InvalidRotation(u16),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Another panel handle already owns this bus
    #[error("SPI bus {0} is already claimed by an open panel")]
    BusInUse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for DisplayError {
    fn from(err: image::ImageError) -> Self {
        DisplayError::Decode(err.to_string())
    }
}
