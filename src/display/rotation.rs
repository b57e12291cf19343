/*
 *  display/rotation.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Panel orientation states
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

use crate::display::error::DisplayError;

/// MADCTL register bits
pub const MADCTL_MY: u8 = 0x80;
pub const MADCTL_MX: u8 = 0x40;
pub const MADCTL_MV: u8 = 0x20;
pub const MADCTL_ML: u8 = 0x10;
pub const MADCTL_BGR: u8 = 0x08;

/// Clockwise orientation, each step 90 degrees from the prior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Index taken modulo 4
    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Rotation::Deg0,
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            _ => Rotation::Deg270,
        }
    }

    pub fn from_degrees(degrees: u16) -> Result<Self, DisplayError> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(DisplayError::InvalidRotation(other)),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> u16 {
        self.index() as u16 * 90
    }

    /// Next state clockwise, wrapping after 270
    pub fn next(self) -> Self {
        Rotation::from_index(self.index() + 1)
    }

    /// Logical axes are swapped against the panel's native ones
    pub fn is_transposed(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// MADCTL orientation bits, color-order bit excluded
    pub fn madctl(self) -> u8 {
        match self {
            Rotation::Deg0 => MADCTL_MX | MADCTL_MY,
            Rotation::Deg90 => MADCTL_MY | MADCTL_MV,
            Rotation::Deg180 => 0,
            Rotation::Deg270 => MADCTL_MX | MADCTL_MV,
        }
    }

    /// Active (row, column) offsets given the configured pair.
    ///
    /// 90 swaps the configured pair; 180 and 270 run unoffset.
    pub fn offsets(self, row_cfg: u16, col_cfg: u16) -> (u16, u16) {
        match self {
            Rotation::Deg0 => (row_cfg, col_cfg),
            Rotation::Deg90 => (col_cfg, row_cfg),
            Rotation::Deg180 | Rotation::Deg270 => (0, 0),
        }
    }
}
