/*
 *  display/mock.rs
 *
 *  pibox-lcd - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording SPI/GPIO/delay doubles for testing without hardware
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

use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use crate::display::st7789::{Opts, St7789};

pub type MockPanel = St7789<MockSpi, MockPin, MockPin, MockDelay>;

/// One bus write, classified by the DC level at the time it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Command(Vec<u8>),
    Data(Vec<u8>),
}

/// Shared state behind every handle of a [`MockBus`]
#[derive(Debug, Default)]
pub struct MockBusState {
    /// DC line level (true = data)
    pub dc_high: bool,

    /// Every SPI write in order
    pub events: Vec<BusEvent>,

    /// Backlight/power pin transitions (true = high)
    pub power_log: Vec<bool>,

    /// Requested delays in milliseconds
    pub delays_ms: Vec<u32>,

    /// Simulate failures (for error testing)
    pub simulate_spi_failure: bool,
    pub simulate_gpio_failure: bool,
}

impl MockBusState {
    /// Data writes issued after the last RAMWR command
    pub fn pixel_writes(&self) -> Vec<&[u8]> {
        let start = self
            .events
            .iter()
            .rposition(|e| *e == BusEvent::Command(vec![0x2C]))
            .map(|i| i + 1)
            .unwrap_or(self.events.len());
        self.events[start..]
            .iter()
            .filter_map(|e| match e {
                BusEvent::Data(d) => Some(d.as_slice()),
                BusEvent::Command(_) => None,
            })
            .collect()
    }

    /// Opcodes in the order they were sent
    pub fn commands(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                BusEvent::Command(c) => c.first().copied(),
                BusEvent::Data(_) => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct MockError;

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Factory for linked SPI/pin/delay doubles
#[derive(Debug, Clone, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<Mutex<MockBusState>> {
        Arc::clone(&self.state)
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi { state: self.state() }
    }

    pub fn dc(&self) -> MockPin {
        MockPin { state: self.state(), role: PinRole::Dc }
    }

    pub fn power(&self) -> MockPin {
        MockPin { state: self.state(), role: PinRole::Power }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { state: self.state() }
    }

    /// Build a panel on this bus and forget the bring-up traffic
    pub fn panel(&self, opts: Opts) -> MockPanel {
        let panel = St7789::new(self.spi(), self.dc(), self.power(), self.delay(), opts)
            .expect("mock panel init");
        self.clear();
        panel
    }

    /// Reset recorded traffic (useful between steps of a test)
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.events.clear();
        state.power_log.clear();
        state.delays_ms.clear();
    }
}

pub struct MockSpi {
    state: Arc<Mutex<MockBusState>>,
}

impl spi::ErrorType for MockSpi {
    type Error = MockError;
}

impl SpiDevice<u8> for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_spi_failure {
            return Err(MockError);
        }
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                let event = if state.dc_high {
                    BusEvent::Data(bytes.to_vec())
                } else {
                    BusEvent::Command(bytes.to_vec())
                };
                state.events.push(event);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum PinRole {
    Dc,
    Power,
}

pub struct MockPin {
    state: Arc<Mutex<MockBusState>>,
    role: PinRole,
}

impl MockPin {
    fn set(&mut self, high: bool) -> Result<(), MockError> {
        let mut state = self.state.lock().unwrap();
        if state.simulate_gpio_failure {
            return Err(MockError);
        }
        match self.role {
            PinRole::Dc => state.dc_high = high,
            PinRole::Power => state.power_log.push(high),
        }
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

pub struct MockDelay {
    state: Arc<Mutex<MockBusState>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.lock().unwrap().delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.state.lock().unwrap().delays_ms.push(ms);
    }
}
